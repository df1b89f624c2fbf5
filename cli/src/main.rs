use std::{
    env,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::UnixStream,
};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Snapshot {
        id: String,
        timestamp: f64,
        summary: String,
        goal: Option<String>,
        labels: Vec<String>,
    },
    Confirm {
        hypothesis_id: String,
    },
    NewGoal {
        text: String,
    },
    Query {
        target: String,
        limit: Option<usize>,
    },
    Exit,
}

#[derive(Debug, Clone, PartialEq)]
struct CliOptions {
    socket_path: PathBuf,
    command: Command,
}

const USAGE: &str = "usage: sightline-cli --socket-path <path> \
snapshot --summary <text> [--goal <text>] [--label <text>]... [--id <id>] [--timestamp <secs>] \
| confirm <hypothesis-id> | new-goal <text> | query <memory|hypotheses> [--limit <n>] | exit";

fn cli_options_from_args() -> Result<CliOptions> {
    parse_cli_options(env::args().skip(1))
}

fn parse_cli_options<I>(mut args: I) -> Result<CliOptions>
where
    I: Iterator<Item = String>,
{
    let mut socket_path = None;
    let mut command = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--socket-path" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --socket-path"))?;
                socket_path = Some(PathBuf::from(value));
            }
            "snapshot" => {
                command = Some(parse_snapshot_command(&mut args)?);
            }
            "confirm" => {
                let hypothesis_id = args
                    .next()
                    .ok_or_else(|| anyhow!("missing hypothesis id for confirm"))?;
                command = Some(Command::Confirm { hypothesis_id });
            }
            "new-goal" => {
                let text = args
                    .next()
                    .ok_or_else(|| anyhow!("missing goal text for new-goal"))?;
                command = Some(Command::NewGoal { text });
            }
            "query" => {
                command = Some(parse_query_command(&mut args)?);
            }
            "exit" => {
                command = Some(Command::Exit);
            }
            other => {
                return Err(anyhow!("unknown argument: {other}. {USAGE}"));
            }
        }
    }

    let socket_path =
        socket_path.ok_or_else(|| anyhow!("missing required argument --socket-path. {USAGE}"))?;
    let command = command.ok_or_else(|| anyhow!("missing command. {USAGE}"))?;

    Ok(CliOptions {
        socket_path,
        command,
    })
}

fn parse_snapshot_command<I>(args: &mut I) -> Result<Command>
where
    I: Iterator<Item = String>,
{
    let mut id = None;
    let mut timestamp = None;
    let mut summary = None;
    let mut goal = None;
    let mut labels = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--id" => id = Some(required_value(args, "--id")?),
            "--timestamp" => {
                let value = required_value(args, "--timestamp")?;
                timestamp = Some(
                    value
                        .parse::<f64>()
                        .with_context(|| format!("invalid --timestamp value '{value}'"))?,
                );
            }
            "--summary" => summary = Some(required_value(args, "--summary")?),
            "--goal" => goal = Some(required_value(args, "--goal")?),
            "--label" => labels.push(required_value(args, "--label")?),
            other => return Err(anyhow!("unknown snapshot argument: {other}. {USAGE}")),
        }
    }

    Ok(Command::Snapshot {
        id: id.unwrap_or_else(|| format!("snap-{}", Uuid::new_v4())),
        timestamp: timestamp.unwrap_or_else(unix_now_seconds),
        summary: summary.ok_or_else(|| anyhow!("snapshot requires --summary. {USAGE}"))?,
        goal,
        labels,
    })
}

fn parse_query_command<I>(args: &mut I) -> Result<Command>
where
    I: Iterator<Item = String>,
{
    let target = args
        .next()
        .ok_or_else(|| anyhow!("query requires a target (memory|hypotheses). {USAGE}"))?;
    if target != "memory" && target != "hypotheses" {
        return Err(anyhow!("unknown query target '{target}'. {USAGE}"));
    }

    let mut limit = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--limit" => {
                let value = required_value(args, "--limit")?;
                limit = Some(
                    value
                        .parse::<usize>()
                        .with_context(|| format!("invalid --limit value '{value}'"))?,
                );
            }
            other => return Err(anyhow!("unknown query argument: {other}. {USAGE}")),
        }
    }

    Ok(Command::Query { target, limit })
}

fn required_value<I>(args: &mut I, flag: &str) -> Result<String>
where
    I: Iterator<Item = String>,
{
    args.next()
        .ok_or_else(|| anyhow!("missing value for {flag}"))
}

fn unix_now_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or(0.0)
}

#[derive(Debug, Serialize)]
struct SnapshotPayload {
    id: String,
    timestamp: f64,
    activity_summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    interaction_goal: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    candidate_labels: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum NudgePayload {
    Confirm { hypothesis_id: String },
    NewGoal { text: String },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IngressMessage {
    Snapshot {
        snapshot: SnapshotPayload,
    },
    Nudge {
        nudge: NudgePayload,
    },
    Query {
        target: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        limit: Option<usize>,
    },
    Exit,
}

fn build_message(command: Command) -> (IngressMessage, bool) {
    match command {
        Command::Snapshot {
            id,
            timestamp,
            summary,
            goal,
            labels,
        } => (
            IngressMessage::Snapshot {
                snapshot: SnapshotPayload {
                    id,
                    timestamp,
                    activity_summary: summary,
                    interaction_goal: goal,
                    candidate_labels: labels,
                },
            },
            true,
        ),
        Command::Confirm { hypothesis_id } => (
            IngressMessage::Nudge {
                nudge: NudgePayload::Confirm { hypothesis_id },
            },
            true,
        ),
        Command::NewGoal { text } => (
            IngressMessage::Nudge {
                nudge: NudgePayload::NewGoal { text },
            },
            true,
        ),
        Command::Query { target, limit } => (IngressMessage::Query { target, limit }, true),
        Command::Exit => (IngressMessage::Exit, false),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let options = cli_options_from_args()?;
    let (message, expects_reply) = build_message(options.command);

    let stream = UnixStream::connect(&options.socket_path)
        .await
        .with_context(|| format!("unable to connect to {}", options.socket_path.display()))?;
    let (read_half, mut write_half) = stream.into_split();

    let line = serde_json::to_string(&message).context("failed to encode message")?;
    write_half
        .write_all(line.as_bytes())
        .await
        .context("failed to send message")?;
    write_half
        .write_all(b"\n")
        .await
        .context("failed to send message terminator")?;

    if expects_reply {
        let mut lines = BufReader::new(read_half).lines();
        match lines.next_line().await.context("failed to read reply")? {
            Some(reply) => println!("{reply}"),
            None => return Err(anyhow!("server closed connection without replying")),
        }
    }

    Ok(())
}
