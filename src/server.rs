use std::{
    fs,
    io::ErrorKind,
    os::unix::fs::FileTypeExt,
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result, bail};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{UnixListener, UnixStream},
    signal::unix::{SignalKind, signal},
    sync::mpsc,
};

use crate::{
    config::Config,
    protocol::{
        ClientMessage, QueryTarget, ServerMessage, encode_server_message, parse_client_message,
    },
    session::TrackerSession,
};

enum ExitReason {
    SocketMessage,
    Signal(&'static str),
}

type ClientEnvelope = (ClientMessage, mpsc::UnboundedSender<String>);

/// NDJSON host protocol over a Unix socket. Client readers forward parsed
/// messages here; this loop applies them to the session one at a time, so
/// the tracker collections are never touched concurrently.
pub async fn run(config: &Config, mut session: TrackerSession) -> Result<()> {
    prepare_socket_path(&config.server.socket_path)?;
    let listener = UnixListener::bind(&config.server.socket_path).with_context(|| {
        format!(
            "unable to bind socket {}",
            config.server.socket_path.display()
        )
    })?;

    let mut sigint =
        signal(SignalKind::interrupt()).context("unable to listen for SIGINT (Ctrl+C)")?;
    let mut sigterm = signal(SignalKind::terminate()).context("unable to listen for SIGTERM")?;
    let (message_tx, mut message_rx) = mpsc::unbounded_channel::<ClientEnvelope>();

    tracing::info!(
        target: "server",
        socket = %config.server.socket_path.display(),
        "listening"
    );

    let exit_reason = loop {
        tokio::select! {
            _ = sigint.recv() => break ExitReason::Signal("SIGINT"),
            _ = sigterm.recv() => break ExitReason::Signal("SIGTERM"),
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, _)) => {
                        let sender = message_tx.clone();
                        tokio::spawn(async move {
                            if let Err(err) = handle_client(stream, sender).await {
                                tracing::warn!(target: "server", error = %format!("{err:#}"), "client_handling_failed");
                            }
                        });
                    }
                    Err(err) => {
                        tracing::warn!(target: "server", error = %err, "accept_failed");
                    }
                }
            }
            Some((message, reply_tx)) = message_rx.recv() => {
                if matches!(message, ClientMessage::Exit) {
                    break ExitReason::SocketMessage;
                }
                if let Some(reply) = dispatch(&mut session, message) {
                    match encode_server_message(&reply) {
                        Ok(line) => {
                            let _ = reply_tx.send(line);
                        }
                        Err(err) => {
                            tracing::error!(target: "server", error = %err, "reply_encoding_failed");
                        }
                    }
                }
            }
        }
    };

    if let Err(err) = session.flush() {
        tracing::error!(target: "server", error = %err, "final_state_flush_failed");
    }
    cleanup_socket_path(&config.server.socket_path)?;
    match exit_reason {
        ExitReason::SocketMessage => {
            tracing::info!(target: "server", "stopped: received exit message");
        }
        ExitReason::Signal(signal_name) => {
            tracing::info!(target: "server", signal = signal_name, "stopped: received signal");
        }
    }

    Ok(())
}

fn dispatch(session: &mut TrackerSession, message: ClientMessage) -> Option<ServerMessage> {
    match message {
        ClientMessage::Exit => None,
        ClientMessage::Snapshot(snapshot) => match session.observe_snapshot(&snapshot) {
            Ok(outcome) => Some(ServerMessage::SnapshotAck {
                snapshot_id: outcome.snapshot_id,
                extracted_keywords: outcome.extracted_keywords,
                memory_size: outcome.memory_size,
                hypothesis_count: outcome.hypothesis_count,
            }),
            Err(err) => Some(ServerMessage::Error {
                message: err.to_string(),
            }),
        },
        ClientMessage::Nudge(nudge) => match session.apply_nudge(&nudge, unix_now_seconds()) {
            Ok(()) => Some(ServerMessage::NudgeAck),
            Err(err) => Some(ServerMessage::NudgeRejected {
                kind: err.kind,
                message: err.message,
            }),
        },
        ClientMessage::Query { target, limit } => match target {
            QueryTarget::Memory => Some(ServerMessage::TopMemory {
                items: session.top_memory(limit),
            }),
            QueryTarget::Hypotheses => Some(ServerMessage::TopHypotheses {
                items: session.top_hypotheses(limit),
            }),
        },
    }
}

fn unix_now_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or(0.0)
}

async fn handle_client(
    stream: UnixStream,
    message_tx: mpsc::UnboundedSender<ClientEnvelope>,
) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<String>();

    let writer_task = tokio::spawn(async move {
        while let Some(line) = reply_rx.recv().await {
            if write_half.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if write_half.write_all(b"\n").await.is_err() {
                break;
            }
        }
    });

    let mut lines = BufReader::new(read_half).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_client_message(line) {
            Ok(message) => {
                let _ = message_tx.send((message, reply_tx.clone()));
            }
            Err(err) => {
                tracing::warn!(target: "server", error = %err, "invalid_protocol_message");
                if let Ok(reply) = encode_server_message(&ServerMessage::Error {
                    message: err.to_string(),
                }) {
                    let _ = reply_tx.send(reply);
                }
            }
        }
    }

    drop(reply_tx);
    let _ = writer_task.await;
    Ok(())
}

fn prepare_socket_path(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("unable to create {}", parent.display()))?;
    }

    match fs::symlink_metadata(path) {
        Ok(metadata) => {
            if metadata.file_type().is_socket() || metadata.is_file() {
                fs::remove_file(path)
                    .with_context(|| format!("unable to remove stale socket {}", path.display()))?;
            } else {
                bail!(
                    "socket path exists but is not removable as file/socket: {}",
                    path.display()
                );
            }
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("unable to inspect {}", path.display()));
        }
    }

    Ok(())
}

fn cleanup_socket_path(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("unable to remove {}", path.display())),
    }
}
