use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tracker::{
    KeywordMemoryItem, MainTaskHypothesis, SituationalSnapshot, TrackerErrorKind, UserNudge,
};

pub const DEFAULT_QUERY_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Snapshot(SituationalSnapshot),
    Nudge(UserNudge),
    Query { target: QueryTarget, limit: usize },
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryTarget {
    Memory,
    Hypotheses,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    pub message: String,
}

impl ProtocolError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProtocolError {}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireMessage {
    #[serde(rename = "type")]
    kind: WireMessageType,
    #[serde(default)]
    snapshot: Option<SituationalSnapshot>,
    #[serde(default)]
    nudge: Option<UserNudge>,
    #[serde(default)]
    target: Option<QueryTarget>,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum WireMessageType {
    Snapshot,
    Nudge,
    Query,
    Exit,
}

pub fn parse_client_message(line: &str) -> Result<ClientMessage, ProtocolError> {
    let wire: WireMessage = serde_json::from_str(line)?;
    let message = match wire.kind {
        WireMessageType::Snapshot => {
            let snapshot = wire
                .snapshot
                .ok_or_else(|| ProtocolError::new("snapshot message requires 'snapshot'"))?;
            ClientMessage::Snapshot(snapshot)
        }
        WireMessageType::Nudge => {
            let nudge = wire
                .nudge
                .ok_or_else(|| ProtocolError::new("nudge message requires 'nudge'"))?;
            ClientMessage::Nudge(nudge)
        }
        WireMessageType::Query => {
            let target = wire
                .target
                .ok_or_else(|| ProtocolError::new("query message requires 'target'"))?;
            ClientMessage::Query {
                target,
                limit: wire.limit.unwrap_or(DEFAULT_QUERY_LIMIT),
            }
        }
        WireMessageType::Exit => ClientMessage::Exit,
    };
    Ok(message)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    SnapshotAck {
        snapshot_id: String,
        extracted_keywords: usize,
        memory_size: usize,
        hypothesis_count: usize,
    },
    NudgeAck,
    NudgeRejected {
        kind: TrackerErrorKind,
        message: String,
    },
    TopMemory {
        items: Vec<KeywordMemoryItem>,
    },
    TopHypotheses {
        items: Vec<MainTaskHypothesis>,
    },
    Error {
        message: String,
    },
}

pub fn encode_server_message(message: &ServerMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}
