use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerErrorKind {
    InvalidReference,
    EmptyGoal,
    EmptyKeyword,
    InvariantViolation,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerError {
    pub kind: TrackerErrorKind,
    pub message: String,
}

impl TrackerError {
    pub fn new(kind: TrackerErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TrackerError {}

pub fn invalid_reference(message: impl Into<String>) -> TrackerError {
    TrackerError::new(TrackerErrorKind::InvalidReference, message)
}

pub fn empty_goal(message: impl Into<String>) -> TrackerError {
    TrackerError::new(TrackerErrorKind::EmptyGoal, message)
}

pub fn empty_keyword(message: impl Into<String>) -> TrackerError {
    TrackerError::new(TrackerErrorKind::EmptyKeyword, message)
}

pub fn invariant_violation(message: impl Into<String>) -> TrackerError {
    TrackerError::new(TrackerErrorKind::InvariantViolation, message)
}

pub fn internal_error(message: impl Into<String>) -> TrackerError {
    TrackerError::new(TrackerErrorKind::Internal, message)
}
