use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuityErrorKind {
    UnsupportedVersion,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuityError {
    pub kind: ContinuityErrorKind,
    pub message: String,
}

impl ContinuityError {
    pub fn new(kind: ContinuityErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ContinuityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ContinuityError {}

pub fn unsupported_version(message: impl Into<String>) -> ContinuityError {
    ContinuityError::new(ContinuityErrorKind::UnsupportedVersion, message)
}

pub fn internal_error(message: impl Into<String>) -> ContinuityError {
    ContinuityError::new(ContinuityErrorKind::Internal, message)
}
