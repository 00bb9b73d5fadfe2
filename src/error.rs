use thiserror::Error;

/// Failures reported by a camera/media backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("no video input matches the requested constraints")]
    DeviceNotFound,

    #[error("constraint rejected: {0}")]
    Constraint(String),

    #[error("media backend error: {0}")]
    Other(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("decoder failed: {0}")]
pub struct DecodeError(pub String);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("camera acquisition failed: {0}")]
    Acquisition(#[from] MediaError),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("camera is not started")]
    NotStarted,

    #[error("no code confirmed within {0} ms")]
    Timeout(u64),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("start was cancelled by stop()")]
    Cancelled,

    #[error("not an image: {0}")]
    NotAnImage(String),

    #[error("failed to load image: {0}")]
    ImageLoad(String),
}

impl ScanError {
    pub fn unsupported(what: impl Into<String>) -> Self {
        ScanError::Unsupported(what.into())
    }
}
