//! Error types for Timeline.

use thiserror::Error;

/// Main error type for Timeline operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    /// An interval or range was built from malformed input.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// One or more listeners failed during a publish.
    #[error("{failed} listener(s) failed on topic '{topic}': {message}")]
    ListenerFailed {
        topic: String,
        failed: usize,
        message: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl TimelineError {
    /// Shorthand for an [`TimelineError::InvalidArgument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        TimelineError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Returns true if the error was caused by caller input.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, TimelineError::InvalidArgument { .. })
    }

    /// Returns the topic name if the error came from a publish.
    pub fn topic(&self) -> Option<&str> {
        match self {
            TimelineError::ListenerFailed { topic, .. } => Some(topic),
            _ => None,
        }
    }
}

/// Convenience Result type for Timeline operations.
pub type Result<T> = std::result::Result<T, TimelineError>;

impl From<serde_json::Error> for TimelineError {
    fn from(err: serde_json::Error) -> Self {
        TimelineError::SerializationError(err.to_string())
    }
}
