//! Error types for the speech translation pipeline

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage label, used to attribute collaborator failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Asr,
    Translation,
    Tts,
    Context,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Asr => write!(f, "ASR"),
            Stage::Translation => write!(f, "translation"),
            Stage::Tts => write!(f, "TTS"),
            Stage::Context => write!(f, "context"),
        }
    }
}

/// Main error type for the speech translation pipeline
///
/// Variants map to the error classes the transports surface:
/// validation errors, collaborator (model call) failures, and
/// state errors on the session registry. Cache failures never
/// appear here; the cache layer degrades to a miss internally.
#[derive(Error, Debug)]
pub enum Error {
    // Malformed or empty input, rejected before any model call
    #[error("invalid input: {0}")]
    Validation(String),

    // An underlying ASR/MT/TTS/context call failed
    #[error("{stage} error: {message}")]
    Collaborator { stage: Stage, message: String },

    // A model call exceeded its configured budget
    #[error("{stage} timed out after {timeout_ms}ms")]
    StageTimeout { stage: Stage, timeout_ms: u64 },

    // Session registry errors
    #[error("unknown session: {0}")]
    UnknownSession(Uuid),

    #[error("session already stopped: {0}")]
    SessionStopped(Uuid),

    #[error("unknown ASR session: {0}")]
    UnknownAsrSession(String),

    // Context registry errors
    #[error("unknown context: {0}")]
    UnknownContext(Uuid),

    // Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a validation error from a string
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a collaborator error attributed to a stage
    pub fn collaborator<S: Into<String>>(stage: Stage, msg: S) -> Self {
        Error::Collaborator {
            stage,
            message: msg.into(),
        }
    }

    /// Whether this error means the caller sent bad input
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Whether this error refers to a missing or inactive session/context
    pub fn is_state(&self) -> bool {
        matches!(
            self,
            Error::UnknownSession(_)
                | Error::SessionStopped(_)
                | Error::UnknownAsrSession(_)
                | Error::UnknownContext(_)
        )
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}
