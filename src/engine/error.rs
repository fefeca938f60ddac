use reqwest::StatusCode;

/// Failure of a single call to the process engine.
///
/// Transport failures and engine-reported failures are kept apart here for
/// logging, but callers treat every variant the same way.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Engine request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Engine returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Could not decode engine response: {0}")]
    Decode(String),

    #[error("Invalid engine URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl EngineError {
    /// True when the engine never produced an HTTP response.
    pub fn is_transport(&self) -> bool {
        matches!(self, EngineError::Transport(_))
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            EngineError::Status { status, .. } => Some(*status),
            EngineError::Transport(e) => e.status(),
            _ => None,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
