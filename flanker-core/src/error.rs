use thiserror::Error;

/// Failure taxonomy shared by every flanker crate.
///
/// All variants are fatal. An unrecognized key during a trial is not an
/// error: the response evaluator downgrades it to a no-response outcome.
#[derive(Debug, Error)]
pub enum FlankerError {
    /// Bad or missing configuration value. Raised before any trial runs.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Unsupported platform or display (e.g. frame-rate mismatch).
    #[error("environment error: {0}")]
    Environment(String),

    /// Operator pressed the abort key or closed the window.
    #[error("experiment aborted by user: {0}")]
    UserAbort(String),

    /// A stimulus was drawn from a drained sequence.
    #[error("stimulus sequence exhausted after {len} draws")]
    SequenceExhausted { len: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FlankerError {
    pub fn is_user_abort(&self) -> bool {
        matches!(self, FlankerError::UserAbort(_))
    }
}

pub type Result<T> = std::result::Result<T, FlankerError>;
