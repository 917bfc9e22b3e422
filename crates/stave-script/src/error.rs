//! Error types for the script runtime.

/// Result type for script operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("script runtime failed to start: {0}")]
    Prelude(String),

    #[error("{0}")]
    Script(String),

    #[error("unexpected reply from script runtime: {0}")]
    Protocol(String),

    #[error("script runtime is busy")]
    Busy,

    #[error(transparent)]
    Fs(#[from] stave_fs::Error),
}
