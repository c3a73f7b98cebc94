//! Error types for tracker construction and rendering.

use thiserror::Error;

/// Result type alias for tracker operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by [`ProgressTracker`](crate::ProgressTracker) and its builders.
#[derive(Debug, Error)]
pub enum Error {
    /// A construction parameter failed validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Writing the progress line to the output stream failed.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}
