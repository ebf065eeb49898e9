//! Animation error types

use thiserror::Error;

/// Errors raised at construction and configuration boundaries.
///
/// Scheduler operations themselves are total and never return these.
#[derive(Error, Debug)]
pub enum AnimationError {
    /// A builder or config received a value outside its contract
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Scheduler config could not be parsed
    #[error("Failed to parse scheduler config: {0}")]
    Config(#[from] toml::de::Error),
}

impl AnimationError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
