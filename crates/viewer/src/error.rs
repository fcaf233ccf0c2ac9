//! Error types for the viewer core

use thiserror::Error;

/// Failure of a single asset or texture fetch.
///
/// Cloneable so the same failure can be logged, stored and dispatched to
/// listeners.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("failed to fetch '{path}': {message}")]
    Transport { path: String, message: String },

    #[error("failed to decode '{path}': {message}")]
    Decode { path: String, message: String },

    #[error("load was cancelled")]
    Cancelled,
}

impl LoadError {
    pub fn transport(path: impl Into<String>, message: impl ToString) -> Self {
        LoadError::Transport {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn decode(path: impl Into<String>, message: impl ToString) -> Self {
        LoadError::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Main error type for viewer operations
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("rendering backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("viewer is not active")]
    Inactive,

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("image encoding error: {0}")]
    Encode(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl From<image::ImageError> for ViewerError {
    fn from(e: image::ImageError) -> Self {
        ViewerError::Encode(e.to_string())
    }
}

/// Result type alias for viewer operations
pub type Result<T> = std::result::Result<T, ViewerError>;
