//! Error types for the pagewatch service

use std::time::Duration;

/// Errors that can occur in the pagewatch service
#[derive(Debug, thiserror::Error)]
pub enum PageWatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid element selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Notifier error: {0}")]
    Notifier(String),

    #[error("Monitor task error: {0}")]
    Monitor(String),
}

/// Result type alias for pagewatch operations
pub type Result<T> = std::result::Result<T, PageWatchError>;
