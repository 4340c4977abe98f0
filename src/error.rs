// src/error.rs

//! Unified error handling for the watcher application.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client construction or request building failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Feed fetch failed: network error, timeout, or non-2xx status
    #[error("Feed fetch failed: {0}")]
    Fetch(String),

    /// Every parse strategy rejected the feed document
    #[error("Feed parse failed: {0}")]
    Parse(String),

    /// Seen-incident file exists but cannot be read back
    #[error("Corrupt state file {path:?}: {message}")]
    CorruptState { path: PathBuf, message: String },

    /// Webhook delivery failed: non-2xx response or transport error
    #[error("Webhook delivery failed: {message}")]
    Delivery { status: Option<u16>, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Create a feed fetch error.
    pub fn fetch(message: impl fmt::Display) -> Self {
        Self::Fetch(message.to_string())
    }

    /// Create a feed parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a corrupt state error for the given file.
    pub fn corrupt_state(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::CorruptState {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a webhook delivery error.
    pub fn delivery(status: Option<u16>, message: impl fmt::Display) -> Self {
        Self::Delivery {
            status,
            message: message.to_string(),
        }
    }
}
