//! Error types for the stratus application.
//!
//! This module defines a comprehensive error enum that covers all possible
//! error conditions in the application.

use thiserror::Error;

/// The main error type for stratus operations.
#[derive(Error, Debug)]
pub enum StratusError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Invalid parameter errors
    #[error("Invalid parameter: {param} - {message}")]
    InvalidParameter { param: String, message: String },

    /// Malformed time key encoding
    #[error("Invalid time key: {value}")]
    InvalidTimeKey { value: String },

    /// Unknown session id
    #[error("Session not found: {id}")]
    SessionNotFound { id: String },

    /// Layer state is not yet complete enough for the requested operation
    #[error("Layer not ready: {message}")]
    LayerNotReady { message: String },

    /// Upstream service errors (metadata or map service)
    #[error("Upstream service error: {message}")]
    Upstream { message: String },

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server errors
    #[error("Server error: {message}")]
    Server { message: String },
}

/// Convenience type alias for Results with StratusError
pub type Result<T> = std::result::Result<T, StratusError>;
