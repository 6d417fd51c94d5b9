//! Common error types for showfav

use thiserror::Error;

/// Common result type for showfav operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the server and its clients
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Outbound HTTP request failed or was rejected
    #[error("HTTP error: {0}")]
    Http(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
