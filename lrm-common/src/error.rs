//! Common error types for the licensing roadmap

use thiserror::Error;

/// Common result type for licensing roadmap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the licensing roadmap crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored JSON could not be read or written
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Record already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn holder_not_found(account: &str) -> Self {
        Error::NotFound(format!("License holder not found: {}", account))
    }

    pub fn license_not_found(license_id: &str) -> Self {
        Error::NotFound(format!("License not found: {}", license_id))
    }
}
