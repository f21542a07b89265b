//! Error types for the Floodgate library.

use thiserror::Error;

/// Main error type for Floodgate operations.
#[derive(Error, Debug)]
pub enum FloodgateError {
    /// Configuration-related errors: unknown scope names, missing resource
    /// identifiers, non-positive windows, unparseable configuration files.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Counter store errors: the store is unreachable or the admission
    /// script could not be loaded or executed.
    #[error("Store error: {0}")]
    Store(#[from] redis::RedisError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Floodgate operations.
pub type Result<T> = std::result::Result<T, FloodgateError>;
