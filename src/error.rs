//! Error types for the beats interaction service
//!
//! Domain validation failures (`NotFound`, `Conflict`, `Unprocessable`)
//! carry the user-facing message and are surfaced to the route layer as-is.
//! Infrastructure variants wrap the underlying error for logging at the
//! boundary.

use thiserror::Error;

/// Convenience Result type using the service Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the interaction service
#[derive(Error, Debug)]
pub enum Error {
    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Broker client errors (connect, consume, produce)
    #[error("Broker error: {0}")]
    Broker(#[from] rdkafka::error::KafkaError),

    /// Event payload or message encoding errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested entity does not exist or its id is malformed
    #[error("Not found: {0}")]
    NotFound(String),

    /// A conflicting record already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Request is well-formed but violates a domain invariant
    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    /// Unexpected internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
