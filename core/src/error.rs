//! Error types for the lobbywatch-core library.

use thiserror::Error;

/// Result type alias for lobbywatch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while watching traffic and correlating identities.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to execute a system command.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// Failed to parse command output.
    #[error("Failed to parse output: {0}")]
    ParseError(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Platform not supported.
    #[error("Platform not supported: {0}")]
    UnsupportedPlatform(String),

    /// Packet capture could not be started or failed mid-flight.
    #[error("Capture error: {0}")]
    Capture(String),

    /// An outbound notification could not be delivered.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// The sighting store rejected an operation.
    #[error("Store error: {0}")]
    Store(String),
}
