//! Common error types for the matrix service

use thiserror::Error;

/// Common result type for matrix service operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types shared by the server and the client
///
/// All of these are session-local: a failing session never takes down the
/// listener or any other session.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed, truncated or oversized message on the wire
    #[error("Protocol decode error: {0}")]
    ProtocolDecode(String),

    /// Rejected job parameters (worker count, chunk size, matrix size)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Peer went away while frames were being written
    #[error("Transport write error: {0}")]
    TransportWrite(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
