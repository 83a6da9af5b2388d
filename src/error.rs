//! Error types for memtls

use std::io;
use thiserror::Error;

/// Main error type for memtls operations
#[derive(Debug, Error)]
pub enum Error {
    /// Fatal TLS protocol failure reported by rustls
    ///
    /// This is the error that gets latched into a connection's sticky error slot.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// I/O error while loading context material
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The connection was closed; no session is available
    #[error("connection closed: no TLS session")]
    Closed,

    /// Cleartext submitted after close_notify was queued
    #[error("TLS session is shut down: no further cleartext can be sent")]
    Shutdown,

    /// Invalid context or connection configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Peer certificate could not be parsed
    #[error("certificate error: {0}")]
    Certificate(String),

    /// Invalid handshake state transition
    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState {
        /// Expected state
        expected: String,
        /// Actual state
        actual: String,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a fatal TLS protocol error
    pub fn is_tls(&self) -> bool {
        matches!(self, Error::Tls(_))
    }

    /// Check if this error reports an operation on a closed connection
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::Closed)
    }

    /// Get the underlying rustls error, if any
    pub fn as_tls(&self) -> Option<&rustls::Error> {
        match self {
            Error::Tls(e) => Some(e),
            _ => None,
        }
    }
}
