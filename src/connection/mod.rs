//! Connection management
//!
//! This module handles:
//! * Network-in / network-out ciphertext queues
//! * Connection lifecycle (create, handshake, cleartext I/O, shutdown, close)
//! * Handshake state machine and error classification
//! * TLS context configuration and always-accept certificate verification

mod buffers;
mod classify;
mod conn;
mod state;
mod tls;
mod verifier;

pub use conn::Connection;
pub use state::HandshakeState;
pub use tls::{
    parse_server_name, Role, TlsContext, TlsContextBuilder, TlsVersion, VerifyMode,
    DEFAULT_CHUNK_SIZE,
};
