//! memtls: a non-blocking TLS session engine over in-memory buffers
//!
//! A [`Connection`] drives a rustls session without ever touching a socket.
//! Ciphertext moves through two byte queues that the caller fills and drains
//! on its own schedule:
//!
//! * **network-in**: bytes received from the peer, appended with
//!   [`Connection::feed_ciphertext`]
//! * **network-out**: bytes the engine produced for the peer, removed with
//!   [`Connection::drain_ciphertext`]
//!
//! Cleartext goes in through [`Connection::write_cleartext`] and comes out of
//! [`Connection::read_cleartext`]. Both transparently drive the handshake and
//! report `0` bytes (never an error) when they cannot make progress yet.
//!
//! Peer certificates are always accepted during the handshake. The outcome of
//! chain verification is recorded and must be checked by the caller through
//! [`Connection::verification_status`] once the handshake has completed.
//!
//! ```ignore
//! use memtls::{Connection, TlsContext};
//!
//! let ctx = TlsContext::builder().ca_cert_path("ca.pem").build()?;
//! let mut conn = Connection::new(&ctx, false, false, false)?;
//! conn.start()?;
//! let hello = conn.drain_ciphertext(16 * 1024)?;
//! // ... hand `hello` to the transport, feed the reply back in ...
//! ```

pub mod connection;
pub mod error;
pub mod inspect;
pub mod metrics;

pub use connection::{
    Connection, HandshakeState, Role, TlsContext, TlsContextBuilder, TlsVersion, VerifyMode,
    DEFAULT_CHUNK_SIZE,
};
pub use error::{Error, Result};
pub use inspect::{NegotiatedCipher, PeerCertificate, VerificationOutcome, VerifyError};
