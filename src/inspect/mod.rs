//! Peer identity inspection
//!
//! This module provides read-only views computed on demand from a session:
//! * Verification outcome of the peer certificate
//! * Peer certificate fields (names, validity, fingerprints, key usage, RSA key)
//! * Negotiated cipher suite and protocol version

pub(crate) mod cipher;
mod certificate;
pub mod format;
mod outcome;

pub use certificate::PeerCertificate;
pub use cipher::NegotiatedCipher;
pub use outcome::{ChainShape, VerificationOutcome, VerifyError, NO_CERTIFICATE_MESSAGE};
