//! Error classification
//!
//! Every step against the session ends in one of four outcomes. Would-block
//! conditions are never errors for the caller; fatal ones are latched into the
//! connection's sticky slot.

use std::io;

/// Outcome of one step against the session
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Classified {
    /// Progress was made; the value is a byte count or 0 for a completed step
    Done(usize),

    /// More ciphertext must be fed in before retrying
    WantRead,

    /// Pending ciphertext must be drained before retrying
    WantWrite,

    /// Protocol or I/O failure; the session cannot continue
    Fatal(rustls::Error),
}

/// Classify the state of a session whose ciphertext has just been pumped.
pub(crate) fn handshake_progress(session: &rustls::Connection) -> Classified {
    if !session.is_handshaking() {
        Classified::Done(0)
    } else if session.wants_write() {
        Classified::WantWrite
    } else {
        Classified::WantRead
    }
}

/// Classify an I/O error surfaced by the session's plaintext reader or writer.
pub(crate) fn io_error(err: io::Error) -> Classified {
    match err.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => Classified::WantRead,
        _ => Classified::Fatal(io_failure(err)),
    }
}

/// Express an I/O failure in the error type latched by connections.
pub(crate) fn io_failure(err: io::Error) -> rustls::Error {
    match err.into_inner() {
        Some(inner) => match inner.downcast::<rustls::Error>() {
            Ok(tls) => *tls,
            Err(other) => rustls::Error::General(other.to_string()),
        },
        None => rustls::Error::General("I/O failure in TLS session".into()),
    }
}

/// Sticky fatal error slot. The first error wins until explicitly cleared.
#[derive(Debug, Default)]
pub(crate) struct StickyError(Option<rustls::Error>);

impl StickyError {
    /// Record `err` unless an error is already latched. Returns true if recorded.
    pub(crate) fn latch(&mut self, err: &rustls::Error) -> bool {
        if self.0.is_some() {
            return false;
        }
        self.0 = Some(err.clone());
        true
    }

    pub(crate) fn get(&self) -> Option<&rustls::Error> {
        self.0.as_ref()
    }

    pub(crate) fn clear(&mut self) {
        self.0 = None;
    }
}
