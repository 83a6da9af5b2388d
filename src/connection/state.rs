//! Handshake state machine

use crate::{Error, Result};

/// Handshake state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Handshake not yet complete (initial state)
    Handshaking,

    /// Handshake complete, application data may flow
    Established,

    /// A fatal error occurred; no further I/O is attempted
    Failed,

    /// Session released by `close()`
    Closed,
}

impl HandshakeState {
    /// Check if transition is valid
    pub fn can_transition_to(&self, next: HandshakeState) -> bool {
        use HandshakeState::*;

        matches!(
            (self, next),
            (Handshaking, Established)
                | (Handshaking, Failed)
                | (Established, Failed)
                | (Handshaking, Closed)
                | (Established, Closed)
                | (Failed, Closed)
        )
    }

    /// Transition to new state
    pub fn transition(&mut self, next: HandshakeState) -> Result<()> {
        if !self.can_transition_to(next) {
            return Err(Error::InvalidState {
                expected: format!("valid transition from {:?}", self),
                actual: format!("{:?}", next),
            });
        }
        tracing::debug!(from = %self, to = %next, "handshake state transition");
        *self = next;
        Ok(())
    }

    /// Whether data operations must short-circuit in this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Closed)
    }
}

impl std::fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Handshaking => write!(f, "handshaking"),
            Self::Established => write!(f, "established"),
            Self::Failed => write!(f, "failed"),
            Self::Closed => write!(f, "closed"),
        }
    }
}
