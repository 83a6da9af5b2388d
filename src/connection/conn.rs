//! Core connection type

use super::buffers::BufferPair;
use super::classify::{self, Classified, StickyError};
use super::state::HandshakeState;
use super::tls::{Role, TlsContext, VerifyMode};
use super::verifier::{RecordingClientVerifier, RecordingServerVerifier, VerifyRecord};
use crate::inspect::{NegotiatedCipher, PeerCertificate, VerificationOutcome};
use crate::metrics::labels;
use crate::{Error, Result};
use bytes::{Bytes, BytesMut};
use std::io::{Read, Write};
use std::sync::Arc;

/// A TLS session driven entirely through in-memory buffers
///
/// The connection never performs I/O of its own. Ciphertext from the peer is
/// appended with [`feed_ciphertext`](Self::feed_ciphertext) and ciphertext for
/// the peer is taken with [`drain_ciphertext`](Self::drain_ciphertext). Every
/// call returns immediately; when the handshake cannot progress, cleartext
/// operations report zero bytes and the caller retries after moving ciphertext.
///
/// # Examples
///
/// ```ignore
/// let mut client = Connection::new(&client_ctx, false, false, false)?;
/// let mut server = Connection::new(&server_ctx, true, true, false)?;
///
/// while !(client.is_established() && server.is_established()) {
///     client.start()?;
///     server.feed_ciphertext(&client.drain_ciphertext(usize::MAX)?)?;
///     server.start()?;
///     client.feed_ciphertext(&server.drain_ciphertext(usize::MAX)?)?;
/// }
///
/// if !server.verification_status().is_ok() {
///     server.close();
/// }
/// ```
#[derive(Debug)]
pub struct Connection {
    role: Role,
    verify_mode: VerifyMode,
    session: Option<rustls::Connection>,
    buffers: BufferPair,
    state: HandshakeState,
    sticky: StickyError,
    // Cause of the transition to Failed; survives clear_error()
    failure: Option<rustls::Error>,
    verify_record: VerifyRecord,
    chunk_size: usize,
    handshake_steps: u32,
    peer_closed: bool,
    close_notify_sent: bool,
}

impl Connection {
    /// Create a connection bound to two fresh, empty ciphertext queues.
    ///
    /// The verify mode follows from the flags: `none` for clients or servers not
    /// requesting a certificate, `optional` when requesting without rejecting
    /// unauthenticated peers, `required` otherwise. Peer certificates are accepted
    /// whatever their verification outcome; check
    /// [`verification_status`](Self::verification_status) once established.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for a server context without a certificate and key,
    /// or `Error::Tls` if rustls rejects the session configuration.
    pub fn new(
        context: &TlsContext,
        is_server: bool,
        request_cert: bool,
        reject_unauthenticated: bool,
    ) -> Result<Self> {
        let role = Role::from_is_server(is_server);
        let verify_mode = VerifyMode::from_flags(is_server, request_cert, reject_unauthenticated);
        let verify_record = VerifyRecord::default();

        let session: rustls::Connection = match role {
            Role::Client => {
                let verifier = Arc::new(RecordingServerVerifier::new(
                    context,
                    verify_record.clone(),
                ));
                let config = context.client_config(verifier)?;
                rustls::ClientConnection::new(Arc::new(config), context.client_server_name()?)?
                    .into()
            }
            Role::Server => {
                let verifier = Arc::new(RecordingClientVerifier::new(
                    context,
                    verify_mode,
                    verify_record.clone(),
                ));
                let config = context.server_config(verifier)?;
                rustls::ServerConnection::new(Arc::new(config))?.into()
            }
        };

        crate::metrics::counters::connection_created(role.label());
        tracing::debug!(role = %role, verify_mode = %verify_mode, "connection created");

        Ok(Self {
            role,
            verify_mode,
            session: Some(session),
            buffers: BufferPair::new(),
            state: HandshakeState::Handshaking,
            sticky: StickyError::default(),
            failure: None,
            verify_record,
            chunk_size: context.chunk_size(),
            handshake_steps: 0,
            peer_closed: false,
            close_notify_sent: false,
        })
    }

    /// Drive the handshake one step.
    ///
    /// A no-op once established. Returns `Handshaking` when more ciphertext must be
    /// fed in or drained out before the next step.
    ///
    /// # Errors
    ///
    /// Returns `Error::Tls` with the fatal cause (latched as the sticky error), or
    /// `Error::Closed` after [`close`](Self::close).
    pub fn start(&mut self) -> Result<HandshakeState> {
        self.drive_handshake()?;
        Ok(self.state)
    }

    /// Release the session. Only the first call has an effect; the sticky error
    /// is kept.
    pub fn close(&mut self) {
        if self.state == HandshakeState::Closed {
            return;
        }
        self.session = None;
        self.buffers.clear();
        if let Err(e) = self.state.transition(HandshakeState::Closed) {
            tracing::debug!(error = %e, "close from unexpected state");
        }
        tracing::debug!(role = %self.role, "connection closed");
    }

    /// Queue a close_notify alert for the peer in network-out.
    ///
    /// Cleartext can still be read afterwards, but no more can be written.
    ///
    /// # Errors
    ///
    /// `Error::Closed` after close, the failure cause once `Failed`.
    pub fn shutdown(&mut self) -> Result<()> {
        self.ensure_usable()?;

        let flushed = {
            let (session, buffers) = self.parts()?;
            session.send_close_notify();
            buffers.flush(session)
        };
        self.close_notify_sent = true;
        if let Err(e) = flushed {
            return Err(self.fail(classify::io_failure(e), labels::STAGE_SHUTDOWN));
        }
        tracing::debug!(role = %self.role, "close_notify queued");
        Ok(())
    }

    /// Append ciphertext received from the peer to network-in.
    ///
    /// The whole slice is accepted unless a fatal error is latched.
    pub fn feed_ciphertext(&mut self, data: &[u8]) -> Result<usize> {
        self.ensure_open()?;
        if let Some(err) = self.sticky.get() {
            return Err(Error::Tls(err.clone()));
        }
        Ok(self.buffers.feed(data))
    }

    /// Remove up to `max_len` bytes of ciphertext destined for the peer.
    ///
    /// An empty result means nothing is pending.
    pub fn drain_ciphertext(&mut self, max_len: usize) -> Result<Bytes> {
        self.ensure_open()?;
        Ok(self.buffers.drain(max_len))
    }

    /// Ciphertext bytes waiting to be drained.
    pub fn pending_ciphertext_out(&self) -> Result<usize> {
        self.ensure_open()?;
        Ok(self.buffers.pending_out())
    }

    /// Ciphertext bytes fed in but not yet consumed by the session.
    pub fn pending_ciphertext_in(&self) -> Result<usize> {
        self.ensure_open()?;
        Ok(self.buffers.pending_in())
    }

    /// Submit cleartext for encryption; the records land in network-out.
    ///
    /// Returns 0 without consuming anything while the handshake is incomplete.
    ///
    /// # Errors
    ///
    /// `Error::Shutdown` once [`shutdown`](Self::shutdown) has queued close_notify,
    /// `Error::Closed` after close, the failure cause once `Failed`.
    pub fn write_cleartext(&mut self, data: &[u8]) -> Result<usize> {
        self.ensure_usable()?;
        if self.close_notify_sent {
            return Err(Error::Shutdown);
        }
        if !self.drive_handshake()? {
            return Ok(0);
        }

        let written = {
            let (session, buffers) = self.parts()?;
            let mut written = 0;
            let result = loop {
                if written == data.len() {
                    break Ok(());
                }
                match session.writer().write(&data[written..]) {
                    Ok(0) => break Ok(()),
                    Ok(n) => written += n,
                    Err(e) => break Err(classify::io_error(e)),
                }
                // Keep the session's send buffer empty so its limit never truncates a write
                if let Err(e) = buffers.flush(session) {
                    break Err(Classified::Fatal(classify::io_failure(e)));
                }
            };
            result.map(|()| written)
        };

        let written = match written {
            Ok(n) => n,
            Err(classified) => self.settle(classified, labels::STAGE_WRITE)?,
        };
        crate::metrics::counters::cleartext_bytes(labels::DIRECTION_ENCRYPT, written);
        Ok(written)
    }

    /// Read up to `max_len` bytes of decrypted application data.
    ///
    /// At most the context's chunk size is returned per call. An empty result
    /// means nothing is available yet (or the peer has closed).
    pub fn read_cleartext(&mut self, max_len: usize) -> Result<Bytes> {
        if !self.drive_handshake()? {
            return Ok(Bytes::new());
        }

        let pumped = {
            let (session, buffers) = self.parts()?;
            pump(session, buffers)
        };
        match pumped {
            Ok(closed) => self.note_peer_closed(closed),
            Err(err) => return Err(self.fail(err, labels::STAGE_READ)),
        }

        let limit = max_len.min(self.chunk_size);
        if limit == 0 {
            return Ok(Bytes::new());
        }

        let read = {
            let (session, _) = self.parts()?;
            let mut chunk = BytesMut::zeroed(limit);
            session.reader().read(&mut chunk).map(|n| {
                chunk.truncate(n);
                chunk.freeze()
            })
        };

        match read {
            Ok(data) => {
                crate::metrics::counters::cleartext_bytes(labels::DIRECTION_DECRYPT, data.len());
                Ok(data)
            }
            Err(e) => {
                self.settle(classify::io_error(e), labels::STAGE_READ)?;
                Ok(Bytes::new())
            }
        }
    }

    /// Latched fatal error, if any.
    pub fn error(&self) -> Option<&rustls::Error> {
        self.sticky.get()
    }

    /// Forget the latched fatal error. A failed session stays failed.
    pub fn clear_error(&mut self) {
        self.sticky.clear();
    }

    /// Check if the handshake has completed
    pub fn is_established(&self) -> bool {
        self.state == HandshakeState::Established
    }

    /// Current handshake state
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Client or server side
    pub fn role(&self) -> Role {
        self.role
    }

    /// Verify mode derived at creation
    pub fn verify_mode(&self) -> VerifyMode {
        self.verify_mode
    }

    /// Check if close_notify has been queued by [`shutdown`](Self::shutdown)
    pub fn close_notify_sent(&self) -> bool {
        self.close_notify_sent
    }

    /// Check if the peer's close_notify has been processed
    pub fn peer_closed(&self) -> bool {
        self.peer_closed
    }

    /// Outcome of verifying the peer's certificate.
    ///
    /// `NoCertificate` until the peer has presented one, and after close.
    pub fn verification_status(&self) -> VerificationOutcome {
        let presented = self
            .session
            .as_ref()
            .and_then(|session| session.peer_certificates())
            .is_some_and(|certs| !certs.is_empty());

        if !presented {
            return VerificationOutcome::NoCertificate;
        }
        match self.verify_record.load() {
            Some(reason) => VerificationOutcome::Failed(reason),
            None => VerificationOutcome::Ok,
        }
    }

    /// Fields of the peer's leaf certificate, if one was presented.
    ///
    /// # Errors
    ///
    /// Returns `Error::Certificate` if the certificate cannot be decoded.
    pub fn peer_certificate(&self) -> Result<Option<PeerCertificate>> {
        let leaf = self
            .session
            .as_ref()
            .and_then(|session| session.peer_certificates())
            .and_then(|certs| certs.first());

        match leaf {
            Some(der) => PeerCertificate::from_der(der.as_ref()).map(Some),
            None => Ok(None),
        }
    }

    /// Cipher suite and protocol version, once established.
    pub fn negotiated_cipher(&self) -> Option<NegotiatedCipher> {
        if !self.is_established() {
            return None;
        }
        let session = self.session.as_ref()?;
        let suite = session.negotiated_cipher_suite()?;
        let version = session.protocol_version()?;
        Some(NegotiatedCipher::new(suite.suite(), version))
    }

    /// Advance the handshake if needed. Returns whether the session is established.
    fn drive_handshake(&mut self) -> Result<bool> {
        match self.state {
            HandshakeState::Established => return Ok(true),
            HandshakeState::Failed => return Err(self.failure_error()),
            HandshakeState::Closed => return Err(Error::Closed),
            HandshakeState::Handshaking => {}
        }

        let span = tracing::debug_span!("tls_handshake", role = %self.role);
        let _enter = span.enter();

        self.handshake_steps = self.handshake_steps.saturating_add(1);
        let classified = {
            let (session, buffers) = self.parts()?;
            match pump(session, buffers) {
                Ok(closed) => {
                    let progress = classify::handshake_progress(session);
                    self.peer_closed |= closed;
                    progress
                }
                Err(err) => Classified::Fatal(err),
            }
        };

        match classified {
            Classified::Done(_) => {
                self.complete_handshake()?;
                Ok(true)
            }
            other => {
                self.settle(other, labels::STAGE_HANDSHAKE)?;
                Ok(false)
            }
        }
    }

    fn complete_handshake(&mut self) -> Result<()> {
        self.state.transition(HandshakeState::Established)?;

        crate::metrics::counters::handshake_completed(self.role.label());
        crate::metrics::histograms::handshake_steps(self.role.label(), self.handshake_steps);

        let cipher = self.negotiated_cipher();
        tracing::debug!(
            steps = self.handshake_steps,
            cipher = cipher.as_ref().map(|c| c.name.as_str()),
            version = cipher.as_ref().map(|c| c.version.as_str()),
            "handshake complete"
        );
        Ok(())
    }

    /// Turn a classified step into the caller's result.
    fn settle(&mut self, classified: Classified, stage: &'static str) -> Result<usize> {
        match classified {
            Classified::Done(n) => Ok(n),
            Classified::WantRead => {
                tracing::trace!(stage, role = %self.role, "want read");
                Ok(0)
            }
            Classified::WantWrite => {
                tracing::trace!(stage, role = %self.role, "want write");
                Ok(0)
            }
            Classified::Fatal(err) => Err(self.fail(err, stage)),
        }
    }

    /// Latch a fatal error and mark the session failed.
    fn fail(&mut self, err: rustls::Error, stage: &'static str) -> Error {
        tracing::warn!(role = %self.role, stage, error = %err, "fatal TLS error");
        crate::metrics::counters::fatal_error(self.role.label(), stage);

        self.sticky.latch(&err);
        if self.failure.is_none() {
            self.failure = Some(err.clone());
        }
        if self.state.can_transition_to(HandshakeState::Failed) {
            if let Err(e) = self.state.transition(HandshakeState::Failed) {
                tracing::debug!(error = %e, "failed state not recorded");
            }
        }
        Error::Tls(err)
    }

    fn failure_error(&self) -> Error {
        match &self.failure {
            Some(err) => Error::Tls(err.clone()),
            None => Error::InvalidState {
                expected: "failure cause".into(),
                actual: self.state.to_string(),
            },
        }
    }

    fn note_peer_closed(&mut self, closed: bool) {
        if closed && !self.peer_closed {
            tracing::debug!(role = %self.role, "peer sent close_notify");
        }
        self.peer_closed |= closed;
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == HandshakeState::Closed {
            return Err(Error::Closed);
        }
        Ok(())
    }

    fn ensure_usable(&self) -> Result<()> {
        match self.state {
            HandshakeState::Closed => Err(Error::Closed),
            HandshakeState::Failed => Err(self.failure_error()),
            _ => Ok(()),
        }
    }

    fn parts(&mut self) -> Result<(&mut rustls::Connection, &mut BufferPair)> {
        match self.session.as_mut() {
            Some(session) => Ok((session, &mut self.buffers)),
            None => Err(Error::Closed),
        }
    }
}

/// Move ciphertext between the queues and the session until neither can progress.
///
/// Returns whether the peer's close_notify was seen.
fn pump(
    session: &mut rustls::Connection,
    buffers: &mut BufferPair,
) -> std::result::Result<bool, rustls::Error> {
    let mut peer_closed = false;

    let outcome = loop {
        if let Err(e) = buffers.flush(session) {
            break Err(classify::io_failure(e));
        }
        // rustls reads a zero-length read as EOF, so only offer bytes that arrived
        if buffers.pending_in() == 0 || !session.wants_read() {
            break Ok(peer_closed);
        }
        match buffers.ingest(session) {
            Ok(0) => break Ok(peer_closed),
            Ok(_) => {}
            Err(e) => break Err(classify::io_failure(e)),
        }
        match session.process_new_packets() {
            Ok(io_state) => peer_closed |= io_state.peer_has_closed(),
            Err(e) => break Err(e),
        }
    };

    if outcome.is_err() {
        // The session may have queued an alert describing the failure
        if let Err(e) = buffers.flush(session) {
            tracing::trace!(error = %e, "alert not flushed");
        }
    }
    outcome
}
