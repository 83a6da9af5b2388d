//! Always-accept certificate verifiers
//!
//! TLS record I/O cannot wait for an application-level authorization decision, so
//! the handshake never fails on certificate grounds. Each verifier runs the regular
//! webpki checks, records the outcome in a [`VerifyRecord`] shared with the owning
//! connection, and then accepts the certificate. Callers must inspect the outcome
//! once the handshake has completed.

use super::tls::{TlsContext, VerifyMode};
use crate::inspect::{ChainShape, VerifyError};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::WebPkiSupportedAlgorithms;
use rustls::server::danger::{ClientCertVerified, ClientCertVerifier};
use rustls::server::WebPkiClientVerifier;
use rustls::{CertificateError, DigitallySignedStruct, DistinguishedName, SignatureScheme};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use std::sync::{Arc, Mutex, PoisonError};

/// Verification result slot shared between a connection and its verifier.
///
/// `None` means the chain verified (or nothing has been verified yet).
#[derive(Debug, Clone, Default)]
pub(crate) struct VerifyRecord(Arc<Mutex<Option<VerifyError>>>);

impl VerifyRecord {
    fn store(&self, outcome: Option<VerifyError>) {
        match &outcome {
            Some(reason) => {
                tracing::debug!(reason = %reason, "peer certificate failed verification");
                crate::metrics::counters::verification_failed(reason.as_str());
            }
            None => tracing::debug!("peer certificate verified"),
        }
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = outcome;
    }

    pub(crate) fn load(&self) -> Option<VerifyError> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

fn is_name_mismatch(err: &rustls::Error) -> bool {
    matches!(
        err,
        rustls::Error::InvalidCertificate(
            CertificateError::NotValidForName | CertificateError::NotValidForNameContext { .. }
        )
    )
}

fn unknown_issuer() -> rustls::Error {
    rustls::Error::InvalidCertificate(CertificateError::UnknownIssuer)
}

/// Verifies server certificates on client connections.
#[derive(Debug)]
pub(crate) struct RecordingServerVerifier {
    inner: Option<Arc<WebPkiServerVerifier>>,
    supported_algs: WebPkiSupportedAlgorithms,
    verify_hostname: bool,
    record: VerifyRecord,
}

impl RecordingServerVerifier {
    pub(crate) fn new(context: &TlsContext, record: VerifyRecord) -> Self {
        let provider = context.provider();
        let roots = context.roots();

        // An empty trust store verifies nothing; every chain then has an unknown issuer
        let inner = if roots.is_empty() {
            None
        } else {
            match WebPkiServerVerifier::builder_with_provider(roots, provider.clone()).build() {
                Ok(verifier) => Some(verifier),
                Err(e) => {
                    tracing::warn!(error = %e, "server certificate verifier unavailable");
                    None
                }
            }
        };

        Self {
            inner,
            supported_algs: provider.signature_verification_algorithms,
            verify_hostname: context.verify_hostname(),
            record,
        }
    }
}

impl ServerCertVerifier for RecordingServerVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let result = match &self.inner {
            Some(inner) => inner
                .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
                .map(|_| ()),
            None => Err(unknown_issuer()),
        };

        // webpki checks the name only after the chain, so a mismatch implies a good chain
        let outcome = match result {
            Ok(()) => None,
            Err(err) if is_name_mismatch(&err) && !self.verify_hostname => None,
            Err(err) => Some(VerifyError::from_rustls(
                &err,
                &ChainShape::inspect(end_entity, intermediates),
            )),
        };
        self.record.store(outcome);

        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.supported_algs)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.supported_algs)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.supported_algs.supported_schemes()
    }
}

/// Requests and verifies client certificates on server connections.
#[derive(Debug)]
pub(crate) struct RecordingClientVerifier {
    inner: Option<Arc<dyn ClientCertVerifier>>,
    mode: VerifyMode,
    supported_algs: WebPkiSupportedAlgorithms,
    record: VerifyRecord,
}

impl RecordingClientVerifier {
    pub(crate) fn new(context: &TlsContext, mode: VerifyMode, record: VerifyRecord) -> Self {
        let provider = context.provider();
        let roots = context.roots();

        let inner = if roots.is_empty() {
            None
        } else {
            match WebPkiClientVerifier::builder_with_provider(roots, provider.clone()).build() {
                Ok(verifier) => Some(verifier),
                Err(e) => {
                    tracing::warn!(error = %e, "client certificate verifier unavailable");
                    None
                }
            }
        };

        Self {
            inner,
            mode,
            supported_algs: provider.signature_verification_algorithms,
            record,
        }
    }
}

impl ClientCertVerifier for RecordingClientVerifier {
    fn offer_client_auth(&self) -> bool {
        self.mode.requests_certificate()
    }

    fn client_auth_mandatory(&self) -> bool {
        self.mode == VerifyMode::Required
    }

    fn root_hint_subjects(&self) -> &[DistinguishedName] {
        match &self.inner {
            Some(inner) => inner.root_hint_subjects(),
            None => &[],
        }
    }

    fn verify_client_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        now: UnixTime,
    ) -> Result<ClientCertVerified, rustls::Error> {
        let result = match &self.inner {
            Some(inner) => inner
                .verify_client_cert(end_entity, intermediates, now)
                .map(|_| ()),
            None => Err(unknown_issuer()),
        };

        let outcome = result.err().map(|err| {
            VerifyError::from_rustls(&err, &ChainShape::inspect(end_entity, intermediates))
        });
        self.record.store(outcome);

        Ok(ClientCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.supported_algs)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.supported_algs)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.supported_algs.supported_schemes()
    }
}
