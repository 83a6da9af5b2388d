//! Peer certificate verification outcomes
//!
//! Names follow the X.509 verify error identifiers that TLS front-ends have long
//! exposed to applications, so existing policy code can keep matching on them.

use rustls::{CertRevocationListError, CertificateError};
use rustls_pki_types::CertificateDer;
use serde::{Serialize, Serializer};
use x509_parser::prelude::{FromDer, X509Certificate};

/// Reported when the peer never presented a certificate.
pub const NO_CERTIFICATE_MESSAGE: &str = "Unable to get peer certificate";

/// Named reason a peer certificate failed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    UnableToGetIssuerCert,
    UnableToGetCrl,
    UnableToDecryptCertSignature,
    UnableToDecryptCrlSignature,
    UnableToDecodeIssuerPublicKey,
    CertSignatureFailure,
    CrlSignatureFailure,
    CertNotYetValid,
    CertHasExpired,
    CrlNotYetValid,
    CrlHasExpired,
    ErrorInCertNotBeforeField,
    ErrorInCertNotAfterField,
    ErrorInCrlLastUpdateField,
    ErrorInCrlNextUpdateField,
    OutOfMem,
    DepthZeroSelfSignedCert,
    SelfSignedCertInChain,
    UnableToGetIssuerCertLocally,
    UnableToVerifyLeafSignature,
    CertChainTooLong,
    CertRevoked,
    InvalidCa,
    PathLengthExceeded,
    InvalidPurpose,
    CertUntrusted,
    CertRejected,
    /// Any reason without a dedicated name, carrying the library's own description
    Other(String),
}

impl VerifyError {
    /// Every named reason, in identifier order.
    pub const NAMED: [VerifyError; 27] = [
        Self::UnableToGetIssuerCert,
        Self::UnableToGetCrl,
        Self::UnableToDecryptCertSignature,
        Self::UnableToDecryptCrlSignature,
        Self::UnableToDecodeIssuerPublicKey,
        Self::CertSignatureFailure,
        Self::CrlSignatureFailure,
        Self::CertNotYetValid,
        Self::CertHasExpired,
        Self::CrlNotYetValid,
        Self::CrlHasExpired,
        Self::ErrorInCertNotBeforeField,
        Self::ErrorInCertNotAfterField,
        Self::ErrorInCrlLastUpdateField,
        Self::ErrorInCrlNextUpdateField,
        Self::OutOfMem,
        Self::DepthZeroSelfSignedCert,
        Self::SelfSignedCertInChain,
        Self::UnableToGetIssuerCertLocally,
        Self::UnableToVerifyLeafSignature,
        Self::CertChainTooLong,
        Self::CertRevoked,
        Self::InvalidCa,
        Self::PathLengthExceeded,
        Self::InvalidPurpose,
        Self::CertUntrusted,
        Self::CertRejected,
    ];

    /// Identifier string for this reason.
    pub fn as_str(&self) -> &str {
        match self {
            Self::UnableToGetIssuerCert => "UNABLE_TO_GET_ISSUER_CERT",
            Self::UnableToGetCrl => "UNABLE_TO_GET_CRL",
            Self::UnableToDecryptCertSignature => "UNABLE_TO_DECRYPT_CERT_SIGNATURE",
            Self::UnableToDecryptCrlSignature => "UNABLE_TO_DECRYPT_CRL_SIGNATURE",
            Self::UnableToDecodeIssuerPublicKey => "UNABLE_TO_DECODE_ISSUER_PUBLIC_KEY",
            Self::CertSignatureFailure => "CERT_SIGNATURE_FAILURE",
            Self::CrlSignatureFailure => "CRL_SIGNATURE_FAILURE",
            Self::CertNotYetValid => "CERT_NOT_YET_VALID",
            Self::CertHasExpired => "CERT_HAS_EXPIRED",
            Self::CrlNotYetValid => "CRL_NOT_YET_VALID",
            Self::CrlHasExpired => "CRL_HAS_EXPIRED",
            Self::ErrorInCertNotBeforeField => "ERROR_IN_CERT_NOT_BEFORE_FIELD",
            Self::ErrorInCertNotAfterField => "ERROR_IN_CERT_NOT_AFTER_FIELD",
            Self::ErrorInCrlLastUpdateField => "ERROR_IN_CRL_LAST_UPDATE_FIELD",
            Self::ErrorInCrlNextUpdateField => "ERROR_IN_CRL_NEXT_UPDATE_FIELD",
            Self::OutOfMem => "OUT_OF_MEM",
            Self::DepthZeroSelfSignedCert => "DEPTH_ZERO_SELF_SIGNED_CERT",
            Self::SelfSignedCertInChain => "SELF_SIGNED_CERT_IN_CHAIN",
            Self::UnableToGetIssuerCertLocally => "UNABLE_TO_GET_ISSUER_CERT_LOCALLY",
            Self::UnableToVerifyLeafSignature => "UNABLE_TO_VERIFY_LEAF_SIGNATURE",
            Self::CertChainTooLong => "CERT_CHAIN_TOO_LONG",
            Self::CertRevoked => "CERT_REVOKED",
            Self::InvalidCa => "INVALID_CA",
            Self::PathLengthExceeded => "PATH_LENGTH_EXCEEDED",
            Self::InvalidPurpose => "INVALID_PURPOSE",
            Self::CertUntrusted => "CERT_UNTRUSTED",
            Self::CertRejected => "CERT_REJECTED",
            Self::Other(text) => text,
        }
    }

    /// Parse an identifier back into a reason; unknown text becomes [`VerifyError::Other`].
    pub fn from_name(name: &str) -> Self {
        Self::NAMED
            .iter()
            .find(|reason| reason.as_str() == name)
            .cloned()
            .unwrap_or_else(|| Self::Other(name.to_string()))
    }

    /// Map a rustls verification error to a named reason.
    ///
    /// Unknown-issuer failures are refined using the shape of the presented chain.
    pub fn from_rustls(err: &rustls::Error, chain: &ChainShape) -> Self {
        match err {
            rustls::Error::InvalidCertificate(cert_err) => Self::from_certificate_error(cert_err, chain),
            rustls::Error::InvalidCertRevocationList(crl_err) => match crl_err {
                CertRevocationListError::BadSignature => Self::CrlSignatureFailure,
                _ => Self::Other(err.to_string()),
            },
            _ => Self::Other(err.to_string()),
        }
    }

    fn from_certificate_error(err: &CertificateError, chain: &ChainShape) -> Self {
        match err {
            CertificateError::Expired | CertificateError::ExpiredContext { .. } => {
                Self::CertHasExpired
            }
            CertificateError::NotValidYet | CertificateError::NotValidYetContext { .. } => {
                Self::CertNotYetValid
            }
            CertificateError::Revoked => Self::CertRevoked,
            CertificateError::BadSignature => Self::CertSignatureFailure,
            CertificateError::InvalidPurpose | CertificateError::InvalidPurposeContext { .. } => {
                Self::InvalidPurpose
            }
            CertificateError::UnknownRevocationStatus => Self::UnableToGetCrl,
            CertificateError::ExpiredRevocationList
            | CertificateError::ExpiredRevocationListContext { .. } => Self::CrlHasExpired,
            CertificateError::ApplicationVerificationFailure => Self::CertRejected,
            CertificateError::UnknownIssuer => chain.unknown_issuer_reason(),
            CertificateError::NotValidForName | CertificateError::NotValidForNameContext { .. } => {
                Self::Other("Hostname mismatch".to_string())
            }
            other => Self::Other(rustls::Error::InvalidCertificate(other.clone()).to_string()),
        }
    }
}

impl std::fmt::Display for VerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for VerifyError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Shape of a presented certificate chain, used to name unknown-issuer failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainShape {
    /// Leaf certificate names itself as issuer
    pub leaf_self_issued: bool,
    /// Number of certificates sent after the leaf
    pub intermediates: usize,
    /// Some certificate after the leaf names itself as issuer
    pub self_issued_in_chain: bool,
}

impl ChainShape {
    /// Inspect the DER certificates presented by the peer.
    pub fn inspect(end_entity: &CertificateDer<'_>, intermediates: &[CertificateDer<'_>]) -> Self {
        Self {
            leaf_self_issued: is_self_issued(end_entity),
            intermediates: intermediates.len(),
            self_issued_in_chain: intermediates.iter().any(|c| is_self_issued(c)),
        }
    }

    fn unknown_issuer_reason(&self) -> VerifyError {
        if self.leaf_self_issued && self.intermediates == 0 {
            VerifyError::DepthZeroSelfSignedCert
        } else if self.self_issued_in_chain {
            VerifyError::SelfSignedCertInChain
        } else if self.intermediates == 0 {
            VerifyError::UnableToVerifyLeafSignature
        } else {
            VerifyError::UnableToGetIssuerCertLocally
        }
    }
}

fn is_self_issued(der: &CertificateDer<'_>) -> bool {
    match X509Certificate::from_der(der.as_ref()) {
        Ok((_, cert)) => cert.issuer().as_raw() == cert.subject().as_raw(),
        Err(_) => false,
    }
}

/// Result of verifying the peer's certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The peer did not present a certificate
    NoCertificate,
    /// The certificate chain verified against the trusted roots
    Ok,
    /// The certificate was accepted by the handshake but failed verification
    Failed(VerifyError),
}

impl VerificationOutcome {
    /// Whether verification succeeded
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Error string suitable for a binding layer: `None` on success.
    pub fn error_name(&self) -> Option<&str> {
        match self {
            Self::NoCertificate => Some(NO_CERTIFICATE_MESSAGE),
            Self::Ok => None,
            Self::Failed(reason) => Some(reason.as_str()),
        }
    }
}

impl std::fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.error_name().unwrap_or("ok"))
    }
}

impl Serialize for VerificationOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.error_name() {
            Some(name) => serializer.serialize_some(name),
            None => serializer.serialize_none(),
        }
    }
}
