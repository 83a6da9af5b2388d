//! Peer certificate view

use super::format::{bignum_hex, format_general_names, format_name, format_time, hex_colon};
use crate::{Error, Result};
use serde::Serialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use x509_parser::der_parser::der::parse_der;
use x509_parser::oid_registry::OID_X509_EXT_EXTENDED_KEY_USAGE;
use x509_parser::prelude::{FromDer, X509Certificate};
use x509_parser::public_key::PublicKey;

/// Snapshot of the fields of a peer's leaf certificate.
///
/// Field names used when serialized match what TLS bindings traditionally expose
/// (`subjectaltname`, `valid_from`, `e`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerCertificate {
    /// Subject DN, one `SN=value` attribute per line
    pub subject: String,

    /// Issuer DN, same format as `subject`
    pub issuer: String,

    /// subjectAltName extension text (`DNS:a, IP Address:b`), if present
    #[serde(rename = "subjectaltname", skip_serializing_if = "Option::is_none")]
    pub subject_alt_name: Option<String>,

    /// Start of the validity window (`Mon DD HH:MM:SS YYYY GMT`)
    pub valid_from: String,

    /// End of the validity window
    pub valid_to: String,

    /// SHA-1 of the DER encoding, colon-separated uppercase hex
    pub fingerprint: String,

    /// SHA-256 of the DER encoding, colon-separated uppercase hex
    pub fingerprint256: String,

    /// Serial number as uppercase hex
    #[serde(rename = "serialNumber")]
    pub serial_number: String,

    /// Extended key usage OIDs in dotted-decimal form; empty without the extension
    pub ext_key_usage: Vec<String>,

    /// RSA modulus as uppercase hex, for RSA keys only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modulus: Option<String>,

    /// RSA public exponent as uppercase hex, for RSA keys only
    #[serde(rename = "e", skip_serializing_if = "Option::is_none")]
    pub exponent: Option<String>,

    /// DER encoding of the certificate
    #[serde(skip)]
    pub raw: Vec<u8>,
}

impl PeerCertificate {
    /// Build the view from a DER-encoded certificate.
    ///
    /// # Errors
    ///
    /// Returns `Error::Certificate` if the certificate or one of the inspected
    /// extensions cannot be decoded.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (_, cert) = X509Certificate::from_der(der).map_err(|e| {
            Error::Certificate(format!("Failed to parse X.509 certificate: {}", e))
        })?;

        let subject_alt_name = cert
            .subject_alternative_name()
            .map_err(|e| Error::Certificate(format!("invalid subjectAltName: {}", e)))?
            .map(|ext| format_general_names(&ext.value.general_names));

        let (modulus, exponent) = match cert.public_key().parsed() {
            Ok(PublicKey::RSA(rsa)) => (
                Some(bignum_hex(rsa.modulus)),
                Some(bignum_hex(rsa.exponent)),
            ),
            _ => (None, None),
        };

        let validity = cert.validity();

        Ok(Self {
            subject: format_name(cert.subject()),
            issuer: format_name(cert.issuer()),
            subject_alt_name,
            valid_from: format_time(&validity.not_before),
            valid_to: format_time(&validity.not_after),
            fingerprint: hex_colon(&Sha1::digest(der)),
            fingerprint256: hex_colon(&Sha256::digest(der)),
            serial_number: bignum_hex(cert.raw_serial()),
            ext_key_usage: extended_key_usage(&cert)?,
            modulus,
            exponent,
            raw: der.to_vec(),
        })
    }

    /// PEM encoding of the certificate.
    pub fn to_pem(&self) -> String {
        let block = pem::Pem::new("CERTIFICATE", self.raw.clone());
        pem::encode_config(
            &block,
            pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
        )
    }
}

/// Extended key usage OIDs in the order they appear in the extension.
fn extended_key_usage(cert: &X509Certificate<'_>) -> Result<Vec<String>> {
    let ext = match cert
        .extensions()
        .iter()
        .find(|ext| ext.oid == OID_X509_EXT_EXTENDED_KEY_USAGE)
    {
        Some(ext) => ext,
        None => return Ok(Vec::new()),
    };

    let invalid = |e: String| Error::Certificate(format!("invalid extendedKeyUsage: {}", e));

    let (_, seq) = parse_der(ext.value).map_err(|e| invalid(e.to_string()))?;
    let items = seq.as_sequence().map_err(|e| invalid(e.to_string()))?;

    items
        .iter()
        .map(|item| {
            item.as_oid()
                .map(|oid| oid.to_id_string())
                .map_err(|e| invalid(e.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_der(pem: &[u8]) -> Vec<u8> {
        rustls_pemfile::certs(&mut &pem[..])
            .next()
            .expect("one certificate")
            .expect("valid PEM")
            .to_vec()
    }

    #[test]
    fn test_server_fixture_view() {
        let der = fixture_der(include_bytes!("../../tests/fixtures/server.pem"));
        let view = PeerCertificate::from_der(&der).expect("parse server certificate");

        assert_eq!(view.subject, "C=US\nO=Memtls Test\nCN=localhost");
        assert_eq!(view.issuer, "C=US\nO=Memtls Test\nCN=Memtls Test CA");
        assert_eq!(
            view.subject_alt_name.as_deref(),
            Some("DNS:localhost, IP Address:127.0.0.1")
        );
        assert_eq!(
            view.fingerprint,
            "9E:E3:96:16:06:50:A7:28:AE:BB:75:BC:04:EB:55:69:E6:A7:20:3E"
        );
        assert_eq!(
            view.ext_key_usage,
            vec!["1.3.6.1.5.5.7.3.1", "1.3.6.1.5.5.7.3.2"]
        );
        assert_eq!(view.exponent.as_deref(), Some("10001"));
        assert!(view.modulus.as_deref().unwrap().starts_with("A2FDD250AEDE334B"));
        assert!(view.valid_from.ends_with("2026 GMT"));
        assert!(view.valid_to.ends_with("2126 GMT"));
    }

    #[test]
    fn test_client_fixture_view() {
        let der = fixture_der(include_bytes!("../../tests/fixtures/client.pem"));
        let view = PeerCertificate::from_der(&der).unwrap();

        assert_eq!(view.subject, "C=US\nO=Memtls Test\nOU=Clients\nCN=test client");
        assert_eq!(
            view.subject_alt_name.as_deref(),
            Some("email:client@example.com")
        );
        assert_eq!(view.serial_number, "799404EF5C3BFAD1EFCD59E9F4D5602AB01A84C5");
        assert_eq!(view.ext_key_usage, vec!["1.3.6.1.5.5.7.3.2"]);
    }

    #[test]
    fn test_ca_has_no_eku() {
        let der = fixture_der(include_bytes!("../../tests/fixtures/ca.pem"));
        let view = PeerCertificate::from_der(&der).unwrap();
        assert!(view.ext_key_usage.is_empty());
        assert!(view.subject_alt_name.is_none());
        assert_eq!(view.subject, view.issuer);
    }

    #[test]
    fn test_pem_round_trip() {
        let pem = include_bytes!("../../tests/fixtures/server.pem");
        let der = fixture_der(pem);
        let view = PeerCertificate::from_der(&der).unwrap();
        assert_eq!(fixture_der(view.to_pem().as_bytes()), der);
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(matches!(
            PeerCertificate::from_der(b"definitely not DER"),
            Err(Error::Certificate(_))
        ));
    }

    #[test]
    fn test_serialized_field_names() {
        let der = fixture_der(include_bytes!("../../tests/fixtures/server.pem"));
        let view = PeerCertificate::from_der(&der).unwrap();
        let json = serde_json::to_value(&view).unwrap();

        assert!(json.get("subjectaltname").is_some());
        assert!(json.get("e").is_some());
        assert!(json.get("serialNumber").is_some());
        assert!(json.get("raw").is_none());
    }
}
