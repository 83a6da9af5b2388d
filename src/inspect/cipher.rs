//! Negotiated cipher description

use rustls::{CipherSuite, ProtocolVersion};
use serde::Serialize;

/// Cipher suite and protocol version agreed by the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NegotiatedCipher {
    /// rustls cipher suite name, e.g. `TLS13_AES_256_GCM_SHA384`
    pub name: String,

    /// Protocol version, e.g. `TLSv1.3`
    pub version: String,
}

impl NegotiatedCipher {
    pub(crate) fn new(suite: CipherSuite, version: ProtocolVersion) -> Self {
        Self {
            name: suite_name(suite),
            version: version_name(version),
        }
    }
}

/// Name of a cipher suite as rustls spells it.
pub(crate) fn suite_name(suite: CipherSuite) -> String {
    format!("{:?}", suite)
}

/// Conventional `TLSv1.x` spelling of a protocol version.
pub(crate) fn version_name(version: ProtocolVersion) -> String {
    match version {
        ProtocolVersion::TLSv1_2 => "TLSv1.2".to_string(),
        ProtocolVersion::TLSv1_3 => "TLSv1.3".to_string(),
        ProtocolVersion::TLSv1_1 => "TLSv1.1".to_string(),
        ProtocolVersion::TLSv1_0 => "TLSv1".to_string(),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_names() {
        assert_eq!(version_name(ProtocolVersion::TLSv1_3), "TLSv1.3");
        assert_eq!(version_name(ProtocolVersion::TLSv1_2), "TLSv1.2");
    }

    #[test]
    fn test_suite_name() {
        assert_eq!(
            suite_name(CipherSuite::TLS13_AES_128_GCM_SHA256),
            "TLS13_AES_128_GCM_SHA256"
        );
    }

    #[test]
    fn test_new() {
        let cipher = NegotiatedCipher::new(
            CipherSuite::TLS13_CHACHA20_POLY1305_SHA256,
            ProtocolVersion::TLSv1_3,
        );
        assert_eq!(cipher.name, "TLS13_CHACHA20_POLY1305_SHA256");
        assert_eq!(cipher.version, "TLSv1.3");
    }
}
