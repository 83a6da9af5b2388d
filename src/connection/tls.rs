//! TLS context and verification policy.
//!
//! A [`TlsContext`] is the ready-to-use credential bundle a [`Connection`](super::Connection)
//! is created from: identity (certificate chain and private key), trusted roots and the
//! cipher policy. It is built once and shared read-only by any number of connections.

use crate::inspect::cipher::suite_name;
use crate::{Error, Result};
use rustls::crypto::CryptoProvider;
use rustls::{ClientConfig, RootCertStore, ServerConfig, SupportedProtocolVersion};
use rustls_pemfile::Item;
use rustls_pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

/// Default maximum number of cleartext bytes returned by one read.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Which side of the handshake a connection plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Initiates the handshake ("connect")
    Client,
    /// Waits for a ClientHello ("accept")
    Server,
}

impl Role {
    /// Role from the `is_server` creation flag
    pub fn from_is_server(is_server: bool) -> Self {
        if is_server {
            Self::Server
        } else {
            Self::Client
        }
    }

    /// Metrics label for this role
    pub fn label(&self) -> &'static str {
        match self {
            Self::Client => crate::metrics::labels::ROLE_CLIENT,
            Self::Server => crate::metrics::labels::ROLE_SERVER,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Peer certificate request policy, fixed at connection creation.
///
/// Verification is advisory only: a presented certificate is always accepted by the
/// handshake and its verification outcome is recorded for the caller to inspect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VerifyMode {
    /// No client certificate is requested
    #[default]
    None,
    /// A client certificate is requested but may be omitted
    Optional,
    /// A client certificate is requested and the handshake fails without one
    Required,
}

impl VerifyMode {
    /// Derive the mode from the creation flags.
    ///
    /// Clients never request a certificate. Servers request one when `request_cert`
    /// is set, and insist on one when `reject_unauthenticated` is set as well.
    pub fn from_flags(is_server: bool, request_cert: bool, reject_unauthenticated: bool) -> Self {
        if !is_server || !request_cert {
            Self::None
        } else if !reject_unauthenticated {
            Self::Optional
        } else {
            Self::Required
        }
    }

    /// Whether a peer certificate is requested at all
    pub fn requests_certificate(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl std::fmt::Display for VerifyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Optional => write!(f, "optional"),
            Self::Required => write!(f, "required"),
        }
    }
}

impl std::str::FromStr for VerifyMode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "optional" => Ok(Self::Optional),
            "required" => Ok(Self::Required),
            _ => Err(Error::Config(format!(
                "invalid verify mode '{}': expected none, optional, or required",
                s
            ))),
        }
    }
}

/// TLS protocol versions a context may negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsVersion {
    /// TLS 1.2
    Tls12,
    /// TLS 1.3
    Tls13,
}

impl TlsVersion {
    fn supported(self) -> &'static SupportedProtocolVersion {
        match self {
            Self::Tls12 => &rustls::version::TLS12,
            Self::Tls13 => &rustls::version::TLS13,
        }
    }
}

struct Identity {
    chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
}

/// Ready-to-use TLS context shared by connections.
///
/// # Examples
///
/// ```ignore
/// use memtls::TlsContext;
///
/// // Server identity, trusting a private CA for client certificates
/// let ctx = TlsContext::builder()
///     .certificate_chain_path("server.pem")
///     .private_key_path("server.key")
///     .ca_cert_path("ca.pem")
///     .build()?;
///
/// // Client trusting the system roots, checking the host name
/// let ctx = TlsContext::builder()
///     .use_native_roots(true)
///     .server_name("db.example.com")
///     .verify_hostname(true)
///     .build()?;
/// ```
#[derive(Clone)]
pub struct TlsContext {
    provider: Arc<CryptoProvider>,
    versions: Vec<TlsVersion>,
    roots: Arc<RootCertStore>,
    identity: Option<Arc<Identity>>,
    server_name: Option<String>,
    verify_hostname: bool,
    chunk_size: usize,
}

impl TlsContext {
    /// Create a new TLS context builder.
    pub fn builder() -> TlsContextBuilder {
        TlsContextBuilder::default()
    }

    /// Trusted roots used to verify peer certificates.
    pub fn roots(&self) -> Arc<RootCertStore> {
        self.roots.clone()
    }

    /// Crypto provider carrying the configured cipher policy.
    pub fn provider(&self) -> Arc<CryptoProvider> {
        self.provider.clone()
    }

    /// Whether a certificate chain and private key are configured.
    pub fn has_identity(&self) -> bool {
        self.identity.is_some()
    }

    /// Server name presented by client sessions, if configured.
    pub fn server_name(&self) -> Option<&str> {
        self.server_name.as_deref()
    }

    /// Check if hostname mismatches are reported by verification.
    pub fn verify_hostname(&self) -> bool {
        self.verify_hostname
    }

    /// Maximum cleartext bytes returned by a single read.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Enabled protocol versions.
    pub fn protocol_versions(&self) -> &[TlsVersion] {
        &self.versions
    }

    /// Names of the enabled cipher suites.
    pub fn cipher_suites(&self) -> Vec<String> {
        self.provider
            .cipher_suites
            .iter()
            .map(|s| suite_name(s.suite()))
            .collect()
    }

    fn rustls_versions(&self) -> Vec<&'static SupportedProtocolVersion> {
        self.versions.iter().map(|v| v.supported()).collect()
    }

    /// Server name handed to rustls for a client session.
    ///
    /// Without a configured name an unspecified address is used, which keeps rustls
    /// from sending SNI.
    pub(crate) fn client_server_name(&self) -> Result<ServerName<'static>> {
        match &self.server_name {
            Some(name) => ServerName::try_from(name.clone())
                .map_err(|_| Error::Config(format!("Invalid hostname for TLS: {}", name))),
            None => Ok(ServerName::IpAddress(
                IpAddr::V4(Ipv4Addr::UNSPECIFIED).into(),
            )),
        }
    }

    /// Build a client configuration around the given certificate verifier.
    pub(crate) fn client_config(
        &self,
        verifier: Arc<dyn rustls::client::danger::ServerCertVerifier>,
    ) -> Result<ClientConfig> {
        let builder = ClientConfig::builder_with_provider(self.provider.clone())
            .with_protocol_versions(&self.rustls_versions())?
            .dangerous()
            .with_custom_certificate_verifier(verifier);

        let config = match &self.identity {
            Some(identity) => {
                builder.with_client_auth_cert(identity.chain.clone(), identity.key.clone_key())?
            }
            None => builder.with_no_client_auth(),
        };
        Ok(config)
    }

    /// Build a server configuration around the given client certificate verifier.
    pub(crate) fn server_config(
        &self,
        verifier: Arc<dyn rustls::server::danger::ClientCertVerifier>,
    ) -> Result<ServerConfig> {
        let identity = self.identity.as_ref().ok_or_else(|| {
            Error::Config("server connections require a certificate chain and private key".into())
        })?;

        let config = ServerConfig::builder_with_provider(self.provider.clone())
            .with_protocol_versions(&self.rustls_versions())?
            .with_client_cert_verifier(verifier)
            .with_single_cert(identity.chain.clone(), identity.key.clone_key())?;
        Ok(config)
    }
}

impl std::fmt::Debug for TlsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsContext")
            .field("versions", &self.versions)
            .field("cipher_suites", &self.cipher_suites())
            .field("roots", &self.roots.len())
            .field("has_identity", &self.has_identity())
            .field("server_name", &self.server_name)
            .field("verify_hostname", &self.verify_hostname)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

/// Where PEM material comes from.
#[derive(Clone)]
enum PemSource {
    Path(String),
    Pem(Vec<u8>),
}

impl PemSource {
    fn load(&self, what: &str) -> Result<(Vec<u8>, String)> {
        match self {
            PemSource::Path(path) => {
                let data = fs::read(path).map_err(|e| {
                    tracing::debug!(path = %path, error = %e, "failed to read {} file", what);
                    Error::Io(e)
                })?;
                Ok((data, format!("'{}'", path)))
            }
            PemSource::Pem(data) => Ok((data.clone(), format!("in-memory {}", what))),
        }
    }
}

/// Builder for TLS contexts.
///
/// Provides a fluent API for assembling identity, trust roots and cipher policy.
pub struct TlsContextBuilder {
    certificate_chain: Option<PemSource>,
    private_key: Option<PemSource>,
    ca_certs: Vec<PemSource>,
    use_native_roots: bool,
    use_webpki_roots: bool,
    versions: Vec<TlsVersion>,
    cipher_suites: Option<Vec<String>>,
    server_name: Option<String>,
    verify_hostname: bool,
    chunk_size: usize,
}

impl Default for TlsContextBuilder {
    fn default() -> Self {
        Self {
            certificate_chain: None,
            private_key: None,
            ca_certs: Vec::new(),
            use_native_roots: false,
            use_webpki_roots: false,
            versions: vec![TlsVersion::Tls13, TlsVersion::Tls12],
            cipher_suites: None,
            server_name: None,
            verify_hostname: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl TlsContextBuilder {
    /// Set the path of the certificate chain presented to peers (PEM, leaf first).
    pub fn certificate_chain_path(mut self, path: impl Into<String>) -> Self {
        self.certificate_chain = Some(PemSource::Path(path.into()));
        self
    }

    /// Set the certificate chain presented to peers from PEM bytes.
    pub fn certificate_chain_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.certificate_chain = Some(PemSource::Pem(pem.into()));
        self
    }

    /// Set the path of the private key matching the certificate chain (PEM).
    pub fn private_key_path(mut self, path: impl Into<String>) -> Self {
        self.private_key = Some(PemSource::Path(path.into()));
        self
    }

    /// Set the private key matching the certificate chain from PEM bytes.
    pub fn private_key_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.private_key = Some(PemSource::Pem(pem.into()));
        self
    }

    /// Add a trusted CA certificate file (PEM). May be called repeatedly.
    pub fn ca_cert_path(mut self, path: impl Into<String>) -> Self {
        self.ca_certs.push(PemSource::Path(path.into()));
        self
    }

    /// Add trusted CA certificates from PEM bytes. May be called repeatedly.
    pub fn ca_cert_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.ca_certs.push(PemSource::Pem(pem.into()));
        self
    }

    /// Also trust the operating system's root certificates (default: disabled).
    pub fn use_native_roots(mut self, enabled: bool) -> Self {
        self.use_native_roots = enabled;
        self
    }

    /// Also trust the bundled Mozilla root certificates (default: disabled).
    pub fn use_webpki_roots(mut self, enabled: bool) -> Self {
        self.use_webpki_roots = enabled;
        self
    }

    /// Restrict the protocol versions that may be negotiated.
    pub fn protocol_versions(mut self, versions: &[TlsVersion]) -> Self {
        self.versions = versions.to_vec();
        self
    }

    /// Restrict the cipher suites that may be negotiated, by rustls suite name
    /// (for example `TLS13_AES_128_GCM_SHA256`).
    pub fn cipher_suites<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cipher_suites = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Server name presented by client sessions (SNI and hostname checks).
    pub fn server_name(mut self, host: impl Into<String>) -> Self {
        self.server_name = Some(host.into());
        self
    }

    /// Report hostname mismatches as verification failures (default: disabled).
    ///
    /// Only meaningful together with [`server_name`](Self::server_name).
    pub fn verify_hostname(mut self, verify: bool) -> Self {
        self.verify_hostname = verify;
        self
    }

    /// Maximum cleartext bytes returned by one read (default: 4096).
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Build the TLS context.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - a PEM file cannot be read or contains no usable items
    /// - only one of certificate chain and private key is configured
    /// - the cipher policy leaves nothing to negotiate
    /// - the server name or chunk size is invalid
    pub fn build(self) -> Result<TlsContext> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk size must be greater than zero".into()));
        }
        if self.versions.is_empty() {
            return Err(Error::Config(
                "at least one protocol version must be enabled".into(),
            ));
        }

        let server_name = match &self.server_name {
            Some(host) => Some(parse_server_name(host)?),
            None => None,
        };

        let roots = self.load_roots()?;
        let identity = self.load_identity()?;
        let provider = Arc::new(self.filtered_provider()?);

        // Surface version/suite mismatches now rather than at connection time
        let versions: Vec<_> = self.versions.iter().map(|v| v.supported()).collect();
        let _ = ClientConfig::builder_with_provider(provider.clone())
            .with_protocol_versions(&versions)?;

        Ok(TlsContext {
            provider,
            versions: self.versions,
            roots: Arc::new(roots),
            identity: identity.map(Arc::new),
            server_name,
            verify_hostname: self.verify_hostname,
            chunk_size: self.chunk_size,
        })
    }

    fn load_roots(&self) -> Result<RootCertStore> {
        let mut store = RootCertStore::empty();

        for source in &self.ca_certs {
            let (data, origin) = source.load("CA certificate")?;
            let certs = read_certificates(&data, &origin)?;
            let (added, ignored) = store.add_parsable_certificates(certs);
            if added == 0 {
                return Err(Error::Config(format!(
                    "No valid CA certificates found in {}",
                    origin
                )));
            }
            if ignored > 0 {
                tracing::warn!(%origin, ignored, "ignored unparsable CA certificates");
            }
        }

        if self.use_native_roots {
            let result = rustls_native_certs::load_native_certs();
            let before = store.len();
            let _ = store.add_parsable_certificates(result.certs);

            if !result.errors.is_empty() && store.len() == before {
                return Err(Error::Config(
                    "Failed to load any system root certificates".to_string(),
                ));
            }
        }

        if self.use_webpki_roots {
            store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        }

        Ok(store)
    }

    fn load_identity(&self) -> Result<Option<Identity>> {
        let (chain_source, key_source) = match (&self.certificate_chain, &self.private_key) {
            (None, None) => return Ok(None),
            (Some(chain), Some(key)) => (chain, key),
            (Some(_), None) => {
                return Err(Error::Config(
                    "certificate chain configured without a private key".into(),
                ))
            }
            (None, Some(_)) => {
                return Err(Error::Config(
                    "private key configured without a certificate chain".into(),
                ))
            }
        };

        let (data, origin) = chain_source.load("certificate chain")?;
        let chain = read_certificates(&data, &origin)?;

        let (data, origin) = key_source.load("private key")?;
        let mut reader = std::io::Cursor::new(&data);
        let key = rustls_pemfile::private_key(&mut reader)
            .map_err(|_| Error::Config(format!("Failed to parse private key from {}", origin)))?
            .ok_or_else(|| Error::Config(format!("No private key found in {}", origin)))?;

        Ok(Some(Identity { chain, key }))
    }

    fn filtered_provider(&self) -> Result<CryptoProvider> {
        let mut provider = rustls::crypto::aws_lc_rs::default_provider();

        if let Some(names) = &self.cipher_suites {
            if let Some(unknown) = names.iter().find(|name| {
                !provider
                    .cipher_suites
                    .iter()
                    .any(|s| &suite_name(s.suite()) == *name)
            }) {
                return Err(Error::Config(format!("unknown cipher suite '{}'", unknown)));
            }
            provider
                .cipher_suites
                .retain(|s| names.contains(&suite_name(s.suite())));
        }

        if provider.cipher_suites.is_empty() {
            return Err(Error::Config("no cipher suites enabled".into()));
        }
        Ok(provider)
    }
}

/// Read every X.509 certificate from PEM data, skipping other items.
fn read_certificates(data: &[u8], origin: &str) -> Result<Vec<CertificateDer<'static>>> {
    let mut reader = std::io::Cursor::new(data);
    let mut certs = Vec::new();

    loop {
        match rustls_pemfile::read_one(&mut reader) {
            Ok(Some(Item::X509Certificate(cert))) => certs.push(cert),
            Ok(Some(_)) => {
                // Skip non-certificate items (private keys, etc.)
            }
            Ok(None) => break,
            Err(_) => {
                return Err(Error::Config(format!(
                    "Failed to parse certificate from {}",
                    origin
                )));
            }
        }
    }

    if certs.is_empty() {
        return Err(Error::Config(format!(
            "No valid certificates found in {}",
            origin
        )));
    }

    Ok(certs)
}

/// Parse server name from hostname for TLS SNI (Server Name Indication).
///
/// IP addresses are accepted as-is; rustls never sends them as SNI.
///
/// # Errors
///
/// Returns an error if the hostname is invalid.
pub fn parse_server_name(hostname: &str) -> Result<String> {
    if hostname.parse::<IpAddr>().is_ok() {
        return Ok(hostname.to_string());
    }

    // Remove trailing dot if present
    let hostname = hostname.trim_end_matches('.');

    if hostname.is_empty() || hostname.len() > 253 {
        return Err(Error::Config(format!(
            "Invalid hostname for TLS: '{}'",
            hostname
        )));
    }

    if !hostname
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '.')
    {
        return Err(Error::Config(format!(
            "Invalid hostname for TLS: '{}'",
            hostname
        )));
    }

    Ok(hostname.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    #[test]
    fn test_verify_mode_table() {
        use VerifyMode::*;

        let cases = [
            ((false, false, false), None),
            ((false, false, true), None),
            ((false, true, false), None),
            ((false, true, true), None),
            ((true, false, false), None),
            ((true, false, true), None),
            ((true, true, false), Optional),
            ((true, true, true), Required),
        ];

        for ((is_server, request, reject), expected) in cases {
            assert_eq!(
                VerifyMode::from_flags(is_server, request, reject),
                expected,
                "flags ({}, {}, {})",
                is_server,
                request,
                reject
            );
        }
    }

    #[test]
    fn test_verify_mode_from_str() {
        assert_eq!("none".parse::<VerifyMode>().unwrap(), VerifyMode::None);
        assert_eq!(
            "optional".parse::<VerifyMode>().unwrap(),
            VerifyMode::Optional
        );
        assert_eq!(
            "required".parse::<VerifyMode>().unwrap(),
            VerifyMode::Required
        );
        assert!("peer".parse::<VerifyMode>().is_err());
    }

    #[test]
    fn test_verify_mode_display() {
        assert_eq!(VerifyMode::None.to_string(), "none");
        assert_eq!(VerifyMode::Optional.to_string(), "optional");
        assert_eq!(VerifyMode::Required.to_string(), "required");
        assert_eq!(VerifyMode::default(), VerifyMode::None);
        assert!(!VerifyMode::None.requests_certificate());
        assert!(VerifyMode::Optional.requests_certificate());
    }

    #[test]
    fn test_role_from_flag() {
        assert_eq!(Role::from_is_server(true), Role::Server);
        assert_eq!(Role::from_is_server(false), Role::Client);
        assert_eq!(Role::Server.to_string(), "server");
    }

    #[test]
    fn test_builder_defaults() {
        let builder = TlsContextBuilder::default();
        assert!(builder.certificate_chain.is_none());
        assert!(builder.private_key.is_none());
        assert!(builder.ca_certs.is_empty());
        assert!(!builder.use_native_roots);
        assert!(!builder.verify_hostname);
        assert_eq!(builder.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_build_empty_context() {
        let ctx = TlsContext::builder().build().expect("empty context");
        assert!(!ctx.has_identity());
        assert!(ctx.roots().is_empty());
        assert_eq!(ctx.chunk_size(), 4096);
        assert!(ctx.server_name().is_none());
        assert!(!ctx.cipher_suites().is_empty());
    }

    #[test]
    fn test_build_with_identity_and_ca() {
        let ctx = TlsContext::builder()
            .certificate_chain_path(fixture("server.pem"))
            .private_key_path(fixture("server.key"))
            .ca_cert_path(fixture("ca.pem"))
            .build()
            .expect("Failed to build TLS context");

        assert!(ctx.has_identity());
        assert_eq!(ctx.roots().len(), 1);
    }

    #[test]
    fn test_missing_ca_file() {
        let result = TlsContext::builder()
            .ca_cert_path("/nonexistent/ca.pem")
            .build();
        match result {
            Err(Error::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected I/O error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_ca_pem_without_certificates() {
        let result = TlsContext::builder()
            .ca_cert_pem(b"not a pem file".to_vec())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_identity_requires_both_halves() {
        let result = TlsContext::builder()
            .certificate_chain_path(fixture("server.pem"))
            .build();
        assert!(result.is_err());

        let result = TlsContext::builder()
            .private_key_path(fixture("server.key"))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(TlsContext::builder().chunk_size(0).build().is_err());
    }

    #[test]
    fn test_empty_versions_rejected() {
        assert!(TlsContext::builder().protocol_versions(&[]).build().is_err());
    }

    #[test]
    fn test_cipher_suite_filter() {
        let ctx = TlsContext::builder()
            .cipher_suites(["TLS13_AES_128_GCM_SHA256"])
            .protocol_versions(&[TlsVersion::Tls13])
            .build()
            .expect("filtered context");
        assert_eq!(ctx.cipher_suites(), vec!["TLS13_AES_128_GCM_SHA256"]);

        let result = TlsContext::builder().cipher_suites(["NOT_A_SUITE"]).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_suites_must_match_versions() {
        // A TLS 1.3-only suite list cannot serve a TLS 1.2-only context
        let result = TlsContext::builder()
            .cipher_suites(["TLS13_AES_128_GCM_SHA256"])
            .protocol_versions(&[TlsVersion::Tls12])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_client_server_name_default_is_ip() {
        let ctx = TlsContext::builder().build().unwrap();
        let name = ctx.client_server_name().unwrap();
        assert!(matches!(name, ServerName::IpAddress(_)));

        let ctx = TlsContext::builder().server_name("localhost").build().unwrap();
        let name = ctx.client_server_name().unwrap();
        assert!(matches!(name, ServerName::DnsName(_)));
    }

    #[test]
    fn test_server_config_requires_identity() {
        let ctx = TlsContext::builder().build().unwrap();
        let verifier = crate::connection::verifier::RecordingClientVerifier::new(
            &ctx,
            VerifyMode::None,
            Default::default(),
        );
        assert!(matches!(
            ctx.server_config(Arc::new(verifier)),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_parse_server_name_valid() {
        assert!(parse_server_name("localhost").is_ok());
        assert!(parse_server_name("example.com").is_ok());
        assert!(parse_server_name("db.internal.example.com").is_ok());
        assert!(parse_server_name("127.0.0.1").is_ok());
        assert!(parse_server_name("::1").is_ok());
    }

    #[test]
    fn test_parse_server_name_trailing_dot() {
        assert_eq!(parse_server_name("example.com.").unwrap(), "example.com");
    }

    #[test]
    fn test_parse_server_name_invalid() {
        assert!(parse_server_name("").is_err());
        assert!(parse_server_name("example.com:5432").is_err());
        assert!(parse_server_name("bad host").is_err());
    }

    #[test]
    fn test_tls_context_debug() {
        let ctx = TlsContext::builder().verify_hostname(true).build().unwrap();
        let debug_str = format!("{:?}", ctx);
        assert!(debug_str.contains("TlsContext"));
        assert!(debug_str.contains("verify_hostname"));
    }
}
