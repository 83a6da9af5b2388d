//! Shared helpers for integration tests
//!
//! Connections never touch a socket: "the network" is the test moving bytes from
//! one connection's network-out queue into the other's network-in queue.

#![allow(dead_code)]

use memtls::{Connection, Error, Result, TlsContext};
use time::{Duration, OffsetDateTime};

/// Upper bound on ping-pong rounds before a handshake is considered stuck
pub const MAX_ROUNDS: usize = 10;

pub fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

/// Server context with the CA-signed `localhost` identity, trusting the test CA
pub fn server_context() -> TlsContext {
    TlsContext::builder()
        .certificate_chain_path(fixture("server.pem"))
        .private_key_path(fixture("server.key"))
        .ca_cert_path(fixture("ca.pem"))
        .build()
        .expect("server context")
}

/// Client context without an identity, trusting the test CA
pub fn client_context() -> TlsContext {
    TlsContext::builder()
        .ca_cert_path(fixture("ca.pem"))
        .build()
        .expect("client context")
}

/// Client context presenting the given fixture identity
pub fn client_context_with_identity(cert: &str, key: &str) -> TlsContext {
    TlsContext::builder()
        .certificate_chain_path(fixture(cert))
        .private_key_path(fixture(key))
        .ca_cert_path(fixture("ca.pem"))
        .build()
        .expect("client context with identity")
}

/// Move everything pending in `from`'s network-out into `to`'s network-in.
pub fn transfer(from: &mut Connection, to: &mut Connection) -> Result<usize> {
    let bytes = from.drain_ciphertext(usize::MAX)?;
    to.feed_ciphertext(&bytes)
}

/// Same as `transfer`, but in slices of at most `step` bytes.
pub fn transfer_in_steps(from: &mut Connection, to: &mut Connection, step: usize) -> Result<usize> {
    let mut total = 0;
    loop {
        let bytes = from.drain_ciphertext(step)?;
        if bytes.is_empty() {
            return Ok(total);
        }
        total += to.feed_ciphertext(&bytes)?;
    }
}

/// Ping-pong handshake bytes until both sides are established.
///
/// Returns the number of rounds it took.
pub fn handshake(client: &mut Connection, server: &mut Connection) -> Result<usize> {
    for round in 1..=MAX_ROUNDS {
        client.start()?;
        transfer(client, server)?;
        server.start()?;
        transfer(server, client)?;
        if client.is_established() && server.is_established() {
            return Ok(round);
        }
    }
    Err(Error::InvalidState {
        expected: "established".into(),
        actual: format!("client {}, server {}", client.state(), server.state()),
    })
}

/// Read cleartext until `expected` bytes arrived or nothing more is available.
pub fn read_all(conn: &mut Connection, expected: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected);
    while out.len() < expected {
        let chunk = conn.read_cleartext(expected - out.len())?;
        if chunk.is_empty() {
            break;
        }
        out.extend_from_slice(&chunk);
    }
    Ok(out)
}

/// Deterministic payload of `len` bytes
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Material generated at test time: an ECDSA CA and a leaf it signed
pub struct Generated {
    pub ca_pem: String,
    pub leaf_pem: String,
    pub leaf_key_pem: String,
}

/// Generate a CA and a `localhost` leaf valid between the given offsets from now.
pub fn generate_leaf(not_before: Duration, not_after: Duration) -> Generated {
    use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};

    let ca_key = KeyPair::generate().expect("CA key");
    let mut ca_params = CertificateParams::new(Vec::<String>::new()).expect("CA params");
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    ca_params
        .distinguished_name
        .push(DnType::CommonName, "Generated Test CA");
    let ca_cert = ca_params.self_signed(&ca_key).expect("CA certificate");

    let leaf_key = KeyPair::generate().expect("leaf key");
    let mut params = CertificateParams::new(vec!["localhost".to_string()]).expect("leaf params");
    params
        .distinguished_name
        .push(DnType::CommonName, "generated leaf");
    let now = OffsetDateTime::now_utc();
    params.not_before = now + not_before;
    params.not_after = now + not_after;
    let leaf = params
        .signed_by(&leaf_key, &ca_cert, &ca_key)
        .expect("leaf certificate");

    Generated {
        ca_pem: ca_cert.pem(),
        leaf_pem: leaf.pem(),
        leaf_key_pem: leaf_key.serialize_pem(),
    }
}
