//! In-memory loopback: a client and a server complete a mutually authenticated
//! handshake and echo a message, with no socket involved.
//!
//! Run with: RUST_LOG=memtls=trace cargo run --example loopback

use memtls::{Connection, Result, TlsContext};
use tracing_subscriber::EnvFilter;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

/// Move pending ciphertext from one side to the other, as a transport would.
fn transfer(from: &mut Connection, to: &mut Connection) -> Result<usize> {
    let bytes = from.drain_ciphertext(usize::MAX)?;
    to.feed_ciphertext(&bytes)
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("memtls=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let server_ctx = TlsContext::builder()
        .certificate_chain_path(fixture("server.pem"))
        .private_key_path(fixture("server.key"))
        .ca_cert_path(fixture("ca.pem"))
        .build()?;
    let client_ctx = TlsContext::builder()
        .certificate_chain_path(fixture("client.pem"))
        .private_key_path(fixture("client.key"))
        .ca_cert_path(fixture("ca.pem"))
        .server_name("localhost")
        .verify_hostname(true)
        .build()?;

    let mut client = Connection::new(&client_ctx, false, false, false)?;
    let mut server = Connection::new(&server_ctx, true, true, true)?;

    let mut rounds = 0;
    while !(client.is_established() && server.is_established()) {
        rounds += 1;
        client.start()?;
        transfer(&mut client, &mut server)?;
        server.start()?;
        transfer(&mut server, &mut client)?;
    }
    println!("handshake complete after {} round(s)", rounds);

    // Verification never fails the handshake; enforce policy here
    let status = server.verification_status();
    if !status.is_ok() {
        println!("rejecting client: {}", status);
        server.close();
        return Ok(());
    }
    println!("client verification: {}", status);
    println!("server verification: {}", client.verification_status());

    if let Some(cipher) = client.negotiated_cipher() {
        println!("cipher: {} ({})", cipher.name, cipher.version);
    }
    if let Some(cert) = server.peer_certificate()? {
        println!("client certificate subject:\n{}", cert.subject);
        println!("fingerprint: {}", cert.fingerprint);
    }

    client.write_cleartext(b"hello over memory")?;
    transfer(&mut client, &mut server)?;
    let request = server.read_cleartext(usize::MAX)?;
    println!("server received {:?}", String::from_utf8_lossy(&request));

    server.write_cleartext(&request)?;
    transfer(&mut server, &mut client)?;
    let echo = client.read_cleartext(usize::MAX)?;
    println!("client received {:?}", String::from_utf8_lossy(&echo));

    client.shutdown()?;
    transfer(&mut client, &mut server)?;
    server.read_cleartext(usize::MAX)?;
    println!("peer closed: {}", server.peer_closed());

    client.close();
    server.close();
    Ok(())
}
