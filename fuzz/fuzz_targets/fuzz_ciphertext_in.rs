#![no_main]

use libfuzzer_sys::fuzz_target;
use memtls::{Connection, TlsContext};
use std::sync::OnceLock;

static SERVER: OnceLock<TlsContext> = OnceLock::new();

fn server_context() -> &'static TlsContext {
    SERVER.get_or_init(|| {
        TlsContext::builder()
            .certificate_chain_pem(&include_bytes!("../../tests/fixtures/server.pem")[..])
            .private_key_pem(&include_bytes!("../../tests/fixtures/server.key")[..])
            .build()
            .expect("server context")
    })
}

fuzz_target!(|data: &[u8]| {
    let Ok(mut conn) = Connection::new(server_context(), true, true, false) else {
        return;
    };

    // Arbitrary bytes arriving from the network, in two feeds to exercise
    // records split across writes.
    let (first, second) = data.split_at(data.len() / 2);
    for part in [first, second] {
        if conn.feed_ciphertext(part).is_err() {
            break;
        }
        if conn.start().is_err() {
            // The sticky error must be stable once latched
            assert!(conn.error().is_some());
            assert!(conn.read_cleartext(1024).is_err());
            break;
        }
        let _ = conn.drain_ciphertext(usize::MAX);
    }

    let _ = conn.read_cleartext(4096);
    conn.close();
    conn.close();
});
