//! Counter metrics

use super::labels;

/// A new connection was created
pub fn connection_created(role: &'static str) {
    metrics::counter!("memtls_connections_created_total", labels::ROLE => role).increment(1);
}

/// A handshake reached the established state
pub fn handshake_completed(role: &'static str) {
    metrics::counter!("memtls_handshakes_completed_total", labels::ROLE => role).increment(1);
}

/// A fatal error was latched
pub fn fatal_error(role: &'static str, stage: &'static str) {
    metrics::counter!(
        "memtls_fatal_errors_total",
        labels::ROLE => role,
        labels::STAGE => stage
    )
    .increment(1);
}

/// Peer certificate verification produced a failure reason
pub fn verification_failed(reason: &str) {
    metrics::counter!(
        "memtls_verification_failures_total",
        labels::REASON => reason.to_string()
    )
    .increment(1);
}

/// Cleartext bytes moved through the engine
pub fn cleartext_bytes(direction: &'static str, count: usize) {
    if count == 0 {
        return;
    }
    metrics::counter!("memtls_cleartext_bytes_total", labels::DIRECTION => direction)
        .increment(count as u64);
}
