//! Histogram metrics

use super::labels;

/// Number of driver steps a handshake needed before completing
pub fn handshake_steps(role: &'static str, steps: u32) {
    metrics::histogram!("memtls_handshake_steps", labels::ROLE => role).record(f64::from(steps));
}
