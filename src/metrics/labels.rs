//! Label keys and values shared by counters and histograms

/// Connection role label key
pub const ROLE: &str = "role";

/// Failure stage label key
pub const STAGE: &str = "stage";

/// Verification failure reason label key
pub const REASON: &str = "reason";

/// Cleartext direction label key
pub const DIRECTION: &str = "direction";

/// Client role
pub const ROLE_CLIENT: &str = "client";

/// Server role
pub const ROLE_SERVER: &str = "server";

/// Failure while driving the handshake
pub const STAGE_HANDSHAKE: &str = "handshake";

/// Failure while reading cleartext
pub const STAGE_READ: &str = "read";

/// Failure while writing cleartext
pub const STAGE_WRITE: &str = "write";

/// Failure while queueing close_notify
pub const STAGE_SHUTDOWN: &str = "shutdown";

/// Cleartext submitted for encryption
pub const DIRECTION_ENCRYPT: &str = "encrypt";

/// Cleartext produced by decryption
pub const DIRECTION_DECRYPT: &str = "decrypt";
