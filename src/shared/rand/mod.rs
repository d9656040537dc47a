//! Random token helpers.

use rand::RngCore;

/// Entropy behind every relay request id (16 hex chars on the wire).
pub const REQUEST_ID_BYTES: usize = 8;

/// Returns `n` random bytes encoded as lowercase hex.
pub fn hex_token(n: usize) -> String {
    let mut bytes = vec![0u8; n];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Returns a fresh relay request id.
pub fn request_id() -> String {
    hex_token(REQUEST_ID_BYTES)
}
