//! # Random Identifiers
//!
//! Opaque identifiers for carts, wallets, link requests and challenge nonces.

use rand::RngCore;

/// Number of random bytes behind an identifier.
pub const ID_BYTES: usize = 32;

/// Generate a fresh 64-char hex identifier.
pub fn random_id() -> String {
    let mut bytes = [0u8; ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
