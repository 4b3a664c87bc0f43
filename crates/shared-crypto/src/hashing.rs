//! # SHA-256 Hashing
//!
//! One-shot digests used for verification challenges.

use sha2::{Digest, Sha256};
use shared_types::Hash;

/// Hash data with SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Hex encoding of the SHA-256 digest of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}
