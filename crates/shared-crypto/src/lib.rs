//! # Shared Crypto - Cryptographic Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Challenge digests |
//! | `signatures` | Ed25519 | Address ownership proofs |
//! | `ids` | OS RNG, 256-bit | Cart, wallet, link and nonce identifiers |
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, no RNG dependency when signing
//! - **Addresses are public keys**: an address is the hex encoding of the
//!   Ed25519 verifying key, so ownership is proven by a signature alone
//! - **Random ids**: 32 bytes from `rand::thread_rng` (ChaCha-based CSPRNG)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod ids;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{sha256, sha256_hex};
pub use ids::random_id;
pub use signatures::{verify_address_signature, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
