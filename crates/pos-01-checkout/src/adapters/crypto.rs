//! Production `CryptoProvider`.
//!
//! Addresses are hex Ed25519 public keys, so a challenge is proven by an
//! Ed25519 signature over `sha256(nonce)`.

use crate::ports::outbound::CryptoProvider;
use shared_types::{Address, Hash};

/// SHA-256 digests, Ed25519 verification, random 256-bit hex ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519CryptoProvider;

impl CryptoProvider for Ed25519CryptoProvider {
    fn hash(&self, data: &[u8]) -> Hash {
        shared_crypto::sha256(data)
    }

    fn verify_signature(&self, address: &Address, signature: &str, digest: &Hash) -> bool {
        match shared_crypto::verify_address_signature(address, signature, digest) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("[pos-01] Signature check failed for {}: {}", address, e);
                false
            }
        }
    }

    fn random_id(&self) -> String {
        shared_crypto::random_id()
    }
}
