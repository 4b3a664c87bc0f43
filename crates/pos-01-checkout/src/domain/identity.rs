//! # Anonymous Address Ownership
//!
//! Challenge/response flow that lets a customer prove control of ledger
//! addresses without the shop ever seeing a private key.
//!
//! ```text
//! request_link ──→ AddressLinkRequest{link_id}
//!        │
//! register(addresses, link_id) ──→ [PENDING] + one nonce per address
//!        │
//! submit(signatures) ──all valid──→ [VERIFIED] (leaves the pending pool)
//!        │
//!        └── missing / bad signature ──→ stays [PENDING]
//! ```
//!
//! A signature proves an address when it is a valid Ed25519 signature over
//! `hash(nonce)` under the public key the address encodes. Verification is
//! all-or-nothing across the wallet's addresses.
//!
//! Wallets left pending longer than [`PENDING_WALLET_TTL_SECS`] are dropped
//! on the next registration.

use super::errors::ShopError;
use super::value_objects::{AddressLinkRequest, LinkId};
use crate::ports::outbound::CryptoProvider;
use serde::{Deserialize, Serialize};
use shared_types::{Address, WalletId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Seconds a registered wallet may stay unverified before it is evicted.
pub const PENDING_WALLET_TTL_SECS: u64 = 15 * 60;

/// Nonce the customer must sign for one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationChallenge {
    pub address: Address,
    pub nonce: String,
    /// Hex signature, unset until the customer answers.
    pub signature: Option<String>,
}

/// A customer's answer to one challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub address: Address,
    pub signature: String,
}

/// Challenge handed to the customer after registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressChallenge {
    pub address: Address,
    pub nonce: String,
}

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredWallet {
    pub wallet_id: WalletId,
    pub challenges: Vec<AddressChallenge>,
}

/// Anonymous wallet awaiting proof of ownership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnonymousWallet {
    id: WalletId,
    addresses: Vec<Address>,
    challenges: Vec<VerificationChallenge>,
}

impl AnonymousWallet {
    /// Create a pending wallet with one fresh nonce per address.
    pub fn from_addresses(
        id: WalletId,
        addresses: Vec<Address>,
        mut next_nonce: impl FnMut() -> String,
    ) -> Self {
        let challenges = addresses
            .iter()
            .map(|address| VerificationChallenge {
                address: address.clone(),
                nonce: next_nonce(),
                signature: None,
            })
            .collect();
        Self {
            id,
            addresses,
            challenges,
        }
    }

    pub fn id(&self) -> &WalletId {
        &self.id
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    pub fn challenges(&self) -> &[VerificationChallenge] {
        &self.challenges
    }

    /// Attach signatures to the challenges with matching addresses.
    ///
    /// Responses for addresses the wallet never claimed are ignored. An empty
    /// signature leaves the challenge unset. Returns the number of challenges
    /// updated.
    pub fn record_responses(&mut self, responses: &[VerificationResponse]) -> usize {
        let mut updated = 0;
        for response in responses {
            if let Some(challenge) = self
                .challenges
                .iter_mut()
                .find(|challenge| challenge.address == response.address)
            {
                let signature = response.signature.trim();
                challenge.signature = (!signature.is_empty()).then(|| signature.to_string());
                updated += 1;
            }
        }
        updated
    }

    /// Check every challenge.
    ///
    /// # Errors
    /// - `VerificationDataMissing` if there are no challenges or any is unsigned
    /// - `InvalidSignature` on the first signature that does not verify
    pub fn verify(&self, crypto: &dyn CryptoProvider) -> Result<VerifiedAnonymousWallet, ShopError> {
        if self.challenges.is_empty() || self.challenges.iter().any(|c| c.signature.is_none()) {
            return Err(ShopError::VerificationDataMissing {
                wallet_id: self.id.clone(),
            });
        }

        for challenge in &self.challenges {
            let digest = crypto.hash(challenge.nonce.as_bytes());
            let signature = challenge.signature.as_deref().unwrap_or_default();
            if !crypto.verify_signature(&challenge.address, signature, &digest) {
                return Err(ShopError::InvalidSignature {
                    wallet_id: self.id.clone(),
                    address: challenge.address.clone(),
                });
            }
        }

        Ok(VerifiedAnonymousWallet {
            id: self.id.clone(),
            addresses: self.addresses.clone(),
        })
    }
}

/// Anonymous wallet whose every address has been proven.
///
/// Only produced by [`AnonymousWallet::verify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedAnonymousWallet {
    id: WalletId,
    addresses: Vec<Address>,
}

impl VerifiedAnonymousWallet {
    pub fn id(&self) -> &WalletId {
        &self.id
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }
}

#[derive(Debug)]
struct PendingWallet {
    wallet: AnonymousWallet,
    registered_at: u64,
}

/// Link request and pending wallets of one shop instance.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    link_request: Option<AddressLinkRequest>,
    pending: HashMap<WalletId, PendingWallet>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the outstanding link request.
    pub fn issue_link_request(&mut self, link_id: LinkId, timestamp: u64) -> AddressLinkRequest {
        let request = AddressLinkRequest { link_id, timestamp };
        self.link_request = Some(request.clone());
        request
    }

    pub fn link_request(&self) -> Option<&AddressLinkRequest> {
        self.link_request.as_ref()
    }

    /// Register claimed addresses against the outstanding link request.
    ///
    /// Wallets left unverified for [`PENDING_WALLET_TTL_SECS`] are evicted
    /// first.
    ///
    /// # Errors
    /// - `InvalidLinkRequest` if no request is outstanding, `link_id` does not
    ///   match, the list is empty, an address is malformed, or `wallet_id` is
    ///   already pending
    pub fn register(
        &mut self,
        link_id: &LinkId,
        raw_addresses: &[String],
        wallet_id: WalletId,
        now: u64,
        next_nonce: impl FnMut() -> String,
    ) -> Result<&AnonymousWallet, ShopError> {
        let invalid = |reason: String| ShopError::InvalidLinkRequest { reason };
        self.evict_expired(now);

        match &self.link_request {
            None => return Err(invalid("no link request outstanding".into())),
            Some(request) if &request.link_id != link_id => {
                return Err(invalid(format!("unknown link id {}", link_id)))
            }
            Some(_) => {}
        }
        if raw_addresses.is_empty() {
            return Err(invalid("no addresses supplied".into()));
        }

        let mut addresses: Vec<Address> = Vec::with_capacity(raw_addresses.len());
        for raw in raw_addresses {
            let address = Address::parse(raw)
                .map_err(|e| invalid(format!("malformed address {:?}: {}", raw, e)))?;
            if !addresses.contains(&address) {
                addresses.push(address);
            }
        }

        match self.pending.entry(wallet_id) {
            Entry::Occupied(entry) => Err(invalid(format!(
                "wallet {} is already pending",
                entry.key()
            ))),
            Entry::Vacant(entry) => {
                let wallet =
                    AnonymousWallet::from_addresses(entry.key().clone(), addresses, next_nonce);
                let pending = entry.insert(PendingWallet {
                    wallet,
                    registered_at: now,
                });
                Ok(&pending.wallet)
            }
        }
    }

    /// Drop wallets registered more than [`PENDING_WALLET_TTL_SECS`] before `now`.
    pub fn evict_expired(&mut self, now: u64) -> usize {
        let before = self.pending.len();
        self.pending
            .retain(|_, p| now.saturating_sub(p.registered_at) < PENDING_WALLET_TTL_SECS);
        before - self.pending.len()
    }

    pub fn pending(&self, wallet_id: &WalletId) -> Option<&AnonymousWallet> {
        self.pending.get(wallet_id).map(|p| &p.wallet)
    }

    pub fn pending_mut(&mut self, wallet_id: &WalletId) -> Result<&mut AnonymousWallet, ShopError> {
        self.pending
            .get_mut(wallet_id)
            .map(|p| &mut p.wallet)
            .ok_or_else(|| ShopError::WalletNotFound {
                wallet_id: wallet_id.clone(),
            })
    }

    /// Drop a wallet from the pending pool once verified.
    pub fn complete(&mut self, wallet_id: &WalletId) -> Option<AnonymousWallet> {
        self.pending.remove(wallet_id).map(|p| p.wallet)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl RegisteredWallet {
    pub(crate) fn from_pending(wallet: &AnonymousWallet) -> Self {
        Self {
            wallet_id: wallet.id().clone(),
            challenges: wallet
                .challenges()
                .iter()
                .map(|challenge| AddressChallenge {
                    address: challenge.address.clone(),
                    nonce: challenge.nonce.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::MockCryptoProvider;

    fn address(byte: u8) -> Address {
        Address::from_public_key(&[byte; 32])
    }

    fn counter() -> impl FnMut() -> String {
        let mut n = 0;
        move || {
            n += 1;
            format!("nonce-{}", n)
        }
    }

    const NOW: u64 = 1_700_000_000;

    fn registry_with_link() -> (IdentityRegistry, LinkId) {
        let mut registry = IdentityRegistry::new();
        let link = registry.issue_link_request(LinkId::new("link-1"), NOW);
        (registry, link.link_id)
    }

    #[test]
    fn test_register_requires_matching_link() {
        let mut registry = IdentityRegistry::new();
        let raw = vec![address(1).to_string()];
        assert!(matches!(
            registry.register(&LinkId::new("x"), &raw, WalletId::new("w"), NOW, counter()),
            Err(ShopError::InvalidLinkRequest { .. })
        ));

        let (mut registry, _) = registry_with_link();
        assert!(matches!(
            registry.register(&LinkId::new("other"), &raw, WalletId::new("w"), NOW, counter()),
            Err(ShopError::InvalidLinkRequest { .. })
        ));
        assert_eq!(registry.pending_count(), 0);
    }

    #[test]
    fn test_register_rejects_empty_and_malformed() {
        let (mut registry, link) = registry_with_link();
        assert!(registry
            .register(&link, &[], WalletId::new("w"), NOW, counter())
            .is_err());

        let raw = vec![address(1).to_string(), "not-hex".to_string()];
        assert!(registry
            .register(&link, &raw, WalletId::new("w"), NOW, counter())
            .is_err());
        assert_eq!(registry.pending_count(), 0);
    }

    #[test]
    fn test_register_issues_one_nonce_per_unique_address() {
        let (mut registry, link) = registry_with_link();
        let raw = vec![
            address(1).to_string(),
            address(2).to_string(),
            address(1).to_string().to_uppercase(),
        ];
        let wallet = registry
            .register(&link, &raw, WalletId::new("w"), NOW, counter())
            .unwrap();

        assert_eq!(wallet.addresses().len(), 2);
        let nonces: Vec<_> = wallet.challenges().iter().map(|c| c.nonce.as_str()).collect();
        assert_eq!(nonces, vec!["nonce-1", "nonce-2"]);
        assert!(registry.pending(&WalletId::new("w")).is_some());
    }

    #[test]
    fn test_verify_all_or_nothing() {
        let crypto = MockCryptoProvider::default();
        let mut wallet = AnonymousWallet::from_addresses(
            WalletId::new("w"),
            vec![address(1), address(2)],
            counter(),
        );

        // A signs, B's signature is empty
        wallet.record_responses(&[
            VerificationResponse {
                address: address(1),
                signature: MockCryptoProvider::sign(&address(1), "nonce-1"),
            },
            VerificationResponse {
                address: address(2),
                signature: String::new(),
            },
        ]);
        assert!(matches!(
            wallet.verify(&crypto),
            Err(ShopError::VerificationDataMissing { .. })
        ));

        // B signs the wrong nonce
        wallet.record_responses(&[VerificationResponse {
            address: address(2),
            signature: MockCryptoProvider::sign(&address(2), "nonce-1"),
        }]);
        assert_eq!(
            wallet.verify(&crypto),
            Err(ShopError::InvalidSignature {
                wallet_id: WalletId::new("w"),
                address: address(2),
            })
        );

        // B fixes it
        wallet.record_responses(&[VerificationResponse {
            address: address(2),
            signature: MockCryptoProvider::sign(&address(2), "nonce-2"),
        }]);
        let verified = wallet.verify(&crypto).unwrap();
        assert_eq!(verified.addresses(), &[address(1), address(2)]);
    }

    #[test]
    fn test_responses_for_unclaimed_addresses_are_ignored() {
        let mut wallet =
            AnonymousWallet::from_addresses(WalletId::new("w"), vec![address(1)], counter());
        let updated = wallet.record_responses(&[VerificationResponse {
            address: address(9),
            signature: "ab".repeat(64),
        }]);
        assert_eq!(updated, 0);
        assert!(wallet.challenges()[0].signature.is_none());
    }

    #[test]
    fn test_wallet_without_challenges_is_missing_data() {
        let crypto = MockCryptoProvider::default();
        let wallet = AnonymousWallet::from_addresses(WalletId::new("w"), vec![], counter());
        assert!(matches!(
            wallet.verify(&crypto),
            Err(ShopError::VerificationDataMissing { .. })
        ));
    }

    #[test]
    fn test_new_link_request_replaces_old() {
        let (mut registry, first) = registry_with_link();
        let second = registry.issue_link_request(LinkId::new("link-2"), 1_700_000_100);

        assert_ne!(first, second.link_id);
        let raw = vec![address(1).to_string()];
        assert!(registry
            .register(&first, &raw, WalletId::new("w"), NOW, counter())
            .is_err());
        assert!(registry
            .register(&second.link_id, &raw, WalletId::new("w"), NOW, counter())
            .is_ok());
    }

    #[test]
    fn test_duplicate_wallet_id_is_rejected() {
        let (mut registry, link) = registry_with_link();
        let first = vec![address(1).to_string()];
        let second = vec![address(2).to_string()];
        registry
            .register(&link, &first, WalletId::new("w"), NOW, counter())
            .unwrap();

        assert!(matches!(
            registry.register(&link, &second, WalletId::new("w"), NOW, counter()),
            Err(ShopError::InvalidLinkRequest { .. })
        ));
        let kept = registry.pending(&WalletId::new("w")).unwrap();
        assert_eq!(kept.addresses(), &[address(1)]);
    }

    #[test]
    fn test_stale_pending_wallets_are_evicted() {
        let (mut registry, link) = registry_with_link();
        let raw = vec![address(1).to_string()];
        registry
            .register(&link, &raw, WalletId::new("old"), NOW, counter())
            .unwrap();
        registry
            .register(&link, &raw, WalletId::new("recent"), NOW + 600, counter())
            .unwrap();
        assert_eq!(registry.pending_count(), 2);

        registry
            .register(
                &link,
                &raw,
                WalletId::new("new"),
                NOW + PENDING_WALLET_TTL_SECS,
                counter(),
            )
            .unwrap();
        assert!(registry.pending(&WalletId::new("old")).is_none());
        assert!(registry.pending(&WalletId::new("recent")).is_some());
        assert_eq!(registry.pending_count(), 2);

        assert_eq!(registry.evict_expired(NOW + 10 * PENDING_WALLET_TTL_SECS), 2);
        assert!(registry.pending_mut(&WalletId::new("new")).is_err());
    }
}
