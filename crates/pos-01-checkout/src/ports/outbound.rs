//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the shop requires the host application to provide.
//!
//! | Port | Production adapter |
//! |------|--------------------|
//! | `LedgerGateway` | supplied by the host (ledger node client) |
//! | `CryptoProvider` | `Ed25519CryptoProvider` (adapters/crypto.rs) |
//! | `RecordStore` | `JsonFileRecordStore` (adapters/store/file.rs) |
//! | `TimeSource` | `SystemTimeSource` (below) |

use async_trait::async_trait;
use serde_json::Value;
use shared_types::{
    Address, Amount, Hash, LedgerError, LedgerTransaction, TransactionId, WalletId,
};
use std::sync::Arc;
use thiserror::Error;

/// Narrow view of the ledger collaborator.
///
/// Wallet custody, balance computation, transaction construction and block
/// inclusion all live on the other side of this trait.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Look up a transaction inside an accepted block.
    ///
    /// `Ok(None)` when the ledger has not included the transaction (yet).
    async fn transaction_in_block(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<LedgerTransaction>, LedgerError>;

    /// Spendable balance of an address.
    ///
    /// # Errors
    /// - `AddressHasNoHistory` if the address never took part in a transaction
    async fn address_balance(&self, address: &Address) -> Result<Amount, LedgerError>;

    /// Addresses of a managed wallet.
    async fn wallet_addresses(&self, wallet_id: &WalletId) -> Result<Vec<Address>, LedgerError>;

    /// Build and sign a transaction paying `amount` from `from` to `to`,
    /// returning any change to `change_address`.
    async fn create_transaction(
        &self,
        wallet_id: &WalletId,
        from: &Address,
        to: &Address,
        amount: Amount,
        change_address: &Address,
    ) -> Result<LedgerTransaction, LedgerError>;

    /// Hand a signed transaction to the ledger.
    ///
    /// # Errors
    /// - `Rejected` if the ledger's validation refuses it
    async fn submit_transaction(
        &self,
        transaction: LedgerTransaction,
    ) -> Result<LedgerTransaction, LedgerError>;

    /// Check a managed wallet's password hash.
    async fn check_wallet_password(
        &self,
        wallet_id: &WalletId,
        password_hash: &str,
    ) -> Result<bool, LedgerError>;
}

#[async_trait]
impl<T: LedgerGateway + ?Sized> LedgerGateway for Arc<T> {
    async fn transaction_in_block(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<LedgerTransaction>, LedgerError> {
        (**self).transaction_in_block(transaction_id).await
    }

    async fn address_balance(&self, address: &Address) -> Result<Amount, LedgerError> {
        (**self).address_balance(address).await
    }

    async fn wallet_addresses(&self, wallet_id: &WalletId) -> Result<Vec<Address>, LedgerError> {
        (**self).wallet_addresses(wallet_id).await
    }

    async fn create_transaction(
        &self,
        wallet_id: &WalletId,
        from: &Address,
        to: &Address,
        amount: Amount,
        change_address: &Address,
    ) -> Result<LedgerTransaction, LedgerError> {
        (**self)
            .create_transaction(wallet_id, from, to, amount, change_address)
            .await
    }

    async fn submit_transaction(
        &self,
        transaction: LedgerTransaction,
    ) -> Result<LedgerTransaction, LedgerError> {
        (**self).submit_transaction(transaction).await
    }

    async fn check_wallet_password(
        &self,
        wallet_id: &WalletId,
        password_hash: &str,
    ) -> Result<bool, LedgerError> {
        (**self).check_wallet_password(wallet_id, password_hash).await
    }
}

/// Hashing, signature verification and id generation.
pub trait CryptoProvider: Send + Sync {
    /// Digest of `data`.
    fn hash(&self, data: &[u8]) -> Hash;

    /// Returns true if `signature` signs `digest` under the key behind `address`.
    fn verify_signature(&self, address: &Address, signature: &str, digest: &Hash) -> bool;

    /// Fresh unguessable identifier.
    fn random_id(&self) -> String;
}

/// Errors raised by a record store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Reading or writing the collection failed.
    #[error("I/O error on collection {collection}: {message}")]
    Io { collection: String, message: String },

    /// The collection exists but is not a JSON array of records.
    #[error("Collection {collection} is corrupted: {message}")]
    Corrupted { collection: String, message: String },
}

/// Record persistence with "read all / overwrite all" semantics.
///
/// A collection that was never written reads as empty.
pub trait RecordStore: Send + Sync {
    fn read_all(&self, collection: &str) -> Result<Vec<Value>, StoreError>;

    /// Replace the whole collection with `records`.
    ///
    /// Either every record is stored or the previous contents remain.
    fn write_all(&self, collection: &str, records: Vec<Value>) -> Result<(), StoreError>;
}

impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    fn read_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        (**self).read_all(collection)
    }

    fn write_all(&self, collection: &str, records: Vec<Value>) -> Result<(), StoreError> {
        (**self).write_all(collection, records)
    }
}

/// Time source for link request timestamps.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Returns the current time in seconds since UNIX epoch.
    fn now(&self) -> u64;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

// =============================================================================
// Test doubles
// =============================================================================

/// Scripted in-memory ledger for testing.
#[cfg(test)]
#[derive(Default)]
pub struct MockLedgerGateway {
    state: parking_lot::Mutex<MockLedgerState>,
}

#[cfg(test)]
#[derive(Default)]
struct MockLedgerState {
    included: std::collections::HashMap<TransactionId, LedgerTransaction>,
    balances: std::collections::HashMap<Address, Amount>,
    wallets: std::collections::HashMap<WalletId, (String, Vec<Address>)>,
    submitted: Vec<LedgerTransaction>,
    reject_with: Option<String>,
    unavailable: bool,
    next_tx: u64,
}

#[cfg(test)]
impl MockLedgerGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(self, address: Address, balance: Amount) -> Self {
        self.state.lock().balances.insert(address, balance);
        self
    }

    pub fn with_wallet(self, wallet_id: &str, password_hash: &str, addresses: Vec<Address>) -> Self {
        self.state.lock().wallets.insert(
            WalletId::new(wallet_id),
            (password_hash.to_string(), addresses),
        );
        self
    }

    /// Make `transaction` visible as included in a block.
    pub fn include(&self, transaction: LedgerTransaction) {
        self.state
            .lock()
            .included
            .insert(transaction.id.clone(), transaction);
    }

    pub fn reject_submissions(&self, reason: &str) {
        self.state.lock().reject_with = Some(reason.to_string());
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    pub fn submitted(&self) -> Vec<LedgerTransaction> {
        self.state.lock().submitted.clone()
    }

    fn check_available(state: &MockLedgerState) -> Result<(), LedgerError> {
        if state.unavailable {
            return Err(LedgerError::Unavailable("mock ledger offline".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[async_trait]
impl LedgerGateway for MockLedgerGateway {
    async fn transaction_in_block(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<LedgerTransaction>, LedgerError> {
        let state = self.state.lock();
        Self::check_available(&state)?;
        Ok(state.included.get(transaction_id).cloned())
    }

    async fn address_balance(&self, address: &Address) -> Result<Amount, LedgerError> {
        let state = self.state.lock();
        Self::check_available(&state)?;
        state
            .balances
            .get(address)
            .copied()
            .ok_or_else(|| LedgerError::AddressHasNoHistory {
                address: address.clone(),
            })
    }

    async fn wallet_addresses(&self, wallet_id: &WalletId) -> Result<Vec<Address>, LedgerError> {
        let state = self.state.lock();
        Self::check_available(&state)?;
        state
            .wallets
            .get(wallet_id)
            .map(|(_, addresses)| addresses.clone())
            .ok_or_else(|| LedgerError::WalletNotFound {
                wallet_id: wallet_id.clone(),
            })
    }

    async fn create_transaction(
        &self,
        wallet_id: &WalletId,
        from: &Address,
        to: &Address,
        amount: Amount,
        change_address: &Address,
    ) -> Result<LedgerTransaction, LedgerError> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;
        if !state.wallets.contains_key(wallet_id) {
            return Err(LedgerError::WalletNotFound {
                wallet_id: wallet_id.clone(),
            });
        }
        let balance = state.balances.get(from).copied().unwrap_or(0);
        state.next_tx += 1;

        let mut outputs = vec![shared_types::TransactionOutput {
            address: to.clone(),
            amount,
        }];
        if balance > amount {
            outputs.push(shared_types::TransactionOutput {
                address: change_address.clone(),
                amount: balance - amount,
            });
        }
        Ok(LedgerTransaction {
            id: TransactionId::new(format!("mock-tx-{}", state.next_tx)),
            tx_type: shared_types::TransactionType::Regular,
            inputs: vec![shared_types::TransactionInput {
                transaction: TransactionId::new("mock-genesis"),
                index: 0,
                amount: balance,
                address: from.clone(),
                signature: Some("signed".into()),
            }],
            outputs,
        })
    }

    async fn submit_transaction(
        &self,
        transaction: LedgerTransaction,
    ) -> Result<LedgerTransaction, LedgerError> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;
        if let Some(reason) = state.reject_with.clone() {
            return Err(LedgerError::Rejected { reason });
        }
        state.submitted.push(transaction.clone());
        Ok(transaction)
    }

    async fn check_wallet_password(
        &self,
        wallet_id: &WalletId,
        password_hash: &str,
    ) -> Result<bool, LedgerError> {
        let state = self.state.lock();
        Self::check_available(&state)?;
        state
            .wallets
            .get(wallet_id)
            .map(|(expected, _)| expected == password_hash)
            .ok_or_else(|| LedgerError::WalletNotFound {
                wallet_id: wallet_id.clone(),
            })
    }
}

/// Deterministic crypto for testing.
///
/// A signature is valid when it equals `"<address>:<hex digest>"`, and ids
/// count up from `id-1`.
#[cfg(test)]
#[derive(Default)]
pub struct MockCryptoProvider {
    next_id: std::sync::atomic::AtomicU64,
}

#[cfg(test)]
impl MockCryptoProvider {
    /// Signature the mock accepts for `nonce` under `address`.
    pub fn sign(address: &Address, nonce: &str) -> String {
        format!("{}:{}", address, shared_crypto::sha256_hex(nonce.as_bytes()))
    }
}

#[cfg(test)]
impl CryptoProvider for MockCryptoProvider {
    fn hash(&self, data: &[u8]) -> Hash {
        shared_crypto::sha256(data)
    }

    fn verify_signature(&self, address: &Address, signature: &str, digest: &Hash) -> bool {
        signature == format!("{}:{}", address, hex::encode(digest))
    }

    fn random_id(&self) -> String {
        let n = self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
            + 1;
        format!("id-{}", n)
    }
}

/// Mock time source for testing.
#[cfg(test)]
pub struct MockTimeSource {
    time: std::sync::atomic::AtomicU64,
}

#[cfg(test)]
impl MockTimeSource {
    pub fn new(initial: u64) -> Self {
        Self {
            time: std::sync::atomic::AtomicU64::new(initial),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.time
            .fetch_add(secs, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl TimeSource for MockTimeSource {
    fn now(&self) -> u64 {
        self.time.load(std::sync::atomic::Ordering::SeqCst)
    }
}
