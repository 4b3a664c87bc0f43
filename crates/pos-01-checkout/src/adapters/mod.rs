//! Adapters layer for the checkout subsystem.
//!
//! - `store`: `RecordStore` implementations (in-memory, JSON files)
//! - `crypto`: `CryptoProvider` backed by `shared-crypto`

pub mod crypto;
pub mod store;

pub use crypto::Ed25519CryptoProvider;
pub use store::{InMemoryRecordStore, JsonFileRecordStore};
