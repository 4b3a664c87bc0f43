//! # Point-of-Sale Test Suite
//!
//! Cross-crate flows driven through `ShopApi` with real Ed25519 keys and the
//! JSON file store.
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── ledger.rs   # Scripted ledger collaborator
//!     └── flows.rs    # Checkout, verification, reconciliation, restart
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p pos-tests
//! ```

pub mod integration;
