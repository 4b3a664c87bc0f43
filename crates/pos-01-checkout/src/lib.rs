//! # Checkout Subsystem
//!
//! **Subsystem ID:** pos-01
//!
//! ## Purpose
//!
//! Builds carts from the catalog, binds them to a payer wallet, freezes them
//! at checkout and reconciles them against ledger transactions until paid.
//! A ledger transaction is credited to at most one cart.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | INVARIANT-1 | `confirmed ⇔ actual_receive ≥ total_price` | `domain/entities.rs` - `Cart::credit()` |
//! | INVARIANT-2 | `actual_receive` and `joined_transaction_ids` only grow | `domain/entities.rs` - `Cart::credit()` |
//! | INVARIANT-3 | One cart per ledger transaction | `service.rs` - `reserve()` |
//! | INVARIANT-4 | At most one wallet per builder | `domain/cart_builder.rs` - `bind_wallet()` |
//! | INVARIANT-5 | Verification is all-or-nothing | `domain/identity.rs` - `AnonymousWallet::verify()` |
//!
//! ## Payment Reconciliation
//!
//! ```text
//! reconcile(tx, cart)
//!   ├─ cart exists?                       else CartNotFound
//!   ├─ tx in an accepted block, regular?  else TransactionNotConfirmed
//!   ├─ reserve tx id                      else TransactionAlreadyUsed
//!   ├─ credit Σ outputs to shop address
//!   ├─ persist history (rollback on failure)
//!   └─ settled? clear the builder lines
//! ```
//!
//! ## Outbound Dependencies
//!
//! | Collaborator | Trait | Purpose |
//! |--------------|-------|---------|
//! | Ledger node | `LedgerGateway` | Block inclusion, balances, managed wallets |
//! | Storage | `RecordStore` | Catalog and cart history |
//! | Crypto | `CryptoProvider` | Challenge digests, signatures, ids |
//! | Clock | `TimeSource` | Link request timestamps |
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      OUTER LAYER                                │
//! │  adapters/store  - InMemoryRecordStore, JsonFileRecordStore     │
//! │  adapters/crypto - Ed25519CryptoProvider                        │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MIDDLE LAYER                               │
//! │  ports/inbound.rs  - ShopApi trait                              │
//! │  ports/outbound.rs - LedgerGateway, RecordStore, CryptoProvider │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      INNER LAYER                                │
//! │  domain/cart_builder.rs - CartBuilder                           │
//! │  domain/entities.rs     - Item, CartLine, Cart                  │
//! │  domain/history.rs      - CartHistory, record codec             │
//! │  domain/identity.rs     - Anonymous address ownership           │
//! │  domain/errors.rs       - ShopError, ShopErrorPayload           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::*;
pub use domain::*;
pub use ports::*;
pub use service::ShopService;
