//! # Error Types
//!
//! Defines error types used across crates.

use crate::entities::{Address, WalletId};
use thiserror::Error;

/// Errors raised when parsing a ledger address.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressError {
    /// The address is not exactly 64 characters long.
    #[error("Invalid address length: expected 64 hex chars, got {0}")]
    InvalidLength(usize),

    /// The address contains non-hex characters.
    #[error("Invalid address encoding: {0}")]
    InvalidEncoding(String),
}

/// Errors returned by the ledger collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The address never took part in any transaction.
    #[error("Address {address} has no transaction history")]
    AddressHasNoHistory { address: Address },

    /// The ledger does not know the wallet.
    #[error("Wallet not found: {wallet_id}")]
    WalletNotFound { wallet_id: WalletId },

    /// The ledger refused a transaction during validation.
    #[error("Transaction rejected: {reason}")]
    Rejected { reason: String },

    /// The ledger could not be reached or failed internally.
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}
