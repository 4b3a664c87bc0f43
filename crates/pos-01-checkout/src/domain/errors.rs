//! # Domain Errors
//!
//! Error types for the checkout subsystem.
//!
//! Every operation exposed by the shop returns `ShopError`. The kind is stable
//! (`ShopErrorType`) and the payload carries the ids a presentation layer
//! needs to render the failure.

use super::value_objects::{CartId, ItemId};
use super::wallet::WalletKind;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, LedgerError, TransactionId, WalletId};
use std::fmt;
use thiserror::Error;

/// External collaborator that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Collaborator {
    Ledger,
    Storage,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ledger => f.write_str("ledger"),
            Self::Storage => f.write_str("storage"),
        }
    }
}

/// Errors that can occur during shop operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShopError {
    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------
    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: ItemId },

    // -------------------------------------------------------------------------
    // Cart builder
    // -------------------------------------------------------------------------
    #[error("Invalid count {count} for item {item_id}")]
    InvalidItemCount { item_id: ItemId, count: u64 },

    #[error("Cart has no items")]
    EmptyCart,

    #[error("Item {item_id} is not in the cart")]
    ItemNotInCart { item_id: ItemId },

    #[error("No wallet linked to the cart")]
    MissingWallet,

    #[error("No payment address selected for the cart")]
    MissingPaymentAddress,

    /// A payment address or another wallet is already bound.
    #[error("Cart already linked with wallet {wallet_id}; unlink before linking a new wallet")]
    CartAlreadyLinked { wallet_id: WalletId },

    // -------------------------------------------------------------------------
    // Checkout and reconciliation
    // -------------------------------------------------------------------------
    #[error("Cart not found: {cart_id}")]
    CartNotFound { cart_id: CartId },

    #[error("Transaction {transaction_id} is not included in any block")]
    TransactionNotConfirmed { transaction_id: TransactionId },

    #[error("Transaction {transaction_id} has already been credited to a cart")]
    TransactionAlreadyUsed { transaction_id: TransactionId },

    #[error("Insufficient balance on {address}: required {required}, available {available}")]
    InsufficientBalance {
        address: Address,
        required: Amount,
        available: Amount,
    },

    #[error("Address {address} does not belong to wallet {wallet_id}")]
    InvalidPaymentAddress { address: Address, wallet_id: WalletId },

    #[error("Cart {cart_id} is already paid")]
    CartAlreadyPaid { cart_id: CartId },

    #[error("Payment method not allowed for {kind} wallet {wallet_id}")]
    UnsupportedPaymentMethod { wallet_id: WalletId, kind: WalletKind },

    #[error("Ledger rejected the transaction: {reason}")]
    TransactionRejected { reason: String },

    // -------------------------------------------------------------------------
    // Identity protocol
    // -------------------------------------------------------------------------
    #[error("Wallet not found: {wallet_id}")]
    WalletNotFound { wallet_id: WalletId },

    #[error("Invalid link request: {reason}")]
    InvalidLinkRequest { reason: String },

    #[error("Verification data is empty or a signature is not placed for wallet {wallet_id}")]
    VerificationDataMissing { wallet_id: WalletId },

    #[error("Invalid signature for address {address} of wallet {wallet_id}")]
    InvalidSignature { wallet_id: WalletId, address: Address },

    #[error("Invalid password for wallet {wallet_id}")]
    InvalidPassword { wallet_id: WalletId },

    // -------------------------------------------------------------------------
    // Collaborators
    // -------------------------------------------------------------------------
    #[error("{collaborator} unavailable: {message}")]
    CollaboratorUnavailable {
        collaborator: Collaborator,
        message: String,
    },

    /// The ledger accepted a payment but the history write failed. The
    /// credit stands in memory and is written with the next successful save.
    #[error("Cart {cart_id} paid by transaction {transaction_id} but not saved: {message}")]
    CreditNotPersisted {
        cart_id: CartId,
        transaction_id: TransactionId,
        message: String,
    },

    #[error("Malformed record in {collection}: {message}")]
    Decode { collection: String, message: String },
}

impl ShopError {
    /// Stable kind of this error.
    pub fn kind(&self) -> ShopErrorType {
        match self {
            Self::ItemNotFound { .. } => ShopErrorType::ItemNotFound,
            Self::InvalidItemCount { .. } => ShopErrorType::InvalidItemCount,
            Self::EmptyCart => ShopErrorType::EmptyCart,
            Self::ItemNotInCart { .. } => ShopErrorType::ItemNotInCart,
            Self::MissingWallet => ShopErrorType::MissingWallet,
            Self::MissingPaymentAddress => ShopErrorType::MissingPaymentAddress,
            Self::CartAlreadyLinked { .. } => ShopErrorType::CartAlreadyLinked,
            Self::CartNotFound { .. } => ShopErrorType::CartNotFound,
            Self::TransactionNotConfirmed { .. } => ShopErrorType::TransactionNotConfirmed,
            Self::TransactionAlreadyUsed { .. } => ShopErrorType::TransactionAlreadyUsed,
            Self::InsufficientBalance { .. } => ShopErrorType::InsufficientBalance,
            Self::InvalidPaymentAddress { .. } => ShopErrorType::InvalidPaymentAddress,
            Self::CartAlreadyPaid { .. } => ShopErrorType::CartAlreadyPaid,
            Self::UnsupportedPaymentMethod { .. } => ShopErrorType::UnsupportedPaymentMethod,
            Self::TransactionRejected { .. } => ShopErrorType::TransactionRejected,
            Self::WalletNotFound { .. } => ShopErrorType::WalletNotFound,
            Self::InvalidLinkRequest { .. } => ShopErrorType::InvalidLinkRequest,
            Self::VerificationDataMissing { .. } => ShopErrorType::VerificationDataMissing,
            Self::InvalidSignature { .. } => ShopErrorType::InvalidSignature,
            Self::InvalidPassword { .. } => ShopErrorType::InvalidPassword,
            Self::CollaboratorUnavailable { .. } => ShopErrorType::CollaboratorUnavailable,
            Self::CreditNotPersisted { .. } => ShopErrorType::CreditNotPersisted,
            Self::Decode { .. } => ShopErrorType::Decode,
        }
    }

    /// Wrap a persistence failure.
    pub fn storage(err: impl fmt::Display) -> Self {
        Self::CollaboratorUnavailable {
            collaborator: Collaborator::Storage,
            message: err.to_string(),
        }
    }

    pub(crate) fn decode(collection: &str, err: impl fmt::Display) -> Self {
        Self::Decode {
            collection: collection.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<LedgerError> for ShopError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::WalletNotFound { wallet_id } => Self::WalletNotFound { wallet_id },
            LedgerError::Rejected { reason } => Self::TransactionRejected { reason },
            other => Self::CollaboratorUnavailable {
                collaborator: Collaborator::Ledger,
                message: other.to_string(),
            },
        }
    }
}

/// Error type enumeration for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShopErrorType {
    ItemNotFound,
    InvalidItemCount,
    EmptyCart,
    ItemNotInCart,
    MissingWallet,
    MissingPaymentAddress,
    CartAlreadyLinked,
    CartNotFound,
    TransactionNotConfirmed,
    TransactionAlreadyUsed,
    InsufficientBalance,
    InvalidPaymentAddress,
    CartAlreadyPaid,
    UnsupportedPaymentMethod,
    TransactionRejected,
    WalletNotFound,
    InvalidLinkRequest,
    VerificationDataMissing,
    InvalidSignature,
    InvalidPassword,
    CollaboratorUnavailable,
    CreditNotPersisted,
    Decode,
}

/// Serializable shop error for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopErrorPayload {
    pub error_type: ShopErrorType,
    pub message: String,
    pub item_id: Option<ItemId>,
    pub cart_id: Option<CartId>,
    pub wallet_id: Option<WalletId>,
    pub transaction_id: Option<TransactionId>,
}

impl From<&ShopError> for ShopErrorPayload {
    fn from(err: &ShopError) -> Self {
        let mut payload = Self {
            error_type: err.kind(),
            message: err.to_string(),
            item_id: None,
            cart_id: None,
            wallet_id: None,
            transaction_id: None,
        };
        match err {
            ShopError::ItemNotFound { item_id }
            | ShopError::InvalidItemCount { item_id, .. }
            | ShopError::ItemNotInCart { item_id } => payload.item_id = Some(item_id.clone()),
            ShopError::CartNotFound { cart_id } | ShopError::CartAlreadyPaid { cart_id } => {
                payload.cart_id = Some(cart_id.clone())
            }
            ShopError::TransactionNotConfirmed { transaction_id }
            | ShopError::TransactionAlreadyUsed { transaction_id } => {
                payload.transaction_id = Some(transaction_id.clone())
            }
            ShopError::CreditNotPersisted {
                cart_id,
                transaction_id,
                ..
            } => {
                payload.cart_id = Some(cart_id.clone());
                payload.transaction_id = Some(transaction_id.clone());
            }
            ShopError::CartAlreadyLinked { wallet_id }
            | ShopError::InvalidPaymentAddress { wallet_id, .. }
            | ShopError::UnsupportedPaymentMethod { wallet_id, .. }
            | ShopError::WalletNotFound { wallet_id }
            | ShopError::VerificationDataMissing { wallet_id }
            | ShopError::InvalidSignature { wallet_id, .. }
            | ShopError::InvalidPassword { wallet_id } => {
                payload.wallet_id = Some(wallet_id.clone())
            }
            _ => {}
        }
        payload
    }
}

impl From<ShopError> for ShopErrorPayload {
    fn from(err: ShopError) -> Self {
        Self::from(&err)
    }
}
