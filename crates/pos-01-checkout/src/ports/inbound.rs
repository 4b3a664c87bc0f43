//! # Inbound Port - ShopApi
//!
//! Primary driving port consumed by the presentation layer.
//!
//! ## Flow
//!
//! | Step | Method |
//! |------|--------|
//! | Fill the cart | `add_item`, `remove_item` |
//! | Identify the payer | `link_managed_wallet`, or `request_link` → `register_addresses` → `submit_verification` |
//! | Freeze the sale | `checkout` |
//! | Pay | `pay_with_managed_wallet`, or an external transfer followed by `reconcile` |

use crate::domain::{
    AddressBalance, AddressLinkRequest, Cart, CartId, CartLine, Item, ItemId, LinkId,
    RegisteredWallet, ShopError, VerificationResponse, VerifiedAnonymousWallet, Wallet,
};
use async_trait::async_trait;
use shared_types::{Address, LedgerTransaction, TransactionId, WalletId};

/// Primary API of the checkout subsystem.
#[async_trait]
pub trait ShopApi: Send + Sync {
    // -------------------------------------------------------------------------
    // Cart builder
    // -------------------------------------------------------------------------

    /// Add `count` of a catalog item to the active cart.
    ///
    /// # Errors
    /// - `ItemNotFound`, `InvalidItemCount`
    async fn add_item(&self, item_id: &ItemId, count: u64) -> Result<Item, ShopError>;

    /// Remove an item's whole line from the active cart.
    ///
    /// # Errors
    /// - `ItemNotFound`, `ItemNotInCart`
    async fn remove_item(&self, item_id: &ItemId) -> Result<Item, ShopError>;

    /// Bind a managed wallet after the ledger accepts its password.
    ///
    /// # Errors
    /// - `InvalidPassword`, `WalletNotFound`, `CartAlreadyLinked`
    async fn link_managed_wallet(
        &self,
        wallet_id: &WalletId,
        password_hash: &str,
    ) -> Result<(), ShopError>;

    /// Bind an anonymous wallet that already passed verification.
    async fn link_anonymous_wallet(&self, wallet: VerifiedAnonymousWallet) -> Result<(), ShopError>;

    /// Reset the active cart.
    async fn unlink(&self);

    /// Forget the payment address, keeping wallet and lines.
    async fn unlink_payment_address(&self);

    // -------------------------------------------------------------------------
    // Checkout and payment
    // -------------------------------------------------------------------------

    /// Freeze the active cart into the history, paid from `address`.
    ///
    /// # Errors
    /// - `MissingWallet`, `InvalidPaymentAddress`, `EmptyCart`,
    ///   `InsufficientBalance`, `CollaboratorUnavailable`
    async fn checkout(&self, address: &Address) -> Result<Cart, ShopError>;

    /// Pay a cart in full from the bound managed wallet.
    ///
    /// # Errors
    /// - `CartNotFound`, `CartAlreadyPaid`, `UnsupportedPaymentMethod`,
    ///   `TransactionRejected`, `TransactionAlreadyUsed`
    async fn pay_with_managed_wallet(&self, cart_id: &CartId)
        -> Result<LedgerTransaction, ShopError>;

    /// Credit an included ledger transaction to a cart.
    ///
    /// # Errors
    /// - `CartNotFound`, `TransactionNotConfirmed`, `TransactionAlreadyUsed`
    async fn reconcile(
        &self,
        transaction_id: &TransactionId,
        cart_id: &CartId,
    ) -> Result<Cart, ShopError>;

    /// First cart paid from one of `wallet`'s addresses that still owes money.
    async fn find_unsettled_cart_for(&self, wallet: &Wallet) -> Result<Option<Cart>, ShopError>;

    // -------------------------------------------------------------------------
    // Anonymous identity
    // -------------------------------------------------------------------------

    /// Issue a fresh link request, replacing the outstanding one.
    fn request_link(&self) -> AddressLinkRequest;

    /// The outstanding link request, issuing one if none exists.
    fn current_link_request(&self) -> AddressLinkRequest;

    /// Claim addresses against the outstanding link request.
    ///
    /// # Errors
    /// - `InvalidLinkRequest`
    fn register_addresses(
        &self,
        addresses: &[String],
        link_id: &LinkId,
    ) -> Result<RegisteredWallet, ShopError>;

    /// Prove every claimed address and bind the wallet to the active cart.
    ///
    /// # Errors
    /// - `WalletNotFound`, `VerificationDataMissing`, `InvalidSignature`,
    ///   `CartAlreadyLinked`
    async fn submit_verification(
        &self,
        wallet_id: &WalletId,
        responses: &[VerificationResponse],
    ) -> Result<VerifiedAnonymousWallet, ShopError>;

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    fn catalog(&self) -> Vec<Item>;

    fn item(&self, item_id: &ItemId) -> Result<Item, ShopError>;

    fn cart(&self, cart_id: &CartId) -> Result<Cart, ShopError>;

    fn shop_address(&self) -> Address;

    fn pending_wallet(&self, wallet_id: &WalletId) -> Option<RegisteredWallet>;

    async fn current_wallet(&self) -> Option<Wallet>;

    async fn current_lines(&self) -> Vec<CartLine>;

    async fn current_payment_address(&self) -> Option<Address>;

    /// Balance of each address of the bound wallet.
    ///
    /// # Errors
    /// - `MissingWallet`
    async fn wallet_address_info(&self) -> Result<Vec<AddressBalance>, ShopError>;
}
