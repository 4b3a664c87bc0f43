//! # Shop Service
//!
//! Application service implementing the `ShopApi` trait.
//!
//! ## Architecture
//!
//! - Implements the inbound port (`ShopApi`)
//! - Talks to the ledger only through `LedgerGateway`
//! - Persists the cart history through `RecordStore` (full overwrite)
//!
//! ## Locking
//!
//! | State | Lock | Held across awaits |
//! |-------|------|--------------------|
//! | cart builder | `tokio::sync::Mutex` | yes |
//! | cart history | `parking_lot::RwLock` | no |
//! | reserved transaction ids | `parking_lot::Mutex` | no |
//! | link request + pending wallets | `parking_lot::Mutex` | no |
//!
//! Lock order: builder → reserved → history. The history lock is never held
//! while taking the reservation lock.

use crate::adapters::crypto::Ed25519CryptoProvider;
use crate::domain::{
    decode_catalog, decode_history, encode_history, AddressBalance, AddressLinkRequest, Cart,
    CartBuilder, CartHistory, CartId, CartLine, Catalog, CheckoutConfig, IdentityRegistry, Item,
    ItemId, LinkId, RegisteredWallet, ShopError, VerificationResponse, VerifiedAnonymousWallet,
    Wallet,
};
use crate::ports::inbound::ShopApi;
use crate::ports::outbound::{CryptoProvider, LedgerGateway, RecordStore, SystemTimeSource, TimeSource};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::{Address, Amount, LedgerError, LedgerTransaction, TransactionId, WalletId};
use std::collections::HashSet;
use std::sync::Arc;

/// Point-of-sale checkout service.
///
/// One instance owns one active cart builder, one link request and one
/// pending wallet pool. Share it behind `Arc` across tasks.
pub struct ShopService<L: LedgerGateway, S: RecordStore> {
    config: CheckoutConfig,
    ledger: L,
    store: S,
    crypto: Arc<dyn CryptoProvider>,
    clock: Arc<dyn TimeSource>,
    catalog: Catalog,
    history: RwLock<CartHistory>,
    reserved: Mutex<HashSet<TransactionId>>,
    builder: tokio::sync::Mutex<CartBuilder>,
    identity: Mutex<IdentityRegistry>,
}

/// Claim on a transaction id while it is being credited.
///
/// Released on drop, whatever the outcome.
struct Reservation<'a> {
    reserved: &'a Mutex<HashSet<TransactionId>>,
    transaction_id: TransactionId,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.reserved.lock().remove(&self.transaction_id);
    }
}

impl<L: LedgerGateway, S: RecordStore> ShopService<L, S> {
    /// Load catalog and history from `store` and build the service.
    ///
    /// # Errors
    /// - `CollaboratorUnavailable` if the store cannot be read
    /// - `Decode` if a record is malformed
    pub fn new(config: CheckoutConfig, ledger: L, store: S) -> Result<Self, ShopError> {
        let records = store
            .read_all(&config.catalog_collection)
            .map_err(ShopError::storage)?;
        let catalog = decode_catalog(&config.catalog_collection, records)?;

        let records = store
            .read_all(&config.history_collection)
            .map_err(ShopError::storage)?;
        let history = decode_history(&config.history_collection, records)?;

        tracing::info!(
            "[pos-01] 🏪 Shop ready: {} items, {} carts ({} unsettled), receiving on {}",
            catalog.len(),
            history.len(),
            history.unsettled().count(),
            config.receiving_address
        );

        Ok(Self {
            config,
            ledger,
            store,
            crypto: Arc::new(Ed25519CryptoProvider),
            clock: Arc::new(SystemTimeSource),
            catalog,
            history: RwLock::new(history),
            reserved: Mutex::new(HashSet::new()),
            builder: tokio::sync::Mutex::new(CartBuilder::new()),
            identity: Mutex::new(IdentityRegistry::new()),
        })
    }

    pub fn with_crypto(mut self, crypto: Arc<dyn CryptoProvider>) -> Self {
        self.crypto = crypto;
        self
    }

    pub fn with_time_source(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Snapshot of every cart ever checked out.
    pub fn history(&self) -> Vec<Cart> {
        self.history.read().all().to_vec()
    }

    /// Carts that still owe money.
    pub fn unsettled_carts(&self) -> Vec<Cart> {
        self.history.read().unsettled().cloned().collect()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn resolve_addresses(&self, wallet: &Wallet) -> Result<Vec<Address>, ShopError> {
        match wallet.known_addresses() {
            Some(addresses) => Ok(addresses.to_vec()),
            None => Ok(self.ledger.wallet_addresses(wallet.id()).await?),
        }
    }

    /// Balance of `address`, zero when the ledger has never seen it.
    async fn balance_of(&self, address: &Address) -> Result<(Amount, Option<String>), ShopError> {
        match self.ledger.address_balance(address).await {
            Ok(balance) => Ok((balance, None)),
            Err(e @ LedgerError::AddressHasNoHistory { .. }) => Ok((0, Some(e.to_string()))),
            Err(e) => Err(e.into()),
        }
    }

    /// Reserve `transaction_id` against history and in-flight credits.
    fn reserve(&self, transaction_id: &TransactionId) -> Result<Reservation<'_>, ShopError> {
        let mut reserved = self.reserved.lock();
        if reserved.contains(transaction_id)
            || self.history.read().contains_transaction(transaction_id)
        {
            return Err(ShopError::TransactionAlreadyUsed {
                transaction_id: transaction_id.clone(),
            });
        }
        reserved.insert(transaction_id.clone());
        Ok(Reservation {
            reserved: &self.reserved,
            transaction_id: transaction_id.clone(),
        })
    }

    fn persist_history(&self, history: &CartHistory) -> Result<(), ShopError> {
        let collection = &self.config.history_collection;
        let records = encode_history(collection, history)?;
        self.store
            .write_all(collection, records)
            .map_err(ShopError::storage)
    }

    fn append_cart(&self, cart: Cart) -> Result<(), ShopError> {
        let mut history = self.history.write();
        history.push(cart);
        if let Err(e) = self.persist_history(&history) {
            history.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Credit `amount` to a cart and persist, all under the history write lock.
    ///
    /// Returns the updated cart and whether this credit settled it. On a
    /// persistence failure the in-memory history is restored.
    fn credit_cart(
        &self,
        cart_id: &CartId,
        transaction_id: TransactionId,
        amount: Amount,
    ) -> Result<(Cart, bool), ShopError> {
        let mut history = self.history.write();
        let mut cart = history.get(cart_id)?.clone();
        let settled = cart.credit(transaction_id, amount);

        let previous = history.replace(cart.clone())?;
        if let Err(e) = self.persist_history(&history) {
            let _ = history.replace(previous);
            return Err(e);
        }
        Ok((cart, settled))
    }

    /// Credit a payment the ledger has already accepted.
    ///
    /// Unlike `credit_cart` the credit is never rolled back: a failed history
    /// write keeps it in memory and reports `CreditNotPersisted`.
    fn commit_payment(
        &self,
        cart_id: &CartId,
        transaction_id: TransactionId,
        amount: Amount,
    ) -> Result<Cart, ShopError> {
        let mut history = self.history.write();
        let mut cart = history.get(cart_id)?.clone();
        cart.credit(transaction_id.clone(), amount);
        history.replace(cart.clone())?;

        if let Err(e) = self.persist_history(&history) {
            tracing::error!(
                "[pos-01] ❌ Cart {} paid by {} but history not saved: {}",
                cart_id,
                transaction_id,
                e
            );
            return Err(ShopError::CreditNotPersisted {
                cart_id: cart_id.clone(),
                transaction_id,
                message: e.to_string(),
            });
        }
        Ok(cart)
    }
}

#[async_trait]
impl<L: LedgerGateway, S: RecordStore> ShopApi for ShopService<L, S> {
    async fn add_item(&self, item_id: &ItemId, count: u64) -> Result<Item, ShopError> {
        let item = self.catalog.get(item_id)?.clone();
        self.builder.lock().await.add_item(&item, count)?;
        tracing::debug!("[pos-01] Added {} × {}", count, item.id);
        Ok(item)
    }

    async fn remove_item(&self, item_id: &ItemId) -> Result<Item, ShopError> {
        let item = self.catalog.get(item_id)?.clone();
        self.builder.lock().await.remove_item(item_id)?;
        tracing::debug!("[pos-01] Removed {}", item.id);
        Ok(item)
    }

    async fn link_managed_wallet(
        &self,
        wallet_id: &WalletId,
        password_hash: &str,
    ) -> Result<(), ShopError> {
        let mut builder = self.builder.lock().await;
        if !self
            .ledger
            .check_wallet_password(wallet_id, password_hash)
            .await?
        {
            tracing::warn!("[pos-01] Wrong password for wallet {}", wallet_id);
            return Err(ShopError::InvalidPassword {
                wallet_id: wallet_id.clone(),
            });
        }
        builder.bind_wallet(Wallet::managed(wallet_id.clone()))?;
        tracing::info!("[pos-01] 🔗 Linked managed wallet {}", wallet_id);
        Ok(())
    }

    async fn link_anonymous_wallet(&self, wallet: VerifiedAnonymousWallet) -> Result<(), ShopError> {
        let wallet_id = wallet.id().clone();
        self.builder
            .lock()
            .await
            .bind_wallet(Wallet::Anonymous(wallet))?;
        tracing::info!("[pos-01] 🔗 Linked anonymous wallet {}", wallet_id);
        Ok(())
    }

    async fn unlink(&self) {
        self.builder.lock().await.unlink();
        tracing::info!("[pos-01] Cart unlinked");
    }

    async fn unlink_payment_address(&self) {
        self.builder.lock().await.clear_payment_address();
    }

    async fn checkout(&self, address: &Address) -> Result<Cart, ShopError> {
        let mut builder = self.builder.lock().await;
        let wallet = builder.wallet().cloned().ok_or(ShopError::MissingWallet)?;

        let addresses = self.resolve_addresses(&wallet).await?;
        if !addresses.contains(address) {
            return Err(ShopError::InvalidPaymentAddress {
                address: address.clone(),
                wallet_id: wallet.id().clone(),
            });
        }

        let total = builder.total()?;
        let required = total.saturating_add(self.config.fee_per_transaction);
        let (available, _) = self.balance_of(address).await?;
        if available < required {
            return Err(ShopError::InsufficientBalance {
                address: address.clone(),
                required,
                available,
            });
        }

        builder.bind_payment_address(address.clone());
        let cart = builder.build(CartId::new(self.crypto.random_id()))?;
        if let Err(e) = self.append_cart(cart.clone()) {
            builder.clear_payment_address();
            return Err(e);
        }

        tracing::info!(
            "[pos-01] 🛒 Checked out cart {} for {} (total {}, payer {})",
            cart.id,
            cart.wallet_id,
            cart.total_price,
            cart.payment_address
        );
        Ok(cart)
    }

    async fn pay_with_managed_wallet(
        &self,
        cart_id: &CartId,
    ) -> Result<LedgerTransaction, ShopError> {
        let mut builder = self.builder.lock().await;
        let cart = self.cart(cart_id)?;

        let wallet_id = match builder.wallet() {
            Some(Wallet::Managed { id }) if id == &cart.wallet_id => id.clone(),
            Some(wallet) => {
                return Err(ShopError::UnsupportedPaymentMethod {
                    wallet_id: wallet.id().clone(),
                    kind: wallet.kind(),
                })
            }
            None => return Err(ShopError::MissingWallet),
        };
        if cart.is_already_paid() {
            return Err(ShopError::CartAlreadyPaid {
                cart_id: cart_id.clone(),
            });
        }

        let amount = cart.outstanding();
        let transaction = self
            .ledger
            .create_transaction(
                &wallet_id,
                &cart.payment_address,
                &self.config.receiving_address,
                amount,
                &cart.payment_address,
            )
            .await?;

        let transaction_id = transaction.id.clone();
        let reservation = self.reserve(&transaction_id)?;
        let accepted = self.ledger.submit_transaction(transaction).await?;
        let committed = self.commit_payment(cart_id, transaction_id, amount);
        drop(reservation);

        builder.clear_lines();
        let cart = committed?;
        tracing::info!(
            "[pos-01] ✅ Cart {} paid by {} with transaction {}",
            cart.id,
            wallet_id,
            accepted.id
        );
        Ok(accepted)
    }

    async fn reconcile(
        &self,
        transaction_id: &TransactionId,
        cart_id: &CartId,
    ) -> Result<Cart, ShopError> {
        self.history.read().get(cart_id).map(|_| ())?;

        let transaction = self
            .ledger
            .transaction_in_block(transaction_id)
            .await?
            .filter(LedgerTransaction::is_regular)
            .ok_or_else(|| ShopError::TransactionNotConfirmed {
                transaction_id: transaction_id.clone(),
            })?;

        let reservation = self.reserve(transaction_id)?;
        let credited = transaction.amount_to(&self.config.receiving_address);
        if credited == 0 {
            tracing::warn!(
                "[pos-01] ⚠️ Transaction {} pays nothing to the shop; consuming it for cart {}",
                transaction_id,
                cart_id
            );
        }
        let (cart, settled) = self.credit_cart(cart_id, transaction_id.clone(), credited)?;
        drop(reservation);

        if settled {
            self.builder.lock().await.clear_lines();
            tracing::info!(
                "[pos-01] ✅ Cart {} settled (received {} of {})",
                cart.id,
                cart.actual_receive,
                cart.total_price
            );
        } else {
            tracing::info!(
                "[pos-01] Cart {} credited {} via {}, outstanding {}",
                cart.id,
                credited,
                transaction_id,
                cart.outstanding()
            );
        }
        Ok(cart)
    }

    async fn find_unsettled_cart_for(&self, wallet: &Wallet) -> Result<Option<Cart>, ShopError> {
        let addresses = self.resolve_addresses(wallet).await?;
        Ok(self.history.read().find_unsettled(&addresses).cloned())
    }

    fn request_link(&self) -> AddressLinkRequest {
        let link_id = LinkId::new(self.crypto.random_id());
        let request = self
            .identity
            .lock()
            .issue_link_request(link_id, self.clock.now());
        tracing::debug!("[pos-01] Issued link request {}", request.link_id);
        request
    }

    fn current_link_request(&self) -> AddressLinkRequest {
        if let Some(request) = self.identity.lock().link_request().cloned() {
            return request;
        }
        self.request_link()
    }

    fn register_addresses(
        &self,
        addresses: &[String],
        link_id: &LinkId,
    ) -> Result<RegisteredWallet, ShopError> {
        let wallet_id = WalletId::new(self.crypto.random_id());
        let crypto = Arc::clone(&self.crypto);

        let mut identity = self.identity.lock();
        let wallet = identity.register(
            link_id,
            addresses,
            wallet_id,
            self.clock.now(),
            || crypto.random_id(),
        )?;
        tracing::info!(
            "[pos-01] 🔐 Anonymous wallet {} pending verification of {} addresses",
            wallet.id(),
            wallet.addresses().len()
        );
        Ok(RegisteredWallet::from_pending(wallet))
    }

    async fn submit_verification(
        &self,
        wallet_id: &WalletId,
        responses: &[VerificationResponse],
    ) -> Result<VerifiedAnonymousWallet, ShopError> {
        let mut builder = self.builder.lock().await;
        let verified = {
            let mut identity = self.identity.lock();
            let wallet = identity.pending_mut(wallet_id)?;
            wallet.record_responses(responses);
            wallet.verify(self.crypto.as_ref())?
        };

        builder.bind_wallet(Wallet::Anonymous(verified.clone()))?;
        self.identity.lock().complete(wallet_id);
        tracing::info!(
            "[pos-01] 🔗 Verified and linked anonymous wallet {}",
            wallet_id
        );
        Ok(verified)
    }

    fn catalog(&self) -> Vec<Item> {
        self.catalog.all().to_vec()
    }

    fn item(&self, item_id: &ItemId) -> Result<Item, ShopError> {
        self.catalog.get(item_id).cloned()
    }

    fn cart(&self, cart_id: &CartId) -> Result<Cart, ShopError> {
        self.history.read().get(cart_id).cloned()
    }

    fn shop_address(&self) -> Address {
        self.config.receiving_address.clone()
    }

    fn pending_wallet(&self, wallet_id: &WalletId) -> Option<RegisteredWallet> {
        self.identity
            .lock()
            .pending(wallet_id)
            .map(RegisteredWallet::from_pending)
    }

    async fn current_wallet(&self) -> Option<Wallet> {
        self.builder.lock().await.wallet().cloned()
    }

    async fn current_lines(&self) -> Vec<CartLine> {
        self.builder.lock().await.lines().to_vec()
    }

    async fn current_payment_address(&self) -> Option<Address> {
        self.builder.lock().await.payment_address().cloned()
    }

    async fn wallet_address_info(&self) -> Result<Vec<AddressBalance>, ShopError> {
        let wallet = self.current_wallet().await.ok_or(ShopError::MissingWallet)?;
        let addresses = self.resolve_addresses(&wallet).await?;

        let mut info = Vec::with_capacity(addresses.len());
        for address in addresses {
            let (balance, status) = self.balance_of(&address).await?;
            info.push(AddressBalance {
                address,
                balance,
                status,
            });
        }
        Ok(info)
    }
}
