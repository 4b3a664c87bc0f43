//! # Cart Builder
//!
//! Mutable staging area behind the customer's current cart: at most one
//! wallet, at most one payment address, and an ordered list of lines.
//!
//! ## Invariants
//!
//! - At most one wallet is bound; binding a different one requires `unlink()`
//! - Every line has a positive count and a unique item id
//! - `build()` never clears the staging area, so a failed checkout can retry

use super::entities::{checked_total, Cart, CartLine, Item};
use super::errors::ShopError;
use super::value_objects::{CartId, ItemId};
use super::wallet::Wallet;
use shared_types::{Address, Amount};

/// The customer's cart before checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartBuilder {
    wallet: Option<Wallet>,
    payment_address: Option<Address>,
    lines: Vec<CartLine>,
}

impl CartBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wallet(&self) -> Option<&Wallet> {
        self.wallet.as_ref()
    }

    pub fn payment_address(&self) -> Option<&Address> {
        self.payment_address.as_ref()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Bind the payer wallet.
    ///
    /// # Errors
    /// - `CartAlreadyLinked` if a payment address is bound or another wallet
    ///   is bound. Rebinding the same wallet id replaces it in place.
    pub fn bind_wallet(&mut self, wallet: Wallet) -> Result<(), ShopError> {
        if let Some(current) = &self.wallet {
            if self.payment_address.is_some() || current.id() != wallet.id() {
                return Err(ShopError::CartAlreadyLinked {
                    wallet_id: current.id().clone(),
                });
            }
        } else if self.payment_address.is_some() {
            return Err(ShopError::CartAlreadyLinked {
                wallet_id: wallet.id().clone(),
            });
        }
        self.wallet = Some(wallet);
        Ok(())
    }

    /// Add `count` of `item`, merging with an existing line.
    ///
    /// # Errors
    /// - `InvalidItemCount` if `count` is zero or the cart total would overflow
    pub fn add_item(&mut self, item: &Item, count: u64) -> Result<(), ShopError> {
        let invalid = || ShopError::InvalidItemCount {
            item_id: item.id.clone(),
            count,
        };
        if count == 0 {
            return Err(invalid());
        }

        let mut lines = self.lines.clone();
        match lines.iter_mut().find(|line| line.item.id == item.id) {
            Some(line) => line.count = line.count.checked_add(count).ok_or_else(invalid)?,
            None => lines.push(CartLine {
                item: item.clone(),
                count,
            }),
        }
        checked_total(&lines).ok_or_else(invalid)?;

        self.lines = lines;
        Ok(())
    }

    /// Remove the whole line for `item_id`.
    ///
    /// # Errors
    /// - `ItemNotInCart` if no line holds the item; the builder is unchanged
    pub fn remove_item(&mut self, item_id: &ItemId) -> Result<CartLine, ShopError> {
        let position = self
            .lines
            .iter()
            .position(|line| &line.item.id == item_id)
            .ok_or_else(|| ShopError::ItemNotInCart {
                item_id: item_id.clone(),
            })?;
        Ok(self.lines.remove(position))
    }

    /// Record the address the customer will pay from. Ownership is checked by
    /// the caller.
    pub fn bind_payment_address(&mut self, address: Address) {
        self.payment_address = Some(address);
    }

    pub fn clear_payment_address(&mut self) {
        self.payment_address = None;
    }

    /// Σ(price × count) over the current lines.
    ///
    /// # Errors
    /// - `EmptyCart` if there are no lines
    pub fn total(&self) -> Result<Amount, ShopError> {
        if self.lines.is_empty() {
            return Err(ShopError::EmptyCart);
        }
        // add_item refuses lines whose total would overflow.
        Ok(checked_total(&self.lines).unwrap_or(Amount::MAX))
    }

    /// Freeze the staging area into a cart with id `cart_id`.
    ///
    /// # Errors
    /// - `MissingPaymentAddress`, `EmptyCart`, `MissingWallet`, checked in
    ///   that order
    pub fn build(&self, cart_id: CartId) -> Result<Cart, ShopError> {
        let payment_address = self
            .payment_address
            .clone()
            .ok_or(ShopError::MissingPaymentAddress)?;
        let total_price = self.total()?;
        let wallet = self.wallet.as_ref().ok_or(ShopError::MissingWallet)?;

        Ok(Cart {
            id: cart_id,
            wallet_id: wallet.id().clone(),
            total_price,
            actual_receive: 0,
            payment_address,
            // Only a free cart is settled at birth.
            confirmed: total_price == 0,
            lines: self.lines.clone(),
            joined_transaction_ids: Vec::new(),
        })
    }

    /// Drop the lines once their sale is complete.
    pub fn clear_lines(&mut self) {
        self.lines.clear();
    }

    /// Discard wallet, address and lines.
    pub fn unlink(&mut self) {
        *self = Self::new();
    }
}
