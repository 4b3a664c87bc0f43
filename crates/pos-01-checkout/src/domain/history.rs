//! # Cart History
//!
//! Append-growing record of every cart ever checked out. The union of all
//! carts' `joined_transaction_ids` is the domain in which a ledger transaction
//! may be credited at most once.

use super::entities::Cart;
use super::errors::ShopError;
use super::value_objects::CartId;
use serde_json::Value;
use shared_types::{Address, TransactionId};
use std::collections::HashSet;

/// Ordered cart history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartHistory {
    carts: Vec<Cart>,
}

impl CartHistory {
    pub fn new(carts: Vec<Cart>) -> Self {
        Self { carts }
    }

    pub fn get(&self, cart_id: &CartId) -> Result<&Cart, ShopError> {
        self.carts
            .iter()
            .find(|cart| &cart.id == cart_id)
            .ok_or_else(|| ShopError::CartNotFound {
                cart_id: cart_id.clone(),
            })
    }

    pub fn all(&self) -> &[Cart] {
        &self.carts
    }

    pub fn len(&self) -> usize {
        self.carts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.carts.is_empty()
    }

    pub fn push(&mut self, cart: Cart) {
        self.carts.push(cart);
    }

    /// Remove the most recently appended cart.
    pub(crate) fn pop(&mut self) -> Option<Cart> {
        self.carts.pop()
    }

    /// Replace the cart with the same id, returning the previous version.
    pub fn replace(&mut self, cart: Cart) -> Result<Cart, ShopError> {
        let slot = self
            .carts
            .iter_mut()
            .find(|existing| existing.id == cart.id)
            .ok_or_else(|| ShopError::CartNotFound {
                cart_id: cart.id.clone(),
            })?;
        Ok(std::mem::replace(slot, cart))
    }

    /// Returns true if any cart has credited `transaction_id`.
    pub fn contains_transaction(&self, transaction_id: &TransactionId) -> bool {
        self.carts
            .iter()
            .any(|cart| cart.has_transaction(transaction_id))
    }

    /// Every credited transaction id across the history.
    pub fn joined_transaction_ids(&self) -> HashSet<&TransactionId> {
        self.carts
            .iter()
            .flat_map(|cart| cart.joined_transaction_ids.iter())
            .collect()
    }

    /// First cart paid from one of `addresses` that still owes money.
    pub fn find_unsettled(&self, addresses: &[Address]) -> Option<&Cart> {
        self.carts.iter().find(|cart| {
            !cart.confirmed
                && cart.outstanding() > 0
                && addresses.contains(&cart.payment_address)
        })
    }

    /// Every cart that still owes money.
    pub fn unsettled(&self) -> impl Iterator<Item = &Cart> {
        self.carts
            .iter()
            .filter(|cart| !cart.confirmed && cart.outstanding() > 0)
    }
}

/// Decode the history collection.
///
/// Each record must be a well-formed cart and no transaction id may be
/// credited to two carts.
pub fn decode_history(collection: &str, records: Vec<Value>) -> Result<CartHistory, ShopError> {
    let mut carts: Vec<Cart> = Vec::with_capacity(records.len());
    let mut seen_ids = HashSet::new();
    let mut seen_transactions = HashSet::new();

    for record in records {
        let cart: Cart =
            serde_json::from_value(record).map_err(|e| ShopError::decode(collection, e))?;
        cart.validate()
            .map_err(|message| ShopError::decode(collection, message))?;

        if !seen_ids.insert(cart.id.clone()) {
            return Err(ShopError::decode(
                collection,
                format!("duplicate cart id {}", cart.id),
            ));
        }
        for transaction_id in &cart.joined_transaction_ids {
            if !seen_transactions.insert(transaction_id.clone()) {
                return Err(ShopError::decode(
                    collection,
                    format!("transaction {} credited to more than one cart", transaction_id),
                ));
            }
        }
        carts.push(cart);
    }
    Ok(CartHistory::new(carts))
}

/// Encode the history for a full overwrite of its collection.
pub fn encode_history(collection: &str, history: &CartHistory) -> Result<Vec<Value>, ShopError> {
    history
        .all()
        .iter()
        .map(|cart| serde_json::to_value(cart).map_err(|e| ShopError::decode(collection, e)))
        .collect()
}
