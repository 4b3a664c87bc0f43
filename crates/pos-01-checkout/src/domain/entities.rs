//! Core domain entities for the checkout subsystem.
//!
//! ## Cart lifecycle
//!
//! ```text
//! CartBuilder ──build──→ [UNCONFIRMED] ──credit (Σ ≥ total)──→ [CONFIRMED]
//!                              │  ↑
//!                              └──┘ credit (partial)
//! ```
//!
//! INVARIANT-1: `confirmed == (actual_receive >= total_price)`
//! INVARIANT-2: `actual_receive` never decreases
//! INVARIANT-3: `joined_transaction_ids` only grows and holds no duplicates

use super::value_objects::{CartId, ItemId};
use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, TransactionId, WalletId};

/// Default collection holding the catalog.
pub const CATALOG_COLLECTION: &str = "item";

/// Default collection holding the cart history.
pub const HISTORY_COLLECTION: &str = "cart_history";

/// A catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Price in the smallest currency unit.
    pub price: Amount,
}

/// An item and how many of it the customer wants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CartLine {
    pub item: Item,
    pub count: u64,
}

impl CartLine {
    /// `price × count`, `None` on overflow.
    pub fn subtotal(&self) -> Option<Amount> {
        self.item.price.checked_mul(self.count)
    }
}

/// Σ(price × count) over `lines`, `None` on overflow.
pub(crate) fn checked_total(lines: &[CartLine]) -> Option<Amount> {
    lines
        .iter()
        .try_fold(0u64, |total, line| total.checked_add(line.subtotal()?))
}

/// A checked-out sale and its payment progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Cart {
    pub id: CartId,
    /// Wallet that built the cart.
    pub wallet_id: WalletId,
    pub total_price: Amount,
    pub actual_receive: Amount,
    /// The single address the customer pays from.
    pub payment_address: Address,
    pub confirmed: bool,
    pub lines: Vec<CartLine>,
    pub joined_transaction_ids: Vec<TransactionId>,
}

impl Cart {
    /// Amount still owed, never negative.
    pub fn outstanding(&self) -> Amount {
        self.total_price.saturating_sub(self.actual_receive)
    }

    /// Amount received beyond the total.
    pub fn overpaid(&self) -> Amount {
        self.actual_receive.saturating_sub(self.total_price)
    }

    /// Returns true once nothing is owed on the cart.
    pub fn is_already_paid(&self) -> bool {
        self.confirmed || self.outstanding() == 0
    }

    /// Returns true if `transaction_id` was credited to this cart.
    pub fn has_transaction(&self, transaction_id: &TransactionId) -> bool {
        self.joined_transaction_ids.contains(transaction_id)
    }

    /// Credit `amount` received through `transaction_id`.
    ///
    /// Returns true if this credit settled the cart.
    pub fn credit(&mut self, transaction_id: TransactionId, amount: Amount) -> bool {
        let was_confirmed = self.confirmed;
        self.actual_receive = self.actual_receive.saturating_add(amount);
        if !self.has_transaction(&transaction_id) {
            self.joined_transaction_ids.push(transaction_id);
        }
        self.confirmed = self.actual_receive >= self.total_price;
        self.confirmed && !was_confirmed
    }

    /// Check record-level invariants after decoding.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.lines.is_empty() {
            return Err(format!("cart {} has no lines", self.id));
        }
        if let Some(line) = self.lines.iter().find(|line| line.count == 0) {
            return Err(format!("cart {} has zero count for item {}", self.id, line.item.id));
        }
        match checked_total(&self.lines) {
            Some(total) if total == self.total_price => {}
            Some(total) => {
                return Err(format!(
                    "cart {} total {} does not match lines ({})",
                    self.id, self.total_price, total
                ))
            }
            None => return Err(format!("cart {} total overflows", self.id)),
        }
        if self.confirmed != (self.actual_receive >= self.total_price) {
            return Err(format!(
                "cart {} confirmed flag disagrees with received amount",
                self.id
            ));
        }
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = self
            .joined_transaction_ids
            .iter()
            .find(|id| !seen.insert(*id))
        {
            return Err(format!("cart {} joins transaction {} twice", self.id, dup));
        }
        Ok(())
    }
}

/// Checkout configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// Address the shop receives payments on.
    pub receiving_address: Address,
    /// Fee the ledger charges per transaction, reserved at checkout.
    pub fee_per_transaction: Amount,
    /// Record collection holding the catalog.
    pub catalog_collection: String,
    /// Record collection holding the cart history.
    pub history_collection: String,
}

impl CheckoutConfig {
    /// Creates a config with default fee and collections.
    pub fn new(receiving_address: Address) -> Self {
        Self {
            receiving_address,
            fee_per_transaction: 1,
            catalog_collection: CATALOG_COLLECTION.to_string(),
            history_collection: HISTORY_COLLECTION.to_string(),
        }
    }

    pub fn with_fee(mut self, fee_per_transaction: Amount) -> Self {
        self.fee_per_transaction = fee_per_transaction;
        self
    }
}
