//! # Core Domain Entities
//!
//! Defines the ledger entities the point-of-sale layer reads and produces.
//!
//! ## Clusters
//!
//! - **Identity**: `Address`, `WalletId`
//! - **Chain**: `LedgerTransaction`, `TransactionInput`, `TransactionOutput`

use crate::errors::AddressError;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A 32-byte digest (SHA-256).
pub type Hash = [u8; 32];

/// Amount in the smallest currency unit.
pub type Amount = u64;

/// A ledger address: the hex encoding of a 32-byte Ed25519 public key.
///
/// Addresses are normalized to lowercase so that equality is encoding
/// independent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Hex length of an address.
    pub const HEX_LEN: usize = 64;

    /// Parse and normalize an address.
    pub fn parse(value: &str) -> Result<Self, AddressError> {
        let value = value.trim();
        if value.len() != Self::HEX_LEN {
            return Err(AddressError::InvalidLength(value.len()));
        }
        if !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidEncoding(value.to_string()));
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    /// Build an address from raw public key bytes.
    pub fn from_public_key(public_key: &[u8; 32]) -> Self {
        Self(hex::encode(public_key))
    }

    /// Decode the public key bytes behind this address.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        // Infallible: the constructor guarantees 64 hex chars.
        if let Ok(decoded) = hex::decode(&self.0) {
            bytes.copy_from_slice(&decoded);
        }
        bytes
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a wallet, managed by the ledger operator or anonymous.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(String);

impl WalletId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// CLUSTER B: THE CHAIN
// =============================================================================

/// Identifier of a ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of ledger transaction.
///
/// Only `Regular` transactions move value between customers and the shop;
/// `Fee` and `Reward` are produced by block production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    #[default]
    Regular,
    Fee,
    Reward,
}

/// Reference to an unspent output being consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransactionInput {
    /// Transaction that produced the output.
    pub transaction: TransactionId,
    /// Output index inside that transaction.
    pub index: u32,
    /// Amount carried by the output.
    pub amount: Amount,
    /// Owner of the output.
    pub address: Address,
    /// Owner's signature over the input, absent until signed.
    #[serde(default)]
    pub signature: Option<String>,
}

/// Destination entry of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransactionOutput {
    pub address: Address,
    pub amount: Amount,
}

/// A transaction as reported by the ledger collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerTransaction {
    pub id: TransactionId,
    #[serde(rename = "type", default)]
    pub tx_type: TransactionType,
    #[serde(default)]
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
}

impl LedgerTransaction {
    /// Sum of all outputs paying `address`.
    pub fn amount_to(&self, address: &Address) -> Amount {
        self.outputs
            .iter()
            .filter(|output| &output.address == address)
            .fold(0u64, |total, output| total.saturating_add(output.amount))
    }

    /// Returns true if this transaction can settle a purchase.
    pub fn is_regular(&self) -> bool {
        self.tx_type == TransactionType::Regular
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_public_key(&[byte; 32])
    }

    #[test]
    fn test_address_parse_normalizes_case() {
        let upper = "AB".repeat(32);
        let address = Address::parse(&upper).unwrap();
        assert_eq!(address.as_str(), "ab".repeat(32));
    }

    #[test]
    fn test_address_rejects_bad_input() {
        assert_eq!(Address::parse("abcd"), Err(AddressError::InvalidLength(4)));
        let not_hex = "zz".repeat(32);
        assert!(matches!(
            Address::parse(&not_hex),
            Err(AddressError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_address_public_key_roundtrip() {
        let key = [0x5Au8; 32];
        assert_eq!(Address::from_public_key(&key).public_key_bytes(), key);
    }

    #[test]
    fn test_address_deserialize_validates() {
        let bad: Result<Address, _> = serde_json::from_str("\"not-an-address\"");
        assert!(bad.is_err());

        let good: Address = serde_json::from_str(&format!("\"{}\"", "01".repeat(32))).unwrap();
        assert_eq!(good, addr(0x01));
    }

    #[test]
    fn test_amount_to_sums_matching_outputs() {
        let shop = addr(0xAA);
        let tx = LedgerTransaction {
            id: TransactionId::new("tx-1"),
            tx_type: TransactionType::Regular,
            inputs: vec![],
            outputs: vec![
                TransactionOutput { address: shop.clone(), amount: 100 },
                TransactionOutput { address: addr(0xBB), amount: 40 },
                TransactionOutput { address: shop.clone(), amount: 25 },
            ],
        };
        assert_eq!(tx.amount_to(&shop), 125);
        assert_eq!(tx.amount_to(&addr(0xCC)), 0);
    }

    #[test]
    fn test_transaction_type_wire_format() {
        let json = format!(
            r#"{{"id":"t","type":"reward","outputs":[{{"address":"{}","amount":5}}]}}"#,
            "02".repeat(32)
        );
        let tx: LedgerTransaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx.tx_type, TransactionType::Reward);
        assert!(!tx.is_regular());
    }
}
