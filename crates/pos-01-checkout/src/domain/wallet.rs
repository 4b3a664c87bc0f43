//! Payer wallets.
//!
//! A cart is paid either from a managed wallet (keys custodied by the ledger
//! operator, unlocked by password) or from an anonymous wallet whose addresses
//! were proven through the challenge/response protocol.

use super::identity::VerifiedAnonymousWallet;
use serde::{Deserialize, Serialize};
use shared_types::{Address, WalletId};
use std::fmt;

/// Wallet type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    Managed,
    Anonymous,
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Managed => f.write_str("managed"),
            Self::Anonymous => f.write_str("anonymous"),
        }
    }
}

/// A wallet bound to the cart builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wallet {
    /// Custodied by the ledger operator; addresses are looked up there.
    Managed { id: WalletId },
    /// Proven out-of-band; carries its own address set.
    Anonymous(VerifiedAnonymousWallet),
}

impl Wallet {
    pub fn managed(id: WalletId) -> Self {
        Self::Managed { id }
    }

    pub fn id(&self) -> &WalletId {
        match self {
            Self::Managed { id } => id,
            Self::Anonymous(wallet) => wallet.id(),
        }
    }

    pub fn kind(&self) -> WalletKind {
        match self {
            Self::Managed { .. } => WalletKind::Managed,
            Self::Anonymous(_) => WalletKind::Anonymous,
        }
    }

    /// Addresses known without asking the ledger.
    ///
    /// `None` for managed wallets.
    pub fn known_addresses(&self) -> Option<&[Address]> {
        match self {
            Self::Managed { .. } => None,
            Self::Anonymous(wallet) => Some(wallet.addresses()),
        }
    }
}
