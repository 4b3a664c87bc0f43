//! # Shop Configuration
//!
//! Runtime configuration loaded from the environment.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `POS_DATA_DIR` | `./data` | Root of all shop data |
//! | `POS_SHOP_NAME` | `1` | Shop instance; data lives in `<data_dir>/<shop_name>/` |
//! | `POS_RECEIVING_ADDRESS` | unset | Address the shop is paid on (64 hex chars) |
//! | `POS_FEE_PER_TRANSACTION` | `1` | Fee reserved on the payer's balance at checkout |
//! | `POS_LOG` | `info` | Tracing filter |

use pos_01_checkout::CheckoutConfig;
use shared_types::{Address, AddressError, Amount};
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopConfig {
    pub data_dir: PathBuf,
    pub shop_name: String,
    /// Raw receiving address, checked by `validate()`.
    pub receiving_address: Option<String>,
    pub fee_per_transaction: Amount,
    pub log_filter: String,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            shop_name: "1".to_string(),
            receiving_address: None,
            fee_per_transaction: 1,
            log_filter: "info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("POS_RECEIVING_ADDRESS is not set")]
    MissingReceivingAddress,

    #[error("POS_RECEIVING_ADDRESS is invalid: {0}")]
    InvalidReceivingAddress(#[from] AddressError),

    #[error("Shop name {0:?} must be a single path component")]
    InvalidShopName(String),
}

impl ShopConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup, starting from defaults.
    ///
    /// Unparseable numbers are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup("POS_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(name) = lookup("POS_SHOP_NAME") {
            config.shop_name = name;
        }
        config.receiving_address = lookup("POS_RECEIVING_ADDRESS");
        if let Some(fee) = lookup("POS_FEE_PER_TRANSACTION") {
            match fee.trim().parse() {
                Ok(fee) => config.fee_per_transaction = fee,
                Err(_) => warn!("POS_FEE_PER_TRANSACTION must be a non-negative integer, got {:?}", fee),
            }
        }
        if let Some(filter) = lookup("POS_LOG") {
            config.log_filter = filter;
        }

        config
    }

    /// Directory holding this shop's collections.
    pub fn shop_dir(&self) -> PathBuf {
        self.data_dir.join(&self.shop_name)
    }

    fn check_shop_name(&self) -> Result<(), ConfigError> {
        let name = self.shop_name.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(ConfigError::InvalidShopName(self.shop_name.clone()));
        }
        Ok(())
    }

    /// Validate for running a shop and derive the core's configuration.
    pub fn validate(&self) -> Result<CheckoutConfig, ConfigError> {
        self.check_shop_name()?;
        let raw = self
            .receiving_address
            .as_deref()
            .ok_or(ConfigError::MissingReceivingAddress)?;
        let address = Address::parse(raw)?;
        Ok(CheckoutConfig::new(address).with_fee(self.fee_per_transaction))
    }

    /// Validate only what the admin CLI needs (no receiving address).
    pub fn validate_for_admin(&self) -> Result<(), ConfigError> {
        self.check_shop_name()
    }
}
