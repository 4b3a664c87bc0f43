//! # Shop Runtime
//!
//! Wires a `ShopService` to the file-backed record store of one shop instance.
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration (receiving address, shop name)
//! 2. Lock `<data_dir>/<shop_name>/`
//! 3. Load catalog and history from the JSON collections
//! 4. Hand out the shared service

use crate::config::ShopConfig;
use crate::lock::DataDirLock;
use anyhow::{Context, Result};
use pos_01_checkout::{JsonFileRecordStore, LedgerGateway, ShopService};
use std::sync::Arc;
use tracing::info;

/// Shop service backed by JSON collections in the shop directory.
pub type FileBackedShop<L> = ShopService<L, JsonFileRecordStore>;

/// A running shop instance. The data directory stays locked while it lives.
pub struct ShopRuntime<L: LedgerGateway> {
    // Declared before the lock so the service is dropped first.
    service: Arc<FileBackedShop<L>>,
    lock: DataDirLock,
}

impl<L: LedgerGateway> ShopRuntime<L> {
    pub fn open(config: &ShopConfig, ledger: L) -> Result<Self> {
        let checkout = config
            .validate()
            .context("invalid shop configuration")?;

        let shop_dir = config.shop_dir();
        let lock = DataDirLock::acquire(&shop_dir)
            .with_context(|| format!("cannot lock shop directory {}", shop_dir.display()))?;

        let store = JsonFileRecordStore::new(&shop_dir);
        let service = ShopService::new(checkout, ledger, store)
            .with_context(|| format!("failed to load shop data from {}", shop_dir.display()))?;

        info!(
            "[pos-runtime] Shop {} running from {} (pid {})",
            config.shop_name,
            shop_dir.display(),
            lock.pid()
        );
        Ok(Self {
            service: Arc::new(service),
            lock,
        })
    }

    pub fn service(&self) -> Arc<FileBackedShop<L>> {
        Arc::clone(&self.service)
    }

    pub fn lock_path(&self) -> &std::path::Path {
        self.lock.path()
    }
}
