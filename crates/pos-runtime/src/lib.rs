//! # Point-of-Sale Runtime
//!
//! Ambient wiring around the checkout subsystem.
//!
//! ## Modules
//!
//! - `config` - `ShopConfig` loaded from `POS_*` environment variables
//! - `logging` - tracing subscriber setup
//! - `lock` - exclusive lock on a shop data directory
//! - `runtime` - `ShopRuntime`: config + lock + file store + `ShopService`
//! - `admin` - offline catalog and history maintenance
//! - `cli` - the `pos-admin` command line

pub mod admin;
pub mod cli;
pub mod config;
pub mod lock;
pub mod logging;
pub mod runtime;

pub use config::{ConfigError, ShopConfig};
pub use lock::{DataDirLock, LockError};
pub use logging::init_tracing;
pub use runtime::{FileBackedShop, ShopRuntime};
