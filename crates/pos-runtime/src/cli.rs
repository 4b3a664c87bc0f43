//! Command line of `pos-admin`.

use crate::admin::{add_catalog_item, list_history, load_catalog, show_cart};
use crate::config::ShopConfig;
use crate::lock::DataDirLock;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pos_01_checkout::{CartId, ItemId, JsonFileRecordStore};
use serde_json::Value;
use std::path::PathBuf;

/// pos-admin: point-of-sale catalog and history maintenance
#[derive(Parser, Debug)]
#[command(name = "pos-admin")]
#[command(about = "Maintain a shop's catalog and inspect its cart history")]
pub struct Args {
    /// Root data directory (overrides POS_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Shop instance (overrides POS_SHOP_NAME)
    #[arg(long, global = true)]
    pub shop_name: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Catalog items
    #[command(subcommand)]
    Catalog(CatalogCommand),
    /// Checked-out carts
    #[command(subcommand)]
    History(HistoryCommand),
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum CatalogCommand {
    /// Print every item
    List,
    /// Add an item
    Add {
        #[arg(long)]
        name: String,
        /// Price in the smallest currency unit
        #[arg(long)]
        price: u64,
        /// Item id, random when omitted
        #[arg(long)]
        id: Option<String>,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum HistoryCommand {
    /// Print carts
    List {
        /// Only carts that still owe money
        #[arg(long)]
        unsettled: bool,
    },
    /// Print one cart
    Show { cart_id: String },
}

impl Args {
    /// Apply command line overrides on top of `config`.
    pub fn apply(&self, mut config: ShopConfig) -> ShopConfig {
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(name) = &self.shop_name {
            config.shop_name = name.clone();
        }
        config
    }
}

/// Run `command` against the shop directory of `config`, returning JSON output.
pub fn run(config: &ShopConfig, command: Command) -> Result<Value> {
    config.validate_for_admin()?;
    let shop_dir = config.shop_dir();
    let _lock = DataDirLock::acquire(&shop_dir)
        .with_context(|| format!("cannot lock shop directory {}", shop_dir.display()))?;
    let store = JsonFileRecordStore::new(&shop_dir);

    let output = match command {
        Command::Catalog(CatalogCommand::List) => {
            serde_json::to_value(load_catalog(&store)?.all())?
        }
        Command::Catalog(CatalogCommand::Add { name, price, id }) => {
            let item = add_catalog_item(&store, id.map(ItemId::new), &name, price)?;
            serde_json::to_value(item)?
        }
        Command::History(HistoryCommand::List { unsettled }) => {
            serde_json::to_value(list_history(&store, unsettled)?)?
        }
        Command::History(HistoryCommand::Show { cart_id }) => {
            serde_json::to_value(show_cart(&store, &CartId::new(cart_id))?)?
        }
    };
    Ok(output)
}
