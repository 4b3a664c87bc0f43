//! # pos-admin
//!
//! Maintenance CLI for a shop's catalog and cart history.
//!
//! ```text
//! pos-admin catalog list
//! pos-admin catalog add --name Coffee --price 100
//! pos-admin history list --unsettled
//! pos-admin history show <cart-id>
//! ```

use anyhow::Result;
use clap::Parser;
use pos_runtime::cli::{run, Args};
use pos_runtime::{init_tracing, ShopConfig};

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.apply(ShopConfig::from_env());
    init_tracing(&config.log_filter)?;

    let output = run(&config, args.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
