//! Diagnostic probe for the persisted account store.
//!
//! Prints the non-secret account inventory (ids, names, addresses). Never
//! decrypts anything and never touches key material.

use anyhow::{Context, Result};
use clap::Parser;
use custody::accounts::{AccountStore, FileAccountStore};
use custody::config::Config;
use custody::observability::init_logging;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let config = load_config(&args.config)?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let store = FileAccountStore::from_file(&config.accounts.store_path)
        .context("Failed to open account store")?;

    let mut accounts = store.list().map_err(|e| anyhow::anyhow!(e))?;
    accounts.sort_by(|a, b| a.account_id.cmp(&b.account_id));

    println!("{} account(s) in {}", accounts.len(), config.accounts.store_path);
    for account in &accounts {
        println!(
            "  {:<24} {:<24} {}",
            account.account_id, account.account_name, account.address
        );
    }

    Ok(())
}

/// Load configuration from file with fallback to defaults
fn load_config(path: &str) -> Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file_with_env(path)
            .with_context(|| format!("Failed to load config from {}", path))
    } else {
        warn!("Config file '{}' not found, using defaults", path);
        Ok(Config::default())
    }
}
