//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `load_config` - Resolve forecast settings
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use runway_core::{
    config::ForecastConfig,
    db::{Database, DB_KEY_ENV},
};

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .with_context(|| format!("Database path is not valid UTF-8: {}", db_path.display()))?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Load forecast settings from --config, the data-dir override, or the embedded default
pub fn load_config(config_path: Option<&Path>) -> Result<ForecastConfig> {
    ForecastConfig::load(config_path).context("Failed to load forecast config")
}

/// Parse a YYYY-MM-DD argument
pub fn parse_date_arg(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path, no_encrypt)?;
    let transactions = db.count_transactions()?;
    if transactions > 0 {
        println!("   Existing ledger: {} transactions", transactions);
    }

    println!("   Database: {}", db.path());
    if db.is_encrypted() {
        println!("   🔒 Encryption: ENABLED ({}=***)", DB_KEY_ENV);
    } else {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Import transactions: runway import --file ledger.csv");
    println!("  2. Import invoices:     runway import --file invoices.csv");
    println!("  3. Forecast:            runway forecast --save");

    Ok(db)
}
