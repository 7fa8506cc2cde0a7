//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Runway - Cash-flow forecasting and risk quantification
#[derive(Parser)]
#[command(name = "runway")]
#[command(about = "Self-hosted cash-flow forecaster with Monte Carlo risk", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "runway.db", global = true)]
    pub db: PathBuf,

    /// Forecast config file (overrides the data-dir and embedded defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set RUNWAY_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Import ledger transactions or pending invoices from CSV
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,

        /// CSV layout (transactions, invoices). Auto-detected if not specified
        #[arg(long)]
        format: Option<String>,
    },

    /// Manage pending invoices
    Invoices {
        #[command(subcommand)]
        action: Option<InvoicesAction>,
    },

    /// Manage market snapshots
    Market {
        #[command(subcommand)]
        action: MarketAction,
    },

    /// Show detected recurring items
    Recurring {
        /// Months of history to scan
        #[arg(long)]
        months: Option<u32>,
    },

    /// Generate a cash-flow forecast for a scenario
    Forecast {
        /// Scenario id (stored forecasts are keyed by it)
        #[arg(long, default_value = "default")]
        scenario: String,

        /// Number of months to forecast
        #[arg(long)]
        horizon: Option<usize>,

        /// Confidence level for intervals (0.8, 0.9, 0.95, 0.99)
        #[arg(long)]
        confidence: Option<f64>,

        /// Risk level (low, medium, high)
        #[arg(long)]
        risk: Option<String>,

        /// Revenue growth applied to income, in percent
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        revenue_growth: f64,

        /// Cost inflation applied to expenses, in percent
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        cost_inflation: f64,

        /// Monte Carlo path count
        #[arg(long)]
        simulations: Option<usize>,

        /// Seed for reproducible simulation and payment prediction
        #[arg(long)]
        seed: Option<u64>,

        /// Last day of observed history (YYYY-MM-DD). Defaults to the latest transaction
        #[arg(long)]
        as_of: Option<String>,

        /// Store the result, replacing the scenario's previous forecast
        #[arg(long)]
        save: bool,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect stored forecasts
    Forecasts {
        #[command(subcommand)]
        action: Option<ForecastsAction>,
    },

    /// Forecast model management
    Models {
        #[command(subcommand)]
        action: Option<ModelsAction>,
    },
}

#[derive(Subcommand)]
pub enum InvoicesAction {
    /// List pending invoices
    List,
    /// Mark an invoice as paid
    Paid {
        /// Invoice ID
        id: i64,
        /// Payment date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum MarketAction {
    /// Record a market snapshot
    Add {
        /// Snapshot date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Policy interest rate, in percent
        #[arg(long, allow_hyphen_values = true)]
        interest_rate: f64,
        /// Inflation rate, in percent
        #[arg(long, allow_hyphen_values = true)]
        inflation: f64,
        /// GDP growth, in percent
        #[arg(long, allow_hyphen_values = true)]
        gdp_growth: f64,
        /// Unemployment rate, in percent
        #[arg(long)]
        unemployment: f64,
        /// Equity index level
        #[arg(long)]
        equity_index: Option<f64>,
        /// FX rate against the reporting currency
        #[arg(long)]
        fx_rate: Option<f64>,
    },
    /// List stored snapshots
    List {
        /// Number of snapshots to show
        #[arg(short, long, default_value = "12")]
        limit: i64,
    },
    /// Fetch the latest snapshot from the market feed and store it
    Fetch,
}

#[derive(Subcommand)]
pub enum ForecastsAction {
    /// List stored forecast runs
    List,
    /// Show the stored forecast for a scenario
    Show {
        /// Scenario id
        #[arg(long, default_value = "default")]
        scenario: String,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ModelsAction {
    /// List registered forecast models
    List,
    /// Backtest a model on the stored monthly history
    Train {
        /// Model id
        #[arg(long, default_value = "linear_trend")]
        model: String,
        /// Trailing months held out for evaluation
        #[arg(long, default_value = "3")]
        holdout: usize,
    },
}
