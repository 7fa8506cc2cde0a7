//! Runway Core Library
//!
//! Shared functionality for the Runway cash-flow forecasting tool:
//! - Database access and migrations (ledger, invoices, market snapshots, forecasts)
//! - CSV import of ledger transactions and pending invoices
//! - Recurring pattern detection and per-scenario cash-flow projection
//! - Enhanced forecasts: seasonal and market adjustment, confidence intervals,
//!   Monte Carlo risk, backtest accuracy and recommendations
//! - Pluggable forecast models behind a registry
//! - HTTP market data feed

pub mod config;
pub mod db;
pub mod error;
pub mod forecast;
pub mod import;
pub mod market_feed;
pub mod models;

/// Test utilities including mock market-data server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::ForecastConfig;
pub use db::{Database, StoredForecastPoint};
pub use error::{Error, Result};
pub use forecast::{
    EnhancedForecast, ForecastOrchestrator, ForecastRequest, ForecastService, ModelRegistry,
    MonteCarloSimulator, ScenarioForecast,
};
pub use import::{detect_csv_format, parse_invoices_csv, parse_transactions_csv, CsvFormat};
pub use market_feed::HttpMarketDataProvider;
