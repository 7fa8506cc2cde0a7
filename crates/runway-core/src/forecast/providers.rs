//! Collaborator interfaces consumed by the forecast service
//!
//! All I/O happens through these traits before any computation starts.
//! `Database` implements all three; `HttpMarketDataProvider` implements the
//! market feed.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{MarketSnapshot, PendingInvoice, ScenarioConfig, TransactionRecord};

use super::types::ScenarioForecast;

/// Source of ledger history
#[async_trait]
pub trait TransactionHistoryProvider: Send + Sync {
    /// Transactions dated within `[start, end]`, ordered by date
    async fn transactions_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TransactionRecord>>;

    /// Invoices not yet settled
    async fn pending_invoices(&self) -> Result<Vec<PendingInvoice>>;
}

/// Source of macro-economic snapshots
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Most recent snapshot, or `None` when the feed has nothing
    async fn latest_snapshot(&self) -> Result<Option<MarketSnapshot>>;
}

/// Persistence for finished forecasts
#[async_trait]
pub trait ForecastSink: Send + Sync {
    /// Replace everything stored for `scenario.id` with `forecast`
    async fn save_forecast(
        &self,
        scenario: &ScenarioConfig,
        forecast: &ScenarioForecast,
    ) -> Result<()>;
}
