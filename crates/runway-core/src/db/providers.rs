//! Forecast collaborator traits backed by the local store

use async_trait::async_trait;
use chrono::NaiveDate;

use super::Database;
use crate::error::Result;
use crate::forecast::providers::{ForecastSink, MarketDataProvider, TransactionHistoryProvider};
use crate::forecast::ScenarioForecast;
use crate::models::{MarketSnapshot, PendingInvoice, ScenarioConfig, TransactionRecord};

#[async_trait]
impl TransactionHistoryProvider for Database {
    async fn transactions_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TransactionRecord>> {
        self.list_transactions_between(start, end)
    }

    async fn pending_invoices(&self) -> Result<Vec<PendingInvoice>> {
        self.list_pending_invoices()
    }
}

#[async_trait]
impl MarketDataProvider for Database {
    async fn latest_snapshot(&self) -> Result<Option<MarketSnapshot>> {
        self.latest_market_snapshot()
    }
}

#[async_trait]
impl ForecastSink for Database {
    async fn save_forecast(
        &self,
        scenario: &ScenarioConfig,
        forecast: &ScenarioForecast,
    ) -> Result<()> {
        self.save_scenario_forecast(scenario, forecast).map(|_| ())
    }
}
