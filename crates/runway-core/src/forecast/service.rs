//! Forecast service - the async boundary around the numeric pipeline
//!
//! Fetches history and market data once, then runs aggregation, recurring
//! detection, the cash-flow forecaster and the enhanced pipeline
//! synchronously. Market feed failures never abort a forecast.

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::config::ForecastConfig;
use crate::error::Result;
use crate::models::{MarketSnapshot, ScenarioConfig};

use super::aggregator::HistoricalDataAggregator;
use super::cashflow::{net_monthly_series, CashFlowForecaster};
use super::monte_carlo::MonteCarloSimulator;
use super::orchestrator::ForecastOrchestrator;
use super::providers::{ForecastSink, MarketDataProvider, TransactionHistoryProvider};
use super::rng::SeededRng;
use super::types::ScenarioForecast;

/// One forecast invocation
#[derive(Debug, Clone)]
pub struct ForecastRequest {
    pub scenario: ScenarioConfig,
    pub horizon: usize,
    pub confidence_level: f64,
    /// Last day of observed history
    pub as_of: NaiveDate,
}

impl ForecastRequest {
    pub fn new(scenario: ScenarioConfig, horizon: usize, confidence_level: f64, as_of: NaiveDate) -> Self {
        Self {
            scenario,
            horizon,
            confidence_level,
            as_of,
        }
    }
}

/// Runs forecasts against a history provider and an optional market feed
pub struct ForecastService<'a> {
    history: &'a dyn TransactionHistoryProvider,
    market: Option<&'a dyn MarketDataProvider>,
    aggregator: HistoricalDataAggregator,
    orchestrator: ForecastOrchestrator,
    forecaster: CashFlowForecaster,
    /// Seed for payment-date prediction; `None` seeds from the clock
    seed: Option<u64>,
}

impl<'a> ForecastService<'a> {
    pub fn new(history: &'a dyn TransactionHistoryProvider) -> Self {
        Self {
            history,
            market: None,
            aggregator: HistoricalDataAggregator::default(),
            orchestrator: ForecastOrchestrator::new(),
            forecaster: CashFlowForecaster::new(),
            seed: None,
        }
    }

    /// Build a service with aggregation and simulation settings from config
    pub fn from_config(history: &'a dyn TransactionHistoryProvider, config: &ForecastConfig) -> Self {
        let orchestrator = ForecastOrchestrator::new()
            .with_model(config.model.clone())
            .with_simulator(MonteCarloSimulator::new(config.monte_carlo()));

        Self {
            history,
            market: None,
            aggregator: HistoricalDataAggregator::new(config.history_months)
                .with_predictor(config.payment_predictor()),
            orchestrator,
            forecaster: CashFlowForecaster::new(),
            seed: config.seed,
        }
    }

    pub fn with_market(mut self, market: &'a dyn MarketDataProvider) -> Self {
        self.market = Some(market);
        self
    }

    pub fn with_orchestrator(mut self, orchestrator: ForecastOrchestrator) -> Self {
        self.orchestrator = orchestrator;
        self
    }

    pub fn with_aggregator(mut self, aggregator: HistoricalDataAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fetch the latest snapshot, treating feed failures as no data
    async fn load_market(&self) -> Vec<MarketSnapshot> {
        let Some(market) = self.market else {
            return Vec::new();
        };

        match market.latest_snapshot().await {
            Ok(Some(snapshot)) => vec![snapshot],
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Market data unavailable, forecasting without it");
                Vec::new()
            }
        }
    }

    /// Produce a scenario forecast
    pub async fn run(&self, request: &ForecastRequest) -> Result<ScenarioForecast> {
        let mut rng = match self.seed {
            Some(seed) => SeededRng::new(seed),
            None => SeededRng::from_entropy(),
        };

        let input = self
            .aggregator
            .aggregate(self.history, request.as_of, &mut rng)
            .await?;
        let market = self.load_market().await;

        let cash_flow = self
            .forecaster
            .forecast(&input, &request.scenario, request.horizon);
        let series = net_monthly_series(&input.transactions);
        let enhanced = self.orchestrator.generate_enhanced_forecast(
            &series,
            request.horizon,
            request.confidence_level,
            &market,
        )?;

        info!(
            scenario = %request.scenario.id,
            horizon = request.horizon,
            recurring = input.recurring_items.len(),
            market = !market.is_empty(),
            "Scenario forecast complete"
        );

        Ok(ScenarioForecast {
            scenario_id: request.scenario.id.clone(),
            generated_at: Utc::now(),
            cash_flow,
            recurring_items: input.recurring_items,
            enhanced,
        })
    }

    /// Produce a scenario forecast and replace the stored one for its id
    pub async fn run_and_persist(
        &self,
        request: &ForecastRequest,
        sink: &dyn ForecastSink,
    ) -> Result<ScenarioForecast> {
        let forecast = self.run(request).await?;
        sink.save_forecast(&request.scenario, &forecast).await?;
        info!(scenario = %request.scenario.id, "Forecast persisted");
        Ok(forecast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::forecast::monte_carlo::MonteCarloConfig;
    use crate::models::{PendingInvoice, TransactionKind, TransactionRecord};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct History(Vec<TransactionRecord>);

    #[async_trait]
    impl TransactionHistoryProvider for History {
        async fn transactions_between(
            &self,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<TransactionRecord>> {
            Ok(self
                .0
                .iter()
                .filter(|t| t.date >= start && t.date <= end)
                .cloned()
                .collect())
        }

        async fn pending_invoices(&self) -> Result<Vec<PendingInvoice>> {
            Ok(vec![])
        }
    }

    struct FailingMarket;

    #[async_trait]
    impl MarketDataProvider for FailingMarket {
        async fn latest_snapshot(&self) -> Result<Option<MarketSnapshot>> {
            Err(Error::MarketData("feed offline".into()))
        }
    }

    struct FixedMarket(MarketSnapshot);

    #[async_trait]
    impl MarketDataProvider for FixedMarket {
        async fn latest_snapshot(&self) -> Result<Option<MarketSnapshot>> {
            Ok(Some(self.0.clone()))
        }
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<String>>);

    #[async_trait]
    impl ForecastSink for RecordingSink {
        async fn save_forecast(
            &self,
            scenario: &ScenarioConfig,
            _forecast: &ScenarioForecast,
        ) -> Result<()> {
            self.0.lock().unwrap().push(scenario.id.clone());
            Ok(())
        }
    }

    fn history() -> History {
        let mut txs = Vec::new();
        for m in 1..=12 {
            let d = NaiveDate::from_ymd_opt(2023, m, 5).unwrap();
            txs.push(TransactionRecord::new(d, 2000.0 + m as f64 * 50.0, TransactionKind::Income, "Client"));
            txs.push(TransactionRecord::new(d, 1200.0, TransactionKind::Expense, "Rent"));
        }
        History(txs)
    }

    fn request() -> ForecastRequest {
        ForecastRequest::new(
            ScenarioConfig::default(),
            6,
            0.95,
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        )
    }

    fn orchestrator() -> ForecastOrchestrator {
        ForecastOrchestrator::new().with_simulator(MonteCarloSimulator::new(MonteCarloConfig {
            simulations: 200,
            seed: Some(3),
            ..Default::default()
        }))
    }

    #[tokio::test]
    async fn test_run_without_market() {
        let history = history();
        let service = ForecastService::new(&history)
            .with_orchestrator(orchestrator())
            .with_seed(1);

        let forecast = service.run(&request()).await.unwrap();
        assert_eq!(forecast.scenario_id, "default");
        assert_eq!(forecast.cash_flow.len(), 6);
        assert_eq!(forecast.enhanced.base_forecast.len(), 6);
        assert!(forecast.enhanced.market_factors.is_empty());
        // Rent on the 5th of every month
        assert_eq!(forecast.recurring_items.len(), 1);
    }

    #[tokio::test]
    async fn test_market_failure_degrades_to_identity() {
        let history = history();
        let failing = FailingMarket;

        let plain = ForecastService::new(&history)
            .with_orchestrator(orchestrator())
            .with_seed(1)
            .run(&request())
            .await
            .unwrap();
        let degraded = ForecastService::new(&history)
            .with_orchestrator(orchestrator())
            .with_market(&failing)
            .with_seed(1)
            .run(&request())
            .await
            .unwrap();

        assert_eq!(
            plain.enhanced.adjusted_forecast,
            degraded.enhanced.adjusted_forecast
        );
        assert!(degraded.enhanced.market_factors.is_empty());
    }

    #[tokio::test]
    async fn test_market_snapshot_used() {
        let history = history();
        let market = FixedMarket(MarketSnapshot {
            date: NaiveDate::from_ymd_opt(2023, 12, 1).unwrap(),
            interest_rate: 4.0,
            inflation_rate: 2.0,
            gdp_growth: 1.0,
            unemployment_rate: 4.0,
            equity_index: Some(4500.0),
            fx_rate: None,
        });

        let forecast = ForecastService::new(&history)
            .with_orchestrator(orchestrator())
            .with_market(&market)
            .run(&request())
            .await
            .unwrap();
        assert_eq!(forecast.enhanced.market_factors.len(), 4);
    }

    #[tokio::test]
    async fn test_run_and_persist_hands_result_to_sink() {
        let history = history();
        let sink = RecordingSink::default();

        let service = ForecastService::new(&history).with_orchestrator(orchestrator());
        service.run_and_persist(&request(), &sink).await.unwrap();

        assert_eq!(*sink.0.lock().unwrap(), vec!["default".to_string()]);
    }
}
