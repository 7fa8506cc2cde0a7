//! Forecast Engine - Cash Flow Projection and Risk Quantification
//!
//! Turns transaction history, pending invoices and market snapshots into a
//! per-scenario cash-flow forecast plus an enhanced view with confidence
//! bands, Monte Carlo risk and recommendations.
//!
//! ## Pipeline
//!
//! - **Aggregation** - bounded history window, invoice payment prediction, recurring items
//! - **Cash flow** - monthly income/expense projection with risk bounds
//! - **Enhancement** - model forecast, seasonal and market adjustment, intervals,
//!   simulation, backtest accuracy, recommendations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use runway_core::forecast::{ForecastRequest, ForecastService};
//!
//! let service = ForecastService::new(&db).with_market(&db);
//! let request = ForecastRequest::new(scenario, 12, 0.95, as_of);
//! let forecast = service.run_and_persist(&request, &db).await?;
//! ```

pub mod accuracy;
pub mod aggregator;
pub mod cashflow;
pub mod confidence;
pub mod market;
pub mod model;
pub mod monte_carlo;
pub mod orchestrator;
pub mod providers;
pub mod recommendations;
pub mod recurring;
pub mod rng;
pub mod service;
pub mod trend;
pub mod types;

pub use aggregator::{ForecastInput, HistoricalDataAggregator, PaymentDatePredictor};
pub use cashflow::CashFlowForecaster;
pub use model::{
    ForecastModel, LinearTrendModel, ModelRegistry, MovingAverageModel, TrainingConfig,
    TrainingReport,
};
pub use monte_carlo::{MonteCarloConfig, MonteCarloSimulator, SimulationBudget};
pub use orchestrator::{ForecastOrchestrator, PipelineStage};
pub use providers::{ForecastSink, MarketDataProvider, TransactionHistoryProvider};
pub use recurring::{RecurringConfig, RecurringDetector};
pub use rng::{RandomSource, SeededRng};
pub use service::{ForecastRequest, ForecastService};
pub use types::{
    AccuracyMetrics, Cadence, ConfidenceInterval, EnhancedForecast, ForecastPoint, MarketFactor,
    MonteCarloResult, Percentiles, Recommendation, RecommendationKind, RecurringItem,
    ScenarioForecast, SeasonalPattern, Severity, Signature,
};
