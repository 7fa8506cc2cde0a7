//! Enhanced forecast orchestration
//!
//! Runs the pipeline stages in a fixed order:
//!
//! ```text
//! ComputeBaseForecast -> LoadMarketData -> ComputeSeasonalAdjustments
//!   -> ApplyMarketFactors -> ComputeConfidenceIntervals -> RunMonteCarlo
//!   -> ComputeAccuracy -> GenerateRecommendations -> AssembleResult
//! ```
//!
//! No stage aborts the pipeline for lack of data; each falls back to its
//! neutral default. Market data arrives already fetched, and nothing is kept
//! on the orchestrator between calls.

use chrono::Datelike;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{HistoricalPoint, MarketSnapshot};

use super::accuracy::evaluate_with;
use super::confidence::{confidence_intervals, historical_returns};
use super::market::{apply_market_factors, latest_snapshot};
use super::model::{ModelRegistry, LINEAR_TREND};
use super::monte_carlo::MonteCarloSimulator;
use super::recommendations::generate_recommendations;
use super::trend::{add_months, blended_multiplier, seasonal_patterns};
use super::types::{EnhancedForecast, ForecastPoint};

/// Default horizon in months
pub const DEFAULT_HORIZON: usize = 12;
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Per-step confidence decay of the base forecast
const CONFIDENCE_DECAY: f64 = 0.05;
/// Series length (months) at which history coverage is complete
const FULL_COVERAGE_POINTS: f64 = 12.0;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    ComputeBaseForecast,
    LoadMarketData,
    ComputeSeasonalAdjustments,
    ApplyMarketFactors,
    ComputeConfidenceIntervals,
    RunMonteCarlo,
    ComputeAccuracy,
    GenerateRecommendations,
    AssembleResult,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ComputeBaseForecast => "compute_base_forecast",
            Self::LoadMarketData => "load_market_data",
            Self::ComputeSeasonalAdjustments => "compute_seasonal_adjustments",
            Self::ApplyMarketFactors => "apply_market_factors",
            Self::ComputeConfidenceIntervals => "compute_confidence_intervals",
            Self::RunMonteCarlo => "run_monte_carlo",
            Self::ComputeAccuracy => "compute_accuracy",
            Self::GenerateRecommendations => "generate_recommendations",
            Self::AssembleResult => "assemble_result",
        }
    }

    /// All stages in execution order
    pub fn all() -> &'static [PipelineStage] {
        &[
            Self::ComputeBaseForecast,
            Self::LoadMarketData,
            Self::ComputeSeasonalAdjustments,
            Self::ApplyMarketFactors,
            Self::ComputeConfidenceIntervals,
            Self::RunMonteCarlo,
            Self::ComputeAccuracy,
            Self::GenerateRecommendations,
            Self::AssembleResult,
        ]
    }
}

fn enter(stage: PipelineStage) {
    debug!(stage = stage.as_str(), "Forecast pipeline stage");
}

/// Produces an `EnhancedForecast` from a historical series
pub struct ForecastOrchestrator {
    registry: ModelRegistry,
    model_id: String,
    simulator: MonteCarloSimulator,
}

impl Default for ForecastOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastOrchestrator {
    pub fn new() -> Self {
        Self {
            registry: ModelRegistry::new(),
            model_id: LINEAR_TREND.to_string(),
            simulator: MonteCarloSimulator::default(),
        }
    }

    /// Use a different registered model for the base forecast
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_simulator(mut self, simulator: MonteCarloSimulator) -> Self {
        self.simulator = simulator;
        self
    }

    pub fn with_registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Run the full pipeline
    ///
    /// Only an unknown model id is an error; thin or empty history degrades
    /// to zero forecasts with zero confidence.
    pub fn generate_enhanced_forecast(
        &self,
        points: &[HistoricalPoint],
        horizon: usize,
        confidence_level: f64,
        market: &[MarketSnapshot],
    ) -> Result<EnhancedForecast> {
        let mut sorted: Vec<HistoricalPoint> = points.to_vec();
        sorted.sort_by_key(|p| p.date);
        let values: Vec<f64> = sorted.iter().map(|p| p.amount).collect();

        enter(PipelineStage::ComputeBaseForecast);
        let base_values = self.registry.predict(&self.model_id, &values, horizon)?;
        let coverage = (values.len() as f64 / FULL_COVERAGE_POINTS).min(1.0);
        let base_forecast: Vec<ForecastPoint> = base_values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                ForecastPoint::new(i, *v)
                    .with_confidence(coverage * (1.0 - CONFIDENCE_DECAY * i as f64))
                    .with_factor(format!("model: {}", self.model_id))
            })
            .collect();

        enter(PipelineStage::LoadMarketData);
        let snapshot_date = latest_snapshot(market).map(|s| s.date);
        debug!(snapshots = market.len(), latest = ?snapshot_date, "Market data supplied");

        enter(PipelineStage::ComputeSeasonalAdjustments);
        let seasonal = seasonal_patterns(&sorted);
        let seasonal_values: Vec<f64> = match sorted.last() {
            Some(last) => base_values
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    let (_, month) = add_months(last.date.year(), last.date.month(), i as u32 + 1);
                    v * blended_multiplier(&seasonal, month)
                })
                .collect(),
            None => base_values.clone(),
        };

        enter(PipelineStage::ApplyMarketFactors);
        let (adjusted, market_factors) = apply_market_factors(&seasonal_values, market);

        enter(PipelineStage::ComputeConfidenceIntervals);
        let intervals = confidence_intervals(&adjusted, &values, confidence_level);

        enter(PipelineStage::RunMonteCarlo);
        let monte_carlo = self.simulator.run(&adjusted, &historical_returns(&values));

        enter(PipelineStage::ComputeAccuracy);
        let accuracy = evaluate_with(&values, horizon, |training, h| {
            self.registry
                .predict(&self.model_id, training, h)
                .unwrap_or_default()
        });

        enter(PipelineStage::GenerateRecommendations);
        let recommendations = generate_recommendations(&monte_carlo, &accuracy, &adjusted);

        enter(PipelineStage::AssembleResult);
        info!(
            history = values.len(),
            horizon,
            model = %self.model_id,
            recommendations = recommendations.len(),
            "Enhanced forecast complete"
        );

        Ok(EnhancedForecast {
            base_forecast,
            adjusted_forecast: adjusted,
            confidence_intervals: intervals,
            seasonal_adjustments: seasonal,
            monte_carlo_results: monte_carlo,
            market_factors,
            accuracy,
            recommendations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::forecast::monte_carlo::MonteCarloConfig;
    use crate::forecast::types::AccuracyMetrics;
    use chrono::NaiveDate;

    fn orchestrator() -> ForecastOrchestrator {
        ForecastOrchestrator::new().with_simulator(MonteCarloSimulator::new(MonteCarloConfig {
            simulations: 500,
            seed: Some(11),
            ..Default::default()
        }))
    }

    fn monthly(amounts: &[f64]) -> Vec<HistoricalPoint> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let (y, m) = add_months(2023, 1, i as u32);
                HistoricalPoint::new(NaiveDate::from_ymd_opt(y, m, 1).unwrap(), *a)
            })
            .collect()
    }

    #[test]
    fn test_empty_history_degrades() {
        let result = orchestrator()
            .generate_enhanced_forecast(&[], 6, DEFAULT_CONFIDENCE_LEVEL, &[])
            .unwrap();

        assert_eq!(result.base_forecast.len(), 6);
        assert!(result
            .base_forecast
            .iter()
            .all(|p| p.predicted == 0.0 && p.confidence == 0.0));
        assert_eq!(result.adjusted_forecast, vec![0.0; 6]);
        assert_eq!(result.seasonal_adjustments.len(), 12);
        assert!(result
            .seasonal_adjustments
            .iter()
            .all(|s| s.multiplier == 1.0 && s.confidence == 0.0));
        assert_eq!(result.accuracy, AccuracyMetrics::default());
        assert!(result.market_factors.is_empty());
        assert_eq!(result.monte_carlo_results.probability_of_negative, 0.0);
    }

    #[test]
    fn test_horizon_lengths_agree() {
        let history = monthly(&[1000.0, 1100.0, 950.0, 1200.0, 1300.0, 1250.0]);
        for horizon in [1, 3, 12, 24] {
            let result = orchestrator()
                .generate_enhanced_forecast(&history, horizon, 0.90, &[])
                .unwrap();
            assert_eq!(result.base_forecast.len(), horizon);
            assert_eq!(result.adjusted_forecast.len(), horizon);
            assert_eq!(result.confidence_intervals.len(), horizon);
        }
    }

    #[test]
    fn test_market_snapshot_applied() {
        let history = monthly(&[1000.0; 6]);
        let snapshot = MarketSnapshot {
            date: NaiveDate::from_ymd_opt(2023, 6, 30).unwrap(),
            interest_rate: 5.0,
            inflation_rate: 0.0,
            gdp_growth: 0.0,
            unemployment_rate: 3.0,
            equity_index: None,
            fx_rate: None,
        };

        let plain = orchestrator()
            .generate_enhanced_forecast(&history, 3, 0.95, &[])
            .unwrap();
        let adjusted = orchestrator()
            .generate_enhanced_forecast(&history, 3, 0.95, &[snapshot])
            .unwrap();

        assert_eq!(adjusted.market_factors.len(), 4);
        for (a, p) in adjusted.adjusted_forecast.iter().zip(&plain.adjusted_forecast) {
            assert!((a - p * 0.98).abs() < 1e-9);
        }
    }

    #[test]
    fn test_unknown_model_is_error() {
        let err = orchestrator()
            .with_model("arima")
            .generate_enhanced_forecast(&monthly(&[1.0, 2.0]), 3, 0.95, &[])
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_stage_order() {
        let stages = PipelineStage::all();
        assert_eq!(stages.len(), 9);
        assert_eq!(stages[0], PipelineStage::ComputeBaseForecast);
        assert_eq!(stages[8], PipelineStage::AssembleResult);
    }

    #[test]
    fn test_repeat_runs_identical_with_seed() {
        let history = monthly(&[800.0, 950.0, 700.0, 1100.0, 900.0, 1000.0, 1050.0]);
        let a = orchestrator()
            .generate_enhanced_forecast(&history, 6, 0.95, &[])
            .unwrap();
        let b = orchestrator()
            .generate_enhanced_forecast(&history, 6, 0.95, &[])
            .unwrap();
        assert_eq!(a, b);
    }
}
