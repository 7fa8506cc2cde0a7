//! Forecast model seam
//!
//! A `ForecastModel` turns an ordered value series into a projection. The
//! registry holds the built-in models and dispatches training and prediction
//! by model id, so a fitted model can be plugged in without touching callers.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::accuracy::evaluate_with;
use super::trend::linear_projection;
use super::types::AccuracyMetrics;

pub const LINEAR_TREND: &str = "linear_trend";
pub const MOVING_AVERAGE: &str = "moving_average";

/// Default trailing window for the moving-average model
pub const DEFAULT_WINDOW: usize = 3;

/// Input for a training (holdout backtest) run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub model_id: String,
    /// Ordered historical values
    pub data: Vec<f64>,
    /// Number of trailing periods held out for evaluation
    pub holdout: usize,
}

impl TrainingConfig {
    pub fn new(model_id: impl Into<String>, data: Vec<f64>, holdout: usize) -> Self {
        Self {
            model_id: model_id.into(),
            data,
            holdout,
        }
    }
}

/// Result of training a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub model_id: String,
    /// clamp(1 - MAPE/100, 0, 1) on the holdout
    pub accuracy: f64,
    pub metrics: AccuracyMetrics,
    pub samples: usize,
}

/// Strategy interface for forecasting models
pub trait ForecastModel: Send + Sync {
    /// Unique identifier used for registry lookup
    fn id(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// Project `horizon` values following `data`
    fn predict(&self, data: &[f64], horizon: usize) -> Result<Vec<f64>>;

    /// Evaluate the model on a holdout of the training data
    fn train(&self, config: &TrainingConfig) -> Result<TrainingReport> {
        if config.data.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(
                "Training data contains non-finite values".into(),
            ));
        }

        let metrics = evaluate_with(&config.data, config.holdout, |training, h| {
            self.predict(training, h).unwrap_or_default()
        });
        let accuracy = (1.0 - metrics.mape / 100.0).clamp(0.0, 1.0);

        Ok(TrainingReport {
            model_id: self.id().to_string(),
            accuracy,
            metrics,
            samples: config.data.len(),
        })
    }
}

/// Mean plus the average first-to-last step, extended linearly
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearTrendModel;

impl ForecastModel for LinearTrendModel {
    fn id(&self) -> &'static str {
        LINEAR_TREND
    }

    fn description(&self) -> &'static str {
        "Series mean extended by the average step between first and last value"
    }

    fn predict(&self, data: &[f64], horizon: usize) -> Result<Vec<f64>> {
        Ok(linear_projection(data, horizon))
    }
}

/// Rolling mean of the trailing window, fed back with its own predictions
#[derive(Debug, Clone, Copy)]
pub struct MovingAverageModel {
    window: usize,
}

impl MovingAverageModel {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
        }
    }
}

impl Default for MovingAverageModel {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl ForecastModel for MovingAverageModel {
    fn id(&self) -> &'static str {
        MOVING_AVERAGE
    }

    fn description(&self) -> &'static str {
        "Mean of the trailing window, rolled forward one period at a time"
    }

    fn predict(&self, data: &[f64], horizon: usize) -> Result<Vec<f64>> {
        if data.is_empty() {
            return Ok(vec![0.0; horizon]);
        }

        let mut series = data.to_vec();
        for _ in 0..horizon {
            let start = series.len().saturating_sub(self.window);
            let tail = &series[start..];
            let next = tail.iter().sum::<f64>() / tail.len() as f64;
            series.push(next);
        }

        Ok(series.split_off(data.len()))
    }
}

/// Registry of available forecast models
pub struct ModelRegistry {
    models: Vec<Box<dyn ForecastModel>>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    /// Create a registry with the built-in models
    pub fn new() -> Self {
        let mut registry = Self { models: vec![] };

        registry.register(Box::new(LinearTrendModel));
        registry.register(Box::new(MovingAverageModel::default()));

        registry
    }

    /// Register a model, replacing any model with the same id
    pub fn register(&mut self, model: Box<dyn ForecastModel>) {
        self.models.retain(|m| m.id() != model.id());
        self.models.push(model);
    }

    pub fn get(&self, model_id: &str) -> Result<&dyn ForecastModel> {
        self.models
            .iter()
            .find(|m| m.id() == model_id)
            .map(|m| m.as_ref())
            .ok_or_else(|| Error::NotFound(format!("Unknown forecast model: {}", model_id)))
    }

    /// Ids of all registered models
    pub fn model_ids(&self) -> Vec<&'static str> {
        self.models.iter().map(|m| m.id()).collect()
    }

    /// (id, description) of all registered models
    pub fn describe(&self) -> Vec<(&'static str, &'static str)> {
        self.models
            .iter()
            .map(|m| (m.id(), m.description()))
            .collect()
    }

    pub fn train(&self, config: &TrainingConfig) -> Result<TrainingReport> {
        let model = self.get(&config.model_id)?;
        let report = model.train(config)?;

        info!(
            model = %report.model_id,
            accuracy = report.accuracy,
            samples = report.samples,
            "Model training complete"
        );
        Ok(report)
    }

    pub fn predict(&self, model_id: &str, data: &[f64], horizon: usize) -> Result<Vec<f64>> {
        let model = self.get(model_id)?;
        debug!(model = model_id, points = data.len(), horizon, "Predicting");
        model.predict(data, horizon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_builtins() {
        let registry = ModelRegistry::new();
        let ids = registry.model_ids();
        assert!(ids.contains(&LINEAR_TREND));
        assert!(ids.contains(&MOVING_AVERAGE));
    }

    #[test]
    fn test_unknown_model_not_found() {
        let registry = ModelRegistry::new();
        let err = registry.predict("neural_net", &[1.0], 3).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let err = registry
            .train(&TrainingConfig::new("neural_net", vec![1.0, 2.0], 1))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_linear_trend_matches_trend_module() {
        let registry = ModelRegistry::new();
        let prediction = registry.predict(LINEAR_TREND, &[100.0, 200.0], 3).unwrap();
        assert_eq!(prediction, vec![250.0, 350.0, 450.0]);
    }

    #[test]
    fn test_moving_average_rolls_forward() {
        let model = MovingAverageModel::new(3);
        let prediction = model.predict(&[3.0, 6.0, 9.0], 2).unwrap();
        assert_eq!(prediction[0], 6.0);
        // mean of [6, 9, 6]
        assert_eq!(prediction[1], 7.0);

        assert_eq!(model.predict(&[], 2).unwrap(), vec![0.0, 0.0]);
        assert!(model.predict(&[1.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_training_accuracy_bounds() {
        let registry = ModelRegistry::new();

        let flat = TrainingConfig::new(MOVING_AVERAGE, vec![100.0; 12], 3);
        let report = registry.train(&flat).unwrap();
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.samples, 12);

        let wild = TrainingConfig::new(LINEAR_TREND, vec![1.0, 1000.0, 1.0, 1000.0, 1.0], 2);
        let report = registry.train(&wild).unwrap();
        assert!((0.0..=1.0).contains(&report.accuracy));
    }

    #[test]
    fn test_training_rejects_non_finite() {
        let registry = ModelRegistry::new();
        let config = TrainingConfig::new(LINEAR_TREND, vec![1.0, f64::NAN], 1);
        assert!(matches!(
            registry.train(&config).unwrap_err(),
            Error::InvalidData(_)
        ));
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut registry = ModelRegistry::new();
        registry.register(Box::new(MovingAverageModel::new(6)));
        assert_eq!(registry.model_ids().len(), 2);
    }
}
