//! Forecast configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/runway/config/forecast.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Unknown keys are ignored. Missing keys keep their defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::forecast::aggregator::{
    PaymentDatePredictor, DEFAULT_HISTORY_MONTHS, DEFAULT_LATE_DAYS, DEFAULT_LATE_PROBABILITY,
};
use crate::forecast::model::LINEAR_TREND;
use crate::forecast::monte_carlo::{MonteCarloConfig, SimulationBudget, DEFAULT_SIMULATIONS};
use crate::forecast::orchestrator::{DEFAULT_CONFIDENCE_LEVEL, DEFAULT_HORIZON};
use crate::models::RiskLevel;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/forecast.toml");

/// Resolved forecast settings
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    pub horizon: usize,
    pub confidence_level: f64,
    pub model: String,
    pub history_months: u32,

    pub simulations: usize,
    pub seed: Option<u64>,
    pub workers: usize,
    pub max_path_steps: Option<usize>,
    pub deadline: Option<Duration>,

    pub risk_level: RiskLevel,

    pub late_probability: f64,
    pub late_days: u32,

    pub market_endpoint: Option<String>,
    pub market_timeout: Duration,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            model: LINEAR_TREND.to_string(),
            history_months: DEFAULT_HISTORY_MONTHS,
            simulations: DEFAULT_SIMULATIONS,
            seed: None,
            workers: 1,
            max_path_steps: None,
            deadline: None,
            risk_level: RiskLevel::default(),
            late_probability: DEFAULT_LATE_PROBABILITY,
            late_days: DEFAULT_LATE_DAYS,
            market_endpoint: None,
            market_timeout: Duration::from_secs(10),
        }
    }
}

impl ForecastConfig {
    /// Load from an explicit path, the data-dir override, or the embedded default
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let content = match override_path {
            Some(path) => read_config(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => read_config(&path)?,
                _ => DEFAULT_CONFIG.to_string(),
            },
        };

        Self::parse(&content)
    }

    /// Embedded defaults only
    pub fn embedded() -> Result<Self> {
        Self::parse(DEFAULT_CONFIG)
    }

    /// Parse config from TOML content
    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        let mut config = Self::default();

        if let Some(forecast) = raw.forecast {
            if let Some(horizon) = forecast.horizon {
                config.horizon = horizon;
            }
            if let Some(level) = forecast.confidence_level {
                if !(level > 0.0 && level < 1.0) {
                    return Err(Error::Config(format!(
                        "confidence_level must be between 0 and 1, got {}",
                        level
                    )));
                }
                config.confidence_level = level;
            }
            if let Some(model) = forecast.model {
                config.model = model;
            }
            if let Some(months) = forecast.history_months {
                config.history_months = months;
            }
        }

        if let Some(sim) = raw.simulation {
            if let Some(count) = sim.count {
                config.simulations = count;
            }
            config.seed = sim.seed.or(config.seed);
            if let Some(workers) = sim.workers {
                config.workers = workers.max(1);
            }
            config.max_path_steps = sim.max_path_steps.or(config.max_path_steps);
            if let Some(ms) = sim.deadline_ms {
                config.deadline = Some(Duration::from_millis(ms));
            }
        }

        if let Some(level) = raw.risk.and_then(|r| r.level) {
            config.risk_level = RiskLevel::parse_or_default(&level);
        }

        if let Some(invoices) = raw.invoices {
            if let Some(p) = invoices.late_probability {
                if !(0.0..=1.0).contains(&p) {
                    return Err(Error::Config(format!(
                        "late_probability must be between 0 and 1, got {}",
                        p
                    )));
                }
                config.late_probability = p;
            }
            if let Some(days) = invoices.late_days {
                config.late_days = days;
            }
        }

        if let Some(market) = raw.market {
            config.market_endpoint = market.endpoint.filter(|e| !e.trim().is_empty());
            if let Some(secs) = market.timeout_secs {
                config.market_timeout = Duration::from_secs(secs);
            }
        }

        Ok(config)
    }

    pub fn budget(&self) -> SimulationBudget {
        SimulationBudget {
            max_path_steps: self.max_path_steps,
            deadline: self.deadline,
        }
    }

    pub fn monte_carlo(&self) -> MonteCarloConfig {
        MonteCarloConfig {
            simulations: self.simulations,
            seed: self.seed,
            workers: self.workers,
            budget: self.budget(),
        }
    }

    pub fn payment_predictor(&self) -> PaymentDatePredictor {
        PaymentDatePredictor {
            late_probability: self.late_probability,
            late_days: self.late_days,
        }
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("runway").join("config").join("forecast.toml"))
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    forecast: Option<RawForecast>,
    simulation: Option<RawSimulation>,
    risk: Option<RawRisk>,
    invoices: Option<RawInvoices>,
    market: Option<RawMarket>,
}

#[derive(Debug, Deserialize)]
struct RawForecast {
    horizon: Option<usize>,
    confidence_level: Option<f64>,
    model: Option<String>,
    history_months: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawSimulation {
    count: Option<usize>,
    seed: Option<u64>,
    workers: Option<usize>,
    max_path_steps: Option<usize>,
    deadline_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawRisk {
    level: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawInvoices {
    late_probability: Option<f64>,
    late_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawMarket {
    endpoint: Option<String>,
    timeout_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_config() {
        let config = ForecastConfig::embedded().unwrap();
        assert_eq!(config, ForecastConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = ForecastConfig::parse(
            r#"
            [forecast]
            horizon = 6
            model = "moving_average"

            [simulation]
            seed = 7
            workers = 0
            deadline_ms = 250

            [risk]
            level = "high"
            "#,
        )
        .unwrap();

        assert_eq!(config.horizon, 6);
        assert_eq!(config.model, "moving_average");
        assert_eq!(config.confidence_level, 0.95);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.workers, 1);
        assert_eq!(config.deadline, Some(Duration::from_millis(250)));
        assert_eq!(config.risk_level, RiskLevel::High);
        assert_eq!(config.monte_carlo().seed, Some(7));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = ForecastConfig::parse("[forecast]\nshiny = true\n[extras]\nx = 1\n").unwrap();
        assert_eq!(config.horizon, DEFAULT_HORIZON);
    }

    #[test]
    fn test_unknown_risk_falls_back() {
        let config = ForecastConfig::parse("[risk]\nlevel = \"reckless\"\n").unwrap();
        assert_eq!(config.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            ForecastConfig::parse("[forecast]\nconfidence_level = 1.5\n"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            ForecastConfig::parse("[invoices]\nlate_probability = -0.1\n"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            ForecastConfig::parse("not = [valid"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.toml");
        fs::write(&path, "[invoices]\nlate_days = 30\n[market]\nendpoint = \"http://feed\"\n").unwrap();

        let config = ForecastConfig::load(Some(&path)).unwrap();
        assert_eq!(config.late_days, 30);
        assert_eq!(config.payment_predictor().late_days, 30);
        assert_eq!(config.market_endpoint.as_deref(), Some("http://feed"));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            ForecastConfig::load(Some(&missing)),
            Err(Error::Config(_))
        ));
    }
}
