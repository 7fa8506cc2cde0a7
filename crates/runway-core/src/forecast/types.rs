//! Core types produced by the forecasting engine

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::TransactionKind;

/// Cadence of a detected recurring item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Weekly,
    Monthly,
}

impl Cadence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::Weekly => "weekly",
            Cadence::Monthly => "monthly",
        }
    }

    /// Number of occurrences in an average calendar month
    pub fn per_month(&self) -> f64 {
        match self {
            Cadence::Weekly => 52.0 / 12.0,
            Cadence::Monthly => 1.0,
        }
    }
}

/// Grouping key for recurring-pattern detection
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Signature {
    /// Lower-cased description with digits replaced and punctuation stripped
    pub description: String,
    /// Amount band index (fixed-width bands)
    pub amount_band: i64,
    pub kind: TransactionKind,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.kind.as_str(),
            self.description,
            self.amount_band
        )
    }
}

/// A transaction pattern judged periodic from repeated occurrences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringItem {
    pub signature: Signature,
    pub average_amount: f64,
    pub interval_days: f64,
    pub cadence: Cadence,
    pub kind: TransactionKind,
    pub last_occurrence: NaiveDate,
    pub occurrences: usize,
    /// min(occurrences / 12, 1)
    pub confidence: f64,
}

impl RecurringItem {
    /// Expected amount per calendar month
    pub fn monthly_amount(&self) -> f64 {
        self.average_amount * self.cadence.per_month()
    }
}

/// Per-calendar-month multiplier capturing cyclical deviation from the average
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalPattern {
    /// Calendar month, 1-12
    pub month: u32,
    pub multiplier: f64,
    pub confidence: f64,
    pub label: String,
}

/// One period of a projected forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub period_index: usize,
    pub predicted: f64,
    pub conservative: f64,
    pub optimistic: f64,
    pub confidence: f64,
    pub factors: Vec<String>,
    pub risks: Vec<String>,
}

impl ForecastPoint {
    pub fn new(period_index: usize, predicted: f64) -> Self {
        Self {
            period_index,
            predicted,
            conservative: predicted,
            optimistic: predicted,
            confidence: 0.0,
            factors: Vec::new(),
            risks: Vec::new(),
        }
    }

    pub fn with_bounds(mut self, conservative: f64, optimistic: f64) -> Self {
        self.conservative = conservative;
        self.optimistic = optimistic;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_factor(mut self, factor: impl Into<String>) -> Self {
        self.factors.push(factor.into());
        self
    }

    pub fn with_risk(mut self, risk: impl Into<String>) -> Self {
        self.risks.push(risk.into());
        self
    }
}

/// Symmetric band around a point forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    pub confidence_level: f64,
}

/// Percentiles of the simulated final-value distribution
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Percentiles {
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

/// Outcome of a Monte Carlo run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonteCarloResult {
    /// Final value of every simulated path, sorted ascending
    pub all_path_values: Vec<f64>,
    pub percentiles: Percentiles,
    pub mean: f64,
    pub std_dev: f64,
    pub probability_of_negative: f64,
    /// Paths actually simulated (may be below the request when a budget applies)
    pub simulations_run: usize,
}

/// Forecast accuracy over already-elapsed periods
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    pub mape: f64,
    pub rmse: f64,
    pub r2: f64,
}

/// A macro-economic multiplier applied to the forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketFactor {
    pub name: String,
    /// Indicator value from the snapshot
    pub value: f64,
    /// Multiplicative impact on the forecast
    pub impact: f64,
}

/// Severity level of a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational - no action needed
    Info,
    /// Worth attention but not urgent
    Attention,
    /// Should be addressed soon
    Warning,
    /// Requires immediate attention
    Alert,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Attention => "attention",
            Severity::Warning => "warning",
            Severity::Alert => "alert",
        }
    }

    /// Numeric priority for sorting (higher = more urgent)
    pub fn priority(&self) -> u8 {
        match self {
            Severity::Info => 1,
            Severity::Attention => 2,
            Severity::Warning => 3,
            Severity::Alert => 4,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Severity::Info),
            "attention" => Ok(Severity::Attention),
            "warning" => Ok(Severity::Warning),
            "alert" => Ok(Severity::Alert),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// Which rule produced a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    LiquidityRisk,
    CostReview,
    DataQuality,
    LowModelFit,
    Growth,
    CostReduction,
}

impl RecommendationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationKind::LiquidityRisk => "liquidity_risk",
            RecommendationKind::CostReview => "cost_review",
            RecommendationKind::DataQuality => "data_quality",
            RecommendationKind::LowModelFit => "low_model_fit",
            RecommendationKind::Growth => "growth",
            RecommendationKind::CostReduction => "cost_reduction",
        }
    }
}

/// A rule-based advisory derived from simulation and accuracy outputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub severity: Severity,
    pub message: String,
}

impl Recommendation {
    pub fn new(kind: RecommendationKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Composite output of the enhanced forecasting pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedForecast {
    /// Trend forecast before seasonal and market adjustment
    pub base_forecast: Vec<ForecastPoint>,
    /// Forecast after seasonal and market adjustment (drives intervals and simulation)
    pub adjusted_forecast: Vec<f64>,
    /// One interval per adjusted value, with both bounds floored at zero
    ///
    /// A negative (net outflow) value can therefore yield `[0, 0]`, which
    /// does not contain the value and says nothing about its certainty. Use
    /// the Monte Carlo percentiles to gauge downside spread.
    pub confidence_intervals: Vec<ConfidenceInterval>,
    pub seasonal_adjustments: Vec<SeasonalPattern>,
    pub monte_carlo_results: MonteCarloResult,
    pub market_factors: Vec<MarketFactor>,
    pub accuracy: AccuracyMetrics,
    pub recommendations: Vec<Recommendation>,
}

/// Everything produced for one scenario by the forecast service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioForecast {
    pub scenario_id: String,
    pub generated_at: DateTime<Utc>,
    /// Per-period income/expense projection with risk bounds
    pub cash_flow: Vec<ForecastPoint>,
    pub recurring_items: Vec<RecurringItem>,
    pub enhanced: EnhancedForecast,
}
