//! Confidence interval estimation
//!
//! Volatility comes from period-over-period returns of the historical
//! series; the band widens by 10% of its base width per step ahead.

use tracing::warn;

use super::types::ConfidenceInterval;

/// Volatility assumed when fewer than two returns are available
pub const DEFAULT_VOLATILITY: f64 = 0.1;

/// Fractional widening of the band per forecast step
const STEP_WIDENING: f64 = 0.1;

/// Period-over-period relative changes, skipping zero-valued predecessors
pub fn historical_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation of returns, `DEFAULT_VOLATILITY` below two samples
pub fn volatility(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return DEFAULT_VOLATILITY;
    }

    let m = mean(returns);
    let variance =
        returns.iter().map(|r| (r - m).powi(2)).sum::<f64>() / (returns.len() - 1) as f64;
    variance.sqrt()
}

/// Two-sided z-score for a confidence level
///
/// Only 0.90, 0.95 and 0.99 are tabulated; anything else uses 1.96.
pub fn z_score(confidence_level: f64) -> f64 {
    const TABLE: [(f64, f64); 3] = [(0.90, 1.645), (0.95, 1.96), (0.99, 2.576)];

    TABLE
        .iter()
        .find(|(level, _)| (level - confidence_level).abs() < 1e-9)
        .map(|(_, z)| *z)
        .unwrap_or_else(|| {
            warn!(confidence_level, "Untabulated confidence level, using z=1.96");
            1.96
        })
}

/// Symmetric interval per forecast element
///
/// `margin_i = |value_i| * vol * z * (1 + 0.1 * i)`; the lower bound is
/// floored at zero and the upper bound never falls below it.
pub fn confidence_intervals(
    forecast: &[f64],
    history: &[f64],
    confidence_level: f64,
) -> Vec<ConfidenceInterval> {
    let vol = volatility(&historical_returns(history));
    let z = z_score(confidence_level);

    forecast
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let margin = value.abs() * vol * z * (1.0 + STEP_WIDENING * i as f64);
            let lower = (value - margin).max(0.0);
            let upper = (value + margin).max(lower);
            ConfidenceInterval {
                lower,
                upper,
                confidence_level,
            }
        })
        .collect()
}
