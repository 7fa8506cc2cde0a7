//! Rule-based recommendations
//!
//! Each rule inspects the simulation, accuracy and forecast outputs
//! independently and contributes at most one recommendation.

use super::types::{
    AccuracyMetrics, MonteCarloResult, Recommendation, RecommendationKind, Severity,
};

/// Shortfall probability above which liquidity is flagged
const LIQUIDITY_RISK_PROBABILITY: f64 = 0.10;
/// p25 below this fraction of the first forecast value triggers a cost review
const COST_REVIEW_RATIO: f64 = 0.80;
/// MAPE (percent) above which the data is considered unreliable
const DATA_QUALITY_MAPE: f64 = 20.0;
const LOW_FIT_R2: f64 = 0.5;
/// Forecast growth over the horizon considered an expansion signal
const GROWTH_THRESHOLD: f64 = 0.10;
/// Forecast decline over the horizon that suggests cost reduction
const DECLINE_THRESHOLD: f64 = -0.05;

/// Evaluate all rules, most severe first
pub fn generate_recommendations(
    monte_carlo: &MonteCarloResult,
    accuracy: &AccuracyMetrics,
    forecast: &[f64],
) -> Vec<Recommendation> {
    let mut out = Vec::new();
    let first = forecast.first().copied().unwrap_or(0.0);

    if monte_carlo.probability_of_negative > LIQUIDITY_RISK_PROBABILITY {
        out.push(Recommendation::new(
            RecommendationKind::LiquidityRisk,
            Severity::Warning,
            format!(
                "{:.1}% chance of a negative cash position; consider a credit line or cash reserve",
                monte_carlo.probability_of_negative * 100.0
            ),
        ));
    }

    if monte_carlo.simulations_run > 0 && monte_carlo.percentiles.p25 < COST_REVIEW_RATIO * first {
        out.push(Recommendation::new(
            RecommendationKind::CostReview,
            Severity::Warning,
            format!(
                "25th percentile outcome ({:.2}) is well below the first-period forecast ({:.2}); review costs",
                monte_carlo.percentiles.p25, first
            ),
        ));
    }

    if accuracy.mape > DATA_QUALITY_MAPE {
        out.push(Recommendation::new(
            RecommendationKind::DataQuality,
            Severity::Warning,
            format!(
                "Historical forecast error is {:.1}%; check transaction data for gaps or miscategorized entries",
                accuracy.mape
            ),
        ));
    }

    if accuracy.r2 < LOW_FIT_R2 {
        out.push(Recommendation::new(
            RecommendationKind::LowModelFit,
            Severity::Warning,
            format!(
                "Model explains little of the historical variation (R² {:.2}); treat the forecast as indicative",
                accuracy.r2
            ),
        ));
    }

    if let (Some(&last), true) = (forecast.last(), first != 0.0) {
        let change = last / first - 1.0;
        if change > GROWTH_THRESHOLD {
            out.push(Recommendation::new(
                RecommendationKind::Growth,
                Severity::Info,
                format!(
                    "Cash flow is projected to grow {:.1}% over the horizon; room to invest in expansion",
                    change * 100.0
                ),
            ));
        } else if change < DECLINE_THRESHOLD {
            out.push(Recommendation::new(
                RecommendationKind::CostReduction,
                Severity::Attention,
                format!(
                    "Cash flow is projected to fall {:.1}% over the horizon; look for cost reductions",
                    -change * 100.0
                ),
            ));
        }
    }

    out.sort_by(|a, b| b.severity.priority().cmp(&a.severity.priority()));
    out
}
