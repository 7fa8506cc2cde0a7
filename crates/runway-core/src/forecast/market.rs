//! Market factor adjustment
//!
//! Converts the most recent macro-economic snapshot into multiplicative
//! factors and scales a base forecast by their product.

use crate::models::MarketSnapshot;

use super::types::MarketFactor;

/// Rate (percent) at which interest and unemployment are neutral
const NEUTRAL_RATE: f64 = 3.0;

const INTEREST_SENSITIVITY: f64 = 0.01;
const INFLATION_SENSITIVITY: f64 = 0.01;
const GDP_SENSITIVITY: f64 = 0.005;
const UNEMPLOYMENT_SENSITIVITY: f64 = 0.02;

/// Most recent snapshot by date, if any
pub fn latest_snapshot(snapshots: &[MarketSnapshot]) -> Option<&MarketSnapshot> {
    snapshots.iter().max_by_key(|s| s.date)
}

/// Individual factors derived from one snapshot
pub fn market_factors(snapshot: &MarketSnapshot) -> Vec<MarketFactor> {
    vec![
        MarketFactor {
            name: "interest_rate".to_string(),
            value: snapshot.interest_rate,
            impact: 1.0 - (snapshot.interest_rate - NEUTRAL_RATE) * INTEREST_SENSITIVITY,
        },
        MarketFactor {
            name: "inflation".to_string(),
            value: snapshot.inflation_rate,
            impact: 1.0 + snapshot.inflation_rate * INFLATION_SENSITIVITY,
        },
        MarketFactor {
            name: "gdp_growth".to_string(),
            value: snapshot.gdp_growth,
            impact: 1.0 + snapshot.gdp_growth * GDP_SENSITIVITY,
        },
        MarketFactor {
            name: "unemployment".to_string(),
            value: snapshot.unemployment_rate,
            impact: 1.0 - (snapshot.unemployment_rate - NEUTRAL_RATE) * UNEMPLOYMENT_SENSITIVITY,
        },
    ]
}

/// Product of all factor impacts (1.0 for an empty list)
pub fn combined_impact(factors: &[MarketFactor]) -> f64 {
    factors.iter().map(|f| f.impact).product()
}

/// Scale every forecast element by the combined impact of the latest snapshot
///
/// Returns the adjusted series and the factors used. Without snapshots the
/// forecast is returned unchanged and no factors are reported.
pub fn apply_market_factors(
    forecast: &[f64],
    snapshots: &[MarketSnapshot],
) -> (Vec<f64>, Vec<MarketFactor>) {
    let Some(snapshot) = latest_snapshot(snapshots) else {
        return (forecast.to_vec(), Vec::new());
    };

    let factors = market_factors(snapshot);
    let combined = combined_impact(&factors);

    (forecast.iter().map(|v| v * combined).collect(), factors)
}
