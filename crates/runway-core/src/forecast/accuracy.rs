//! Forecast accuracy evaluation
//!
//! Backtests a forecaster on already-elapsed periods: fit on the leading part
//! of the history, forecast the trailing `h = min(horizon, n - 1)` periods,
//! and compare against what actually happened.

use super::trend::linear_projection;
use super::types::AccuracyMetrics;

/// Backtest the linear trend forecaster over the trailing periods of `history`
///
/// Fewer than two points (or a zero horizon) yields all-zero metrics.
pub fn evaluate(history: &[f64], horizon: usize) -> AccuracyMetrics {
    evaluate_with(history, horizon, linear_projection)
}

/// Backtest an arbitrary forecaster `predict(training, h)`
pub fn evaluate_with<F>(history: &[f64], horizon: usize, predict: F) -> AccuracyMetrics
where
    F: Fn(&[f64], usize) -> Vec<f64>,
{
    let n = history.len();
    if n < 2 || horizon == 0 {
        return AccuracyMetrics::default();
    }

    let h = horizon.min(n - 1);
    let (training, actual) = history.split_at(n - h);
    let predicted = predict(training, h);

    metrics(actual, &predicted)
}

/// MAPE, RMSE and R² of `predicted` against `actual`
///
/// Pairs beyond the shorter series are ignored. MAPE skips zero actuals;
/// a constant actual series gives R² = 0.
pub fn metrics(actual: &[f64], predicted: &[f64]) -> AccuracyMetrics {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return AccuracyMetrics::default();
    }
    let actual = &actual[..n];
    let predicted = &predicted[..n];

    let pct_errors: Vec<f64> = actual
        .iter()
        .zip(predicted)
        .filter(|(a, _)| **a != 0.0)
        .map(|(a, p)| ((a - p) / a).abs())
        .collect();
    let mape = if pct_errors.is_empty() {
        0.0
    } else {
        pct_errors.iter().sum::<f64>() / pct_errors.len() as f64 * 100.0
    };

    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let rmse = (ss_res / n as f64).sqrt();

    let actual_mean = actual.iter().sum::<f64>() / n as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - actual_mean).powi(2)).sum();
    let r2 = if ss_tot == 0.0 {
        0.0
    } else {
        1.0 - ss_res / ss_tot
    };

    AccuracyMetrics { mape, rmse, r2 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_history() {
        assert_eq!(evaluate(&[], 12), AccuracyMetrics::default());
        assert_eq!(evaluate(&[500.0], 12), AccuracyMetrics::default());
    }

    #[test]
    fn test_zero_horizon() {
        assert_eq!(evaluate(&[1.0, 2.0, 3.0], 0), AccuracyMetrics::default());
    }

    #[test]
    fn test_metrics_values() {
        let m = metrics(&[100.0, 200.0], &[110.0, 180.0]);
        // |10/100| = 0.1, |20/200| = 0.1
        assert!((m.mape - 10.0).abs() < 1e-9);
        // sqrt((100 + 400) / 2)
        assert!((m.rmse - 250.0_f64.sqrt()).abs() < 1e-9);
        // ss_tot = 5000, ss_res = 500
        assert!((m.r2 - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_mape_skips_zero_actuals() {
        let m = metrics(&[0.0, 100.0], &[50.0, 150.0]);
        assert!((m.mape - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_actuals_give_zero_r2() {
        let m = metrics(&[100.0, 100.0, 100.0], &[90.0, 100.0, 110.0]);
        assert_eq!(m.r2, 0.0);
        assert!(m.rmse > 0.0);
    }

    #[test]
    fn test_horizon_clamped_to_available_history() {
        // Two points: train on the first, compare against the second
        let m = evaluate(&[100.0, 200.0], 12);
        // Single training point projects flat at 100
        assert!((m.mape - 50.0).abs() < 1e-9);
        assert!((m.rmse - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_perfect_linear_backtest() {
        let history: Vec<f64> = (0..10).map(|i| 100.0 + 10.0 * i as f64).collect();
        let m = evaluate_with(&history, 3, |training, h| {
            let last = *training.last().unwrap();
            (1..=h).map(|i| last + 10.0 * i as f64).collect()
        });

        assert!(m.mape.abs() < 1e-9);
        assert!(m.rmse.abs() < 1e-9);
        assert!((m.r2 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_metrics_non_negative() {
        let history = vec![120.0, -40.0, 300.0, 0.0, 80.0, 95.0, -10.0];
        let m = evaluate(&history, 4);
        assert!(m.mape >= 0.0);
        assert!(m.rmse >= 0.0);
        assert!(m.r2 <= 1.0);
    }
}
