//! Trend and seasonal modeling
//!
//! Shared by the cash-flow forecaster and the enhanced pipeline:
//! - `historical_average` - annualized same-month average for one kind
//! - `monthly_total_average` - same-month total for one kind, averaged over years
//! - `trend_factor` - recent vs preceding 3-period average
//! - `seasonal_patterns` - 12-entry monthly multiplier table
//! - `generate_forecast` - linear trend projection of a series

use std::collections::BTreeMap;

use chrono::{Datelike, Month, NaiveDate};

use crate::models::{HistoricalPoint, TransactionKind, TransactionRecord};

use super::types::SeasonalPattern;

/// Window length used by `trend_factor`
const TREND_WINDOW: usize = 3;

/// Samples per month at which a seasonal multiplier is fully trusted
const SEASONAL_FULL_CONFIDENCE_SAMPLES: f64 = 3.0;

/// Annualized average amount of same-calendar-month transactions of a kind
///
/// Returns 0 when no transaction matches.
pub fn historical_average(
    records: &[TransactionRecord],
    target_month: u32,
    kind: TransactionKind,
) -> f64 {
    let amounts: Vec<f64> = records
        .iter()
        .filter(|r| r.kind == kind && r.date.month() == target_month)
        .map(|r| r.amount)
        .collect();

    if amounts.is_empty() {
        return 0.0;
    }

    amounts.iter().sum::<f64>() / amounts.len() as f64 * 12.0
}

/// Mean calendar-month total of one kind for a month of the year
///
/// Each observed year's month is summed first, then the totals are averaged
/// across years. Returns 0 when no transaction matches.
pub fn monthly_total_average(
    records: &[TransactionRecord],
    target_month: u32,
    kind: TransactionKind,
) -> f64 {
    let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
    for record in records
        .iter()
        .filter(|r| r.kind == kind && r.date.month() == target_month)
    {
        *totals.entry(record.date.year()).or_insert(0.0) += record.amount;
    }

    if totals.is_empty() {
        return 0.0;
    }

    totals.values().sum::<f64>() / totals.len() as f64
}

/// Ratio of the 3 most recent amounts' mean to the mean of the 3 before them
///
/// Neutral (1.0) with fewer than 6 data points or a zero denominator.
pub fn trend_factor(records: &[TransactionRecord], kind: TransactionKind) -> f64 {
    let mut matching: Vec<&TransactionRecord> = records.iter().filter(|r| r.kind == kind).collect();
    if matching.len() < TREND_WINDOW * 2 {
        return 1.0;
    }

    matching.sort_by_key(|r| r.date);
    let n = matching.len();
    let window_mean = |slice: &[&TransactionRecord]| {
        slice.iter().map(|r| r.amount).sum::<f64>() / slice.len() as f64
    };

    let recent = window_mean(&matching[n - TREND_WINDOW..]);
    let previous = window_mean(&matching[n - TREND_WINDOW * 2..n - TREND_WINDOW]);

    if previous == 0.0 {
        return 1.0;
    }

    recent / previous
}

/// Monthly multiplier table over an already-scoped set of points
///
/// Always returns 12 entries (January first). Months without samples fall
/// back to the overall average (multiplier 1, confidence 0).
pub fn seasonal_patterns(points: &[HistoricalPoint]) -> Vec<SeasonalPattern> {
    let mut sums = [0.0_f64; 12];
    let mut counts = [0_usize; 12];
    for point in points {
        let idx = point.date.month0() as usize;
        sums[idx] += point.amount;
        counts[idx] += 1;
    }

    let overall = if points.is_empty() {
        0.0
    } else {
        points.iter().map(|p| p.amount).sum::<f64>() / points.len() as f64
    };

    (0..12)
        .map(|idx| {
            let month = idx as u32 + 1;
            let count = counts[idx];

            let multiplier = if count == 0 || overall == 0.0 {
                1.0
            } else {
                (sums[idx] / count as f64 / overall).max(0.0)
            };
            let confidence = (count as f64 / SEASONAL_FULL_CONFIDENCE_SAMPLES).min(1.0);

            SeasonalPattern {
                month,
                multiplier,
                confidence,
                label: seasonal_label(month, multiplier, count),
            }
        })
        .collect()
}

fn seasonal_label(month: u32, multiplier: f64, samples: usize) -> String {
    let name = Month::try_from(month as u8)
        .map(|m| m.name())
        .unwrap_or("Unknown");

    let descriptor = if samples == 0 {
        "no data"
    } else if multiplier > 1.1 {
        "peak"
    } else if multiplier < 0.9 {
        "trough"
    } else {
        "typical"
    };

    format!("{} ({})", name, descriptor)
}

/// Seasonal multiplier for a month, blended toward 1 by its confidence
pub fn blended_multiplier(patterns: &[SeasonalPattern], month: u32) -> f64 {
    patterns
        .iter()
        .find(|p| p.month == month)
        .map(|p| 1.0 + (p.multiplier - 1.0) * p.confidence)
        .unwrap_or(1.0)
}

/// Linear trend forecast of a dated series
///
/// `forecast[i] = mean + slope * (i + 1)` where `slope` is the average step
/// between the first and last observation. Empty input yields zeros.
pub fn generate_forecast(points: &[HistoricalPoint], horizon: usize) -> Vec<f64> {
    let mut sorted: Vec<&HistoricalPoint> = points.iter().collect();
    sorted.sort_by_key(|p| p.date);
    let values: Vec<f64> = sorted.iter().map(|p| p.amount).collect();

    linear_projection(&values, horizon)
}

/// Linear trend projection of an ordered value series
pub fn linear_projection(values: &[f64], horizon: usize) -> Vec<f64> {
    if values.is_empty() {
        return vec![0.0; horizon];
    }

    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let slope = if n < 2 {
        0.0
    } else {
        (values[n - 1] - values[0]) / (n - 1) as f64
    };

    (0..horizon)
        .map(|i| mean + slope * (i as f64 + 1.0))
        .collect()
}

/// Sum points into calendar months, filling gaps with zero-valued months
///
/// Each output point is dated on the first of its month.
pub fn monthly_totals(points: &[HistoricalPoint]) -> Vec<HistoricalPoint> {
    let mut by_month: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for point in points {
        *by_month
            .entry((point.date.year(), point.date.month()))
            .or_insert(0.0) += point.amount;
    }

    let (Some(&first), Some(&last)) = (by_month.keys().next(), by_month.keys().next_back()) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let (mut year, mut month) = first;
    while (year, month) <= last {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, 1) {
            let amount = by_month.get(&(year, month)).copied().unwrap_or(0.0);
            out.push(HistoricalPoint::new(date, amount));
        }
        (year, month) = next_month(year, month);
    }

    out
}

/// Calendar month `offset` months after the given one
pub fn add_months(year: i32, month: u32, offset: u32) -> (i32, u32) {
    let total = month - 1 + offset;
    (year + (total / 12) as i32, total % 12 + 1)
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    add_months(year, month, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense(d: NaiveDate, amount: f64) -> TransactionRecord {
        TransactionRecord::new(d, amount, TransactionKind::Expense, "Supplies")
    }

    #[test]
    fn test_empty_history_forecast_is_zero() {
        assert_eq!(generate_forecast(&[], 6), vec![0.0; 6]);
    }

    #[test]
    fn test_linear_trend_two_points() {
        let points = vec![
            HistoricalPoint::new(date(2024, 1, 1), 100.0),
            HistoricalPoint::new(date(2024, 2, 1), 200.0),
        ];
        assert_eq!(generate_forecast(&points, 3), vec![250.0, 350.0, 450.0]);
    }

    #[test]
    fn test_forecast_sorts_by_date() {
        let points = vec![
            HistoricalPoint::new(date(2024, 2, 1), 200.0),
            HistoricalPoint::new(date(2024, 1, 1), 100.0),
        ];
        assert_eq!(generate_forecast(&points, 1), vec![250.0]);
    }

    #[test]
    fn test_forecast_length_matches_horizon() {
        let points = vec![HistoricalPoint::new(date(2024, 1, 1), 42.0)];
        for h in 1..=24 {
            let f = generate_forecast(&points, h);
            assert_eq!(f.len(), h);
            // Single point: flat at the mean
            assert!(f.iter().all(|v| *v == 42.0));
        }
    }

    #[test]
    fn test_historical_average_annualized() {
        let records = vec![
            expense(date(2023, 3, 5), 100.0),
            expense(date(2024, 3, 9), 300.0),
            expense(date(2024, 4, 1), 999.0),
            TransactionRecord::new(date(2024, 3, 1), 5000.0, TransactionKind::Income, "Sale"),
        ];

        assert_eq!(historical_average(&records, 3, TransactionKind::Expense), 2400.0);
        assert_eq!(historical_average(&records, 7, TransactionKind::Expense), 0.0);
    }

    #[test]
    fn test_monthly_total_average_sums_within_month() {
        let records = vec![
            expense(date(2023, 3, 5), 2100.0),
            expense(date(2023, 3, 25), 5200.0),
            expense(date(2024, 3, 5), 2100.0),
            expense(date(2024, 3, 12), 89.0),
            expense(date(2024, 3, 25), 5200.0),
            expense(date(2024, 4, 5), 2100.0),
        ];

        // (7300 + 7389) / 2
        assert_eq!(monthly_total_average(&records, 3, TransactionKind::Expense), 7344.5);
        assert_eq!(monthly_total_average(&records, 4, TransactionKind::Expense), 2100.0);
        assert_eq!(monthly_total_average(&records, 3, TransactionKind::Income), 0.0);
    }

    #[test]
    fn test_trend_factor_requires_six_points() {
        let records: Vec<_> = (1..=5).map(|m| expense(date(2024, m, 1), m as f64)).collect();
        assert_eq!(trend_factor(&records, TransactionKind::Expense), 1.0);
    }

    #[test]
    fn test_trend_factor_ratio() {
        let amounts = [100.0, 100.0, 100.0, 150.0, 150.0, 150.0];
        let records: Vec<_> = amounts
            .iter()
            .enumerate()
            .map(|(i, a)| expense(date(2024, i as u32 + 1, 1), *a))
            .collect();

        assert!((trend_factor(&records, TransactionKind::Expense) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_trend_factor_zero_denominator() {
        let amounts = [0.0, 0.0, 0.0, 10.0, 10.0, 10.0];
        let records: Vec<_> = amounts
            .iter()
            .enumerate()
            .map(|(i, a)| expense(date(2024, i as u32 + 1, 1), *a))
            .collect();

        assert_eq!(trend_factor(&records, TransactionKind::Expense), 1.0);
    }

    #[test]
    fn test_seasonal_patterns_always_twelve() {
        let empty = seasonal_patterns(&[]);
        assert_eq!(empty.len(), 12);
        assert!(empty.iter().all(|p| p.multiplier == 1.0 && p.confidence == 0.0));

        let points = vec![
            HistoricalPoint::new(date(2024, 12, 1), 300.0),
            HistoricalPoint::new(date(2024, 6, 1), 100.0),
        ];
        let patterns = seasonal_patterns(&points);
        assert_eq!(patterns.len(), 12);
        assert_eq!(patterns[0].month, 1);
        assert_eq!(patterns[11].month, 12);
        assert!((patterns[11].multiplier - 1.5).abs() < 1e-12);
        assert!((patterns[5].multiplier - 0.5).abs() < 1e-12);
        assert!((patterns[11].confidence - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(patterns[11].label, "December (peak)");
        assert_eq!(patterns[0].label, "January (no data)");
    }

    #[test]
    fn test_seasonal_multipliers_non_negative() {
        let points: Vec<_> = (1..=12)
            .map(|m| HistoricalPoint::new(date(2024, m, 1), (m * 37 % 11) as f64))
            .collect();
        assert!(seasonal_patterns(&points).iter().all(|p| p.multiplier >= 0.0));
    }

    #[test]
    fn test_blended_multiplier() {
        let patterns = vec![SeasonalPattern {
            month: 12,
            multiplier: 2.0,
            confidence: 0.5,
            label: String::new(),
        }];
        assert_eq!(blended_multiplier(&patterns, 12), 1.5);
        assert_eq!(blended_multiplier(&patterns, 1), 1.0);
    }

    #[test]
    fn test_monthly_totals_fills_gaps() {
        let points = vec![
            HistoricalPoint::new(date(2023, 11, 3), 10.0),
            HistoricalPoint::new(date(2023, 11, 20), 5.0),
            HistoricalPoint::new(date(2024, 2, 14), 7.0),
        ];
        let totals = monthly_totals(&points);

        assert_eq!(totals.len(), 4);
        assert_eq!(totals[0], HistoricalPoint::new(date(2023, 11, 1), 15.0));
        assert_eq!(totals[1].amount, 0.0);
        assert_eq!(totals[2].date, date(2024, 1, 1));
        assert_eq!(totals[3].amount, 7.0);
    }

    #[test]
    fn test_add_months_wraps_year() {
        assert_eq!(add_months(2024, 11, 3), (2025, 2));
        assert_eq!(add_months(2024, 1, 0), (2024, 1));
        assert_eq!(add_months(2024, 12, 12), (2025, 12));
    }
}
