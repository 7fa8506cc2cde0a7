//! Cash-flow forecasting
//!
//! Projects income and expense separately for each future calendar month
//! and combines them into `ForecastPoint`s whose conservative and optimistic
//! bounds follow the scenario's risk level.
//!
//! A period's baseline is the month's total flow of a kind, averaged over
//! the years observed, so it lines up with `net_monthly_series`. Pending
//! invoices predicted to settle on or before the first forecast month are
//! all counted in that month.

use std::collections::BTreeSet;

use chrono::Datelike;
use tracing::debug;

use crate::models::{HistoricalPoint, ScenarioConfig, TransactionKind, TransactionRecord};

use super::aggregator::ForecastInput;
use super::trend::{
    add_months, blended_multiplier, monthly_total_average, monthly_totals, seasonal_patterns,
    trend_factor,
};
use super::types::{ForecastPoint, SeasonalPattern};

/// Per-step decay of period confidence
const CONFIDENCE_DECAY: f64 = 0.05;
/// Coverage below which a low-coverage risk is flagged
const LOW_COVERAGE: f64 = 0.5;
/// Share of period income from invoices above which concentration is flagged
const INVOICE_CONCENTRATION: f64 = 0.5;
/// Trend ratios closer to 1 than this are not reported as a factor
const TREND_REPORT_THRESHOLD: f64 = 0.01;

/// Per-kind model state derived once per forecast
struct KindModel {
    kind: TransactionKind,
    trend: f64,
    seasonal: Vec<SeasonalPattern>,
}

impl KindModel {
    fn fit(records: &[TransactionRecord], kind: TransactionKind) -> Self {
        let points: Vec<HistoricalPoint> = records
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.to_point())
            .collect();

        Self {
            kind,
            trend: trend_factor(records, kind),
            seasonal: seasonal_patterns(&monthly_totals(&points)),
        }
    }
}

/// Projects per-period income/expense flows
#[derive(Debug, Clone, Default)]
pub struct CashFlowForecaster;

impl CashFlowForecaster {
    pub fn new() -> Self {
        Self
    }

    /// Forecast `horizon` calendar months following `input.as_of`
    pub fn forecast(
        &self,
        input: &ForecastInput,
        scenario: &ScenarioConfig,
        horizon: usize,
    ) -> Vec<ForecastPoint> {
        let records = scale_history(&input.transactions, scenario);
        let income_model = KindModel::fit(&records, TransactionKind::Income);
        let expense_model = KindModel::fit(&records, TransactionKind::Expense);
        let coverage = history_coverage(&records);
        let (lo, hi) = scenario.risk_level.multipliers();

        let points: Vec<ForecastPoint> = (0..horizon)
            .map(|i| {
                let (year, month) = add_months(input.as_of.year(), input.as_of.month(), i as u32 + 1);
                let mut point_factors = Vec::new();

                let income = self.project_kind(
                    &records,
                    input,
                    scenario,
                    &income_model,
                    month,
                    &mut point_factors,
                );
                let expense = self.project_kind(
                    &records,
                    input,
                    scenario,
                    &expense_model,
                    month,
                    &mut point_factors,
                );

                let invoices = invoices_in_period(input, i, year, month);
                let income = income + invoices.income;
                let expense = expense + invoices.expense;
                if invoices.count > 0 {
                    point_factors.push(format!("invoices: {} expected", invoices.count));
                }

                let predicted = income - expense;
                let mut point = ForecastPoint::new(i, predicted)
                    .with_bounds(income * lo - expense * hi, income * hi - expense * lo)
                    .with_confidence(coverage * (1.0 - CONFIDENCE_DECAY * i as f64));
                for factor in point_factors {
                    point = point.with_factor(factor);
                }

                if predicted < 0.0 {
                    point = point.with_risk("net cash outflow");
                }
                if coverage < LOW_COVERAGE {
                    point = point.with_risk(format!(
                        "low data coverage ({:.0}% of a year)",
                        coverage * 100.0
                    ));
                }
                if income > 0.0 && invoices.income / income > INVOICE_CONCENTRATION {
                    point = point.with_risk("income concentrated in pending invoices");
                }
                if invoices.overdue > 0 {
                    point = point.with_risk(format!(
                        "overdue invoices: {} predicted to settle by {}",
                        invoices.overdue, input.as_of
                    ));
                }

                point
            })
            .collect();

        debug!(
            scenario = %scenario.id,
            horizon,
            coverage,
            "Cash-flow forecast complete"
        );

        points
    }

    fn project_kind(
        &self,
        records: &[TransactionRecord],
        input: &ForecastInput,
        scenario: &ScenarioConfig,
        model: &KindModel,
        month: u32,
        factors: &mut Vec<String>,
    ) -> f64 {
        let kind = model.kind;
        let baseline = monthly_total_average(records, month, kind);

        if baseline > 0.0 {
            let seasonal = blended_multiplier(&model.seasonal, month);
            if (model.trend - 1.0).abs() > TREND_REPORT_THRESHOLD {
                factors.push(format!("{} trend x{:.2}", kind, model.trend));
            }
            if let Some(pattern) = model.seasonal.iter().find(|p| p.month == month) {
                if (seasonal - 1.0).abs() > f64::EPSILON {
                    factors.push(format!("{} seasonality: {}", kind, pattern.label));
                }
            }
            return baseline * model.trend * seasonal;
        }

        // No same-month history: fall back to recurring items
        let scale = kind_scale(kind, scenario);
        let recurring: Vec<f64> = input
            .recurring_items
            .iter()
            .filter(|item| item.kind == kind)
            .map(|item| item.monthly_amount() * scale)
            .collect();

        if recurring.is_empty() {
            return 0.0;
        }

        factors.push(format!("{} recurring items: {}", kind, recurring.len()));
        recurring.iter().sum()
    }
}

/// Growth/inflation pre-scale for a kind
fn kind_scale(kind: TransactionKind, scenario: &ScenarioConfig) -> f64 {
    match kind {
        TransactionKind::Income => 1.0 + scenario.revenue_growth_pct / 100.0,
        TransactionKind::Expense => 1.0 + scenario.cost_inflation_pct / 100.0,
    }
}

/// Apply scenario growth and inflation to historical amounts
fn scale_history(records: &[TransactionRecord], scenario: &ScenarioConfig) -> Vec<TransactionRecord> {
    records
        .iter()
        .map(|r| {
            let mut scaled = r.clone();
            scaled.amount = r.amount * kind_scale(r.kind, scenario);
            scaled
        })
        .collect()
}

/// Distinct history months over a year, capped at 1
fn history_coverage(records: &[TransactionRecord]) -> f64 {
    let months: BTreeSet<(i32, u32)> = records
        .iter()
        .map(|r| (r.date.year(), r.date.month()))
        .collect();
    (months.len() as f64 / 12.0).min(1.0)
}

/// Pending invoices attributed to one forecast period
#[derive(Debug, Default)]
struct PeriodInvoices {
    income: f64,
    expense: f64,
    count: usize,
    /// Invoices whose predicted payment date is on or before `as_of`
    overdue: usize,
}

/// Invoices predicted to settle in a period
///
/// Period 0 also takes every invoice predicted before it, including those
/// already past due.
fn invoices_in_period(
    input: &ForecastInput,
    period_index: usize,
    year: i32,
    month: u32,
) -> PeriodInvoices {
    let mut out = PeriodInvoices::default();

    for inv in &input.pending_invoices {
        let paid = (
            inv.predicted_payment_date.year(),
            inv.predicted_payment_date.month(),
        );
        let lands = if period_index == 0 {
            paid <= (year, month)
        } else {
            paid == (year, month)
        };
        if !lands {
            continue;
        }

        match inv.kind {
            TransactionKind::Income => out.income += inv.amount,
            TransactionKind::Expense => out.expense += inv.amount,
        }
        out.count += 1;
        if inv.predicted_payment_date <= input.as_of {
            out.overdue += 1;
        }
    }

    out
}

/// Net signed monthly series of the history, gaps filled with zero
pub fn net_monthly_series(records: &[TransactionRecord]) -> Vec<HistoricalPoint> {
    let signed: Vec<HistoricalPoint> = records
        .iter()
        .map(|r| HistoricalPoint::new(r.date, r.signed_amount()))
        .collect();
    monthly_totals(&signed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::types::{Cadence, RecurringItem, Signature};
    use crate::models::{PendingInvoiceRef, RiskLevel};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(y: i32, m: u32, amount: f64, kind: TransactionKind) -> TransactionRecord {
        TransactionRecord::new(date(y, m, 10), amount, kind, "Flow")
    }

    /// A flat year: income 1000 and expense 600 every month of 2023
    fn flat_year() -> ForecastInput {
        let mut transactions = Vec::new();
        for m in 1..=12 {
            transactions.push(tx(2023, m, 1000.0, TransactionKind::Income));
            transactions.push(tx(2023, m, 600.0, TransactionKind::Expense));
        }
        ForecastInput {
            transactions,
            pending_invoices: vec![],
            recurring_items: vec![],
            as_of: date(2023, 12, 31),
        }
    }

    #[test]
    fn test_empty_history_zero_forecast() {
        let input = ForecastInput::empty(date(2024, 1, 31));
        let points = CashFlowForecaster::new().forecast(&input, &ScenarioConfig::default(), 6);

        assert_eq!(points.len(), 6);
        assert!(points
            .iter()
            .all(|p| p.predicted == 0.0 && p.confidence == 0.0));
    }

    #[test]
    fn test_flat_year_projection() {
        let points = CashFlowForecaster::new().forecast(&flat_year(), &ScenarioConfig::default(), 3);

        for (i, p) in points.iter().enumerate() {
            assert_eq!(p.period_index, i);
            assert!((p.predicted - 400.0).abs() < 1e-9);
            // medium: 1000*0.85 - 600*1.15 and 1000*1.15 - 600*0.85
            assert!((p.conservative - 160.0).abs() < 1e-9);
            assert!((p.optimistic - 640.0).abs() < 1e-9);
            assert!(p.risks.is_empty());
        }
        assert_eq!(points[0].confidence, 1.0);
        assert!((points[2].confidence - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_risk_level_widens_bounds() {
        let input = flat_year();
        let forecaster = CashFlowForecaster::new();
        let low = forecaster.forecast(&input, &ScenarioConfig::new("low").with_risk_level(RiskLevel::Low), 1);
        let high = forecaster.forecast(&input, &ScenarioConfig::new("high").with_risk_level(RiskLevel::High), 1);

        assert!(high[0].conservative < low[0].conservative);
        assert!(high[0].optimistic > low[0].optimistic);
        assert_eq!(high[0].predicted, low[0].predicted);
    }

    #[test]
    fn test_growth_and_inflation_prescale() {
        let scenario = ScenarioConfig::new("growth")
            .with_revenue_growth(10.0)
            .with_cost_inflation(50.0);
        let points = CashFlowForecaster::new().forecast(&flat_year(), &scenario, 1);

        // 1100 - 900
        assert!((points[0].predicted - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_invoices_land_in_predicted_month() {
        let mut input = flat_year();
        input.pending_invoices.push(PendingInvoiceRef {
            amount: 5000.0,
            kind: TransactionKind::Income,
            due_date: date(2024, 1, 20),
            predicted_payment_date: date(2024, 2, 4),
        });

        let points = CashFlowForecaster::new().forecast(&input, &ScenarioConfig::default(), 3);
        assert!((points[0].predicted - 400.0).abs() < 1e-9);
        assert!((points[1].predicted - 5400.0).abs() < 1e-9);
        assert!(points[1].factors.iter().any(|f| f.starts_with("invoices")));
        assert!(points[1]
            .risks
            .iter()
            .any(|r| r.contains("concentrated")));
    }

    #[test]
    fn test_several_transactions_per_month_use_monthly_totals() {
        let mut transactions = Vec::new();
        for m in 1..=12 {
            transactions.push(TransactionRecord::new(date(2023, m, 3), 1000.0, TransactionKind::Income, "Retainer"));
            transactions.push(TransactionRecord::new(date(2023, m, 17), 1000.0, TransactionKind::Income, "Retainer"));
            transactions.push(TransactionRecord::new(date(2023, m, 5), 2100.0, TransactionKind::Expense, "Rent"));
            transactions.push(TransactionRecord::new(date(2023, m, 12), 89.0, TransactionKind::Expense, "Tools"));
            transactions.push(TransactionRecord::new(date(2023, m, 25), 5200.0, TransactionKind::Expense, "Payroll"));
        }
        let history_net = net_monthly_series(&transactions)
            .last()
            .map(|p| p.amount)
            .unwrap();
        let input = ForecastInput {
            transactions,
            pending_invoices: vec![],
            recurring_items: vec![],
            as_of: date(2023, 12, 31),
        };

        let points = CashFlowForecaster::new().forecast(&input, &ScenarioConfig::default(), 1);

        assert!((history_net + 5389.0).abs() < 1e-9);
        assert!((points[0].predicted - history_net).abs() < 1e-9);
        // medium: 2000*0.85 - 7389*1.15
        assert!((points[0].conservative - (1700.0 - 8497.35)).abs() < 1e-6);
    }

    #[test]
    fn test_overdue_invoices_land_in_first_period() {
        let mut input = ForecastInput::empty(date(2024, 3, 31));
        input.pending_invoices = vec![
            PendingInvoiceRef {
                amount: 12000.0,
                kind: TransactionKind::Income,
                due_date: date(2024, 3, 10),
                predicted_payment_date: date(2024, 3, 25),
            },
            PendingInvoiceRef {
                amount: 800.0,
                kind: TransactionKind::Expense,
                due_date: date(2023, 11, 1),
                predicted_payment_date: date(2023, 11, 1),
            },
            PendingInvoiceRef {
                amount: 500.0,
                kind: TransactionKind::Income,
                due_date: date(2024, 4, 20),
                predicted_payment_date: date(2024, 4, 20),
            },
        ];

        let points = CashFlowForecaster::new().forecast(&input, &ScenarioConfig::default(), 12);

        assert!((points[0].predicted - 11700.0).abs() < 1e-9);
        assert!(points[0].factors.iter().any(|f| f == "invoices: 3 expected"));
        assert!(points[0].risks.iter().any(|r| r.starts_with("overdue invoices: 2")));
        assert!(points[1..].iter().all(|p| p.predicted == 0.0));
        let total: f64 = points.iter().map(|p| p.predicted).sum();
        assert!((total - 11700.0).abs() < 1e-9);
    }

    #[test]
    fn test_recurring_items_fill_missing_months() {
        let input = ForecastInput {
            transactions: vec![tx(2023, 6, 100.0, TransactionKind::Expense)],
            pending_invoices: vec![],
            recurring_items: vec![RecurringItem {
                signature: Signature {
                    description: "payroll".into(),
                    amount_band: 5,
                    kind: TransactionKind::Expense,
                },
                average_amount: 500.0,
                interval_days: 7.0,
                cadence: Cadence::Weekly,
                kind: TransactionKind::Expense,
                last_occurrence: date(2023, 6, 24),
                occurrences: 4,
                confidence: 4.0 / 12.0,
            }],
            as_of: date(2023, 6, 30),
        };

        let points = CashFlowForecaster::new().forecast(&input, &ScenarioConfig::default(), 1);
        let expected = -500.0 * 52.0 / 12.0;
        assert!((points[0].predicted - expected).abs() < 1e-9);
        assert!(points[0].risks.iter().any(|r| r == "net cash outflow"));
        assert!(points[0].risks.iter().any(|r| r.contains("low data coverage")));
    }

    #[test]
    fn test_net_monthly_series() {
        let records = vec![
            tx(2023, 1, 1000.0, TransactionKind::Income),
            tx(2023, 1, 300.0, TransactionKind::Expense),
            tx(2023, 3, 200.0, TransactionKind::Expense),
        ];
        let series = net_monthly_series(&records);

        assert_eq!(series.len(), 3);
        assert_eq!(series[0].amount, 700.0);
        assert_eq!(series[1].amount, 0.0);
        assert_eq!(series[2].amount, -200.0);
    }
}
