//! Historical data aggregation
//!
//! Collects the bounded history window, pending invoices with predicted
//! payment dates, and recurring items into one `ForecastInput`. This is the
//! validation boundary: malformed records fail here, before any modeling.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{PendingInvoice, PendingInvoiceRef, TransactionRecord};

use super::providers::TransactionHistoryProvider;
use super::recurring::RecurringDetector;
use super::rng::RandomSource;
use super::types::RecurringItem;

pub const DEFAULT_HISTORY_MONTHS: u32 = 24;
pub const DEFAULT_LATE_PROBABILITY: f64 = 0.3;
pub const DEFAULT_LATE_DAYS: u32 = 15;

/// Everything the cash-flow forecaster needs, fetched once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastInput {
    pub transactions: Vec<TransactionRecord>,
    pub pending_invoices: Vec<PendingInvoiceRef>,
    pub recurring_items: Vec<RecurringItem>,
    /// Last day of observed history
    pub as_of: NaiveDate,
}

impl ForecastInput {
    pub fn empty(as_of: NaiveDate) -> Self {
        Self {
            transactions: Vec::new(),
            pending_invoices: Vec::new(),
            recurring_items: Vec::new(),
            as_of,
        }
    }
}

/// Predicts when an invoice will actually be settled
///
/// Each invoice is paid on its due date, or `late_days` later with
/// probability `late_probability`, using the injected generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaymentDatePredictor {
    pub late_probability: f64,
    pub late_days: u32,
}

impl Default for PaymentDatePredictor {
    fn default() -> Self {
        Self {
            late_probability: DEFAULT_LATE_PROBABILITY,
            late_days: DEFAULT_LATE_DAYS,
        }
    }
}

impl PaymentDatePredictor {
    pub fn predict<R: RandomSource + ?Sized>(&self, due_date: NaiveDate, rng: &mut R) -> NaiveDate {
        if rng.next_f64() < self.late_probability {
            due_date + chrono::Duration::days(self.late_days as i64)
        } else {
            due_date
        }
    }
}

/// Builds `ForecastInput` from a history provider
#[derive(Debug, Clone)]
pub struct HistoricalDataAggregator {
    history_months: u32,
    predictor: PaymentDatePredictor,
    detector: RecurringDetector,
}

impl Default for HistoricalDataAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_MONTHS)
    }
}

impl HistoricalDataAggregator {
    pub fn new(history_months: u32) -> Self {
        Self {
            history_months,
            predictor: PaymentDatePredictor::default(),
            detector: RecurringDetector::new(),
        }
    }

    pub fn with_predictor(mut self, predictor: PaymentDatePredictor) -> Self {
        self.predictor = predictor;
        self
    }

    pub fn with_detector(mut self, detector: RecurringDetector) -> Self {
        self.detector = detector;
        self
    }

    /// First day of the history window ending at `as_of`
    ///
    /// The window covers `history_months` whole calendar months, the last
    /// being the month of `as_of`, so the first month is never partial.
    pub fn window_start(&self, as_of: NaiveDate) -> NaiveDate {
        as_of
            .with_day(1)
            .and_then(|first| {
                first.checked_sub_months(Months::new(self.history_months.saturating_sub(1)))
            })
            .unwrap_or(NaiveDate::MIN)
    }

    /// Fetch and assemble the forecast input for `as_of`
    pub async fn aggregate<P, R>(
        &self,
        provider: &P,
        as_of: NaiveDate,
        rng: &mut R,
    ) -> Result<ForecastInput>
    where
        P: TransactionHistoryProvider + ?Sized,
        R: RandomSource + Send + ?Sized,
    {
        let start = self.window_start(as_of);
        let transactions = provider.transactions_between(start, as_of).await?;
        let invoices = provider.pending_invoices().await?;

        debug!(
            %start,
            %as_of,
            transactions = transactions.len(),
            invoices = invoices.len(),
            "Fetched forecast history"
        );

        self.assemble(transactions, &invoices, as_of, rng)
    }

    /// Validate fetched records and derive the forecast input
    pub fn assemble<R: RandomSource + ?Sized>(
        &self,
        transactions: Vec<TransactionRecord>,
        invoices: &[PendingInvoice],
        as_of: NaiveDate,
        rng: &mut R,
    ) -> Result<ForecastInput> {
        for tx in &transactions {
            validate_transaction(tx, as_of)?;
        }
        for invoice in invoices {
            validate_invoice(invoice)?;
        }

        let recurring_items = self.detector.detect(&transactions);
        let pending_invoices: Vec<PendingInvoiceRef> = invoices
            .iter()
            .map(|inv| PendingInvoiceRef {
                amount: inv.amount,
                kind: inv.kind,
                due_date: inv.due_date,
                predicted_payment_date: self.predictor.predict(inv.due_date, rng),
            })
            .collect();

        info!(
            transactions = transactions.len(),
            pending_invoices = pending_invoices.len(),
            recurring = recurring_items.len(),
            "Forecast input aggregated"
        );

        Ok(ForecastInput {
            transactions,
            pending_invoices,
            recurring_items,
            as_of,
        })
    }
}

fn validate_amount(amount: f64, what: &str) -> Result<()> {
    if !amount.is_finite() {
        return Err(Error::InvalidData(format!(
            "{} has a non-numeric amount: {}",
            what, amount
        )));
    }
    if amount < 0.0 {
        return Err(Error::InvalidData(format!(
            "{} has a negative amount: {}",
            what, amount
        )));
    }
    Ok(())
}

fn validate_transaction(tx: &TransactionRecord, as_of: NaiveDate) -> Result<()> {
    let what = format!("Transaction '{}' on {}", tx.description, tx.date);
    validate_amount(tx.amount, &what)?;
    if tx.date > as_of {
        return Err(Error::InvalidData(format!(
            "{} is dated after the forecast date {}",
            what, as_of
        )));
    }
    Ok(())
}

fn validate_invoice(invoice: &PendingInvoice) -> Result<()> {
    validate_amount(invoice.amount, &format!("Invoice {}", invoice.number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::cashflow::net_monthly_series;
    use crate::forecast::rng::SeededRng;
    use crate::models::TransactionKind;
    use async_trait::async_trait;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn invoice(number: &str, amount: f64, due: NaiveDate) -> PendingInvoice {
        PendingInvoice {
            id: 1,
            number: number.to_string(),
            counterparty: None,
            amount,
            kind: TransactionKind::Income,
            due_date: due,
        }
    }

    /// Uniform source returning a fixed value
    struct Fixed(f64);

    impl RandomSource for Fixed {
        fn next_f64(&mut self) -> f64 {
            self.0
        }

        fn normal(&mut self, mean: f64, _std_dev: f64) -> f64 {
            mean
        }
    }

    struct StaticHistory {
        transactions: Vec<TransactionRecord>,
        invoices: Vec<PendingInvoice>,
    }

    #[async_trait]
    impl TransactionHistoryProvider for StaticHistory {
        async fn transactions_between(
            &self,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<TransactionRecord>> {
            Ok(self
                .transactions
                .iter()
                .filter(|t| t.date >= start && t.date <= end)
                .cloned()
                .collect())
        }

        async fn pending_invoices(&self) -> Result<Vec<PendingInvoice>> {
            Ok(self.invoices.clone())
        }
    }

    #[test]
    fn test_payment_predictor() {
        let predictor = PaymentDatePredictor::default();
        let due = date(2024, 5, 1);

        assert_eq!(predictor.predict(due, &mut Fixed(0.9)), due);
        assert_eq!(predictor.predict(due, &mut Fixed(0.1)), date(2024, 5, 16));
    }

    #[test]
    fn test_payment_predictor_late_rate() {
        let predictor = PaymentDatePredictor::default();
        let due = date(2024, 5, 1);
        let mut rng = SeededRng::new(2024);

        let late = (0..10_000)
            .filter(|_| predictor.predict(due, &mut rng) != due)
            .count();
        let rate = late as f64 / 10_000.0;
        assert!((rate - 0.3).abs() < 0.02, "late rate was {}", rate);
    }

    #[test]
    fn test_window_start() {
        let aggregator = HistoricalDataAggregator::new(12);
        assert_eq!(aggregator.window_start(date(2024, 6, 30)), date(2023, 7, 1));
        assert_eq!(aggregator.window_start(date(2024, 6, 25)), date(2023, 7, 1));
        assert_eq!(aggregator.window_start(date(2024, 1, 1)), date(2023, 2, 1));
        assert_eq!(
            HistoricalDataAggregator::new(1).window_start(date(2024, 3, 31)),
            date(2024, 3, 1)
        );
    }

    #[tokio::test]
    async fn test_window_has_no_partial_first_month() {
        // +9000 on the 3rd and -5200 on the 25th, every month from 2023-01
        let mut transactions = Vec::new();
        for offset in 0..18 {
            let (y, m) = crate::forecast::trend::add_months(2023, 1, offset);
            transactions.push(TransactionRecord::new(date(y, m, 3), 9000.0, TransactionKind::Income, "Retainer"));
            transactions.push(TransactionRecord::new(date(y, m, 25), 5200.0, TransactionKind::Expense, "Payroll"));
        }
        let provider = StaticHistory {
            transactions,
            invoices: vec![],
        };

        let input = HistoricalDataAggregator::new(12)
            .aggregate(&provider, date(2024, 6, 25), &mut Fixed(0.5))
            .await
            .unwrap();

        let series = net_monthly_series(&input.transactions);
        assert_eq!(series.len(), 12);
        assert_eq!(series[0].date, date(2023, 7, 1));
        assert!(series.iter().all(|p| p.amount == 3800.0));
    }

    #[test]
    fn test_rejects_negative_amount() {
        let tx = TransactionRecord {
            date: date(2024, 1, 1),
            amount: -5.0,
            kind: TransactionKind::Expense,
            description: "Refund".into(),
            counterparty: None,
        };
        let err = HistoricalDataAggregator::default()
            .assemble(vec![tx], &[], date(2024, 2, 1), &mut Fixed(0.5))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn test_rejects_non_finite_invoice() {
        let err = HistoricalDataAggregator::default()
            .assemble(
                vec![],
                &[invoice("INV-9", f64::NAN, date(2024, 3, 1))],
                date(2024, 2, 1),
                &mut Fixed(0.5),
            )
            .unwrap_err();
        assert!(err.to_string().contains("INV-9"));
    }

    #[test]
    fn test_rejects_future_transaction() {
        let tx = TransactionRecord::new(date(2024, 3, 1), 10.0, TransactionKind::Income, "Early");
        assert!(HistoricalDataAggregator::default()
            .assemble(vec![tx], &[], date(2024, 2, 1), &mut Fixed(0.5))
            .is_err());
    }

    #[tokio::test]
    async fn test_aggregate_from_provider() {
        let rent: Vec<TransactionRecord> = (0..4)
            .map(|i| {
                TransactionRecord::new(
                    date(2024, 1, 1) + chrono::Duration::days(30 * i),
                    700.0,
                    TransactionKind::Expense,
                    "Rent",
                )
            })
            .collect();
        let mut transactions = rent.clone();
        // Outside the 12 month window
        transactions.push(TransactionRecord::new(
            date(2022, 1, 1),
            50.0,
            TransactionKind::Expense,
            "Old",
        ));

        let provider = StaticHistory {
            transactions,
            invoices: vec![invoice("INV-1", 1200.0, date(2024, 5, 15))],
        };

        let input = HistoricalDataAggregator::new(12)
            .aggregate(&provider, date(2024, 4, 30), &mut Fixed(0.99))
            .await
            .unwrap();

        assert_eq!(input.transactions, rent);
        assert_eq!(input.recurring_items.len(), 1);
        assert_eq!(input.pending_invoices.len(), 1);
        assert_eq!(
            input.pending_invoices[0].predicted_payment_date,
            date(2024, 5, 15)
        );
    }
}
