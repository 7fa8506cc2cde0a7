//! Recurring pattern detection
//!
//! Groups transactions by a normalized signature (description, amount band,
//! kind) and keeps the groups whose spacing matches a weekly or monthly
//! cadence. A recurring item is characterized by:
//! 1. At least 3 occurrences of the same signature
//! 2. An average interval of 28-32 days (monthly) or 7-10 days (weekly)

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::models::TransactionRecord;

use super::types::{Cadence, RecurringItem, Signature};

/// Detection configuration
#[derive(Debug, Clone)]
pub struct RecurringConfig {
    /// Width of an amount band in currency units
    pub amount_band_width: f64,
    /// Minimum occurrences for a signature to be considered
    pub min_occurrences: usize,
    /// Inclusive average-interval range (days) accepted as monthly
    pub monthly_interval: (f64, f64),
    /// Inclusive average-interval range (days) accepted as weekly
    pub weekly_interval: (f64, f64),
    /// Occurrence count at which confidence saturates
    pub full_confidence_occurrences: f64,
}

impl Default for RecurringConfig {
    fn default() -> Self {
        Self {
            amount_band_width: 100.0,
            min_occurrences: 3,
            monthly_interval: (28.0, 32.0),
            weekly_interval: (7.0, 10.0),
            full_confidence_occurrences: 12.0,
        }
    }
}

/// Detects recurring income and expense items in a transaction set
#[derive(Debug, Clone, Default)]
pub struct RecurringDetector {
    config: RecurringConfig,
}

impl RecurringDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RecurringConfig) -> Self {
        Self { config }
    }

    /// Build the grouping signature for one transaction
    pub fn signature(&self, tx: &TransactionRecord) -> Signature {
        let band = if self.config.amount_band_width > 0.0 {
            (tx.amount.abs() / self.config.amount_band_width).floor() as i64
        } else {
            0
        };

        Signature {
            description: normalize_description(&tx.description),
            amount_band: band,
            kind: tx.kind,
        }
    }

    /// Classify periodic groups as recurring items
    ///
    /// The result is ordered by signature, so repeated runs over the same
    /// transactions return identical output. Input order does not matter.
    pub fn detect(&self, transactions: &[TransactionRecord]) -> Vec<RecurringItem> {
        let mut groups: BTreeMap<Signature, Vec<&TransactionRecord>> = BTreeMap::new();
        for tx in transactions {
            groups.entry(self.signature(tx)).or_default().push(tx);
        }

        let items: Vec<RecurringItem> = groups
            .into_iter()
            .filter_map(|(signature, txs)| self.classify_group(signature, txs))
            .collect();

        debug!(
            transactions = transactions.len(),
            recurring = items.len(),
            "Recurring detection complete"
        );

        items
    }

    fn classify_group(
        &self,
        signature: Signature,
        mut txs: Vec<&TransactionRecord>,
    ) -> Option<RecurringItem> {
        if txs.len() < self.config.min_occurrences.max(2) {
            return None;
        }

        txs.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.amount.total_cmp(&b.amount))
        });

        let intervals: Vec<i64> = txs
            .windows(2)
            .map(|w| (w[1].date - w[0].date).num_days())
            .collect();
        let avg_interval = intervals.iter().sum::<i64>() as f64 / intervals.len() as f64;

        let in_range = |(lo, hi): (f64, f64)| avg_interval >= lo && avg_interval <= hi;
        let cadence = if in_range(self.config.monthly_interval) {
            Cadence::Monthly
        } else if in_range(self.config.weekly_interval) {
            Cadence::Weekly
        } else {
            return None;
        };

        let occurrences = txs.len();
        let average_amount = txs.iter().map(|t| t.amount.abs()).sum::<f64>() / occurrences as f64;
        let last_occurrence = txs.last()?.date;
        let confidence = (occurrences as f64 / self.config.full_confidence_occurrences).min(1.0);

        debug!(
            signature = %signature,
            cadence = cadence.as_str(),
            avg_interval,
            "Found recurring item"
        );

        Some(RecurringItem {
            kind: signature.kind,
            signature,
            average_amount,
            interval_days: avg_interval,
            cadence,
            last_occurrence,
            occurrences,
            confidence,
        })
    }
}

/// Normalize a transaction description for grouping
///
/// Lower-cases, replaces digit runs with `#`, strips punctuation and
/// collapses whitespace ("ACME Corp. Invoice 4411" -> "acme corp invoice #").
pub fn normalize_description(description: &str) -> String {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    static PUNCT: OnceLock<Regex> = OnceLock::new();
    static SPACE: OnceLock<Regex> = OnceLock::new();

    let digits = DIGITS.get_or_init(|| Regex::new(r"\d+").expect("valid regex"));
    let punct = PUNCT.get_or_init(|| Regex::new(r"[^\w\s#]|_").expect("valid regex"));
    let space = SPACE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"));

    let lower = description.to_lowercase();
    let replaced = digits.replace_all(&lower, "#");
    let stripped = punct.replace_all(&replaced, " ");
    space.replace_all(stripped.trim(), " ").into_owned()
}
