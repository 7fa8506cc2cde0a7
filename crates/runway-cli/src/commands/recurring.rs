//! Recurring item detection command

use anyhow::Result;
use runway_core::{
    config::ForecastConfig,
    db::Database,
    forecast::{HistoricalDataAggregator, RecurringDetector, RecurringItem},
    models::TransactionKind,
};

use super::{format_amount, truncate};

/// Detect recurring items over the configured history window
pub fn cmd_recurring(
    db: &Database,
    config: &ForecastConfig,
    months: Option<u32>,
) -> Result<Vec<RecurringItem>> {
    let Some(as_of) = db.latest_transaction_date()? else {
        println!("No transactions yet. Import a ledger first: runway import --file ledger.csv");
        return Ok(Vec::new());
    };

    let months = months.unwrap_or(config.history_months);
    let start = HistoricalDataAggregator::new(months).window_start(as_of);
    let transactions = db.list_transactions_between(start, as_of)?;
    let items = RecurringDetector::new().detect(&transactions);

    println!(
        "🔁 Recurring items ({} to {}, {} transactions scanned)",
        start,
        as_of,
        transactions.len()
    );

    if items.is_empty() {
        println!("   None found.");
        return Ok(items);
    }

    println!();
    println!(
        "{:<32}  {:<8}  {:<8}  {:>12}  {:>12}  {:>6}  {}",
        "Pattern", "Kind", "Cadence", "Average", "Per month", "Conf", "Last seen"
    );
    println!("{}", "─".repeat(102));

    for item in &items {
        println!(
            "{:<32}  {:<8}  {:<8}  {:>12}  {:>12}  {:>5.0}%  {}",
            truncate(&item.signature.description, 32),
            item.kind.as_str(),
            item.cadence.as_str(),
            format_amount(item.average_amount),
            format_amount(item.monthly_amount()),
            item.confidence * 100.0,
            item.last_occurrence
        );
    }

    let monthly_net: f64 = items
        .iter()
        .map(|item| match item.kind {
            TransactionKind::Income => item.monthly_amount(),
            TransactionKind::Expense => -item.monthly_amount(),
        })
        .sum();
    println!();
    println!("   Net recurring per month: {}", format_amount(monthly_net));

    Ok(items)
}
