//! Forecast model commands

use anyhow::{Context, Result};
use runway_core::{
    db::Database,
    forecast::{cashflow::net_monthly_series, ModelRegistry, TrainingConfig, TrainingReport},
};

pub fn cmd_models_list(registry: &ModelRegistry) -> Result<()> {
    println!();
    println!("{:<16}  {}", "Model", "Description");
    println!("{}", "─".repeat(60));
    for (id, description) in registry.describe() {
        println!("{:<16}  {}", id, description);
    }
    Ok(())
}

/// Backtest a model on the stored net monthly series
pub fn cmd_models_train(
    db: &Database,
    registry: &ModelRegistry,
    model_id: &str,
    holdout: usize,
) -> Result<TrainingReport> {
    // Resolve the model before touching the store so typos fail fast
    registry.get(model_id)?;

    let Some(as_of) = db.latest_transaction_date()? else {
        anyhow::bail!("No transactions yet. Import a ledger first: runway import --file ledger.csv");
    };
    let transactions = db.list_transactions_between(chrono::NaiveDate::MIN, as_of)?;
    let series: Vec<f64> = net_monthly_series(&transactions)
        .iter()
        .map(|p| p.amount)
        .collect();

    println!(
        "🧪 Backtesting '{}' on {} months (holdout {})...",
        model_id,
        series.len(),
        holdout
    );

    let report = registry
        .train(&TrainingConfig::new(model_id, series, holdout))
        .with_context(|| format!("Training '{}' failed", model_id))?;

    println!("   Accuracy: {:.1}%", report.accuracy * 100.0);
    println!(
        "   MAPE {:.1}%  RMSE {:.2}  R² {:.2}",
        report.metrics.mape, report.metrics.rmse, report.metrics.r2
    );

    Ok(report)
}
