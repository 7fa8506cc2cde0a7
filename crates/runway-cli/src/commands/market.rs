//! Market snapshot commands

use anyhow::{Context, Result};
use runway_core::{
    config::ForecastConfig,
    db::Database,
    forecast::{market::market_factors, MarketDataProvider},
    market_feed::{HttpMarketDataProvider, MARKET_URL_ENV},
    models::MarketSnapshot,
};

pub fn cmd_market_add(db: &Database, snapshot: &MarketSnapshot) -> Result<()> {
    db.upsert_market_snapshot(snapshot)?;
    println!("✅ Stored market snapshot for {}", snapshot.date);

    for factor in market_factors(snapshot) {
        println!(
            "   {:<14} {:>7.2}  impact x{:.4}",
            factor.name, factor.value, factor.impact
        );
    }
    Ok(())
}

pub fn cmd_market_list(db: &Database, limit: i64) -> Result<()> {
    let snapshots = db.list_market_snapshots(limit)?;

    if snapshots.is_empty() {
        println!("No market snapshots stored.");
        println!("   Add one with: runway market add --date YYYY-MM-DD ...");
        return Ok(());
    }

    println!();
    println!(
        "{:<12}  {:>9}  {:>9}  {:>7}  {:>12}  {:>10}  {:>8}",
        "Date", "Interest", "Inflation", "GDP", "Unemployment", "Equity", "FX"
    );
    println!("{}", "─".repeat(80));

    for s in &snapshots {
        println!(
            "{:<12}  {:>8.2}%  {:>8.2}%  {:>6.2}%  {:>11.2}%  {:>10}  {:>8}",
            s.date.to_string(),
            s.interest_rate,
            s.inflation_rate,
            s.gdp_growth,
            s.unemployment_rate,
            s.equity_index
                .map(|v| format!("{:.1}", v))
                .unwrap_or_else(|| "-".into()),
            s.fx_rate
                .map(|v| format!("{:.4}", v))
                .unwrap_or_else(|| "-".into()),
        );
    }

    Ok(())
}

/// Pull the latest snapshot from the configured feed into the store
pub async fn cmd_market_fetch(db: &Database, config: &ForecastConfig) -> Result<()> {
    let Some(feed) = HttpMarketDataProvider::from_config(config)? else {
        anyhow::bail!(
            "No market feed configured. Set {} or [market] endpoint in the config",
            MARKET_URL_ENV
        );
    };

    println!("🌐 Fetching market snapshot from {}...", feed.base_url());
    let snapshot = feed
        .latest_snapshot()
        .await
        .context("Market feed request failed")?;

    match snapshot {
        Some(snapshot) => cmd_market_add(db, &snapshot),
        None => {
            println!("   Feed has no snapshot yet.");
            Ok(())
        }
    }
}
