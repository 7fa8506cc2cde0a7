//! Forecast commands (generate, list stored, show stored)

use anyhow::{Context, Result};
use chrono::Local;
use runway_core::{
    config::ForecastConfig,
    db::Database,
    forecast::{ForecastRequest, ForecastService, MarketDataProvider, ScenarioForecast},
    market_feed::HttpMarketDataProvider,
    models::{RiskLevel, ScenarioConfig},
};

use super::{format_amount, parse_date_arg};

/// Command-line overrides for one forecast run
#[derive(Debug, Clone, Default)]
pub struct ForecastOptions {
    pub scenario: String,
    pub horizon: Option<usize>,
    pub confidence: Option<f64>,
    pub risk: Option<String>,
    pub revenue_growth: f64,
    pub cost_inflation: f64,
    pub simulations: Option<usize>,
    pub seed: Option<u64>,
    pub as_of: Option<String>,
    pub save: bool,
    pub json: bool,
}

impl ForecastOptions {
    /// Config with the command-line overrides applied
    fn apply(&self, config: &ForecastConfig) -> Result<ForecastConfig> {
        let mut config = config.clone();
        if let Some(horizon) = self.horizon {
            anyhow::ensure!(horizon > 0, "--horizon must be at least 1");
            config.horizon = horizon;
        }
        if let Some(confidence) = self.confidence {
            anyhow::ensure!(
                confidence > 0.0 && confidence < 1.0,
                "--confidence must be between 0 and 1 (got {})",
                confidence
            );
            config.confidence_level = confidence;
        }
        if let Some(risk) = &self.risk {
            config.risk_level = RiskLevel::parse_or_default(risk);
        }
        if let Some(simulations) = self.simulations {
            config.simulations = simulations;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        Ok(config)
    }

    fn scenario(&self, config: &ForecastConfig) -> ScenarioConfig {
        ScenarioConfig::new(self.scenario.clone())
            .with_risk_level(config.risk_level)
            .with_revenue_growth(self.revenue_growth)
            .with_cost_inflation(self.cost_inflation)
    }
}

pub async fn cmd_forecast(
    db: &Database,
    config: &ForecastConfig,
    opts: &ForecastOptions,
) -> Result<ScenarioForecast> {
    let config = opts.apply(config)?;
    let scenario = opts.scenario(&config);

    let as_of = match &opts.as_of {
        Some(d) => parse_date_arg(d)?,
        None => match db.latest_transaction_date()? {
            Some(date) => date,
            None => {
                println!("⚠️  No transactions stored; forecasting from an empty history");
                Local::now().date_naive()
            }
        },
    };

    // Prefer a live feed when one is configured, otherwise stored snapshots
    let feed = HttpMarketDataProvider::from_config(&config)?;
    let market: &dyn MarketDataProvider = match &feed {
        Some(feed) => feed,
        None => db,
    };

    let service = ForecastService::from_config(db, &config).with_market(market);
    let request = ForecastRequest::new(scenario, config.horizon, config.confidence_level, as_of);

    if !opts.json {
        println!(
            "📈 Forecasting scenario '{}' ({} months from {}, risk {})...",
            request.scenario.id, request.horizon, as_of, request.scenario.risk_level
        );
    }

    let forecast = if opts.save {
        service
            .run_and_persist(&request, db)
            .await
            .context("Forecast failed")?
    } else {
        service.run(&request).await.context("Forecast failed")?
    };

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&forecast)?);
    } else {
        print_forecast(&forecast);
        if opts.save {
            println!();
            println!("💾 Saved as scenario '{}'", forecast.scenario_id);
        }
    }

    Ok(forecast)
}

pub fn cmd_forecasts_list(db: &Database) -> Result<()> {
    let runs = db.list_forecast_runs()?;

    if runs.is_empty() {
        println!("No stored forecasts. Run: runway forecast --save");
        return Ok(());
    }

    println!();
    println!("{:<24}  {:>8}  {}", "Scenario", "Horizon", "Generated");
    println!("{}", "─".repeat(56));
    for run in &runs {
        println!(
            "{:<24}  {:>8}  {}",
            run.scenario_id,
            run.horizon,
            run.generated_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

pub fn cmd_forecasts_show(db: &Database, scenario: &str, json: bool) -> Result<()> {
    let forecast = db
        .get_scenario_forecast(scenario)?
        .ok_or_else(|| anyhow::anyhow!("No stored forecast for scenario '{}'", scenario))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&forecast)?);
    } else {
        println!(
            "📈 Scenario '{}' (generated {})",
            forecast.scenario_id,
            forecast.generated_at.format("%Y-%m-%d %H:%M")
        );
        print_forecast(&forecast);
    }
    Ok(())
}

fn print_forecast(forecast: &ScenarioForecast) {
    let enhanced = &forecast.enhanced;

    println!();
    println!(
        "{:>6}  {:>14}  {:>14}  {:>14}  {:>5}  {:>14}  {:>14}",
        "Period", "Predicted", "Conservative", "Optimistic", "Conf", "Trend low", "Trend high"
    );
    println!("{}", "─".repeat(95));

    for point in &forecast.cash_flow {
        let interval = enhanced.confidence_intervals.get(point.period_index);
        println!(
            "{:>6}  {:>14}  {:>14}  {:>14}  {:>4.0}%  {:>14}  {:>14}",
            format!("+{}", point.period_index + 1),
            format_amount(point.predicted),
            format_amount(point.conservative),
            format_amount(point.optimistic),
            point.confidence * 100.0,
            interval
                .map(|ci| format_amount(ci.lower))
                .unwrap_or_else(|| "-".into()),
            interval
                .map(|ci| format_amount(ci.upper))
                .unwrap_or_else(|| "-".into()),
        );
    }

    let risks: Vec<&String> = forecast
        .cash_flow
        .iter()
        .flat_map(|p| p.risks.iter())
        .collect();
    let outflow_periods = forecast
        .cash_flow
        .iter()
        .filter(|p| p.predicted < 0.0)
        .count();
    if outflow_periods > 0 {
        println!();
        println!("   ⚠️  Net outflow in {} period(s)", outflow_periods);
    } else if !risks.is_empty() {
        println!();
        println!("   ⚠️  {}", risks[0]);
    }

    if !forecast.recurring_items.is_empty() {
        println!();
        println!("   Recurring items: {}", forecast.recurring_items.len());
    }

    let mc = &enhanced.monte_carlo_results;
    if mc.simulations_run > 0 {
        println!();
        println!("🎲 Monte Carlo ({} paths)", mc.simulations_run);
        println!(
            "   P5 {}  P50 {}  P95 {}",
            format_amount(mc.percentiles.p5),
            format_amount(mc.percentiles.p50),
            format_amount(mc.percentiles.p95)
        );
        println!(
            "   Mean {}  Std dev {}  P(negative) {:.1}%",
            format_amount(mc.mean),
            format_amount(mc.std_dev),
            mc.probability_of_negative * 100.0
        );
    }

    let acc = &enhanced.accuracy;
    println!();
    println!(
        "🎯 Backtest: MAPE {:.1}%  RMSE {}  R² {:.2}",
        acc.mape,
        format_amount(acc.rmse),
        acc.r2
    );

    if !enhanced.market_factors.is_empty() {
        println!();
        println!("🌐 Market factors");
        for factor in &enhanced.market_factors {
            println!(
                "   {:<14} {:>7.2}  impact x{:.4}",
                factor.name, factor.value, factor.impact
            );
        }
    }

    if !enhanced.recommendations.is_empty() {
        println!();
        println!("💡 Recommendations");
        for rec in &enhanced.recommendations {
            println!("   {}", rec);
        }
    }
}
