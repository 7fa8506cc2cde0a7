//! Runway CLI - Cash-flow forecasting and risk quantification
//!
//! Usage:
//!   runway init                      Initialize database
//!   runway import --file CSV         Import transactions or invoices (auto-detected)
//!   runway market add|list|fetch     Manage market snapshots
//!   runway recurring                 Show recurring income and expenses
//!   runway forecast --save           Forecast the default scenario and store it
//!   runway forecasts show            Show a stored forecast
//!   runway models list|train         Inspect and backtest forecast models

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use runway_core::{forecast::ModelRegistry, models::MarketSnapshot};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt).map(|_| ()),
        Commands::Import { file, format } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_import(&db, &file, format.as_deref()).map(|_| ())
        }
        Commands::Invoices { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None | Some(InvoicesAction::List) => commands::cmd_invoices_list(&db),
                Some(InvoicesAction::Paid { id, date }) => {
                    commands::cmd_invoices_paid(&db, id, date.as_deref())
                }
            }
        }
        Commands::Market { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                MarketAction::Add {
                    date,
                    interest_rate,
                    inflation,
                    gdp_growth,
                    unemployment,
                    equity_index,
                    fx_rate,
                } => {
                    let snapshot = MarketSnapshot {
                        date: commands::parse_date_arg(&date)?,
                        interest_rate,
                        inflation_rate: inflation,
                        gdp_growth,
                        unemployment_rate: unemployment,
                        equity_index,
                        fx_rate,
                    };
                    commands::cmd_market_add(&db, &snapshot)
                }
                MarketAction::List { limit } => commands::cmd_market_list(&db, limit),
                MarketAction::Fetch => {
                    let config = commands::load_config(cli.config.as_deref())?;
                    commands::cmd_market_fetch(&db, &config).await
                }
            }
        }
        Commands::Recurring { months } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let config = commands::load_config(cli.config.as_deref())?;
            commands::cmd_recurring(&db, &config, months).map(|_| ())
        }
        Commands::Forecast {
            scenario,
            horizon,
            confidence,
            risk,
            revenue_growth,
            cost_inflation,
            simulations,
            seed,
            as_of,
            save,
            json,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let config = commands::load_config(cli.config.as_deref())?;
            let opts = commands::ForecastOptions {
                scenario,
                horizon,
                confidence,
                risk,
                revenue_growth,
                cost_inflation,
                simulations,
                seed,
                as_of,
                save,
                json,
            };
            commands::cmd_forecast(&db, &config, &opts).await.map(|_| ())
        }
        Commands::Forecasts { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None | Some(ForecastsAction::List) => commands::cmd_forecasts_list(&db),
                Some(ForecastsAction::Show { scenario, json }) => {
                    commands::cmd_forecasts_show(&db, &scenario, json)
                }
            }
        }
        Commands::Models { action } => {
            let registry = ModelRegistry::new();
            match action {
                None | Some(ModelsAction::List) => commands::cmd_models_list(&registry),
                Some(ModelsAction::Train { model, holdout }) => {
                    let db = commands::open_db(&cli.db, cli.no_encrypt)?;
                    commands::cmd_models_train(&db, &registry, &model, holdout).map(|_| ())
                }
            }
        }
    }
}
