//! Database tests

use super::*;
use crate::forecast::{
    EnhancedForecast, ForecastPoint, MonteCarloResult, ScenarioForecast,
    ConfidenceInterval, AccuracyMetrics,
};
use crate::models::*;
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_tx(d: NaiveDate, description: &str, amount: f64, kind: TransactionKind) -> NewTransaction {
    NewTransaction {
        date: d,
        description: description.to_string(),
        amount,
        kind,
        counterparty: None,
        import_hash: format!("{}-{}-{}", d, description, amount),
    }
}

fn scenario_forecast(scenario_id: &str, predicted: &[f64]) -> ScenarioForecast {
    let cash_flow: Vec<ForecastPoint> = predicted
        .iter()
        .enumerate()
        .map(|(i, p)| ForecastPoint::new(i, *p).with_confidence(0.5))
        .collect();

    ScenarioForecast {
        scenario_id: scenario_id.to_string(),
        generated_at: chrono::Utc::now(),
        cash_flow,
        recurring_items: vec![],
        enhanced: EnhancedForecast {
            base_forecast: vec![],
            adjusted_forecast: predicted.to_vec(),
            confidence_intervals: predicted
                .iter()
                .map(|p| ConfidenceInterval {
                    lower: p * 0.9,
                    upper: p * 1.1,
                    confidence_level: 0.95,
                })
                .collect(),
            seasonal_adjustments: vec![],
            monte_carlo_results: MonteCarloResult::default(),
            market_factors: vec![],
            accuracy: AccuracyMetrics::default(),
            recommendations: vec![],
        },
    }
}

#[test]
fn test_in_memory_db() {
    let db = Database::in_memory().unwrap();
    assert_eq!(db.count_transactions().unwrap(), 0);
    assert!(db.latest_transaction_date().unwrap().is_none());
    assert!(db.list_pending_invoices().unwrap().is_empty());
}

#[test]
fn test_transaction_insert_dedup() {
    let db = Database::in_memory().unwrap();
    let tx = new_tx(date(2024, 1, 5), "Rent", 700.0, TransactionKind::Expense);

    assert!(db.insert_transaction(&tx).unwrap().is_some());
    assert!(db.insert_transaction(&tx).unwrap().is_none());
    assert_eq!(db.count_transactions().unwrap(), 1);
}

#[test]
fn test_transactions_between() {
    let db = Database::in_memory().unwrap();
    db.insert_transaction(&new_tx(date(2024, 3, 1), "Late", 10.0, TransactionKind::Income))
        .unwrap();
    db.insert_transaction(&new_tx(date(2024, 1, 1), "Early", 20.0, TransactionKind::Expense))
        .unwrap();
    db.insert_transaction(&new_tx(date(2023, 6, 1), "Old", 30.0, TransactionKind::Expense))
        .unwrap();

    let records = db
        .list_transactions_between(date(2024, 1, 1), date(2024, 3, 31))
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].description, "Early");
    assert_eq!(records[0].kind, TransactionKind::Expense);
    assert_eq!(records[1].signed_amount(), 10.0);

    assert_eq!(db.latest_transaction_date().unwrap(), Some(date(2024, 3, 1)));
}

#[test]
fn test_invoice_lifecycle() {
    let db = Database::in_memory().unwrap();
    let invoice = NewInvoice {
        number: "INV-100".into(),
        counterparty: Some("Acme".into()),
        amount: 4200.0,
        kind: TransactionKind::Income,
        due_date: date(2024, 7, 1),
        import_hash: "inv-100".into(),
    };

    let id = db.insert_invoice(&invoice).unwrap().unwrap();
    assert!(db.insert_invoice(&invoice).unwrap().is_none());

    let pending = db.list_pending_invoices().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].number, "INV-100");
    assert_eq!(pending[0].due_date, date(2024, 7, 1));

    db.mark_invoice_paid(id, date(2024, 7, 3)).unwrap();
    assert!(db.list_pending_invoices().unwrap().is_empty());

    assert!(matches!(
        db.mark_invoice_paid(9999, date(2024, 7, 3)),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_market_snapshot_upsert_and_latest() {
    let db = Database::in_memory().unwrap();
    assert!(db.latest_market_snapshot().unwrap().is_none());

    let mut snapshot = MarketSnapshot {
        date: date(2024, 5, 1),
        interest_rate: 5.0,
        inflation_rate: 3.0,
        gdp_growth: 2.0,
        unemployment_rate: 4.0,
        equity_index: None,
        fx_rate: Some(1.1),
    };
    db.upsert_market_snapshot(&snapshot).unwrap();

    snapshot.interest_rate = 4.5;
    db.upsert_market_snapshot(&snapshot).unwrap();

    let older = MarketSnapshot {
        date: date(2024, 1, 1),
        ..snapshot.clone()
    };
    db.upsert_market_snapshot(&older).unwrap();

    assert_eq!(db.latest_market_snapshot().unwrap(), Some(snapshot));
    assert_eq!(db.list_market_snapshots(10).unwrap().len(), 2);
}

#[test]
fn test_save_forecast_replaces_previous_run() {
    let db = Database::in_memory().unwrap();
    let scenario = ScenarioConfig::new("base").with_risk_level(RiskLevel::High);

    db.save_scenario_forecast(&scenario, &scenario_forecast("base", &[100.0, 200.0, 300.0]))
        .unwrap();
    db.save_scenario_forecast(&scenario, &scenario_forecast("base", &[50.0, 60.0]))
        .unwrap();

    let points = db.get_forecast_points("base").unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].predicted, 50.0);
    assert_eq!(points[1].adjusted, Some(60.0));
    assert!((points[1].upper_bound.unwrap() - 66.0).abs() < 1e-9);

    let runs = db.list_forecast_runs().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].horizon, 2);

    let stored = db.get_scenario_forecast("base").unwrap().unwrap();
    assert_eq!(stored.cash_flow.len(), 2);
    assert_eq!(stored.enhanced.adjusted_forecast, vec![50.0, 60.0]);
}

#[test]
fn test_forecasts_isolated_by_scenario() {
    let db = Database::in_memory().unwrap();
    db.save_scenario_forecast(
        &ScenarioConfig::new("a"),
        &scenario_forecast("a", &[1.0]),
    )
    .unwrap();
    db.save_scenario_forecast(
        &ScenarioConfig::new("b"),
        &scenario_forecast("b", &[2.0, 3.0]),
    )
    .unwrap();
    db.save_scenario_forecast(
        &ScenarioConfig::new("a"),
        &scenario_forecast("a", &[4.0]),
    )
    .unwrap();

    assert_eq!(db.get_forecast_points("b").unwrap().len(), 2);
    assert_eq!(db.get_forecast_points("a").unwrap()[0].predicted, 4.0);
    assert!(db.get_scenario_forecast("missing").unwrap().is_none());
    assert_eq!(db.list_forecast_runs().unwrap().len(), 2);
}

#[test]
fn test_reset_clears_everything() {
    let db = Database::in_memory().unwrap();
    db.insert_transaction(&new_tx(date(2024, 1, 1), "X", 1.0, TransactionKind::Income))
        .unwrap();
    db.save_scenario_forecast(&ScenarioConfig::default(), &scenario_forecast("default", &[1.0]))
        .unwrap();

    db.reset().unwrap();
    assert_eq!(db.count_transactions().unwrap(), 0);
    assert!(db.list_forecast_runs().unwrap().is_empty());
}

#[test]
fn test_encryption_state() {
    let plain = Database::in_memory().unwrap();
    assert!(!plain.is_encrypted());
    assert!(plain.path().ends_with(".db"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    let path = path.to_str().unwrap();
    let keyed = Database::new_with_key(path, Some("correct horse")).unwrap();
    assert!(keyed.is_encrypted());
    assert_eq!(keyed.path(), path);

    let tx = new_tx(date(2024, 2, 1), "Rent", 700.0, TransactionKind::Expense);
    keyed.insert_transaction(&tx).unwrap();
    assert_eq!(keyed.count_transactions().unwrap(), 1);
}

#[test]
fn test_derive_key_is_stable() {
    let a = derive_key("correct horse").unwrap();
    let b = derive_key("correct horse").unwrap();
    let c = derive_key("battery staple").unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
}

#[tokio::test]
async fn test_database_as_providers() {
    use crate::forecast::providers::{ForecastSink, MarketDataProvider, TransactionHistoryProvider};

    let db = Database::in_memory().unwrap();
    db.insert_transaction(&new_tx(date(2024, 2, 1), "Sale", 900.0, TransactionKind::Income))
        .unwrap();

    let txs = db
        .transactions_between(date(2024, 1, 1), date(2024, 12, 31))
        .await
        .unwrap();
    assert_eq!(txs.len(), 1);
    assert!(db.pending_invoices().await.unwrap().is_empty());
    assert!(db.latest_snapshot().await.unwrap().is_none());

    db.save_forecast(&ScenarioConfig::new("s"), &scenario_forecast("s", &[5.0]))
        .await
        .unwrap();
    assert_eq!(db.get_forecast_points("s").unwrap().len(), 1);
}
