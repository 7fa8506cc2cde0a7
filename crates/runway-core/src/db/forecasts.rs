//! Persisted forecast operations
//!
//! Each scenario id has at most one stored run. Saving replaces the previous
//! run and its points inside a single SQLite transaction.

use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::forecast::ScenarioForecast;
use crate::models::{ForecastRun, ScenarioConfig};

/// One stored forecast period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredForecastPoint {
    pub period_index: usize,
    pub predicted: f64,
    pub conservative: f64,
    pub optimistic: f64,
    pub confidence: f64,
    /// Seasonal/market adjusted value from the enhanced pipeline
    pub adjusted: Option<f64>,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
}

impl Database {
    /// Replace the stored forecast for `scenario.id` (delete then insert)
    pub fn save_scenario_forecast(
        &self,
        scenario: &ScenarioConfig,
        forecast: &ScenarioForecast,
    ) -> Result<i64> {
        let payload = serde_json::to_string(forecast)?;
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM forecast_points WHERE run_id IN (SELECT id FROM forecast_runs WHERE scenario_id = ?)",
            params![scenario.id],
        )?;
        tx.execute(
            "DELETE FROM forecast_runs WHERE scenario_id = ?",
            params![scenario.id],
        )?;

        tx.execute(
            r#"
            INSERT INTO forecast_runs
                (scenario_id, risk_level, revenue_growth_pct, cost_inflation_pct, horizon, generated_at, payload)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                scenario.id,
                scenario.risk_level.as_str(),
                scenario.revenue_growth_pct,
                scenario.cost_inflation_pct,
                forecast.cash_flow.len() as i64,
                forecast.generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                payload,
            ],
        )?;
        let run_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO forecast_points
                    (run_id, period_index, predicted, conservative, optimistic, confidence, adjusted, lower_bound, upper_bound)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )?;

            let enhanced = &forecast.enhanced;
            for point in &forecast.cash_flow {
                let i = point.period_index;
                let interval = enhanced.confidence_intervals.get(i);
                stmt.execute(params![
                    run_id,
                    i as i64,
                    point.predicted,
                    point.conservative,
                    point.optimistic,
                    point.confidence,
                    enhanced.adjusted_forecast.get(i).copied(),
                    interval.map(|ci| ci.lower),
                    interval.map(|ci| ci.upper),
                ])?;
            }
        }

        tx.commit()?;

        info!(
            scenario = %scenario.id,
            run_id,
            points = forecast.cash_flow.len(),
            "Saved forecast"
        );
        Ok(run_id)
    }

    /// The stored forecast for a scenario, if any
    pub fn get_scenario_forecast(&self, scenario_id: &str) -> Result<Option<ScenarioForecast>> {
        let conn = self.conn()?;
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM forecast_runs WHERE scenario_id = ?",
                params![scenario_id],
                |row| row.get(0),
            )
            .optional()?;

        payload
            .map(|p| serde_json::from_str::<ScenarioForecast>(&p).map_err(Error::from))
            .transpose()
    }

    /// Stored points for a scenario, by period
    pub fn get_forecast_points(&self, scenario_id: &str) -> Result<Vec<StoredForecastPoint>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT p.period_index, p.predicted, p.conservative, p.optimistic, p.confidence,
                   p.adjusted, p.lower_bound, p.upper_bound
            FROM forecast_points p
            JOIN forecast_runs r ON r.id = p.run_id
            WHERE r.scenario_id = ?
            ORDER BY p.period_index
            "#,
        )?;

        let points = stmt
            .query_map(params![scenario_id], |row| {
                let period_index: i64 = row.get(0)?;
                Ok(StoredForecastPoint {
                    period_index: period_index as usize,
                    predicted: row.get(1)?,
                    conservative: row.get(2)?,
                    optimistic: row.get(3)?,
                    confidence: row.get(4)?,
                    adjusted: row.get(5)?,
                    lower_bound: row.get(6)?,
                    upper_bound: row.get(7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(points)
    }

    /// Summaries of all stored runs, newest first
    pub fn list_forecast_runs(&self) -> Result<Vec<ForecastRun>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT scenario_id, horizon, generated_at FROM forecast_runs ORDER BY generated_at DESC, scenario_id",
        )?;

        let runs = stmt
            .query_map([], |row| {
                let horizon: i64 = row.get(1)?;
                let generated_at: String = row.get(2)?;
                Ok(ForecastRun {
                    scenario_id: row.get(0)?,
                    horizon: horizon as usize,
                    generated_at: parse_datetime(&generated_at),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(runs)
    }
}
