//! Market snapshot operations

use rusqlite::{params, OptionalExtension};

use super::{date_column, Database};
use crate::error::Result;
use crate::models::MarketSnapshot;

impl Database {
    /// Insert or replace the snapshot for its date
    pub fn upsert_market_snapshot(&self, snapshot: &MarketSnapshot) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO market_snapshots
                (date, interest_rate, inflation_rate, gdp_growth, unemployment_rate, equity_index, fx_rate)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(date) DO UPDATE SET
                interest_rate = excluded.interest_rate,
                inflation_rate = excluded.inflation_rate,
                gdp_growth = excluded.gdp_growth,
                unemployment_rate = excluded.unemployment_rate,
                equity_index = excluded.equity_index,
                fx_rate = excluded.fx_rate
            "#,
            params![
                snapshot.date.to_string(),
                snapshot.interest_rate,
                snapshot.inflation_rate,
                snapshot.gdp_growth,
                snapshot.unemployment_rate,
                snapshot.equity_index,
                snapshot.fx_rate,
            ],
        )?;
        Ok(())
    }

    /// Most recent snapshot by date
    pub fn latest_market_snapshot(&self) -> Result<Option<MarketSnapshot>> {
        let conn = self.conn()?;
        let snapshot = conn
            .query_row(
                r#"
                SELECT date, interest_rate, inflation_rate, gdp_growth, unemployment_rate, equity_index, fx_rate
                FROM market_snapshots
                ORDER BY date DESC
                LIMIT 1
                "#,
                [],
                Self::row_to_snapshot,
            )
            .optional()?;
        Ok(snapshot)
    }

    /// Snapshots, newest first
    pub fn list_market_snapshots(&self, limit: i64) -> Result<Vec<MarketSnapshot>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT date, interest_rate, inflation_rate, gdp_growth, unemployment_rate, equity_index, fx_rate
            FROM market_snapshots
            ORDER BY date DESC
            LIMIT ?
            "#,
        )?;

        let snapshots = stmt
            .query_map(params![limit], Self::row_to_snapshot)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(snapshots)
    }

    fn row_to_snapshot(row: &rusqlite::Row) -> rusqlite::Result<MarketSnapshot> {
        Ok(MarketSnapshot {
            date: date_column(row, 0)?,
            interest_rate: row.get(1)?,
            inflation_rate: row.get(2)?,
            gdp_growth: row.get(3)?,
            unemployment_rate: row.get(4)?,
            equity_index: row.get(5)?,
            fx_rate: row.get(6)?,
        })
    }
}
