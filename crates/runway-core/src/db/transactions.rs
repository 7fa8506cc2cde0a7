//! Transaction operations

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::{date_column, Database};
use crate::error::Result;
use crate::models::{NewTransaction, TransactionKind, TransactionRecord};

impl Database {
    /// Insert a transaction (skips duplicates based on import_hash)
    pub fn insert_transaction(&self, tx: &NewTransaction) -> Result<Option<i64>> {
        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM transactions WHERE import_hash = ?",
                params![tx.import_hash],
                |row| row.get(0),
            )
            .optional()?;

        if existing.is_some() {
            return Ok(None); // Duplicate, skip
        }

        conn.execute(
            r#"
            INSERT INTO transactions (date, description, amount, kind, counterparty, import_hash)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                tx.date.to_string(),
                tx.description,
                tx.amount.abs(),
                tx.kind.as_str(),
                tx.counterparty,
                tx.import_hash,
            ],
        )?;

        Ok(Some(conn.last_insert_rowid()))
    }

    /// Transactions dated within `[start, end]`, oldest first
    pub fn list_transactions_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TransactionRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT date, amount, kind, description, counterparty
            FROM transactions
            WHERE date >= ? AND date <= ?
            ORDER BY date, id
            "#,
        )?;

        let records = stmt
            .query_map(params![start.to_string(), end.to_string()], |row| {
                Self::row_to_record(row)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Total number of stored transactions
    pub fn count_transactions(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Date of the most recent transaction, if any
    pub fn latest_transaction_date(&self) -> Result<Option<NaiveDate>> {
        let conn = self.conn()?;
        let latest: Option<String> =
            conn.query_row("SELECT MAX(date) FROM transactions", [], |row| row.get(0))?;

        Ok(latest.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()))
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<TransactionRecord> {
        let kind: String = row.get(2)?;
        Ok(TransactionRecord {
            date: date_column(row, 0)?,
            amount: row.get(1)?,
            kind: kind.parse().unwrap_or(TransactionKind::Expense),
            description: row.get(3)?,
            counterparty: row.get(4)?,
        })
    }
}
