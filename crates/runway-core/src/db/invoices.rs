//! Invoice operations

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};
use tracing::debug;

use super::{date_column, Database};
use crate::error::{Error, Result};
use crate::models::{InvoiceStatus, NewInvoice, PendingInvoice, TransactionKind};

impl Database {
    /// Insert an invoice (skips duplicates based on import_hash)
    pub fn insert_invoice(&self, invoice: &NewInvoice) -> Result<Option<i64>> {
        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM invoices WHERE import_hash = ?",
                params![invoice.import_hash],
                |row| row.get(0),
            )
            .optional()?;

        if existing.is_some() {
            return Ok(None);
        }

        conn.execute(
            r#"
            INSERT INTO invoices (number, counterparty, amount, kind, due_date, status, import_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                invoice.number,
                invoice.counterparty,
                invoice.amount.abs(),
                invoice.kind.as_str(),
                invoice.due_date.to_string(),
                InvoiceStatus::Pending.as_str(),
                invoice.import_hash,
            ],
        )?;

        Ok(Some(conn.last_insert_rowid()))
    }

    /// Invoices not yet paid, by due date
    pub fn list_pending_invoices(&self) -> Result<Vec<PendingInvoice>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, number, counterparty, amount, kind, due_date
            FROM invoices
            WHERE status = 'pending'
            ORDER BY due_date, id
            "#,
        )?;

        let invoices = stmt
            .query_map([], |row| {
                let kind: String = row.get(4)?;
                Ok(PendingInvoice {
                    id: row.get(0)?,
                    number: row.get(1)?,
                    counterparty: row.get(2)?,
                    amount: row.get(3)?,
                    kind: kind.parse().unwrap_or(TransactionKind::Income),
                    due_date: date_column(row, 5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(invoices)
    }

    /// Mark an invoice as paid on `paid_date`
    pub fn mark_invoice_paid(&self, id: i64, paid_date: NaiveDate) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE invoices SET status = ?, paid_date = ? WHERE id = ?",
            params![InvoiceStatus::Paid.as_str(), paid_date.to_string(), id],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Invoice {}", id)));
        }

        debug!(id, %paid_date, "Invoice marked paid");
        Ok(())
    }
}
