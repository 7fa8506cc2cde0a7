//! Pending invoice commands

use anyhow::Result;
use chrono::Local;
use runway_core::db::Database;

use super::{format_amount, parse_date_arg, truncate};

pub fn cmd_invoices_list(db: &Database) -> Result<()> {
    let invoices = db.list_pending_invoices()?;

    if invoices.is_empty() {
        println!("No pending invoices.");
        return Ok(());
    }

    println!();
    println!(
        "{:>5}  {:<16}  {:<24}  {:<8}  {:>14}  {}",
        "ID", "Number", "Counterparty", "Kind", "Amount", "Due"
    );
    println!("{}", "─".repeat(86));

    for inv in &invoices {
        println!(
            "{:>5}  {:<16}  {:<24}  {:<8}  {:>14}  {}",
            inv.id,
            truncate(&inv.number, 16),
            truncate(inv.counterparty.as_deref().unwrap_or("-"), 24),
            inv.kind.as_str(),
            format_amount(inv.amount),
            inv.due_date
        );
    }

    println!();
    println!("{} pending invoice(s)", invoices.len());
    Ok(())
}

pub fn cmd_invoices_paid(db: &Database, id: i64, date: Option<&str>) -> Result<()> {
    let paid_date = match date {
        Some(d) => parse_date_arg(d)?,
        None => Local::now().date_naive(),
    };

    db.mark_invoice_paid(id, paid_date)?;
    println!("✅ Invoice {} marked paid on {}", id, paid_date);
    Ok(())
}
