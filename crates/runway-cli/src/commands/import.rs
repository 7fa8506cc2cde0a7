//! CSV import command implementation

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use runway_core::{
    db::Database,
    import::{detect_csv_format, parse_invoices_csv, parse_transactions_csv, CsvFormat},
};

/// Outcome of one import run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub format: CsvFormat,
    pub imported: usize,
    pub skipped: usize,
}

fn parse_format(value: &str) -> Result<CsvFormat> {
    match value.to_lowercase().as_str() {
        "transactions" | "ledger" => Ok(CsvFormat::Transactions),
        "invoices" => Ok(CsvFormat::Invoices),
        other => anyhow::bail!(
            "Unknown CSV format: {}. Use one of: transactions, invoices",
            other
        ),
    }
}

pub fn cmd_import(db: &Database, file: &Path, format: Option<&str>) -> Result<ImportSummary> {
    // Read the first line for auto-detection
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    let mut header_line = String::new();
    BufReader::new(csv_file)
        .read_line(&mut header_line)
        .with_context(|| "Failed to read CSV header")?;

    let format = match format {
        Some(f) => parse_format(f)?,
        None => detect_csv_format(&header_line).ok_or_else(|| {
            anyhow::anyhow!(
                "Could not auto-detect CSV layout from header.\n\
                 Expected date,description,amount or number,amount,due_date columns,\n\
                 or specify --format with one of: transactions, invoices"
            )
        })?,
    };

    println!("📥 Importing {} from {}...", format, file.display());

    // Re-open file to parse from beginning (including header)
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;

    let mut imported = 0;
    let mut skipped = 0;

    match format {
        CsvFormat::Transactions => {
            let transactions = parse_transactions_csv(csv_file)
                .with_context(|| format!("Failed to parse {}", file.display()))?;
            println!("   Found {} transactions", transactions.len());

            for tx in &transactions {
                match db.insert_transaction(tx)? {
                    Some(_) => imported += 1,
                    None => skipped += 1,
                }
            }
        }
        CsvFormat::Invoices => {
            let invoices = parse_invoices_csv(csv_file)
                .with_context(|| format!("Failed to parse {}", file.display()))?;
            println!("   Found {} invoices", invoices.len());

            for invoice in &invoices {
                match db.insert_invoice(invoice)? {
                    Some(_) => imported += 1,
                    None => skipped += 1,
                }
            }
        }
    }

    println!("   Imported: {}", imported);
    if skipped > 0 {
        println!("   Skipped (duplicates): {}", skipped);
    }
    println!("✅ Import complete!");

    Ok(ImportSummary {
        format,
        imported,
        skipped,
    })
}
