//! CSV import parsers for ledger transactions and pending invoices
//!
//! Columns are matched by header name (case-insensitive), so optional
//! columns may appear in any order. Every row is validated here; a bad row
//! fails the whole file with an error naming its line.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use sha2::{Digest, Sha256};
use std::io::Read;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{NewInvoice, NewTransaction, TransactionKind};

/// Kind of data a CSV file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvFormat {
    /// `date,description,amount[,counterparty][,kind]`
    Transactions,
    /// `number,counterparty,amount,due_date[,kind]`
    Invoices,
}

impl CsvFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transactions => "transactions",
            Self::Invoices => "invoices",
        }
    }
}

impl std::fmt::Display for CsvFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Detect the CSV format from its header line
///
/// Returns None if the header matches neither layout.
pub fn detect_csv_format(header: &str) -> Option<CsvFormat> {
    let columns: Vec<String> = header.trim().split(',').map(normalize_header).collect();
    let has = |name: &str| columns.iter().any(|c| c == name);

    // Invoices also carry an amount, so check for their distinctive columns first
    if has("number") && has("due_date") && has("amount") {
        return Some(CsvFormat::Invoices);
    }

    if has("date") && has("description") && has("amount") {
        return Some(CsvFormat::Transactions);
    }

    None
}

fn normalize_header(s: &str) -> String {
    s.trim()
        .trim_matches('"')
        .to_lowercase()
        .replace([' ', '-'], "_")
}

/// Column positions resolved from a header record
struct Columns {
    names: Vec<String>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        Self {
            names: headers.iter().map(normalize_header).collect(),
        }
    }

    fn index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    fn require(&self, name: &str) -> Result<usize> {
        self.index(name)
            .ok_or_else(|| Error::Import(format!("Missing required column: {}", name)))
    }
}

/// Non-empty trimmed field at `idx`
fn field(record: &StringRecord, idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn required_field<'r>(
    record: &'r StringRecord,
    idx: usize,
    name: &str,
    line: u64,
) -> Result<&'r str> {
    field(record, Some(idx))
        .ok_or_else(|| Error::Import(format!("Line {}: missing {}", line, name)))
}

fn line_of(record: &StringRecord, row: usize) -> u64 {
    record
        .position()
        .map(|p| p.line())
        .unwrap_or(row as u64 + 2)
}

fn at_line(line: u64, e: Error) -> Error {
    match e {
        Error::Import(msg) => Error::Import(format!("Line {}: {}", line, msg)),
        other => other,
    }
}

/// Parse ledger transactions
///
/// A signed `amount` is accepted; when a `kind` column is absent or empty the
/// kind is inferred from the sign. Stored amounts are magnitudes.
pub fn parse_transactions_csv<R: Read>(reader: R) -> Result<Vec<NewTransaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = Columns::new(rdr.headers()?);
    let date_idx = columns.require("date")?;
    let description_idx = columns.require("description")?;
    let amount_idx = columns.require("amount")?;
    let counterparty_idx = columns.index("counterparty");
    let kind_idx = columns.index("kind");

    let mut transactions = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        let line = line_of(&record, row);

        let date = parse_date(required_field(&record, date_idx, "date", line)?)
            .map_err(|e| at_line(line, e))?;
        let description = required_field(&record, description_idx, "description", line)?.to_string();
        let signed = parse_amount(required_field(&record, amount_idx, "amount", line)?)
            .map_err(|e| at_line(line, e))?;

        let kind = match field(&record, kind_idx) {
            Some(k) => k
                .parse::<TransactionKind>()
                .map_err(|e| Error::Import(format!("Line {}: {}", line, e)))?,
            None => TransactionKind::from_sign(signed),
        };
        let counterparty = field(&record, counterparty_idx).map(str::to_string);

        let amount = signed.abs();
        let import_hash = generate_hash(&[
            &date.to_string(),
            &description,
            &format!("{:.2}", amount),
            kind.as_str(),
        ]);

        transactions.push(NewTransaction {
            date,
            description,
            amount,
            kind,
            counterparty,
            import_hash,
        });
    }

    debug!(count = transactions.len(), "Parsed transactions CSV");
    Ok(transactions)
}

/// Parse pending invoices
///
/// `kind` defaults to income (a receivable) when the column is absent.
pub fn parse_invoices_csv<R: Read>(reader: R) -> Result<Vec<NewInvoice>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = Columns::new(rdr.headers()?);
    let number_idx = columns.require("number")?;
    let counterparty_idx = columns.index("counterparty");
    let amount_idx = columns.require("amount")?;
    let due_idx = columns.require("due_date")?;
    let kind_idx = columns.index("kind");

    let mut invoices = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        let line = line_of(&record, row);

        let number = required_field(&record, number_idx, "number", line)?.to_string();
        let amount = parse_amount(required_field(&record, amount_idx, "amount", line)?)
            .map_err(|e| at_line(line, e))?;
        if amount < 0.0 {
            return Err(Error::Import(format!(
                "Line {}: invoice amount must not be negative: {}",
                line, amount
            )));
        }
        let due_date = parse_date(required_field(&record, due_idx, "due_date", line)?)
            .map_err(|e| at_line(line, e))?;

        let kind = match field(&record, kind_idx) {
            Some(k) => k
                .parse::<TransactionKind>()
                .map_err(|e| Error::Import(format!("Line {}: {}", line, e)))?,
            None => TransactionKind::Income,
        };
        let counterparty = field(&record, counterparty_idx).map(str::to_string);

        let import_hash = generate_hash(&["invoice", &number, kind.as_str()]);

        invoices.push(NewInvoice {
            number,
            counterparty,
            amount,
            kind,
            due_date,
            import_hash,
        });
    }

    debug!(count = invoices.len(), "Parsed invoices CSV");
    Ok(invoices)
}

/// Generate a stable hash for deduplication
fn generate_hash(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0x1f]);
    }
    hex::encode(hasher.finalize())
}

/// Parse a date string in one of the accepted formats
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
        "%m/%d/%y", // 01/15/24
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::Import(format!("Unable to parse date: {}", s)))
}

/// Parse an amount string, handling currency symbols, commas and parentheses
pub fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::Import(format!("Unable to parse amount: {}", s)))
}
