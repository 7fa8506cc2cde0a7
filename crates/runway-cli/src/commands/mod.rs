//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init) and shared utilities (open_db, load_config)
//! - `import` - CSV import of transactions and invoices
//! - `invoices` - Pending invoice commands (list, paid)
//! - `market` - Market snapshot commands (add, list, fetch)
//! - `recurring` - Recurring item detection
//! - `forecast` - Forecast generation and stored forecast inspection
//! - `models` - Forecast model listing and backtests

pub mod core;
pub mod forecast;
pub mod import;
pub mod invoices;
pub mod market;
pub mod models;
pub mod recurring;

// Re-export command functions for main.rs
pub use core::*;
pub use forecast::*;
pub use import::*;
pub use invoices::*;
pub use market::*;
pub use models::*;
pub use recurring::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format a signed amount with thousands separators
pub fn format_amount(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{:02}", sign, grouped, cents % 100)
}
