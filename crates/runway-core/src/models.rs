//! Domain models for Runway
//!
//! These are the records the forecasting core reads. They are owned by the
//! ledger (transactions, invoices) or by the market feed (snapshots) and are
//! never mutated by the core.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a cash movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Kind implied by the sign of a ledger amount (credits are income)
    pub fn from_sign(amount: f64) -> Self {
        if amount < 0.0 {
            Self::Expense
        } else {
            Self::Income
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" | "credit" | "in" => Ok(Self::Income),
            "expense" | "debit" | "out" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An observed ledger transaction
///
/// `amount` is always a non-negative magnitude; the direction lives in `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub date: NaiveDate,
    pub amount: f64,
    pub kind: TransactionKind,
    pub description: String,
    pub counterparty: Option<String>,
}

impl TransactionRecord {
    pub fn new(
        date: NaiveDate,
        amount: f64,
        kind: TransactionKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            date,
            amount: amount.abs(),
            kind,
            description: description.into(),
            counterparty: None,
        }
    }

    pub fn with_counterparty(mut self, counterparty: impl Into<String>) -> Self {
        self.counterparty = Some(counterparty.into());
        self
    }

    /// Amount with sign applied: positive for income, negative for expenses
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }

    pub fn to_point(&self) -> HistoricalPoint {
        HistoricalPoint {
            date: self.date,
            amount: self.amount,
        }
    }
}

/// A transaction ready to be stored (from CSV import or manual entry)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub kind: TransactionKind,
    pub counterparty: Option<String>,
    pub import_hash: String,
}

impl NewTransaction {
    pub fn to_record(&self) -> TransactionRecord {
        TransactionRecord {
            date: self.date,
            amount: self.amount.abs(),
            kind: self.kind,
            description: self.description.clone(),
            counterparty: self.counterparty.clone(),
        }
    }
}

/// A single dated value of a historical series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub date: NaiveDate,
    pub amount: f64,
}

impl HistoricalPoint {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self { date, amount }
    }
}

/// Lifecycle of a stored invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            _ => Err(format!("Unknown invoice status: {}", s)),
        }
    }
}

/// An invoice not yet settled
///
/// Income invoices are receivables, expense invoices are payables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingInvoice {
    pub id: i64,
    pub number: String,
    pub counterparty: Option<String>,
    pub amount: f64,
    pub kind: TransactionKind,
    pub due_date: NaiveDate,
}

/// A new invoice ready to be stored
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub number: String,
    pub counterparty: Option<String>,
    pub amount: f64,
    pub kind: TransactionKind,
    pub due_date: NaiveDate,
    pub import_hash: String,
}

/// A pending invoice with its predicted settlement date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingInvoiceRef {
    pub amount: f64,
    pub kind: TransactionKind,
    pub due_date: NaiveDate,
    pub predicted_payment_date: NaiveDate,
}

impl PendingInvoiceRef {
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

/// Macro-economic indicators observed on a given date (rates in percent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub date: NaiveDate,
    pub interest_rate: f64,
    pub inflation_rate: f64,
    pub gdp_growth: f64,
    pub unemployment_rate: f64,
    pub equity_index: Option<f64>,
    pub fx_rate: Option<f64>,
}

/// Scenario-wide asymmetry between conservative and optimistic bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// (conservative, optimistic) multipliers applied to projected flows
    pub fn multipliers(&self) -> (f64, f64) {
        match self {
            Self::Low => (0.95, 1.05),
            Self::Medium => (0.85, 1.15),
            Self::High => (0.70, 1.30),
        }
    }

    /// Parse a risk key, falling back to the default for unknown values
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Unknown risk level, using medium");
            Self::default()
        })
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" | "med" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown risk level: {}", s)),
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scenario overrides supplied by the planning collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Identity used as the persistence key
    pub id: String,
    pub risk_level: RiskLevel,
    /// Pre-scales historical income (percent)
    pub revenue_growth_pct: f64,
    /// Pre-scales historical expenses (percent)
    pub cost_inflation_pct: f64,
}

impl ScenarioConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            risk_level: RiskLevel::default(),
            revenue_growth_pct: 0.0,
            cost_inflation_pct: 0.0,
        }
    }

    pub fn with_risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = risk_level;
        self
    }

    pub fn with_revenue_growth(mut self, pct: f64) -> Self {
        self.revenue_growth_pct = pct;
        self
    }

    pub fn with_cost_inflation(mut self, pct: f64) -> Self {
        self.cost_inflation_pct = pct;
        self
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self::new("default")
    }
}

/// Summary of a persisted forecast run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRun {
    pub scenario_id: String,
    pub horizon: usize,
    pub generated_at: DateTime<Utc>,
}
