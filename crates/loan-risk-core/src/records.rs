//! Input records supplied by the data layer.
//!
//! Covers:
//! 1. **Categorical enums** -- sector, loan status, employment, payment status.
//! 2. **Records** -- loans, customers and repayments as materialised in memory.
//! 3. **Snapshot** -- the immutable bundle every engine entry point reads.
//!
//! The engine never mutates these values.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::types::{Money, Percent, Rate};

// ---------------------------------------------------------------------------
// Categorical enums
// ---------------------------------------------------------------------------

/// Industry sector of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sector {
    Manufacturing,
    Retail,
    It,
    Healthcare,
    RealEstate,
    Agriculture,
}

impl Sector {
    pub const ALL: [Sector; 6] = [
        Sector::Manufacturing,
        Sector::Retail,
        Sector::It,
        Sector::Healthcare,
        Sector::RealEstate,
        Sector::Agriculture,
    ];
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sector::Manufacturing => "MANUFACTURING",
            Sector::Retail => "RETAIL",
            Sector::It => "IT",
            Sector::Healthcare => "HEALTHCARE",
            Sector::RealEstate => "REAL_ESTATE",
            Sector::Agriculture => "AGRICULTURE",
        };
        write!(f, "{}", s)
    }
}

/// Lifecycle status of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Active,
    Closed,
    Npa,
    Restructured,
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoanStatus::Active => "ACTIVE",
            LoanStatus::Closed => "CLOSED",
            LoanStatus::Npa => "NPA",
            LoanStatus::Restructured => "RESTRUCTURED",
        };
        write!(f, "{}", s)
    }
}

/// Employment status of a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentStatus {
    Salaried,
    SelfEmployed,
    BusinessOwner,
    Unemployed,
    Retired,
}

/// Outcome of a single installment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Delayed,
    Missed,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A loan as held by the lender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanRecord {
    pub id: String,
    pub customer_id: String,
    pub principal: Money,
    /// Must not exceed principal; zero once closed.
    pub outstanding: Money,
    pub disbursement_date: NaiveDate,
    pub tenure_months: u32,
    /// Annual interest rate in percent.
    pub interest_rate: Percent,
    pub sector: Sector,
    pub status: LoanStatus,
    /// Product label for the product concentration dimension. When absent the
    /// loan is bucketed by tenure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
}

impl LoanRecord {
    /// Outstanding / principal. Zero for a non-positive principal.
    pub fn outstanding_ratio(&self) -> Rate {
        if self.principal <= Money::ZERO {
            Rate::ZERO
        } else {
            self.outstanding / self.principal
        }
    }

    /// Whole months between disbursement and `as_of`.
    pub fn age_months(&self, as_of: NaiveDate) -> u32 {
        months_between(self.disbursement_date, as_of)
    }

    /// Product label used by the concentration report.
    pub fn product_label(&self) -> String {
        match &self.product {
            Some(p) => p.clone(),
            None if self.tenure_months <= 12 => "SHORT_TERM".to_string(),
            None if self.tenure_months <= 36 => "MEDIUM_TERM".to_string(),
            None => "LONG_TERM".to_string(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.status == LoanStatus::Closed
    }
}

/// A borrower.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: String,
    /// Bureau score, 300-850.
    pub credit_score: u16,
    /// Debt-to-income, percent (0-100).
    pub dti_ratio: Percent,
    pub employment_status: EmploymentStatus,
    /// City label.
    pub geography: String,
    pub age: u32,
    pub monthly_income: Money,
}

/// A single scheduled installment and its outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentRecord {
    pub loan_id: String,
    pub due_date: NaiveDate,
    pub emi_amount: Money,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_amount: Option<Money>,
    pub dpd: u32,
    pub payment_status: PaymentStatus,
}

impl RepaymentRecord {
    /// A payment was made but fell short of the installment.
    pub fn is_partial(&self) -> bool {
        matches!(self.payment_amount, Some(paid) if paid < self.emi_amount)
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Immutable view of loan, customer and repayment data for one engine run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub loans: Vec<LoanRecord>,
    pub customers: Vec<CustomerRecord>,
    #[serde(default)]
    pub repayments: Vec<RepaymentRecord>,
    /// Valuation date used for loan ageing.
    pub as_of: NaiveDate,
}

impl PortfolioSnapshot {
    /// Customers keyed by id.
    pub fn customer_index(&self) -> HashMap<&str, &CustomerRecord> {
        self.customers.iter().map(|c| (c.id.as_str(), c)).collect()
    }

    /// Repayments grouped by loan id, each group ordered by due date.
    pub fn repayments_by_loan(&self) -> HashMap<&str, Vec<&RepaymentRecord>> {
        let mut map: HashMap<&str, Vec<&RepaymentRecord>> = HashMap::new();
        for r in &self.repayments {
            map.entry(r.loan_id.as_str()).or_default().push(r);
        }
        for group in map.values_mut() {
            group.sort_by_key(|r| r.due_date);
        }
        map
    }

    /// Non-closed loans with a usable (non-negative) outstanding amount.
    pub fn exposure_loans(&self) -> impl Iterator<Item = &LoanRecord> {
        self.loans
            .iter()
            .filter(|l| !l.is_closed() && l.outstanding >= Money::ZERO)
    }
}

/// DPD of the most recent installment, or zero without history.
pub fn latest_dpd(repayments: &[&RepaymentRecord]) -> u32 {
    repayments
        .iter()
        .max_by_key(|r| r.due_date)
        .map(|r| r.dpd)
        .unwrap_or(0)
}

fn months_between(start: NaiveDate, end: NaiveDate) -> u32 {
    if end <= start {
        return 0;
    }
    let mut months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    if end.day() < start.day() {
        months -= 1;
    }
    months.max(0) as u32
}
