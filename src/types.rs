use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{InterestError, Result};

/// stable invoice identifier, e.g. `INV-FW-001`
pub type InvoiceId = String;

/// stable payment identifier, e.g. `PAY-36A47D0E`
pub type PaymentId = String;

/// iso date format used for every date field
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// bookkeeping status of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// nothing assigned yet
    #[default]
    Open,
    /// some money assigned, balance remains
    Partial,
    /// balance at or below zero
    Paid,
}

impl InvoiceStatus {
    /// derive status from balance and total payments
    pub fn derive(balance: Money, total_payments: Money) -> Self {
        if balance <= Money::ZERO {
            InvoiceStatus::Paid
        } else if total_payments > Money::ZERO {
            InvoiceStatus::Partial
        } else {
            InvoiceStatus::Open
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InvoiceStatus::Open => "open",
            InvoiceStatus::Partial => "partial",
            InvoiceStatus::Paid => "paid",
        };
        f.write_str(s)
    }
}

/// status reported by an interest calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestStatus {
    /// as-of date has not passed the end of the grace period
    WithinGracePeriod,
    Open,
    Partial,
    Paid,
}

impl From<InvoiceStatus> for InterestStatus {
    fn from(status: InvoiceStatus) -> Self {
        match status {
            InvoiceStatus::Open => InterestStatus::Open,
            InvoiceStatus::Partial => InterestStatus::Partial,
            InvoiceStatus::Paid => InterestStatus::Paid,
        }
    }
}

impl fmt::Display for InterestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterestStatus::WithinGracePeriod => f.write_str("within_grace_period"),
            InterestStatus::Open => InvoiceStatus::Open.fmt(f),
            InterestStatus::Partial => InvoiceStatus::Partial.fmt(f),
            InterestStatus::Paid => InvoiceStatus::Paid.fmt(f),
        }
    }
}

/// parse a `YYYY-MM-DD` date, naming the field on failure
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| InterestError::InvalidDate {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// new invoice id in the `INV-XXXXXXXX` form
pub fn generate_invoice_id() -> InvoiceId {
    prefixed_id("INV")
}

/// new payment id in the `PAY-XXXXXXXX` form
pub fn generate_payment_id() -> PaymentId {
    prefixed_id("PAY")
}

fn prefixed_id(prefix: &str) -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, simple[..8].to_uppercase())
}
