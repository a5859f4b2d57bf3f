use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{InterestError, Result};
use crate::types::{parse_date, InvoiceId, InvoiceStatus};

/// an issued invoice whose principal accrues interest after the grace period
///
/// `amount` is fixed at creation. `total_payments`, `balance`, `status` and
/// `last_payment_date` are derived and only change through assignment
/// operations; `balance == amount - total_payments` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "InvoiceRecord")]
pub struct Invoice {
    pub id: InvoiceId,
    pub date: NaiveDate,
    pub description: String,
    amount: Money,
    status: InvoiceStatus,
    total_payments: Money,
    balance: Money,
    last_payment_date: Option<NaiveDate>,
}

impl Invoice {
    /// create an open invoice with nothing assigned
    pub fn new(
        id: impl Into<InvoiceId>,
        date: NaiveDate,
        description: impl Into<String>,
        amount: Money,
    ) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(InterestError::malformed("invoice", "id", "must not be empty"));
        }

        if amount.is_negative() {
            return Err(InterestError::malformed(
                &format!("invoice {}", id),
                "amount",
                format!("must not be negative, got {}", amount),
            ));
        }

        Ok(Self {
            id,
            date,
            description: description.into(),
            amount,
            status: InvoiceStatus::Open,
            total_payments: Money::ZERO,
            balance: amount,
            last_payment_date: None,
        })
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn total_payments(&self) -> Money {
        self.total_payments
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn last_payment_date(&self) -> Option<NaiveDate> {
        self.last_payment_date
    }

    /// date interest starts accruing
    pub fn interest_start_date(&self, grace_days: u32) -> Option<NaiveDate> {
        self.date
            .checked_add_signed(chrono::Duration::days(i64::from(grace_days)))
    }

    /// re-derive balance and status from a new payments total
    pub(crate) fn set_total_payments(&mut self, total_payments: Money) {
        self.total_payments = total_payments;
        self.balance = self.amount - total_payments;
        self.status = InvoiceStatus::derive(self.balance, self.total_payments);
    }

    pub(crate) fn set_last_payment_date(&mut self, date: Option<NaiveDate>) {
        self.last_payment_date = date;
    }
}

/// on-disk shape; stored `status` and `balance` are ignored and re-derived
#[derive(Debug, Deserialize)]
struct InvoiceRecord {
    id: String,
    date: String,
    description: String,
    amount: Money,
    #[serde(default)]
    total_payments: Option<Money>,
    #[serde(default)]
    last_payment_date: Option<String>,
}

impl TryFrom<InvoiceRecord> for Invoice {
    type Error = InterestError;

    fn try_from(record: InvoiceRecord) -> Result<Self> {
        let label = format!("invoice {}", record.id);
        let date = parse_date(&format!("{} date", label), &record.date)?;
        let mut invoice = Invoice::new(record.id, date, record.description, record.amount)?;

        let total_payments = record.total_payments.unwrap_or(Money::ZERO);
        if total_payments.is_negative() {
            return Err(InterestError::malformed(
                &label,
                "total_payments",
                format!("must not be negative, got {}", total_payments),
            ));
        }
        invoice.set_total_payments(total_payments);

        let last_payment_date = match record.last_payment_date.as_deref() {
            Some(value) if !value.trim().is_empty() => {
                Some(parse_date(&format!("{} last_payment_date", label), value)?)
            }
            _ => None,
        };
        invoice.set_last_payment_date(last_payment_date);

        Ok(invoice)
    }
}
