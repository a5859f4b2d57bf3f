pub mod accrual;
pub mod compound;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{InterestStatus, InvoiceId};

pub use accrual::{collect_invoice_assignments, effective_principal, segment_periods, InvoiceAssignment};
pub use compound::{
    calculate_compound_interest, calculate_period_interest, calculate_simple_interest,
    compound_factor, months_for_days, DAYS_PER_MONTH,
};

/// fractional months between two dates
pub fn months_between(start: NaiveDate, end: NaiveDate) -> Decimal {
    months_for_days((end - start).num_days())
}

/// one stretch of time over which a single principal accrues interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: u32,
    pub principal: Money,
    /// monthly rate applied
    pub interest_rate: Rate,
    pub interest_amount: Money,
}

/// interest calculation result for one invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceInterest {
    pub invoice_id: InvoiceId,
    pub total_interest: Money,
    pub interest_periods: Vec<InterestPeriod>,
    pub current_balance: Money,
    pub total_payments_applied: Money,
    /// principal left after assignments dated before interest started
    pub effective_principal: Money,
    pub status: InterestStatus,
}

impl InvoiceInterest {
    /// balance plus accrued interest
    pub fn total_due(&self) -> Money {
        self.current_balance + self.total_interest
    }

    pub fn is_within_grace_period(&self) -> bool {
        self.status == InterestStatus::WithinGracePeriod
    }
}
