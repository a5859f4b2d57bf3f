use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::interest::{InterestPeriod, InvoiceAssignment, InvoiceInterest};
use crate::invoice::Invoice;
use crate::types::InvoiceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleEntryKind {
    Payment,
    InterestAccrual,
}

/// one row in an invoice's amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: ScheduleEntryKind,
    pub description: String,
    /// principal the accrual was computed on; zero for payment rows
    pub principal: Money,
    pub interest: Money,
    pub payment: Money,
    /// principal outstanding plus accrued interest after this row
    pub balance: Money,
}

/// chronological ledger of accruals and payments for one invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub invoice_id: InvoiceId,
    pub as_of_date: NaiveDate,
    pub entries: Vec<ScheduleEntry>,
    pub total_interest: Money,
    pub total_payments: Money,
    pub ending_balance: Money,
}

impl AmortizationSchedule {
    /// build from a finished interest calculation
    ///
    /// Assignments dated after `as_of_date` are left out. A payment on the
    /// same day as an accrual is listed after it.
    pub fn build(
        invoice: &Invoice,
        interest: &InvoiceInterest,
        assignments: &[InvoiceAssignment],
        as_of_date: NaiveDate,
    ) -> Self {
        let mut entries = Vec::new();
        let mut balance = invoice.amount();
        let mut pending = assignments
            .iter()
            .filter(|a| a.assignment_date <= as_of_date)
            .peekable();

        for period in &interest.interest_periods {
            while let Some(assignment) = pending.next_if(|a| a.assignment_date < period.end_date) {
                balance -= assignment.assigned_amount;
                entries.push(payment_entry(assignment, balance));
            }

            balance += period.interest_amount;
            entries.push(accrual_entry(period, balance));
        }

        for assignment in pending {
            balance -= assignment.assigned_amount;
            entries.push(payment_entry(assignment, balance));
        }

        let total_interest = entries.iter().map(|e| e.interest).sum();
        let total_payments = entries.iter().map(|e| e.payment).sum();

        Self {
            invoice_id: invoice.id.clone(),
            as_of_date,
            entries,
            total_interest,
            total_payments,
            ending_balance: balance,
        }
    }

    pub fn payments(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries
            .iter()
            .filter(|e| e.kind == ScheduleEntryKind::Payment)
    }

    pub fn accruals(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries
            .iter()
            .filter(|e| e.kind == ScheduleEntryKind::InterestAccrual)
    }
}

fn payment_entry(assignment: &InvoiceAssignment, balance: Money) -> ScheduleEntry {
    ScheduleEntry {
        date: assignment.assignment_date,
        kind: ScheduleEntryKind::Payment,
        description: format!("Payment applied (ID: {})", assignment.payment_id),
        principal: Money::ZERO,
        interest: Money::ZERO,
        payment: assignment.assigned_amount,
        balance,
    }
}

fn accrual_entry(period: &InterestPeriod, balance: Money) -> ScheduleEntry {
    ScheduleEntry {
        date: period.end_date,
        kind: ScheduleEntryKind::InterestAccrual,
        description: format!("Interest accrual ({} days)", period.days),
        principal: period.principal,
        interest: period.interest_amount,
        payment: Money::ZERO,
        balance,
    }
}
