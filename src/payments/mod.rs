pub mod amortization;
pub mod assignment;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{InterestError, Result};
use crate::types::{parse_date, InvoiceId, PaymentId};

pub use amortization::{AmortizationSchedule, ScheduleEntry, ScheduleEntryKind};
pub use assignment::{apply_payment_assignment, reconcile_invoice, remove_payment_assignment};

/// portion of a payment applied to one invoice
///
/// `assignment_date` is the effective date for interest purposes and is
/// independent of both the payment's receipt date and the invoice date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AssignmentRecord")]
pub struct Assignment {
    invoice_id: InvoiceId,
    assigned_amount: Money,
    assignment_date: NaiveDate,
    notes: String,
}

impl Assignment {
    pub(crate) fn new(
        invoice_id: InvoiceId,
        assigned_amount: Money,
        assignment_date: NaiveDate,
        notes: String,
    ) -> Self {
        Self {
            invoice_id,
            assigned_amount,
            assignment_date,
            notes,
        }
    }

    pub fn invoice_id(&self) -> &str {
        &self.invoice_id
    }

    pub fn assigned_amount(&self) -> Money {
        self.assigned_amount
    }

    pub fn assignment_date(&self) -> NaiveDate {
        self.assignment_date
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }
}

#[derive(Debug, Deserialize)]
struct AssignmentRecord {
    invoice_id: String,
    assigned_amount: Money,
    assignment_date: String,
    #[serde(default)]
    notes: Option<String>,
}

impl TryFrom<AssignmentRecord> for Assignment {
    type Error = InterestError;

    fn try_from(record: AssignmentRecord) -> Result<Self> {
        let label = format!("assignment to {}", record.invoice_id);
        if !record.assigned_amount.is_positive() {
            return Err(InterestError::malformed(
                &label,
                "assigned_amount",
                format!("must be positive, got {}", record.assigned_amount),
            ));
        }

        let assignment_date =
            parse_date(&format!("{} assignment_date", label), &record.assignment_date)?;

        Ok(Assignment::new(
            record.invoice_id,
            record.assigned_amount,
            assignment_date,
            record.notes.unwrap_or_default(),
        ))
    }
}

/// cash received, split across invoices through assignments
///
/// `unassigned_amount == amount - sum(assigned_amount)` and never goes
/// negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PaymentRecord")]
pub struct Payment {
    pub id: PaymentId,
    pub date: NaiveDate,
    pub description: String,
    amount: Money,
    assignments: Vec<Assignment>,
    unassigned_amount: Money,
}

impl Payment {
    /// create a payment with nothing assigned
    pub fn new(
        id: impl Into<PaymentId>,
        date: NaiveDate,
        description: impl Into<String>,
        amount: Money,
    ) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(InterestError::malformed("payment", "id", "must not be empty"));
        }

        if amount.is_negative() {
            return Err(InterestError::malformed(
                &format!("payment {}", id),
                "amount",
                format!("must not be negative, got {}", amount),
            ));
        }

        Ok(Self {
            id,
            date,
            description: description.into(),
            amount,
            assignments: Vec::new(),
            unassigned_amount: amount,
        })
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    /// assignments in creation order
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn unassigned_amount(&self) -> Money {
        self.unassigned_amount
    }

    pub fn total_assigned(&self) -> Money {
        self.assignments.iter().map(|a| a.assigned_amount).sum()
    }

    /// assignments from this payment to one invoice
    pub fn assignments_to<'a>(&'a self, invoice_id: &'a str) -> impl Iterator<Item = &'a Assignment> + 'a {
        self.assignments.iter().filter(move |a| a.invoice_id == invoice_id)
    }

    pub fn is_fully_assigned(&self) -> bool {
        self.unassigned_amount.is_zero()
    }

    pub(crate) fn push_assignment(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
        self.unassigned_amount = self.amount - self.total_assigned();
    }

    pub(crate) fn take_assignment(&mut self, index: usize) -> Option<Assignment> {
        if index >= self.assignments.len() {
            return None;
        }
        let removed = self.assignments.remove(index);
        self.unassigned_amount = self.amount - self.total_assigned();
        Some(removed)
    }
}

/// on-disk shape; stored `unassigned_amount` is ignored and re-derived
#[derive(Debug, Deserialize)]
struct PaymentRecord {
    id: String,
    date: String,
    description: String,
    amount: Money,
    #[serde(default)]
    assignments: Vec<Assignment>,
}

impl TryFrom<PaymentRecord> for Payment {
    type Error = InterestError;

    fn try_from(record: PaymentRecord) -> Result<Self> {
        let label = format!("payment {}", record.id);
        let date = parse_date(&format!("{} date", label), &record.date)?;
        let mut payment = Payment::new(record.id, date, record.description, record.amount)?;

        let assigned: Money = record.assignments.iter().map(|a| a.assigned_amount).sum();
        if assigned > payment.amount {
            return Err(InterestError::malformed(
                &label,
                "assignments",
                format!("assign {} but the payment is only {}", assigned, payment.amount),
            ));
        }

        payment.assignments = record.assignments;
        payment.unassigned_amount = payment.amount - assigned;
        Ok(payment)
    }
}
