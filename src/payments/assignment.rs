use chrono::NaiveDate;
use log::{info, warn};

use crate::decimal::Money;
use crate::errors::{InterestError, Result};
use crate::invoice::Invoice;

use super::{Assignment, Payment};

/// assign part of a payment to an invoice
///
/// Validates against the snapshots passed in and returns updated copies of
/// both records; the arguments are never modified. Interest is not
/// recomputed here.
pub fn apply_payment_assignment(
    invoice: &Invoice,
    payment: &Payment,
    assigned_amount: Money,
    assignment_date: NaiveDate,
    notes: &str,
) -> Result<(Invoice, Payment)> {
    if !assigned_amount.is_positive() {
        return Err(InterestError::InvalidAssignmentAmount {
            amount: assigned_amount,
        });
    }

    if assigned_amount > payment.unassigned_amount() {
        return Err(InterestError::AssignmentExceedsUnassigned {
            assigned: assigned_amount,
            available: payment.unassigned_amount(),
        });
    }

    if assigned_amount > invoice.balance() {
        return Err(InterestError::AssignmentExceedsBalance {
            assigned: assigned_amount,
            balance: invoice.balance(),
        });
    }

    let mut updated_payment = payment.clone();
    updated_payment.push_assignment(Assignment::new(
        invoice.id.clone(),
        assigned_amount,
        assignment_date,
        notes.to_string(),
    ));

    let mut updated_invoice = invoice.clone();
    updated_invoice.set_total_payments(invoice.total_payments() + assigned_amount);
    updated_invoice.set_last_payment_date(Some(assignment_date));

    info!(
        "assigned {} from {} to {} effective {} ({} -> {})",
        assigned_amount,
        payment.id,
        invoice.id,
        assignment_date,
        invoice.status(),
        updated_invoice.status()
    );

    Ok((updated_invoice, updated_payment))
}

/// undo the `index`-th assignment of `payment`, which must target `invoice`
///
/// Returns updated copies. The invoice can move back from paid to partial or
/// open. When the removed assignment carried `last_payment_date`, the date is
/// re-derived from this payment's remaining assignments to the invoice and
/// cleared once nothing remains assigned. Assignments from other payments are
/// not visible here; use [`reconcile_invoice`] against the full pool for those.
pub fn remove_payment_assignment(
    invoice: &Invoice,
    payment: &Payment,
    index: usize,
) -> Result<(Invoice, Payment)> {
    let not_found = || InterestError::AssignmentNotFound {
        payment_id: payment.id.clone(),
        index,
    };

    let target = payment.assignments().get(index).ok_or_else(not_found)?;
    if target.invoice_id() != invoice.id {
        return Err(not_found());
    }

    let mut updated_payment = payment.clone();
    let removed = updated_payment.take_assignment(index).ok_or_else(not_found)?;

    let mut updated_invoice = invoice.clone();
    let remaining = invoice.total_payments().saturating_sub(removed.assigned_amount());
    updated_invoice.set_total_payments(remaining);
    if remaining.is_zero() {
        updated_invoice.set_last_payment_date(None);
    } else if invoice.last_payment_date() == Some(removed.assignment_date()) {
        let latest = updated_payment
            .assignments_to(&invoice.id)
            .map(|a| a.assignment_date())
            .max();
        updated_invoice.set_last_payment_date(latest);
    }

    info!(
        "removed assignment of {} from {} to {} ({} -> {})",
        removed.assigned_amount(),
        payment.id,
        invoice.id,
        invoice.status(),
        updated_invoice.status()
    );

    Ok((updated_invoice, updated_payment))
}

/// re-derive an invoice's payment fields from every assignment that targets it
///
/// Use before assigning when the stored invoice may be stale.
pub fn reconcile_invoice(invoice: &Invoice, payments: &[Payment]) -> Invoice {
    let assignments: Vec<&Assignment> = payments
        .iter()
        .flat_map(|p| p.assignments_to(&invoice.id))
        .collect();

    let total: Money = assignments.iter().map(|a| a.assigned_amount()).sum();
    let last_payment_date = assignments.iter().map(|a| a.assignment_date()).max();

    if total != invoice.total_payments() {
        warn!(
            "invoice {} recorded payments {} but assignments total {}",
            invoice.id,
            invoice.total_payments(),
            total
        );
    }

    let mut reconciled = invoice.clone();
    reconciled.set_total_payments(total);
    reconciled.set_last_payment_date(last_payment_date);
    reconciled
}
