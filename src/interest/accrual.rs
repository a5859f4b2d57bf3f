use chrono::NaiveDate;
use log::debug;

use crate::decimal::{Money, Rate};
use crate::errors::{InterestError, Result};
use crate::interest::compound::calculate_period_interest;
use crate::interest::InterestPeriod;
use crate::payments::Payment;
use crate::types::PaymentId;

/// assignment targeting one invoice, flattened out of its payment
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceAssignment {
    pub payment_id: PaymentId,
    pub assigned_amount: Money,
    pub assignment_date: NaiveDate,
    pub notes: String,
}

/// all assignments to `invoice_id` across `payments`, oldest first
///
/// Sorting is stable, so assignments sharing a date keep creation order.
pub fn collect_invoice_assignments(invoice_id: &str, payments: &[Payment]) -> Vec<InvoiceAssignment> {
    let mut assignments: Vec<InvoiceAssignment> = payments
        .iter()
        .flat_map(|payment| {
            payment
                .assignments()
                .iter()
                .filter(|a| a.invoice_id() == invoice_id)
                .map(move |a| InvoiceAssignment {
                    payment_id: payment.id.clone(),
                    assigned_amount: a.assigned_amount(),
                    assignment_date: a.assignment_date(),
                    notes: a.notes().to_string(),
                })
        })
        .collect();

    assignments.sort_by_key(|a| a.assignment_date);
    assignments
}

/// principal left once assignments applied before interest starts are removed
///
/// Covers both payments dated before the invoice itself and payments landing
/// inside the grace window. Floored at zero.
pub fn effective_principal(
    amount: Money,
    interest_start: NaiveDate,
    assignments: &[InvoiceAssignment],
) -> Money {
    let reduction: Money = assignments
        .iter()
        .filter(|a| a.assignment_date < interest_start)
        .map(|a| a.assigned_amount)
        .sum();

    amount.saturating_sub(reduction)
}

/// split `[interest_start, as_of)` into periods at each assignment date
///
/// Each period accrues compound interest on the principal outstanding at its
/// start; the assignment at its end then reduces that principal. Generation
/// stops once principal reaches zero. Assignments dated after `as_of` are not
/// boundaries. Fails with `CalculationOverflow` when a period's interest does
/// not fit in a decimal.
pub fn segment_periods(
    principal: Money,
    monthly_rate: Rate,
    interest_start: NaiveDate,
    as_of: NaiveDate,
    assignments: &[InvoiceAssignment],
) -> Result<Vec<InterestPeriod>> {
    let mut boundaries: Vec<(NaiveDate, Money)> = assignments
        .iter()
        .filter(|a| a.assignment_date >= interest_start && a.assignment_date <= as_of)
        .map(|a| (a.assignment_date, a.assigned_amount))
        .collect();
    boundaries.sort_by_key(|&(date, _)| date);
    boundaries.push((as_of, Money::ZERO));

    let mut periods = Vec::new();
    let mut current_principal = principal;
    let mut current_date = interest_start;

    for (boundary, paid) in boundaries {
        if !current_principal.is_positive() {
            break;
        }

        if current_date < boundary {
            let interest_amount =
                calculate_period_interest(current_principal, monthly_rate, current_date, boundary)
                    .ok_or_else(|| InterestError::CalculationOverflow {
                        context: format!(
                            "interest on {} from {} to {}",
                            current_principal, current_date, boundary
                        ),
                    })?;
            let days = (boundary - current_date).num_days() as u32;

            debug!(
                "interest period {} -> {} ({} days) on {}: {}",
                current_date, boundary, days, current_principal, interest_amount
            );

            periods.push(InterestPeriod {
                start_date: current_date,
                end_date: boundary,
                days,
                principal: current_principal,
                interest_rate: monthly_rate,
                interest_amount,
            });
        }

        current_principal = current_principal.saturating_sub(paid);
        current_date = boundary;
    }

    Ok(periods)
}
