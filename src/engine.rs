use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use log::{debug, trace, warn};

use crate::config::InterestConfig;
use crate::decimal::Money;
use crate::errors::{InterestError, Result};
use crate::interest::{
    collect_invoice_assignments, effective_principal, segment_periods, InvoiceInterest,
};
use crate::invoice::Invoice;
use crate::payments::{self, AmortizationSchedule, Payment};
use crate::project::{InvoiceInterestRow, Project, ProjectInterest};
use crate::types::{InterestStatus, InvoiceStatus};

/// interest calculation and payment assignment over one rate configuration
///
/// Holds no state beyond its configuration. Every operation is a pure
/// function of its arguments; mutations hand back fresh copies.
#[derive(Debug, Clone)]
pub struct InterestEngine {
    config: InterestConfig,
}

impl InterestEngine {
    pub fn new(config: InterestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// engine configured with a project's stored rates
    pub fn for_project(project: &Project) -> Result<Self> {
        Self::new(project.interest_config())
    }

    pub fn config(&self) -> &InterestConfig {
        &self.config
    }

    /// first day interest accrues for `invoice`
    pub fn interest_start_date(&self, invoice: &Invoice) -> Result<NaiveDate> {
        invoice
            .interest_start_date(self.config.grace_days)
            .ok_or_else(|| InterestError::InvalidDate {
                field: format!("invoice {} date", invoice.id),
                value: invoice.date.to_string(),
            })
    }

    /// accrued compound interest on one invoice through `as_of`
    ///
    /// `payments` is the whole project pool; only assignments targeting this
    /// invoice are used.
    pub fn calculate_invoice_interest(
        &self,
        invoice: &Invoice,
        as_of: NaiveDate,
        payments: &[Payment],
    ) -> Result<InvoiceInterest> {
        let interest_start = self.interest_start_date(invoice)?;

        if as_of <= interest_start {
            debug!(
                "invoice {} within grace period until {} (as of {})",
                invoice.id, interest_start, as_of
            );
            return Ok(InvoiceInterest {
                invoice_id: invoice.id.clone(),
                total_interest: Money::ZERO,
                interest_periods: Vec::new(),
                current_balance: invoice.amount(),
                total_payments_applied: Money::ZERO,
                effective_principal: invoice.amount(),
                status: InterestStatus::WithinGracePeriod,
            });
        }

        let assignments = collect_invoice_assignments(&invoice.id, payments);
        let principal = effective_principal(invoice.amount(), interest_start, &assignments);

        let interest_periods = segment_periods(
            principal,
            self.config.monthly_rate,
            interest_start,
            as_of,
            &assignments,
        )
        .map_err(|e| {
            warn!("invoice {}: {}", invoice.id, e);
            e
        })?;

        let total_interest = interest_periods.iter().try_fold(Money::ZERO, |acc, p| {
            checked_add(acc, p.interest_amount, || format!("invoice {} total interest", invoice.id))
        })?;
        // principal plus every accrual bounds the running balance of a schedule
        checked_add(invoice.amount(), total_interest, || {
            format!("invoice {} amount plus interest", invoice.id)
        })?;

        let total_payments_applied = assignments.iter().try_fold(Money::ZERO, |acc, a| {
            checked_add(acc, a.assigned_amount, || format!("invoice {} payments applied", invoice.id))
        })?;
        let current_balance = invoice.amount() - total_payments_applied;
        let status = InvoiceStatus::derive(current_balance, total_payments_applied).into();

        debug!(
            "invoice {}: {} periods, interest {}, balance {}",
            invoice.id,
            interest_periods.len(),
            total_interest,
            current_balance
        );

        Ok(InvoiceInterest {
            invoice_id: invoice.id.clone(),
            total_interest,
            interest_periods,
            current_balance,
            total_payments_applied,
            effective_principal: principal,
            status,
        })
    }

    /// assign part of `payment` to `invoice`; see [`payments::apply_payment_assignment`]
    pub fn apply_payment_assignment(
        &self,
        invoice: &Invoice,
        payment: &Payment,
        assigned_amount: Money,
        assignment_date: NaiveDate,
        notes: &str,
    ) -> Result<(Invoice, Payment)> {
        payments::apply_payment_assignment(invoice, payment, assigned_amount, assignment_date, notes)
    }

    /// undo one assignment; see [`payments::remove_payment_assignment`]
    pub fn remove_payment_assignment(
        &self,
        invoice: &Invoice,
        payment: &Payment,
        index: usize,
    ) -> Result<(Invoice, Payment)> {
        payments::remove_payment_assignment(invoice, payment, index)
    }

    /// roll up interest, principal and payments across every invoice
    pub fn calculate_total_project_interest(
        &self,
        project: &Project,
        as_of: NaiveDate,
    ) -> Result<ProjectInterest> {
        let mut total_principal = Money::ZERO;
        let mut total_interest = Money::ZERO;
        let mut total_payments = Money::ZERO;
        let mut invoice_details = Vec::with_capacity(project.invoices.len());

        for invoice in &project.invoices {
            let result = self.calculate_invoice_interest(invoice, as_of, &project.payments)?;

            total_principal = checked_add(total_principal, invoice.amount(), || "project principal".to_string())?;
            total_interest = checked_add(total_interest, result.total_interest, || "project interest".to_string())?;
            total_payments = checked_add(total_payments, result.total_payments_applied, || {
                "project payments".to_string()
            })?;

            trace!(
                "rollup {}: principal {}, interest {}, payments {}",
                invoice.id,
                invoice.amount(),
                result.total_interest,
                result.total_payments_applied
            );

            invoice_details.push(InvoiceInterestRow {
                invoice_id: invoice.id.clone(),
                description: invoice.description.clone(),
                principal: invoice.amount(),
                interest: result.total_interest,
                payments: result.total_payments_applied,
                balance: result.current_balance,
                status: result.status,
            });
        }

        let total_due = checked_add(total_principal, total_interest, || "project total due".to_string())?
            - total_payments;

        Ok(ProjectInterest {
            calculation_date: as_of,
            total_principal,
            total_interest,
            total_payments,
            total_due,
            invoice_details,
        })
    }

    /// project roll-up as of the time provider's current date
    pub fn calculate_total_project_interest_at(
        &self,
        project: &Project,
        time_provider: &SafeTimeProvider,
    ) -> Result<ProjectInterest> {
        let as_of = time_provider.now().date_naive();
        self.calculate_total_project_interest(project, as_of)
    }

    /// chronological accrual and payment ledger for one invoice
    pub fn generate_amortization_schedule(
        &self,
        invoice: &Invoice,
        as_of: NaiveDate,
        payments: &[Payment],
    ) -> Result<AmortizationSchedule> {
        let interest = self.calculate_invoice_interest(invoice, as_of, payments)?;
        let assignments = collect_invoice_assignments(&invoice.id, payments);
        Ok(AmortizationSchedule::build(invoice, &interest, &assignments, as_of))
    }
}

fn checked_add(a: Money, b: Money, context: impl FnOnce() -> String) -> Result<Money> {
    a.checked_add(b)
        .ok_or_else(|| InterestError::CalculationOverflow { context: context() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn engine(grace_days: u32) -> InterestEngine {
        InterestEngine::new(InterestConfig::from_annual(Rate::from_percentage(18), grace_days).unwrap()).unwrap()
    }

    fn money(s: &str) -> Money {
        Money::from_str_exact(s).unwrap()
    }

    #[test]
    fn test_grace_period_boundary() {
        let engine = engine(30);
        let invoice = Invoice::new("INV-001", date(2023, 1, 15), "d", Money::from_major(10_000)).unwrap();

        let at_boundary = engine
            .calculate_invoice_interest(&invoice, date(2023, 2, 14), &[])
            .unwrap();
        assert!(at_boundary.is_within_grace_period());
        assert_eq!(at_boundary.total_interest, Money::ZERO);
        assert_eq!(at_boundary.current_balance, Money::from_major(10_000));
        assert!(at_boundary.interest_periods.is_empty());

        let day_after = engine
            .calculate_invoice_interest(&invoice, date(2023, 2, 15), &[])
            .unwrap();
        assert_eq!(day_after.status, InterestStatus::Open);
        assert_eq!(day_after.interest_periods.len(), 1);
        assert_eq!(day_after.interest_periods[0].days, 1);
        assert_eq!(day_after.total_interest, money("4.89"));
    }

    #[test]
    fn test_concrete_scenario() {
        let engine = engine(30);
        let invoice = Invoice::new("INV-001", date(2023, 1, 15), "Invoice", money("10000.00")).unwrap();
        let payment = Payment::new("PAY-001", date(2023, 4, 15), "Payment", money("12000.00")).unwrap();

        let (invoice, payment) = engine
            .apply_payment_assignment(&invoice, &payment, money("10000.00"), date(2023, 4, 15), "")
            .unwrap();
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
        assert_eq!(payment.unassigned_amount(), money("2000.00"));

        let result = engine
            .calculate_invoice_interest(&invoice, date(2024, 4, 15), &[payment])
            .unwrap();

        assert_eq!(result.interest_periods.len(), 1);
        let period = &result.interest_periods[0];
        assert_eq!(period.start_date, date(2023, 2, 14));
        assert_eq!(period.end_date, date(2023, 4, 15));
        assert_eq!(period.days, 60);
        assert_eq!(period.interest_rate.as_decimal(), dec!(0.015));
        assert_eq!(result.total_interest, money("297.84"));
        assert_eq!(result.status, InterestStatus::Paid);
        assert_eq!(result.current_balance, Money::ZERO);
    }

    #[test]
    fn test_pre_invoice_payments_reduce_principal() {
        let engine = engine(30);
        let invoice = Invoice::new("INV-FW-001", date(2023, 4, 28), "Fresh Water Principal", money("13365247.68")).unwrap();

        let mut payments = Vec::new();
        let mut current = invoice.clone();
        for (id, on, amount) in [
            ("PAY-001", date(2023, 1, 4), "100000.00"),
            ("PAY-002", date(2023, 1, 24), "860000.00"),
            ("PAY-003", date(2023, 2, 21), "2700000.00"),
        ] {
            let payment = Payment::new(id, on, "deductible", money(amount)).unwrap();
            let (inv, pay) = engine
                .apply_payment_assignment(&current, &payment, money(amount), on, "pre-invoice")
                .unwrap();
            current = inv;
            payments.push(pay);
        }

        let result = engine
            .calculate_invoice_interest(&invoice, date(2025, 9, 5), &payments)
            .unwrap();

        assert_eq!(result.effective_principal, money("9705247.68"));
        assert_eq!(result.interest_periods.len(), 1);
        assert_eq!(result.interest_periods[0].principal, money("9705247.68"));
        assert_eq!(result.interest_periods[0].start_date, date(2023, 5, 28));
        assert_eq!(result.total_interest, money("4867502.71"));
        assert_eq!(result.total_payments_applied, money("3660000.00"));
        assert_eq!(result.current_balance, money("9705247.68"));
        assert_eq!(result.status, InterestStatus::Partial);
    }

    #[test]
    fn test_grace_window_assignment_reduces_principal() {
        let engine = engine(30);
        let invoice = Invoice::new("INV-1", date(2023, 1, 1), "d", Money::from_major(10_000)).unwrap();
        let payment = Payment::new("PAY-1", date(2023, 1, 10), "p", Money::from_major(4_000)).unwrap();
        let (_, payment) = engine
            .apply_payment_assignment(&invoice, &payment, Money::from_major(4_000), date(2023, 1, 10), "")
            .unwrap();

        let result = engine
            .calculate_invoice_interest(&invoice, date(2023, 6, 30), &[payment])
            .unwrap();
        assert_eq!(result.effective_principal, Money::from_major(6_000));
        assert_eq!(result.interest_periods.len(), 1);
        assert_eq!(result.interest_periods[0].principal, Money::from_major(6_000));
    }

    #[test]
    fn test_unbroken_period_matches_closed_form() {
        let engine = InterestEngine::new(InterestConfig::new(Rate::from_bps(150), Rate::from_percentage(18), 0).unwrap()).unwrap();
        let invoice = Invoice::new("INV-1", date(2023, 1, 1), "d", Money::from_major(10_000)).unwrap();

        let result = engine
            .calculate_invoice_interest(&invoice, date(2024, 1, 1), &[])
            .unwrap();

        let months = crate::interest::months_for_days(365);
        let closed = crate::interest::calculate_compound_interest(invoice.amount(), Rate::from_bps(150), months).unwrap();
        let diff = (result.total_interest - closed).abs();
        assert!(diff <= Money::CENT, "diff {}", diff);
    }

    #[test]
    fn test_multiple_payments_amortize() {
        let engine = engine(30);
        let invoice = Invoice::new("INV-1", date(2023, 1, 1), "d", Money::from_major(10_000)).unwrap();
        let payment = Payment::new("PAY-1", date(2023, 3, 31), "p", Money::from_major(4_000)).unwrap();
        let (_, payment) = engine
            .apply_payment_assignment(&invoice, &payment, Money::from_major(4_000), date(2023, 3, 31), "")
            .unwrap();

        let result = engine
            .calculate_invoice_interest(&invoice, date(2023, 6, 30), &[payment])
            .unwrap();

        assert_eq!(result.interest_periods.len(), 2);
        assert_eq!(result.total_interest, money("565.92"));
        assert_eq!(result.current_balance, Money::from_major(6_000));
        assert_eq!(result.status, InterestStatus::Partial);
        assert_eq!(result.total_due(), money("6565.92"));
    }

    #[test]
    fn test_overpaid_invoice_reads_paid() {
        let engine = engine(0);
        let invoice = Invoice::new("INV-1", date(2023, 1, 1), "d", Money::from_major(1_000)).unwrap();
        let payments: Vec<Payment> = serde_json::from_str(
            r#"[{"id": "PAY-1", "date": "2023-02-01", "description": "p", "amount": 1500.0,
                 "assignments": [{"invoice_id": "INV-1", "assigned_amount": 1500.0, "assignment_date": "2023-02-01"}]}]"#,
        )
        .unwrap();

        let result = engine
            .calculate_invoice_interest(&invoice, date(2023, 12, 31), &payments)
            .unwrap();
        assert_eq!(result.status, InterestStatus::Paid);
        assert_eq!(result.current_balance, Money::from_major(-500));
        assert_eq!(result.interest_periods.len(), 1);
    }

    #[test]
    fn test_project_rollup() {
        let project = Project::from_json(
            r#"{
                "monthly_rate": 0.015, "annual_rate": 0.18, "grace_days": 30,
                "invoices": [
                    {"id": "INV-FW-001", "date": "2023-04-28", "description": "Fresh Water Principal", "amount": 13365247.68},
                    {"id": "INV-DW-001", "date": "2023-04-28", "description": "Dirty Water Principal", "amount": 1113503.81}
                ],
                "payments": [
                    {"id": "PAY-001", "date": "2023-01-04", "description": "Flood Deductible", "amount": 100000.0,
                     "assignments": [{"invoice_id": "INV-FW-001", "assigned_amount": 100000.0, "assignment_date": "2023-01-04"}]},
                    {"id": "PAY-002", "date": "2023-01-24", "description": "WIND Deductible", "amount": 860000.0,
                     "assignments": [{"invoice_id": "INV-FW-001", "assigned_amount": 860000.0, "assignment_date": "2023-01-24"}]},
                    {"id": "PAY-003", "date": "2023-02-21", "description": "WIND Balance", "amount": 2700000.0,
                     "assignments": [{"invoice_id": "INV-FW-001", "assigned_amount": 2700000.0, "assignment_date": "2023-02-21"}]}
                ]
            }"#,
        )
        .unwrap();

        let engine = InterestEngine::for_project(&project).unwrap();
        let rollup = engine
            .calculate_total_project_interest(&project, date(2025, 9, 5))
            .unwrap();

        assert_eq!(rollup.invoice_details.len(), 2);
        assert_eq!(rollup.total_principal, money("14478751.49"));
        assert_eq!(rollup.total_payments, money("3660000.00"));
        assert_eq!(rollup.invoice_details[0].interest, money("4867502.71"));
        assert_eq!(rollup.invoice_details[1].interest, money("558458.99"));
        assert_eq!(rollup.invoice_details[1].status, InterestStatus::Open);
        assert_eq!(rollup.total_interest, money("5425961.70"));
        assert_eq!(
            rollup.total_due,
            rollup.total_principal + rollup.total_interest - rollup.total_payments
        );
    }

    #[test]
    fn test_project_rollup_with_time_provider() {
        let project = Project::from_json(
            r#"{"monthly_rate": 0.015, "annual_rate": 0.18, "grace_days": 30,
                "invoices": [{"id": "INV-1", "date": "2023-01-15", "description": "d", "amount": 10000.0}],
                "payments": []}"#,
        )
        .unwrap();
        let engine = InterestEngine::for_project(&project).unwrap();

        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2023, 2, 15, 12, 0, 0).unwrap(),
        ));
        let rollup = engine.calculate_total_project_interest_at(&project, &time).unwrap();

        assert_eq!(rollup.calculation_date, date(2023, 2, 15));
        assert_eq!(rollup.total_interest, money("4.89"));
    }

    #[test]
    fn test_empty_project_rolls_up_to_zero() {
        let project = Project::new("Empty", InterestConfig::new(Rate::from_bps(150), Rate::from_percentage(18), 30).unwrap());
        let rollup = engine(30)
            .calculate_total_project_interest(&project, date(2024, 1, 1))
            .unwrap();
        assert!(rollup.invoice_details.is_empty());
        assert_eq!(rollup.total_due, Money::ZERO);
    }

    #[test]
    fn test_schedule_through_engine() {
        let engine = engine(30);
        let invoice = Invoice::new("INV-001", date(2023, 1, 15), "d", Money::from_major(10_000)).unwrap();
        let payment = Payment::new("PAY-001", date(2023, 4, 15), "p", Money::from_major(12_000)).unwrap();
        let (_, payment) = engine
            .apply_payment_assignment(&invoice, &payment, Money::from_major(10_000), date(2023, 4, 15), "")
            .unwrap();

        let schedule = engine
            .generate_amortization_schedule(&invoice, date(2023, 12, 31), &[payment])
            .unwrap();

        assert_eq!(schedule.entries.len(), 2);
        assert_eq!(schedule.total_interest, money("297.84"));
        assert_eq!(schedule.ending_balance, money("297.84"));
    }

    #[test]
    fn test_long_horizon_overflow_is_an_error() {
        let engine = InterestEngine::new(InterestConfig::new(Rate::from_percentage(50), Rate::ZERO, 0).unwrap()).unwrap();
        let invoice = Invoice::new("INV-1", date(2000, 1, 1), "d", Money::from_major(10_000)).unwrap();

        let err = engine
            .calculate_invoice_interest(&invoice, date(2015, 1, 1), &[])
            .unwrap_err();
        assert!(matches!(err, InterestError::CalculationOverflow { .. }));

        let project = Project::from_json(
            r#"{"monthly_rate": 0.015, "annual_rate": 0.18, "grace_days": 30,
                "invoices": [{"id": "INV-FW-001", "date": "2023-04-28", "description": "d", "amount": 13365247.68}]}"#,
        )
        .unwrap();
        let engine = InterestEngine::for_project(&project).unwrap();
        assert!(engine.calculate_total_project_interest(&project, date(2400, 1, 1)).is_err());
        assert!(engine
            .generate_amortization_schedule(&project.invoices[0], date(2400, 1, 1), &[])
            .is_err());

        // shorter horizons still compute
        assert!(engine.calculate_total_project_interest(&project, date(2100, 1, 1)).is_ok());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = InterestConfig {
            monthly_rate: Rate::from_decimal(Decimal::NEGATIVE_ONE),
            annual_rate: Rate::ZERO,
            grace_days: 0,
        };
        assert!(InterestEngine::new(config).is_err());
    }
}
