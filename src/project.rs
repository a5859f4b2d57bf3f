use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::InterestConfig;
use crate::decimal::{Money, Rate};
use crate::engine::InterestEngine;
use crate::errors::{InterestError, Result};
use crate::invoice::Invoice;
use crate::payments::{self, Payment};
use crate::types::{parse_date, InterestStatus, InvoiceId};

/// invoices, payments and the rates that govern them
///
/// `monthly_rate` is authoritative; `annual_rate` is informational.
/// `as_of_date` is an optional saved reporting date and never consulted by
/// the engine unless [`Project::calculate_interest`] is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProjectRecord")]
pub struct Project {
    pub title: String,
    pub monthly_rate: Rate,
    pub annual_rate: Rate,
    pub grace_days: u32,
    pub as_of_date: Option<NaiveDate>,
    pub invoices: Vec<Invoice>,
    pub payments: Vec<Payment>,
}

impl Project {
    pub fn new(title: impl Into<String>, config: InterestConfig) -> Self {
        Self {
            title: title.into(),
            monthly_rate: config.monthly_rate,
            annual_rate: config.annual_rate,
            grace_days: config.grace_days,
            as_of_date: None,
            invoices: Vec::new(),
            payments: Vec::new(),
        }
    }

    /// load and validate a project document
    pub fn from_json(json: &str) -> Result<Self> {
        let project: Project = serde_json::from_str(json)?;
        project.validate()?;
        Ok(project)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn interest_config(&self) -> InterestConfig {
        InterestConfig {
            monthly_rate: self.monthly_rate,
            annual_rate: self.annual_rate,
            grace_days: self.grace_days,
        }
    }

    pub fn engine(&self) -> Result<InterestEngine> {
        InterestEngine::for_project(self)
    }

    pub fn invoice(&self, id: &str) -> Option<&Invoice> {
        self.invoices.iter().find(|i| i.id == id)
    }

    pub fn payment(&self, id: &str) -> Option<&Payment> {
        self.payments.iter().find(|p| p.id == id)
    }

    /// cash received but not yet assigned to any invoice
    pub fn unassigned_total(&self) -> Money {
        self.payments.iter().map(|p| p.unassigned_amount()).sum()
    }

    /// check rates, id uniqueness and that every assignment has a target
    pub fn validate(&self) -> Result<()> {
        self.interest_config().validate()?;

        let mut invoice_ids = HashSet::new();
        for invoice in &self.invoices {
            if !invoice_ids.insert(invoice.id.as_str()) {
                return Err(InterestError::malformed(
                    "project",
                    "invoices",
                    format!("duplicate invoice id {}", invoice.id),
                ));
            }
        }

        let mut payment_ids = HashSet::new();
        for payment in &self.payments {
            if !payment_ids.insert(payment.id.as_str()) {
                return Err(InterestError::malformed(
                    "project",
                    "payments",
                    format!("duplicate payment id {}", payment.id),
                ));
            }

            for assignment in payment.assignments() {
                if !invoice_ids.contains(assignment.invoice_id()) {
                    return Err(InterestError::InvoiceNotFound {
                        id: assignment.invoice_id().to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// new snapshot with part of a payment assigned to an invoice
    ///
    /// The invoice is reconciled against the whole payment pool before the
    /// balance check, so a stale stored total cannot admit an overpayment.
    pub fn assign(
        &self,
        payment_id: &str,
        invoice_id: &str,
        amount: Money,
        assignment_date: NaiveDate,
        notes: &str,
    ) -> Result<Project> {
        let payment_idx = self.payment_index(payment_id)?;
        let invoice_idx = self.invoice_index(invoice_id)?;

        let invoice = payments::reconcile_invoice(&self.invoices[invoice_idx], &self.payments);
        let (invoice, payment) = payments::apply_payment_assignment(
            &invoice,
            &self.payments[payment_idx],
            amount,
            assignment_date,
            notes,
        )?;

        let mut updated = self.clone();
        updated.invoices[invoice_idx] = invoice;
        updated.payments[payment_idx] = payment;
        Ok(updated)
    }

    /// new snapshot with the `index`-th assignment of a payment removed
    pub fn unassign(&self, payment_id: &str, index: usize) -> Result<Project> {
        let payment_idx = self.payment_index(payment_id)?;
        let payment = &self.payments[payment_idx];

        let invoice_id = payment
            .assignments()
            .get(index)
            .map(|a| a.invoice_id().to_string())
            .ok_or_else(|| InterestError::AssignmentNotFound {
                payment_id: payment_id.to_string(),
                index,
            })?;
        let invoice_idx = self.invoice_index(&invoice_id)?;

        let (_, payment) =
            payments::remove_payment_assignment(&self.invoices[invoice_idx], payment, index)?;

        let mut updated = self.clone();
        updated.payments[payment_idx] = payment;
        updated.invoices[invoice_idx] =
            payments::reconcile_invoice(&self.invoices[invoice_idx], &updated.payments);
        Ok(updated)
    }

    /// new snapshot with every invoice's derived fields rebuilt from assignments
    pub fn reconcile(&self) -> Project {
        let mut updated = self.clone();
        updated.invoices = self
            .invoices
            .iter()
            .map(|invoice| payments::reconcile_invoice(invoice, &self.payments))
            .collect();
        updated
    }

    /// roll-up as of the stored `as_of_date`
    pub fn calculate_interest(&self) -> Result<ProjectInterest> {
        let as_of = self
            .as_of_date
            .ok_or_else(|| InterestError::malformed("project", "as_of_date", "is not set"))?;
        self.engine()?.calculate_total_project_interest(self, as_of)
    }

    fn invoice_index(&self, id: &str) -> Result<usize> {
        self.invoices
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| InterestError::InvoiceNotFound { id: id.to_string() })
    }

    fn payment_index(&self, id: &str) -> Result<usize> {
        self.payments
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| InterestError::PaymentNotFound { id: id.to_string() })
    }
}

#[derive(Debug, Deserialize)]
struct ProjectRecord {
    #[serde(default)]
    title: String,
    monthly_rate: Rate,
    annual_rate: Rate,
    grace_days: u32,
    #[serde(default)]
    as_of_date: Option<String>,
    #[serde(default)]
    invoices: Vec<Invoice>,
    #[serde(default)]
    payments: Vec<Payment>,
}

impl TryFrom<ProjectRecord> for Project {
    type Error = InterestError;

    fn try_from(record: ProjectRecord) -> Result<Self> {
        let as_of_date = match record.as_of_date.as_deref() {
            Some(value) if !value.trim().is_empty() => Some(parse_date("project as_of_date", value)?),
            _ => None,
        };

        Ok(Project {
            title: record.title,
            monthly_rate: record.monthly_rate,
            annual_rate: record.annual_rate,
            grace_days: record.grace_days,
            as_of_date,
            invoices: record.invoices,
            payments: record.payments,
        })
    }
}

/// per-invoice row of a project roll-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceInterestRow {
    pub invoice_id: InvoiceId,
    pub description: String,
    pub principal: Money,
    pub interest: Money,
    pub payments: Money,
    pub balance: Money,
    pub status: InterestStatus,
}

/// totals across every invoice in a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInterest {
    pub calculation_date: NaiveDate,
    pub total_principal: Money,
    pub total_interest: Money,
    pub total_payments: Money,
    /// principal + interest - payments
    pub total_due: Money,
    pub invoice_details: Vec<InvoiceInterestRow>,
}
