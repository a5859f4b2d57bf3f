pub mod config;
pub mod decimal;
pub mod engine;
pub mod errors;
pub mod interest;
pub mod invoice;
pub mod payments;
pub mod project;
pub mod types;

// re-export key types
pub use config::InterestConfig;
pub use decimal::{Money, Rate};
pub use engine::InterestEngine;
pub use errors::{InterestError, Result};
pub use interest::{
    calculate_compound_interest, calculate_simple_interest, months_between, InterestPeriod,
    InvoiceInterest,
};
pub use invoice::Invoice;
pub use payments::{
    apply_payment_assignment, reconcile_invoice, remove_payment_assignment, AmortizationSchedule,
    Assignment, Payment, ScheduleEntry, ScheduleEntryKind,
};
pub use project::{InvoiceInterestRow, Project, ProjectInterest};
pub use types::{
    generate_invoice_id, generate_payment_id, InterestStatus, InvoiceId, InvoiceStatus, PaymentId,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
