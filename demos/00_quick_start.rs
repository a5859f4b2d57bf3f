/// quick start - one invoice, one payment, interest as of a date
use invoice_interest_rs::chrono::NaiveDate;
use invoice_interest_rs::{InterestConfig, InterestEngine, Invoice, Money, Payment, Rate};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 18% a year, 1.5% a month, 30 day grace period
    let engine = InterestEngine::new(InterestConfig::from_annual(Rate::from_percentage(18), 30)?)?;

    let invoice_date = NaiveDate::from_ymd_opt(2023, 1, 15).ok_or("bad date")?;
    let paid_on = NaiveDate::from_ymd_opt(2023, 4, 15).ok_or("bad date")?;
    let as_of = NaiveDate::from_ymd_opt(2024, 4, 15).ok_or("bad date")?;

    let invoice = Invoice::new("INV-001", invoice_date, "Fresh Water Mitigation", Money::from_major(10_000))?;
    let payment = Payment::new("PAY-001", paid_on, "Insurance check", Money::from_major(12_000))?;

    // pay the invoice in full, leaving 2,000 unassigned
    let (invoice, payment) =
        engine.apply_payment_assignment(&invoice, &payment, Money::from_major(10_000), paid_on, "paid in full")?;

    let result = engine.calculate_invoice_interest(&invoice, as_of, &[payment.clone()])?;

    println!("invoice {} is {}", invoice.id, invoice.status());
    println!("payment {} has {} unassigned", payment.id, payment.unassigned_amount());
    for period in &result.interest_periods {
        println!(
            "  {} -> {} ({} days) on {}: {}",
            period.start_date, period.end_date, period.days, period.principal, period.interest_amount
        );
    }
    println!("interest owed: {}", result.total_interest);
    println!("total due: {}", result.total_due());

    Ok(())
}
