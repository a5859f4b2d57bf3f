/// pre-invoice payments - money received before the invoice shrinks its principal
use invoice_interest_rs::chrono::NaiveDate;
use invoice_interest_rs::{InterestConfig, InterestEngine, Invoice, Money, Payment, Rate};

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    Ok(NaiveDate::from_ymd_opt(y, m, d).ok_or("bad date")?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== pre-invoice payments ===\n");

    let engine = InterestEngine::new(InterestConfig::new(Rate::from_bps(150), Rate::from_percentage(18), 30)?)?;

    let mut invoice = Invoice::new(
        "INV-FW-001",
        date(2023, 4, 28)?,
        "Fresh Water Principal",
        Money::from_str_exact("13365247.68")?,
    )?;

    // deductibles paid months before the invoice was issued
    let received = [
        ("PAY-001", date(2023, 1, 4)?, "Flood Deductible", 100_000),
        ("PAY-002", date(2023, 1, 24)?, "WIND Deductible", 860_000),
        ("PAY-003", date(2023, 2, 21)?, "WIND Balance", 2_700_000),
    ];

    let mut payments = Vec::new();
    for (id, on, description, amount) in received {
        let payment = Payment::new(id, on, description, Money::from_major(amount))?;
        let (updated, payment) =
            engine.apply_payment_assignment(&invoice, &payment, Money::from_major(amount), on, description)?;
        invoice = updated;
        payments.push(payment);
    }

    let as_of = date(2025, 9, 5)?;
    let result = engine.calculate_invoice_interest(&invoice, as_of, &payments)?;

    println!("invoice amount:      {}", invoice.amount());
    println!("applied before start: {}", result.total_payments_applied);
    println!("effective principal: {}", result.effective_principal);
    println!("interest through {}: {}", as_of, result.total_interest);
    println!("status: {}\n", result.status);

    println!("=== amortization schedule ===\n");
    let schedule = engine.generate_amortization_schedule(&invoice, as_of, &payments)?;
    for entry in &schedule.entries {
        println!(
            "{}  {:<40} interest {:>14}  payment {:>14}  balance {:>14}",
            entry.date, entry.description, entry.interest, entry.payment, entry.balance
        );
    }
    println!("\nending balance: {}", schedule.ending_balance);

    Ok(())
}
