/// project json - load a project, assign money, roll up interest
use chrono::{NaiveDate, TimeZone, Utc};
use invoice_interest_rs::{Money, Project, SafeTimeProvider, TimeSource};

const PROJECT: &str = r#"{
    "title": "Harbor Claim",
    "monthly_rate": 0.015,
    "annual_rate": 0.18,
    "grace_days": 30,
    "as_of_date": "2025-09-05",
    "invoices": [
        {"id": "INV-FW-001", "date": "2023-04-28", "description": "Fresh Water Principal", "amount": 13365247.68},
        {"id": "INV-DW-001", "date": "2023-04-28", "description": "Dirty Water Principal", "amount": 1113503.81}
    ],
    "payments": [
        {"id": "PAY-001", "date": "2023-01-04", "description": "Flood Deductible", "amount": 100000.0},
        {"id": "PAY-004", "date": "2023-05-15", "description": "Drywall Payment", "amount": 150000.0}
    ]
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== project json ===\n");

    let project = Project::from_json(PROJECT)?;
    println!("loaded {} with {} invoices\n", project.title, project.invoices.len());

    let project = project
        .assign(
            "PAY-001",
            "INV-FW-001",
            Money::from_major(100_000),
            NaiveDate::from_ymd_opt(2023, 1, 4).ok_or("bad date")?,
            "deductible",
        )?
        .assign(
            "PAY-004",
            "INV-DW-001",
            Money::from_major(150_000),
            NaiveDate::from_ymd_opt(2023, 5, 15).ok_or("bad date")?,
            "",
        )?;

    let rollup = project.calculate_interest()?;
    for row in &rollup.invoice_details {
        println!(
            "{:<12} principal {:>14}  interest {:>14}  paid {:>12}  [{}]",
            row.invoice_id, row.principal, row.interest, row.payments, row.status
        );
    }
    println!("\ntotal due as of {}: {}", rollup.calculation_date, rollup.total_due);

    // same roll-up pinned to a controllable clock
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    ));
    let earlier = project.engine()?.calculate_total_project_interest_at(&project, &time)?;
    println!("total due as of {}: {}\n", earlier.calculation_date, earlier.total_due);

    println!("{}", project.to_json_pretty()?);

    Ok(())
}
