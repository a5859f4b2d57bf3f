use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::decimal::{Money, Rate};

/// average days per month (365.25 / 12)
pub const DAYS_PER_MONTH: Decimal = dec!(30.4375);

/// upper bound on series terms; both series converge long before this
const MAX_SERIES_TERMS: u32 = 64;

/// fractional months covered by a number of calendar days
pub fn months_for_days(days: i64) -> Decimal {
    Decimal::from(days) / DAYS_PER_MONTH
}

/// `(1 + r)^months` for a fractional number of months, `None` on overflow
///
/// Whole months are multiplied out exactly. The fractional remainder is
/// evaluated as `exp(frac * ln(1 + r))` with both functions expanded as
/// series, which keeps every step inside decimal arithmetic.
pub fn compound_factor(monthly_rate: Rate, months: Decimal) -> Option<Decimal> {
    if months <= Decimal::ZERO {
        return Some(Decimal::ONE);
    }

    let rate = monthly_rate.as_decimal();
    let base = Decimal::ONE + rate;

    let whole = months.trunc();
    let fraction = months - whole;

    // calculate (1 + r)^n using iteration
    let mut factor = Decimal::ONE;
    let whole_months = whole.to_u32()?;
    for _ in 0..whole_months {
        factor = factor.checked_mul(base)?;
    }

    if !fraction.is_zero() && !rate.is_zero() {
        factor = factor.checked_mul(exp_series(fraction * ln_1p_series(rate)))?;
    }

    Some(factor)
}

/// ln(1 + x) via the atanh expansion, valid for x > -1
fn ln_1p_series(x: Decimal) -> Decimal {
    // ln(1 + x) = 2 * (z + z^3/3 + z^5/5 + ...), z = x / (2 + x)
    let z = x / (dec!(2) + x);
    let z_squared = z * z;

    let mut power = z;
    let mut sum = Decimal::ZERO;
    for k in 0..MAX_SERIES_TERMS {
        let term = power / Decimal::from(2 * k + 1);
        if term.is_zero() {
            break;
        }
        sum += term;
        power *= z_squared;
    }

    sum * dec!(2)
}

/// e^x via taylor series, used only for small |x|
fn exp_series(x: Decimal) -> Decimal {
    let mut sum = Decimal::ONE;
    let mut term = Decimal::ONE;
    for i in 1..MAX_SERIES_TERMS {
        term = term * x / Decimal::from(i);
        if term.is_zero() {
            break;
        }
        sum += term;
    }
    sum
}

/// compound interest on `principal` between two dates, rounded half-up to cents
///
/// Returns zero for empty or inverted ranges and for non-positive principal,
/// `None` when the result does not fit in a decimal.
pub fn calculate_period_interest(
    principal: Money,
    monthly_rate: Rate,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Option<Money> {
    if start_date >= end_date || !principal.is_positive() {
        return Some(Money::ZERO);
    }

    let days = (end_date - start_date).num_days();
    let months = months_for_days(days);
    let factor = compound_factor(monthly_rate, months)?;

    let p = principal.as_decimal();
    Some(Money::from_decimal_rounded(p.checked_mul(factor)? - p))
}

/// closed-form compound interest `P * (1 + r)^n - P`, unrounded
pub fn calculate_compound_interest(principal: Money, monthly_rate: Rate, months: Decimal) -> Option<Money> {
    let p = principal.as_decimal();
    let factor = compound_factor(monthly_rate, months)?;
    Some(Money::from_decimal(p.checked_mul(factor)? - p))
}

/// simple interest `P * (annual / 12) * months`, for comparison figures
pub fn calculate_simple_interest(principal: Money, annual_rate: Rate, months: Decimal) -> Option<Money> {
    let rate = annual_rate.monthly_rate().as_decimal().checked_mul(months)?;
    principal.as_decimal().checked_mul(rate).map(Money::from_decimal)
}
