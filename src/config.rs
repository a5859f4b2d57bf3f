use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Rate;
use crate::errors::{InterestError, Result};

/// rate configuration for an interest engine
///
/// `monthly_rate` drives every calculation; `annual_rate` is carried for
/// reporting only. Each project supplies its own values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterestConfig {
    pub monthly_rate: Rate,
    pub annual_rate: Rate,
    pub grace_days: u32,
}

impl InterestConfig {
    /// create validated configuration
    pub fn new(monthly_rate: Rate, annual_rate: Rate, grace_days: u32) -> Result<Self> {
        let config = Self {
            monthly_rate,
            annual_rate,
            grace_days,
        };
        config.validate()?;
        Ok(config)
    }

    /// create configuration from an annual rate, monthly = annual / 12
    pub fn from_annual(annual_rate: Rate, grace_days: u32) -> Result<Self> {
        Self::new(annual_rate.monthly_rate(), annual_rate, grace_days)
    }

    pub fn validate(&self) -> Result<()> {
        if self.monthly_rate.as_decimal() < Decimal::ZERO {
            return Err(InterestError::InvalidInterestRate {
                rate: self.monthly_rate,
            });
        }

        if self.annual_rate.as_decimal() < Decimal::ZERO {
            return Err(InterestError::InvalidInterestRate {
                rate: self.annual_rate,
            });
        }

        // guards the series expansion of ln(1 + r)
        if self.monthly_rate.as_decimal() >= Decimal::ONE {
            return Err(InterestError::InvalidConfiguration {
                message: format!("monthly rate {} must be below 100%", self.monthly_rate),
            });
        }

        Ok(())
    }

    /// `grace_days` as a chrono duration
    pub fn grace_period(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.grace_days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_annual() {
        let config = InterestConfig::from_annual(Rate::from_percentage(18), 30).unwrap();
        assert_eq!(config.monthly_rate.as_decimal(), dec!(0.015));
        assert_eq!(config.annual_rate, Rate::from_percentage(18));
        assert_eq!(config.grace_period(), chrono::Duration::days(30));
    }

    #[test]
    fn test_rejects_negative_rates() {
        let negative = Rate::from_decimal(dec!(-0.01));
        assert!(matches!(
            InterestConfig::new(negative, Rate::ZERO, 0),
            Err(InterestError::InvalidInterestRate { .. })
        ));
        assert!(matches!(
            InterestConfig::new(Rate::ZERO, negative, 0),
            Err(InterestError::InvalidInterestRate { .. })
        ));
    }

    #[test]
    fn test_rejects_monthly_rate_of_one_hundred_percent() {
        let result = InterestConfig::new(Rate::ONE, Rate::ZERO, 0);
        assert!(matches!(result, Err(InterestError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_zero_rate_is_valid() {
        assert!(InterestConfig::new(Rate::ZERO, Rate::ZERO, 0).is_ok());
    }

    #[test]
    fn test_config_json_shape() {
        let config = InterestConfig::new(Rate::from_bps(150), Rate::from_percentage(18), 30).unwrap();
        let value = serde_json::to_value(config).unwrap();
        assert_eq!(value["grace_days"], 30);
        assert_eq!(value["monthly_rate"], 0.015);
        assert_eq!(value["annual_rate"], 0.18);
    }
}
