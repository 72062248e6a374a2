use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LendingError, Result};
use crate::types::ProductId;

/// base a percentage fee is computed against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum CalculationBase {
    #[default]
    Principal,
    Compound,
}

/// fee rule for the service fee (applied once) and the daily fee
/// (applied per day); decoded once when the product is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FeeRule {
    Fixed {
        value: Money,
    },
    Percentage {
        /// percentage points, e.g. 0.1 for 0.1% per day
        value: Decimal,
        #[serde(default, rename = "calculationBase")]
        base: CalculationBase,
    },
}

impl FeeRule {
    pub fn rate(&self) -> Rate {
        match self {
            FeeRule::Fixed { .. } => Rate::ZERO,
            FeeRule::Percentage { value, .. } => Rate::from_percentage(*value),
        }
    }

    /// one-shot amount for a service-fee rule
    pub fn one_time_amount(&self, principal: Money) -> Money {
        match self {
            FeeRule::Fixed { value } => *value,
            FeeRule::Percentage { value, .. } => {
                principal.percentage_of(Rate::from_percentage(*value))
            }
        }
    }

    fn validate(&self, label: &str) -> Result<()> {
        let negative = match self {
            FeeRule::Fixed { value } => value.is_negative(),
            FeeRule::Percentage { .. } => self.rate().is_negative(),
        };
        if negative {
            return Err(LendingError::InvalidConfiguration {
                message: format!("{label} rule value must be >= 0"),
            });
        }
        Ok(())
    }
}

/// how a penalty rule charges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PenaltyCharge {
    Fixed { value: Money },
    PercentageOfPrincipal { value: Decimal },
    PercentageOfCompound { value: Decimal },
}

/// how often a penalty rule charges within its day range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PenaltyFrequency {
    Daily,
    OneTime,
}

/// penalty rule over a days-overdue range; `to_day = None` is open-ended.
/// Ranges across rules may overlap and each matching rule charges in full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyRule {
    pub from_day: u32,
    pub to_day: Option<u32>,
    #[serde(flatten)]
    pub charge: PenaltyCharge,
    pub frequency: PenaltyFrequency,
}

impl PenaltyRule {
    fn validate(&self) -> Result<()> {
        let negative = match self.charge {
            PenaltyCharge::Fixed { value } => value.is_negative(),
            PenaltyCharge::PercentageOfPrincipal { value }
            | PenaltyCharge::PercentageOfCompound { value } => {
                Rate::from_percentage(value).is_negative()
            }
        };
        if negative {
            return Err(LendingError::InvalidConfiguration {
                message: "penalty rule value must be >= 0".to_string(),
            });
        }
        if let Some(to_day) = self.to_day {
            if to_day < self.from_day {
                return Err(LendingError::InvalidConfiguration {
                    message: format!(
                        "penalty rule range inverted: from_day {} > to_day {}",
                        self.from_day, to_day
                    ),
                });
            }
        }
        Ok(())
    }
}

/// fee and penalty configuration for one loan product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanProduct {
    pub id: ProductId,
    pub name: String,
    pub service_fee: FeeRule,
    pub daily_fee: FeeRule,
    pub penalty_rules: Vec<PenaltyRule>,
    pub service_fee_enabled: bool,
    pub daily_fee_enabled: bool,
    pub penalty_rules_enabled: bool,
}

impl LoanProduct {
    /// validate the decoded rule set; called once at load time
    pub fn validate(&self) -> Result<()> {
        self.service_fee.validate("service fee")?;
        self.daily_fee.validate("daily fee")?;
        for rule in &self.penalty_rules {
            rule.validate()?;
        }
        Ok(())
    }

    /// service fee charged at disbursement; zero when the component is disabled
    pub fn service_fee_at_disbursement(&self, principal: Money) -> Money {
        if !self.service_fee_enabled {
            return Money::ZERO;
        }
        self.service_fee.one_time_amount(principal)
    }
}
