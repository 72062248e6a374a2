use chrono::NaiveDate;

use crate::decimal::Money;
use crate::product::{CalculationBase, FeeRule};

/// days interest accrues for: strictly between disbursement and
/// min(as_of, due); never past the due date, never negative
pub fn accruable_days(disbursed: NaiveDate, due: NaiveDate, as_of: NaiveDate) -> u32 {
    let cutoff = if as_of < due { as_of } else { due };
    (cutoff - disbursed).num_days().max(0) as u32
}

/// interest owed under the daily-fee rule for the given number of days
pub fn accrue(rule: &FeeRule, principal: Money, days: u32) -> Money {
    if days == 0 {
        return Money::ZERO;
    }
    match rule {
        FeeRule::Fixed { value } => *value * rust_decimal::Decimal::from(days),
        FeeRule::Percentage { base: CalculationBase::Principal, .. } => {
            principal.percentage_of(rule.rate()) * rust_decimal::Decimal::from(days)
        }
        // daily compounding on principal alone; fees and penalties do not
        // feed this base
        FeeRule::Percentage { base: CalculationBase::Compound, .. } => {
            let rate = rule.rate();
            let mut base = principal;
            let mut interest = Money::ZERO;
            for _ in 0..days {
                let increment = base.percentage_of(rate);
                interest += increment;
                base += increment;
            }
            interest
        }
    }
}
