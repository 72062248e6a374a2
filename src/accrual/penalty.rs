use rust_decimal::Decimal;

use crate::decimal::{Money, Rate};
use crate::product::{PenaltyCharge, PenaltyFrequency, PenaltyRule};

/// total penalty owed across all rules for the given days overdue.
///
/// Rules are evaluated independently, not as mutually exclusive tiers:
/// every rule whose `from_day` has been reached charges for its full
/// applicable window, so overlapping ranges stack. Product has not yet
/// confirmed whether stacking is intended; we reproduce it as configured.
pub fn accrue(
    rules: &[PenaltyRule],
    principal: Money,
    service_fee: Money,
    interest: Money,
    days_overdue: u32,
) -> Money {
    let mut penalty = Money::ZERO;

    for rule in rules {
        if days_overdue < rule.from_day {
            continue;
        }
        let capped = match rule.to_day {
            Some(to_day) => days_overdue.min(to_day),
            None => days_overdue,
        };
        let applicable_days = (capped as i64 - rule.from_day as i64 + 1).max(0) as u32;
        if applicable_days == 0 {
            continue;
        }
        let charge_days = match rule.frequency {
            PenaltyFrequency::Daily => applicable_days,
            PenaltyFrequency::OneTime => 1,
        };

        penalty += match rule.charge {
            PenaltyCharge::Fixed { value } => value * Decimal::from(charge_days),
            PenaltyCharge::PercentageOfPrincipal { value } => {
                principal.percentage_of(Rate::from_percentage(value)) * Decimal::from(charge_days)
            }
            PenaltyCharge::PercentageOfCompound { value } => compound_charge(
                Rate::from_percentage(value),
                principal + service_fee + interest + penalty,
                charge_days,
                rule.frequency,
            ),
        };
    }

    penalty
}

/// compound penalty against a running base of principal + fees + prior
/// penalty; Daily rules advance the base each day, OneTime rules read it
/// without advancing
fn compound_charge(rate: Rate, start_base: Money, days: u32, frequency: PenaltyFrequency) -> Money {
    match frequency {
        PenaltyFrequency::OneTime => start_base.percentage_of(rate),
        PenaltyFrequency::Daily => {
            let mut base = start_base;
            let mut charged = Money::ZERO;
            for _ in 0..days {
                let increment = base.percentage_of(rate);
                charged += increment;
                base += increment;
            }
            charged
        }
    }
}
