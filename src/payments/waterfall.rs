use crate::decimal::Money;
use crate::types::{Allocation, AmountBreakdown};

/// splits a payment across debt categories in waterfall order:
/// penalty, then service fee, then interest, then principal.
///
/// Penalties and fees are recognized as income before the principal
/// balance is reduced. Prior payments are assumed to have flowed through
/// the same waterfall, so `already_repaid` is drained in the same order
/// when computing what each category still has due.
pub struct RepaymentAllocator;

impl RepaymentAllocator {
    pub fn allocate(
        payment_amount: Money,
        breakdown: &AmountBreakdown,
        already_repaid: Money,
    ) -> Allocation {
        let mut covered = already_repaid.max(Money::ZERO);
        let mut remaining = payment_amount.max(Money::ZERO);
        let mut allocation = Allocation::default();

        let dues = [
            (breakdown.penalty, &mut allocation.penalty),
            (breakdown.service_fee, &mut allocation.service_fee),
            (breakdown.interest, &mut allocation.interest),
            (breakdown.principal, &mut allocation.principal),
        ];

        for (owed, slot) in dues {
            let still_due = owed.saturating_sub(covered);
            covered = covered.saturating_sub(owed);

            let to_pay = remaining.min(still_due);
            *slot = to_pay;
            remaining -= to_pay;

            if remaining.is_zero() {
                break;
            }
        }

        allocation
    }
}
