pub mod interest;
pub mod penalty;

use chrono::NaiveDate;

use crate::decimal::Money;
use crate::loan::Loan;
use crate::product::LoanProduct;
use crate::types::AmountBreakdown;

/// pure accrual calculator: loan + product rules + as-of date in,
/// amount-owed breakdown out. No clock reads, no side effects; identical
/// inputs always produce identical output.
pub struct AccrualCalculator;

impl AccrualCalculator {
    /// compute what the borrower owes as of `as_of`.
    ///
    /// Principal and service fee are the amounts fixed at disbursement.
    /// Interest accrues between disbursement and min(as_of, due date);
    /// penalties accrue only once the loan is past due. The calculator
    /// does not consult `repayment_status`; the caller decides whether
    /// `total - repaid_amount <= 0` means nothing is due.
    pub fn compute(loan: &Loan, product: &LoanProduct, as_of: NaiveDate) -> AmountBreakdown {
        let principal = loan.loan_amount;
        let service_fee = loan.service_fee;

        let interest = if product.daily_fee_enabled {
            let days = interest::accruable_days(loan.disbursed_date, loan.due_date, as_of);
            interest::accrue(&product.daily_fee, principal, days)
        } else {
            Money::ZERO
        };

        let penalty = if product.penalty_rules_enabled && as_of > loan.due_date {
            let days_overdue = (as_of - loan.due_date).num_days() as u32;
            penalty::accrue(&product.penalty_rules, principal, service_fee, interest, days_overdue)
        } else {
            Money::ZERO
        };

        AmountBreakdown {
            principal,
            service_fee,
            interest,
            penalty,
            total: principal + service_fee + interest + penalty,
        }
    }
}
