use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{
    BorrowerId, BorrowerStatus, JournalEntryId, LoanId, PaymentId, ProductId, ProviderId,
    RepaymentStatus,
};

/// a disbursed loan; principal and service fee are fixed at disbursement
/// and the record is mutated only by settlement events until Paid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub borrower_id: BorrowerId,
    pub provider_id: ProviderId,
    pub product_id: ProductId,
    pub loan_amount: Money,
    pub service_fee: Money,
    pub disbursed_date: NaiveDate,
    pub due_date: NaiveDate,
    pub repayment_status: RepaymentStatus,
    /// cumulative amount settled across all payments
    pub repaid_amount: Money,
    /// informational snapshot of penalty accrued at last settlement
    pub penalty_amount: Money,
    pub payment_ids: Vec<PaymentId>,
}

impl Loan {
    pub fn new(
        borrower_id: BorrowerId,
        provider_id: ProviderId,
        product_id: ProductId,
        loan_amount: Money,
        service_fee: Money,
        disbursed_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            borrower_id,
            provider_id,
            product_id,
            loan_amount,
            service_fee,
            disbursed_date,
            due_date,
            repayment_status: RepaymentStatus::Unpaid,
            repaid_amount: Money::ZERO,
            penalty_amount: Money::ZERO,
            payment_ids: Vec::new(),
        }
    }

    pub fn is_paid(&self) -> bool {
        self.repayment_status == RepaymentStatus::Paid
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.repayment_status == RepaymentStatus::Unpaid && self.due_date < today
    }

    /// record a settlement event; flips to Paid once the full amount due
    /// as of the settlement date is covered
    pub fn record_settlement(
        &mut self,
        payment_id: PaymentId,
        amount: Money,
        penalty_accrued: Money,
        total_owed: Money,
    ) {
        self.repaid_amount += amount;
        self.penalty_amount = penalty_accrued;
        self.payment_ids.push(payment_id);
        if self.repaid_amount >= total_owed {
            self.repayment_status = RepaymentStatus::Paid;
        }
    }
}

/// immutable settlement receipt, created once per settlement event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub loan_id: LoanId,
    pub amount: Money,
    pub date: NaiveDate,
    pub outstanding_before_payment: Money,
    pub journal_entry_id: JournalEntryId,
}

impl Payment {
    pub fn new(
        loan_id: LoanId,
        amount: Money,
        date: NaiveDate,
        outstanding_before_payment: Money,
        journal_entry_id: JournalEntryId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            loan_id,
            amount,
            date,
            outstanding_before_payment,
            journal_entry_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Borrower {
    pub id: BorrowerId,
    pub provider_id: ProviderId,
    pub status: BorrowerStatus,
}

/// lending provider; owns the fund pool loans are disbursed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
    pub available_balance: Money,
    /// loans unpaid this many days after disbursement flag the borrower
    pub npl_threshold_days: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loan() -> Loan {
        Loan::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Money::from_major(5_000),
            Money::from_major(100),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
    }

    #[test]
    fn test_overdue_check() {
        let l = loan();
        assert!(!l.is_overdue(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()));
        assert!(l.is_overdue(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));
    }

    #[test]
    fn test_partial_settlement_stays_unpaid() {
        let mut l = loan();
        l.record_settlement(
            Uuid::new_v4(),
            Money::from_major(700),
            Money::from_major(750),
            Money::from_major(6_000),
        );
        assert_eq!(l.repayment_status, RepaymentStatus::Unpaid);
        assert_eq!(l.repaid_amount, Money::from_major(700));
        assert_eq!(l.payment_ids.len(), 1);
    }

    #[test]
    fn test_full_settlement_flips_to_paid() {
        let mut l = loan();
        l.record_settlement(
            Uuid::new_v4(),
            Money::from_major(5_150),
            Money::ZERO,
            Money::from_major(5_150),
        );
        assert!(l.is_paid());
        assert!(!l.is_overdue(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
    }
}
