use chrono::NaiveDate;

use crate::decimal::Money;
use crate::errors::{LendingError, Result};
use crate::loan::{Loan, Payment};
use crate::product::LoanProduct;
use crate::storage::StoreTx;
use crate::types::{
    Allocation, AmountBreakdown, BorrowerId, EntrySide, JournalEntryId, LedgerAccountKind,
    LedgerCategory, ProviderId,
};

use super::{JournalEntry, LedgerAccount};

/// result of one posted settlement
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementOutcome {
    pub loan: Loan,
    pub payment: Payment,
    pub journal_entry_id: JournalEntryId,
    pub fully_paid: bool,
}

/// posts balanced journal entries for settlements and disbursements.
///
/// All writes go through the caller's transaction handle; a missing
/// chart account surfaces as an error so the whole transaction rolls
/// back rather than leaving a partially posted ledger.
pub struct LedgerPoster;

impl LedgerPoster {
    /// settle a payment against a loan: per-category Received/Receivable
    /// movements, one shared journal entry, the payment receipt, and the
    /// loan update, all within the ambient transaction
    pub fn post_repayment<T: StoreTx>(
        tx: &mut T,
        loan: &Loan,
        breakdown: &AmountBreakdown,
        allocation: &Allocation,
        date: NaiveDate,
        description: &str,
    ) -> Result<SettlementOutcome> {
        let amount = allocation.total_allocated();
        if !amount.is_positive() {
            return Err(LendingError::InvalidPaymentAmount { amount });
        }

        let mut journal =
            JournalEntry::new(loan.provider_id, loan.id, date, description.to_string());

        for (category, paid) in allocation.non_zero() {
            let received =
                tx.ledger_account(loan.provider_id, category, LedgerAccountKind::Received)?;
            let receivable =
                tx.ledger_account(loan.provider_id, category, LedgerAccountKind::Receivable)?;

            journal.push(received.id, EntrySide::Debit, paid);
            journal.push(receivable.id, EntrySide::Credit, paid);
            tx.adjust_account_balance(received.id, LedgerAccount::delta_for(EntrySide::Debit, paid))?;
            tx.adjust_account_balance(
                receivable.id,
                LedgerAccount::delta_for(EntrySide::Credit, paid),
            )?;
        }

        debug_assert!(journal.is_balanced());
        tx.insert_journal_entry(&journal)?;

        let payment = Payment::new(
            loan.id,
            amount,
            date,
            breakdown.due_after(loan.repaid_amount),
            journal.id,
        );
        tx.insert_payment(&payment)?;

        let mut updated = loan.clone();
        updated.record_settlement(payment.id, amount, breakdown.penalty, breakdown.total);
        tx.update_loan(&updated)?;

        let fully_paid = updated.is_paid();
        Ok(SettlementOutcome { loan: updated, payment, journal_entry_id: journal.id, fully_paid })
    }

    /// disburse a new loan: reject when the provider fund pool cannot
    /// cover the principal, otherwise post the reciprocal entries
    /// (Receivable/Received for principal, Receivable/Income for the
    /// service fee), decrement the fund pool and create the loan
    pub fn post_disbursement<T: StoreTx>(
        tx: &mut T,
        borrower_id: BorrowerId,
        provider_id: ProviderId,
        product: &LoanProduct,
        principal: Money,
        disbursed_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Result<Loan> {
        let provider = tx.provider(provider_id)?;
        if provider.available_balance < principal {
            return Err(LendingError::InsufficientFunds {
                available: provider.available_balance,
                requested: principal,
            });
        }

        let service_fee = product.service_fee_at_disbursement(principal);
        let loan = Loan::new(
            borrower_id,
            provider_id,
            product.id,
            principal,
            service_fee,
            disbursed_date,
            due_date,
        );

        let mut journal = JournalEntry::new(
            provider_id,
            loan.id,
            disbursed_date,
            format!("disbursement for loan {}", loan.id),
        );

        let principal_receivable = tx.ledger_account(
            provider_id,
            LedgerCategory::Principal,
            LedgerAccountKind::Receivable,
        )?;
        // the Received/Principal account stands in for the fund pool on
        // the credit side so the entry balances
        let principal_received = tx.ledger_account(
            provider_id,
            LedgerCategory::Principal,
            LedgerAccountKind::Received,
        )?;
        journal.push(principal_receivable.id, EntrySide::Debit, principal);
        journal.push(principal_received.id, EntrySide::Credit, principal);
        tx.adjust_account_balance(
            principal_receivable.id,
            LedgerAccount::delta_for(EntrySide::Debit, principal),
        )?;
        tx.adjust_account_balance(
            principal_received.id,
            LedgerAccount::delta_for(EntrySide::Credit, principal),
        )?;

        if service_fee.is_positive() {
            let fee_receivable = tx.ledger_account(
                provider_id,
                LedgerCategory::ServiceFee,
                LedgerAccountKind::Receivable,
            )?;
            let fee_income = tx.ledger_account(
                provider_id,
                LedgerCategory::ServiceFee,
                LedgerAccountKind::Income,
            )?;
            journal.push(fee_receivable.id, EntrySide::Debit, service_fee);
            journal.push(fee_income.id, EntrySide::Credit, service_fee);
            tx.adjust_account_balance(
                fee_receivable.id,
                LedgerAccount::delta_for(EntrySide::Debit, service_fee),
            )?;
            tx.adjust_account_balance(
                fee_income.id,
                LedgerAccount::delta_for(EntrySide::Credit, service_fee),
            )?;
        }

        debug_assert!(journal.is_balanced());
        tx.insert_journal_entry(&journal)?;
        tx.adjust_provider_funds(provider_id, -principal)?;
        tx.insert_loan(&loan)?;

        Ok(loan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accrual::AccrualCalculator;
    use crate::loan::{Borrower, Provider};
    use crate::payments::RepaymentAllocator;
    use crate::product::{CalculationBase, FeeRule};
    use crate::storage::{LendingStore, MemoryStore};
    use crate::types::BorrowerStatus;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn product() -> LoanProduct {
        LoanProduct {
            id: Uuid::new_v4(),
            name: "payday-30".to_string(),
            service_fee: FeeRule::Percentage { value: dec!(2), base: CalculationBase::Principal },
            daily_fee: FeeRule::Percentage { value: dec!(0.1), base: CalculationBase::Principal },
            penalty_rules: vec![],
            service_fee_enabled: true,
            daily_fee_enabled: true,
            penalty_rules_enabled: true,
        }
    }

    fn seeded_store() -> (MemoryStore, Provider, Borrower, LoanProduct) {
        let store = MemoryStore::new();
        let provider = Provider {
            id: Uuid::new_v4(),
            name: "acme-lend".to_string(),
            available_balance: Money::from_major(100_000),
            npl_threshold_days: 60,
        };
        let borrower = Borrower {
            id: Uuid::new_v4(),
            provider_id: provider.id,
            status: BorrowerStatus::Active,
        };
        let product = product();
        store.insert_provider(provider.clone());
        store.insert_borrower(borrower.clone());
        store.insert_product(product.clone());
        store.seed_chart(provider.id);
        (store, provider, borrower, product)
    }

    #[test]
    fn test_disbursement_posts_balanced_entry_and_decrements_funds() {
        let (store, provider, borrower, product) = seeded_store();

        let loan = store
            .run_in_transaction(|tx| {
                LedgerPoster::post_disbursement(
                    tx,
                    borrower.id,
                    provider.id,
                    &product,
                    Money::from_major(5_000),
                    date(2024, 1, 1),
                    date(2024, 1, 31),
                )
            })
            .unwrap();

        assert_eq!(loan.service_fee, Money::from_major(100));
        assert_eq!(store.provider_balance(provider.id).unwrap(), Money::from_major(95_000));

        let entries = store.journal_entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_balanced());
        assert_eq!(entries[0].total_debits(), Money::from_major(5_100));

        // receivables carry what the borrower owes
        assert_eq!(
            store
                .account_balance(
                    provider.id,
                    LedgerCategory::Principal,
                    LedgerAccountKind::Receivable
                )
                .unwrap(),
            Money::from_major(5_000)
        );
        assert_eq!(
            store
                .account_balance(
                    provider.id,
                    LedgerCategory::ServiceFee,
                    LedgerAccountKind::Income
                )
                .unwrap(),
            -Money::from_major(100)
        );
    }

    #[test]
    fn test_disbursement_rejected_when_funds_short() {
        let (store, provider, borrower, product) = seeded_store();

        let result = store.run_in_transaction(|tx| {
            LedgerPoster::post_disbursement(
                tx,
                borrower.id,
                provider.id,
                &product,
                Money::from_major(500_000),
                date(2024, 1, 1),
                date(2024, 1, 31),
            )
        });

        assert!(matches!(result, Err(LendingError::InsufficientFunds { .. })));
        assert_eq!(store.provider_balance(provider.id).unwrap(), Money::from_major(100_000));
        assert!(store.journal_entries().is_empty());
    }

    #[test]
    fn test_repayment_settles_and_flips_loan() {
        let (store, provider, borrower, product) = seeded_store();

        let loan = store
            .run_in_transaction(|tx| {
                LedgerPoster::post_disbursement(
                    tx,
                    borrower.id,
                    provider.id,
                    &product,
                    Money::from_major(5_000),
                    date(2024, 1, 1),
                    date(2024, 1, 31),
                )
            })
            .unwrap();

        // settle in full on day 10: 5000 + 100 + 50
        let breakdown = AccrualCalculator::compute(&loan, &product, date(2024, 1, 11));
        let allocation =
            RepaymentAllocator::allocate(breakdown.total, &breakdown, loan.repaid_amount);

        let outcome = store
            .run_in_transaction(|tx| {
                LedgerPoster::post_repayment(
                    tx,
                    &loan,
                    &breakdown,
                    &allocation,
                    date(2024, 1, 11),
                    "manual repayment",
                )
            })
            .unwrap();

        assert!(outcome.fully_paid);
        assert_eq!(outcome.payment.amount, Money::from_major(5_150));
        assert_eq!(outcome.payment.outstanding_before_payment, Money::from_major(5_150));

        let entries = store.journal_entries();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.is_balanced()));

        // principal receivable zeroed out, received balances carry collections
        assert_eq!(
            store
                .account_balance(
                    provider.id,
                    LedgerCategory::Principal,
                    LedgerAccountKind::Receivable
                )
                .unwrap(),
            Money::ZERO
        );
        assert_eq!(
            store
                .account_balance(
                    provider.id,
                    LedgerCategory::Interest,
                    LedgerAccountKind::Received
                )
                .unwrap(),
            Money::from_major(50)
        );

        let stored = store.loan(loan.id).unwrap();
        assert!(stored.is_paid());
        assert_eq!(stored.repaid_amount, Money::from_major(5_150));

        // the receipt persisted alongside the settlement
        let receipt = store.payment(outcome.payment.id).unwrap();
        assert_eq!(receipt, outcome.payment);
        assert_eq!(receipt.journal_entry_id, outcome.journal_entry_id);
        assert_eq!(stored.payment_ids, vec![receipt.id]);
    }

    #[test]
    fn test_missing_account_aborts_whole_settlement() {
        let (store, provider, borrower, product) = seeded_store();
        // no chart at all for this second provider
        let bare_provider = Provider {
            id: Uuid::new_v4(),
            name: "bare".to_string(),
            available_balance: Money::from_major(50_000),
            npl_threshold_days: 60,
        };
        store.insert_provider(bare_provider.clone());
        let _ = (provider, borrower);

        let result = store.run_in_transaction(|tx| {
            LedgerPoster::post_disbursement(
                tx,
                Uuid::new_v4(),
                bare_provider.id,
                &product,
                Money::from_major(1_000),
                date(2024, 1, 1),
                date(2024, 1, 31),
            )
        });

        assert!(matches!(result, Err(LendingError::MissingLedgerAccount { .. })));
        // nothing committed: funds untouched, no journal, no loan
        assert_eq!(
            store.provider_balance(bare_provider.id).unwrap(),
            Money::from_major(50_000)
        );
        assert!(store.journal_entries().is_empty());
    }

    #[test]
    fn test_zero_allocation_rejected() {
        let (store, provider, borrower, product) = seeded_store();
        let loan = store
            .run_in_transaction(|tx| {
                LedgerPoster::post_disbursement(
                    tx,
                    borrower.id,
                    provider.id,
                    &product,
                    Money::from_major(5_000),
                    date(2024, 1, 1),
                    date(2024, 1, 31),
                )
            })
            .unwrap();

        let breakdown = AccrualCalculator::compute(&loan, &product, date(2024, 1, 11));
        let result = store.run_in_transaction(|tx| {
            LedgerPoster::post_repayment(
                tx,
                &loan,
                &breakdown,
                &Allocation::default(),
                date(2024, 1, 11),
                "empty",
            )
        });

        assert!(matches!(result, Err(LendingError::InvalidPaymentAmount { .. })));
    }
}
