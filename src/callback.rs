use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use crate::accrual::AccrualCalculator;
use crate::decimal::Money;
use crate::errors::{LendingError, Result};
use crate::ledger::posting::{LedgerPoster, SettlementOutcome};
use crate::payments::RepaymentAllocator;
use crate::storage::{LendingStore, StoreTx};
use crate::types::{CallbackStatus, LoanId};

/// inbound settlement notification from the payment gateway.
///
/// `paid_amount` is rendered back into the signature payload with its
/// canonical decimal formatting, matching what the gateway signed.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackRequest {
    pub account_no: String,
    pub paid_amount: Money,
    pub paid_by_number: String,
    pub token: String,
    pub transaction_id: String,
    pub transaction_time: String,
    pub txn_ref: String,
    /// hex-encoded SHA256 provided by the gateway
    pub signature: String,
}

impl CallbackRequest {
    /// recompute the signature over the gateway's canonical field order
    pub fn expected_signature(&self, secret: &str) -> String {
        let payload = format!(
            "accountNo={}&Key={}&paidAmount={}&paidByNumber={}&token={}&transactionId={}&transactionTime={}&txnRef={}",
            self.account_no,
            secret,
            self.paid_amount,
            self.paid_by_number,
            self.token,
            self.transaction_id,
            self.transaction_time,
            self.txn_ref,
        );
        hex::encode(Sha256::digest(payload.as_bytes()))
    }

    /// reject unless the received signature matches byte for byte
    pub fn verify_signature(&self, secret: &str) -> Result<()> {
        if self.signature != self.expected_signature(secret) {
            return Err(LendingError::SignatureMismatch {
                transaction_id: self.transaction_id.clone(),
            });
        }
        Ok(())
    }
}

/// outcome of one callback; replays and already-settled loans are
/// success no-ops so the gateway's retry logic stays simple
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
    Settled(SettlementOutcome),
    /// transaction id already completed, nothing changed
    Replayed,
    /// loan already paid or amount due is zero, nothing changed
    NothingDue,
}

/// verifies and settles gateway callbacks idempotently
pub struct CallbackHandler;

impl CallbackHandler {
    /// verify the signature, record the attempt as Pending, then settle
    /// the referenced loan inside one transaction that also marks the
    /// transaction id completed. A settlement failure leaves the Pending
    /// record behind so the gateway's retry is accepted, and the ledger
    /// is never touched when the signature does not match.
    pub fn handle<S: LendingStore>(
        store: &S,
        secret: &str,
        loan_id: LoanId,
        request: &CallbackRequest,
        date: NaiveDate,
    ) -> Result<CallbackOutcome> {
        request.verify_signature(secret)?;

        let replayed = store.run_in_transaction(|tx| {
            if tx.callback_status(&request.transaction_id)? == Some(CallbackStatus::Completed) {
                return Ok(true);
            }
            tx.set_callback_status(&request.transaction_id, CallbackStatus::Pending)?;
            Ok(false)
        })?;
        if replayed {
            return Ok(CallbackOutcome::Replayed);
        }

        store.run_in_transaction(|tx| {
            let loan = tx.loan(loan_id)?;
            let product = tx.product(loan.product_id)?;
            let breakdown = AccrualCalculator::compute(&loan, &product, date);

            if loan.is_paid() || !breakdown.due_after(loan.repaid_amount).is_positive() {
                tx.set_callback_status(&request.transaction_id, CallbackStatus::Completed)?;
                return Ok(CallbackOutcome::NothingDue);
            }

            let allocation =
                RepaymentAllocator::allocate(request.paid_amount, &breakdown, loan.repaid_amount);
            let outcome = LedgerPoster::post_repayment(
                tx,
                &loan,
                &breakdown,
                &allocation,
                date,
                &format!("gateway settlement {}", request.transaction_id),
            )?;
            tx.set_callback_status(&request.transaction_id, CallbackStatus::Completed)?;

            Ok(CallbackOutcome::Settled(outcome))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::{Borrower, Provider};
    use crate::product::{CalculationBase, FeeRule, LoanProduct};
    use crate::storage::MemoryStore;
    use crate::types::{BorrowerStatus, LedgerAccountKind, LedgerCategory};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    const SECRET: &str = "gateway-secret";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded_loan(store: &MemoryStore) -> (Provider, LoanProduct, crate::loan::Loan) {
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
        let product = LoanProduct {
            id: Uuid::new_v4(),
            name: "payday-30".to_string(),
            service_fee: FeeRule::Percentage { value: dec!(2), base: CalculationBase::Principal },
            daily_fee: FeeRule::Percentage { value: dec!(0.1), base: CalculationBase::Principal },
            penalty_rules: vec![],
            service_fee_enabled: true,
            daily_fee_enabled: true,
            penalty_rules_enabled: true,
        };
        store.insert_provider(provider.clone());
        store.insert_borrower(borrower.clone());
        store.insert_product(product.clone());
        store.seed_chart(provider.id);

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
        (provider, product, loan)
    }

    fn signed_request(amount: Money, transaction_id: &str) -> CallbackRequest {
        let mut request = CallbackRequest {
            account_no: "0551234567".to_string(),
            paid_amount: amount,
            paid_by_number: "0551234567".to_string(),
            token: "tok-1".to_string(),
            transaction_id: transaction_id.to_string(),
            transaction_time: "20240111093000".to_string(),
            txn_ref: "ref-1".to_string(),
            signature: String::new(),
        };
        request.signature = request.expected_signature(SECRET);
        request
    }

    #[test]
    fn test_signature_round_trip() {
        let request = signed_request(Money::from_major(5_150), "txn-1");
        assert!(request.verify_signature(SECRET).is_ok());
        assert!(request.verify_signature("wrong-secret").is_err());
    }

    #[test]
    fn test_tampered_amount_rejected_without_state_change() {
        let store = MemoryStore::new();
        let (_, _, loan) = seeded_loan(&store);

        let mut request = signed_request(Money::from_major(5_150), "txn-1");
        request.paid_amount = Money::from_major(1);

        let result = CallbackHandler::handle(&store, SECRET, loan.id, &request, date(2024, 1, 11));
        assert!(matches!(result, Err(LendingError::SignatureMismatch { .. })));

        let stored = store.loan(loan.id).unwrap();
        assert_eq!(stored.repaid_amount, Money::ZERO);
        assert_eq!(store.journal_entries().len(), 1); // disbursement only
    }

    #[test]
    fn test_settles_and_is_idempotent_on_replay() {
        let store = MemoryStore::new();
        let (provider, _, loan) = seeded_loan(&store);

        let request = signed_request(Money::from_major(5_150), "txn-1");
        let first =
            CallbackHandler::handle(&store, SECRET, loan.id, &request, date(2024, 1, 11)).unwrap();
        assert!(matches!(first, CallbackOutcome::Settled(_)));

        let repaid_after_first = store.loan(loan.id).unwrap().repaid_amount;
        let received_after_first = store
            .account_balance(provider.id, LedgerCategory::Principal, LedgerAccountKind::Received)
            .unwrap();

        // identical transaction id replayed after settlement
        let second =
            CallbackHandler::handle(&store, SECRET, loan.id, &request, date(2024, 1, 12)).unwrap();
        assert_eq!(second, CallbackOutcome::Replayed);

        assert_eq!(store.loan(loan.id).unwrap().repaid_amount, repaid_after_first);
        assert_eq!(
            store
                .account_balance(
                    provider.id,
                    LedgerCategory::Principal,
                    LedgerAccountKind::Received
                )
                .unwrap(),
            received_after_first
        );
        assert_eq!(store.journal_entries().len(), 2); // disbursement + one settlement
    }

    #[test]
    fn test_failed_settlement_leaves_retryable_pending_record() {
        let store = MemoryStore::new();
        let (_, _, loan) = seeded_loan(&store);

        // zero-amount callback fails posting after the attempt is recorded
        let bad = signed_request(Money::ZERO, "txn-9");
        let result = CallbackHandler::handle(&store, SECRET, loan.id, &bad, date(2024, 1, 11));
        assert!(matches!(result, Err(LendingError::InvalidPaymentAmount { .. })));
        assert_eq!(
            store.run_in_transaction(|tx| tx.callback_status("txn-9")).unwrap(),
            Some(CallbackStatus::Pending)
        );
        assert_eq!(store.loan(loan.id).unwrap().repaid_amount, Money::ZERO);

        // the gateway retries the same transaction id with the real amount
        let retry = signed_request(Money::from_major(5_150), "txn-9");
        let outcome =
            CallbackHandler::handle(&store, SECRET, loan.id, &retry, date(2024, 1, 11)).unwrap();
        assert!(matches!(outcome, CallbackOutcome::Settled(_)));
        assert_eq!(
            store.run_in_transaction(|tx| tx.callback_status("txn-9")).unwrap(),
            Some(CallbackStatus::Completed)
        );
        assert_eq!(store.loan(loan.id).unwrap().repaid_amount, Money::from_major(5_150));
    }

    #[test]
    fn test_paid_loan_is_noop_not_error() {
        let store = MemoryStore::new();
        let (_, _, loan) = seeded_loan(&store);

        let settle = signed_request(Money::from_major(5_150), "txn-1");
        CallbackHandler::handle(&store, SECRET, loan.id, &settle, date(2024, 1, 11)).unwrap();

        // new transaction id against an already-paid loan
        let late = signed_request(Money::from_major(500), "txn-2");
        let outcome =
            CallbackHandler::handle(&store, SECRET, loan.id, &late, date(2024, 1, 12)).unwrap();
        assert_eq!(outcome, CallbackOutcome::NothingDue);
        assert_eq!(store.loan(loan.id).unwrap().repaid_amount, Money::from_major(5_150));
    }
}
