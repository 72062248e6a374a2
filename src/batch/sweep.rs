use std::collections::HashMap;

use hourglass_rs::SafeTimeProvider;
use tracing::{info, warn};

use crate::accrual::AccrualCalculator;
use crate::audit::{AuditAction, AuditEvent, AuditSink};
use crate::decimal::Money;
use crate::errors::Result;
use crate::ledger::LedgerPoster;
use crate::payments::RepaymentAllocator;
use crate::storage::{LendingStore, StoreTx};
use crate::types::BorrowerId;

const SWEEP_ACTOR: &str = "SYSTEM";

/// external borrower-balance lookup; settlement math never depends on
/// how the balance is fetched
pub trait BalanceSource {
    fn balance_of(&self, borrower_id: BorrowerId) -> Result<Money>;
}

impl BalanceSource for HashMap<BorrowerId, Money> {
    fn balance_of(&self, borrower_id: BorrowerId) -> Result<Money> {
        Ok(self.get(&borrower_id).copied().unwrap_or(Money::ZERO))
    }
}

/// per-invocation sweep counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepSummary {
    pub settled: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// batch job settling overdue loans from external borrower balances.
///
/// Loans are processed independently: each settlement runs in its own
/// transaction and a failure is audited and logged without aborting the
/// rest of the batch.
pub struct RepaymentSweepWorker;

impl RepaymentSweepWorker {
    pub fn run<S, B, A>(
        store: &S,
        balances: &B,
        audit: &mut A,
        time: &SafeTimeProvider,
    ) -> Result<SweepSummary>
    where
        S: LendingStore,
        B: BalanceSource,
        A: AuditSink,
    {
        let today = time.now().date_naive();
        let loans = store.overdue_unpaid_loans(today)?;
        info!(count = loans.len(), %today, "repayment sweep started");

        let mut summary = SweepSummary::default();

        for loan in loans {
            let loan_id = loan.id;
            let settled = (|| -> Result<Option<Money>> {
                let product = store.product(loan.product_id)?;
                let breakdown = AccrualCalculator::compute(&loan, &product, today);
                let total_due = breakdown.due_after(loan.repaid_amount);
                if !total_due.is_positive() {
                    return Ok(None);
                }

                let balance = balances.balance_of(loan.borrower_id)?;
                if balance < total_due {
                    audit.record(AuditEvent::new(
                        SWEEP_ACTOR,
                        AuditAction::AutomatedRepaymentSkipped,
                        "loan",
                        loan_id,
                        format!("balance {balance} below amount due {total_due}"),
                    ));
                    info!(%loan_id, %balance, %total_due, "sweep skipped loan");
                    summary.skipped += 1;
                    return Ok(None);
                }

                // a gateway settlement may land between the scan and this
                // transaction; settle from a fresh read and stand down once
                // nothing is due anymore
                store.run_in_transaction(|tx| {
                    let current = tx.loan(loan_id)?;
                    let breakdown = AccrualCalculator::compute(&current, &product, today);
                    let total_due = breakdown.due_after(current.repaid_amount);
                    if current.is_paid() || !total_due.is_positive() {
                        return Ok(None);
                    }
                    let allocation =
                        RepaymentAllocator::allocate(total_due, &breakdown, current.repaid_amount);
                    LedgerPoster::post_repayment(
                        tx,
                        &current,
                        &breakdown,
                        &allocation,
                        today,
                        "automated repayment sweep",
                    )?;
                    Ok(Some(total_due))
                })
            })();

            match settled {
                Ok(Some(amount)) => {
                    audit.record(AuditEvent::new(
                        SWEEP_ACTOR,
                        AuditAction::AutomatedRepaymentSuccess,
                        "loan",
                        loan_id,
                        format!("settled {amount} automatically"),
                    ));
                    info!(%loan_id, %amount, "sweep settled loan");
                    summary.settled += 1;
                }
                Ok(None) => {}
                // per-loan failure: audit, log and continue with the batch
                Err(err) => {
                    audit.record(AuditEvent::new(
                        SWEEP_ACTOR,
                        AuditAction::AutomatedRepaymentFailure,
                        "loan",
                        loan_id,
                        err.to_string(),
                    ));
                    warn!(%loan_id, error = %err, "sweep failed to settle loan");
                    summary.failed += 1;
                }
            }
        }

        info!(
            settled = summary.settled,
            skipped = summary.skipped,
            failed = summary.failed,
            "repayment sweep finished"
        );
        Ok(summary)
    }
}
