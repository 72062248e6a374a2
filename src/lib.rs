pub mod accrual;
pub mod audit;
pub mod batch;
pub mod callback;
pub mod decimal;
pub mod errors;
pub mod ledger;
pub mod loan;
pub mod payments;
pub mod product;
pub mod storage;
pub mod types;

// re-export key types
pub use accrual::AccrualCalculator;
pub use audit::{AuditAction, AuditEvent, AuditSink, RecordingSink};
pub use batch::{
    BalanceSource, BatchTask, NplClassifier, NplSummary, RepaymentSweepWorker, SweepSummary,
    TaskSummary, run_task,
};
pub use callback::{CallbackHandler, CallbackOutcome, CallbackRequest};
pub use decimal::{Money, Rate};
pub use errors::{LendingError, Result};
pub use ledger::{JournalEntry, LedgerAccount, LedgerEntry, LedgerPoster};
pub use ledger::posting::SettlementOutcome;
pub use loan::{Borrower, Loan, Payment, Provider};
pub use payments::RepaymentAllocator;
pub use product::{
    CalculationBase, FeeRule, LoanProduct, PenaltyCharge, PenaltyFrequency, PenaltyRule,
};
pub use storage::{LendingStore, MemoryStore, StoreTx};
pub use types::{
    Allocation, AmountBreakdown, BorrowerId, BorrowerStatus, CallbackStatus, EntrySide,
    JournalEntryId, LedgerAccountId, LedgerAccountKind, LedgerCategory, LoanId, PaymentId,
    ProductId, ProviderId, RepaymentStatus,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
