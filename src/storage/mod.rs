pub mod memory;

use chrono::NaiveDate;

use crate::decimal::Money;
use crate::errors::Result;
use crate::ledger::{JournalEntry, LedgerAccount};
use crate::loan::{Borrower, Loan, Payment, Provider};
use crate::product::LoanProduct;
use crate::types::{
    BorrowerId, CallbackStatus, LedgerAccountId, LedgerAccountKind, LedgerCategory, LoanId,
    ProductId, ProviderId,
};

pub use memory::MemoryStore;

/// entity operations available inside one storage transaction.
///
/// Balance mutations are expressed as relative increments so the backing
/// store can serialize concurrent settlements with row-level locking;
/// the engine never writes a balance it computed outside the transaction.
pub trait StoreTx {
    fn loan(&self, id: LoanId) -> Result<Loan>;
    fn insert_loan(&mut self, loan: &Loan) -> Result<()>;
    fn update_loan(&mut self, loan: &Loan) -> Result<()>;

    fn product(&self, id: ProductId) -> Result<LoanProduct>;
    fn provider(&self, id: ProviderId) -> Result<Provider>;
    fn borrower(&self, id: BorrowerId) -> Result<Borrower>;

    /// relative adjustment of the provider fund pool
    fn adjust_provider_funds(&mut self, id: ProviderId, delta: Money) -> Result<()>;

    /// chart-of-accounts lookup; a missing account is a fatal
    /// configuration error that aborts the surrounding transaction
    fn ledger_account(
        &self,
        provider_id: ProviderId,
        category: LedgerCategory,
        kind: LedgerAccountKind,
    ) -> Result<LedgerAccount>;

    /// relative adjustment of one account balance
    fn adjust_account_balance(&mut self, id: LedgerAccountId, delta: Money) -> Result<()>;

    fn insert_journal_entry(&mut self, entry: &JournalEntry) -> Result<()>;
    fn insert_payment(&mut self, payment: &Payment) -> Result<()>;

    fn callback_status(&self, transaction_id: &str) -> Result<Option<CallbackStatus>>;
    fn set_callback_status(&mut self, transaction_id: &str, status: CallbackStatus) -> Result<()>;

    /// bulk conditional update: flag every distinct borrower of this
    /// provider holding an unpaid loan disbursed before `threshold_date`,
    /// skipping borrowers already flagged. Returns borrowers transitioned.
    fn flag_npl_borrowers(&mut self, provider_id: ProviderId, threshold_date: NaiveDate)
        -> Result<u64>;
}

/// transactional repository the engine runs against
pub trait LendingStore {
    type Tx: StoreTx;

    /// run `f` atomically: all writes commit together or none do
    fn run_in_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self::Tx) -> Result<T>;

    /// scan reads used by the batch workers outside any transaction
    fn overdue_unpaid_loans(&self, today: NaiveDate) -> Result<Vec<Loan>>;
    fn providers(&self) -> Result<Vec<Provider>>;
    fn product(&self, id: ProductId) -> Result<LoanProduct>;
}
