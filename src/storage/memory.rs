use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;

use crate::decimal::Money;
use crate::errors::{LendingError, Result};
use crate::ledger::{JournalEntry, LedgerAccount};
use crate::loan::{Borrower, Loan, Payment, Provider};
use crate::product::LoanProduct;
use crate::types::{
    BorrowerId, BorrowerStatus, CallbackStatus, LedgerAccountId, LedgerAccountKind,
    LedgerCategory, LoanId, PaymentId, ProductId, ProviderId, RepaymentStatus,
};

use super::{LendingStore, StoreTx};

/// owned entity state; doubles as the transaction handle
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    loans: HashMap<LoanId, Loan>,
    products: HashMap<ProductId, LoanProduct>,
    providers: HashMap<ProviderId, Provider>,
    borrowers: HashMap<BorrowerId, Borrower>,
    accounts: HashMap<LedgerAccountId, LedgerAccount>,
    journal_entries: Vec<JournalEntry>,
    payments: HashMap<PaymentId, Payment>,
    callbacks: HashMap<String, CallbackStatus>,
}

/// in-memory reference store with snapshot-and-commit transactions:
/// the closure runs against a copy of the state, which replaces the
/// committed state only on success
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_provider(&self, provider: Provider) {
        self.lock().providers.insert(provider.id, provider);
    }

    pub fn insert_borrower(&self, borrower: Borrower) {
        self.lock().borrowers.insert(borrower.id, borrower);
    }

    pub fn insert_product(&self, product: LoanProduct) {
        self.lock().products.insert(product.id, product);
    }

    pub fn insert_loan(&self, loan: Loan) {
        self.lock().loans.insert(loan.id, loan);
    }

    pub fn insert_account(&self, account: LedgerAccount) {
        self.lock().accounts.insert(account.id, account);
    }

    /// seed the full chart the engine posts against: Receivable and
    /// Received per category, plus the ServiceFee income account
    pub fn seed_chart(&self, provider_id: ProviderId) {
        let categories = [
            LedgerCategory::Principal,
            LedgerCategory::Interest,
            LedgerCategory::ServiceFee,
            LedgerCategory::Penalty,
        ];
        for category in categories {
            self.insert_account(LedgerAccount::new(
                provider_id,
                category,
                LedgerAccountKind::Receivable,
            ));
            self.insert_account(LedgerAccount::new(
                provider_id,
                category,
                LedgerAccountKind::Received,
            ));
        }
        self.insert_account(LedgerAccount::new(
            provider_id,
            LedgerCategory::ServiceFee,
            LedgerAccountKind::Income,
        ));
    }

    pub fn loan(&self, id: LoanId) -> Result<Loan> {
        self.lock().loan(id)
    }

    pub fn borrower(&self, id: BorrowerId) -> Result<Borrower> {
        self.lock().borrower(id)
    }

    pub fn payment(&self, id: PaymentId) -> Result<Payment> {
        self.lock()
            .payments
            .get(&id)
            .cloned()
            .ok_or(LendingError::Storage { message: format!("payment not found: {id}") })
    }

    pub fn journal_entries(&self) -> Vec<JournalEntry> {
        self.lock().journal_entries.clone()
    }

    pub fn account_balance(
        &self,
        provider_id: ProviderId,
        category: LedgerCategory,
        kind: LedgerAccountKind,
    ) -> Result<Money> {
        Ok(self.lock().ledger_account(provider_id, category, kind)?.balance)
    }

    pub fn provider_balance(&self, id: ProviderId) -> Result<Money> {
        Ok(self.lock().provider(id)?.available_balance)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // a poisoned lock means a previous caller panicked mid-snapshot;
        // the committed state itself is still consistent
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LendingStore for MemoryStore {
    type Tx = MemoryState;

    fn run_in_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self::Tx) -> Result<T>,
    {
        let mut guard = self.lock();
        let mut snapshot = guard.clone();
        let value = f(&mut snapshot)?;
        *guard = snapshot;
        Ok(value)
    }

    fn overdue_unpaid_loans(&self, today: NaiveDate) -> Result<Vec<Loan>> {
        let mut loans: Vec<Loan> = self
            .lock()
            .loans
            .values()
            .filter(|loan| loan.is_overdue(today))
            .cloned()
            .collect();
        loans.sort_by_key(|loan| (loan.due_date, loan.id));
        Ok(loans)
    }

    fn providers(&self) -> Result<Vec<Provider>> {
        let mut providers: Vec<Provider> = self.lock().providers.values().cloned().collect();
        providers.sort_by_key(|p| p.id);
        Ok(providers)
    }

    fn product(&self, id: ProductId) -> Result<LoanProduct> {
        self.lock().product(id)
    }
}

impl StoreTx for MemoryState {
    fn loan(&self, id: LoanId) -> Result<Loan> {
        self.loans.get(&id).cloned().ok_or(LendingError::LoanNotFound { id })
    }

    fn insert_loan(&mut self, loan: &Loan) -> Result<()> {
        self.loans.insert(loan.id, loan.clone());
        Ok(())
    }

    fn update_loan(&mut self, loan: &Loan) -> Result<()> {
        if !self.loans.contains_key(&loan.id) {
            return Err(LendingError::LoanNotFound { id: loan.id });
        }
        self.loans.insert(loan.id, loan.clone());
        Ok(())
    }

    fn product(&self, id: ProductId) -> Result<LoanProduct> {
        self.products.get(&id).cloned().ok_or(LendingError::ProductNotFound { id })
    }

    fn provider(&self, id: ProviderId) -> Result<Provider> {
        self.providers.get(&id).cloned().ok_or(LendingError::ProviderNotFound { id })
    }

    fn borrower(&self, id: BorrowerId) -> Result<Borrower> {
        self.borrowers.get(&id).cloned().ok_or(LendingError::BorrowerNotFound { id })
    }

    fn adjust_provider_funds(&mut self, id: ProviderId, delta: Money) -> Result<()> {
        let provider = self
            .providers
            .get_mut(&id)
            .ok_or(LendingError::ProviderNotFound { id })?;
        provider.available_balance += delta;
        Ok(())
    }

    fn ledger_account(
        &self,
        provider_id: ProviderId,
        category: LedgerCategory,
        kind: LedgerAccountKind,
    ) -> Result<LedgerAccount> {
        self.accounts
            .values()
            .find(|a| a.provider_id == provider_id && a.category == category && a.kind == kind)
            .cloned()
            .ok_or(LendingError::MissingLedgerAccount { provider_id, category, kind })
    }

    fn adjust_account_balance(&mut self, id: LedgerAccountId, delta: Money) -> Result<()> {
        let account = self.accounts.get_mut(&id).ok_or(LendingError::AccountNotFound { id })?;
        account.balance += delta;
        Ok(())
    }

    fn insert_journal_entry(&mut self, entry: &JournalEntry) -> Result<()> {
        self.journal_entries.push(entry.clone());
        Ok(())
    }

    fn insert_payment(&mut self, payment: &Payment) -> Result<()> {
        self.payments.insert(payment.id, payment.clone());
        Ok(())
    }

    fn callback_status(&self, transaction_id: &str) -> Result<Option<CallbackStatus>> {
        Ok(self.callbacks.get(transaction_id).copied())
    }

    fn set_callback_status(&mut self, transaction_id: &str, status: CallbackStatus) -> Result<()> {
        self.callbacks.insert(transaction_id.to_string(), status);
        Ok(())
    }

    fn flag_npl_borrowers(
        &mut self,
        provider_id: ProviderId,
        threshold_date: NaiveDate,
    ) -> Result<u64> {
        let mut aged_borrowers: Vec<BorrowerId> = self
            .loans
            .values()
            .filter(|loan| {
                loan.provider_id == provider_id
                    && loan.repayment_status == RepaymentStatus::Unpaid
                    && loan.disbursed_date < threshold_date
            })
            .map(|loan| loan.borrower_id)
            .collect();
        aged_borrowers.sort();
        aged_borrowers.dedup();

        let mut updated = 0;
        for borrower_id in aged_borrowers {
            let borrower = self
                .borrowers
                .get_mut(&borrower_id)
                .ok_or(LendingError::BorrowerNotFound { id: borrower_id })?;
            if borrower.status != BorrowerStatus::Npl {
                borrower.status = BorrowerStatus::Npl;
                updated += 1;
            }
        }
        Ok(updated)
    }
}
