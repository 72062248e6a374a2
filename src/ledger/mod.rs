pub mod posting;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{
    EntrySide, JournalEntryId, LedgerAccountId, LedgerCategory, LedgerAccountKind, LoanId,
    ProviderId,
};

pub use posting::LedgerPoster;

/// one account in a provider's chart; exactly one must exist per
/// (provider, category, kind) triple the engine posts against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerAccount {
    pub id: LedgerAccountId,
    pub provider_id: ProviderId,
    pub category: LedgerCategory,
    pub kind: LedgerAccountKind,
    pub balance: Money,
}

impl LedgerAccount {
    pub fn new(provider_id: ProviderId, category: LedgerCategory, kind: LedgerAccountKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider_id,
            category,
            kind,
            balance: Money::ZERO,
        }
    }

    /// balance delta a posting of the given side applies to this account.
    /// All engine accounts are tracked debit-positive: a debit increases
    /// the balance, a credit decreases it.
    pub fn delta_for(side: EntrySide, amount: Money) -> Money {
        match side {
            EntrySide::Debit => amount,
            EntrySide::Credit => -amount,
        }
    }
}

/// one debit or credit row within a journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub ledger_account_id: LedgerAccountId,
    pub side: EntrySide,
    pub amount: Money,
}

impl LedgerEntry {
    /// signed amount: positive for debit, negative for credit
    pub fn signed_amount(&self) -> Money {
        match self.side {
            EntrySide::Debit => self.amount,
            EntrySide::Credit => -self.amount,
        }
    }
}

/// journal entry header owning the balanced debit/credit rows of one
/// financial movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: JournalEntryId,
    pub provider_id: ProviderId,
    pub loan_id: LoanId,
    pub date: NaiveDate,
    pub description: String,
    pub entries: Vec<LedgerEntry>,
}

impl JournalEntry {
    pub fn new(provider_id: ProviderId, loan_id: LoanId, date: NaiveDate, description: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider_id,
            loan_id,
            date,
            description,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, ledger_account_id: LedgerAccountId, side: EntrySide, amount: Money) {
        self.entries.push(LedgerEntry { ledger_account_id, side, amount });
    }

    pub fn total_debits(&self) -> Money {
        self.entries
            .iter()
            .filter(|e| e.side == EntrySide::Debit)
            .map(|e| e.amount)
            .sum()
    }

    pub fn total_credits(&self) -> Money {
        self.entries
            .iter()
            .filter(|e| e.side == EntrySide::Credit)
            .map(|e| e.amount)
            .sum()
    }

    /// double-entry invariant: signed amounts must cancel out
    pub fn is_balanced(&self) -> bool {
        self.entries
            .iter()
            .map(LedgerEntry::signed_amount)
            .sum::<Money>()
            .is_zero()
    }
}
