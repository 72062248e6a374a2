use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;

/// unique identifier for a loan
pub type LoanId = Uuid;
/// unique identifier for a borrower
pub type BorrowerId = Uuid;
/// unique identifier for a loan provider
pub type ProviderId = Uuid;
/// unique identifier for a loan product
pub type ProductId = Uuid;
/// unique identifier for a ledger account
pub type LedgerAccountId = Uuid;
/// unique identifier for a journal entry
pub type JournalEntryId = Uuid;
/// unique identifier for a payment receipt
pub type PaymentId = Uuid;

/// loan repayment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepaymentStatus {
    /// outstanding balance remaining
    Unpaid,
    /// fully settled, terminal
    Paid,
}

/// borrower standing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BorrowerStatus {
    Active,
    /// flagged as non-performing by the classifier
    Npl,
}

/// fee category a ledger account tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerCategory {
    Principal,
    Interest,
    ServiceFee,
    Penalty,
}

/// role of a ledger account within a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerAccountKind {
    /// amount the borrower still owes
    Receivable,
    /// amount actually collected
    Received,
    /// fee income recognized at disbursement
    Income,
}

/// lifecycle of an inbound payment-callback transaction id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallbackStatus {
    Pending,
    Completed,
}

/// side of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySide {
    Debit,
    Credit,
}

/// amount-owed breakdown as of a date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AmountBreakdown {
    pub principal: Money,
    pub service_fee: Money,
    pub interest: Money,
    pub penalty: Money,
    pub total: Money,
}

impl AmountBreakdown {
    /// amount still due after prior repayments
    pub fn due_after(&self, already_repaid: Money) -> Money {
        self.total.saturating_sub(already_repaid)
    }
}

/// per-category split of a single payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Allocation {
    pub penalty: Money,
    pub service_fee: Money,
    pub interest: Money,
    pub principal: Money,
}

impl Allocation {
    pub fn total_allocated(&self) -> Money {
        self.penalty + self.service_fee + self.interest + self.principal
    }

    /// iterate non-zero categories in waterfall order
    pub fn non_zero(&self) -> Vec<(LedgerCategory, Money)> {
        [
            (LedgerCategory::Penalty, self.penalty),
            (LedgerCategory::ServiceFee, self.service_fee),
            (LedgerCategory::Interest, self.interest),
            (LedgerCategory::Principal, self.principal),
        ]
        .into_iter()
        .filter(|(_, amount)| amount.is_positive())
        .collect()
    }
}
