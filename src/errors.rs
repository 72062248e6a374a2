use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{LedgerAccountKind, LedgerCategory};

#[derive(Error, Debug)]
pub enum LendingError {
    #[error("missing ledger account for provider {provider_id}: {category:?}/{kind:?}")]
    MissingLedgerAccount {
        provider_id: Uuid,
        category: LedgerCategory,
        kind: LedgerAccountKind,
    },

    #[error("insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        available: Money,
        requested: Money,
    },

    #[error("callback signature mismatch for transaction {transaction_id}")]
    SignatureMismatch {
        transaction_id: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("unknown batch task: {name}")]
    UnknownTask {
        name: String,
    },

    #[error("loan not found: {id}")]
    LoanNotFound {
        id: Uuid,
    },

    #[error("borrower not found: {id}")]
    BorrowerNotFound {
        id: Uuid,
    },

    #[error("provider not found: {id}")]
    ProviderNotFound {
        id: Uuid,
    },

    #[error("loan product not found: {id}")]
    ProductNotFound {
        id: Uuid,
    },

    #[error("ledger account not found: {id}")]
    AccountNotFound {
        id: Uuid,
    },

    #[error("storage failure: {message}")]
    Storage {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, LendingError>;
