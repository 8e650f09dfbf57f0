//! Error types for the ledger

use crate::{AccountId, AccountNumber};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Account not found: {id}")]
    AccountNotFound { id: AccountId },

    #[error("Account number of {id} cannot change (stored {stored}, given {given})")]
    ImmutableNumber {
        id: AccountId,
        stored: AccountNumber,
        given: AccountNumber,
    },

    #[error("Invalid account id: {0}")]
    InvalidAccountId(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
