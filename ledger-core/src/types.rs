//! Core data types for the ledger

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Internal account identifier, assigned by the store at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(u64);

impl AccountId {
    pub fn new(id: u64) -> Self {
        AccountId(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl FromStr for AccountId {
    type Err = crate::LedgerError;

    fn from_str(s: &str) -> crate::Result<Self> {
        s.parse::<u64>()
            .map(AccountId)
            .map_err(|_| crate::LedgerError::InvalidAccountId(s.to_string()))
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Public account number used as the login handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountNumber(u64);

impl AccountNumber {
    /// Exclusive upper bound for randomly assigned numbers
    pub const UPPER_BOUND: u64 = 10_000_000;

    pub fn new(number: u64) -> Self {
        AccountNumber(number)
    }

    /// Draw a fresh number; callers are responsible for uniqueness
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        AccountNumber(rng.gen_range(0..Self::UPPER_BOUND))
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl std::fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bank account record as held by the ledger store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub number: AccountNumber,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub balance: i64,
    /// Argon2 PHC string; the plaintext secret is never retained
    pub credential_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Build the record for a freshly allocated id and number
    pub fn from_new(id: AccountId, number: AccountNumber, new: NewAccount) -> Self {
        Account {
            id,
            number,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            balance: 0,
            credential_hash: new.credential_hash,
            created_at: Utc::now(),
        }
    }

    /// Apply a display-attribute change
    pub fn apply(&mut self, update: AccountUpdate) {
        self.first_name = update.first_name;
        self.last_name = update.last_name;
        self.email = update.email;
    }
}

/// Caller-supplied fields for a new account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub credential_hash: String,
}

/// Display attributes that may change after creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_parsing() {
        assert_eq!("42".parse::<AccountId>().unwrap(), AccountId::new(42));
        assert!("".parse::<AccountId>().is_err());
        assert!("-1".parse::<AccountId>().is_err());
        assert!("abc".parse::<AccountId>().is_err());
    }

    #[test]
    fn test_number_serializes_as_plain_integer() {
        let json = serde_json::to_string(&AccountNumber::new(1234567)).unwrap();
        assert_eq!(json, "1234567");
    }
}
