//! Core data models, the ledger store capability and the
//! authentication / authorization subsystem for the account service.

pub mod auth;
pub mod error;
pub mod store;
pub mod types;

pub use error::*;
pub use store::*;
pub use types::*;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_number_range() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let number = AccountNumber::generate(&mut rng);
            assert!(number.get() < AccountNumber::UPPER_BOUND);
        }
    }

    #[test]
    fn test_account_update_keeps_identity() {
        let mut account = Account {
            id: AccountId::new(3),
            number: AccountNumber::new(424242),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            balance: 0,
            credential_hash: "$argon2id$placeholder".to_string(),
            created_at: chrono::Utc::now(),
        };

        account.apply(AccountUpdate {
            first_name: "Augusta".to_string(),
            last_name: "King".to_string(),
            email: "augusta@example.com".to_string(),
        });

        assert_eq!(account.id, AccountId::new(3));
        assert_eq!(account.number, AccountNumber::new(424242));
        assert_eq!(account.first_name, "Augusta");
        assert_eq!(account.email, "augusta@example.com");
    }
}
