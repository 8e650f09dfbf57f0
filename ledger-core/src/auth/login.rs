//! Enrolment, login and credential change

use crate::auth::{AuthError, AuthorizedIdentity, CredentialHasher, IssuedToken, TokenIssuer};
use crate::{Account, AccountNumber, NewAccount, SharedLedger};
use thiserror::Error;

/// Failures while enrolling an account or replacing its credential
#[derive(Error, Debug)]
pub enum EnrolmentError {
    #[error("password must not be empty")]
    EmptySecret,

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<crate::LedgerError> for EnrolmentError {
    fn from(err: crate::LedgerError) -> Self {
        EnrolmentError::Auth(AuthError::from(err))
    }
}

/// Credential verification and token issuance over the ledger
pub struct Authenticator {
    ledger: SharedLedger,
    hasher: CredentialHasher,
    issuer: TokenIssuer,
    /// Verified against when the account number is unknown, so both
    /// failure paths cost one hash computation
    decoy_hash: String,
}

impl Authenticator {
    pub fn new(
        ledger: SharedLedger,
        hasher: CredentialHasher,
        issuer: TokenIssuer,
    ) -> Result<Self, AuthError> {
        let decoy_hash = hasher.hash("decoy credential")?;

        Ok(Authenticator {
            ledger,
            hasher,
            issuer,
            decoy_hash,
        })
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Hash the secret and create the account
    pub fn enroll(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        secret: &str,
    ) -> Result<Account, EnrolmentError> {
        if secret.is_empty() {
            return Err(EnrolmentError::EmptySecret);
        }

        let credential_hash = self.hasher.hash(secret)?;
        let account = self.ledger.create_account(NewAccount {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            credential_hash,
        })?;

        Ok(account)
    }

    /// Verify a number/secret pair and issue a session token.
    ///
    /// An unknown number and a wrong secret both yield `CredentialMismatch`.
    pub fn login(&self, number: AccountNumber, secret: &str) -> Result<IssuedToken, AuthError> {
        let account = self.ledger.find_account_by_number(number)?;

        let account = match account {
            Some(account) => account,
            None => {
                self.hasher.verify(&self.decoy_hash, secret)?;
                return Err(AuthError::CredentialMismatch);
            }
        };

        if !self.hasher.verify(&account.credential_hash, secret)? {
            return Err(AuthError::CredentialMismatch);
        }

        self.issuer.issue(&account)
    }

    /// Replace the credential of an authorized account after re-checking the old one
    pub fn change_password(
        &self,
        identity: &AuthorizedIdentity,
        old_secret: &str,
        new_secret: &str,
    ) -> Result<(), EnrolmentError> {
        if new_secret.is_empty() {
            return Err(EnrolmentError::EmptySecret);
        }

        let account = self
            .ledger
            .find_account_by_id(identity.id())?
            .ok_or(AuthError::UnknownAccount(identity.id()))?;

        if !self.hasher.verify(&account.credential_hash, old_secret)? {
            return Err(AuthError::CredentialMismatch.into());
        }

        let credential_hash = self.hasher.hash(new_secret)?;
        self.ledger.replace_credential(account.id, credential_hash)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AccessGuard, SigningSecret, TokenValidator, DEFAULT_VALIDITY};
    use crate::{AccountUpdate, LedgerStore, MemoryLedger};
    use std::sync::Arc;

    fn setup() -> (Arc<MemoryLedger>, Authenticator, AccessGuard) {
        let secret = SigningSecret::new("login-signing-secret-0123456789abcd").unwrap();
        let ledger = Arc::new(MemoryLedger::new());
        let authenticator = Authenticator::new(
            ledger.clone(),
            CredentialHasher::with_params(1024, 1, 1).unwrap(),
            TokenIssuer::new(&secret, DEFAULT_VALIDITY),
        )
        .unwrap();
        let guard = AccessGuard::new(TokenValidator::new(&secret), ledger.clone());
        (ledger, authenticator, guard)
    }

    #[test]
    fn test_enroll_stores_hash_not_secret() {
        let (ledger, auth, _) = setup();
        let account = auth.enroll("12313", "Monkey", "teste@mail.com", "112233").unwrap();

        let stored = ledger.find_account_by_id(account.id).unwrap().unwrap();
        assert_ne!(stored.credential_hash, "112233");
        assert!(!stored.credential_hash.contains("112233"));
    }

    #[test]
    fn test_enroll_rejects_empty_secret() {
        let (_, auth, _) = setup();
        assert!(matches!(
            auth.enroll("a", "b", "c@example.com", ""),
            Err(EnrolmentError::EmptySecret)
        ));
    }

    #[test]
    fn test_login_issues_token_for_account() {
        let (_, auth, guard) = setup();
        let account = auth.enroll("monkey", "Jonh", "monkey@mail.com", "223344").unwrap();

        let issued = auth.login(account.number, "223344").unwrap();
        assert_eq!(issued.account_number, account.number);
        assert!(guard.authorize(account.id, &issued.token).is_ok());
    }

    #[test]
    fn test_login_failures_are_indistinguishable() {
        let (_, auth, _) = setup();
        let account = auth.enroll("x", "y", "xy@example.com", "right").unwrap();
        let unknown = AccountNumber::new((account.number.get() + 1) % AccountNumber::UPPER_BOUND);

        let wrong_secret = auth.login(account.number, "wrong").unwrap_err();
        let wrong_number = auth.login(unknown, "right").unwrap_err();

        assert!(matches!(wrong_secret, AuthError::CredentialMismatch));
        assert!(matches!(wrong_number, AuthError::CredentialMismatch));
        assert_eq!(wrong_secret.to_string(), wrong_number.to_string());
    }

    #[test]
    fn test_change_password() {
        let (_, auth, guard) = setup();
        let account = auth.enroll("p", "q", "pq@example.com", "old-secret").unwrap();
        let token = auth.login(account.number, "old-secret").unwrap().token;
        let identity = guard.authorize(account.id, &token).unwrap();

        assert!(matches!(
            auth.change_password(&identity, "not-old", "new-secret"),
            Err(EnrolmentError::Auth(AuthError::CredentialMismatch))
        ));

        auth.change_password(&identity, "old-secret", "new-secret").unwrap();
        assert!(auth.login(account.number, "old-secret").is_err());
        assert!(auth.login(account.number, "new-secret").is_ok());
    }

    #[test]
    fn test_profile_update_after_password_change_keeps_new_password() {
        let (ledger, auth, guard) = setup();
        let account = auth.enroll("r", "s", "rs@example.com", "old-pw").unwrap();
        let token = auth.login(account.number, "old-pw").unwrap().token;

        // A profile edit authorized before the password change lands after it
        let stale = guard.authorize(account.id, &token).unwrap();
        let fresh = guard.authorize(account.id, &token).unwrap();
        auth.change_password(&fresh, "old-pw", "new-pw").unwrap();

        let updated = ledger
            .update_profile(
                stale.id(),
                AccountUpdate {
                    first_name: "Renamed".to_string(),
                    last_name: "s".to_string(),
                    email: "rs@example.com".to_string(),
                },
            )
            .unwrap();

        assert_eq!(updated.first_name, "Renamed");
        assert!(auth.login(account.number, "old-pw").is_err());
        assert!(auth.login(account.number, "new-pw").is_ok());
    }
}
