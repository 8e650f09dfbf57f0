//! Access guard for account-scoped operations
//!
//! A token only proves possession of one specific account. The guard
//! resolves the account addressed by the request and admits the request
//! only when that account's number is the one the token was issued for.

use crate::auth::{constant_time_number_compare, AccountClaims, AuthError, TokenValidator};
use crate::{Account, AccountId, SharedLedger};

/// Authorization scheme expected in the `Authorization` header, matched case-insensitively
pub const BEARER_SCHEME: &str = "Bearer";

/// An account the current request has proven ownership of
#[derive(Debug, Clone)]
pub struct AuthorizedIdentity {
    pub account: Account,
    pub claims: AccountClaims,
}

impl AuthorizedIdentity {
    pub fn id(&self) -> AccountId {
        self.account.id
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header =
        header.ok_or_else(|| AuthError::MalformedToken("missing authorization header".to_string()))?;

    let token = header
        .trim_start()
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case(BEARER_SCHEME))
        .map(|(_, token)| token.trim())
        .ok_or_else(|| AuthError::MalformedToken("expected bearer scheme".to_string()))?;

    if token.is_empty() {
        return Err(AuthError::MalformedToken("empty bearer token".to_string()));
    }

    Ok(token)
}

/// Token validation composed with a ledger lookup and a claim match
pub struct AccessGuard {
    validator: TokenValidator,
    ledger: SharedLedger,
}

impl AccessGuard {
    pub fn new(validator: TokenValidator, ledger: SharedLedger) -> Self {
        AccessGuard { validator, ledger }
    }

    /// Admit a request for `account_id` only if `token` was issued to that account.
    ///
    /// The account is looked up on every call so a deleted or changed record
    /// is reflected immediately.
    pub fn authorize(
        &self,
        account_id: AccountId,
        token: &str,
    ) -> Result<AuthorizedIdentity, AuthError> {
        let claims = self.validator.validate(token)?;

        let account = self
            .ledger
            .find_account_by_id(account_id)?
            .ok_or(AuthError::UnknownAccount(account_id))?;

        if !constant_time_number_compare(account.number, claims.account_number) {
            return Err(AuthError::ClaimMismatch { account_id });
        }

        Ok(AuthorizedIdentity { account, claims })
    }
}
