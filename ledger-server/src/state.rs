//! Shared per-process state handed to every request

use ledger_core::auth::{
    AccessGuard, AuthError, Authenticator, CredentialHasher, SigningSecret, TokenIssuer,
    TokenValidator,
};
use ledger_core::SharedLedger;
use std::time::Duration;

pub struct AppState {
    pub ledger: SharedLedger,
    pub authenticator: Authenticator,
    pub guard: AccessGuard,
}

impl AppState {
    /// Wire issuer and validator to the same secret and ledger
    pub fn new(
        ledger: SharedLedger,
        secret: &SigningSecret,
        token_validity: Duration,
        hasher: CredentialHasher,
    ) -> Result<Self, AuthError> {
        let issuer = TokenIssuer::new(secret, token_validity);
        let authenticator = Authenticator::new(ledger.clone(), hasher, issuer)?;
        let guard = AccessGuard::new(TokenValidator::new(secret), ledger.clone());

        Ok(AppState {
            ledger,
            authenticator,
            guard,
        })
    }
}
