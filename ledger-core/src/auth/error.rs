//! Error taxonomy for the auth subsystem

use crate::{AccountId, LedgerError};
use thiserror::Error;

/// Every way an authentication or authorization attempt can end badly.
///
/// The variant is for logs only. Callers outside the subsystem see the
/// coarser [`Rejection`].
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("token algorithm {found} is not accepted, expected {expected}")]
    AlgorithmMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("token signature did not verify")]
    InvalidSignature,

    #[error("token has expired")]
    ExpiredToken,

    #[error("token claims do not match account {account_id}")]
    ClaimMismatch { account_id: AccountId },

    #[error("account {0} could not be resolved")]
    UnknownAccount(AccountId),

    #[error("credentials did not match")]
    CredentialMismatch,

    #[error("signing secret too short: {len} bytes, at least {min} required")]
    WeakSecret { min: usize, len: usize },

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("credential hashing failed: {0}")]
    Hashing(String),

    #[error("ledger store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Externally observable outcome of a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Auth decision; carries no detail about the cause
    Unauthorized,
    /// Infrastructure failure; the caller may retry the whole request
    ServerFault,
}

impl AuthError {
    /// Whether this error comes from infrastructure rather than a decision
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            AuthError::WeakSecret { .. }
                | AuthError::Signing(_)
                | AuthError::Hashing(_)
                | AuthError::StoreUnavailable(_)
        )
    }

    pub fn rejection(&self) -> Rejection {
        if self.is_infrastructure() {
            Rejection::ServerFault
        } else {
            Rejection::Unauthorized
        }
    }

    /// Short stable label for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MalformedToken(_) => "malformed_token",
            AuthError::AlgorithmMismatch { .. } => "algorithm_mismatch",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::ExpiredToken => "expired_token",
            AuthError::ClaimMismatch { .. } => "claim_mismatch",
            AuthError::UnknownAccount(_) => "unknown_account",
            AuthError::CredentialMismatch => "credential_mismatch",
            AuthError::WeakSecret { .. } => "weak_secret",
            AuthError::Signing(_) => "signing",
            AuthError::Hashing(_) => "hashing",
            AuthError::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

impl From<LedgerError> for AuthError {
    fn from(err: LedgerError) -> Self {
        AuthError::StoreUnavailable(err.to_string())
    }
}
