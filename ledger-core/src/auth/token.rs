//! Session token issuance and validation
//!
//! Tokens are compact JWTs authenticated with HMAC-SHA256. The claim set
//! carries the account number the bearer proved possession of, plus the
//! registered `iat`/`nbf`/`exp`/`jti` claims.

use crate::auth::{constant_time_bytes_compare, AuthError};
use crate::{Account, AccountNumber};
use jwt_simple::prelude::*;
use jwt_simple::JWTError;
use serde::{Deserialize, Serialize};

/// The only signing algorithm this service accepts
pub const EXPECTED_ALGORITHM: &str = "HS256";

/// Default validity window for issued tokens
pub const DEFAULT_VALIDITY: std::time::Duration = std::time::Duration::from_secs(3600);

/// Shortest accepted signing secret; one HS256 block of key material
pub const MIN_SECRET_LEN: usize = 32;

/// Shared HMAC secret, loaded once at startup
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, AuthError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(AuthError::Signing("signing secret is empty".to_string()));
        }
        if bytes.len() < MIN_SECRET_LEN {
            return Err(AuthError::WeakSecret {
                min: MIN_SECRET_LEN,
                len: bytes.len(),
            });
        }
        Ok(SigningSecret(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq for SigningSecret {
    fn eq(&self, other: &Self) -> bool {
        constant_time_bytes_compare(&self.0, &other.0)
    }
}

impl Eq for SigningSecret {}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigningSecret([REDACTED; {}])", self.0.len())
    }
}

/// Custom claims embedded in every session token
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccountClaimSet {
    account_number: AccountNumber,
}

/// Claims of a token that passed every validation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountClaims {
    pub account_number: AccountNumber,
    /// Expiry as seconds since the Unix epoch
    pub expires_at: u64,
    pub token_id: Option<String>,
}

/// A freshly signed token and what it asserts
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub account_number: AccountNumber,
    /// Expiry as seconds since the Unix epoch
    pub expires_at: u64,
}

/// Signs time-bounded session tokens for authenticated accounts
pub struct TokenIssuer {
    key: HS256Key,
    validity: std::time::Duration,
}

impl TokenIssuer {
    pub fn new(secret: &SigningSecret, validity: std::time::Duration) -> Self {
        TokenIssuer {
            key: HS256Key::from_bytes(secret.as_bytes()),
            validity,
        }
    }

    pub fn validity(&self) -> std::time::Duration {
        self.validity
    }

    /// Issue a token for an account whose credentials were already verified
    pub fn issue(&self, account: &Account) -> Result<IssuedToken, AuthError> {
        self.issue_at(account, Clock::now_since_epoch())
    }

    /// Issue a token as if the current time were `issued_at`
    pub fn issue_at(
        &self,
        account: &Account,
        issued_at: UnixTimeStamp,
    ) -> Result<IssuedToken, AuthError> {
        let window = Duration::from_secs(self.validity.as_secs());
        let expires_at = issued_at + window;

        let mut claims = Claims::with_custom_claims(
            AccountClaimSet {
                account_number: account.number,
            },
            window,
        )
        .with_jwt_id(ulid::Ulid::new().to_string());
        claims.issued_at = Some(issued_at);
        claims.invalid_before = Some(issued_at);
        claims.expires_at = Some(expires_at);

        let token = self
            .key
            .authenticate(claims)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            account_number: account.number,
            expires_at: expires_at.as_secs(),
        })
    }
}

/// Verifies presented tokens and extracts their claims
pub struct TokenValidator {
    key: HS256Key,
}

impl TokenValidator {
    pub fn new(secret: &SigningSecret) -> Self {
        TokenValidator {
            key: HS256Key::from_bytes(secret.as_bytes()),
        }
    }

    /// Validate a token: structure, then algorithm, then signature, then expiry.
    ///
    /// No claim value is trusted before the signature has verified.
    pub fn validate(&self, token: &str) -> Result<AccountClaims, AuthError> {
        let metadata = Token::decode_metadata(token)
            .map_err(|e| AuthError::MalformedToken(e.to_string()))?;

        if metadata.algorithm() != EXPECTED_ALGORITHM {
            return Err(AuthError::AlgorithmMismatch {
                expected: EXPECTED_ALGORITHM,
                found: metadata.algorithm().to_string(),
            });
        }

        let options = VerificationOptions {
            time_tolerance: Some(Duration::from_secs(0)),
            ..Default::default()
        };

        let claims = self
            .key
            .verify_token::<serde_json::Map<String, serde_json::Value>>(token, Some(options))
            .map_err(classify_verification_error)?;

        let expires_at = claims
            .expires_at
            .ok_or_else(|| AuthError::MalformedToken("missing exp claim".to_string()))?;

        let custom: AccountClaimSet =
            serde_json::from_value(serde_json::Value::Object(claims.custom))
                .map_err(|e| AuthError::MalformedToken(format!("account claims: {}", e)))?;

        Ok(AccountClaims {
            account_number: custom.account_number,
            expires_at: expires_at.as_secs(),
            token_id: claims.jwt_id,
        })
    }
}

fn classify_verification_error(err: jwt_simple::Error) -> AuthError {
    if let Some(jwt_err) = err.downcast_ref::<JWTError>() {
        return match jwt_err {
            JWTError::TokenHasExpired => AuthError::ExpiredToken,
            JWTError::InvalidAuthenticationTag | JWTError::InvalidSignature => {
                AuthError::InvalidSignature
            }
            JWTError::AlgorithmMismatch => AuthError::AlgorithmMismatch {
                expected: EXPECTED_ALGORITHM,
                found: "unknown".to_string(),
            },
            other => AuthError::MalformedToken(other.to_string()),
        };
    }

    if err.downcast_ref::<serde_json::Error>().is_some() {
        return AuthError::MalformedToken(err.to_string());
    }

    AuthError::InvalidSignature
}
