//! Request and response bodies

use chrono::{DateTime, Utc};
use ledger_core::auth::IssuedToken;
use ledger_core::{Account, AccountId, AccountNumber, AccountUpdate};
use serde::{Deserialize, Serialize};

/// Account numbers are accepted as JSON numbers or numeric strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberField {
    Int(u64),
    Text(String),
}

impl NumberField {
    pub fn account_number(&self) -> Option<AccountNumber> {
        match self {
            NumberField::Int(n) => Some(AccountNumber::new(*n)),
            NumberField::Text(s) => s.trim().parse().ok().map(AccountNumber::new),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub number: NumberField,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub number: AccountNumber,
    pub expires_at: u64,
}

impl From<IssuedToken> for LoginResponse {
    fn from(issued: IssuedToken) -> Self {
        LoginResponse {
            token: issued.token,
            number: issued.account_number,
            expires_at: issued.expires_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAccountRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<UpdateAccountRequest> for AccountUpdate {
    fn from(req: UpdateAccountRequest) -> Self {
        AccountUpdate {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Public view of an account; the credential hash never leaves the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: AccountId,
    pub number: AccountNumber,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        AccountResponse {
            id: account.id,
            number: account.number,
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.clone(),
            balance: account.balance,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: AccountId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
