//! HTTP request handlers for the account service

use crate::models::*;
use crate::state::AppState;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE, SERVER};
use hyper::{Method, Request, Response, StatusCode};
use ledger_core::auth::{bearer_token, AuthError, AuthorizedIdentity, EnrolmentError, Rejection};
use ledger_core::{AccountId, LedgerError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub type ResponseBody = Full<Bytes>;

/// Failure of a single request, mapped onto a status code
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_response(self) -> Response<ResponseBody> {
        let message = match &self {
            ApiError::Internal(detail) => {
                error!("Internal error: {}", detail);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        json_response(self.status(), &ErrorBody { error: message })
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err.rejection() {
            Rejection::Unauthorized => ApiError::Unauthorized,
            Rejection::ServerFault => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidAccountId(id) => {
                ApiError::BadRequest(format!("invalid account id: {}", id))
            }
            LedgerError::AccountNotFound { .. } => ApiError::NotFound,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<EnrolmentError> for ApiError {
    fn from(err: EnrolmentError) -> Self {
        match err {
            EnrolmentError::EmptySecret => ApiError::BadRequest(err.to_string()),
            EnrolmentError::Auth(auth) => auth.into(),
        }
    }
}

/// Main request handler
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<ResponseBody>, Infallible>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("Handling {} {}", method, path);

    let response = match route(req, state).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    };

    info!("{} {} -> {}", method, path, response.status());
    Ok(response)
}

async fn route<B>(req: Request<B>, state: Arc<AppState>) -> Result<Response<ResponseBody>, ApiError>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = req.into_body();

    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (&method, segments.as_slice()) {
        (&Method::GET, ["health"]) => handle_health(),
        (_, ["health"]) => Err(ApiError::MethodNotAllowed),

        (&Method::POST, ["login"]) => handle_login(body, state).await,
        (_, ["login"]) => Err(ApiError::MethodNotAllowed),

        (&Method::GET, ["account"]) => handle_list_accounts(&state),
        (&Method::POST, ["account"]) => handle_create_account(body, state).await,
        (_, ["account"]) => Err(ApiError::MethodNotAllowed),

        (&Method::GET, ["account", id]) => {
            let identity = authorize(&state, id, auth_header.as_deref())?;
            handle_get_account(&identity)
        }
        (&Method::PUT, ["account", id]) => {
            let identity = authorize(&state, id, auth_header.as_deref())?;
            handle_update_account(body, state, identity).await
        }
        (&Method::DELETE, ["account", id]) => {
            let identity = authorize(&state, id, auth_header.as_deref())?;
            handle_delete_account(state, identity).await
        }
        (_, ["account", _]) => Err(ApiError::MethodNotAllowed),

        (&Method::PUT, ["account", id, "password"]) => {
            let identity = authorize(&state, id, auth_header.as_deref())?;
            handle_change_password(body, state, identity).await
        }
        (_, ["account", _, "password"]) => Err(ApiError::MethodNotAllowed),

        _ => Err(ApiError::NotFound),
    }
}

/// Run the access guard for the account addressed by the path
fn authorize(
    state: &AppState,
    id_segment: &str,
    auth_header: Option<&str>,
) -> Result<AuthorizedIdentity, ApiError> {
    let account_id: AccountId = id_segment.parse()?;

    let result = bearer_token(auth_header).and_then(|token| state.guard.authorize(account_id, token));

    match result {
        Ok(identity) => {
            debug!(account_id = %account_id, "Request authorized");
            Ok(identity)
        }
        Err(err) => {
            warn!(account_id = %account_id, kind = err.kind(), "Authorization rejected: {}", err);
            Err(err.into())
        }
    }
}

/// Health check handler
fn handle_health() -> Result<Response<ResponseBody>, ApiError> {
    Ok(json_response(
        StatusCode::OK,
        &json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "service": "ledger",
            "timestamp": chrono::Utc::now().to_rfc3339()
        }),
    ))
}

async fn handle_login<B>(body: B, state: Arc<AppState>) -> Result<Response<ResponseBody>, ApiError>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let request: LoginRequest = read_json(body).await?;
    let number = request
        .number
        .account_number()
        .ok_or_else(|| ApiError::BadRequest("invalid account number".to_string()))?;

    let issued = blocking(move || {
        state
            .authenticator
            .login(number, &request.password)
            .map_err(|err| {
                warn!(account_number = %number, kind = err.kind(), "Login rejected: {}", err);
                ApiError::from(err)
            })
    })
    .await?;

    info!(account_number = %number, "Issued session token");
    Ok(json_response(StatusCode::OK, &LoginResponse::from(issued)))
}

fn handle_list_accounts(state: &AppState) -> Result<Response<ResponseBody>, ApiError> {
    let accounts: Vec<AccountResponse> = state
        .ledger
        .list_accounts()?
        .iter()
        .map(AccountResponse::from)
        .collect();

    Ok(json_response(StatusCode::OK, &accounts))
}

async fn handle_create_account<B>(
    body: B,
    state: Arc<AppState>,
) -> Result<Response<ResponseBody>, ApiError>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let request: CreateAccountRequest = read_json(body).await?;

    let account = blocking(move || {
        state
            .authenticator
            .enroll(
                &request.first_name,
                &request.last_name,
                &request.email,
                &request.password,
            )
            .map_err(ApiError::from)
    })
    .await?;

    info!(account_id = %account.id, "Created account");
    Ok(json_response(StatusCode::CREATED, &AccountResponse::from(&account)))
}

fn handle_get_account(identity: &AuthorizedIdentity) -> Result<Response<ResponseBody>, ApiError> {
    Ok(json_response(
        StatusCode::OK,
        &AccountResponse::from(&identity.account),
    ))
}

async fn handle_update_account<B>(
    body: B,
    state: Arc<AppState>,
    identity: AuthorizedIdentity,
) -> Result<Response<ResponseBody>, ApiError>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let request: UpdateAccountRequest = read_json(body).await?;
    let account_id = identity.id();

    // Applied to the stored record, not the snapshot read by the guard
    let account = blocking(move || {
        state
            .ledger
            .update_profile(account_id, request.into())
            .map_err(ApiError::from)
    })
    .await?;

    debug!(account_id = %account.id, "Updated account");
    Ok(json_response(StatusCode::OK, &AccountResponse::from(&account)))
}

async fn handle_delete_account(
    state: Arc<AppState>,
    identity: AuthorizedIdentity,
) -> Result<Response<ResponseBody>, ApiError> {
    let account_id = identity.id();

    blocking(move || {
        state
            .ledger
            .delete_account(account_id)
            .map_err(ApiError::from)
    })
    .await?;

    info!(account_id = %account_id, "Deleted account");
    Ok(json_response(
        StatusCode::OK,
        &DeleteResponse {
            deleted: true,
            id: account_id,
        },
    ))
}

async fn handle_change_password<B>(
    body: B,
    state: Arc<AppState>,
    identity: AuthorizedIdentity,
) -> Result<Response<ResponseBody>, ApiError>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let request: UpdatePasswordRequest = read_json(body).await?;
    let account_id = identity.id();

    blocking(move || {
        state
            .authenticator
            .change_password(&identity, &request.old_password, &request.new_password)
            .map_err(|err| {
                if let EnrolmentError::Auth(auth) = &err {
                    warn!(account_id = %account_id, kind = auth.kind(), "Password change rejected: {}", auth);
                }
                ApiError::from(err)
            })
    })
    .await?;

    info!(account_id = %account_id, "Changed account password");
    Ok(json_response(
        StatusCode::OK,
        &json!({ "id": account_id, "password_updated": true }),
    ))
}

/// Run credential hashing and synced store writes off the async workers
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {}", e)))?
}

async fn read_json<T, B>(body: B) -> Result<T, ApiError>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: std::fmt::Display,
{
    let bytes = body
        .collect()
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read request body: {}", e)))?
        .to_bytes();

    serde_json::from_slice(&bytes).map_err(|e| ApiError::BadRequest(format!("invalid JSON: {}", e)))
}

/// JSON response builder
pub fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<ResponseBody> {
    match serde_json::to_vec(value) {
        Ok(body) => build_response(status, Bytes::from(body)),
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            build_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                Bytes::from_static(br#"{"error":"internal server error"}"#),
            )
        }
    }
}

fn build_response(status: StatusCode, body: Bytes) -> Response<ResponseBody> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
        .headers_mut()
        .insert(SERVER, HeaderValue::from_static("ledger/0.1.0"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_map_to_status() {
        assert_eq!(
            ApiError::from(AuthError::ExpiredToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::UnknownAccount(AccountId::new(1))).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::StoreUnavailable("down".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let response = ApiError::Internal("disk on fire".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    }
}
