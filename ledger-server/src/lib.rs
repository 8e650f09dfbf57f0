//! Account service over HTTP: enrolment, login and token-gated account access

pub mod config;
pub mod handlers;
pub mod models;
pub mod server;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use handlers::handle_request;
pub use server::LedgerServer;
pub use state::AppState;
