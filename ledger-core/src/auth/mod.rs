//! Authentication and authorization for account-scoped operations
//!
//! This module implements the security plane with:
//! - Argon2id credential hashing and verification
//! - HS256 session tokens bound to an account number
//! - An access guard matching token claims against the addressed account
//! - Constant-time comparisons for secret-derived values

pub mod error;
pub mod guard;
pub mod login;
pub mod password;
pub mod timing;
pub mod token;

pub use error::*;
pub use guard::*;
pub use login::*;
pub use password::*;
pub use timing::*;
pub use token::*;
