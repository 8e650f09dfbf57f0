//! Server configuration from command line and environment

use clap::{Arg, ArgAction, ArgMatches, Command};
use ledger_core::auth::{AuthError, SigningSecret};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the token signing secret
pub const SECRET_ENV: &str = "JWT_SECRET";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JWT_SECRET is not set or empty; a signing secret is required")]
    MissingSecret,

    #[error("JWT_SECRET is too short: {len} bytes, at least {min} required")]
    WeakSecret { min: usize, len: usize },

    #[error("invalid {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Process-wide configuration, built once at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub ephemeral: bool,
    pub seed: bool,
    pub token_validity: Duration,
    pub signing_secret: SigningSecret,
}

/// Command line definition
pub fn command() -> Command {
    Command::new("ledger-server")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Bank account service with token-gated account operations")
        .arg(
            Arg::new("bind")
                .long("bind")
                .env("LEDGER_BIND")
                .value_name("ADDR")
                .help("Bind address")
                .default_value("127.0.0.1:3000"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .env("LEDGER_DATA_DIR")
                .value_name("PATH")
                .help("Data directory path")
                .default_value("./data"),
        )
        .arg(
            Arg::new("token-ttl")
                .long("token-ttl")
                .env("LEDGER_TOKEN_TTL")
                .value_name("SECONDS")
                .help("Validity window of issued session tokens")
                .default_value("3600"),
        )
        .arg(
            Arg::new("ephemeral")
                .long("ephemeral")
                .help("Keep accounts in memory instead of on disk")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("seed")
                .short('s')
                .long("seed")
                .help("Create demo accounts at startup")
                .action(ArgAction::SetTrue),
        )
}

impl ServerConfig {
    /// Build the configuration from parsed arguments and the raw signing secret
    pub fn from_matches(matches: &ArgMatches, secret: Option<String>) -> Result<Self, ConfigError> {
        let secret = secret.filter(|s| !s.is_empty()).ok_or(ConfigError::MissingSecret)?;
        let signing_secret = SigningSecret::new(secret).map_err(|e| match e {
            AuthError::WeakSecret { min, len } => ConfigError::WeakSecret { min, len },
            _ => ConfigError::MissingSecret,
        })?;

        let bind = required(matches, "bind")?;
        let bind_addr = bind.parse().map_err(|_| ConfigError::Invalid {
            name: "bind address",
            value: bind.to_string(),
        })?;

        let data_dir = PathBuf::from(required(matches, "data-dir")?);

        let ttl = required(matches, "token-ttl")?;
        let token_validity = ttl
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or_else(|| ConfigError::Invalid {
                name: "token ttl",
                value: ttl.to_string(),
            })?;

        Ok(ServerConfig {
            bind_addr,
            data_dir,
            ephemeral: matches.get_flag("ephemeral"),
            seed: matches.get_flag("seed"),
            token_validity,
            signing_secret,
        })
    }

    /// Parse process arguments and read the secret from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let matches = command().get_matches();
        Self::from_matches(&matches, std::env::var(SECRET_ENV).ok())
    }
}

fn required<'a>(matches: &'a ArgMatches, name: &'static str) -> Result<&'a str, ConfigError> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or(ConfigError::Invalid {
            name,
            value: "<missing>".to_string(),
        })
}
