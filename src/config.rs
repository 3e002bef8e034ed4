//! Startup configuration read from the environment

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_RESPONDER_URL: &str = "http://127.0.0.1:8060/api/chat";
pub const DEFAULT_RESPONSE_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 1800;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}

/// Remote responder settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponderConfig {
    pub endpoint: String,
    /// Upper bound on a single call; `None` waits forever
    pub timeout: Option<Duration>,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_RESPONDER_URL.to_string(),
            timeout: Some(Duration::from_secs(DEFAULT_RESPONSE_TIMEOUT_SECS)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub responder: ResponderConfig,
    pub identity_path: PathBuf,
    /// Sessions untouched this long are dropped; `None` keeps them until ended
    pub session_idle_timeout: Option<Duration>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the config from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("ASSISTANT_PORT") {
            Some(raw) => parse_number("ASSISTANT_PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        let endpoint = match lookup("ASSISTANT_RESPONDER_URL") {
            Some(raw) if raw.trim().is_empty() => {
                return Err(ConfigError::Empty {
                    var: "ASSISTANT_RESPONDER_URL",
                })
            }
            Some(raw) => raw.trim().to_string(),
            None => DEFAULT_RESPONDER_URL.to_string(),
        };

        // 0 disables the timeout
        let timeout_secs: u64 = match lookup("ASSISTANT_RESPONSE_TIMEOUT_SECS") {
            Some(raw) => parse_number("ASSISTANT_RESPONSE_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_RESPONSE_TIMEOUT_SECS,
        };
        let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        // 0 disables expiry
        let idle_secs: u64 = match lookup("ASSISTANT_SESSION_IDLE_SECS") {
            Some(raw) => parse_number("ASSISTANT_SESSION_IDLE_SECS", &raw)?,
            None => DEFAULT_SESSION_IDLE_SECS,
        };
        let session_idle_timeout = (idle_secs > 0).then(|| Duration::from_secs(idle_secs));

        let identity_path = lookup("ASSISTANT_IDENTITY_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.ask-assistant/identity.json"))
            },
            PathBuf::from,
        );

        Ok(Self {
            port,
            responder: ResponderConfig { endpoint, timeout },
            identity_path,
            session_idle_timeout,
        })
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: raw.to_string(),
    })
}
