//! Configuration management for the client.

use crate::remote::AuthToken;
use reviewsync_engine::DeleteReplay;
use std::env;
use std::time::Duration;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite URL of the local store
    pub database_url: String,
    /// Base URL of the review service, e.g. `https://api.example.com/v1`.
    /// Only commands that talk to the service need it.
    pub remote_base_url: Option<String>,
    /// Bearer token sent with every remote call
    pub auth_token: AuthToken,
    /// How reviews marked for deletion are replayed
    pub delete_replay: DeleteReplay,
    /// Per-request timeout for remote calls
    pub request_timeout: Duration,
}

impl Config {
    pub const DEFAULT_DATABASE_URL: &'static str = "sqlite://reviews.db";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| Self::DEFAULT_DATABASE_URL.to_string());

        let remote_base_url = lookup("REMOTE_BASE_URL").filter(|url| !url.trim().is_empty());

        let auth_token = AuthToken::new(lookup("AUTH_TOKEN").unwrap_or_default());

        let delete_replay = match lookup("DELETE_REPLAY") {
            Some(value) => value.parse()?,
            None => DeleteReplay::default(),
        };

        let timeout_secs = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(value) => value
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout)?,
            None => Self::DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            database_url,
            remote_base_url,
            auth_token,
            delete_replay,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// The service base URL, or an error when it is not configured.
    pub fn remote_base_url(&self) -> Result<&str, ConfigError> {
        self.remote_base_url
            .as_deref()
            .ok_or(ConfigError::MissingRemoteBaseUrl)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("REMOTE_BASE_URL environment variable is required to reach the review service")]
    MissingRemoteBaseUrl,

    #[error("Invalid REQUEST_TIMEOUT_SECS value")]
    InvalidTimeout,

    #[error("Invalid DELETE_REPLAY value: {0}")]
    InvalidDeleteReplay(#[from] reviewsync_engine::Error),
}
