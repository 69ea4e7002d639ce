// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The host normally owns these values; the standalone binary reads them
//! from the environment (or a `.env` file).

use crate::models::CategoryScheme;
use crate::services::session::{DEFAULT_BASE_URL, DEFAULT_RATE_LIMIT_BACKOFF};
use crate::services::Credentials;
use std::env;
use std::fmt;
use std::time::Duration;

/// Default refresh interval in minutes.
pub const DEFAULT_REFRESH_INTERVAL_MINUTES: u64 = 15;

/// Integration configuration, loaded once at startup.
#[derive(Clone)]
pub struct Config {
    /// iRacing account email
    pub username: String,
    /// iRacing account password (only ever used to derive the login token)
    pub password: String,
    /// Member whose statistics are published
    pub cust_id: u64,
    pub refresh_interval_minutes: u64,
    pub category_scheme: CategoryScheme,
    /// Members API base URL
    pub base_url: String,
    /// Wait applied to a 429 without a reset header
    pub rate_limit_backoff: Duration,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            username: "driver@example.com".to_string(),
            password: "test_password".to_string(),
            cust_id: 12345,
            refresh_interval_minutes: DEFAULT_REFRESH_INTERVAL_MINUTES,
            category_scheme: CategoryScheme::current(),
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limit_backoff: DEFAULT_RATE_LIMIT_BACKOFF,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("cust_id", &self.cust_id)
            .field("refresh_interval_minutes", &self.refresh_interval_minutes)
            .field("category_scheme", &self.category_scheme)
            .field("base_url", &self.base_url)
            .field("rate_limit_backoff", &self.rate_limit_backoff)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let username = env::var("IRACING_USERNAME")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("IRACING_USERNAME"))?;
        if !looks_like_email(&username) {
            return Err(ConfigError::Invalid {
                name: "IRACING_USERNAME",
                reason: "must be an email address".to_string(),
            });
        }

        let password =
            env::var("IRACING_PASSWORD").map_err(|_| ConfigError::Missing("IRACING_PASSWORD"))?;

        let cust_id = env::var("IRACING_CUST_ID")
            .map_err(|_| ConfigError::Missing("IRACING_CUST_ID"))?
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::Invalid {
                name: "IRACING_CUST_ID",
                reason: format!("{}", e),
            })?;

        let refresh_interval_minutes = match env::var("IRACING_REFRESH_INTERVAL_MINUTES") {
            Ok(v) => match v.trim().parse::<u64>() {
                Ok(minutes) if minutes >= 1 => minutes,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "IRACING_REFRESH_INTERVAL_MINUTES",
                        reason: "must be a whole number of minutes, at least 1".to_string(),
                    })
                }
            },
            Err(_) => DEFAULT_REFRESH_INTERVAL_MINUTES,
        };

        let category_scheme = match env::var("IRACING_CATEGORY_SCHEME") {
            Ok(v) => v.parse().map_err(|e: crate::models::SchemeError| ConfigError::Invalid {
                name: "IRACING_CATEGORY_SCHEME",
                reason: e.to_string(),
            })?,
            Err(_) => CategoryScheme::current(),
        };

        let rate_limit_backoff = env::var("IRACING_RATE_LIMIT_BACKOFF_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_RATE_LIMIT_BACKOFF);

        Ok(Self {
            username,
            password,
            cust_id,
            refresh_interval_minutes,
            category_scheme,
            base_url: env::var("IRACING_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            rate_limit_backoff,
        })
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_minutes * 60)
    }
}

/// Loose shape check: something@something.something
fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && domain.contains('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
