//! Configuration management for the Stripe Invoice MCP Server
//!
//! Handles the Stripe credential and HTTP client settings loaded from
//! environment variables.

use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Configuration for the Stripe Invoice MCP Server
#[derive(Clone)]
pub struct Config {
    /// Stripe secret API key
    pub secret_key: String,

    /// Base URL of the Stripe API
    pub api_base: String,

    /// Transport timeout for each Stripe request
    pub timeout: Duration,
}

impl Config {
    /// Load configuration from the process environment
    pub fn new() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = lookup(env::SECRET_KEY)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar {
                var: env::SECRET_KEY.to_string(),
            })?;

        let api_base = lookup(env::API_BASE)
            .map(|b| b.trim().trim_end_matches('/').to_string())
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| stripe::API_BASE_URL.to_string());

        let timeout = match lookup(env::TIMEOUT_SECS) {
            Some(raw) => Duration::from_secs(parse_timeout(&raw)?),
            None => Duration::from_secs(stripe::DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            secret_key,
            api_base,
            timeout,
        })
    }

    /// Override the API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn parse_timeout(raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidConfig {
            message: format!(
                "{} must be a positive number of seconds, got '{}'",
                env::TIMEOUT_SECS, raw
            ),
        }
        .into()),
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("secret_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Environment variable names
pub mod env {
    pub const SECRET_KEY: &str = "STRIPE_SECRET_KEY";
    pub const API_BASE: &str = "STRIPE_API_BASE";
    pub const TIMEOUT_SECS: &str = "STRIPE_TIMEOUT_SECS";
}

/// Stripe API constants
pub mod stripe {
    /// Base URL for the Stripe API
    pub const API_BASE_URL: &str = "https://api.stripe.com";

    /// Matches the official client libraries' default
    pub const DEFAULT_TIMEOUT_SECS: u64 = 80;

    /// Prefix shared by all invoice identifiers
    pub const INVOICE_ID_PREFIX: &str = "in_";
}
