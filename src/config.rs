//! Client configuration from the environment

use crate::api::ProviderPreference;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_USER_ID: i64 = 1;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has invalid value '{value}': {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings for reaching the chat backend
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Sent as the `user-id` header on every request
    pub user_id: i64,
    pub timeout: Duration,
    pub upload_timeout: Duration,
    /// Provider hint used until the user picks another
    pub provider: ProviderPreference,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_id: DEFAULT_USER_ID,
            timeout: DEFAULT_TIMEOUT,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
            provider: ProviderPreference::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let base_url = lookup("SUKUK_API_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.base_url);

        let user_id = match lookup("SUKUK_USER_ID") {
            Some(raw) => raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    key: "SUKUK_USER_ID",
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?,
            None => defaults.user_id,
        };

        let timeout = parse_secs(&lookup, "SUKUK_TIMEOUT_SECS")?.unwrap_or(defaults.timeout);
        let upload_timeout =
            parse_secs(&lookup, "SUKUK_UPLOAD_TIMEOUT_SECS")?.unwrap_or(defaults.upload_timeout);

        let provider = match lookup("SUKUK_PROVIDER") {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::InvalidValue {
                key: "SUKUK_PROVIDER",
                value: raw.clone(),
                reason,
            })?,
            None => defaults.provider,
        };

        Ok(Self {
            base_url,
            user_id,
            timeout,
            upload_timeout,
            provider,
        })
    }
}

fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            key,
            value: raw,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(secs) => Ok(Some(Duration::from_secs(secs))),
        Err(e) => Err(ConfigError::InvalidValue {
            key,
            value: raw,
            reason: e.to_string(),
        }),
    }
}
