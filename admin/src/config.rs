//! Configuration management for the admin core.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Host used when `FREEKICK_API_BASE_URL` is unset
pub const DEFAULT_API_BASE_URL: &str = "https://api.freekickapp.com";

/// Transport timeout used when `FREEKICK_API_TIMEOUT_SECS` is unset
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Token file used when `FREEKICK_TOKEN_FILE` is unset
pub const DEFAULT_TOKEN_FILE: &str = ".freekick/tokens.json";

/// List page size used when `FREEKICK_PAGE_LIMIT` is unset
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Errors raised while reading configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set to a value that could not be used
    #[error("invalid value for {key}: {value:?}")]
    Invalid {
        /// Environment variable name
        key: &'static str,
        /// Offending value
        value: String,
    },
}

/// Admin core configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminConfig {
    /// API base URL, without a trailing slash
    pub api_base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Where the session tokens are persisted
    pub token_file: PathBuf,
    /// Default `page_limit` for list filters
    pub page_limit: u32,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl AdminConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set but unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set but unusable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base_url = match get("FREEKICK_API_BASE_URL") {
            Some(raw) => normalize_base_url(&raw)?,
            None => DEFAULT_API_BASE_URL.to_string(),
        };

        let timeout_secs = match get("FREEKICK_API_TIMEOUT_SECS") {
            Some(raw) => parse_positive("FREEKICK_API_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let page_limit = match get("FREEKICK_PAGE_LIMIT") {
            Some(raw) => u32::try_from(parse_positive("FREEKICK_PAGE_LIMIT", &raw)?).map_err(
                |_| ConfigError::Invalid {
                    key: "FREEKICK_PAGE_LIMIT",
                    value: raw.clone(),
                },
            )?,
            None => DEFAULT_PAGE_LIMIT,
        };

        let token_file = get("FREEKICK_TOKEN_FILE")
            .map_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE), PathBuf::from);

        Ok(Self {
            api_base_url,
            timeout_secs,
            token_file,
            page_limit,
        })
    }

    /// Transport timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let invalid = || ConfigError::Invalid {
        key: "FREEKICK_API_BASE_URL",
        value: raw.to_string(),
    };

    let url = reqwest::Url::parse(trimmed).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }

    Ok(trimmed.to_string())
}

fn parse_positive(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AdminConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AdminConfig::default());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn base_url_override_drops_trailing_slash() {
        let config =
            AdminConfig::from_lookup(lookup(&[("FREEKICK_API_BASE_URL", "http://localhost:8000/")]))
                .unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8000");
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let config = AdminConfig::from_lookup(lookup(&[
            ("FREEKICK_API_BASE_URL", ""),
            ("FREEKICK_PAGE_LIMIT", "  "),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.page_limit, DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = AdminConfig::from_lookup(lookup(&[("FREEKICK_API_BASE_URL", "ftp://example.com")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "FREEKICK_API_BASE_URL", .. }));
    }

    #[test]
    fn rejects_zero_and_garbage_numbers() {
        assert!(AdminConfig::from_lookup(lookup(&[("FREEKICK_API_TIMEOUT_SECS", "0")])).is_err());
        assert!(AdminConfig::from_lookup(lookup(&[("FREEKICK_PAGE_LIMIT", "ten")])).is_err());
    }

    #[test]
    fn reads_all_overrides() {
        let config = AdminConfig::from_lookup(lookup(&[
            ("FREEKICK_API_TIMEOUT_SECS", "5"),
            ("FREEKICK_TOKEN_FILE", "/tmp/session.json"),
            ("FREEKICK_PAGE_LIMIT", "25"),
        ]))
        .unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.token_file, PathBuf::from("/tmp/session.json"));
        assert_eq!(config.page_limit, 25);
    }
}
