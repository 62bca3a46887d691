use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;
use validator::Validate;

pub const ENV_BACKEND_URI: &str = "ALERTDECK_BACKEND_URI";
pub const ENV_DATA_DIR: &str = "ALERTDECK_DATA_DIR";
pub const ENV_REFRESH_SECONDS: &str = "ALERTDECK_REFRESH_SECONDS";
pub const ENV_LOG_DIR: &str = "ALERTDECK_LOG_DIR";
pub const ENV_LOCATION: &str = "ALERTDECK_LOCATION";
pub const ENV_DEFAULT_FILTERS_BASE64: &str = "ALERTDECK_DEFAULT_FILTERS_BASE64";
pub const ENV_SENTRY_DSN: &str = "ALERTDECK_SENTRY_DSN";
pub const ENV_VERSION: &str = "ALERTDECK_VERSION";

pub const DEFAULT_BACKEND_URI: &str = "http://localhost:8080";

/// Process level configuration read from the environment (and `.env`).
#[derive(Debug, Clone, Validate)]
pub struct AppConfig {
    /// Absolute base URI prefixed to every backend path.
    #[validate(url)]
    pub backend_uri: String,
    /// Directory holding the persisted UI state files.
    pub data_dir: PathBuf,
    /// Default poll interval, used until the user persists another one.
    #[validate(range(min = 1, max = 86400))]
    pub refresh_seconds: u64,
    /// Optional directory for a daily rolling log file.
    pub log_dir: Option<PathBuf>,
    /// Initial location search string (`?q=...`).
    pub location: String,
    /// Raw `data-*` style bootstrap attributes.
    pub bootstrap_attributes: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_uri: DEFAULT_BACKEND_URI.into(),
            data_dir: PathBuf::from("./data"),
            refresh_seconds: 30,
            log_dir: None,
            location: String::new(),
            bootstrap_attributes: HashMap::new(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup so tests don't touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let refresh_seconds = match non_empty(ENV_REFRESH_SECONDS) {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{ENV_REFRESH_SECONDS} must be a number, got {v:?}"))?,
            None => defaults.refresh_seconds,
        };

        let mut bootstrap_attributes = HashMap::new();
        for (key, attr) in [
            (ENV_DEFAULT_FILTERS_BASE64, "defaultFiltersBase64"),
            (ENV_SENTRY_DSN, "sentryDsn"),
            (ENV_VERSION, "version"),
        ] {
            if let Some(v) = lookup(key) {
                bootstrap_attributes.insert(attr.to_string(), v);
            }
        }

        let cfg = Self {
            backend_uri: non_empty(ENV_BACKEND_URI)
                .map(|v| v.trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.backend_uri),
            data_dir: non_empty(ENV_DATA_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            refresh_seconds,
            log_dir: non_empty(ENV_LOG_DIR).map(PathBuf::from),
            location: lookup(ENV_LOCATION).unwrap_or_default(),
            bootstrap_attributes,
        };

        cfg.validate().context("Invalid configuration")?;
        debug!(backend_uri = %cfg.backend_uri, data_dir = ?cfg.data_dir, "Configuration loaded");
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::client::backend_uri::BackendUri;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_env_is_empty() {
        let cfg = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg.backend_uri, DEFAULT_BACKEND_URI);
        assert_eq!(cfg.refresh_seconds, 30);
        assert!(cfg.log_dir.is_none());
        assert!(cfg.bootstrap_attributes.is_empty());
    }

    #[test]
    fn reads_overrides_and_bootstrap_attributes() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            (ENV_BACKEND_URI, "http://localhost:1234/"),
            (ENV_REFRESH_SECONDS, "15"),
            (ENV_VERSION, "v1.2.3"),
        ]))
        .unwrap();
        assert_eq!(cfg.backend_uri, "http://localhost:1234");
        assert_eq!(cfg.refresh_seconds, 15);
        assert_eq!(cfg.bootstrap_attributes.get("version").map(String::as_str), Some("v1.2.3"));
    }

    #[test]
    fn default_backend_is_fetchable() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        let uri = BackendUri::new(cfg.backend_uri).format("alerts.json?&q=");
        assert!(reqwest::Url::parse(&uri).is_ok(), "{uri}");
    }

    #[test]
    fn rejects_relative_backend() {
        let err = AppConfig::from_lookup(lookup_from(&[(ENV_BACKEND_URI, ".")]));
        assert!(err.is_err());
    }

    #[test]
    fn rejects_zero_refresh() {
        let err = AppConfig::from_lookup(lookup_from(&[(ENV_REFRESH_SECONDS, "0")]));
        assert!(err.is_err());
    }

    #[test]
    fn rejects_non_numeric_refresh() {
        let err = AppConfig::from_lookup(lookup_from(&[(ENV_REFRESH_SECONDS, "soon")]));
        assert!(err.is_err());
    }
}
