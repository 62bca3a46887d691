use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Url;
use tracing::error;

use crate::domain::alert::alert_store_state::AlertInfo;

pub const ATTR_DEFAULT_FILTERS: &str = "defaultFiltersBase64";
pub const ATTR_SENTRY_DSN: &str = "sentryDsn";
pub const ATTR_VERSION: &str = "version";

/// Settings embedded in the page at build or deploy time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapSettings {
    pub default_filters: Vec<String>,
    pub sentry_dsn: Option<String>,
    pub version: String,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            default_filters: Vec::new(),
            sentry_dsn: None,
            version: AlertInfo::UNKNOWN_VERSION.to_string(),
        }
    }
}

/// Empty values and unsubstituted `{{ ... }}` templates count as absent.
fn attribute<'a>(attrs: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    attrs
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty() && !(v.starts_with("{{") && v.ends_with("}}")))
}

fn decode_filters(encoded: &str) -> Option<Vec<String>> {
    let bytes = STANDARD.decode(encoded).ok()?;
    serde_json::from_slice::<Vec<String>>(&bytes).ok()
}

impl BootstrapSettings {
    pub fn from_attributes(attrs: &HashMap<String, String>) -> Self {
        let default_filters = match attribute(attrs, ATTR_DEFAULT_FILTERS) {
            Some(encoded) => decode_filters(encoded).unwrap_or_else(|| {
                error!(value = %encoded, "Failed to decode default filters");
                Vec::new()
            }),
            None => Vec::new(),
        };

        let sentry_dsn = attribute(attrs, ATTR_SENTRY_DSN).and_then(|dsn| match Url::parse(dsn) {
            Ok(_) => Some(dsn.to_string()),
            Err(err) => {
                error!(dsn = %dsn, error = %err, "Invalid error reporting DSN");
                None
            }
        });

        Self {
            default_filters,
            sentry_dsn,
            version: attribute(attrs, ATTR_VERSION)
                .unwrap_or(AlertInfo::UNKNOWN_VERSION)
                .to_string(),
        }
    }
}
