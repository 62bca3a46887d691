use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};

use crate::core::client::http_transport::CorsCredentials;

// The backend marshals empty slices and maps as `null`, hence `DefaultOnNull`
// on every collection.

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertsResponse {
    pub status: String,
    pub error: String,
    pub timestamp: String,
    pub version: String,
    pub upstreams: UpstreamsResponse,
    #[serde_as(as = "DefaultOnNull")]
    pub silences: BTreeMap<String, BTreeMap<String, ApiSilence>>,
    #[serde_as(as = "DefaultOnNull")]
    pub grids: Vec<ApiGrid>,
    pub total_alerts: u64,
    #[serde_as(as = "DefaultOnNull")]
    pub colors: LabelColors,
    #[serde_as(as = "DefaultOnNull")]
    pub filters: Vec<ApiFilter>,
    #[serde_as(as = "DefaultOnNull")]
    pub counters: Vec<LabelCounter>,
    pub settings: ApiSettings,
    pub authentication: Authentication,
    #[serde_as(as = "DefaultOnNull")]
    pub receivers: Vec<String>,
}

pub type LabelColors = BTreeMap<String, BTreeMap<String, LabelColor>>;
pub type ClusterMap = BTreeMap<String, Vec<String>>;

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamsResponse {
    pub counters: UpstreamCounters,
    #[serde_as(as = "DefaultOnNull")]
    pub instances: Vec<AlertmanagerUpstream>,
    #[serde_as(as = "DefaultOnNull")]
    pub clusters: ClusterMap,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamCounters {
    pub total: u64,
    pub healthy: u64,
    pub failed: u64,
}

impl UpstreamCounters {
    pub fn from_instances(instances: &[AlertmanagerUpstream]) -> Self {
        let total = instances.len() as u64;
        let failed = instances.iter().filter(|am| am.is_failing()).count() as u64;
        Self {
            total,
            healthy: total - failed,
            failed,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertmanagerUpstream {
    pub name: String,
    pub cluster: String,
    pub uri: String,
    #[serde(rename = "publicURI")]
    pub public_uri: String,
    pub readonly: bool,
    #[serde_as(as = "DefaultOnNull")]
    pub headers: BTreeMap<String, String>,
    pub cors_credentials: CorsCredentials,
    pub error: String,
    pub version: String,
    #[serde_as(as = "DefaultOnNull")]
    pub cluster_members: Vec<String>,
}

impl AlertmanagerUpstream {
    pub fn is_failing(&self) -> bool {
        !self.error.is_empty()
    }
}

/// A filter as echoed back by the backend; `text` is the request's raw value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiFilter {
    pub text: String,
    pub name: String,
    pub matcher: String,
    pub value: String,
    pub hits: u64,
    pub is_valid: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Authentication {
    pub enabled: bool,
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelColor {
    pub brightness: i64,
    pub background: String,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelCounter {
    pub name: String,
    #[serde_as(as = "DefaultOnNull")]
    pub values: Vec<LabelCounterValue>,
    pub hits: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelCounterValue {
    pub value: String,
    pub raw: String,
    pub hits: u64,
    pub percent: f64,
    pub offset: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSilenceMatcher {
    pub name: String,
    pub value: String,
    pub is_regex: bool,
    pub is_equal: bool,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSilence {
    pub id: String,
    #[serde_as(as = "DefaultOnNull")]
    pub matchers: Vec<ApiSilenceMatcher>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub comment: String,
    #[serde(rename = "ticketID")]
    pub ticket_id: String,
    #[serde(rename = "ticketURL")]
    pub ticket_url: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertState {
    #[default]
    Unprocessed,
    Active,
    Suppressed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateCount {
    pub active: u64,
    pub suppressed: u64,
    pub unprocessed: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiAnnotation {
    pub name: String,
    pub value: String,
    pub visible: bool,
    pub is_link: bool,
    pub is_action: bool,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiAlertmanagerState {
    pub fingerprint: String,
    pub name: String,
    pub cluster: String,
    pub state: AlertState,
    pub starts_at: String,
    pub source: String,
    #[serde_as(as = "DefaultOnNull")]
    pub silenced_by: Vec<String>,
    #[serde_as(as = "DefaultOnNull")]
    pub inhibited_by: Vec<String>,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiAlert {
    pub id: String,
    #[serde_as(as = "DefaultOnNull")]
    pub annotations: Vec<ApiAnnotation>,
    #[serde_as(as = "DefaultOnNull")]
    pub labels: BTreeMap<String, String>,
    pub starts_at: String,
    pub state: AlertState,
    #[serde_as(as = "DefaultOnNull")]
    pub alertmanager: Vec<ApiAlertmanagerState>,
    pub receiver: String,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedGroupData {
    #[serde_as(as = "DefaultOnNull")]
    pub annotations: Vec<ApiAnnotation>,
    #[serde_as(as = "DefaultOnNull")]
    pub labels: BTreeMap<String, String>,
    #[serde_as(as = "DefaultOnNull")]
    pub silences: BTreeMap<String, Vec<String>>,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiAlertGroup {
    pub id: String,
    pub receiver: String,
    #[serde_as(as = "DefaultOnNull")]
    pub labels: BTreeMap<String, String>,
    #[serde_as(as = "DefaultOnNull")]
    pub alerts: Vec<ApiAlert>,
    #[serde_as(as = "DefaultOnNull")]
    pub alertmanager_count: BTreeMap<String, u64>,
    pub state_count: StateCount,
    pub shared: SharedGroupData,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiGrid {
    pub label_name: String,
    pub label_value: String,
    #[serde_as(as = "DefaultOnNull")]
    pub alert_groups: Vec<ApiAlertGroup>,
    pub state_count: StateCount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSorting {
    pub order: String,
    pub reverse: bool,
    pub label: String,
}

impl Default for GridSorting {
    fn default() -> Self {
        Self {
            order: "startsAt".into(),
            reverse: false,
            label: "alertname".into(),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SortingSettings {
    pub grid: GridSorting,
    #[serde_as(as = "DefaultOnNull")]
    pub value_mapping: BTreeMap<String, BTreeMap<String, i64>>,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripSettings {
    #[serde_as(as = "DefaultOnNull")]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilenceFormSettings {
    pub strip: StripSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertAcknowledgement {
    pub enabled: bool,
    pub duration_seconds: u64,
    pub author: String,
    pub comment: String,
}

impl Default for AlertAcknowledgement {
    fn default() -> Self {
        Self {
            enabled: false,
            duration_seconds: 900,
            author: "alertdeck / author missing".into(),
            comment: "ACK! This alert was acknowledged using alertdeck".into(),
        }
    }
}

/// UI settings exported by the backend.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSettings {
    #[serde_as(as = "DefaultOnNull")]
    pub static_color_labels: Vec<String>,
    pub annotations_default_hidden: bool,
    #[serde_as(as = "DefaultOnNull")]
    pub annotations_hidden: Vec<String>,
    #[serde_as(as = "DefaultOnNull")]
    pub annotations_visible: Vec<String>,
    #[serde(rename = "annotationsEnableHTML")]
    pub annotations_enable_html: bool,
    pub sorting: SortingSettings,
    pub silence_form: SilenceFormSettings,
    pub alert_acknowledgement: AlertAcknowledgement,
    pub history_enabled: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            static_color_labels: Vec::new(),
            annotations_default_hidden: false,
            annotations_hidden: Vec::new(),
            annotations_visible: Vec::new(),
            annotations_enable_html: false,
            sorting: SortingSettings::default(),
            silence_form: SilenceFormSettings::default(),
            alert_acknowledgement: AlertAcknowledgement::default(),
            history_enabled: true,
        }
    }
}
