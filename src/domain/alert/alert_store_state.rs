use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::alert::dto::alerts_response::{
    ApiGrid, ApiSilence, Authentication, LabelColors, LabelCounter, UpstreamsResponse,
};
use std::collections::BTreeMap;

/// Everything rendered from the last accepted response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlertData {
    pub colors: LabelColors,
    pub counters: Vec<LabelCounter>,
    pub grids: Vec<ApiGrid>,
    pub silences: BTreeMap<String, BTreeMap<String, ApiSilence>>,
    pub upstreams: UpstreamsResponse,
    pub receivers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertInfo {
    pub authentication: Authentication,
    pub total_alerts: u64,
    /// Backend version, `unknown` until the first accepted response.
    pub version: String,
    pub upgrade_ready: bool,
    pub upgrade_needed: bool,
    pub is_retrying: bool,
    pub reload_needed: bool,
}

impl AlertInfo {
    pub const UNKNOWN_VERSION: &'static str = "unknown";
}

impl Default for AlertInfo {
    fn default() -> Self {
        Self {
            authentication: Authentication::default(),
            total_alerts: 0,
            version: Self::UNKNOWN_VERSION.into(),
            upgrade_ready: false,
            upgrade_needed: false,
            is_retrying: false,
            reload_needed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum StatusValue {
    #[default]
    Idle,
    Fetching,
    Processing,
    Failure,
}

/// Fetch cycle status. `paused` is a gate on scheduled fetches and never
/// changes `value`; `stopped` makes the pause permanent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertStatus {
    pub value: StatusValue,
    pub last_update_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub stopped: bool,
    pub paused: bool,
}

impl AlertStatus {
    pub fn set_idle(&mut self) {
        self.value = StatusValue::Idle;
        self.error = None;
        self.last_update_at = Some(Utc::now());
    }

    pub fn set_fetching(&mut self) {
        self.value = StatusValue::Fetching;
    }

    pub fn set_processing(&mut self) {
        self.value = StatusValue::Processing;
        self.error = None;
    }

    pub fn set_failure(&mut self, err: impl Into<String>) {
        self.value = StatusValue::Failure;
        self.error = Some(err.into());
        self.last_update_at = Some(Utc::now());
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = self.stopped;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = self.stopped || !self.paused;
    }

    pub fn stop(&mut self) {
        self.paused = true;
        self.stopped = true;
    }

    pub fn set_error(&mut self, err: Option<String>) {
        self.error = err;
    }
}
