use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::alert::dto::alerts_response::{
    ApiAlert, ApiAlertGroup, AlertmanagerUpstream, ApiSilence, ClusterMap,
};
use crate::domain::silence::dto::silence_payload::SilencePayload;
use crate::domain::silence::matcher_util::{
    alertmanager_clusters_to_option, generate_silence_payload, matchers_from_group,
    new_empty_matcher, unpack_regex_matcher_values,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SilenceMatcher {
    pub id: String,
    pub name: String,
    pub values: Vec<String>,
    pub is_regex: bool,
    pub is_equal: bool,
}

/// A selectable alertmanager target: one cluster and its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterOption {
    pub label: String,
    pub value: Vec<String>,
}

/// Progress of one cluster during a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterRequest {
    pub cluster: String,
    pub members: Vec<String>,
    pub is_done: bool,
    pub error: Option<String>,
    pub silence_id: Option<String>,
    pub silence_link: Option<String>,
}

impl ClusterRequest {
    pub fn new(cluster: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            cluster: cluster.into(),
            members,
            is_done: false,
            error: None,
            silence_id: None,
            silence_link: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormStage {
    #[default]
    Form,
    Preview,
    Submit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormTab {
    #[default]
    Editor,
    Browser,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormToggle {
    pub visible: bool,
    pub blurred: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SilenceDuration {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

/// Shareable form snapshot, `btoa(JSON)` compatible.
#[derive(Debug, Serialize, Deserialize)]
struct SharedForm {
    am: Vec<ClusterOption>,
    m: Vec<SharedMatcher>,
    d: i64,
    c: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SharedMatcher {
    n: String,
    r: bool,
    e: bool,
    v: Vec<String>,
}

fn floor_to_minute(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// `None` when the step leaves the representable range.
fn shift_minutes(ts: DateTime<Utc>, minutes: i64) -> Option<DateTime<Utc>> {
    Duration::try_minutes(minutes).and_then(|d| ts.checked_add_signed(d))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SilenceFormData {
    pub current_stage: FormStage,
    pub was_validated: bool,
    pub silence_id: Option<String>,
    pub alertmanagers: Vec<ClusterOption>,
    pub matchers: Vec<SilenceMatcher>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub comment: String,
    pub author: String,
    pub requests_by_cluster: BTreeMap<String, ClusterRequest>,
    pub autofill_matchers: bool,
    pub reset_inputs: bool,
}

impl Default for SilenceFormData {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            current_stage: FormStage::Form,
            was_validated: false,
            silence_id: None,
            alertmanagers: Vec::new(),
            matchers: Vec::new(),
            starts_at: now,
            ends_at: now + Duration::hours(1),
            comment: String::new(),
            author: String::new(),
            requests_by_cluster: BTreeMap::new(),
            autofill_matchers: true,
            reset_inputs: true,
        }
    }
}

impl SilenceFormData {
    pub fn is_valid(&self) -> bool {
        !self.alertmanagers.is_empty()
            && !self.matchers.is_empty()
            && self
                .matchers
                .iter()
                .all(|m| !m.name.is_empty() && !m.values.is_empty() && m.values.iter().all(|v| !v.is_empty()))
            && !self.comment.is_empty()
            && !self.author.is_empty()
    }

    pub fn reset_start_end(&mut self) {
        self.starts_at = Utc::now();
        self.ends_at = self.starts_at + Duration::hours(1);
    }

    pub fn reset_progress(&mut self) {
        self.current_stage = FormStage::Form;
        self.was_validated = false;
    }

    pub fn reset_silence_id(&mut self) {
        self.silence_id = None;
    }

    pub fn add_empty_matcher(&mut self) {
        self.matchers.push(new_empty_matcher());
    }

    /// The last remaining matcher is never deleted.
    pub fn delete_matcher(&mut self, id: &str) {
        if self.matchers.len() > 1 {
            self.matchers.retain(|m| m.id != id);
        }
    }

    /// Prefill from an alert group; clears any edited silence id.
    pub fn fill_matchers_from_group(
        &mut self,
        group: &ApiAlertGroup,
        strip_labels: &[String],
        alertmanagers: Vec<ClusterOption>,
        alerts: Option<&[ApiAlert]>,
    ) {
        self.alertmanagers = alertmanagers;
        self.matchers = matchers_from_group(group, strip_labels, alerts, false);
        self.silence_id = None;
        self.autofill_matchers = false;
        self.reset_inputs = false;
    }

    /// Load an existing silence for editing.
    pub fn fill_form_from_silence(&mut self, alertmanager: &AlertmanagerUpstream, silence: &ApiSilence) {
        self.silence_id = Some(silence.id.clone());

        let mut clusters = ClusterMap::new();
        clusters.insert(alertmanager.cluster.clone(), alertmanager.cluster_members.clone());
        self.alertmanagers = alertmanager_clusters_to_option(&clusters);

        self.matchers = silence
            .matchers
            .iter()
            .map(|m| SilenceMatcher {
                name: m.name.clone(),
                values: unpack_regex_matcher_values(m.is_regex, &m.value),
                is_regex: m.is_regex,
                is_equal: m.is_equal,
                ..new_empty_matcher()
            })
            .collect();

        self.starts_at = silence.starts_at;
        self.ends_at = silence.ends_at;
        self.comment = silence.comment.clone();
        self.author = silence.created_by.clone();
        self.autofill_matchers = false;
    }

    pub fn verify_start_end(&mut self) {
        self.verify_start_end_at(Utc::now());
    }

    /// Start no earlier than the current minute, end at least a minute after start.
    pub fn verify_start_end_at(&mut self, now: DateTime<Utc>) {
        let now = floor_to_minute(now);
        if self.starts_at < now {
            self.starts_at = now;
        }
        if self.ends_at <= self.starts_at {
            if let Some(end) = shift_minutes(self.starts_at, 1) {
                self.ends_at = end;
            }
        }
    }

    pub fn inc_start(&mut self, minutes: i64) {
        if let Some(at) = shift_minutes(self.starts_at, minutes) {
            self.starts_at = at;
            self.verify_start_end();
        }
    }

    pub fn dec_start(&mut self, minutes: i64) {
        if let Some(at) = minutes.checked_neg().and_then(|m| shift_minutes(self.starts_at, m)) {
            self.starts_at = at;
            self.verify_start_end();
        }
    }

    pub fn inc_end(&mut self, minutes: i64) {
        if let Some(at) = shift_minutes(self.ends_at, minutes) {
            self.ends_at = at;
            self.verify_start_end();
        }
    }

    pub fn dec_end(&mut self, minutes: i64) {
        if let Some(at) = minutes.checked_neg().and_then(|m| shift_minutes(self.ends_at, m)) {
            self.ends_at = at;
            self.verify_start_end();
        }
    }

    pub fn to_alertmanager_payload(&self) -> SilencePayload {
        generate_silence_payload(
            &floor_to_minute(self.starts_at),
            &floor_to_minute(self.ends_at),
            &self.matchers,
            &self.author,
            &self.comment,
            self.silence_id.as_deref(),
        )
    }

    pub fn to_duration(&self) -> SilenceDuration {
        let span = self.ends_at - self.starts_at;
        SilenceDuration {
            days: span.num_days(),
            hours: span.num_hours() % 24,
            minutes: span.num_minutes() % 60,
        }
    }

    /// One request record per selected cluster option.
    pub fn new_requests_by_cluster(&self) -> BTreeMap<String, ClusterRequest> {
        self.alertmanagers
            .iter()
            .map(|am| (am.label.clone(), ClusterRequest::new(am.label.clone(), am.value.clone())))
            .collect()
    }

    pub fn to_base64(&self) -> String {
        let shared = SharedForm {
            am: self.alertmanagers.clone(),
            m: self
                .matchers
                .iter()
                .map(|m| SharedMatcher {
                    n: m.name.clone(),
                    r: m.is_regex,
                    e: m.is_equal,
                    v: m.values.clone(),
                })
                .collect(),
            d: (self.ends_at - self.starts_at).num_minutes(),
            c: self.comment.clone(),
        };
        // serializing plain strings, numbers and bools cannot fail
        let json = serde_json::to_string(&shared).unwrap_or_default();
        STANDARD.encode(json)
    }

    /// Restore a shared form. Returns `false` and leaves the form untouched
    /// when the value does not decode or carries no matchers.
    pub fn from_base64(&mut self, encoded: &str) -> bool {
        let parsed: SharedForm = match STANDARD
            .decode(encoded.trim())
            .map_err(|e| e.to_string())
            .and_then(|bytes| serde_json::from_slice(&bytes).map_err(|e| e.to_string()))
        {
            Ok(p) => p,
            Err(err) => {
                error!(error = %err, "Failed to parse shared silence form");
                return false;
            }
        };

        if parsed.m.is_empty() {
            return false;
        }
        let starts_at = Utc::now();
        let Some(ends_at) = shift_minutes(starts_at, parsed.d) else {
            error!(minutes = parsed.d, "Shared silence form has an out of range duration");
            return false;
        };

        self.alertmanagers = parsed.am;
        self.matchers = parsed
            .m
            .into_iter()
            .map(|m| SilenceMatcher {
                name: m.n,
                values: m.v,
                is_regex: m.r,
                is_equal: m.e,
                ..new_empty_matcher()
            })
            .collect();
        self.starts_at = starts_at;
        self.ends_at = ends_at;
        self.comment = parsed.c;
        self.silence_id = None;
        self.autofill_matchers = false;
        self.reset_inputs = false;
        true
    }
}
