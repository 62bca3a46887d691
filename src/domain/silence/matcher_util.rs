use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::alert::dto::alerts_response::{
    AlertState, ApiAlert, ApiAlertGroup, ApiSilenceMatcher, ClusterMap,
};
use crate::domain::silence::dto::silence_payload::{format_timestamp, SilencePayload};
use crate::domain::silence::silence_form_entity::{ClusterOption, SilenceMatcher};

pub fn new_empty_matcher() -> SilenceMatcher {
    SilenceMatcher {
        id: Uuid::new_v4().to_string(),
        name: String::new(),
        values: Vec::new(),
        is_regex: false,
        is_equal: true,
    }
}

/// Filter operator for a matcher: `=`, `!=`, `=~` or `!~`.
pub fn matcher_to_operator(is_regex: bool, is_equal: bool) -> &'static str {
    match (is_regex, is_equal) {
        (true, true) => "=~",
        (true, false) => "!~",
        (false, true) => "=",
        (false, false) => "!=",
    }
}

/// One option per cluster. Multi-member clusters are labelled `Cluster: <id>`,
/// single-member ones by the member name.
pub fn alertmanager_clusters_to_option(clusters: &ClusterMap) -> Vec<ClusterOption> {
    clusters
        .iter()
        .map(|(cluster, members)| ClusterOption {
            label: match members.as_slice() {
                [only] => only.clone(),
                [] => cluster.clone(),
                _ => format!("Cluster: {cluster}"),
            },
            value: members.clone(),
        })
        .collect()
}

/// Build matchers that select the alerts of `group`.
///
/// Group labels become single value matchers. Labels present on every alert
/// get one matcher each, a regex when alerts disagree on the value.
pub fn matchers_from_group(
    group: &ApiAlertGroup,
    strip_labels: &[String],
    alerts: Option<&[ApiAlert]>,
    only_active: bool,
) -> Vec<SilenceMatcher> {
    let mut matchers = Vec::new();

    let mut group_labels: BTreeMap<&String, &String> = group.labels.iter().collect();
    group_labels.extend(group.shared.labels.iter());
    for (key, value) in &group_labels {
        if !strip_labels.contains(*key) {
            matchers.push(SilenceMatcher {
                name: (*key).clone(),
                values: vec![(*value).clone()],
                ..new_empty_matcher()
            });
        }
    }

    let filtered: Vec<&ApiAlert> = alerts
        .unwrap_or(group.alerts.as_slice())
        .iter()
        .filter(|a| !only_active || a.state == AlertState::Active)
        .collect();

    let mut key_sets = filtered
        .iter()
        .map(|a| a.labels.keys().collect::<BTreeSet<_>>())
        .filter(|keys| !keys.is_empty());
    let shared_keys = match key_sets.next() {
        Some(first) => key_sets.fold(first, |acc, keys| acc.intersection(&keys).copied().collect()),
        None => BTreeSet::new(),
    };

    let mut values: BTreeMap<&String, BTreeSet<&String>> = BTreeMap::new();
    for alert in &filtered {
        for (key, value) in &alert.labels {
            if shared_keys.contains(key)
                && !strip_labels.contains(key)
                && !group_labels.contains_key(key)
            {
                values.entry(key).or_default().insert(value);
            }
        }
    }
    for (key, vals) in values {
        matchers.push(SilenceMatcher {
            name: key.clone(),
            is_regex: vals.len() > 1,
            values: vals.into_iter().cloned().collect(),
            ..new_empty_matcher()
        });
    }

    matchers
}

/// `(a|b|c)` or `a|b|c` made of word characters.
fn word_alternation(value: &str) -> Option<Vec<&str>> {
    let inner = value
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
        .unwrap_or(value);
    let parts: Vec<&str> = inner.split('|').collect();
    let is_word = |p: &&str| !p.is_empty() && p.chars().all(|c| c.is_alphanumeric() || c == '_');
    (parts.len() > 1 && parts.iter().all(is_word)).then_some(parts)
}

/// Split a regex matcher built by the form back into its values.
pub fn unpack_regex_matcher_values(is_regex: bool, value: &str) -> Vec<String> {
    if is_regex {
        if let Some(parts) = word_alternation(value) {
            return parts.into_iter().map(String::from).collect();
        }
    }
    vec![value.to_string()]
}

pub fn generate_silence_payload(
    starts_at: &DateTime<Utc>,
    ends_at: &DateTime<Utc>,
    matchers: &[SilenceMatcher],
    author: &str,
    comment: &str,
    silence_id: Option<&str>,
) -> SilencePayload {
    SilencePayload {
        id: silence_id.map(String::from),
        matchers: matchers
            .iter()
            .map(|m| ApiSilenceMatcher {
                name: m.name.clone(),
                value: match m.values.as_slice() {
                    [] => String::new(),
                    [one] => one.clone(),
                    many => format!("({})", many.join("|")),
                },
                is_regex: m.is_regex,
                is_equal: m.is_equal,
            })
            .collect(),
        starts_at: format_timestamp(starts_at),
        ends_at: format_timestamp(ends_at),
        created_by: author.to_string(),
        comment: comment.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(state: AlertState, labels: &[(&str, &str)]) -> ApiAlert {
        ApiAlert {
            state,
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    fn group() -> ApiAlertGroup {
        let mut g = ApiAlertGroup::default();
        g.labels.insert("alertname".into(), "Fake Alert".into());
        g.shared.labels.insert("cluster".into(), "prod".into());
        g.alerts = vec![
            alert(AlertState::Active, &[("instance", "a"), ("job", "node")]),
            alert(AlertState::Suppressed, &[("instance", "b"), ("job", "node")]),
            alert(AlertState::Active, &[("instance", "c")]),
        ];
        g
    }

    #[test]
    fn group_matchers_cover_shared_and_varying_labels() {
        let matchers = matchers_from_group(&group(), &[], None, false);
        let summary: Vec<(&str, Vec<&str>, bool)> = matchers
            .iter()
            .map(|m| (m.name.as_str(), m.values.iter().map(String::as_str).collect(), m.is_regex))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("alertname", vec!["Fake Alert"], false),
                ("cluster", vec!["prod"], false),
                ("instance", vec!["a", "b", "c"], true),
            ]
        );
    }

    #[test]
    fn strip_labels_and_active_only() {
        let strip = vec!["cluster".to_string()];
        let matchers = matchers_from_group(&group(), &strip, None, true);
        let names: Vec<&str> = matchers.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["alertname", "instance"]);
        assert_eq!(matchers[1].values, vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn regex_values_are_unpacked() {
        assert_eq!(unpack_regex_matcher_values(true, "(a|b|c)"), vec!["a", "b", "c"]);
        assert_eq!(unpack_regex_matcher_values(true, "a|b"), vec!["a", "b"]);
        assert_eq!(unpack_regex_matcher_values(true, "a.+"), vec!["a.+"]);
        assert_eq!(unpack_regex_matcher_values(false, "a|b"), vec!["a|b"]);
    }

    #[test]
    fn multi_value_matchers_join_into_a_group() {
        let ts = DateTime::<Utc>::default();
        let m = SilenceMatcher {
            name: "instance".into(),
            values: vec!["a".into(), "b".into()],
            is_regex: true,
            ..new_empty_matcher()
        };
        let payload = generate_silence_payload(&ts, &ts, &[m], "me", "c", Some("abc"));
        assert_eq!(payload.matchers[0].value, "(a|b)");
        assert_eq!(payload.id.as_deref(), Some("abc"));
    }

    #[test]
    fn cluster_options_are_labelled_by_size() {
        let mut clusters = ClusterMap::new();
        clusters.insert("ha".into(), vec!["am1".into(), "am2".into()]);
        clusters.insert("solo".into(), vec!["am3".into()]);
        let opts = alertmanager_clusters_to_option(&clusters);
        assert_eq!(opts[0].label, "Cluster: ha");
        assert_eq!(opts[1].label, "am3");
        assert_eq!(opts[1].value, vec!["am3".to_string()]);
        assert_eq!(matcher_to_operator(true, false), "!~");
    }
}
