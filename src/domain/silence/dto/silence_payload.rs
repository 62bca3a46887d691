use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::alert::dto::alerts_response::ApiSilenceMatcher;

/// Body of `POST {uri}/api/v2/silences`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SilencePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub matchers: Vec<ApiSilenceMatcher>,
    pub starts_at: String,
    pub ends_at: String,
    pub created_by: String,
    pub comment: String,
}

/// `2024-01-01T10:00:00.000Z`, the format Alertmanager echoes back.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PostSilenceResponse {
    #[serde(rename = "silenceID", default)]
    pub silence_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn id_is_omitted_for_new_silences() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let payload = SilencePayload {
            id: None,
            matchers: vec![ApiSilenceMatcher {
                name: "alertname".into(),
                value: "Foo".into(),
                is_regex: false,
                is_equal: true,
            }],
            starts_at: format_timestamp(&ts),
            ends_at: format_timestamp(&ts),
            created_by: "me@example.com".into(),
            comment: "maintenance".into(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["startsAt"], "2024-01-01T10:00:00.000Z");
        assert_eq!(json["createdBy"], "me@example.com");
        assert_eq!(json["matchers"][0]["isEqual"], true);
    }
}
