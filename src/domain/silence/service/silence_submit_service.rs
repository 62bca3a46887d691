use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::core::client::fetch_any::{FetchAny, UpstreamRequest};
use crate::core::client::http_transport::{HttpRequest, HttpTransport, ResponseBody};
use crate::domain::alert::dto::alerts_response::UpstreamsResponse;
use crate::domain::alert::upstream_queries::{get_alertmanager_by_name, is_read_only_alertmanager};
use crate::domain::silence::dto::silence_payload::{PostSilenceResponse, SilencePayload};
use crate::domain::silence::silence_form_store::SilenceFormStore;

/// POST targets for `members`, in member order, plus the public URI of each.
///
/// Read-only and unknown members are skipped with an error log.
pub fn members_to_try(
    upstreams: &UpstreamsResponse,
    members: &[String],
    body: &str,
) -> (Vec<UpstreamRequest>, BTreeMap<String, String>) {
    let mut requests = Vec::new();
    let mut public_uris = BTreeMap::new();

    for member in members {
        if is_read_only_alertmanager(upstreams, member) {
            error!("Alertmanager instance \"{}\" is read-only", member);
            continue;
        }
        let Some(am) = get_alertmanager_by_name(upstreams, member) else {
            error!("Alertmanager instance \"{}\" not found", member);
            continue;
        };
        let uri = format!("{}/api/v2/silences", am.uri);
        let request = HttpRequest::post_json(uri.clone(), body.to_string())
            .with_headers(&am.headers)
            .with_credentials(am.cors_credentials);
        public_uris.insert(uri.clone(), am.public_uri.clone());
        requests.push(UpstreamRequest { uri, request });
    }

    (requests, public_uris)
}

fn silence_id_from(body: &ResponseBody) -> Option<String> {
    match body {
        ResponseBody::Json(value) => serde_json::from_value::<PostSilenceResponse>(value.clone())
            .ok()
            .map(|r| r.silence_id)
            .filter(|id| !id.is_empty()),
        ResponseBody::Text(_) => None,
    }
}

/// Submit `payload` to one cluster, failing over across its members in order,
/// and record the terminal state in the form store.
pub async fn submit_cluster(
    transport: Arc<dyn HttpTransport>,
    form: &SilenceFormStore,
    upstreams: &UpstreamsResponse,
    cluster: &str,
    members: &[String],
    payload: &SilencePayload,
    cancel: &CancellationToken,
) {
    let body = match serde_json::to_string(payload) {
        Ok(b) => b,
        Err(err) => {
            form.set_requests_by_cluster_update(cluster, |r| {
                r.is_done = true;
                r.error = Some(err.to_string());
            });
            return;
        }
    };

    let (requests, public_uris) = members_to_try(upstreams, members, &body);
    if requests.is_empty() {
        form.set_requests_by_cluster_update(cluster, |r| {
            r.is_done = true;
            r.error = Some(format!(
                "No writable Alertmanager instance available in cluster \"{cluster}\""
            ));
        });
        return;
    }

    let fetch = FetchAny::new(transport);
    let state = fetch.run(&requests, cancel).await;
    if cancel.is_cancelled() {
        return;
    }

    match (&state.response, &state.error) {
        (Some(response), _) => {
            let uri = state.response_uri.clone().unwrap_or_default();
            match silence_id_from(response) {
                Some(id) => {
                    let link = format!(
                        "{}/#/silences/{}",
                        public_uris.get(&uri).map(String::as_str).unwrap_or_default(),
                        id
                    );
                    info!(cluster = %cluster, silence_id = %id, "Silence created");
                    form.set_requests_by_cluster_update(cluster, |r| {
                        r.is_done = true;
                        r.error = None;
                        r.silence_id = Some(id);
                        r.silence_link = Some(link);
                    });
                }
                None => form.set_requests_by_cluster_update(cluster, |r| {
                    r.is_done = true;
                    r.error = Some(format!("Invalid response from {uri}: missing silenceID"));
                }),
            }
        }
        (None, error) => {
            let error = error.clone().unwrap_or_else(|| "unknown error".to_string());
            form.set_requests_by_cluster_update(cluster, |r| {
                r.is_done = true;
                r.error = Some(error);
            });
        }
    }
}

/// Submit the form's payload to every cluster it has a request record for.
/// Clusters run concurrently, each one independent of the others.
pub async fn submit_all(
    transport: Arc<dyn HttpTransport>,
    form: &SilenceFormStore,
    upstreams: &UpstreamsResponse,
    cancel: &CancellationToken,
) {
    let data = form.data();
    let payload = data.to_alertmanager_payload();

    let jobs = data.requests_by_cluster.values().map(|request| {
        submit_cluster(
            transport.clone(),
            form,
            upstreams,
            &request.cluster,
            &request.members,
            &payload,
            cancel,
        )
    });
    join_all(jobs).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::client::fetch_retry::tests::{ok_json, ScriptedTransport};
    use crate::domain::alert::upstream_queries::tests::am;
    use crate::domain::silence::silence_form_entity::{ClusterOption, SilenceMatcher};
    use crate::domain::silence::matcher_util::new_empty_matcher;
    use crate::errors::AppError;
    use http::Method;

    fn upstreams() -> UpstreamsResponse {
        let mut u = UpstreamsResponse::default();
        u.instances = vec![
            am("am1", "ha", false, "", "0.24.0"),
            am("am2", "ha", false, "", "0.24.0"),
            am("ro", "ro", true, "", "0.24.0"),
        ];
        u.instances[0]
            .headers
            .insert("X-Auth-Test".into(), "some-value".into());
        u.clusters.insert("ha".into(), vec!["am1".into(), "am2".into()]);
        u.clusters.insert("ro".into(), vec!["ro".into()]);
        u
    }

    fn form(options: Vec<ClusterOption>) -> SilenceFormStore {
        let store = SilenceFormStore::new();
        store.update(|d| {
            d.alertmanagers = options;
            d.matchers = vec![SilenceMatcher {
                name: "alertname".into(),
                values: vec!["Foo".into()],
                ..new_empty_matcher()
            }];
            d.author = "me@example.com".into();
            d.comment = "fake silence".into();
        });
        assert!(store.submit_form());
        store
    }

    fn option(label: &str, members: &[&str]) -> ClusterOption {
        ClusterOption {
            label: label.into(),
            value: members.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn fails_over_to_next_member_in_order() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(Err(AppError::Transport("Fetch error".into())));
        transport.push(ok_json(r#"{"silenceID":"123456789"}"#));
        let store = form(vec![option("Cluster: ha", &["am2", "am1"])]);

        submit_all(transport.clone(), &store, &upstreams(), &CancellationToken::new()).await;

        let requests = transport.requests.lock().unwrap().clone();
        let uris: Vec<&str> = requests.iter().map(|r| r.uri.as_str()).collect();
        assert_eq!(
            uris,
            vec![
                "http://am2.example.com/api/v2/silences",
                "http://am1.example.com/api/v2/silences"
            ]
        );
        assert!(requests.iter().all(|r| r.method == Method::POST));
        assert_eq!(
            requests[1].headers.get("X-Auth-Test").map(String::as_str),
            Some("some-value")
        );

        let data = store.data();
        let result = &data.requests_by_cluster["Cluster: ha"];
        assert!(result.is_done);
        assert_eq!(result.error, None);
        assert_eq!(result.silence_id.as_deref(), Some("123456789"));
        assert_eq!(
            result.silence_link.as_deref(),
            Some("http://am1.example.com/#/silences/123456789")
        );
    }

    #[tokio::test]
    async fn last_error_is_kept_when_every_member_fails() {
        let transport = Arc::new(ScriptedTransport::always(Err(AppError::Transport(
            "connection refused".into(),
        ))));
        let store = form(vec![option("Cluster: ha", &["am1", "am2"])]);

        submit_all(transport.clone(), &store, &upstreams(), &CancellationToken::new()).await;

        assert_eq!(transport.calls(), 2);
        let data = store.data();
        let result = &data.requests_by_cluster["Cluster: ha"];
        assert!(result.is_done);
        assert_eq!(result.error.as_deref(), Some("connection refused"));
        assert!(result.silence_id.is_none());
    }

    #[tokio::test]
    async fn read_only_and_unknown_members_are_skipped() {
        let transport = Arc::new(ScriptedTransport::always(ok_json(r#"{"silenceID":"1"}"#)));
        let store = form(vec![option("ro", &["ro"]), option("Cluster: x", &["ro", "ghost", "am1"])]);

        submit_all(transport.clone(), &store, &upstreams(), &CancellationToken::new()).await;

        assert_eq!(transport.calls(), 1);
        let data = store.data();
        assert_eq!(
            data.requests_by_cluster["ro"].error.as_deref(),
            Some("No writable Alertmanager instance available in cluster \"ro\"")
        );
        assert_eq!(data.requests_by_cluster["Cluster: x"].silence_id.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn cancelled_submission_leaves_requests_pending() {
        let transport = Arc::new(ScriptedTransport::always(ok_json(r#"{"silenceID":"1"}"#)));
        let store = form(vec![option("Cluster: ha", &["am1", "am2"])]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        submit_all(transport, &store, &upstreams(), &cancel).await;

        assert!(!store.data().requests_by_cluster["Cluster: ha"].is_done);
    }
}
