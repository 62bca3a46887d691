use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::core::client::http_transport::{HttpRequest, HttpTransport};
use crate::domain::alert::dto::alerts_response::UpstreamsResponse;
use crate::domain::alert::upstream_queries::read_write_alertmanagers;
use crate::errors::AppError;

/// A silence to expire, identified by its cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSilence {
    pub cluster: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub done: usize,
    pub errors: Vec<String>,
}

/// Expire one silence, trying the writable members of its cluster in order.
pub async fn delete_silence(
    transport: &dyn HttpTransport,
    upstreams: &UpstreamsResponse,
    silence: &ClusterSilence,
) -> Result<(), AppError> {
    let members: Vec<_> = read_write_alertmanagers(upstreams)
        .into_iter()
        .filter(|am| am.cluster == silence.cluster)
        .collect();
    if members.is_empty() {
        return Err(AppError::NotFound(format!(
            "No writable Alertmanager instance available in cluster \"{}\"",
            silence.cluster
        )));
    }

    let mut last_error = AppError::NotFound(silence.cluster.clone());
    for am in members {
        let request = HttpRequest::delete(format!("{}/api/v2/silence/{}", am.uri, silence.id))
            .with_headers(&am.headers)
            .with_credentials(am.cors_credentials);
        match transport.send(request).await {
            Ok(resp) if resp.is_success() => {
                debug!(alertmanager = %am.name, silence_id = %silence.id, "Silence deleted");
                return Ok(());
            }
            Ok(resp) => {
                last_error = AppError::HttpStatus {
                    status: resp.status,
                    body: resp.body,
                }
            }
            Err(err) => last_error = err,
        }
        warn!(alertmanager = %am.name, error = %last_error, "Silence delete failed");
    }
    Err(last_error)
}

/// Expire many silences concurrently, collecting one message per failure.
pub async fn delete_silences(
    transport: Arc<dyn HttpTransport>,
    upstreams: &UpstreamsResponse,
    silences: &[ClusterSilence],
) -> DeleteOutcome {
    let results = join_all(
        silences
            .iter()
            .map(|s| delete_silence(transport.as_ref(), upstreams, s)),
    )
    .await;

    let mut outcome = DeleteOutcome::default();
    for (silence, result) in silences.iter().zip(results) {
        match result {
            Ok(()) => outcome.done += 1,
            Err(err) => outcome.errors.push(format!(
                "{}/{} failed to delete with error: {}",
                silence.cluster,
                silence.id,
                err.message()
            )),
        }
    }
    outcome
}
