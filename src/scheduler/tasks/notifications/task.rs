use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::app_state::AppState;
use crate::domain::notification::notification_manager;

/// Keep cluster health notifications in step with the latest upstreams.
pub async fn run(state: AppState, shutdown: CancellationToken) -> Result<()> {
    let mut data = state.alerts.subscribe_data();
    info!("Notification task started");

    loop {
        let upstreams = data.borrow_and_update().upstreams.clone();
        notification_manager::reconcile(&state.notifications, &upstreams);
        debug!(
            errors = state.notifications.error_count(),
            warnings = state.notifications.warning_count(),
            "Cluster notifications reconciled"
        );

        tokio::select! {
            _ = shutdown.cancelled() => break,
            res = data.changed() => {
                if res.is_err() {
                    break;
                }
            }
        }
    }

    info!("Notification task stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use tokio::time::sleep;

    use crate::app_state::tests::test_state;
    use crate::core::client::fetch_retry::tests::{ok_json, ScriptedTransport};
    use crate::domain::alert::alert_store::FetchParams;

    fn degraded() -> String {
        json!({
            "filters": [],
            "version": "0.100",
            "upstreams": {
                "instances": [
                    {"name": "am1", "cluster": "c", "uri": "http://am1", "error": ""},
                    {"name": "am2", "cluster": "c", "uri": "http://am2", "error": "timeout"}
                ],
                "clusters": {"c": ["am1", "am2"]}
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn degraded_cluster_raises_warning() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::always(ok_json(&degraded())));
        let state = test_state(dir.path(), transport);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(run(state.clone(), shutdown.clone()));

        state
            .alerts
            .fetch(&FetchParams::default(), &CancellationToken::new())
            .await;

        for _ in 0..200 {
            if state.notifications.warning_count() == 1 {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(state.notifications.warning_count(), 1);
        assert_eq!(state.notifications.error_count(), 0);

        shutdown.cancel();
        handle.await.unwrap().unwrap();
    }
}
