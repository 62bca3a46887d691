use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app_state::AppState;
use crate::domain::filter::service::filter_history_service;

/// Record every filter change after startup into the history file, unless
/// the backend disabled history.
pub async fn run(state: AppState, shutdown: CancellationToken) -> Result<()> {
    let mut filters = state.alerts.subscribe_filters();
    filters.borrow_and_update();
    info!("Filter history task started");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            res = filters.changed() => {
                if res.is_err() {
                    break;
                }
            }
        }

        let current = filters.borrow_and_update().clone();
        if !state.alerts.settings().history_enabled {
            continue;
        }
        match filter_history_service::record_history(state.filter_history.as_ref(), &current) {
            Ok(true) => debug!(filters = current.len(), "Filter set recorded"),
            Ok(false) => {}
            Err(e) => warn!(error = ?e, "Failed to record filter history"),
        }
    }

    info!("Filter history task stopped");
    Ok(())
}
