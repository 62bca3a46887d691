use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::app_state::AppState;
use crate::core::persistence::local::settings::ui_settings_entity::{
    GridConfigEntity, MultiGridConfigEntity,
};
use crate::domain::alert::alert_store_state::AlertStatus;
use crate::domain::filter::filter_entity::Filter;
use crate::domain::settings::ui_settings_store::UiSettings;

use super::sort_settings::fetch_params;

/// Quiet period after an input change before a new fetch starts.
pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// Everything a fetch depends on. A change supersedes the running cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FetchKey {
    filters: Vec<String>,
    grid: GridConfigEntity,
    multi_grid: MultiGridConfigEntity,
}

struct FetchTrigger {
    filters: watch::Receiver<Arc<Vec<Filter>>>,
    settings: watch::Receiver<Arc<UiSettings>>,
    key: FetchKey,
}

impl FetchTrigger {
    fn new(state: &AppState) -> Self {
        let mut trigger = Self {
            filters: state.alerts.subscribe_filters(),
            settings: state.ui_settings.subscribe(),
            key: FetchKey {
                filters: Vec::new(),
                grid: GridConfigEntity::default(),
                multi_grid: MultiGridConfigEntity::default(),
            },
        };
        trigger.sync();
        trigger
    }

    fn read_key(&mut self) -> FetchKey {
        let filters = self
            .filters
            .borrow_and_update()
            .iter()
            .map(|f| f.raw.clone())
            .collect();
        let settings = self.settings.borrow_and_update().clone();
        FetchKey {
            filters,
            grid: settings.grid.clone(),
            multi_grid: settings.multi_grid.clone(),
        }
    }

    /// Mark the current inputs as the ones being fetched.
    fn sync(&mut self) {
        self.key = self.read_key();
    }

    /// Resolves once the inputs differ from the last synced ones, `false`
    /// when the stores are gone. Filter updates that only touch applied
    /// state or hits are ignored. Cancel safe.
    async fn changed(&mut self) -> bool {
        loop {
            tokio::select! {
                res = self.filters.changed() => {
                    if res.is_err() {
                        return false;
                    }
                }
                res = self.settings.changed() => {
                    if res.is_err() {
                        return false;
                    }
                }
            }
            let key = self.read_key();
            if key != self.key {
                self.key = key;
                return true;
            }
        }
    }

    /// Absorb further changes until inputs stay quiet for `window`.
    async fn settle(&mut self, window: Duration) {
        loop {
            tokio::select! {
                _ = sleep(window) => return,
                alive = self.changed() => {
                    if !alive {
                        return;
                    }
                }
            }
        }
    }
}

async fn wait_until_resumed(status: &mut watch::Receiver<Arc<AlertStatus>>) -> bool {
    loop {
        if !status.borrow_and_update().paused {
            return true;
        }
        if status.changed().await.is_err() {
            return false;
        }
    }
}

/// Self-rescheduling poll loop: fetch, wait for it to settle, sleep the
/// configured interval, repeat. Cycles never overlap. An input change drops
/// the running cycle and fetches again after `DEBOUNCE`.
pub async fn run(state: AppState, shutdown: CancellationToken) -> Result<()> {
    let mut trigger = FetchTrigger::new(&state);
    let mut status = state.alerts.subscribe_status();
    info!("Alert poll task started");

    loop {
        if state.alerts.status().paused {
            debug!("Polling paused");
            tokio::select! {
                _ = shutdown.cancelled() => break,
                alive = wait_until_resumed(&mut status) => {
                    if !alive {
                        break;
                    }
                }
            }
            continue;
        }

        trigger.sync();
        let settings = state.ui_settings.snapshot();
        let params = fetch_params(&settings.grid, &settings.multi_grid);
        let cycle = shutdown.child_token();

        tokio::select! {
            _ = shutdown.cancelled() => break,
            alive = trigger.changed() => {
                cycle.cancel();
                if !alive {
                    break;
                }
                debug!("Fetch inputs changed, superseding running cycle");
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = trigger.settle(DEBOUNCE) => continue,
                }
            }
            outcome = state.alerts.fetch(&params, &cycle) => {
                debug!(?outcome, "Fetch cycle settled");
            }
        }

        let interval = state.ui_settings.fetch_interval();
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = sleep(interval) => {}
            alive = trigger.changed() => {
                if !alive {
                    break;
                }
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = trigger.settle(DEBOUNCE) => {}
                }
            }
        }
    }

    info!("Alert poll task stopped");
    Ok(())
}
