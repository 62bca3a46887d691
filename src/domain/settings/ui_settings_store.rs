use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tracing::warn;

use crate::core::persistence::local::settings::ui_settings_api_repository_trait::UiSettingsApiRepository;
use crate::core::persistence::local::settings::ui_settings_entity::{
    FetchConfigEntity, GridConfigEntity, MultiGridConfigEntity, SilenceFormConfigEntity,
};
use crate::core::state::reactive::observable::Observable;

fn or_default<T: Default>(section: &str, read: Result<T>) -> T {
    read.unwrap_or_else(|e| {
        warn!(section, error = ?e, "Failed to read UI settings, using defaults");
        T::default()
    })
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

/// Everything the user can tweak in the settings modal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiSettings {
    pub fetch: FetchConfigEntity,
    pub grid: GridConfigEntity,
    pub multi_grid: MultiGridConfigEntity,
    pub silence_form: SilenceFormConfigEntity,
}

/// Persisted UI settings with change notification. Writes go to storage
/// first; the in-memory copy only changes once the write succeeded.
pub struct UiSettingsStore<R: UiSettingsApiRepository> {
    repo: Arc<R>,
    state: Observable<UiSettings>,
    default_interval: u64,
}

impl<R: UiSettingsApiRepository> UiSettingsStore<R> {
    /// Load every section, falling back to defaults for unreadable ones.
    pub fn load(repo: Arc<R>, default_interval: u64) -> Self {
        let settings = UiSettings {
            fetch: or_default("fetchConfig", repo.read_fetch_config()),
            grid: or_default("gridConfig", repo.read_grid_config()),
            multi_grid: or_default("multiGridConfig", repo.read_multi_grid_config()),
            silence_form: or_default("silenceFormConfig", repo.read_silence_form_config()),
        };
        Self {
            repo,
            state: Observable::new(settings),
            default_interval,
        }
    }

    pub fn snapshot(&self) -> Arc<UiSettings> {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<UiSettings>> {
        self.state.subscribe()
    }

    /// Poll interval: the saved one when set, else the configured default.
    pub fn fetch_interval(&self) -> Duration {
        let secs = self
            .state
            .get()
            .fetch
            .interval
            .filter(|s| *s > 0)
            .unwrap_or(self.default_interval);
        Duration::from_secs(secs)
    }

    pub fn save_fetch_config(&self, cfg: FetchConfigEntity) -> Result<()> {
        self.repo.update_fetch_config(&cfg)?;
        self.state.update_if(|s| replace_if_changed(&mut s.fetch, cfg));
        Ok(())
    }

    pub fn save_grid_config(&self, cfg: GridConfigEntity) -> Result<()> {
        self.repo.update_grid_config(&cfg)?;
        self.state.update_if(|s| replace_if_changed(&mut s.grid, cfg));
        Ok(())
    }

    pub fn save_multi_grid_config(&self, cfg: MultiGridConfigEntity) -> Result<()> {
        self.repo.update_multi_grid_config(&cfg)?;
        self.state
            .update_if(|s| replace_if_changed(&mut s.multi_grid, cfg));
        Ok(())
    }

    pub fn save_author(&self, author: &str) -> Result<()> {
        let cfg = SilenceFormConfigEntity {
            author: author.to_string(),
        };
        self.repo.update_silence_form_config(&cfg)?;
        self.state
            .update_if(|s| replace_if_changed(&mut s.silence_form, cfg));
        Ok(())
    }
}
