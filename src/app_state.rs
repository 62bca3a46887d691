use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::client::backend_uri::BackendUri;
use crate::core::client::fetch_retry::{FetchRetry, RetryPolicy};
use crate::core::client::http_transport::HttpTransport;
use crate::core::client::reqwest_transport::ReqwestTransport;
use crate::core::config::app_config::AppConfig;
use crate::core::persistence::local::filters::filter_history_repository::{
    FilterHistoryRepository, SavedFiltersRepository,
};
use crate::core::persistence::local::filters::saved_filters_entity::SavedFiltersEntity;
use crate::core::persistence::local::settings::ui_settings_repository::UiSettingsRepository;
use crate::domain::alert::alert_store::AlertStore;
use crate::domain::bootstrap::crash_guard::CrashGuard;
use crate::domain::bootstrap::settings_element::BootstrapSettings;
use crate::domain::filter::filter_codec::decode;
use crate::domain::filter::location::{Location, MemoryLocation};
use crate::domain::filter::service::filter_history_service;
use crate::domain::notification::notification_store::NotificationStore;
use crate::domain::settings::ui_settings_store::UiSettingsStore;
use crate::domain::silence::service::silence_delete_service::{self, ClusterSilence, DeleteOutcome};
use crate::domain::silence::service::silence_submit_service;
use crate::domain::silence::silence_form_store::SilenceFormStore;

/// Composition root. Every store is created once here and shared by `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub bootstrap: Arc<BootstrapSettings>,
    pub transport: Arc<dyn HttpTransport>,
    pub location: Arc<dyn Location>,
    pub alerts: Arc<AlertStore>,
    pub notifications: Arc<NotificationStore>,
    pub silence_form: Arc<SilenceFormStore>,
    pub ui_settings: Arc<UiSettingsStore<UiSettingsRepository>>,
    pub filter_history: Arc<FilterHistoryRepository>,
    pub saved_filters: Arc<SavedFiltersRepository>,
    pub crash_guard: Arc<CrashGuard>,
}

/// `?q=a` or `q=a` as a path-absolute href.
fn initial_href(search: &str) -> String {
    let search = search.trim().trim_start_matches('?');
    if search.is_empty() {
        "/".to_string()
    } else {
        format!("/?{search}")
    }
}

pub fn build_app_state(config: AppConfig) -> AppState {
    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::default());
    let location: Arc<dyn Location> = Arc::new(MemoryLocation::new(initial_href(&config.location)));
    build_app_state_with(config, transport, location, RetryPolicy::default())
}

pub fn build_app_state_with(
    config: AppConfig,
    transport: Arc<dyn HttpTransport>,
    location: Arc<dyn Location>,
    policy: RetryPolicy,
) -> AppState {
    let bootstrap = BootstrapSettings::from_attributes(&config.bootstrap_attributes);
    info!(version = %bootstrap.version, "Starting dashboard state");

    let filter_history = Arc::new(FilterHistoryRepository::new(&config.data_dir));
    let saved_filters = Arc::new(SavedFiltersRepository::new(&config.data_dir));
    let ui_settings = Arc::new(UiSettingsStore::load(
        Arc::new(UiSettingsRepository::new(&config.data_dir)),
        config.refresh_seconds,
    ));

    let saved = filter_history_service::read_saved_filters(saved_filters.as_ref()).unwrap_or_else(|e| {
        warn!(error = ?e, "Failed to read saved filters");
        SavedFiltersEntity::default()
    });
    let initial = filter_history_service::initial_filters(
        &decode(&location.search()),
        &saved,
        &bootstrap.default_filters,
    );

    let engine = Arc::new(FetchRetry::new(transport.clone(), policy));
    let alerts = Arc::new(AlertStore::with_filters(
        engine,
        BackendUri::new(config.backend_uri.clone()),
        location.clone(),
        &initial,
    ));

    let silence_form = Arc::new(SilenceFormStore::new());
    let author = ui_settings.snapshot().silence_form.author.clone();
    silence_form.update(|d| d.author = author);

    AppState {
        crash_guard: Arc::new(CrashGuard::new(bootstrap.sentry_dsn.clone())),
        bootstrap: Arc::new(bootstrap),
        config: Arc::new(config),
        transport,
        location,
        alerts,
        notifications: Arc::new(NotificationStore::new()),
        silence_form,
        ui_settings,
        filter_history,
        saved_filters,
    }
}

impl AppState {
    /// Submit the silence form to every selected cluster, remembering the
    /// author for next time.
    pub async fn submit_silence(&self, cancel: &CancellationToken) -> Result<()> {
        let author = self.silence_form.data().author.clone();
        self.ui_settings.save_author(&author)?;
        let upstreams = self.alerts.data().upstreams.clone();
        silence_submit_service::submit_all(self.transport.clone(), &self.silence_form, &upstreams, cancel).await;
        Ok(())
    }

    pub async fn delete_silences(&self, silences: &[ClusterSilence]) -> DeleteOutcome {
        let upstreams = self.alerts.data().upstreams.clone();
        silence_delete_service::delete_silences(self.transport.clone(), &upstreams, silences).await
    }

    /// Save the current filters as the user's default set.
    pub fn save_filters(&self) -> Result<SavedFiltersEntity> {
        filter_history_service::save_filters(self.saved_filters.as_ref(), &self.alerts.filters())
    }

    pub fn clear_saved_filters(&self) -> Result<()> {
        filter_history_service::clear_saved_filters(self.saved_filters.as_ref())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use crate::core::client::fetch_retry::tests::ScriptedTransport;

    fn config(dir: &std::path::Path, location: &str) -> AppConfig {
        let mut cfg = AppConfig {
            data_dir: dir.to_path_buf(),
            location: location.into(),
            ..Default::default()
        };
        cfg.bootstrap_attributes.insert(
            "defaultFiltersBase64".into(),
            STANDARD.encode(r#"["@state=active"]"#),
        );
        cfg
    }

    fn build(cfg: AppConfig) -> AppState {
        let location: Arc<dyn Location> = Arc::new(MemoryLocation::new(initial_href(&cfg.location)));
        build_app_state_with(cfg, Arc::new(ScriptedTransport::default()), location, RetryPolicy::immediate(0))
    }

    pub(crate) fn test_state(dir: &std::path::Path, transport: Arc<ScriptedTransport>) -> AppState {
        let cfg = AppConfig {
            data_dir: dir.to_path_buf(),
            ..Default::default()
        };
        let location: Arc<dyn Location> = Arc::new(MemoryLocation::new("/"));
        build_app_state_with(cfg, transport, location, RetryPolicy::immediate(0))
    }

    fn raws(state: &AppState) -> Vec<String> {
        state.alerts.filters().iter().map(|f| f.raw.clone()).collect()
    }

    #[test]
    fn location_filters_win() {
        let dir = tempfile::tempdir().unwrap();
        let state = build(config(dir.path(), "?q=foo&q=bar"));
        assert_eq!(raws(&state), vec!["foo", "bar"]);
    }

    #[test]
    fn defaults_then_saved_filters() {
        let dir = tempfile::tempdir().unwrap();
        let state = build(config(dir.path(), ""));
        assert_eq!(raws(&state), vec!["@state=active"]);

        state.alerts.set_filters(&["cluster=prod".to_string()]);
        state.save_filters().unwrap();

        let state = build(config(dir.path(), ""));
        assert_eq!(raws(&state), vec!["cluster=prod"]);
    }

    #[test]
    fn hrefs_are_normalised() {
        assert_eq!(initial_href(""), "/");
        assert_eq!(initial_href("q=a"), "/?q=a");
        assert_eq!(initial_href("?q=a"), "/?q=a");
    }
}
