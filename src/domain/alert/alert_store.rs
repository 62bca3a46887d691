use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::client::backend_uri::BackendUri;
use crate::core::client::fetch_retry::{FetchEvent, FetchRetry};
use crate::core::client::http_transport::HttpRequest;
use crate::core::state::reactive::memo::Memo;
use crate::core::state::reactive::observable::Observable;
use crate::domain::alert::alert_store_state::{AlertData, AlertInfo, AlertStatus};
use crate::domain::alert::dto::alerts_response::{
    AlertmanagerUpstream, AlertsResponse, ApiSettings, ClusterMap, LabelColor, UpstreamCounters,
};
use crate::domain::alert::upstream_queries as queries;
use crate::domain::filter::filter_codec::{decode, format_api_filter_query, update_location_search};
use crate::domain::filter::filter_entity::{raw_set, Filter};
use crate::domain::filter::location::Location;
use crate::errors::AppError;

/// Grid and sort arguments of one alerts request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchParams {
    pub grid_label: String,
    pub grid_sort_reverse: bool,
    pub sort_order: String,
    pub sort_label: String,
    pub sort_reverse: String,
}

/// Restores the pre-fetch status and clears `is_retrying` on drop unless
/// the cycle settled.
struct InFlight<'a> {
    store: &'a AlertStore,
    before: AlertStatus,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.store.clear_is_retrying();
            self.store.restore_status(&self.before);
        }
    }
}

/// How a fetch cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Response accepted and applied.
    Applied,
    /// Response echoed another filter set, nothing changed.
    Rejected,
    /// Failure path taken, status carries the error.
    Failed(String),
    /// Opaque response, most likely an auth proxy redirect.
    ReloadNeeded,
    /// Superseded before it settled.
    Cancelled,
}

/// Filters, response data, info, settings and status of the dashboard.
///
/// Each section is its own reactive cell so the view layer and background
/// tasks can subscribe to just what they render or react to.
pub struct AlertStore {
    filters: Observable<Vec<Filter>>,
    data: Observable<AlertData>,
    info: Observable<AlertInfo>,
    settings: Observable<ApiSettings>,
    status: Observable<AlertStatus>,

    engine: Arc<FetchRetry>,
    backend: BackendUri,
    location: Arc<dyn Location>,

    read_write_memo: Memo<Vec<AlertmanagerUpstream>>,
    read_only_memo: Memo<Vec<AlertmanagerUpstream>>,
    clusters_memo: Memo<ClusterMap>,
    errors_memo: Memo<Vec<String>>,
    warnings_memo: Memo<Vec<String>>,
}

impl AlertStore {
    pub fn new(engine: Arc<FetchRetry>, backend: BackendUri, location: Arc<dyn Location>) -> Self {
        Self {
            filters: Observable::default(),
            data: Observable::default(),
            info: Observable::default(),
            settings: Observable::default(),
            status: Observable::default(),
            engine,
            backend,
            location,
            read_write_memo: Memo::new(),
            read_only_memo: Memo::new(),
            clusters_memo: Memo::new(),
            errors_memo: Memo::new(),
            warnings_memo: Memo::new(),
        }
    }

    /// Same as `new`, then `set_filters(initial)`.
    pub fn with_filters(
        engine: Arc<FetchRetry>,
        backend: BackendUri,
        location: Arc<dyn Location>,
        initial: &[String],
    ) -> Self {
        let store = Self::new(engine, backend, location);
        store.set_filters(initial);
        store
    }

    pub fn filters(&self) -> Arc<Vec<Filter>> {
        self.filters.get()
    }

    pub fn data(&self) -> Arc<AlertData> {
        self.data.get()
    }

    pub fn info(&self) -> Arc<AlertInfo> {
        self.info.get()
    }

    pub fn settings(&self) -> Arc<ApiSettings> {
        self.settings.get()
    }

    pub fn status(&self) -> Arc<AlertStatus> {
        self.status.get()
    }

    pub fn subscribe_filters(&self) -> watch::Receiver<Arc<Vec<Filter>>> {
        self.filters.subscribe()
    }

    pub fn subscribe_data(&self) -> watch::Receiver<Arc<AlertData>> {
        self.data.subscribe()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<Arc<AlertStatus>> {
        self.status.subscribe()
    }

    pub fn subscribe_info(&self) -> watch::Receiver<Arc<AlertInfo>> {
        self.info.subscribe()
    }

    fn raws(filters: &[Filter]) -> Vec<String> {
        filters.iter().map(|f| f.raw.clone()).collect()
    }

    fn push_location(&self, filters: &[Filter]) {
        update_location_search(self.location.as_ref(), &Self::raws(filters));
    }

    // ---- filters ----

    pub fn add_filter(&self, raw: &str) {
        let added = self.filters.update_if(|values| {
            if values.iter().any(|f| f.raw == raw) {
                return false;
            }
            values.push(Filter::new_unapplied(raw));
            true
        });
        if added {
            self.push_location(&self.filters.get());
        }
    }

    pub fn remove_filter(&self, raw: &str) {
        let removed = self.filters.update_if(|values| {
            let before = values.len();
            values.retain(|f| f.raw != raw);
            values.len() != before
        });
        if removed {
            self.push_location(&self.filters.get());
        }
    }

    /// Swap `old` for an unapplied `new` in place. When `new` is already
    /// present `old` is simply dropped.
    pub fn replace_filter(&self, old: &str, new: &str) {
        let current = self.filters.get();
        let Some(index) = current.iter().position(|f| f.raw == old) else {
            return;
        };
        if current.iter().any(|f| f.raw == new) {
            self.remove_filter(old);
            return;
        }
        self.filters.update(|values| {
            if let Some(slot) = values.get_mut(index) {
                *slot = Filter::new_unapplied(new);
            }
        });
        self.push_location(&self.filters.get());
    }

    pub fn set_filters(&self, raws: &[String]) {
        let values: Vec<Filter> = raws.iter().map(Filter::new_unapplied).collect();
        self.push_location(&values);
        self.filters.set(values);
    }

    pub fn set_filter_values(&self, values: Vec<Filter>) {
        self.filters.set(values);
    }

    /// Adopt `raws` without touching the location. Filters already known keep
    /// their parsed state.
    pub fn set_without_location(&self, raws: &[String]) {
        self.filters.update(|values| {
            let next: Vec<Filter> = raws
                .iter()
                .map(|raw| {
                    values
                        .iter()
                        .find(|f| f.raw == *raw)
                        .cloned()
                        .unwrap_or_else(|| Filter::new_unapplied(raw))
                })
                .collect();
            *values = next;
        });
    }

    pub fn apply_all_filters(&self) {
        self.filters.update_if(|values| {
            let mut changed = false;
            for f in values.iter_mut().filter(|f| !f.applied) {
                f.applied = true;
                changed = true;
            }
            changed
        });
    }

    /// History navigation: re-read filters from the location.
    pub fn on_popstate(&self, search: &str) {
        let decoded = decode(search);
        self.set_without_location(&decoded.params.q);
    }

    // ---- status ----

    pub fn set_idle(&self) {
        self.status.update(AlertStatus::set_idle);
    }

    pub fn set_fetching(&self) {
        self.status.update(AlertStatus::set_fetching);
    }

    pub fn set_processing(&self) {
        self.status.update(AlertStatus::set_processing);
    }

    pub fn set_failure(&self, err: &str) {
        self.status.update(|s| s.set_failure(err));
    }

    pub fn pause(&self) {
        self.status.update(AlertStatus::pause);
    }

    pub fn resume(&self) {
        self.status.update(AlertStatus::resume);
    }

    pub fn toggle_pause(&self) {
        self.status.update(AlertStatus::toggle_pause);
    }

    pub fn stop(&self) {
        self.status.update(AlertStatus::stop);
    }

    pub fn set_error(&self, err: Option<String>) {
        self.status.update(|s| s.set_error(err));
    }

    pub fn set_reload_needed(&self, v: bool) {
        self.info.update(|i| i.reload_needed = v);
    }

    pub fn set_upgrade_needed(&self, v: bool) {
        self.info.update(|i| i.upgrade_needed = v);
    }

    // ---- fetch ----

    pub fn alerts_uri(&self, params: &FetchParams) -> String {
        let args = [
            format!("gridLabel={}", urlencoding::encode(&params.grid_label)),
            format!(
                "gridSortReverse={}",
                if params.grid_sort_reverse { "1" } else { "0" }
            ),
            format!("sortOrder={}", urlencoding::encode(&params.sort_order)),
            format!("sortLabel={}", urlencoding::encode(&params.sort_label)),
            format!("sortReverse={}", urlencoding::encode(&params.sort_reverse)),
        ];
        let filters = Self::raws(&self.filters.get());
        format!(
            "{}{}",
            self.backend
                .format(&format!("alerts.json?&{}&", args.join("&"))),
            format_api_filter_query(&self.location.search(), &filters)
        )
    }

    /// One fetch cycle: request, retry, reconcile. Never returns an error,
    /// failures end up in `status`. A cycle that is cancelled or dropped
    /// before it settles puts the status back to its pre-fetch value.
    pub async fn fetch(&self, params: &FetchParams, cancel: &CancellationToken) -> FetchOutcome {
        let mut flight = InFlight {
            store: self,
            before: (*self.status.get()).clone(),
            settled: false,
        };
        self.set_fetching();

        let uri = self.alerts_uri(params);
        debug!(%uri, "Fetching alerts");

        let info = &self.info;
        let guard = cancel.clone();
        let result = self
            .engine
            .fetch(HttpRequest::get(uri), cancel, move |event| {
                if let FetchEvent::Retry(_) = event {
                    if !guard.is_cancelled() {
                        info.update_if(|i| !std::mem::replace(&mut i.is_retrying, true));
                    }
                }
            })
            .await;

        if cancel.is_cancelled() {
            debug!("Fetch superseded, dropping result");
            return FetchOutcome::Cancelled;
        }

        let resp = match result {
            Ok(resp) => resp,
            Err(AppError::Cancelled) => return FetchOutcome::Cancelled,
            Err(err) => {
                flight.settled = true;
                self.clear_is_retrying();
                let msg = format!("Can't connect to the API, last error was \"{}\"", err.message());
                self.handle_fetch_error(&msg);
                return FetchOutcome::Failed(msg);
            }
        };

        if resp.opaque {
            warn!("Opaque response received, backend is likely behind an auth proxy");
            self.info.update(|i| i.reload_needed = true);
            return FetchOutcome::ReloadNeeded;
        }

        self.clear_is_retrying();
        self.set_processing();

        let body: AlertsResponse = match serde_json::from_str(&resp.body) {
            Ok(b) => b,
            Err(e) => {
                flight.settled = true;
                let err = AppError::BodyParsing(e.to_string());
                let msg = format!("Can't connect to the API, last error was \"{}\"", err.message());
                self.handle_fetch_error(&msg);
                return FetchOutcome::Failed(msg);
            }
        };

        let outcome = self.parse_api_response(body);
        // Rejected responses leave the status as it was before the fetch.
        flight.settled = outcome != FetchOutcome::Rejected;
        outcome
    }

    fn clear_is_retrying(&self) {
        self.info.update_if(|i| std::mem::replace(&mut i.is_retrying, false));
    }

    fn restore_status(&self, before: &AlertStatus) {
        self.status.update(|s| {
            s.value = before.value;
            s.error = before.error.clone();
        });
    }

    /// Reconcile a decoded response with the store.
    pub fn parse_api_response(&self, result: AlertsResponse) -> FetchOutcome {
        if !result.error.is_empty() {
            self.handle_fetch_error(&result.error);
            return FetchOutcome::Failed(result.error);
        }

        let current = self.filters.get();
        let query_filters = raw_set(current.iter().map(|f| f.raw.as_str()));
        let response_filters = raw_set(result.filters.iter().map(|f| f.text.as_str()));
        if query_filters != response_filters {
            info!(
                "Got response with filters '{}' while expecting results for '{}', ignoring",
                response_filters.join(","),
                query_filters.join(",")
            );
            return FetchOutcome::Rejected;
        }

        // Settings first, filter subscribers read them on wake-up.
        self.settings.set(result.settings);
        self.filters.update(|values| {
            for filter in &result.filters {
                if let Some(stored) = values.iter_mut().find(|f| f.raw == filter.text) {
                    stored.applied = true;
                    stored.is_valid = filter.is_valid;
                    stored.hits = filter.hits;
                    stored.name = filter.name.clone();
                    stored.matcher = filter.matcher.clone();
                    stored.value = filter.value.clone();
                }
            }
        });

        let mut upstreams = result.upstreams;
        upstreams.counters = UpstreamCounters::from_instances(&upstreams.instances);
        self.data.set(AlertData {
            colors: result.colors,
            counters: result.counters,
            grids: result.grids,
            silences: result.silences,
            upstreams,
            receivers: result.receivers,
        });

        let previous_version = self.info.get().version.clone();
        if previous_version != AlertInfo::UNKNOWN_VERSION && previous_version != result.version {
            info!(
                from = %previous_version,
                to = %result.version,
                "Backend version changed, stopping updates"
            );
            self.info.update(|i| i.upgrade_ready = true);
            self.stop();
        }

        self.info.update(|i| {
            i.total_alerts = result.total_alerts;
            i.version = result.version.clone();
            i.authentication = result.authentication.clone();
        });
        self.set_idle();

        FetchOutcome::Applied
    }

    /// Failure path: keep stale data, zero the counter, settle every filter.
    pub fn handle_fetch_error(&self, err: &str) {
        warn!(error = %err, "Alerts fetch failed");
        self.set_failure(err);
        self.info.update(|i| i.total_alerts = 0);
        self.apply_all_filters();
    }

    // ---- derived ----

    pub fn read_only_alertmanagers(&self) -> Arc<Vec<AlertmanagerUpstream>> {
        let data = self.data.get();
        self.read_only_memo
            .get_or_compute(self.data.version(), || queries::read_only_alertmanagers(&data.upstreams))
    }

    pub fn read_write_alertmanagers(&self) -> Arc<Vec<AlertmanagerUpstream>> {
        let data = self.data.get();
        self.read_write_memo
            .get_or_compute(self.data.version(), || queries::read_write_alertmanagers(&data.upstreams))
    }

    pub fn clusters_without_read_only(&self) -> Arc<ClusterMap> {
        let data = self.data.get();
        self.clusters_memo
            .get_or_compute(self.data.version(), || queries::clusters_without_read_only(&data.upstreams))
    }

    pub fn get_cluster_alertmanagers_without_read_only(&self, cluster: &str) -> Vec<String> {
        self.clusters_without_read_only()
            .get(cluster)
            .cloned()
            .unwrap_or_default()
    }

    pub fn get_alertmanager_by_name(&self, name: &str) -> Option<AlertmanagerUpstream> {
        queries::get_alertmanager_by_name(&self.data.get().upstreams, name).cloned()
    }

    pub fn is_read_only_alertmanager(&self, name: &str) -> bool {
        self.read_only_alertmanagers().iter().any(|am| am.name == name)
    }

    pub fn upstreams_with_errors(&self) -> Vec<AlertmanagerUpstream> {
        queries::upstreams_with_errors(&self.data.get().upstreams)
    }

    pub fn clusters_with_errors(&self) -> Arc<Vec<String>> {
        let data = self.data.get();
        self.errors_memo
            .get_or_compute(self.data.version(), || queries::clusters_with_errors(&data.upstreams))
    }

    pub fn clusters_with_warnings(&self) -> Arc<Vec<String>> {
        let data = self.data.get();
        self.warnings_memo
            .get_or_compute(self.data.version(), || queries::clusters_with_warnings(&data.upstreams))
    }

    pub fn upstreams_with_critical_errors(&self) -> Vec<AlertmanagerUpstream> {
        queries::upstreams_with_critical_errors(&self.data.get().upstreams)
    }

    pub fn upstreams_with_warnings(&self) -> Vec<AlertmanagerUpstream> {
        queries::upstreams_with_warnings(&self.data.get().upstreams)
    }

    pub fn grid_padding(&self) -> u32 {
        queries::grid_padding(&self.data.get().grids)
    }

    pub fn get_color_data(&self, name: &str, value: &str) -> Option<LabelColor> {
        queries::get_color_data(&self.data.get().colors, name, value).cloned()
    }

    pub fn get_min_version(&self, names: &[String]) -> String {
        queries::get_min_version(&self.data.get().upstreams, names)
    }
}
