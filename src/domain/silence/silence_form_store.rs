use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::watch;

use crate::core::state::reactive::observable::Observable;
use crate::domain::silence::silence_form_entity::{
    ClusterRequest, FormStage, FormTab, FormToggle, SilenceFormData,
};

/// Global silence form state, so other parts of the app can prefill it
/// (e.g. silencing an alert group from its card).
#[derive(Default)]
pub struct SilenceFormStore {
    toggle: Observable<FormToggle>,
    tab: Observable<FormTab>,
    data: Observable<SilenceFormData>,
}

impl SilenceFormStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_state(&self) -> FormToggle {
        *self.toggle.get()
    }

    pub fn toggle(&self) {
        self.toggle.update(|t| t.visible = !t.visible);
    }

    pub fn show(&self) {
        self.toggle.update(|t| t.visible = true);
    }

    pub fn hide(&self) {
        self.toggle.update(|t| t.visible = false);
    }

    pub fn set_blur(&self, blurred: bool) {
        self.toggle.update(|t| t.blurred = blurred);
    }

    pub fn tab(&self) -> FormTab {
        *self.tab.get()
    }

    pub fn set_tab(&self, tab: FormTab) {
        self.tab.set(tab);
    }

    pub fn data(&self) -> Arc<SilenceFormData> {
        self.data.get()
    }

    pub fn subscribe_data(&self) -> watch::Receiver<Arc<SilenceFormData>> {
        self.data.subscribe()
    }

    /// Run any form operation as one change.
    pub fn update<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut SilenceFormData) -> R,
    {
        self.data.update(f)
    }

    pub fn set_stage(&self, stage: FormStage) {
        self.data.update(|d| d.current_stage = stage);
    }

    pub fn set_requests_by_cluster(&self, requests: BTreeMap<String, ClusterRequest>) {
        self.data.update(|d| d.requests_by_cluster = requests);
    }

    /// Patch one cluster's request record. Unknown clusters are ignored.
    pub fn set_requests_by_cluster_update<F>(&self, cluster: &str, f: F)
    where
        F: FnOnce(&mut ClusterRequest),
    {
        self.data.update_if(|d| match d.requests_by_cluster.get_mut(cluster) {
            Some(request) => {
                f(request);
                true
            }
            None => false,
        });
    }

    /// Form submit: prepare one request per cluster and move to preview when
    /// the form is valid. Returns whether it was.
    pub fn submit_form(&self) -> bool {
        self.data.update(|d| {
            d.requests_by_cluster = d.new_requests_by_cluster();
            let valid = d.is_valid();
            if valid {
                d.current_stage = FormStage::Preview;
            }
            d.was_validated = true;
            valid
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::silence::silence_form_entity::ClusterOption;

    #[test]
    fn invalid_form_stays_on_form_stage() {
        let store = SilenceFormStore::new();
        assert!(!store.submit_form());
        assert_eq!(store.data().current_stage, FormStage::Form);
        assert!(store.data().was_validated);
    }

    #[test]
    fn request_updates_only_touch_known_clusters() {
        let store = SilenceFormStore::new();
        store.update(|d| {
            d.alertmanagers = vec![ClusterOption {
                label: "Cluster: ha".into(),
                value: vec!["am1".into(), "am2".into()],
            }]
        });
        store.submit_form();

        store.set_requests_by_cluster_update("Cluster: ha", |r| {
            r.is_done = true;
            r.silence_id = Some("1".into());
        });
        store.set_requests_by_cluster_update("missing", |r| r.is_done = true);

        let data = store.data();
        assert_eq!(data.requests_by_cluster.len(), 1);
        assert!(data.requests_by_cluster["Cluster: ha"].is_done);
    }

    #[test]
    fn toggle_flips_visibility() {
        let store = SilenceFormStore::new();
        store.toggle();
        assert!(store.toggle_state().visible);
        store.hide();
        assert!(!store.toggle_state().visible);
        store.set_tab(FormTab::Browser);
        assert_eq!(store.tab(), FormTab::Browser);
    }
}
