use std::sync::Arc;

use tokio::sync::watch;

use crate::core::state::reactive::observable::Observable;
use crate::domain::notification::notification_entity::{
    NewNotification, Notification, NotificationSource, NotificationState,
};

/// Shared notification list. One instance lives in the application state
/// and is handed to whoever needs it.
#[derive(Default)]
pub struct NotificationStore {
    state: Observable<NotificationState>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<NotificationState> {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<NotificationState>> {
        self.state.subscribe()
    }

    pub fn add_notification(&self, new: NewNotification) {
        self.state.update(|s| s.add_notification(new));
    }

    pub fn dismiss_notification(&self, id: &str, auto: bool) {
        self.state.update_if(|s| s.dismiss_notification(id, auto));
    }

    pub fn dismiss_all_by_source(&self, source: NotificationSource, source_id: Option<&str>, auto: bool) {
        self.state
            .update_if(|s| s.dismiss_all_by_source(source, source_id, auto) > 0);
    }

    pub fn clear_dismissed(&self) {
        self.state.update(NotificationState::clear_dismissed);
    }

    /// Apply several mutations as one update, subscribers see only the result
    /// and are not woken when nothing changed.
    pub fn batch<F>(&self, f: F)
    where
        F: FnOnce(&mut NotificationState),
    {
        self.state.update_if(|s| {
            let before = s.clone();
            f(s);
            *s != before
        });
    }

    pub fn active_notifications(&self) -> Vec<Notification> {
        self.state.get().active_notifications()
    }

    pub fn dismissed_notifications(&self) -> Vec<Notification> {
        self.state.get().dismissed_notifications()
    }

    pub fn warning_count(&self) -> usize {
        self.state.get().warning_count()
    }

    pub fn error_count(&self) -> usize {
        self.state.get().error_count()
    }

    pub fn total_active_count(&self) -> usize {
        self.state.get().total_active_count()
    }
}
