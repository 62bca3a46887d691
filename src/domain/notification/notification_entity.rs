use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationSource {
    Alertmanager,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub dismissed: bool,
    pub auto_dismissed: bool,
    pub source: NotificationSource,
    pub source_id: Option<String>,
    pub occurrence_count: u32,
}

impl Notification {
    /// Dedup identity: source plus source id, never `id`.
    pub fn key(&self) -> (NotificationSource, Option<&str>) {
        (self.source, self.source_id.as_deref())
    }
}

/// Content of a notification before the store assigns identity and lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub source: NotificationSource,
    pub source_id: Option<String>,
}

impl NewNotification {
    fn key(&self) -> (NotificationSource, Option<&str>) {
        (self.source, self.source_id.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationState {
    pub notifications: Vec<Notification>,
}

impl NotificationState {
    pub const MAX_RETAINED: usize = 50;
    pub const MAX_DISMISSED_SHOWN: usize = 20;

    /// Upsert by `(source, source_id)`.
    ///
    /// An active match is replaced in place with its count bumped. With no
    /// active match a dismissed one only gets its count and timestamp
    /// refreshed, it stays dismissed. Otherwise a new active entry is added.
    pub fn add_notification(&mut self, new: NewNotification) {
        let now = Utc::now();
        let key = new.key();

        if let Some(existing) = self
            .notifications
            .iter_mut()
            .find(|n| !n.dismissed && n.key() == key)
        {
            *existing = Notification {
                id: existing.id.clone(),
                kind: new.kind,
                title: new.title,
                message: new.message,
                timestamp: now,
                dismissed: false,
                auto_dismissed: false,
                source: new.source,
                source_id: new.source_id,
                occurrence_count: existing.occurrence_count + 1,
            };
        } else if let Some(dismissed) = self
            .notifications
            .iter_mut()
            .find(|n| n.dismissed && n.key() == key)
        {
            dismissed.occurrence_count += 1;
            dismissed.timestamp = now;
        } else {
            self.notifications.push(Notification {
                id: Uuid::new_v4().to_string(),
                kind: new.kind,
                title: new.title,
                message: new.message,
                timestamp: now,
                dismissed: false,
                auto_dismissed: false,
                source: new.source,
                source_id: new.source_id,
                occurrence_count: 1,
            });
        }

        if self.notifications.len() > Self::MAX_RETAINED {
            let excess = self.notifications.len() - Self::MAX_RETAINED;
            self.notifications.drain(0..excess);
        }
    }

    pub fn dismiss_notification(&mut self, id: &str, auto: bool) -> bool {
        match self.notifications.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.dismissed = true;
                n.auto_dismissed = auto;
                true
            }
            None => false,
        }
    }

    /// Dismiss every active notification of `source`, narrowed to
    /// `source_id` unless it is absent or empty. Returns how many changed.
    pub fn dismiss_all_by_source(
        &mut self,
        source: NotificationSource,
        source_id: Option<&str>,
        auto: bool,
    ) -> usize {
        let source_id = source_id.filter(|s| !s.is_empty());
        let mut changed = 0;
        for n in self.notifications.iter_mut() {
            if n.source == source
                && !n.dismissed
                && source_id.map_or(true, |id| n.source_id.as_deref() == Some(id))
            {
                n.dismissed = true;
                n.auto_dismissed = auto;
                changed += 1;
            }
        }
        changed
    }

    pub fn clear_dismissed(&mut self) {
        self.notifications.retain(|n| !n.dismissed);
    }

    pub fn active_notifications(&self) -> Vec<Notification> {
        self.notifications
            .iter()
            .filter(|n| !n.dismissed)
            .cloned()
            .collect()
    }

    /// The most recent dismissed entries, oldest first.
    pub fn dismissed_notifications(&self) -> Vec<Notification> {
        let dismissed: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|n| n.dismissed)
            .cloned()
            .collect();
        let skip = dismissed.len().saturating_sub(Self::MAX_DISMISSED_SHOWN);
        dismissed.into_iter().skip(skip).collect()
    }

    fn active_of(&self, kind: NotificationType) -> usize {
        self.notifications
            .iter()
            .filter(|n| !n.dismissed && n.kind == kind)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.active_of(NotificationType::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.active_of(NotificationType::Error)
    }

    pub fn total_active_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.dismissed).count()
    }
}
