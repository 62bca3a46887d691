use tracing::debug;

use crate::domain::alert::dto::alerts_response::UpstreamsResponse;
use crate::domain::alert::upstream_queries::{cluster_health, cluster_instances, ClusterHealth};
use crate::domain::notification::notification_entity::{
    NewNotification, NotificationSource, NotificationType,
};
use crate::domain::notification::notification_store::NotificationStore;

/// One step of a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOp {
    Upsert(NewNotification),
    /// Auto-dismiss whatever is active for this cluster.
    Dismiss { source_id: String },
}

fn code(text: &str) -> String {
    format!(r#"<code class="bg-secondary text-white px-1 rounded">{text}</code>"#)
}

pub fn cluster_source_id(cluster: &str) -> String {
    format!("cluster-{cluster}")
}

/// Work out what the notification list should look like for `upstreams`.
///
/// Pure: nothing is touched until the plan is applied, so a reconciliation
/// is either applied whole or not at all.
pub fn plan(upstreams: &UpstreamsResponse) -> Vec<NotificationOp> {
    let mut ops = Vec::with_capacity(upstreams.clusters.len());

    for cluster in upstreams.clusters.keys() {
        let source_id = cluster_source_id(cluster);
        let failing: Vec<String> = cluster_instances(upstreams, cluster)
            .into_iter()
            .filter(|am| am.is_failing())
            .map(|am| code(&am.name))
            .collect();

        match cluster_health(upstreams, cluster) {
            ClusterHealth::Down { total } => {
                let names = failing.join(", ");
                let message = if total == 1 {
                    format!("The only instance in cluster {} is failing: {}", code(cluster), names)
                } else {
                    format!(
                        "All {} Alertmanager instances in cluster {} are failing: {}",
                        total,
                        code(cluster),
                        names
                    )
                };
                ops.push(NotificationOp::Upsert(NewNotification {
                    kind: NotificationType::Error,
                    title: format!("Cluster {} is unreachable", code(cluster)),
                    message,
                    source: NotificationSource::Alertmanager,
                    source_id: Some(source_id),
                }));
            }
            ClusterHealth::Degraded { failing: k, total } => {
                ops.push(NotificationOp::Upsert(NewNotification {
                    kind: NotificationType::Warning,
                    title: format!("Partial outage in cluster {}", code(cluster)),
                    message: format!(
                        "{} of {} Alertmanager instances failing: {}",
                        k,
                        total,
                        failing.join(", ")
                    ),
                    source: NotificationSource::Alertmanager,
                    source_id: Some(source_id),
                }));
            }
            ClusterHealth::Healthy => ops.push(NotificationOp::Dismiss { source_id }),
        }
    }

    ops
}

/// Apply a plan in a single store update.
pub fn apply(store: &NotificationStore, ops: Vec<NotificationOp>) {
    if ops.is_empty() {
        return;
    }
    store.batch(|state| {
        for op in ops {
            match op {
                NotificationOp::Upsert(new) => state.add_notification(new),
                NotificationOp::Dismiss { source_id } => {
                    state.dismiss_all_by_source(
                        NotificationSource::Alertmanager,
                        Some(&source_id),
                        true,
                    );
                }
            }
        }
    });
}

pub fn reconcile(store: &NotificationStore, upstreams: &UpstreamsResponse) {
    let ops = plan(upstreams);
    debug!(clusters = upstreams.clusters.len(), ops = ops.len(), "Reconciling notifications");
    apply(store, ops);
}
