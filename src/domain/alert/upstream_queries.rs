use crate::core::util::version_util::min_version;
use crate::domain::alert::dto::alerts_response::{
    AlertmanagerUpstream, ApiGrid, ClusterMap, LabelColor, LabelColors, UpstreamsResponse,
};

/// Health of one cluster, judged only by members that resolve to instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterHealth {
    Healthy,
    /// Some, not all, members failing.
    Degraded { failing: usize, total: usize },
    /// Every member failing.
    Down { total: usize },
}

pub fn get_alertmanager_by_name<'a>(
    upstreams: &'a UpstreamsResponse,
    name: &str,
) -> Option<&'a AlertmanagerUpstream> {
    upstreams.instances.iter().find(|am| am.name == name)
}

pub fn read_only_alertmanagers(upstreams: &UpstreamsResponse) -> Vec<AlertmanagerUpstream> {
    upstreams
        .instances
        .iter()
        .filter(|am| am.readonly)
        .cloned()
        .collect()
}

pub fn is_read_only_alertmanager(upstreams: &UpstreamsResponse, name: &str) -> bool {
    upstreams
        .instances
        .iter()
        .any(|am| am.readonly && am.name == name)
}

/// Writable instances, with read-only peers removed from their member lists.
pub fn read_write_alertmanagers(upstreams: &UpstreamsResponse) -> Vec<AlertmanagerUpstream> {
    upstreams
        .instances
        .iter()
        .filter(|am| !am.readonly)
        .map(|am| {
            let mut am = am.clone();
            am.cluster_members
                .retain(|m| !is_read_only_alertmanager(upstreams, m));
            am
        })
        .collect()
}

/// Cluster map restricted to writable members; clusters left empty are omitted.
pub fn clusters_without_read_only(upstreams: &UpstreamsResponse) -> ClusterMap {
    upstreams
        .clusters
        .iter()
        .filter_map(|(cluster, members)| {
            let writable: Vec<String> = members
                .iter()
                .filter(|m| !is_read_only_alertmanager(upstreams, m))
                .cloned()
                .collect();
            (!writable.is_empty()).then(|| (cluster.clone(), writable))
        })
        .collect()
}

pub fn upstreams_with_errors(upstreams: &UpstreamsResponse) -> Vec<AlertmanagerUpstream> {
    upstreams
        .instances
        .iter()
        .filter(|am| am.is_failing())
        .cloned()
        .collect()
}

/// Members of `cluster` that resolve to known instances, in map order.
pub fn cluster_instances<'a>(
    upstreams: &'a UpstreamsResponse,
    cluster: &str,
) -> Vec<&'a AlertmanagerUpstream> {
    upstreams
        .clusters
        .get(cluster)
        .map(|members| {
            members
                .iter()
                .filter_map(|m| get_alertmanager_by_name(upstreams, m))
                .collect()
        })
        .unwrap_or_default()
}

pub fn cluster_health(upstreams: &UpstreamsResponse, cluster: &str) -> ClusterHealth {
    let members = cluster_instances(upstreams, cluster);
    let total = members.len();
    let failing = members.iter().filter(|am| am.is_failing()).count();
    match failing {
        0 => ClusterHealth::Healthy,
        k if k == total => ClusterHealth::Down { total },
        k => ClusterHealth::Degraded { failing: k, total },
    }
}

pub fn clusters_with_errors(upstreams: &UpstreamsResponse) -> Vec<String> {
    upstreams
        .clusters
        .keys()
        .filter(|c| matches!(cluster_health(upstreams, c), ClusterHealth::Down { .. }))
        .cloned()
        .collect()
}

pub fn clusters_with_warnings(upstreams: &UpstreamsResponse) -> Vec<String> {
    upstreams
        .clusters
        .keys()
        .filter(|c| matches!(cluster_health(upstreams, c), ClusterHealth::Degraded { .. }))
        .cloned()
        .collect()
}

fn failing_members_of(upstreams: &UpstreamsResponse, clusters: &[String]) -> Vec<AlertmanagerUpstream> {
    let mut out: Vec<AlertmanagerUpstream> = Vec::new();
    for cluster in clusters {
        for am in cluster_instances(upstreams, cluster) {
            if am.is_failing() && !out.iter().any(|o| o.name == am.name) {
                out.push(am.clone());
            }
        }
    }
    out
}

/// Failing instances of clusters that are entirely down.
pub fn upstreams_with_critical_errors(upstreams: &UpstreamsResponse) -> Vec<AlertmanagerUpstream> {
    failing_members_of(upstreams, &clusters_with_errors(upstreams))
}

/// Failing instances of clusters that still have a healthy member.
pub fn upstreams_with_warnings(upstreams: &UpstreamsResponse) -> Vec<AlertmanagerUpstream> {
    failing_members_of(upstreams, &clusters_with_warnings(upstreams))
}

pub fn grid_padding(grids: &[ApiGrid]) -> u32 {
    if grids.iter().any(|g| !g.label_name.is_empty()) {
        5
    } else {
        0
    }
}

pub fn get_color_data<'a>(colors: &'a LabelColors, name: &str, value: &str) -> Option<&'a LabelColor> {
    colors.get(name).and_then(|values| values.get(value))
}

/// Lowest version among the named instances. Names that match no instance
/// are ignored so they can never drag the minimum down.
pub fn get_min_version(upstreams: &UpstreamsResponse, names: &[String]) -> String {
    min_version(
        upstreams
            .instances
            .iter()
            .filter(|am| names.contains(&am.name))
            .map(|am| am.version.as_str()),
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn am(name: &str, cluster: &str, readonly: bool, error: &str, version: &str) -> AlertmanagerUpstream {
        AlertmanagerUpstream {
            name: name.into(),
            cluster: cluster.into(),
            uri: format!("http://{name}.example.com"),
            public_uri: format!("http://{name}.example.com"),
            readonly,
            error: error.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    fn fixture() -> UpstreamsResponse {
        let mut u = UpstreamsResponse {
            instances: vec![
                am("ro1", "ro", true, "", "0.17.0"),
                am("ro2", "mixed", true, "", "0.20.0"),
                am("rw2", "mixed", false, "", "0.23.0"),
                am("single", "single", false, "", "0.21.0"),
                am("failed", "failed", false, "connection refused", ""),
            ],
            ..Default::default()
        };
        u.instances[1].cluster_members = vec!["ro2".into(), "rw2".into()];
        u.instances[2].cluster_members = vec!["ro2".into(), "rw2".into()];
        u.clusters.insert("ro".into(), vec!["ro1".into()]);
        u.clusters.insert("mixed".into(), vec!["ro2".into(), "rw2".into()]);
        u.clusters.insert("single".into(), vec!["single".into()]);
        u.clusters.insert("failed".into(), vec!["failed".into()]);
        u
    }

    #[test]
    fn min_version_table() {
        let u = fixture();
        let case = |ams: &[&str]| {
            let ams: Vec<String> = ams.iter().map(|s| s.to_string()).collect();
            get_min_version(&u, &ams)
        };
        assert_eq!(case(&["failed"]), "0.22.0");
        assert_eq!(case(&[]), "0.22.0");
        assert_eq!(case(&["foo"]), "0.22.0");
        assert_eq!(case(&["foo", "single", "failed"]), "0.21.0");
        assert_eq!(case(&["ro1", "ro2"]), "0.17.0");
    }

    #[test]
    fn read_write_strips_read_only_members() {
        let u = fixture();
        let rw = read_write_alertmanagers(&u);
        let rw_names: Vec<&str> = rw.iter().map(|am| am.name.as_str()).collect();
        assert_eq!(rw_names, vec!["rw2", "single", "failed"]);
        assert_eq!(rw[0].cluster_members, vec!["rw2".to_string()]);
        assert_eq!(read_only_alertmanagers(&u).len(), 2);
    }

    #[test]
    fn clusters_without_read_only_drop_empty_clusters() {
        let u = fixture();
        let clusters = clusters_without_read_only(&u);
        assert!(!clusters.contains_key("ro"));
        assert_eq!(clusters["mixed"], vec!["rw2".to_string()]);
        assert_eq!(clusters["single"], vec!["single".to_string()]);
    }

    #[test]
    fn cluster_health_classification() {
        let mut u = fixture();
        assert_eq!(clusters_with_errors(&u), vec!["failed".to_string()]);
        assert!(clusters_with_warnings(&u).is_empty());

        u.instances[2].error = "timeout".into();
        assert_eq!(
            cluster_health(&u, "mixed"),
            ClusterHealth::Degraded { failing: 1, total: 2 }
        );
        assert_eq!(clusters_with_warnings(&u), vec!["mixed".to_string()]);
        assert_eq!(upstreams_with_warnings(&u)[0].name, "rw2");
        assert_eq!(upstreams_with_critical_errors(&u)[0].name, "failed");
        assert_eq!(upstreams_with_errors(&u).len(), 2);
    }

    #[test]
    fn unresolvable_members_are_ignored() {
        let mut u = UpstreamsResponse::default();
        u.clusters.insert("ghost".into(), vec!["nobody".into()]);
        assert_eq!(cluster_health(&u, "ghost"), ClusterHealth::Healthy);
        assert_eq!(cluster_health(&u, "absent"), ClusterHealth::Healthy);
    }

    #[test]
    fn grid_padding_depends_on_labelled_grids() {
        assert_eq!(grid_padding(&[ApiGrid::default()]), 0);
        let labelled = ApiGrid {
            label_name: "cluster".into(),
            ..Default::default()
        };
        assert_eq!(grid_padding(&[ApiGrid::default(), labelled]), 5);
    }
}
