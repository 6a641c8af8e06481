//! Extensions to Kubernetes API types.
//!
//! Traits here add the lookups `awxctl` needs on top of `kube::Api` and the
//! `k8s_openapi` object types: waiting for pods, running commands inside
//! containers, and translating service ports to container ports.

mod api_pod;
mod error;
mod pod;
mod service;

use std::collections::BTreeMap;

pub use self::{
    api_pod::{ApiPodExt, RemoteCommand},
    error::Error,
    pod::{PodExt, PodListExt},
    service::ServiceExt,
};

/// Renders `matchLabels`-style labels as a label selector string, e.g.
/// `app=web,tier=frontend`.
pub fn label_selector(labels: &BTreeMap<String, String>) -> String {
    labels.iter().map(|(key, value)| format!("{key}={value}")).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_selector() {
        let labels = BTreeMap::from([
            ("app.kubernetes.io/name".to_string(), "awx-demo-web".to_string()),
            ("app.kubernetes.io/managed-by".to_string(), "awx-operator".to_string()),
        ]);
        assert_eq!(
            label_selector(&labels),
            "app.kubernetes.io/managed-by=awx-operator,app.kubernetes.io/name=awx-demo-web"
        );
        assert_eq!(label_selector(&BTreeMap::new()), "");
    }
}
