use awxctl_base::consts::k8s::labels;
use k8s_openapi::api::core::v1::Pod;

/// Status and label lookups on a single pod.
pub trait PodExt {
    /// Phase is `Running` and the pod is not being deleted.
    fn is_running(&self) -> bool;

    /// Sum of container restarts.
    fn restart_count(&self) -> i32;

    /// Resolves a named container port, as referenced by a service's
    /// `targetPort`.
    fn container_port(&self, name: &str) -> Option<i32>;

    /// Value of `app.kubernetes.io/part-of`, i.e. the owning AWX instance.
    fn part_of(&self) -> Option<&str>;
}

impl PodExt for Pod {
    fn is_running(&self) -> bool {
        self.metadata.deletion_timestamp.is_none()
            && self.status.as_ref().and_then(|status| status.phase.as_deref()) == Some("Running")
    }

    fn restart_count(&self) -> i32 {
        self.status
            .iter()
            .flat_map(|status| status.container_statuses.iter().flatten())
            .map(|container| container.restart_count)
            .sum()
    }

    fn container_port(&self, name: &str) -> Option<i32> {
        self.spec
            .iter()
            .flat_map(|spec| spec.containers.iter())
            .flat_map(|container| container.ports.iter().flatten())
            .find(|port| port.name.as_deref() == Some(name))
            .map(|port| port.container_port)
    }

    fn part_of(&self) -> Option<&str> {
        self.metadata.labels.as_ref()?.get(labels::PART_OF).map(String::as_str)
    }
}

pub trait PodListExt {
    /// The first pod in list order that [`PodExt::is_running`].
    fn first_running(&self) -> Option<&Pod>;
}

impl PodListExt for [Pod] {
    fn first_running(&self) -> Option<&Pod> { self.iter().find(|pod| pod.is_running()) }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::{
        api::core::v1::{Container, ContainerPort, ContainerStatus, PodSpec, PodStatus},
        apimachinery::pkg::apis::meta::v1::ObjectMeta,
    };

    use super::*;

    fn pod(name: &str, phase: &str) -> Pod {
        Pod {
            metadata: ObjectMeta { name: Some(name.to_string()), ..ObjectMeta::default() },
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: "web".to_string(),
                    ports: Some(vec![ContainerPort {
                        name: Some("http".to_string()),
                        container_port: 8052,
                        ..ContainerPort::default()
                    }]),
                    ..Container::default()
                }],
                node_name: Some("minikube".to_string()),
                ..PodSpec::default()
            }),
            status: Some(PodStatus {
                phase: Some(phase.to_string()),
                container_statuses: Some(vec![
                    ContainerStatus { name: "web".to_string(), restart_count: 2, ..ContainerStatus::default() },
                    ContainerStatus { name: "task".to_string(), restart_count: 1, ..ContainerStatus::default() },
                ]),
                ..PodStatus::default()
            }),
        }
    }

    #[test]
    fn test_is_running() {
        assert!(pod("awx-demo-web", "Running").is_running());
        assert!(!pod("awx-demo-web", "Pending").is_running());

        let terminating: Pod = serde_json::from_value(serde_json::json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {
                "name": "awx-demo-web",
                "deletionTimestamp": "2026-01-01T00:00:00Z",
            },
            "status": { "phase": "Running" },
        }))
        .unwrap();
        assert!(!terminating.is_running());
    }

    #[test]
    fn test_restart_count_sums_containers() {
        assert_eq!(pod("awx-demo-web", "Running").restart_count(), 3);
        assert_eq!(Pod::default().restart_count(), 0);
    }

    #[test]
    fn test_container_port_by_name() {
        let pod = pod("awx-demo-web", "Running");
        assert_eq!(pod.container_port("http"), Some(8052));
        assert_eq!(pod.container_port("https"), None);
    }

    #[test]
    fn test_first_running() {
        let pods = vec![pod("a", "Pending"), pod("b", "Running"), pod("c", "Running")];
        assert_eq!(pods.first_running().and_then(|pod| pod.metadata.name.as_deref()), Some("b"));
        assert!(Vec::<Pod>::new().first_running().is_none());
    }
}
