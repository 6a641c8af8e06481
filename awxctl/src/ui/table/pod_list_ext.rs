use k8s_openapi::api::core::v1::Pod;

use crate::ext::PodExt;

pub trait PodListExt {
    /// Renders NAME, STATUS, RESTARTS and NODE columns.
    fn render_table(&self) -> String;
}

impl PodListExt for [Pod] {
    fn render_table(&self) -> String {
        super::render(&["NAME", "STATUS", "RESTARTS", "NODE"], self.iter().map(pod_column))
    }
}

fn pod_column(pod: &Pod) -> [String; 4] {
    [
        pod.metadata.name.clone().unwrap_or_default(),
        pod.status.as_ref().and_then(|s| s.phase.clone()).unwrap_or_else(|| "Unknown".to_string()),
        pod.restart_count().to_string(),
        pod.spec.as_ref().and_then(|s| s.node_name.clone()).unwrap_or_default(),
    ]
}
