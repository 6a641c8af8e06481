use k8s_openapi::{api::core::v1::Service, apimachinery::pkg::util::intstr::IntOrString};

pub trait ServiceListExt {
    /// Renders NAME, TYPE, CLUSTER-IP and PORTS columns.
    fn render_table(&self) -> String;
}

impl ServiceListExt for [Service] {
    fn render_table(&self) -> String {
        super::render(&["NAME", "TYPE", "CLUSTER-IP", "PORTS"], self.iter().map(service_column))
    }
}

fn service_column(service: &Service) -> [String; 4] {
    let spec = service.spec.as_ref();
    [
        service.metadata.name.clone().unwrap_or_default(),
        spec.and_then(|s| s.type_.clone()).unwrap_or_else(|| "ClusterIP".to_string()),
        spec.and_then(|s| s.cluster_ip.clone()).unwrap_or_else(|| "<none>".to_string()),
        spec.and_then(|s| s.ports.as_ref())
            .map(|ports| {
                ports
                    .iter()
                    .map(|port| {
                        let node_port =
                            port.node_port.map(|node_port| format!(":{node_port}")).unwrap_or_default();
                        let protocol = port.protocol.as_deref().unwrap_or("TCP");
                        let target = match &port.target_port {
                            Some(IntOrString::Int(number)) if *number != port.port => {
                                format!("->{number}")
                            }
                            Some(IntOrString::String(name)) => format!("->{name}"),
                            _ => String::new(),
                        };
                        format!("{}{target}{node_port}/{protocol}", port.port)
                    })
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_else(|| "<none>".to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_table() {
        let services: Vec<Service> = serde_json::from_value(serde_json::json!([
            {
                "metadata": { "name": "awx-demo-service" },
                "spec": {
                    "type": "NodePort",
                    "clusterIP": "10.96.12.34",
                    "ports": [{ "port": 80, "targetPort": 8052, "nodePort": 30080, "protocol": "TCP" }],
                },
            },
            {
                "metadata": { "name": "awx-demo-postgres-15" },
                "spec": { "clusterIP": "None", "ports": [{ "port": 5432, "targetPort": 5432 }] },
            },
        ]))
        .unwrap();

        let table = services.render_table();
        let lines = table
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>())
            .filter(|columns| !columns.is_empty())
            .collect::<Vec<_>>();
        assert_eq!(lines[0], ["NAME", "TYPE", "CLUSTER-IP", "PORTS"]);
        assert_eq!(lines[1], ["awx-demo-service", "NodePort", "10.96.12.34", "80->8052:30080/TCP"]);
        assert_eq!(lines[2], ["awx-demo-postgres-15", "ClusterIP", "None", "5432/TCP"]);
    }
}
