use std::net::{IpAddr, SocketAddr};

use awxctl_base::consts;
use clap::Args;
use k8s_openapi::api::core::v1::{Pod, Service};
use kube::{Api, ResourceExt, api::ListParams};
use sigfinn::{ExitStatus, LifecycleManager};
use snafu::{OptionExt, ResultExt};

use crate::{
    cli::{
        error::{self, Error},
        internal::{ResolvedResources, ResourceResolver},
    },
    config::{Config, PortForwardConfig},
    ext::{PodListExt, ServiceExt},
    port_forwarder::PortForwarder,
};

/// Arguments override `portForward` of the configuration.
#[derive(Args, Clone)]
pub struct PortForwardCommand {
    #[arg(long = "address", help = "Local address to listen on. Defaults to 0.0.0.0.")]
    pub address: Option<IpAddr>,

    #[arg(long = "local-port", help = "Local port to listen on. Defaults to 8080.")]
    pub local_port: Option<u16>,

    #[arg(long = "service-port", help = "Port of the AWX service to forward to. Defaults to 80.")]
    pub service_port: Option<u16>,
}

impl PortForwardCommand {
    fn merge(self, config: &PortForwardConfig) -> PortForwardConfig {
        PortForwardConfig {
            address: self.address.unwrap_or(config.address),
            local_port: self.local_port.unwrap_or(config.local_port),
            service_port: self.service_port.unwrap_or(config.service_port),
        }
    }

    /// Forwards a local port to the AWX web service until Ctrl+C.
    ///
    /// Like `kubectl port-forward services/...`, the connection goes to one
    /// running pod behind the service, picked once at startup.
    pub async fn run(self, kube_client: kube::Client, config: Config) -> Result<(), Error> {
        let PortForwardConfig { address, local_port, service_port } =
            self.merge(&config.port_forward);

        let ResolvedResources { namespace, instance_name } =
            ResourceResolver::from((&kube_client, &config)).resolve().await?;
        let service_name = format!("{instance_name}-{}", consts::SERVICE_SUFFIX);

        let service = Api::<Service>::namespaced(kube_client.clone(), &namespace)
            .get(&service_name)
            .await
            .with_context(|_| error::GetServiceSnafu {
                namespace: namespace.clone(),
                service_name: service_name.clone(),
            })?;
        let selector = service.pod_selector().with_context(|| error::NoServiceSelectorSnafu {
            namespace: namespace.clone(),
            service_name: service_name.clone(),
        })?;

        let pods = Api::<Pod>::namespaced(kube_client, &namespace);
        let pod_list = pods
            .list(&ListParams::default().labels(&selector))
            .await
            .with_context(|_| error::ListPodsSnafu { namespace: namespace.clone() })?;
        let pod = pod_list.items.first_running().with_context(|| error::NoRunningPodSnafu {
            namespace: namespace.clone(),
            selector: selector.clone(),
        })?;
        let pod_name = pod.name_any();
        let pod_port = service.target_port(service_port, pod)?;

        let local_address = SocketAddr::new(address, local_port);
        let worker_name = format!("forwarder-{local_address}/{service_name}:{service_port}");
        let lifecycle_manager = LifecycleManager::<Error>::new();
        let create_fn = move |shutdown_signal| async move {
            let result = PortForwarder::new(pods, pod_name, pod_port, local_address)
                .run(shutdown_signal, |bound_address| {
                    println!("Forwarding from {bound_address} -> {service_port}");
                })
                .await;

            match result {
                Ok(()) => ExitStatus::Success,
                Err(err) => ExitStatus::Error(Error::from(err)),
            }
        };
        let _handle = lifecycle_manager.spawn(worker_name, create_fn);

        tracing::info!("Forwarder started. Use Ctrl+C to stop.");

        if let Ok(Err(err)) = lifecycle_manager.serve().await {
            tracing::error!("{err}");
            Err(err)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn test_arguments_override_configuration() {
        let command = PortForwardCommand {
            address: Some(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            local_port: None,
            service_port: Some(8052),
        };
        let merged = command.merge(&PortForwardConfig::default());
        assert_eq!(merged.address, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(merged.local_port, 8080);
        assert_eq!(merged.service_port, 8052);
    }

    #[test]
    fn test_defaults_from_configuration() {
        let command = PortForwardCommand { address: None, local_port: None, service_port: None };
        let merged = command.merge(&PortForwardConfig::default());
        assert_eq!(merged.address, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(merged.local_port, 8080);
        assert_eq!(merged.service_port, 80);
    }
}
