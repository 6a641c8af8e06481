use k8s_openapi::{
    api::core::v1::{Pod, Service},
    apimachinery::pkg::util::intstr::IntOrString,
};
use kube::ResourceExt;
use snafu::OptionExt;

use crate::ext::{Error, PodExt, error, label_selector};

/// Lookups on a `Service` used to forward to one of its pods.
pub trait ServiceExt {
    /// The service's pod selector as a label selector string, suitable for
    /// `ListParams::labels`, e.g. `app.kubernetes.io/name=awx-demo-web`.
    ///
    /// Returns `None` for services without a selector, or with an empty
    /// one. Such services are backed by manually managed endpoints and have
    /// no pods to forward to.
    fn pod_selector(&self) -> Option<String>;

    /// Translates `service_port` into the container port traffic is sent
    /// to, the way kube-proxy does: a numeric `targetPort` is used as is, a
    /// named one is looked up in `backend`'s containers, and a missing one
    /// defaults to the service port itself.
    ///
    /// # Errors
    ///
    /// * `Error::ServicePortNotFound` when the service does not expose
    ///   `service_port`.
    /// * `Error::NamedPortNotFound` when a named `targetPort` matches no
    ///   container port of `backend`.
    /// * `Error::InvalidPort` when the resolved port is outside `1..=65535`.
    fn target_port(&self, service_port: u16, backend: &Pod) -> Result<u16, Error>;
}

impl ServiceExt for Service {
    fn pod_selector(&self) -> Option<String> {
        self.spec
            .as_ref()
            .and_then(|spec| spec.selector.as_ref())
            .filter(|selector| !selector.is_empty())
            .map(label_selector)
    }

    fn target_port(&self, service_port: u16, backend: &Pod) -> Result<u16, Error> {
        let service_name = self.name_any();
        let port = self
            .spec
            .iter()
            .flat_map(|spec| spec.ports.iter().flatten())
            .find(|port| port.port == i32::from(service_port))
            .with_context(|| error::ServicePortNotFoundSnafu {
                service_name: service_name.clone(),
                port: service_port,
            })?;

        let target = match &port.target_port {
            None => i32::from(service_port),
            Some(IntOrString::Int(number)) => *number,
            Some(IntOrString::String(name)) => match name.parse::<i32>() {
                Ok(number) => number,
                Err(_) => backend.container_port(name).with_context(|| {
                    error::NamedPortNotFoundSnafu {
                        service_name: service_name.clone(),
                        port_name: name.clone(),
                    }
                })?,
            },
        };

        u16::try_from(target)
            .ok()
            .filter(|port| *port != 0)
            .context(error::InvalidPortSnafu { service_name, port: target })
    }
}
