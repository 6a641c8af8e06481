use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

/// Defaults for `awxctl port-forward`.
///
/// The unspecified address makes the web UI reachable from outside the host
/// running the cluster, which is the usual reason to forward at all on a
/// minikube VM.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortForwardConfig {
    #[serde(default = "PortForwardConfig::default_address")]
    pub address: IpAddr,

    #[serde(default = "PortForwardConfig::default_local_port")]
    pub local_port: u16,

    #[serde(default = "PortForwardConfig::default_service_port")]
    pub service_port: u16,
}

impl Default for PortForwardConfig {
    fn default() -> Self {
        Self {
            address: Self::default_address(),
            local_port: Self::default_local_port(),
            service_port: Self::default_service_port(),
        }
    }
}

impl PortForwardConfig {
    #[inline]
    #[must_use]
    pub const fn default_address() -> IpAddr { IpAddr::V4(Ipv4Addr::UNSPECIFIED) }

    #[inline]
    #[must_use]
    pub const fn default_local_port() -> u16 { 8080 }

    #[inline]
    #[must_use]
    pub const fn default_service_port() -> u16 { 80 }
}
