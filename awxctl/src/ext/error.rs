use std::borrow::Cow;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Failed to get pod {pod_name} in namespace {namespace}, error: {source}"))]
    GetPod {
        namespace: String,
        pod_name: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display(
        "Timed out waiting for pod '{pod_name}' to reach running status in namespace '{namespace}'"
    ))]
    WaitForPodStatus { namespace: String, pod_name: String },

    #[snafu(display(
        "Failed to wait for pod {pod_name} status in namespace {namespace}, error: {source}"
    ))]
    GetPodStatus {
        namespace: String,
        pod_name: String,
        #[snafu(source(from(kube::runtime::wait::Error, Box::new)))]
        source: Box<kube::runtime::wait::Error>,
    },

    #[snafu(display("Failed to execute `{program}` in pod {pod_name}, error: {source}"))]
    ExecInPod {
        pod_name: String,
        program: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("{stream} requested but missing"))]
    GetPodStream { stream: Cow<'static, str> },

    #[snafu(display("Exit status of `{program}` in pod {pod_name} is unavailable"))]
    GetExecStatus { pod_name: String, program: String },

    #[snafu(display("Error occurs while copying {stream} of `{program}`, error: {source}"))]
    CopyIo { program: String, stream: Cow<'static, str>, source: std::io::Error },

    #[snafu(display("`{program}` failed in pod {pod_name}: {message}"))]
    CommandFailed { pod_name: String, program: String, message: String },

    #[snafu(display("Service {service_name} does not expose port {port}"))]
    ServicePortNotFound { service_name: String, port: u16 },

    #[snafu(display(
        "Target port '{port_name}' of service {service_name} is not declared by any container"
    ))]
    NamedPortNotFound { service_name: String, port_name: String },

    #[snafu(display("Port {port} of service {service_name} is out of range"))]
    InvalidPort { service_name: String, port: i32 },
}
