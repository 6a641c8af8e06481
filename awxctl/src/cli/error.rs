use std::path::PathBuf;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("{source}"))]
    Configuration { source: crate::config::Error },

    #[snafu(display("{source}"))]
    Archive { source: crate::archive::Error },

    #[snafu(display("{source}"))]
    Deployment { source: crate::deployment::Error },

    #[snafu(display("{source}"))]
    Kubernetes { source: crate::ext::Error },

    #[snafu(display("{source}"))]
    PortForwarder { source: crate::port_forwarder::Error },

    #[snafu(display("Failed to write to stdout, error: {source}"))]
    WriteStdout { source: std::io::Error },

    #[snafu(display("Failed to initialize Kubernetes client configuration, error: {source}"))]
    KubeConfig { source: kube::Error },

    #[snafu(display("Failed to create tokio runtime, error: {source}"))]
    InitializeTokioRuntime { source: std::io::Error },

    #[snafu(display("Backup archive {} is not readable, error: {source}", path.display()))]
    BackupNotFound { path: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to list AWX instances in namespace {namespace}, error: {source}"))]
    ListInstances {
        namespace: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to list pods in namespace {namespace}, error: {source}"))]
    ListPods {
        namespace: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to list services in namespace {namespace}, error: {source}"))]
    ListServices {
        namespace: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display(
        "Failed to get deployment {deployment_name} in namespace {namespace}, error: {source}"
    ))]
    GetDeployment {
        namespace: String,
        deployment_name: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Deployment {deployment_name} in namespace {namespace} has no label selector"))]
    NoDeploymentSelector { namespace: String, deployment_name: String },

    #[snafu(display(
        "Failed to get service {service_name} in namespace {namespace}, error: {source}"
    ))]
    GetService {
        namespace: String,
        service_name: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Service {service_name} in namespace {namespace} has no pod selector"))]
    NoServiceSelector { namespace: String, service_name: String },

    #[snafu(display("No running pod matches {selector} in namespace {namespace}"))]
    NoRunningPod { namespace: String, selector: String },

    #[snafu(display(
        "Failed to read logs of pod {pod_name} in namespace {namespace}, error: {source}"
    ))]
    LogStream {
        namespace: String,
        pod_name: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to read logs of pod {pod_name}, error: {source}"))]
    ReadLogLine { pod_name: String, source: std::io::Error },

    #[snafu(display(
        "Failed to get secret {secret_name} in namespace {namespace}, error: {source}"
    ))]
    GetSecret {
        namespace: String,
        secret_name: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Secret {secret_name} has no key 'password'"))]
    MissingPassword { secret_name: String },

    #[snafu(display("Password in secret {secret_name} is not UTF-8, error: {source}"))]
    DecodePassword { secret_name: String, source: std::string::FromUtf8Error },

    #[snafu(display(
        "Failed to delete AWX instance {instance_name} in namespace {namespace}, error: {source}"
    ))]
    DeleteInstance {
        namespace: String,
        instance_name: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to delete namespace {namespace}, error: {source}"))]
    DeleteNamespace {
        namespace: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },
}

impl From<crate::config::Error> for Error {
    fn from(source: crate::config::Error) -> Self { Self::Configuration { source } }
}

impl From<crate::archive::Error> for Error {
    fn from(source: crate::archive::Error) -> Self { Self::Archive { source } }
}

impl From<crate::deployment::Error> for Error {
    fn from(source: crate::deployment::Error) -> Self { Self::Deployment { source } }
}

impl From<crate::ext::Error> for Error {
    fn from(source: crate::ext::Error) -> Self { Self::Kubernetes { source } }
}

impl From<crate::port_forwarder::Error> for Error {
    fn from(source: crate::port_forwarder::Error) -> Self { Self::PortForwarder { source } }
}
