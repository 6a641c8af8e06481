use std::path::PathBuf;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{source}"))]
    Archive { source: crate::archive::Error },

    #[snafu(display("{source}"))]
    Kubernetes { source: crate::ext::Error },

    #[snafu(display("Failed to list AWX instances in namespace {namespace}, error: {source}"))]
    ListInstances {
        namespace: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("No AWX instance found in namespace {namespace}"))]
    NoInstance { namespace: String },

    #[snafu(display("Failed to list pods in namespace {namespace}, error: {source}"))]
    ListPods {
        namespace: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("No database pod of AWX instance {instance_name} in namespace {namespace}"))]
    NoDatabasePod { namespace: String, instance_name: String },

    #[snafu(display("Failed to list secrets in namespace {namespace}, error: {source}"))]
    ListSecrets {
        namespace: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Failed to get secret {secret_name} in namespace {namespace}, error: {source}"))]
    GetSecret {
        namespace: String,
        secret_name: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display(
        "Failed to update secret {secret_name} in namespace {namespace}, error: {source}"
    ))]
    ReplaceSecret {
        namespace: String,
        secret_name: String,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    #[snafu(display("Secret {secret_name} has no key '{key}'"))]
    MissingSecretKey { secret_name: String, key: &'static str },

    #[snafu(display("Value of '{key}' in secret {secret_name} is not UTF-8, error: {source}"))]
    DecodeSecretValue { secret_name: String, key: &'static str, source: std::string::FromUtf8Error },

    #[snafu(display("Failed to create {}, error: {source}", path.display()))]
    CreateDumpFile { path: PathBuf, source: std::io::Error },

    #[snafu(display("Archive task failed, error: {source}"))]
    JoinBlockingTask { source: tokio::task::JoinError },
}

impl From<crate::archive::Error> for Error {
    fn from(source: crate::archive::Error) -> Self { Self::Archive { source } }
}

impl From<crate::ext::Error> for Error {
    fn from(source: crate::ext::Error) -> Self { Self::Kubernetes { source } }
}
