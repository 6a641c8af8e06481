use clap::Args;
use k8s_openapi::api::core::v1::Namespace;
use kube::{Api, api::DeleteParams};
use snafu::ResultExt;

use crate::{
    cli::{
        error::{self, Error},
        internal::{ResolvedResources, ResourceResolver},
    },
    config::Config,
    deployment,
};

#[derive(Args, Clone)]
pub struct TeardownCommand {
    #[arg(
        long = "delete-namespace",
        help = "Also delete the namespace, removing everything else deployed in it."
    )]
    pub delete_namespace: bool,
}

impl TeardownCommand {
    /// Deletes the `AWX` object; the operator removes the resources it
    /// created for it.
    pub async fn run(self, kube_client: kube::Client, config: Config) -> Result<(), Error> {
        let ResolvedResources { namespace, instance_name } =
            ResourceResolver::from((&kube_client, &config)).resolve().await?;

        let _resource = deployment::awx_api(kube_client.clone(), &namespace)
            .delete(&instance_name, &DeleteParams::default())
            .await
            .with_context(|_| error::DeleteInstanceSnafu {
                namespace: namespace.clone(),
                instance_name: instance_name.clone(),
            })?;
        println!("awx/{instance_name} deleted in namespace {namespace}");

        if self.delete_namespace {
            let _resource = Api::<Namespace>::all(kube_client)
                .delete(&namespace, &DeleteParams::default())
                .await
                .with_context(|_| error::DeleteNamespaceSnafu { namespace: namespace.clone() })?;
            println!("namespace/{namespace} deleted");
        }

        Ok(())
    }
}
