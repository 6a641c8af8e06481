use awxctl_base::consts::k8s::{labels, values};
use clap::Args;
use k8s_openapi::api::core::v1::{Pod, Service};
use kube::{Api, api::ListParams};
use snafu::ResultExt;
use tokio::io::AsyncWriteExt;

use crate::{
    cli::{
        error::{self, Error},
        internal::ResourceResolver,
    },
    config::Config,
    deployment,
    ui::table::{InstanceListExt, PodListExt, ServiceListExt},
};

#[derive(Args, Clone)]
pub struct StatusCommand {
    #[arg(
        short,
        long,
        help = "Show every pod and service in the namespace, not only those managed by the AWX \
                Operator."
    )]
    pub all: bool,
}

impl StatusCommand {
    pub async fn run(self, kube_client: kube::Client, config: Config) -> Result<(), Error> {
        let namespace = ResourceResolver::from((&kube_client, &config)).namespace();

        let list_params = if self.all {
            ListParams::default()
        } else {
            ListParams::default().labels(&format!("{}={}", labels::MANAGED_BY, values::AWX_OPERATOR))
        };

        let instances = deployment::awx_api(kube_client.clone(), &namespace)
            .list(&ListParams::default())
            .await
            .with_context(|_| error::ListInstancesSnafu { namespace: namespace.clone() })?;
        let pods = Api::<Pod>::namespaced(kube_client.clone(), &namespace)
            .list(&list_params)
            .await
            .with_context(|_| error::ListPodsSnafu { namespace: namespace.clone() })?;
        let services = Api::<Service>::namespaced(kube_client, &namespace)
            .list(&list_params)
            .await
            .with_context(|_| error::ListServicesSnafu { namespace: namespace.clone() })?;

        let output = [
            instances.items.render_table(),
            pods.items.render_table(),
            services.items.render_table(),
        ]
        .join("\n\n");

        let mut stdout = tokio::io::stdout();
        stdout.write_all(output.as_bytes()).await.context(error::WriteStdoutSnafu)?;
        stdout.write_u8(b'\n').await.context(error::WriteStdoutSnafu)
    }
}
