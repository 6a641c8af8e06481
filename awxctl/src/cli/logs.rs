use clap::Args;
use futures::{AsyncBufReadExt, TryStreamExt};
use k8s_openapi::api::{apps::v1::Deployment, core::v1::Pod};
use kube::{
    Api, ResourceExt,
    api::{ListParams, LogParams},
};
use snafu::{OptionExt, ResultExt};
use tokio::io::AsyncWriteExt;

use crate::{
    cli::{
        error::{self, Error},
        internal::ResourceResolver,
    },
    config::Config,
    ext::{PodListExt, label_selector},
};

#[derive(Args, Clone)]
pub struct LogsCommand {
    #[arg(long = "no-follow", help = "Print the current log and exit instead of following it.")]
    pub no_follow: bool,

    #[arg(long = "tail", help = "Number of most recent lines to print first. Defaults to all.")]
    pub tail: Option<i64>,
}

impl LogsCommand {
    /// Streams the log of the operator's manager container to stdout.
    pub async fn run(self, kube_client: kube::Client, config: Config) -> Result<(), Error> {
        let Self { no_follow, tail } = self;
        let namespace = ResourceResolver::from((&kube_client, &config)).namespace();
        let deployment_name = config.operator_deployment.clone();

        let deployment = Api::<Deployment>::namespaced(kube_client.clone(), &namespace)
            .get(&deployment_name)
            .await
            .with_context(|_| error::GetDeploymentSnafu {
                namespace: namespace.clone(),
                deployment_name: deployment_name.clone(),
            })?;
        let selector = deployment
            .spec
            .as_ref()
            .and_then(|spec| spec.selector.match_labels.as_ref())
            .map(label_selector)
            .filter(|selector| !selector.is_empty())
            .with_context(|| error::NoDeploymentSelectorSnafu {
                namespace: namespace.clone(),
                deployment_name: deployment_name.clone(),
            })?;

        let pods = Api::<Pod>::namespaced(kube_client, &namespace);
        let pod_name = pods
            .list(&ListParams::default().labels(&selector))
            .await
            .with_context(|_| error::ListPodsSnafu { namespace: namespace.clone() })?
            .items
            .first_running()
            .map(ResourceExt::name_any)
            .with_context(|| error::NoRunningPodSnafu {
                namespace: namespace.clone(),
                selector: selector.clone(),
            })?;
        tracing::debug!("Reading logs of {pod_name}, container {}", config.operator_container);

        let log_params = LogParams {
            container: Some(config.operator_container.clone()),
            follow: !no_follow,
            tail_lines: tail,
            ..LogParams::default()
        };
        let logs = pods.log_stream(&pod_name, &log_params).await.with_context(|_| {
            error::LogStreamSnafu { namespace: namespace.clone(), pod_name: pod_name.clone() }
        })?;

        let mut lines = std::pin::pin!(logs.lines());
        let mut stdout = tokio::io::stdout();
        while let Some(line) = lines
            .try_next()
            .await
            .with_context(|_| error::ReadLogLineSnafu { pod_name: pod_name.clone() })?
        {
            stdout.write_all(line.as_bytes()).await.context(error::WriteStdoutSnafu)?;
            stdout.write_u8(b'\n').await.context(error::WriteStdoutSnafu)?;
            stdout.flush().await.context(error::WriteStdoutSnafu)?;
        }

        Ok(())
    }
}
