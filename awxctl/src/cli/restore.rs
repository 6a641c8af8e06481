use std::{path::PathBuf, time::Duration};

use clap::Args;
use snafu::ResultExt;

use crate::{
    archive,
    cli::{
        error::{self, Error},
        internal::ResourceResolver,
    },
    config::Config,
    deployment::Deployment,
};

#[derive(Args, Clone)]
pub struct RestoreCommand {
    #[arg(help = "Backup to restore from, `.tar` is appended when missing. Defaults to today's \
                  date.")]
    pub name: Option<String>,
}

impl RestoreCommand {
    /// Recreates the AWX database from the archive and writes the archived
    /// secrets back into the instance.
    ///
    /// # Errors
    ///
    /// Fails when the archive is unreadable, the instance or its database
    /// pod cannot be found, or any database command fails. Secrets already
    /// restored before the failure stay restored.
    pub async fn run(self, kube_client: kube::Client, config: Config) -> Result<(), Error> {
        let name = self.name.filter(|s| !s.is_empty()).unwrap_or_else(archive::default_backup_name);
        let path = PathBuf::from(archive::archive_file_name(&name));
        let _metadata = tokio::fs::metadata(&path)
            .await
            .with_context(|_| error::BackupNotFoundSnafu { path: path.clone() })?;

        let namespace = ResourceResolver::from((&kube_client, &config)).namespace();
        let deployment = Deployment::discover(
            kube_client,
            &namespace,
            config.instance.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
        .await?;

        tracing::info!("Restoring {} from {}", deployment.instance_name(), path.display());
        deployment.restore(&path).await?;
        tracing::info!("Restore of {} completed", deployment.instance_name());
        Ok(())
    }
}
