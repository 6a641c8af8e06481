use std::{path::PathBuf, time::Duration};

use clap::Args;
use snafu::ResultExt;
use tokio::io::AsyncWriteExt;

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
pub struct BackupCommand {
    #[arg(help = "Name of the backup, the archive is written to NAME.tar. Defaults to today's date.")]
    pub name: Option<String>,

    #[arg(
        short = 'o',
        long = "output-dir",
        default_value = ".",
        help = "Directory the backup archive is written to."
    )]
    pub output_dir: PathBuf,
}

impl BackupCommand {
    /// Dumps the AWX database and secrets of the instance into `NAME.tar`.
    ///
    /// # Errors
    ///
    /// Fails when `NAME` is not a valid backup name, when the archive
    /// already exists, when the instance or its database pod cannot be
    /// found, or when `pg_dump` fails.
    pub async fn run(self, kube_client: kube::Client, config: Config) -> Result<(), Error> {
        let Self { name, output_dir } = self;
        let name = name.filter(|s| !s.is_empty()).unwrap_or_else(archive::default_backup_name);
        let _destination = archive::archive_path(&output_dir, &name)?;

        let namespace = ResourceResolver::from((&kube_client, &config)).namespace();
        let deployment = Deployment::discover(
            kube_client,
            &namespace,
            config.instance.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
        .await?;
        let path = deployment.backup(&name, &output_dir).await?;

        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(format!("{}\n", path.display()).as_bytes())
            .await
            .context(error::WriteStdoutSnafu)
    }
}
