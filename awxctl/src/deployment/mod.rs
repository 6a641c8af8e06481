//! An AWX instance as deployed by the AWX Operator.
//!
//! [`Deployment::discover`] locates the `AWX` custom resource, its
//! PostgreSQL pod and the database credentials; the backup and restore
//! operations run the PostgreSQL client tools inside that pod.

mod database;
mod error;
mod secret;

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use awxctl_base::consts::k8s::{awx, labels, values};
use k8s_openapi::api::core::v1::{Pod, Secret};
use kube::{
    Api, ResourceExt,
    api::{ApiResource, DynamicObject, GroupVersionKind, ListParams, PostParams},
};
use snafu::{OptionExt, ResultExt};
use tokio::io::{AsyncRead, BufWriter};

pub use self::{
    database::DatabaseConfiguration,
    error::Error,
    secret::{is_backed_up, merge_secret, restored_secret_name},
};
use crate::{
    archive::{self, BackupEntry, Staging},
    ext::{ApiPodExt, PodExt, RemoteCommand},
    ui::ByteProgressBar,
};

/// API handle for the operator's `AWX` custom resources in `namespace`.
pub fn awx_api(client: kube::Client, namespace: &str) -> Api<DynamicObject> {
    let gvk = GroupVersionKind::gvk(awx::GROUP, awx::VERSION, awx::KIND);
    let resource = ApiResource::from_gvk_with_plural(&gvk, awx::PLURAL);
    Api::namespaced_with(client, namespace, &resource)
}

/// Returns `instance` when given, otherwise the first AWX object in the
/// namespace.
pub async fn resolve_instance(
    client: kube::Client,
    namespace: &str,
    instance: Option<String>,
) -> Result<String, Error> {
    if let Some(instance) = instance.filter(|name| !name.is_empty()) {
        return Ok(instance);
    }

    let instances = awx_api(client, namespace)
        .list(&ListParams::default())
        .await
        .with_context(|_| error::ListInstancesSnafu { namespace: namespace.to_string() })?;
    let mut names = instances.items.iter().map(ResourceExt::name_any);
    let first = names.next().context(error::NoInstanceSnafu { namespace: namespace.to_string() })?;
    if names.next().is_some() {
        tracing::warn!("Multiple AWX instances in namespace {namespace}, using {first}");
    }
    Ok(first)
}

/// Picks the PostgreSQL pod of `instance_name`, falling back to the first
/// database pod when none is labelled with the instance.
pub fn select_database_pod<'a>(pods: &'a [Pod], instance_name: &str) -> Option<&'a Pod> {
    pods.iter().find(|pod| pod.part_of() == Some(instance_name)).or_else(|| pods.first())
}

/// Non-empty lines a remote command wrote to stderr.
fn remote_messages(stderr: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(stderr)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// A discovered AWX instance: its namespace and name, the PostgreSQL pod
/// and the credentials the database tools run with.
pub struct Deployment {
    namespace: String,
    instance_name: String,
    database_pod: String,
    database: DatabaseConfiguration,
    pods: Api<Pod>,
    secrets: Api<Secret>,
}

impl Deployment {
    /// Resolves the AWX instance in `namespace` and waits up to `timeout`
    /// for its database pod to be running.
    ///
    /// # Errors
    ///
    /// * `Error::NoInstance` when `instance` is `None` and the namespace
    ///   holds no AWX object.
    /// * `Error::NoDatabasePod` when no pod carries the PostgreSQL component
    ///   label.
    /// * `Error::Kubernetes` when the database pod does not reach the
    ///   running state in time.
    /// * `Error::GetSecret` or `Error::MissingSecretKey` when the
    ///   `<instance>-postgres-configuration` secret is absent or incomplete.
    pub async fn discover(
        client: kube::Client,
        namespace: &str,
        instance: Option<String>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let instance_name = resolve_instance(client.clone(), namespace, instance).await?;

        let pods = Api::<Pod>::namespaced(client.clone(), namespace);
        let database_pods = pods
            .list(&ListParams::default().labels(&format!(
                "{}={}",
                labels::COMPONENT,
                values::DATABASE_COMPONENT
            )))
            .await
            .with_context(|_| error::ListPodsSnafu { namespace: namespace.to_string() })?;
        let database_pod = select_database_pod(&database_pods.items, &instance_name)
            .map(ResourceExt::name_any)
            .with_context(|| error::NoDatabasePodSnafu {
                namespace: namespace.to_string(),
                instance_name: instance_name.clone(),
            })?;
        let _pod = pods.await_running_status(&database_pod, namespace, timeout).await?;

        let secrets = Api::<Secret>::namespaced(client, namespace);
        let secret_name = DatabaseConfiguration::secret_name(&instance_name);
        let secret = secrets.get(&secret_name).await.with_context(|_| error::GetSecretSnafu {
            namespace: namespace.to_string(),
            secret_name: secret_name.clone(),
        })?;
        let database = DatabaseConfiguration::try_from(&secret)?;

        tracing::info!(
            "Found AWX instance {instance_name} in namespace {namespace}, database pod \
             {database_pod}"
        );

        Ok(Self {
            namespace: namespace.to_string(),
            instance_name,
            database_pod,
            database,
            pods,
            secrets,
        })
    }

    pub fn instance_name(&self) -> &str { &self.instance_name }

    /// Writes the backup archive `<output_dir>/<name>.tar` and returns its
    /// path.
    ///
    /// # Errors
    ///
    /// Fails before touching the database when `name` is invalid or the
    /// archive already exists. A failing `pg_dump` is reported with its
    /// stderr logged at warn level; no archive is left behind.
    pub async fn backup(&self, name: &str, output_dir: &Path) -> Result<PathBuf, Error> {
        let destination = archive::archive_path(output_dir, name)?;
        if destination.try_exists().unwrap_or(false) {
            return Err(archive::Error::ArchiveExists { path: destination }.into());
        }

        let staging = Staging::new(output_dir, name)?;
        self.dump_database(&staging.dump_path()).await?;

        let secrets = self
            .secrets
            .list(&ListParams::default())
            .await
            .with_context(|_| error::ListSecretsSnafu { namespace: self.namespace.clone() })?;
        for secret in secrets.items.iter().filter(|secret| is_backed_up(secret)) {
            let path = staging.write_secret(secret)?;
            tracing::debug!("Saved secret {} to {}", secret.name_any(), path.display());
        }

        let archive_path = destination.clone();
        tokio::task::spawn_blocking(move || staging.pack(&archive_path))
            .await
            .context(error::JoinBlockingTaskSnafu)??;

        tracing::info!("Backup of {} written to {}", self.instance_name, destination.display());
        Ok(destination)
    }

    /// Restores every entry of the archive at `path`, in archive order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing entry. The database is dropped before it
    /// is recreated, so a failing `pg_restore` leaves it empty.
    pub async fn restore(&self, path: &Path) -> Result<(), Error> {
        let archive_path = path.to_path_buf();
        let entries = tokio::task::spawn_blocking(move || archive::open(&archive_path))
            .await
            .context(error::JoinBlockingTaskSnafu)??;

        for entry in entries {
            match entry {
                BackupEntry::Dump { path, data } => {
                    tracing::info!("Restoring database {} from {}", self.database.database, path.display());
                    self.recreate_database(&data).await?;
                }
                BackupEntry::Secret { secret, .. } => self.recreate_secret(&secret).await?,
                BackupEntry::Unknown { path } => {
                    eprintln!("Unknown backup file {}", path.display());
                }
            }
        }

        Ok(())
    }

    async fn dump_database(&self, path: &Path) -> Result<(), Error> {
        let file = tokio::fs::File::create(path)
            .await
            .with_context(|_| error::CreateDumpFileSnafu { path: path.to_path_buf() })?;

        let progress = ByteProgressBar::new("Dumping database", "Database dump completed");
        let mut writer = progress.wrap_async_write(BufWriter::new(file));
        let mut stderr = Vec::new();
        let command = self.database.command("pg_dump", ["-Fc", self.database.database.as_str()]);
        let result = self
            .pods
            .exec_streaming(&self.database_pod, command, None::<&[u8]>, &mut writer, &mut stderr)
            .await;
        for line in remote_messages(&stderr) {
            tracing::warn!("pg_dump: {line}");
        }
        result?;
        progress.finish();

        Ok(())
    }

    async fn recreate_database(&self, dump: &[u8]) -> Result<(), Error> {
        let DatabaseConfiguration { username, database, .. } = &self.database;

        // `--force` disconnects the clients AWX still has open
        self.exec_database(
            self.database.command("dropdb", ["--force", "--if-exists", database.as_str()]),
            None::<&[u8]>,
        )
        .await?;
        self.exec_database(
            self.database.command("createdb", [format!("--owner={username}"), database.clone()]),
            None::<&[u8]>,
        )
        .await?;

        let progress = ByteProgressBar::new("Restoring database", "Database restored");
        progress.set_length(u64::try_from(dump.len()).unwrap_or(u64::MAX));
        self.exec_database(
            self.database.command("pg_restore", ["-d", database.as_str(), "-x", "-1", "--verbose"]),
            Some(progress.wrap_async_read(dump)),
        )
        .await?;
        progress.finish();
        Ok(())
    }

    async fn exec_database<I>(&self, command: RemoteCommand, stdin: Option<I>) -> Result<(), Error>
    where
        I: AsyncRead + Unpin,
    {
        self.pods
            .exec_streaming(
                &self.database_pod,
                command,
                stdin,
                &mut tokio::io::stdout(),
                &mut tokio::io::stderr(),
            )
            .await
            .map_err(Error::from)
    }

    async fn recreate_secret(&self, archived: &Secret) -> Result<(), Error> {
        let Some(secret_name) = restored_secret_name(archived, &self.instance_name) else {
            tracing::debug!(
                "Skipping secret {} without {} label",
                archived.name_any(),
                labels::PART_OF
            );
            return Ok(());
        };

        let current = self.secrets.get(&secret_name).await.with_context(|_| {
            error::GetSecretSnafu {
                namespace: self.namespace.clone(),
                secret_name: secret_name.clone(),
            }
        })?;
        let _secret = self
            .secrets
            .replace(&secret_name, &PostParams::default(), &merge_secret(current, archived))
            .await
            .with_context(|_| error::ReplaceSecretSnafu {
                namespace: self.namespace.clone(),
                secret_name: secret_name.clone(),
            })?;

        tracing::info!("Restored secret {secret_name}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    use super::*;

    fn database_pod(name: &str, part_of: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(BTreeMap::from([
                    (labels::COMPONENT.to_string(), values::DATABASE_COMPONENT.to_string()),
                    (labels::PART_OF.to_string(), part_of.to_string()),
                ])),
                ..ObjectMeta::default()
            },
            ..Pod::default()
        }
    }

    #[test]
    fn test_select_database_pod_prefers_instance() {
        let pods = vec![
            database_pod("awx-other-postgres-15-0", "awx-other"),
            database_pod("awx-demo-postgres-15-0", "awx-demo"),
        ];
        let pod = select_database_pod(&pods, "awx-demo").unwrap();
        assert_eq!(pod.name_any(), "awx-demo-postgres-15-0");
    }

    #[test]
    fn test_remote_messages() {
        let stderr = b"pg_dump: warning: there are circular foreign-key constraints\n\n  \r\n\
                       pg_dump: detail: table awx.main_job\n";
        assert_eq!(
            remote_messages(stderr),
            [
                "pg_dump: warning: there are circular foreign-key constraints",
                "pg_dump: detail: table awx.main_job"
            ]
        );
        assert!(remote_messages(b"").is_empty());
        assert_eq!(remote_messages(b"caf\xc3\xa9 \xff"), ["caf\u{e9} \u{fffd}"]);
    }

    #[test]
    fn test_select_database_pod_falls_back_to_first() {
        let pods = vec![database_pod("external-postgres-0", "external")];
        let pod = select_database_pod(&pods, "awx-demo").unwrap();
        assert_eq!(pod.name_any(), "external-postgres-0");

        assert!(select_database_pod(&[], "awx-demo").is_none());
    }
}
