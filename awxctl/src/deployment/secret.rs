use awxctl_base::consts::{self, k8s::labels};
use k8s_openapi::api::core::v1::Secret;

/// Whether `secret` belongs in a backup. The database credentials are
/// managed by the operator for the live instance and never restored.
pub fn is_backed_up(secret: &Secret) -> bool {
    !secret.metadata.name.as_deref().unwrap_or_default().ends_with(consts::POSTGRES_CONFIGURATION_SUFFIX)
}

/// Name of the live secret an archived one restores into.
///
/// Operator-created secrets are named `<instance><suffix>` and labelled
/// `app.kubernetes.io/part-of=<instance>`. The archived instance prefix is
/// swapped for `instance_name`, so a backup taken from `awx-old` restores
/// into `awx-new`. Secrets without the label are not restored.
pub fn restored_secret_name(archived: &Secret, instance_name: &str) -> Option<String> {
    let archived_instance = archived
        .metadata
        .labels
        .as_ref()?
        .get(labels::PART_OF)
        .filter(|instance| !instance.is_empty())?;
    let archived_name = archived.metadata.name.as_deref()?;
    let suffix = archived_name.strip_prefix(archived_instance.as_str()).unwrap_or(archived_name);
    Some(format!("{instance_name}{suffix}"))
}

/// The live secret with its `data` swapped for the archived one.
///
/// Metadata (labels, owner references, `resourceVersion`) and the secret
/// type stay those of `current`, so the update is accepted by the API server
/// and the operator keeps owning the secret.
pub fn merge_secret(current: Secret, archived: &Secret) -> Secret {
    Secret { data: archived.data.clone(), ..current }
}
