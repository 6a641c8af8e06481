use awxctl_base::consts;
use clap::Args;
use k8s_openapi::api::core::v1::Secret;
use kube::Api;
use snafu::{OptionExt, ResultExt};
use tokio::io::AsyncWriteExt;

use crate::{
    cli::{
        error::{self, Error},
        internal::{ResolvedResources, ResourceResolver},
    },
    config::Config,
};

const PASSWORD_KEY: &str = "password";

#[derive(Args, Clone)]
pub struct AdminPasswordCommand {}

impl AdminPasswordCommand {
    /// Prints the password of the `admin` user the operator generated.
    pub async fn run(self, kube_client: kube::Client, config: Config) -> Result<(), Error> {
        let ResolvedResources { namespace, instance_name } =
            ResourceResolver::from((&kube_client, &config)).resolve().await?;
        let secret_name = admin_password_secret_name(&instance_name);

        let secret = Api::<Secret>::namespaced(kube_client, &namespace)
            .get(&secret_name)
            .await
            .with_context(|_| error::GetSecretSnafu {
                namespace: namespace.clone(),
                secret_name: secret_name.clone(),
            })?;
        let password = decode_password(&secret, &secret_name)?;

        let mut stdout = tokio::io::stdout();
        stdout.write_all(password.as_bytes()).await.context(error::WriteStdoutSnafu)?;
        stdout.write_u8(b'\n').await.context(error::WriteStdoutSnafu)
    }
}

fn admin_password_secret_name(instance_name: &str) -> String {
    format!("{instance_name}-{}", consts::ADMIN_PASSWORD_SUFFIX)
}

fn decode_password(secret: &Secret, secret_name: &str) -> Result<String, Error> {
    let value = secret
        .data
        .as_ref()
        .and_then(|data| data.get(PASSWORD_KEY))
        .with_context(|| error::MissingPasswordSnafu { secret_name: secret_name.to_string() })?;
    String::from_utf8(value.0.clone())
        .with_context(|_| error::DecodePasswordSnafu { secret_name: secret_name.to_string() })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::ByteString;

    use super::*;

    #[test]
    fn test_secret_name() {
        assert_eq!(admin_password_secret_name("awx-demo"), "awx-demo-admin-password");
    }

    #[test]
    fn test_decode_password() {
        let secret = Secret {
            data: Some(BTreeMap::from([(
                PASSWORD_KEY.to_string(),
                ByteString(b"Q8xXk2pLv0".to_vec()),
            )])),
            ..Secret::default()
        };
        assert_eq!(decode_password(&secret, "awx-demo-admin-password").unwrap(), "Q8xXk2pLv0");
    }

    #[test]
    fn test_missing_password() {
        let err = decode_password(&Secret::default(), "awx-demo-admin-password").unwrap_err();
        assert!(matches!(err, Error::MissingPassword { .. }));
    }
}
