use std::collections::BTreeMap;

use awxctl_base::consts;
use k8s_openapi::{ByteString, api::core::v1::Secret};
use kube::ResourceExt;
use snafu::{OptionExt, ResultExt};

use crate::{
    deployment::{Error, error},
    ext::RemoteCommand,
};

/// Connection settings from the `<instance>-postgres-configuration` secret.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfiguration {
    pub username: String,
    pub password: String,
    pub database: String,
    pub host: Option<String>,
    pub port: Option<String>,
}

impl std::fmt::Debug for DatabaseConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfiguration")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl DatabaseConfiguration {
    pub fn secret_name(instance_name: &str) -> String {
        format!("{instance_name}-{}", consts::POSTGRES_CONFIGURATION_SUFFIX)
    }

    /// The command line for `program` in the database container.
    ///
    /// The tools always connect through `localhost` inside the pod, with the
    /// password handed over in `PGPASSWORD`.
    pub fn command<I, S>(&self, program: &str, args: I) -> RemoteCommand
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv = [
            "env".to_string(),
            format!("PGPASSWORD={}", self.password),
            program.to_string(),
            "-U".to_string(),
            self.username.clone(),
            "-h".to_string(),
            "localhost".to_string(),
        ]
        .into_iter()
        .chain(args.into_iter().map(Into::into))
        .collect();

        RemoteCommand {
            container: consts::DATABASE_CONTAINER.to_string(),
            program: program.to_string(),
            argv,
        }
    }
}

impl TryFrom<&Secret> for DatabaseConfiguration {
    type Error = Error;

    fn try_from(secret: &Secret) -> Result<Self, Self::Error> {
        let secret_name = secret.name_any();
        let empty = BTreeMap::new();
        let data = secret.data.as_ref().unwrap_or(&empty);

        let required = |key: &'static str| {
            data.get(key)
                .with_context(|| error::MissingSecretKeySnafu {
                    secret_name: secret_name.clone(),
                    key,
                })
                .and_then(|value| decode(&secret_name, key, value))
        };
        let optional = |key: &'static str| {
            data.get(key).map(|value| decode(&secret_name, key, value)).transpose()
        };

        Ok(Self {
            username: required("username")?,
            password: required("password")?,
            database: required("database")?,
            host: optional("host")?,
            port: optional("port")?,
        })
    }
}

fn decode(secret_name: &str, key: &'static str, value: &ByteString) -> Result<String, Error> {
    String::from_utf8(value.0.clone())
        .with_context(|_| error::DecodeSecretValueSnafu { secret_name: secret_name.to_string(), key })
}
