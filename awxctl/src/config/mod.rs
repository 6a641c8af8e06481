mod error;
mod log;
mod port_forward;

use std::path::{Path, PathBuf};

use awxctl_base::consts;
use resolve_path::PathResolveExt;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

pub use self::{error::Error, log::LogConfig, port_forward::PortForwardConfig};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Name of the `AWX` object to operate on. The first one found in the
    /// namespace is used when unset.
    #[serde(default)]
    pub instance: Option<String>,

    #[serde(default = "default_operator_deployment")]
    pub operator_deployment: String,

    #[serde(default = "default_operator_container")]
    pub operator_container: String,

    #[serde(default)]
    pub port_forward: PortForwardConfig,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    #[serde(default)]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            instance: None,
            operator_deployment: default_operator_deployment(),
            operator_container: default_operator_container(),
            port_forward: PortForwardConfig::default(),
            timeout_seconds: default_timeout_seconds(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    pub fn search_config_file_path() -> PathBuf {
        let paths = vec![Self::default_path()]
            .into_iter()
            .chain(awxctl_base::fallback_project_config_directories().into_iter().map(
                |mut path| {
                    path.push(awxctl_base::CLI_CONFIG_NAME);
                    path
                },
            ))
            .collect::<Vec<_>>();
        for path in paths {
            let Ok(exists) = path.try_exists() else {
                continue;
            };
            if exists {
                return path;
            }
        }
        Self::default_path()
    }

    #[inline]
    pub fn default_path() -> PathBuf {
        [awxctl_base::PROJECT_CONFIG_DIR.to_path_buf(), PathBuf::from(awxctl_base::CLI_CONFIG_NAME)]
            .into_iter()
            .collect()
    }

    /// Loads the configuration found by [`Config::search_config_file_path`],
    /// or the defaults when no configuration file exists.
    pub fn load_or_default() -> Result<Self, Error> {
        let path = Self::search_config_file_path();
        match path.try_exists() {
            Ok(true) => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path
            .as_ref()
            .try_resolve()
            .map(|path| path.to_path_buf())
            .with_context(|_| error::ResolveFilePathSnafu { file_path: path.as_ref().to_path_buf() })?;
        let data = std::fs::read(&path).context(error::OpenConfigSnafu { filename: path.clone() })?;
        Self::from_yaml_slice(&data, &path)
    }

    fn from_yaml_slice(data: &[u8], path: &Path) -> Result<Self, Error> {
        let mut config: Self = serde_yaml::from_slice(data)
            .context(error::ParseConfigSnafu { filename: path.to_path_buf() })?;

        config.log.file_path = match config.log.file_path.map(|path| {
            path.try_resolve()
                .map(|path| path.to_path_buf())
                .with_context(|_| error::ResolveFilePathSnafu { file_path: path.clone() })
        }) {
            Some(Ok(path)) => Some(path),
            Some(Err(err)) => return Err(err),
            None => None,
        };

        Ok(config)
    }

    pub fn template_basic() -> Vec<u8> {
        serde_yaml::to_string(&Self::default()).unwrap_or_default().into_bytes()
    }
}

fn default_namespace() -> String { consts::DEFAULT_NAMESPACE.to_string() }

fn default_operator_deployment() -> String { consts::DEFAULT_OPERATOR_DEPLOYMENT.to_string() }

fn default_operator_container() -> String { consts::DEFAULT_OPERATOR_CONTAINER.to_string() }

const fn default_timeout_seconds() -> u64 { 30 }

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = Config::from_yaml_slice(b"{}", Path::new("config.yaml")).unwrap();

        assert_eq!(config.namespace, "awx");
        assert_eq!(config.instance, None);
        assert_eq!(config.operator_deployment, "awx-operator-controller-manager");
        assert_eq!(config.operator_container, "awx-manager");
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.port_forward.local_port, 8080);
        assert_eq!(config.port_forward.service_port, 80);
        assert_eq!(config.port_forward.address, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }

    #[test]
    fn test_parse_overrides() {
        let yaml = br"
namespace: ops
instance: awx-prod
timeoutSeconds: 5
portForward:
  address: 127.0.0.1
  localPort: 9000
log:
  level: debug
  emitStderr: false
";
        let config = Config::from_yaml_slice(yaml, Path::new("config.yaml")).unwrap();

        assert_eq!(config.namespace, "ops");
        assert_eq!(config.instance.as_deref(), Some("awx-prod"));
        assert_eq!(config.timeout_seconds, 5);
        assert_eq!(config.port_forward.address, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.port_forward.local_port, 9000);
        assert_eq!(config.port_forward.service_port, 80);
        assert_eq!(config.log.level, tracing::Level::DEBUG);
        assert!(!config.log.emit_stderr);
    }

    #[test]
    fn test_invalid_yaml_is_reported_with_filename() {
        let err = Config::from_yaml_slice(b"namespace: [", Path::new("broken.yaml")).unwrap_err();
        assert!(matches!(err, Error::ParseConfig { .. }));
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_template_basic_round_trips() {
        let template = Config::template_basic();
        let config = Config::from_yaml_slice(&template, Path::new("template.yaml")).unwrap();
        assert_eq!(config.namespace, Config::default().namespace);
        assert_eq!(config.operator_container, Config::default().operator_container);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, Error::OpenConfig { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "namespace: tower\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.namespace, "tower");
    }
}
