//! The `awxctl` command line.
//!
//! ```bash
//! # Back up the AWX instance in namespace `awx` into ./2026-10-18.tar
//! awxctl backup
//!
//! # Restore it, possibly into a freshly deployed instance
//! awxctl restore 2026-10-18
//!
//! # Reach the web UI on port 8080 of this host
//! awxctl port-forward
//! ```

mod admin_password;
mod backup;
pub mod error;
mod internal;
mod logs;
mod port_forward;
mod restore;
mod status;
mod teardown;

use std::{io::Write, path::PathBuf};

use awxctl_base::CLI_PROGRAM_NAME;
use clap::{CommandFactory, Parser, Subcommand};
use snafu::ResultExt;
use tokio::runtime::Runtime;

pub use self::error::Error;
use self::{
    admin_password::AdminPasswordCommand, backup::BackupCommand, logs::LogsCommand,
    port_forward::PortForwardCommand, restore::RestoreCommand, status::StatusCommand,
    teardown::TeardownCommand,
};
use crate::config::Config;

#[derive(Parser)]
#[command(
    name = CLI_PROGRAM_NAME,
    author,
    version,
    about = "Back up, restore and operate AWX instances deployed by the AWX Operator.",
    color = clap::ColorChoice::Auto
)]
pub struct Cli {
    #[clap(subcommand)]
    commands: Option<Commands>,

    #[clap(
        long = "config",
        short = 'c',
        env = "AWXCTL_CONFIG_FILE_PATH",
        global = true,
        help = "Specify a configuration file. Defaults to ~/.config/awxctl/config.yaml or \
                AWXCTL_CONFIG_FILE_PATH env var."
    )]
    config_file: Option<PathBuf>,

    #[clap(
        long = "log-level",
        env = "AWXCTL_LOG_LEVEL",
        global = true,
        help = "Set the logging level (e.g., info, debug, trace)."
    )]
    log_level: Option<tracing::Level>,

    #[clap(
        long = "namespace",
        short = 'n',
        env = "AWXCTL_NAMESPACE",
        global = true,
        help = "Namespace the AWX instance is deployed in. Defaults to `awx`."
    )]
    namespace: Option<String>,

    #[clap(
        long = "instance",
        short = 'i',
        env = "AWXCTL_INSTANCE",
        global = true,
        help = "Name of the AWX instance. Defaults to the first one in the namespace."
    )]
    instance: Option<String>,
}

#[derive(Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Display client and server version information")]
    Version {
        #[clap(long = "client", help = "If true, shows client version only (no server required).")]
        client: bool,
    },

    #[command(about = "Generate shell completion script for the specified shell (bash, zsh, fish)")]
    Completions { shell: clap_complete::Shell },

    #[command(about = "Output the default configuration in YAML format")]
    DefaultConfig,

    #[command(about = "Back up the AWX database and secrets into a tar archive")]
    Backup(BackupCommand),

    #[command(about = "Restore the AWX database and secrets from a tar archive")]
    Restore(RestoreCommand),

    #[command(alias = "s", about = "Show AWX instances, pods and services")]
    Status(StatusCommand),

    #[command(about = "Stream the log of the AWX Operator")]
    Logs(LogsCommand),

    #[command(about = "Print the password of the AWX admin user")]
    AdminPassword(AdminPasswordCommand),

    #[command(aliases = ["pf"], about = "Forward a local port to the AWX web service")]
    PortForward(PortForwardCommand),

    #[command(about = "Delete the AWX instance and optionally its namespace")]
    Teardown(TeardownCommand),
}

impl Default for Cli {
    fn default() -> Self { Self::parse() }
}

impl Cli {
    /// Loads the configuration file, then applies the global flags on top.
    /// Without `--config` a missing file means the defaults.
    fn load_config(&self) -> Result<Config, Error> {
        let mut config = match &self.config_file {
            Some(path) => Config::load(path)?,
            None => Config::load_or_default()?,
        };

        if let Some(log_level) = self.log_level {
            config.log.level = log_level;
        }
        if let Some(namespace) = self.namespace.clone().filter(|s| !s.is_empty()) {
            config.namespace = namespace;
        }
        if let Some(instance) = self.instance.clone().filter(|s| !s.is_empty()) {
            config.instance = Some(instance);
        }

        Ok(config)
    }

    /// Runs the parsed command and returns the process exit code.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration, the Kubernetes client or the
    /// command itself fails.
    pub fn run(self) -> Result<i32, Error> {
        let client_version = format!("v{}", *awxctl_base::PROJECT_SEMVER);
        match self.commands {
            Some(Commands::Version { client }) if client => {
                let info = format!(
                    "{}Client Version: {client_version}\n",
                    Self::command().render_long_version()
                );
                std::io::stdout().write_all(info.as_bytes()).context(error::WriteStdoutSnafu)?;
                return Ok(0);
            }
            Some(Commands::Completions { shell }) => {
                let mut app = Self::command();
                let bin_name = app.get_name().to_string();
                clap_complete::generate(shell, &mut app, bin_name, &mut std::io::stdout());
                return Ok(0);
            }
            Some(Commands::DefaultConfig) => {
                std::io::stdout()
                    .write_all(Config::template_basic().as_slice())
                    .context(error::WriteStdoutSnafu)?;
                return Ok(0);
            }
            None => {
                let help = Self::command().render_long_help().ansi().to_string();
                std::io::stderr().write_all(help.as_bytes()).context(error::WriteStdoutSnafu)?;
                return Ok(2);
            }
            _ => {}
        }

        let config = self.load_config()?;
        config.log.registry();

        let fut = async move {
            let kube_client = kube::Client::try_default().await.context(error::KubeConfigSnafu)?;
            match self.commands {
                Some(Commands::Version { .. }) => {
                    let server_version = kube_client.apiserver_version().await.map_or_else(
                        |_| "unknown".to_string(),
                        |info| format!("{}.{}", info.major, info.minor),
                    );
                    let info = format!(
                        "{}Client Version: {client_version}\nServer Version: {server_version}\n",
                        Self::command().render_long_version()
                    );
                    std::io::stdout().write_all(info.as_bytes()).context(error::WriteStdoutSnafu)?;
                }
                Some(Commands::Backup(cmd)) => cmd.run(kube_client, config).await?,
                Some(Commands::Restore(cmd)) => cmd.run(kube_client, config).await?,
                Some(Commands::Status(cmd)) => cmd.run(kube_client, config).await?,
                Some(Commands::Logs(cmd)) => cmd.run(kube_client, config).await?,
                Some(Commands::AdminPassword(cmd)) => cmd.run(kube_client, config).await?,
                Some(Commands::PortForward(cmd)) => cmd.run(kube_client, config).await?,
                Some(Commands::Teardown(cmd)) => cmd.run(kube_client, config).await?,
                Some(Commands::Completions { .. } | Commands::DefaultConfig) | None => {}
            }

            Ok(0)
        };

        Runtime::new().context(error::InitializeTokioRuntimeSnafu)?.block_on(fut)
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once(CLI_PROGRAM_NAME).chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_command_definition() { Cli::command().debug_assert(); }

    #[test]
    fn test_backup_arguments() {
        let cli = parse(&["backup", "nightly", "-o", "/var/backups", "-n", "awx-prod"]);
        assert_eq!(cli.namespace.as_deref(), Some("awx-prod"));
        match cli.commands {
            Some(Commands::Backup(BackupCommand { name, output_dir })) => {
                assert_eq!(name.as_deref(), Some("nightly"));
                assert_eq!(output_dir, PathBuf::from("/var/backups"));
            }
            _ => panic!("expected the backup command"),
        }
    }

    #[test]
    fn test_backup_defaults() {
        match parse(&["backup"]).commands {
            Some(Commands::Backup(BackupCommand { name, output_dir })) => {
                assert_eq!(name, None);
                assert_eq!(output_dir, PathBuf::from("."));
            }
            _ => panic!("expected the backup command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["restore", "2026-10-18", "--instance", "awx-demo", "--log-level", "debug"]);
        assert_eq!(cli.instance.as_deref(), Some("awx-demo"));
        assert_eq!(cli.log_level, Some(tracing::Level::DEBUG));
        assert!(matches!(
            cli.commands,
            Some(Commands::Restore(RestoreCommand { name: Some(name) })) if name == "2026-10-18"
        ));
    }

    #[test]
    fn test_logs_arguments() {
        match parse(&["logs", "--no-follow", "--tail", "100"]).commands {
            Some(Commands::Logs(LogsCommand { no_follow, tail })) => {
                assert!(no_follow);
                assert_eq!(tail, Some(100));
            }
            _ => panic!("expected the logs command"),
        }
    }

    #[test]
    fn test_port_forward_arguments() {
        match parse(&["pf", "--address", "127.0.0.1", "--local-port", "9090"]).commands {
            Some(Commands::PortForward(PortForwardCommand { address, local_port, service_port })) => {
                assert_eq!(address, Some(IpAddr::V4(Ipv4Addr::LOCALHOST)));
                assert_eq!(local_port, Some(9090));
                assert_eq!(service_port, None);
            }
            _ => panic!("expected the port-forward command"),
        }
    }

    #[test]
    fn test_teardown_and_status_flags() {
        assert!(matches!(
            parse(&["teardown", "--delete-namespace"]).commands,
            Some(Commands::Teardown(TeardownCommand { delete_namespace: true }))
        ));
        assert!(matches!(
            parse(&["status", "--all"]).commands,
            Some(Commands::Status(StatusCommand { all: true }))
        ));
    }

    #[test]
    fn test_flags_override_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "namespace: awx\ninstance: awx-demo\n").unwrap();

        let path = path.to_string_lossy().into_owned();
        let cli = parse(&["-c", &path, "-n", "awx-prod", "--log-level", "trace", "status"]);
        let config = cli.load_config().unwrap();
        assert_eq!(config.namespace, "awx-prod");
        assert_eq!(config.instance.as_deref(), Some("awx-demo"));
        assert_eq!(config.log.level, tracing::Level::TRACE);
    }
}
