//! Logging configuration.
//!
//! Log records go through `tracing`; every enabled output gets its own
//! `tracing_subscriber` layer. Standard output is off by default because it
//! carries command results (tables, the admin password) that users pipe into
//! other programs.
use std::{fs::OpenOptions, path::PathBuf};

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use tracing_subscriber::{
    Layer, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt,
};

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// Append log records to this file as well.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Send records to the systemd journal.
    #[serde(default = "LogConfig::default_emit_journald")]
    pub emit_journald: bool,

    #[serde(default = "LogConfig::default_emit_stdout")]
    pub emit_stdout: bool,

    #[serde(default = "LogConfig::default_emit_stderr")]
    pub emit_stderr: bool,

    /// Records below this level are dropped.
    #[serde(default = "LogConfig::default_log_level")]
    #[serde_as(as = "DisplayFromStr")]
    pub level: tracing::Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file_path: None,
            emit_journald: Self::default_emit_journald(),
            emit_stdout: Self::default_emit_stdout(),
            emit_stderr: Self::default_emit_stderr(),
            level: Self::default_log_level(),
        }
    }
}

impl LogConfig {
    #[inline]
    #[must_use]
    pub const fn default_log_level() -> tracing::Level { tracing::Level::INFO }

    #[inline]
    #[must_use]
    pub const fn default_emit_journald() -> bool { false }

    #[inline]
    #[must_use]
    pub const fn default_emit_stdout() -> bool { false }

    #[inline]
    #[must_use]
    pub const fn default_emit_stderr() -> bool { true }

    /// Installs the global subscriber with one layer per enabled output,
    /// filtered at `level`.
    ///
    /// An output that cannot be opened is skipped silently, so a bad
    /// `filePath` never prevents a command from running.
    ///
    /// # Panics
    ///
    /// Panics when a global subscriber has already been installed, i.e.
    /// when called twice in one process.
    pub fn registry(&self) {
        let Self { emit_journald, file_path, emit_stdout, emit_stderr, level } = self;

        tracing_subscriber::registry()
            .with(tracing_subscriber::filter::LevelFilter::from_level(*level))
            .with(emit_journald.then(|| LogDriver::Journald.layer()))
            .with(file_path.clone().map(|path| LogDriver::File(path).layer()))
            .with(emit_stdout.then(|| LogDriver::Stdout.layer()))
            .with(emit_stderr.then(|| LogDriver::Stderr.layer()))
            .init();
    }
}

/// An output log records can be written to.
#[derive(Clone, Debug)]
enum LogDriver {
    /// Compact text on standard output.
    Stdout,
    /// Compact text on standard error.
    Stderr,
    /// Structured records sent to the local journald socket.
    Journald,
    /// Compact text without colors, appended to the file. The file is
    /// created when missing.
    File(PathBuf),
}

impl LogDriver {
    /// Builds the layer for this output.
    ///
    /// Returns `None` when the output is not available: the file cannot be
    /// opened for appending, or there is no journald socket. `Stdout` and
    /// `Stderr` always succeed.
    #[allow(clippy::type_repetition_in_bounds)]
    fn layer<S>(self) -> Option<Box<dyn Layer<S> + Send + Sync + 'static>>
    where
        S: tracing::Subscriber,
        for<'a> S: LookupSpan<'a>,
    {
        let fmt = tracing_subscriber::fmt::layer().compact().with_target(false);

        match self {
            Self::Stdout => Some(Box::new(fmt.with_writer(std::io::stdout))),
            Self::Stderr => Some(Box::new(fmt.with_writer(std::io::stderr))),
            Self::File(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path).ok()?;
                Some(Box::new(fmt.with_ansi(false).with_writer(file)))
            }
            Self::Journald => Some(Box::new(tracing_journald::layer().ok()?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_keep_stdout_free() {
        let config = LogConfig::default();
        assert_eq!(config.level, tracing::Level::INFO);
        assert!(config.emit_stderr);
        assert!(!config.emit_stdout);
        assert!(!config.emit_journald);
        assert!(config.file_path.is_none());
    }

    #[test]
    fn test_unavailable_file_has_no_layer() {
        let dir = tempfile::tempdir().unwrap();

        let path = dir.path().join("awxctl.log");
        assert!(LogDriver::File(path.clone()).layer::<tracing_subscriber::Registry>().is_some());
        assert!(path.exists());

        let missing_parent = dir.path().join("missing").join("awxctl.log");
        assert!(LogDriver::File(missing_parent).layer::<tracing_subscriber::Registry>().is_none());
        assert!(LogDriver::Stderr.layer::<tracing_subscriber::Registry>().is_some());
    }

    #[test]
    fn test_level_is_parsed_case_insensitively() {
        let config: LogConfig = serde_yaml::from_str("level: warn").unwrap();
        assert_eq!(config.level, tracing::Level::WARN);

        let config: LogConfig = serde_yaml::from_str("level: TRACE").unwrap();
        assert_eq!(config.level, tracing::Level::TRACE);
    }
}
