use std::path::PathBuf;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("'{name}' does not name a backup file"))]
    InvalidBackupName { name: String },

    #[snafu(display("Backup archive {} already exists", path.display()))]
    ArchiveExists { path: PathBuf },

    #[snafu(display("Failed to create backup archive {}, error: {source}", path.display()))]
    CreateArchive { path: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to open backup archive {}, error: {source}", path.display()))]
    OpenArchive { path: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to read backup archive, error: {source}"))]
    ReadArchive { source: std::io::Error },

    #[snafu(display("Failed to read {} from backup archive, error: {source}", path.display()))]
    ReadEntry { path: PathBuf, source: std::io::Error },

    #[snafu(display("{} is not a valid secret, error: {source}", path.display()))]
    ParseSecret { path: PathBuf, source: serde_json::Error },

    #[snafu(display("Failed to create staging directory in {}, error: {source}", path.display()))]
    CreateStaging { path: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to write {}, error: {source}", path.display()))]
    WriteStagingFile { path: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to serialize secret {secret_name}, error: {source}"))]
    SerializeSecret { secret_name: String, source: serde_json::Error },

    #[snafu(display("Cannot back up a secret without a name"))]
    SecretWithoutName,
}
