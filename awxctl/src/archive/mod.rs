//! Backup archive layout.
//!
//! A backup named `NAME` is an uncompressed tar file `NAME.tar` holding a
//! single directory `NAME/` with
//!
//! * `backup.dump`, the custom-format `pg_dump` of the AWX database, and
//! * `<secret>_secret.json` for every secret of the instance, in the JSON
//!   form the Kubernetes API returns (data base64 encoded).

mod error;

use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use k8s_openapi::api::core::v1::Secret;
use snafu::{OptionExt, ResultExt};
use tempfile::TempDir;

pub use self::error::Error;

pub const DUMP_FILE_NAME: &str = "backup.dump";
pub const DUMP_FILE_EXTENSION: &str = ".dump";
pub const SECRET_FILE_SUFFIX: &str = "_secret.json";
pub const ARCHIVE_FILE_EXTENSION: &str = ".tar";

/// `NAME` as given on the command line, without a trailing `.tar`.
pub fn backup_name(name: &str) -> &str { name.strip_suffix(ARCHIVE_FILE_EXTENSION).unwrap_or(name) }

/// `NAME.tar`, leaving names that already carry the extension alone.
pub fn archive_file_name(name: &str) -> String {
    format!("{}{ARCHIVE_FILE_EXTENSION}", backup_name(name))
}

/// Splits `NAME` into the directory the archive goes to and the bare backup
/// name used inside it. `NAME` may carry directories relative to
/// `output_dir`, so `sub/nightly` is written as `<output_dir>/sub/nightly.tar`
/// holding `nightly/`.
///
/// # Errors
///
/// Returns `Error::InvalidBackupName` when `NAME` has no final file name
/// component, e.g. it is empty or ends in `.` or `..`.
pub fn locate(output_dir: &Path, name: &str) -> Result<(PathBuf, String), Error> {
    let path = Path::new(backup_name(name));
    let file_name = path
        .file_name()
        .and_then(|file_name| file_name.to_str())
        .with_context(|| error::InvalidBackupNameSnafu { name: name.to_string() })?
        .to_string();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => output_dir.join(parent),
        _ => output_dir.to_path_buf(),
    };
    Ok((dir, file_name))
}

/// Where the archive of backup `NAME` is written, see [`locate`].
///
/// # Errors
///
/// Same as [`locate`].
pub fn archive_path(output_dir: &Path, name: &str) -> Result<PathBuf, Error> {
    let (dir, name) = locate(output_dir, name)?;
    Ok(dir.join(archive_file_name(&name)))
}

/// Today's date in local time, `YYYY-MM-DD`.
pub fn default_backup_name() -> String { chrono::Local::now().format("%Y-%m-%d").to_string() }

/// Scratch directory collecting the files of a backup before they are packed.
///
/// It lives next to the final archive and is removed on drop, whether or not
/// packing succeeded.
pub struct Staging {
    dir: TempDir,
    name: String,
}

impl Staging {
    /// Creates the scratch directory next to [`archive_path`]`(output_dir,
    /// name)`.
    ///
    /// # Errors
    ///
    /// Fails when `name` is not a valid backup name or the directory cannot
    /// be created, e.g. because the target directory does not exist.
    pub fn new(output_dir: &Path, name: &str) -> Result<Self, Error> {
        let (parent, name) = locate(output_dir, name)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!(".{name}-"))
            .tempdir_in(&parent)
            .with_context(|_| error::CreateStagingSnafu { path: parent.clone() })?;
        Ok(Self { dir, name })
    }

    /// Where `pg_dump` output is written before packing.
    pub fn dump_path(&self) -> PathBuf { self.dir.path().join(DUMP_FILE_NAME) }

    /// Stores `secret` as `<name>_secret.json` and returns the file's path.
    ///
    /// # Errors
    ///
    /// Fails when the secret has no name or the file cannot be written.
    pub fn write_secret(&self, secret: &Secret) -> Result<PathBuf, Error> {
        let secret_name = secret.metadata.name.as_deref().context(error::SecretWithoutNameSnafu)?;
        let data = serde_json::to_vec_pretty(secret)
            .with_context(|_| error::SerializeSecretSnafu { secret_name: secret_name.to_string() })?;
        let path = self.dir.path().join(format!("{secret_name}{SECRET_FILE_SUFFIX}"));
        std::fs::write(&path, data).with_context(|_| error::WriteStagingFileSnafu { path: path.clone() })?;
        Ok(path)
    }

    /// Writes the staged files to `destination`, which must not exist yet.
    ///
    /// The dump goes first, followed by the secrets in name order, so a
    /// restore recreates the database before it touches any secret.
    ///
    /// # Errors
    ///
    /// * `Error::ArchiveExists` when `destination` is already there; it is
    ///   left untouched.
    /// * `Error::CreateArchive` on any I/O failure; the partial archive is
    ///   removed.
    pub fn pack(self, destination: &Path) -> Result<(), Error> {
        let file = match File::options().write(true).create_new(true).open(destination) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                return error::ArchiveExistsSnafu { path: destination.to_path_buf() }.fail();
            }
            Err(source) => {
                return Err(Error::CreateArchive { path: destination.to_path_buf(), source });
            }
        };

        let result = self.append_all(file);
        if result.is_err() {
            let _unused = std::fs::remove_file(destination);
        }
        result.with_context(|_| error::CreateArchiveSnafu { path: destination.to_path_buf() })
    }

    fn append_all(&self, file: File) -> std::io::Result<()> {
        let mut files = std::fs::read_dir(self.dir.path())?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        files.sort_by_key(|path| (!path.ends_with(DUMP_FILE_NAME), path.clone()));

        let mut builder = tar::Builder::new(file);
        builder.append_dir(&self.name, self.dir.path())?;
        for path in files {
            let Some(file_name) = path.file_name() else {
                continue;
            };
            builder.append_path_with_name(&path, Path::new(&self.name).join(file_name))?;
        }
        builder.into_inner()?.sync_all()
    }
}

/// A member of a backup archive.
#[derive(Debug)]
pub enum BackupEntry {
    Dump { path: PathBuf, data: Vec<u8> },
    Secret { path: PathBuf, secret: Box<Secret> },
    Unknown { path: PathBuf },
}

/// Reads the archive at `path`, see [`read_entries`].
///
/// # Errors
///
/// Returns `Error::OpenArchive` when the file cannot be opened, otherwise
/// the errors of [`read_entries`].
pub fn open(path: &Path) -> Result<Vec<BackupEntry>, Error> {
    let file = File::open(path).with_context(|_| error::OpenArchiveSnafu { path: path.to_path_buf() })?;
    read_entries(file)
}

/// Reads all non-directory members, in archive order.
///
/// Members ending in `.dump` are database dumps and members ending in
/// `_secret.json` are secrets; anything else is returned as
/// [`BackupEntry::Unknown`].
///
/// # Errors
///
/// Fails on a malformed tar stream or a secret file that is not a valid
/// `Secret` document.
pub fn read_entries<R: Read>(reader: R) -> Result<Vec<BackupEntry>, Error> {
    let mut archive = tar::Archive::new(reader);
    let mut entries = Vec::new();

    for entry in archive.entries().context(error::ReadArchiveSnafu)? {
        let mut entry = entry.context(error::ReadArchiveSnafu)?;
        if entry.header().entry_type().is_dir() {
            continue;
        }
        let path = entry.path().context(error::ReadArchiveSnafu)?.into_owned();
        let member_name = path.to_string_lossy().into_owned();

        if member_name.ends_with(DUMP_FILE_EXTENSION) {
            let mut data = Vec::new();
            let _size = entry
                .read_to_end(&mut data)
                .with_context(|_| error::ReadEntrySnafu { path: path.clone() })?;
            entries.push(BackupEntry::Dump { path, data });
        } else if member_name.ends_with(SECRET_FILE_SUFFIX) {
            let secret = serde_json::from_reader::<_, Secret>(&mut entry)
                .with_context(|_| error::ParseSecretSnafu { path: path.clone() })?;
            entries.push(BackupEntry::Secret { path, secret: Box::new(secret) });
        } else {
            entries.push(BackupEntry::Unknown { path });
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::{ByteString, apimachinery::pkg::apis::meta::v1::ObjectMeta};

    use super::*;

    fn secret(name: &str, password: &str) -> Secret {
        Secret {
            metadata: ObjectMeta { name: Some(name.to_string()), ..ObjectMeta::default() },
            data: Some(BTreeMap::from([(
                "password".to_string(),
                ByteString(password.as_bytes().to_vec()),
            )])),
            ..Secret::default()
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(backup_name("2026-10-18"), "2026-10-18");
        assert_eq!(backup_name("2026-10-18.tar"), "2026-10-18");
        assert_eq!(archive_file_name("nightly"), "nightly.tar");
        assert_eq!(archive_file_name("nightly.tar"), "nightly.tar");
    }

    #[test]
    fn test_default_backup_name_is_a_date() {
        let name = default_backup_name();
        assert!(chrono::NaiveDate::parse_from_str(&name, "%Y-%m-%d").is_ok(), "{name}");
    }

    #[test]
    fn test_pack_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Staging::new(dir.path(), "nightly").unwrap();
        std::fs::write(staging.dump_path(), b"PGDMP custom dump").unwrap();
        let _path = staging.write_secret(&secret("awx-demo-secret-key", "s3cr3t")).unwrap();
        let _path = staging.write_secret(&secret("awx-demo-admin-password", "admin")).unwrap();

        let destination = dir.path().join(archive_file_name("nightly"));
        staging.pack(&destination).unwrap();

        let entries = open(&destination).unwrap();
        assert_eq!(entries.len(), 3);
        match &entries[0] {
            BackupEntry::Dump { path, data } => {
                assert_eq!(path, Path::new("nightly/backup.dump"));
                assert_eq!(data.as_slice(), b"PGDMP custom dump");
            }
            other => panic!("expected the dump first, got {other:?}"),
        }
        let secret_names = entries[1..]
            .iter()
            .map(|entry| match entry {
                BackupEntry::Secret { secret, .. } => secret.metadata.name.clone().unwrap(),
                other => panic!("expected a secret, got {other:?}"),
            })
            .collect::<Vec<_>>();
        assert_eq!(secret_names, ["awx-demo-admin-password", "awx-demo-secret-key"]);

        match &entries[2] {
            BackupEntry::Secret { secret, .. } => {
                let password = &secret.data.as_ref().unwrap()["password"];
                assert_eq!(password.0, b"s3cr3t");
            }
            other => panic!("expected a secret, got {other:?}"),
        }
    }

    #[test]
    fn test_name_with_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let staging = Staging::new(dir.path(), "sub/nightly").unwrap();
        std::fs::write(staging.dump_path(), b"dump").unwrap();
        let destination = archive_path(dir.path(), "sub/nightly").unwrap();
        assert_eq!(destination, dir.path().join("sub").join("nightly.tar"));
        staging.pack(&destination).unwrap();

        let entries = open(&destination).unwrap();
        assert!(matches!(
            entries.as_slice(),
            [BackupEntry::Dump { path, .. }] if path == Path::new("nightly/backup.dump")
        ));
    }

    #[test]
    fn test_locate() {
        let output_dir = Path::new("/var/backups");
        assert_eq!(
            locate(output_dir, "nightly.tar").unwrap(),
            (PathBuf::from("/var/backups"), "nightly".to_string())
        );
        assert_eq!(
            locate(output_dir, "awx/2026-10-18").unwrap(),
            (PathBuf::from("/var/backups/awx"), "2026-10-18".to_string())
        );
        assert!(matches!(locate(output_dir, ""), Err(Error::InvalidBackupName { .. })));
        assert!(matches!(locate(output_dir, ".tar"), Err(Error::InvalidBackupName { .. })));
        assert!(matches!(locate(output_dir, "awx/.."), Err(Error::InvalidBackupName { .. })));
    }

    #[test]
    fn test_staging_directory_is_removed_after_pack() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Staging::new(dir.path(), "nightly").unwrap();
        std::fs::write(staging.dump_path(), b"dump").unwrap();
        staging.pack(&dir.path().join("nightly.tar")).unwrap();

        let remaining = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(remaining, ["nightly.tar"]);
    }

    #[test]
    fn test_pack_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("nightly.tar");
        std::fs::write(&destination, b"previous backup").unwrap();

        let staging = Staging::new(dir.path(), "nightly").unwrap();
        let err = staging.pack(&destination).unwrap_err();
        assert!(matches!(err, Error::ArchiveExists { .. }));
        assert_eq!(std::fs::read(&destination).unwrap(), b"previous backup");
    }

    #[test]
    fn test_unknown_members_are_reported() {
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(5);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, "nightly/notes.txt", &b"hello"[..]).unwrap();
        let data = builder.into_inner().unwrap();

        let entries = read_entries(data.as_slice()).unwrap();
        assert!(matches!(
            entries.as_slice(),
            [BackupEntry::Unknown { path }] if path == Path::new("nightly/notes.txt")
        ));
    }

    #[test]
    fn test_invalid_secret_is_an_error() {
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(8);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, "nightly/x_secret.json", &b"not json"[..]).unwrap();
        let data = builder.into_inner().unwrap();

        let err = read_entries(data.as_slice()).unwrap_err();
        assert!(matches!(err, Error::ParseSecret { .. }));
    }
}
