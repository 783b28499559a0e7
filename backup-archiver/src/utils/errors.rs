//! Error types for the backup archiver.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid backup root {}: {reason}", path.display())]
    InvalidRoot { path: PathBuf, reason: String },

    #[error("Failed to list {} for prior archives: {source}", dir.display())]
    VersionScan {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Traversal error at {}: {reason}", path.display())]
    Traversal { path: PathBuf, reason: String },

    /// The container could not be completed. Whatever exists at `archive`
    /// is incomplete and must not be used as a backup.
    #[error("Archive write error ({}): {reason}", archive.display())]
    ArchiveWrite { archive: PathBuf, reason: String },

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackupError {
    /// True when the run got as far as writing the container and then failed.
    pub fn is_write_failure(&self) -> bool {
        matches!(self, BackupError::ArchiveWrite { .. })
    }

    pub(crate) fn archive_write(archive: &std::path::Path, reason: impl Into<String>) -> Self {
        BackupError::ArchiveWrite {
            archive: archive.to_path_buf(),
            reason: reason.into(),
        }
    }
}

impl From<::config::ConfigError> for BackupError {
    fn from(err: ::config::ConfigError) -> Self {
        BackupError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_failure_classification() {
        let err = BackupError::archive_write(std::path::Path::new("/tmp/a.zip"), "disk full");
        assert!(err.is_write_failure());

        let err = BackupError::Traversal {
            path: PathBuf::from("/tmp/data"),
            reason: "permission denied".to_string(),
        };
        assert!(!err.is_write_failure());
    }

    #[test]
    fn test_error_messages_name_the_archive() {
        let err = BackupError::archive_write(std::path::Path::new("/tmp/backup_v3.zip"), "boom");
        assert_eq!(err.to_string(), "Archive write error (/tmp/backup_v3.zip): boom");
    }
}
