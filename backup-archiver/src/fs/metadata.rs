//! Source file metadata carried into archive entries.

use chrono::{DateTime, Local};
use std::fs;
use std::path::Path;

/// Metadata of a source file at the time it is archived
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// File size in bytes
    pub size: u64,

    /// Last modified time, if the platform reports one
    pub modified: Option<DateTime<Local>>,

    /// File permissions (Unix mode bits)
    pub permissions: Option<u32>,
}

impl FileMetadata {
    /// Extract metadata from an open file
    pub fn from_file(file: &fs::File) -> std::io::Result<Self> {
        Ok(Self::from_metadata(&file.metadata()?))
    }

    /// Extract metadata from a file path
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        Ok(Self::from_metadata(&fs::metadata(path)?))
    }

    fn from_metadata(metadata: &fs::Metadata) -> Self {
        let modified = metadata.modified().ok().map(DateTime::<Local>::from);

        #[cfg(unix)]
        let permissions = {
            use std::os::unix::fs::PermissionsExt;
            Some(metadata.permissions().mode())
        };

        #[cfg(not(unix))]
        let permissions = None;

        Self {
            size: metadata.len(),
            modified,
            permissions,
        }
    }

    /// Modification time as a zip timestamp. Zip cannot represent dates
    /// before 1980 or after 2107; those fall back to the zip epoch.
    pub fn zip_modified(&self) -> zip::DateTime {
        use chrono::{Datelike, Timelike};

        self.modified
            .and_then(|t| {
                let year = u16::try_from(t.year()).ok()?;
                zip::DateTime::from_date_and_time(
                    year,
                    t.month() as u8,
                    t.day() as u8,
                    t.hour() as u8,
                    t.minute() as u8,
                    t.second() as u8,
                )
                .ok()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_extract_metadata() -> std::io::Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        temp_file.write_all(b"test content")?;
        temp_file.flush()?;

        let metadata = FileMetadata::from_path(temp_file.path())?;

        assert_eq!(metadata.size, 12);
        assert!(metadata.modified.is_some());

        let stamp = metadata.zip_modified();
        assert!(stamp.year() >= 2020);

        Ok(())
    }

    #[test]
    fn test_pre_zip_epoch_falls_back() {
        let metadata = FileMetadata {
            size: 0,
            modified: Some(DateTime::<Local>::from(std::time::UNIX_EPOCH)),
            permissions: None,
        };
        assert_eq!(metadata.zip_modified(), zip::DateTime::default());
    }

    #[test]
    #[cfg(unix)]
    fn test_permissions_captured() -> std::io::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let temp_file = NamedTempFile::new()?;
        fs::set_permissions(temp_file.path(), fs::Permissions::from_mode(0o640))?;

        let metadata = FileMetadata::from_path(temp_file.path())?;

        assert!(metadata.permissions.is_some());
        assert_eq!(metadata.permissions.unwrap() & 0o777, 0o640);

        Ok(())
    }
}
