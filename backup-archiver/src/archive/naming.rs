//! Archive naming: `<prefix><timestamp>_v<N>.<extension>`.
//!
//! The timestamp records creation time only. Ordering between archives of
//! the same root is carried entirely by the version number.

use crate::config::ArchiveConfig;
use crate::utils::errors::{BackupError, Result};
use chrono::{DateTime, TimeZone};
use regex::Regex;
use std::fmt::Write as _;
use std::sync::OnceLock;

static VERSION_PATTERN: OnceLock<Regex> = OnceLock::new();

fn version_pattern() -> &'static Regex {
    VERSION_PATTERN.get_or_init(|| Regex::new(r"_v(\d+)").expect("static version pattern"))
}

/// True if `name` contains a `_v<digits>` marker anywhere.
pub fn contains_version_marker(name: &str) -> bool {
    version_pattern().is_match(name)
}

/// Naming rules for the archives of one backup root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveNaming {
    prefix: String,
    suffix: String,
    timestamp_format: String,
}

impl Default for ArchiveNaming {
    fn default() -> Self {
        Self::from_config(&ArchiveConfig::default())
    }
}

impl ArchiveNaming {
    pub fn new(prefix: &str, extension: &str, timestamp_format: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            suffix: format!(".{}", extension),
            timestamp_format: timestamp_format.to_string(),
        }
    }

    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self::new(&config.prefix, &config.extension, &config.timestamp_format)
    }

    /// Archive-name predicate, purely name based.
    pub fn is_archive_name(&self, name: &str) -> bool {
        name.starts_with(&self.prefix) && name.ends_with(&self.suffix)
    }

    /// Version carried by an archive name.
    ///
    /// Only the first `_v<digits>` match counts; later ones (say, inside a
    /// project name) are ignored. Names that are not archives, carry no
    /// marker, or whose digits overflow yield None.
    pub fn version_of(&self, name: &str) -> Option<u64> {
        if !self.is_archive_name(name) {
            return None;
        }
        version_pattern()
            .captures(name)
            .and_then(|caps| caps.get(1))
            .and_then(|digits| digits.as_str().parse().ok())
    }

    /// Build the archive name for `version` created at `created_at`.
    ///
    /// An unrenderable timestamp format is a configuration error.
    pub fn archive_name<Tz>(&self, version: u64, created_at: &DateTime<Tz>) -> Result<String>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let mut name = String::with_capacity(self.prefix.len() + self.suffix.len() + 24);
        write!(
            name,
            "{}{}_v{}{}",
            self.prefix,
            created_at.format(&self.timestamp_format),
            version,
            self.suffix
        )
        .map_err(|_| {
            BackupError::Config(format!(
                "invalid archive timestamp format: {:?}",
                self.timestamp_format
            ))
        })?;
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, Utc};

    #[test]
    fn test_predicate() {
        let naming = ArchiveNaming::default();
        assert!(naming.is_archive_name("backup_2024.01.01_10.00_v1.zip"));
        assert!(naming.is_archive_name("backup_.zip"));
        assert!(!naming.is_archive_name("backup_2024.01.01_10.00_v1.tar"));
        assert!(!naming.is_archive_name("old_backup_v1.zip"));
        assert!(!naming.is_archive_name("Backup_v1.zip"));
    }

    #[test]
    fn test_version_extraction() {
        let naming = ArchiveNaming::default();
        assert_eq!(naming.version_of("backup_2024.01.01_10.00_v1.zip"), Some(1));
        assert_eq!(naming.version_of("backup_2024.01.01_10.00_v42.zip"), Some(42));
        assert_eq!(naming.version_of("backup_manual_v10abc.zip"), Some(10));
        assert_eq!(naming.version_of("backup_2024.01.01_10.00.zip"), None);
        assert_eq!(naming.version_of("backup_v.zip"), None);
        assert_eq!(naming.version_of("notes_v9.zip"), None);
    }

    #[test]
    fn test_first_match_wins() {
        let naming = ArchiveNaming::default();
        assert_eq!(naming.version_of("backup_x_v3_project_v99.zip"), Some(3));
    }

    #[test]
    fn test_overflowing_version_is_skipped() {
        let naming = ArchiveNaming::default();
        assert_eq!(
            naming.version_of("backup_v99999999999999999999999.zip"),
            None
        );
    }

    #[test]
    fn test_archive_name_format() {
        let naming = ArchiveNaming::default();
        let created_at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 0).unwrap();
        let name = naming.archive_name(7, &created_at).unwrap();
        assert_eq!(name, "backup_2024.03.09_07.05_v7.zip");
        assert!(naming.is_archive_name(&name));
        assert_eq!(naming.version_of(&name), Some(7));
    }

    #[test]
    fn test_custom_naming() {
        let naming = ArchiveNaming::new("snap-", "tar.zip", "%Y%m%d");
        let name = naming.archive_name(2, &Local::now()).unwrap();
        assert!(name.starts_with("snap-"));
        assert!(name.ends_with("_v2.tar.zip"));
        assert_eq!(naming.version_of(&name), Some(2));
    }

    #[test]
    fn test_invalid_timestamp_format_is_config_error() {
        let naming = ArchiveNaming::new("backup_", "zip", "%Q");
        let result = naming.archive_name(1, &Local::now());
        assert!(matches!(result, Err(BackupError::Config(_))));
    }
}
