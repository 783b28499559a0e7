//! Version resolution for the archives of a backup root.

use super::naming::ArchiveNaming;
use crate::utils::errors::{BackupError, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// An existing archive found directly under the backup root
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveInfo {
    pub path: PathBuf,
    pub name: String,
    /// None when the name carries no parseable version
    pub version: Option<u64>,
    pub size: u64,
}

/// List the archives directly under `dir` (non-recursive), ordered by
/// version. Archives without a parseable version sort first, by name.
pub fn list_archives(dir: &Path, naming: &ArchiveNaming) -> Result<Vec<ArchiveInfo>> {
    let scan_error = |source: std::io::Error| BackupError::VersionScan {
        dir: dir.to_path_buf(),
        source,
    };

    let mut archives = Vec::new();
    for entry in fs::read_dir(dir).map_err(scan_error)? {
        let entry = entry.map_err(scan_error)?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if !naming.is_archive_name(name) {
            continue;
        }

        // The entry may vanish between listing and stat; it still counts.
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        archives.push(ArchiveInfo {
            path: entry.path(),
            name: name.to_string(),
            version: naming.version_of(name),
            size,
        });
    }

    archives.sort_by(|a, b| a.version.cmp(&b.version).then_with(|| a.name.cmp(&b.name)));
    Ok(archives)
}

/// Next version to use under `dir`: highest existing version plus one,
/// or 1 when no archive carries a version.
pub fn resolve_next_version(dir: &Path, naming: &ArchiveNaming) -> Result<u64> {
    let highest = list_archives(dir, naming)?
        .iter()
        .filter_map(|archive| archive.version)
        .max()
        .unwrap_or(0);

    highest.checked_add(1).ok_or_else(|| BackupError::VersionScan {
        dir: dir.to_path_buf(),
        source: std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "archive version space exhausted",
        ),
    })
}
