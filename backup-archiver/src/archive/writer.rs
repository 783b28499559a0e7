//! Streams a candidate file set into one zip container.
//!
//! Entries are written strictly one after another. The first failure of
//! any kind aborts the whole write; there is no per-file partial success.

use crate::config::{ArchiveConfig, Compression};
use crate::fs::metadata::FileMetadata;
use crate::transfer::progress::{ArchiveProgress, ProgressTracker};
use crate::utils::errors::{BackupError, Result};
use std::fs::File;
use std::io::{self, BufWriter, Seek, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Entries at or above this size need ZIP64 headers.
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// One file to archive: where it is read from and where it is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Absolute path of the source file
    pub source: PathBuf,

    /// Path inside the container, relative to the backup root, `/`-separated
    pub stored_path: String,
}

impl ArchiveEntry {
    /// Build an entry for `source`, which must lie under `root`.
    pub fn new(root: &Path, source: &Path) -> Result<Self> {
        let relative = source.strip_prefix(root).map_err(|_| BackupError::Traversal {
            path: source.to_path_buf(),
            reason: format!("not under backup root {}", root.display()),
        })?;

        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy()),
                Component::CurDir => {}
                _ => {
                    return Err(BackupError::Traversal {
                        path: source.to_path_buf(),
                        reason: "cannot be stored under a relative name".to_string(),
                    })
                }
            }
        }
        if parts.is_empty() {
            return Err(BackupError::Traversal {
                path: source.to_path_buf(),
                reason: "the backup root itself is not a file entry".to_string(),
            });
        }

        Ok(Self {
            source: source.to_path_buf(),
            stored_path: parts.join("/"),
        })
    }

    /// Build entries for every path in `files`, keeping their order.
    pub fn from_files(root: &Path, files: &[PathBuf]) -> Result<Vec<Self>> {
        files.iter().map(|file| Self::new(root, file)).collect()
    }
}

/// Totals of a completed write
#[derive(Debug, Clone)]
pub struct WriteSummary {
    pub files_written: usize,
    pub bytes_written: u64,
    pub duration: Duration,
    pub average_speed: u64,
}

/// Writes archive containers with a fixed compression setup
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    compression: Compression,
    compression_level: Option<i64>,
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new(Compression::Deflated, None)
    }
}

impl ArchiveWriter {
    pub fn new(compression: Compression, compression_level: Option<i64>) -> Self {
        Self {
            compression,
            compression_level,
        }
    }

    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self::new(config.compression, config.compression_level)
    }

    /// Write `entries` into a new container at `archive_path`.
    ///
    /// An existing file at `archive_path` is truncated. `on_progress` runs
    /// synchronously after each entry; a panic inside it is logged and
    /// swallowed. On error, whatever was written stays on disk and is not a
    /// usable backup.
    pub fn write<F>(
        &self,
        archive_path: &Path,
        entries: &[ArchiveEntry],
        mut on_progress: F,
    ) -> Result<WriteSummary>
    where
        F: FnMut(&ArchiveProgress<'_>),
    {
        let file = File::create(archive_path).map_err(|e| {
            BackupError::archive_write(archive_path, format!("cannot create container: {}", e))
        })?;
        let mut zip = ZipWriter::new(BufWriter::new(file));
        let mut tracker = ProgressTracker::new(entries.len());

        for entry in entries {
            let entry_bytes = self
                .write_entry(&mut zip, entry)
                .map_err(|reason| BackupError::archive_write(archive_path, reason))?;

            let progress = tracker.record(entry, entry_bytes);
            notify(&mut on_progress, &progress);
        }

        let buffered = zip.finish().map_err(|e| {
            BackupError::archive_write(archive_path, format!("cannot finalize container: {}", e))
        })?;
        let file = buffered.into_inner().map_err(|e| {
            BackupError::archive_write(archive_path, format!("cannot flush container: {}", e.error()))
        })?;
        file.sync_all().map_err(|e| {
            BackupError::archive_write(archive_path, format!("cannot sync container: {}", e))
        })?;

        Ok(WriteSummary {
            files_written: tracker.files_written(),
            bytes_written: tracker.bytes_written(),
            duration: tracker.elapsed(),
            average_speed: tracker.average_speed(),
        })
    }

    fn file_options(&self, metadata: &FileMetadata) -> SimpleFileOptions {
        let method = match self.compression {
            Compression::Stored => CompressionMethod::Stored,
            Compression::Deflated => CompressionMethod::Deflated,
            Compression::Zstd => CompressionMethod::Zstd,
        };

        let mut options = SimpleFileOptions::default()
            .compression_method(method)
            .compression_level(self.compression_level)
            .last_modified_time(metadata.zip_modified())
            .large_file(metadata.size >= ZIP64_THRESHOLD);

        if let Some(mode) = metadata.permissions {
            options = options.unix_permissions(mode);
        }
        options
    }

    /// Add one entry; returns the number of source bytes copied.
    fn write_entry<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        entry: &ArchiveEntry,
    ) -> std::result::Result<u64, String> {
        let mut source = File::open(&entry.source)
            .map_err(|e| format!("cannot open {}: {}", entry.source.display(), e))?;
        let metadata = FileMetadata::from_file(&source)
            .map_err(|e| format!("cannot stat {}: {}", entry.source.display(), e))?;

        zip.start_file(entry.stored_path.as_str(), self.file_options(&metadata))
            .map_err(|e| format!("cannot start entry {}: {}", entry.stored_path, e))?;

        let copied = io::copy(&mut source, zip)
            .map_err(|e| format!("cannot archive {}: {}", entry.source.display(), e))?;

        debug!("Added {} ({} bytes)", entry.stored_path, copied);
        Ok(copied)
    }
}

/// Deliver one progress snapshot; reporting can never abort the write.
fn notify<F>(on_progress: &mut F, progress: &ArchiveProgress<'_>)
where
    F: FnMut(&ArchiveProgress<'_>),
{
    if panic::catch_unwind(AssertUnwindSafe(|| on_progress(progress))).is_err() {
        warn!(
            "Progress reporting failed for {}; continuing",
            progress.entry.stored_path
        );
    }
}
