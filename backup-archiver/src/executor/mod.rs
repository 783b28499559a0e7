//! Backup orchestration - one run against one backup root.
//!
//! A run moves through `Idle -> Resolving -> Collecting -> Writing` and ends
//! in `Done` or `Failed`. There are no retries and no way back to an
//! earlier phase. The archive name is fixed before `Writing` starts.

use crate::archive::{resolve_next_version, ArchiveEntry, ArchiveNaming, ArchiveWriter};
use crate::config::Config;
use crate::fs::{FileCollector, RootLock, WalkOptions};
use crate::transfer::progress::{format_bytes, format_duration, format_speed, ArchiveProgress};
use crate::utils::errors::{BackupError, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, info_span, warn};
use uuid::Uuid;

/// Phase of a backup run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupPhase {
    Idle,
    Resolving,
    Collecting,
    Writing,
    Done,
    Failed,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct BackupOutcome {
    pub archive_path: PathBuf,
    pub version: u64,
    pub files_written: usize,
    pub bytes_written: u64,
    pub duration: Duration,
    /// Uncompressed bytes per second over the write
    pub average_speed: u64,
}

/// Runs backups of a directory into versioned archives inside it
pub struct BackupOrchestrator {
    naming: ArchiveNaming,
    walk: WalkOptions,
    writer: ArchiveWriter,
    lock_root: bool,
    phase: BackupPhase,
}

impl Default for BackupOrchestrator {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl BackupOrchestrator {
    pub fn new(naming: ArchiveNaming, walk: WalkOptions, writer: ArchiveWriter) -> Self {
        Self {
            naming,
            walk,
            writer,
            lock_root: true,
            phase: BackupPhase::Idle,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ArchiveNaming::from_config(&config.archive),
            WalkOptions {
                follow_links: config.walk.follow_links,
            },
            ArchiveWriter::from_config(&config.archive),
        )
        .with_lock(config.lock.enabled)
    }

    /// Enable or disable the exclusive lock on the backup root
    pub fn with_lock(mut self, enabled: bool) -> Self {
        self.lock_root = enabled;
        self
    }

    pub fn naming(&self) -> &ArchiveNaming {
        &self.naming
    }

    /// Phase of the current or most recent run
    pub fn phase(&self) -> BackupPhase {
        self.phase
    }

    /// Back up `root`, logging every archived file.
    pub fn run(&mut self, root: &Path) -> Result<BackupOutcome> {
        self.run_with_progress(root, log_progress)
    }

    /// Back up `root`, reporting each archived file to `on_progress`.
    pub fn run_with_progress<F>(&mut self, root: &Path, on_progress: F) -> Result<BackupOutcome>
    where
        F: FnMut(&ArchiveProgress<'_>),
    {
        self.run_at(root, Local::now(), on_progress)
    }

    /// Back up `root` with `created_at` as the archive timestamp.
    pub fn run_at<F>(
        &mut self,
        root: &Path,
        created_at: DateTime<Local>,
        on_progress: F,
    ) -> Result<BackupOutcome>
    where
        F: FnMut(&ArchiveProgress<'_>),
    {
        let run_id = Uuid::new_v4();
        let span = info_span!("backup", %run_id, root = %root.display());
        let _guard = span.enter();

        self.phase = BackupPhase::Idle;
        let result = self.execute(root, created_at, on_progress);

        match &result {
            Ok(outcome) => {
                self.phase = BackupPhase::Done;
                info!(
                    "Backup created: {} ({} files, {}, {}, {})",
                    outcome.archive_path.display(),
                    outcome.files_written,
                    format_bytes(outcome.bytes_written),
                    format_duration(outcome.duration),
                    format_speed(outcome.average_speed),
                );
            }
            Err(e) => {
                self.phase = BackupPhase::Failed;
                error!("Backup failed: {}", e);
                if e.is_write_failure() {
                    warn!("The incomplete archive was left in place; inspect or delete it manually");
                }
            }
        }

        result
    }

    fn execute<F>(
        &mut self,
        root: &Path,
        created_at: DateTime<Local>,
        on_progress: F,
    ) -> Result<BackupOutcome>
    where
        F: FnMut(&ArchiveProgress<'_>),
    {
        let root = canonical_root(root)?;
        let _lock = if self.lock_root {
            Some(RootLock::acquire(&root)?)
        } else {
            None
        };

        self.phase = BackupPhase::Resolving;
        let version = resolve_next_version(&root, &self.naming)?;
        info!("Next archive version: {}", version);
        let archive_path = root.join(self.naming.archive_name(version, &created_at)?);

        self.phase = BackupPhase::Collecting;
        let files = FileCollector::new(&root, self.naming.clone(), self.walk.clone()).collect()?;
        let entries = ArchiveEntry::from_files(&root, &files)?;

        info!(
            "Archiving {} files into {}",
            entries.len(),
            archive_path.display()
        );

        self.phase = BackupPhase::Writing;
        let summary = self.writer.write(&archive_path, &entries, on_progress)?;

        Ok(BackupOutcome {
            archive_path,
            version,
            files_written: summary.files_written,
            bytes_written: summary.bytes_written,
            duration: summary.duration,
            average_speed: summary.average_speed,
        })
    }
}

/// Default progress sink: one log line per archived file.
pub fn log_progress(progress: &ArchiveProgress<'_>) {
    info!(
        "[{}/{}] Archiving: {}",
        progress.files_written,
        progress.total_files,
        progress.entry.source.display()
    );
}

fn canonical_root(root: &Path) -> Result<PathBuf> {
    let canonical = root.canonicalize().map_err(|e| BackupError::InvalidRoot {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;

    if !canonical.is_dir() {
        return Err(BackupError::InvalidRoot {
            path: root.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    Ok(canonical)
}
