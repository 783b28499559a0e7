//! Per-entry progress for archive writes.
//!
//! The writer hands an [`ArchiveProgress`] to its observer after every
//! entry. Observers decide where it goes (log, terminal, nowhere).

use crate::archive::writer::ArchiveEntry;
use std::time::{Duration, Instant};

/// Progress after one entry has been added to the container
#[derive(Debug, Clone, Copy)]
pub struct ArchiveProgress<'a> {
    /// Entry that was just written
    pub entry: &'a ArchiveEntry,

    /// Uncompressed bytes of this entry
    pub entry_bytes: u64,

    /// Number of entries written so far, this one included
    pub files_written: usize,

    /// Number of entries in the run
    pub total_files: usize,

    /// Uncompressed bytes written so far
    pub bytes_written: u64,
}

impl ArchiveProgress<'_> {
    /// Percentage of entries written (0-100)
    pub fn percent_complete(&self) -> f64 {
        if self.total_files > 0 {
            (self.files_written as f64 / self.total_files as f64) * 100.0
        } else {
            100.0
        }
    }

    /// Check if every entry has been written
    pub fn is_complete(&self) -> bool {
        self.files_written >= self.total_files
    }
}

/// Running totals for one archive write
#[derive(Debug)]
pub struct ProgressTracker {
    start_time: Instant,
    total_files: usize,
    files_written: usize,
    bytes_written: u64,
}

impl ProgressTracker {
    pub fn new(total_files: usize) -> Self {
        Self {
            start_time: Instant::now(),
            total_files,
            files_written: 0,
            bytes_written: 0,
        }
    }

    /// Account for a finished entry and return the snapshot to report
    pub fn record<'a>(&mut self, entry: &'a ArchiveEntry, entry_bytes: u64) -> ArchiveProgress<'a> {
        self.files_written += 1;
        self.bytes_written += entry_bytes;

        ArchiveProgress {
            entry,
            entry_bytes,
            files_written: self.files_written,
            total_files: self.total_files,
            bytes_written: self.bytes_written,
        }
    }

    pub fn files_written(&self) -> usize {
        self.files_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Get total elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get average speed since start, in bytes per second
    pub fn average_speed(&self) -> u64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            (self.bytes_written as f64 / elapsed) as u64
        } else {
            0
        }
    }
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

/// Format speed as human-readable string
pub fn format_speed(bytes_per_second: u64) -> String {
    format!("{}/s", format_bytes(bytes_per_second))
}

/// Format a duration as a short human-readable string
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs();
    if seconds == 0 {
        format!("{}ms", duration.as_millis())
    } else if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    }
}
