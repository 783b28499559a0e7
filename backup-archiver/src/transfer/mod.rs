//! Progress reporting for archive writes.

pub mod progress;

pub use progress::{format_bytes, format_duration, format_speed, ArchiveProgress, ProgressTracker};
