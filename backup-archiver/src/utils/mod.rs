//! Utility modules for the backup archiver.

pub mod errors;
pub mod logger;

pub use errors::{BackupError, Result};
