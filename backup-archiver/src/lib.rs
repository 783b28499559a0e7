//! Backup Archiver Library
//!
//! Snapshots a working directory into a single versioned zip archive placed
//! inside that directory: `backup_<YYYY.MM.DD_HH.MM>_v<N>.zip`, where `N` is
//! one more than the highest version already present.

pub mod archive;
pub mod config;
pub mod executor;
pub mod fs;
pub mod transfer;
pub mod utils;

// Re-export commonly used types
pub use archive::{ArchiveEntry, ArchiveNaming, ArchiveWriter};
pub use config::Config;
pub use executor::{BackupOrchestrator, BackupOutcome, BackupPhase};
pub use utils::errors::BackupError;
pub type Result<T> = std::result::Result<T, BackupError>;
