//! File system access: candidate collection, entry metadata, root locking.

pub mod lock;
pub mod metadata;
pub mod walker;

pub use lock::RootLock;
pub use walker::{CandidateFiles, FileCollector, WalkOptions};
