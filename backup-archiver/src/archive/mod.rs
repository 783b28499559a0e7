//! Archive naming, version resolution and container writing.

pub mod naming;
pub mod version;
pub mod writer;

pub use naming::ArchiveNaming;
pub use version::{list_archives, resolve_next_version, ArchiveInfo};
pub use writer::{ArchiveEntry, ArchiveWriter, WriteSummary};
