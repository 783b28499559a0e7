//! Candidate file collection for a backup root.
//!
//! Every regular file under the root is a candidate unless its name
//! satisfies the archive predicate, wherever it sits in the tree.

use crate::archive::naming::ArchiveNaming;
use crate::utils::errors::{BackupError, Result};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Options for directory walking
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Follow symbolic links. When false, links are neither followed nor
    /// archived.
    pub follow_links: bool,
}

/// Collects the candidate file set of a backup root.
///
/// Each call to [`FileCollector::files`] starts a fresh walk; nothing is
/// cached between calls.
#[derive(Debug, Clone)]
pub struct FileCollector {
    root: PathBuf,
    naming: ArchiveNaming,
    options: WalkOptions,
}

impl FileCollector {
    pub fn new(root: &Path, naming: ArchiveNaming, options: WalkOptions) -> Self {
        Self {
            root: root.to_path_buf(),
            naming,
            options,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily walk the tree, yielding candidate paths in traversal order.
    ///
    /// Paths are absolute when the root is.
    pub fn files(&self) -> CandidateFiles<'_> {
        let walker = WalkDir::new(&self.root)
            .follow_links(self.options.follow_links)
            .sort_by_file_name()
            .into_iter();

        CandidateFiles {
            walker,
            naming: &self.naming,
        }
    }

    /// Walk the tree and collect every candidate, failing on the first
    /// traversal error.
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        self.files().collect()
    }
}

/// Iterator over candidate files; see [`FileCollector::files`]
pub struct CandidateFiles<'a> {
    walker: walkdir::IntoIter,
    naming: &'a ArchiveNaming,
}

impl Iterator for CandidateFiles<'_> {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(traversal_error(e))),
            };

            if is_candidate(&entry, self.naming) {
                return Some(Ok(entry.into_path()));
            }
        }
    }
}

fn is_candidate(entry: &DirEntry, naming: &ArchiveNaming) -> bool {
    let file_type = entry.file_type();

    if !file_type.is_file() {
        if !file_type.is_dir() {
            tracing::debug!("Skipping non-regular file: {}", entry.path().display());
        }
        return false;
    }

    // Non-UTF-8 names can never match the archive predicate.
    match entry.file_name().to_str() {
        Some(name) => !naming.is_archive_name(name),
        None => true,
    }
}

fn traversal_error(err: walkdir::Error) -> BackupError {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    let reason = match err.io_error() {
        Some(io) => io.to_string(),
        None => err.to_string(),
    };
    BackupError::Traversal { path, reason }
}

/// Walk `root` and return every candidate file, in traversal order.
pub fn collect(root: &Path, naming: &ArchiveNaming, options: WalkOptions) -> Result<Vec<PathBuf>> {
    FileCollector::new(root, naming.clone(), options).collect()
}
