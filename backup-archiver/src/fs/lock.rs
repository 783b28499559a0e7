//! Exclusive lock on a backup root for the duration of one run.
//!
//! The lock is an advisory `flock` on the root directory itself, so nothing
//! is written into the tree being archived. It is released when the guard
//! is dropped.

use crate::utils::errors::{BackupError, Result};
use std::path::{Path, PathBuf};

/// Held lock on a backup root
pub struct RootLock {
    path: PathBuf,
    #[cfg(unix)]
    _flock: nix::fcntl::Flock<std::fs::File>,
}

impl RootLock {
    /// Acquire the lock without blocking.
    ///
    /// Fails with [`BackupError::Lock`] if another run already holds it.
    #[cfg(unix)]
    pub fn acquire(root: &Path) -> Result<Self> {
        use nix::errno::Errno;
        use nix::fcntl::{Flock, FlockArg};

        let dir = std::fs::File::open(root)?;

        match Flock::lock(dir, FlockArg::LockExclusiveNonblock) {
            Ok(flock) => {
                tracing::debug!("Acquired lock on {}", root.display());
                Ok(Self {
                    path: root.to_path_buf(),
                    _flock: flock,
                })
            }
            Err((_, Errno::EWOULDBLOCK)) => Err(BackupError::Lock(format!(
                "another backup run is in progress for {}",
                root.display()
            ))),
            Err((_, errno)) => Err(BackupError::Lock(format!(
                "cannot lock {}: {}",
                root.display(),
                errno
            ))),
        }
    }

    #[cfg(not(unix))]
    pub fn acquire(root: &Path) -> Result<Self> {
        tracing::warn!(
            "Root locking is not supported on this platform; concurrent runs against {} are not excluded",
            root.display()
        );
        Ok(Self {
            path: root.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RootLock {
    fn drop(&mut self) {
        tracing::debug!("Released lock on {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    #[cfg(unix)]
    fn test_second_acquire_fails_while_held() -> Result<()> {
        let temp_dir = TempDir::new()?;

        let lock = RootLock::acquire(temp_dir.path())?;
        assert_eq!(lock.path(), temp_dir.path());

        let second = RootLock::acquire(temp_dir.path());
        assert!(matches!(second, Err(BackupError::Lock(_))));

        drop(lock);
        let third = RootLock::acquire(temp_dir.path());
        assert!(third.is_ok());
        Ok(())
    }

    #[test]
    fn test_lock_leaves_tree_untouched() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let _lock = RootLock::acquire(temp_dir.path())?;
        assert_eq!(std::fs::read_dir(temp_dir.path())?.count(), 0);
        Ok(())
    }
}
