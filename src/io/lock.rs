//! Lock file operations for single-instance enforcement.
//!
//! The lock lives in `$XDG_RUNTIME_DIR` and is held with an exclusive
//! advisory lock for the whole lifetime of the daemon.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::common::constants::LOCK_FILE_NAME;

/// Path of the daemon's lock file.
pub fn get_main_lock_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join(LOCK_FILE_NAME)
}

/// An acquired lock file. The advisory lock is released when this is dropped.
#[derive(Debug)]
pub struct LockFile {
    file: File,
    path: PathBuf,
}

impl LockFile {
    /// Try to take the exclusive lock at `path` without blocking.
    ///
    /// Returns `Ok(None)` if another process holds it.
    pub fn try_acquire(path: &Path) -> Result<Option<Self>> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Failed to open lock file {}", path.display()))?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Err(_) => Ok(None),
        }
    }

    /// Replace the lock file's contents.
    pub fn write(&mut self, contents: &str) -> Result<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(contents.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the lock file and release the lock.
    pub fn release(self) {
        let _ = std::fs::remove_file(&self.path);
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_second_acquire_fails_while_held() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nightfall.lock");

        let mut lock = LockFile::try_acquire(&path).unwrap().unwrap();
        lock.write("1234\n\n").unwrap();
        assert!(LockFile::try_acquire(&path).unwrap().is_none());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1234\n\n");

        lock.release();
        assert!(!path.exists());
        assert!(LockFile::try_acquire(&path).unwrap().is_some());
    }
}
