//! Per-document write locks shared by every handle on a data directory
//!
//! A document is staged in `.<id>.json.tmp` before it is renamed into place.
//! That temp file is created exclusively, so it doubles as the document's
//! lock: whoever creates it owns the document until the rename (or drop)
//! removes it.

use discuss_core::error::{DiscussError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const RETRY_INTERVAL: Duration = Duration::from_millis(2);

/// Lock files older than this were left behind by a crashed writer
const ABANDONED_AFTER: Duration = Duration::from_secs(30);

/// Exclusive hold on one document
pub(crate) struct DocumentLock {
    path: PathBuf,
    file: File,
    held: bool,
}

impl DocumentLock {
    /// Create the lock file, waiting at most `deadline` for another holder
    pub fn acquire(path: PathBuf, deadline: Duration) -> Result<Self> {
        let started = Instant::now();
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    return Ok(Self {
                        path,
                        file,
                        held: true,
                    })
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if is_abandoned(&path) {
                        warn!("Removing abandoned lock file {:?}", path);
                        let _ = fs::remove_file(&path);
                        continue;
                    }
                    if started.elapsed() >= deadline {
                        return Err(DiscussError::Timeout {
                            operation: "lock_document",
                            deadline,
                        });
                    }
                    thread::sleep(RETRY_INTERVAL);
                }
                Err(e) => {
                    return Err(DiscussError::Storage(format!(
                        "Failed to lock {:?}: {}",
                        path, e
                    )))
                }
            }
        }
    }

    /// The staging file
    pub fn file(&self) -> &File {
        &self.file
    }

    /// Move the staged content over `target`, releasing the lock
    pub fn commit(mut self, target: &Path) -> Result<()> {
        fs::rename(&self.path, target).map_err(|e| {
            DiscussError::Storage(format!("Failed to rename temp file: {}", e))
        })?;
        self.held = false;
        Ok(())
    }
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        if self.held {
            if let Err(e) = fs::remove_file(&self.path) {
                debug!("Failed to release lock {:?}: {}", self.path, e);
            }
        }
    }
}

fn is_abandoned(path: &Path) -> bool {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .map(|age| age > ABANDONED_AFTER)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_holder_times_out() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".doc.json.tmp");

        let _held = DocumentLock::acquire(path.clone(), Duration::from_millis(50)).unwrap();
        let err = DocumentLock::acquire(path, Duration::from_millis(50))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            DiscussError::Timeout {
                operation: "lock_document",
                ..
            }
        ));
    }

    #[test]
    fn test_drop_releases() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".doc.json.tmp");

        drop(DocumentLock::acquire(path.clone(), Duration::from_millis(50)).unwrap());
        assert!(!path.exists());
        assert!(DocumentLock::acquire(path, Duration::from_millis(50)).is_ok());
    }

    #[test]
    fn test_commit_moves_file_into_place() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".doc.json.tmp");
        let target = temp.path().join("doc.json");

        let lock = DocumentLock::acquire(path.clone(), Duration::from_millis(50)).unwrap();
        {
            use std::io::Write;
            let mut file = lock.file();
            file.write_all(b"{}").unwrap();
        }
        lock.commit(&target).unwrap();

        assert!(!path.exists());
        assert_eq!(fs::read_to_string(&target).unwrap(), "{}");
    }
}
