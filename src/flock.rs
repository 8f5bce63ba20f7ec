use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use fs4::fs_std::FileExt;
use log::debug;
use thiserror::Error;

const LOCK_FILE_NAME: &str = ".deplock.lock";
const LOCK_TIMEOUT: Duration = Duration::from_secs(300);
const RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Exclusive advisory lock on a lock file directory, released on drop.
pub struct DirectoryLock {
    _file: File,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to lock {path}")]
    IO {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Timed out after {}s waiting for the lock on {path}", .waited.as_secs())]
    Timeout { path: PathBuf, waited: Duration },
}

impl DirectoryLock {
    /// Waits up to five minutes for other processes to release `directory`.
    pub fn acquire(directory: &Path) -> Result<Self, Error> {
        Self::acquire_with_timeout(directory, LOCK_TIMEOUT)
    }

    pub fn acquire_with_timeout(directory: &Path, timeout: Duration) -> Result<Self, Error> {
        let path = directory.join(LOCK_FILE_NAME);
        let error = |source| Error::IO {
            path: path.clone(),
            source,
        };
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(error)?;
        let start = Instant::now();
        loop {
            if FileExt::try_lock_exclusive(&file).map_err(error)? {
                debug!("Acquired lock on {}", path.display());
                return Ok(Self { _file: file });
            }
            let waited = start.elapsed();
            if waited >= timeout {
                return Err(Error::Timeout {
                    path: path.clone(),
                    waited,
                });
            }
            debug!("Failed to acquire a lock on {}, retrying", path.display());
            std::thread::sleep(RETRY_INTERVAL.min(timeout - waited));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_is_reacquired_after_drop() {
        let directory = tempfile::tempdir().unwrap();
        let first = DirectoryLock::acquire(directory.path()).unwrap();
        drop(first);
        DirectoryLock::acquire(directory.path()).unwrap();
        assert!(directory.path().join(LOCK_FILE_NAME).exists());
    }

    #[test]
    fn missing_directory_fails() {
        let directory = tempfile::tempdir().unwrap();
        let result = DirectoryLock::acquire(&directory.path().join("missing"));
        assert!(matches!(result, Err(Error::IO { .. })));
    }

    #[test]
    fn held_lock_times_out() {
        let directory = tempfile::tempdir().unwrap();
        let _held = DirectoryLock::acquire(directory.path()).unwrap();
        let result =
            DirectoryLock::acquire_with_timeout(directory.path(), Duration::from_millis(200));
        assert!(matches!(result, Err(Error::Timeout { .. })));
    }

    #[test]
    fn waits_for_lock_release() {
        let directory = tempfile::tempdir().unwrap();
        let held = DirectoryLock::acquire(directory.path()).unwrap();
        let waiter = {
            let path = directory.path().to_owned();
            std::thread::spawn(move || {
                DirectoryLock::acquire_with_timeout(&path, Duration::from_secs(30)).is_ok()
            })
        };
        std::thread::sleep(Duration::from_millis(100));
        drop(held);
        assert!(waiter.join().unwrap());
    }
}
