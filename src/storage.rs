use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use dashmap::DashMap;
use log::{debug, info};
use thiserror::Error;

use crate::{
    flock::{self, DirectoryLock},
    model::{lock::LockRecord, ParseError, ScopeName},
};

const LOCK_FILE_EXTENSION: &str = "lockfile";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error on {path}")]
    IO {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Error while parsing lock file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error(transparent)]
    Lock(#[from] flock::Error),
}

/// Where lock records of the individual scopes are kept.
pub trait LockStorage: Send + Sync {
    /// `None` when the scope has no lock yet, which is distinct from an empty lock.
    fn read_lock(&self, scope: &ScopeName) -> Result<Option<LockRecord>, StorageError>;

    fn write_lock(&self, scope: &ScopeName, record: &LockRecord) -> Result<(), StorageError>;
}

/// One `<scope>.lockfile` per scope inside a directory.
#[derive(Debug, Clone)]
pub struct DirectoryLockStorage {
    directory: PathBuf,
}

impl DirectoryLockStorage {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn lock_file_path(&self, scope: &ScopeName) -> PathBuf {
        self.directory
            .join(format!("{}.{}", scope, LOCK_FILE_EXTENSION))
    }
}

impl LockStorage for DirectoryLockStorage {
    fn read_lock(&self, scope: &ScopeName) -> Result<Option<LockRecord>, StorageError> {
        let path = self.lock_file_path(scope);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("No lock file for {} at {}", scope, path.display());
                return Ok(None);
            }
            Err(source) => return Err(StorageError::IO { path, source }),
        };
        let record = LockRecord::parse(&contents)
            .map_err(|source| StorageError::Parse {
                path: path.clone(),
                source,
            })?;
        debug!(
            "Read {} lock entries for {} from {}",
            record.len(),
            scope,
            path.display()
        );
        Ok(Some(record))
    }

    fn write_lock(&self, scope: &ScopeName, record: &LockRecord) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.directory).map_err(|source| StorageError::IO {
            path: self.directory.clone(),
            source,
        })?;
        let _lock = DirectoryLock::acquire(&self.directory)?;
        let path = self.lock_file_path(scope);
        // Readers do not take the directory lock, so the file is replaced whole.
        let staging = self
            .directory
            .join(format!(".{}.{}.tmp", scope, LOCK_FILE_EXTENSION));
        std::fs::write(&staging, record.render())
            .and_then(|()| std::fs::rename(&staging, &path))
            .map_err(|source| {
                let _ = std::fs::remove_file(&staging);
                StorageError::IO {
                    path: path.clone(),
                    source,
                }
            })?;
        info!("Wrote lock file to {}", path.display());
        Ok(())
    }
}

/// Keeps lock records in memory, for embedding and tests.
#[derive(Debug, Default)]
pub struct InMemoryLockStorage {
    records: DashMap<ScopeName, LockRecord>,
}

impl InMemoryLockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, scope: ScopeName, record: LockRecord) {
        self.records.insert(scope, record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl LockStorage for InMemoryLockStorage {
    fn read_lock(&self, scope: &ScopeName) -> Result<Option<LockRecord>, StorageError> {
        Ok(self.records.get(scope).map(|record| record.value().clone()))
    }

    fn write_lock(&self, scope: &ScopeName, record: &LockRecord) -> Result<(), StorageError> {
        self.records.insert(scope.clone(), record.clone());
        Ok(())
    }
}
