//! File-backed dictionary store
//!
//! The record lives in a JSON file; a sibling `.lock` file carries an
//! advisory exclusive lock so separate processes serialize their
//! read-modify-write sequences.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fd_lock::RwLock;
use tempfile::NamedTempFile;
use veil_core::limits::DEFAULT_LOCK_TIMEOUT;
use veil_core::{Error, Result};

use crate::{DictionaryStore, KeywordDictionary};

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(25);

pub struct FileDictionaryStore {
    path: PathBuf,
    lock_path: PathBuf,
    timeout: Duration,
}

impl FileDictionaryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_path = path.clone().into_os_string();
        lock_path.push(".lock");

        Self {
            path,
            lock_path: PathBuf::from(lock_path),
            timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Override the bounded wait for the lock
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    fn write_atomic(&self, bytes: &[u8]) -> std::io::Result<()> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl DictionaryStore for FileDictionaryStore {
    fn read(&self) -> KeywordDictionary {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return KeywordDictionary::new(),
            Err(e) => {
                tracing::warn!("Failed to read dictionary {}: {}", self.path.display(), e);
                return KeywordDictionary::new();
            }
        };

        KeywordDictionary::from_json(&bytes).unwrap_or_else(|e| {
            tracing::warn!("Failed to load dictionary {}: {}", self.path.display(), e);
            KeywordDictionary::new()
        })
    }

    fn write(&self, dictionary: &KeywordDictionary) -> Result<()> {
        let bytes = dictionary.to_json()?;
        self.write_atomic(&bytes).map_err(|e| {
            tracing::error!("Failed to save dictionary {}: {}", self.path.display(), e);
            Error::Persistence(format!("{}: {}", self.path.display(), e))
        })
    }

    fn locked<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        fs::create_dir_all(self.parent_dir())?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        let mut lock = RwLock::new(file);

        let deadline = Instant::now() + self.timeout;
        loop {
            match lock.try_write() {
                Ok(_guard) => return f(),
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        tracing::error!(
                            "Could not acquire dictionary lock within {:?}",
                            self.timeout
                        );
                        return Err(Error::LockTimeout(self.timeout));
                    }
                    thread::sleep(LOCK_POLL_INTERVAL);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
