//! File-backed key-value storage.
//!
//! All keys live in one JSON object file. Every write rewrites the file
//! through a temporary sibling and a rename, so a crash mid-write leaves the
//! previous contents in place.
//!
//! Writes happen while the book lock is held inside async sync cycles. On a
//! multi-threaded runtime they run under `block_in_place` so the worker's
//! other tasks move elsewhere for the duration.

use quotebook_engine::KeyValueStorage;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tokio::runtime::{Handle, RuntimeFlavor};

use crate::error::Result;

/// File name inside the data directory.
pub const STORAGE_FILE: &str = "storage.json";

/// Persistent storage backed by a JSON file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStorage {
    /// Open storage in `dir`, creating the directory if needed.
    ///
    /// A file that cannot be decoded is treated as empty and overwritten by
    /// the next write.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(STORAGE_FILE);

        let entries = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable storage file");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "Opened storage");

        Ok(Self { path, entries })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> io::Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        blocking(|| {
            fs::write(&tmp, json)?;
            fs::rename(&tmp, &self.path)
        })
    }
}

/// Run blocking IO, yielding the worker thread when called from a
/// multi-threaded runtime.
fn blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> quotebook_engine::error::Result<()> {
        let previous = self.entries.insert(key.to_string(), value);
        if let Err(e) = self.flush() {
            // Keep memory in step with disk
            match previous {
                Some(previous) => self.entries.insert(key.to_string(), previous),
                None => self.entries.remove(key),
            };
            return Err(quotebook_engine::Error::Storage(e.to_string()));
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> quotebook_engine::error::Result<()> {
        if let Some(previous) = self.entries.remove(key) {
            if let Err(e) = self.flush() {
                self.entries.insert(key.to_string(), previous);
                return Err(quotebook_engine::Error::Storage(e.to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let mut storage = FileStorage::open(dir.path()).unwrap();
        storage.set("quotes", "[]".into()).unwrap();
        storage.set("lastCategory", "Life".into()).unwrap();
        storage.remove("quotes").unwrap();

        let reopened = FileStorage::open(dir.path()).unwrap();
        assert_eq!(reopened.get("quotes"), None);
        assert_eq!(reopened.get("lastCategory").as_deref(), Some("Life"));
        assert!(!dir.path().join("storage.json.tmp").exists());
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");

        let mut storage = FileStorage::open(&nested).unwrap();
        storage.set("k", "v".into()).unwrap();
        assert!(nested.join(STORAGE_FILE).exists());
    }

    #[test]
    fn corrupt_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(STORAGE_FILE), "{not json").unwrap();

        let storage = FileStorage::open(dir.path()).unwrap();
        assert_eq!(storage.get("quotes"), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn writes_from_multi_thread_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::open(dir.path()).unwrap();

        storage.set("quotes", "[]".into()).unwrap();
        let other = tokio::spawn(async { 40 + 2 });
        storage.remove("quotes").unwrap();

        assert_eq!(other.await.unwrap(), 42);
        let reopened = FileStorage::open(dir.path()).unwrap();
        assert_eq!(reopened.get("quotes"), None);
    }

    #[tokio::test]
    async fn writes_from_current_thread_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::open(dir.path()).unwrap();

        storage.set("lastCategory", "Life".into()).unwrap();
        let reopened = FileStorage::open(dir.path()).unwrap();
        assert_eq!(reopened.get("lastCategory").as_deref(), Some("Life"));
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::open(dir.path()).unwrap();
        storage.set("k", "old".into()).unwrap();

        // A directory where the temp file should go makes the write fail
        fs::create_dir(dir.path().join("storage.json.tmp")).unwrap();

        assert!(storage.set("k", "new".into()).is_err());
        assert_eq!(storage.get("k").as_deref(), Some("old"));
    }
}
