//! Raw string-keyed blob storage behind the flat adapter.
//!
//! The flat adapter only ever needs "read the whole blob under this key,
//! write it back, remove it" — this trait captures that and keeps the
//! medium swappable between the on-disk store and an in-memory one for
//! tests.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::Result;

/// Abstract interface for raw blob I/O.
///
/// All operations are synchronous and complete atomically within one
/// execution context; there is no cross-process coordination.
pub trait BlobStore: Send + Sync {
    /// Reads the blob stored under `key`. `Ok(None)` when the key is absent.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the blob under `key` wholesale. Must never leave a partial
    /// value behind on failure.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Removes the blob under `key`. A no-op when the key is absent.
    fn remove(&self, key: &str) -> Result<()>;

    /// Removes every stored key.
    fn clear(&self) -> Result<()>;
}

/// On-disk blob store: one `<key>.json` file per key in a single directory.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash mid-write never corrupts the previous blob.
pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    /// Initializes the store in `dir`, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl BlobStore for FsBlobStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let file_path = self.key_path(key);
        let temp_path = file_path.with_extension("json.tmp");

        fs::write(&temp_path, value)?;
        fs::rename(&temp_path, &file_path)?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> Result<()> {
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

/// In-memory blob store for tests.
#[derive(Default)]
pub struct MemBlobStore {
    data: RwLock<HashMap<String, String>>,
}

impl BlobStore for MemBlobStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let data = self.data.read().unwrap();
        Ok(data.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut data = self.data.write().unwrap();
        data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut data = self.data.write().unwrap();
        data.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut data = self.data.write().unwrap();
        data.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn exercise(store: &dyn BlobStore) {
        assert_eq!(store.read("areas").unwrap(), None);

        store.write("areas", "[]").unwrap();
        assert_eq!(store.read("areas").unwrap().as_deref(), Some("[]"));

        store.write("areas", "[{\"id\":\"a1\"}]").unwrap();
        assert_eq!(
            store.read("areas").unwrap().as_deref(),
            Some("[{\"id\":\"a1\"}]")
        );

        store.remove("areas").unwrap();
        assert_eq!(store.read("areas").unwrap(), None);

        // Removing an absent key is a no-op, not an error.
        store.remove("areas").unwrap();

        store.write("areas", "[]").unwrap();
        store.write("settings", "{}").unwrap();
        store.clear().unwrap();
        assert_eq!(store.read("areas").unwrap(), None);
        assert_eq!(store.read("settings").unwrap(), None);
    }

    #[test]
    fn test_fs_blob_store() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path()).unwrap();
        exercise(&store);
    }

    #[test]
    fn test_mem_blob_store() {
        exercise(&MemBlobStore::default());
    }

    #[test]
    fn test_fs_write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path()).unwrap();
        store.write("events", "[1,2,3]").unwrap();

        assert!(dir.path().join("events.json").exists());
        assert!(!dir.path().join("events.json.tmp").exists());
    }
}
