//! Durable backings for [`TokenStorage`].

use crate::error::{HomeHeroError, Result};
use crate::traits::TokenStorage;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Process-local storage. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.lock().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.slots.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.slots.lock().remove(key);
        Ok(())
    }
}

/// JSON object on disk, one entry per key.
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename, so a crash leaves either the old or the new contents.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            HomeHeroError::Storage(format!("corrupt session file {:?}: {}", self.path, e))
        })
    }

    fn save(&self, slots: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(slots)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl TokenStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock();
        Ok(self.load()?.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock();
        let mut slots = self.load().unwrap_or_else(|e| {
            tracing::warn!("Discarding unreadable session file: {}", e);
            BTreeMap::new()
        });
        slots.insert(key.to_string(), value.to_string());
        self.save(&slots)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock();
        match self.load() {
            Ok(mut slots) => {
                if slots.remove(key).is_none() {
                    return Ok(());
                }
                self.save(&slots)
            }
            Err(e) => {
                tracing::warn!("Discarding unreadable session file: {}", e);
                self.save(&BTreeMap::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("access-token").unwrap(), None);
        storage.put("access-token", "abc").unwrap();
        assert_eq!(storage.get("access-token").unwrap().as_deref(), Some("abc"));
        storage.delete("access-token").unwrap();
        storage.delete("access-token").unwrap();
        assert_eq!(storage.get("access-token").unwrap(), None);
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        FileStorage::new(&path).put("access-token", "abc123").unwrap();
        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get("access-token").unwrap().as_deref(), Some("abc123"));

        reopened.delete("access-token").unwrap();
        assert_eq!(FileStorage::new(&path).get("access-token").unwrap(), None);
    }

    #[test]
    fn test_file_storage_keeps_other_keys() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("session.json"));
        storage.put("identity", "{}").unwrap();
        storage.put("access-token", "t").unwrap();
        storage.delete("access-token").unwrap();
        assert_eq!(storage.get("identity").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_file_storage_recovers_from_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{ not json").unwrap();

        let storage = FileStorage::new(&path);
        assert!(storage.get("access-token").is_err());
        storage.delete("access-token").unwrap();
        assert_eq!(storage.get("access-token").unwrap(), None);
    }
}
