// src/storage/file_store.rs
//! Directory-backed key-value store.
//!
//! Each key maps to one file whose name is the URL-safe base64 encoding of the
//! key (keys contain `:` from DIDs, which is not portable in file names).
//! Writes go through a temp file, `fsync` and an atomic rename so a crash never
//! leaves a half-written value behind.

use crate::error::StorageError;
use crate::storage::KeyValueStore;
use log::{debug, warn};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const VALUE_EXTENSION: &str = "val";

/// Persistent store rooted at a directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens (and creates if needed) a store rooted at `root`.
    ///
    /// # Errors
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StorageError::Io {
            key: root.display().to_string(),
            source,
        })?;
        debug!("Opened file store at {}", root.display());
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name = base64::encode_config(key, base64::URL_SAFE_NO_PAD);
        self.root.join(format!("{name}.{VALUE_EXTENSION}"))
    }

    fn key_for(path: &Path) -> Option<String> {
        if path.extension()?.to_str()? != VALUE_EXTENSION {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let bytes = base64::decode_config(stem, base64::URL_SAFE_NO_PAD).ok()?;
        String::from_utf8(bytes).ok()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let final_path = self.path_for(key);
        // Unique per call; concurrent writers of one key must not share it.
        let temp_path = final_path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };

        {
            let mut file = fs::File::create(&temp_path).map_err(io_err)?;
            file.write_all(value).map_err(io_err)?;
            file.sync_all().map_err(io_err)?;
        }

        fs::rename(&temp_path, &final_path).map_err(|source| {
            let _ = fs::remove_file(&temp_path);
            io_err(source)
        })
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let entries = fs::read_dir(&self.root).map_err(|source| StorageError::Io {
            key: prefix.to_string(),
            source,
        })?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {e}", self.root.display());
                    continue;
                }
            };
            if let Some(key) = Self::key_for(&entry.path()) {
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_values_survive_reopening() {
        let dir = TempDir::new().unwrap();
        let key = "identities:did:polygonid:polygon:amoy:2qExample";

        FileStore::open(dir.path()).unwrap().set(key, b"record").unwrap();

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get(key).unwrap(), Some(b"record".to_vec()));
    }

    #[test]
    fn test_missing_key_and_remove() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert_eq!(store.get("wallet:active-identity").unwrap(), None);
        assert!(!store.remove("wallet:active-identity").unwrap());

        store.set("wallet:active-identity", b"{}").unwrap();
        assert!(store.remove("wallet:active-identity").unwrap());
        assert_eq!(store.get("wallet:active-identity").unwrap(), None);
    }

    #[test]
    fn test_keys_with_prefix_ignores_foreign_files() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set("circuits:authV2:parameters", b"p").unwrap();
        store.set("circuits:authV2:proving_key", b"k").unwrap();
        store.set("keys:did:x", b"s").unwrap();
        fs::write(dir.path().join("README.txt"), "not a value").unwrap();

        let keys = store.keys_with_prefix("circuits:").unwrap();
        assert_eq!(
            keys,
            vec![
                "circuits:authV2:parameters".to_string(),
                "circuits:authV2:proving_key".to_string()
            ]
        );
    }

    #[test]
    fn test_set_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set("a", b"1").unwrap();
        store.set("a", b"2").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with(".val"));
    }

    #[test]
    fn test_concurrent_sets_of_one_key_never_mix() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let values: Vec<Vec<u8>> = (0u8..8).map(|i| vec![i; 64 * 1024]).collect();

        std::thread::scope(|scope| {
            for value in &values {
                let store = &store;
                scope.spawn(move || store.set("credentials:did:x", value).unwrap());
            }
        });

        let stored = store.get("credentials:did:x").unwrap().unwrap();
        assert!(values.contains(&stored));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
