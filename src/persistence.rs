//! Durable per-scope JSON key-value store.
//!
//! Layout on disk: `<root>/<scope>/<name>.json`. A scope is usually a
//! workspace id; names are fixed per consumer (`dock-layout`,
//! `memory-writer-state`).

use crate::error::StorageError;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the file backing `(scope, name)`, rejecting keys that would
    /// escape the store root.
    pub fn path_for(&self, scope: &str, name: &str) -> Result<PathBuf, StorageError> {
        validate_key(scope)?;
        validate_key(name)?;
        Ok(self.root.join(scope).join(format!("{name}.json")))
    }

    /// Read the raw JSON value for a key. A missing file is `Ok(None)`.
    pub fn read_value(
        &self,
        scope: &str,
        name: &str,
    ) -> Result<Option<serde_json::Value>, StorageError> {
        let path = self.path_for(scope, name)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Write `value` as pretty JSON. The payload lands in a sibling temp file
    /// first and is renamed over the target, so readers never observe a
    /// half-written file.
    pub fn write<T: Serialize + ?Sized>(
        &self,
        scope: &str,
        name: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let path = self.path_for(scope, name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_vec_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    pub fn remove(&self, scope: &str, name: &str) -> Result<(), StorageError> {
        let path = self.path_for(scope, name)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = key.trim().is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\', '\0']);
    if invalid {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
