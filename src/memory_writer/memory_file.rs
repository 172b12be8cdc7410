//! The project memory file the memory writer maintains.
//!
//! Writers never overwrite blindly: every write names the content it was
//! derived from and is rejected if the file moved on in the meantime.

use crate::error::MemoryWriterError;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasOutcome {
    Applied,
    /// The file no longer holds the expected content.
    Conflict { current: String },
}

#[derive(Debug, Clone)]
pub struct ProjectMemoryFile {
    path: PathBuf,
}

/// Serialises compare-and-swap per path within this process.
fn file_lock(path: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<Mutex<BTreeMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();
    let locks = LOCKS.get_or_init(|| Mutex::new(BTreeMap::new()));
    let mut guard = locks.lock().unwrap_or_else(PoisonError::into_inner);
    guard
        .entry(path.to_path_buf())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

impl ProjectMemoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current content; a missing file reads as empty.
    pub fn read(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(error) => Err(error)
                .with_context(|| format!("reading memory file {}", self.path.display())),
        }
    }

    /// Replace the content with `new` only if it still equals `expected`.
    pub fn compare_and_swap(&self, expected: &str, new: &str) -> Result<CasOutcome> {
        let lock = file_lock(&self.path);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self.read()?;
        if current != expected {
            return Ok(CasOutcome::Conflict { current });
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, new).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing memory file {}", self.path.display()))?;
        Ok(CasOutcome::Applied)
    }

    /// Read, transform, swap; retry on conflict up to `max_attempts` times.
    ///
    /// `edit` returning `None` means "nothing to change" and ends the loop
    /// with `Ok(false)`.
    pub fn update_with_retry(
        &self,
        max_attempts: usize,
        mut edit: impl FnMut(&str) -> Option<String>,
    ) -> Result<bool> {
        let mut current = self.read()?;
        for attempt in 1..=max_attempts {
            let Some(next) = edit(&current) else {
                return Ok(false);
            };
            match self.compare_and_swap(&current, &next)? {
                CasOutcome::Applied => return Ok(true),
                CasOutcome::Conflict { current: latest } => {
                    tracing::debug!(
                        path = %self.path.display(),
                        attempt,
                        "memory file changed underneath writer, retrying"
                    );
                    current = latest;
                }
            }
        }
        Err(MemoryWriterError::CasExhausted {
            attempts: max_attempts,
        }
        .into())
    }
}
