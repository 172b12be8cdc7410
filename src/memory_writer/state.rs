use crate::error::StorageError;
use crate::persistence::JsonFileStore;
use anyhow::Result;
use serde::{Deserialize, Serialize};

pub const SCHEDULING_SCHEMA_VERSION: u32 = 1;
const STATE_KEY: &str = "memory-writer-state";

/// Per-workspace scheduling bookkeeping, persisted after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryWriterSchedulingState {
    pub schema_version: u32,
    pub turns_since_last_run: u64,
    /// Epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_started_at: Option<i64>,
    /// Epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_completed_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_message_id: Option<String>,
}

impl Default for MemoryWriterSchedulingState {
    fn default() -> Self {
        Self {
            schema_version: SCHEDULING_SCHEMA_VERSION,
            turns_since_last_run: 0,
            last_run_started_at: None,
            last_run_completed_at: None,
            last_run_message_id: None,
        }
    }
}

impl MemoryWriterSchedulingState {
    /// A run was stamped as started but never recorded completion.
    pub fn previous_run_crashed(&self) -> bool {
        match (self.last_run_started_at, self.last_run_completed_at) {
            (Some(_), None) => true,
            (Some(started), Some(completed)) => completed < started,
            (None, _) => false,
        }
    }

    /// Start stamp for a new run: `now`, bumped past earlier stamps so
    /// started/completed comparisons stay strict.
    pub fn next_start_stamp(&self, now: i64) -> i64 {
        let floor = self
            .last_run_started_at
            .into_iter()
            .chain(self.last_run_completed_at)
            .max()
            .map_or(i64::MIN, |stamp| stamp.saturating_add(1));
        now.max(floor)
    }

    /// Record completion of the run stamped `started_at`. Ignored (returns
    /// false) when a newer run has restamped the state since.
    pub fn mark_completed(&mut self, started_at: i64, completed_at: i64) -> bool {
        if self.last_run_started_at != Some(started_at) {
            return false;
        }
        self.last_run_completed_at = Some(completed_at.max(started_at));
        true
    }
}

/// Durable per-workspace storage for [`MemoryWriterSchedulingState`].
pub trait SchedulingStateStore: Send + Sync {
    fn load(&self, workspace_id: &str) -> Result<Option<MemoryWriterSchedulingState>>;
    fn save(&self, workspace_id: &str, state: &MemoryWriterSchedulingState) -> Result<()>;
}

impl SchedulingStateStore for JsonFileStore {
    /// Unreadable JSON or a foreign schema version loads as `None` (the
    /// default state); I/O failures are errors.
    fn load(&self, workspace_id: &str) -> Result<Option<MemoryWriterSchedulingState>> {
        let raw = match self.read_value(workspace_id, STATE_KEY) {
            Ok(raw) => raw,
            Err(StorageError::Json(error)) => {
                tracing::debug!(workspace_id = %workspace_id, error = %error, "memory_writer.state_corrupt");
                return Ok(None);
            }
            Err(error) => return Err(error.into()),
        };
        let Some(raw) = raw else {
            return Ok(None);
        };
        let state = serde_json::from_value::<MemoryWriterSchedulingState>(raw)
            .ok()
            .filter(|state| state.schema_version == SCHEDULING_SCHEMA_VERSION);
        Ok(state)
    }

    fn save(&self, workspace_id: &str, state: &MemoryWriterSchedulingState) -> Result<()> {
        self.write(workspace_id, STATE_KEY, state)?;
        Ok(())
    }
}
