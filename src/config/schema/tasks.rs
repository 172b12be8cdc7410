use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskSettings {
    /// Run the memory writer every N assistant turns. Missing, zero or
    /// negative disables it.
    #[serde(default)]
    pub memory_writer_interval_messages: Option<i64>,
}

impl TaskSettings {
    pub fn memory_writer_interval(&self) -> Option<u64> {
        self.memory_writer_interval_messages
            .and_then(|n| u64::try_from(n).ok())
            .filter(|n| *n > 0)
    }
}
