//! Services the memory writer consumes but does not own.

use crate::config::ThinkingLevel;
use anyhow::Result;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    /// Epoch milliseconds.
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// Where a workspace's files live. Passed through to the task untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RuntimeConfig {
    Local,
    #[serde(rename_all = "camelCase")]
    Worktree { src_base_dir: PathBuf },
    #[serde(rename_all = "camelCase")]
    Ssh { host: String, src_base_dir: PathBuf },
    Docker { image: String },
}

/// Provider-specific options forwarded verbatim to [`ModelFactory`].
pub type ProviderOptions = serde_json::Value;

pub trait HistoryService: Send + Sync {
    fn get_history<'a>(&'a self, workspace_id: &'a str) -> BoxFuture<'a, Result<Vec<HistoryMessage>>>;
}

/// Opaque model handle produced by a [`ModelFactory`].
pub trait LanguageModel: Send + Sync {
    fn model_id(&self) -> &str;
}

pub trait ModelFactory: Send + Sync {
    /// `Ok(None)` when the model is unavailable (no credentials, unknown
    /// provider); the run is skipped.
    fn create_model<'a>(
        &'a self,
        model_string: &'a str,
        provider_options: &'a ProviderOptions,
    ) -> BoxFuture<'a, Result<Option<Arc<dyn LanguageModel>>>>;
}

/// Everything one summarization run needs.
#[derive(Clone)]
pub struct MemoryWriterTaskRequest {
    pub workspace_id: String,
    pub workspace_name: String,
    pub project_path: PathBuf,
    pub runtime_config: RuntimeConfig,
    pub model: Arc<dyn LanguageModel>,
    pub model_string: String,
    pub thinking_level: ThinkingLevel,
    pub history: Vec<HistoryMessage>,
    pub timeout: Duration,
}

impl std::fmt::Debug for MemoryWriterTaskRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryWriterTaskRequest")
            .field("workspace_id", &self.workspace_id)
            .field("model", &self.model.model_id())
            .field("thinking_level", &self.thinking_level)
            .field("history_len", &self.history.len())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryWriterTaskResult {
    pub finish_reason: Option<String>,
    pub timed_out: bool,
    pub wrote_memory: bool,
}

/// The summarization agent itself.
///
/// Implementations should stop promptly once `cancel` fires and may report
/// that with [`crate::error::MemoryWriterError::Aborted`].
pub trait MemoryWriterTask: Send + Sync {
    fn run(
        &self,
        request: MemoryWriterTaskRequest,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<Option<MemoryWriterTaskResult>>>;
}
