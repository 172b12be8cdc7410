use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for mux-core.
///
/// The dock layout engine is total and never produces errors; only the
/// persistence, config and memory-writer layers do. Internal code keeps using
/// `anyhow::Result` for context chains and converts at the boundary.
#[derive(Debug, Error)]
pub enum MuxError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Persistence ─────────────────────────────────────────────────────
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    // ── Memory writer ───────────────────────────────────────────────────
    #[error("memory writer: {0}")]
    MemoryWriter(#[from] MemoryWriterError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Storage errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid store key: {0:?}")]
    InvalidKey(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

// ─── Memory-writer errors ───────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MemoryWriterError {
    /// The run was cancelled by its timeout or by an external token.
    #[error("memory writer run aborted")]
    Aborted,

    #[error("history unavailable for workspace {workspace_id}: {message}")]
    HistoryUnavailable {
        workspace_id: String,
        message: String,
    },

    #[error("memory file conflict after {attempts} attempts")]
    CasExhausted { attempts: usize },
}

impl MemoryWriterError {
    /// True when `error` (or anything in its source chain) is an abort.
    pub fn is_abort(error: &anyhow::Error) -> bool {
        error
            .chain()
            .any(|cause| matches!(cause.downcast_ref::<Self>(), Some(Self::Aborted)))
    }
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, MuxError>;
