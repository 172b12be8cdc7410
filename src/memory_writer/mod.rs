//! Background distillation of chat history into project memory.
//!
//! [`MemoryWriterPolicy`] is called after every assistant turn and decides
//! when a run happens; the run itself is delegated to injected collaborators
//! ([`HistoryService`], [`ModelFactory`], [`MemoryWriterTask`]).

pub mod collaborators;
pub mod memory_file;
pub mod model;
pub mod policy;
pub mod state;

pub use collaborators::{
    HistoryMessage, HistoryService, LanguageModel, MemoryWriterTask, MemoryWriterTaskRequest,
    MemoryWriterTaskResult, MessageRole, ModelFactory, ProviderOptions, RuntimeConfig,
};
pub use memory_file::{CasOutcome, ProjectMemoryFile};
pub use model::{
    GATEWAY_PROVIDER, MEMORY_WRITER_AGENT_ID, ResolvedModel, enforce_thinking_policy,
    resolve_memory_writer_model, route_through_gateway,
};
pub use policy::{
    MEMORY_WRITER_TIMEOUT, MemoryWriterDeps, MemoryWriterPolicy, MemoryWriterStreamContext,
    RunOutcome,
};
pub use state::{MemoryWriterSchedulingState, SCHEDULING_SCHEMA_VERSION, SchedulingStateStore};
