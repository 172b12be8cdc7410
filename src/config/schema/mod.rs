mod core;
mod models;
mod observability;
mod tasks;

pub use core::{Config, FileConfigLoader};
pub use models::{AgentAiDefaults, ThinkingLevel};
pub use observability::ObservabilityConfig;
pub use tasks::TaskSettings;
