pub mod schema;

pub use schema::{
    AgentAiDefaults, Config, FileConfigLoader, ObservabilityConfig, TaskSettings, ThinkingLevel,
};

/// Source of the current configuration.
///
/// Collaborators call this on every decision instead of caching a `Config`,
/// so edits to the config file take effect on the next turn.
pub trait ConfigLoader: Send + Sync {
    fn load_config_or_default(&self) -> Config;
}

impl ConfigLoader for Config {
    fn load_config_or_default(&self) -> Config {
        self.clone()
    }
}

impl ConfigLoader for FileConfigLoader {
    fn load_config_or_default(&self) -> Config {
        Config::load_or_default(self.path())
    }
}
