use super::super::{AgentAiDefaults, ObservabilityConfig, TaskSettings};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed at load time, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub task_settings: TaskSettings,

    /// Route allow-listed models through the mux gateway
    #[serde(default)]
    pub mux_gateway_enabled: bool,

    /// `provider:model` strings eligible for gateway routing
    #[serde(default)]
    pub mux_gateway_models: Vec<String>,

    /// Gateway credential; routing is skipped while this is unset
    #[serde(default)]
    pub mux_gateway_token: Option<String>,

    /// Per-agent model overrides keyed by agent id (e.g. "memory-writer")
    #[serde(default)]
    pub agent_ai_defaults: BTreeMap<String, AgentAiDefaults>,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    pub fn gateway_credentials_configured(&self) -> bool {
        self.mux_gateway_token
            .as_deref()
            .is_some_and(|token| !token.trim().is_empty())
    }

    pub fn agent_defaults(&self, agent_id: &str) -> Option<&AgentAiDefaults> {
        self.agent_ai_defaults.get(agent_id)
    }

    /// Reject gateway allow-list entries that are not `provider:model`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for entry in &self.mux_gateway_models {
            let well_formed = entry
                .split_once(':')
                .is_some_and(|(provider, model)| !provider.is_empty() && !model.is_empty());
            if !well_formed {
                return Err(ConfigError::Validation(format!(
                    "mux_gateway_models entry {entry:?} must look like provider:model"
                )));
            }
        }
        Ok(())
    }
}
