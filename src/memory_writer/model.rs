//! Which model the memory writer runs on, and at what reasoning effort.

use crate::config::{Config, ThinkingLevel};

/// Key of the memory writer's entry in `agent_ai_defaults`.
pub const MEMORY_WRITER_AGENT_ID: &str = "memory-writer";
pub const GATEWAY_PROVIDER: &str = "mux-gateway";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    /// What gets handed to the model factory (possibly gateway-routed).
    pub model_string: String,
    pub thinking_level: ThinkingLevel,
}

/// Pick the memory writer's model: the agent override first, then the
/// workspace's current model. `None` when neither is set.
pub fn resolve_memory_writer_model(
    config: &Config,
    workspace_model: Option<&str>,
) -> Option<ResolvedModel> {
    let defaults = config.agent_defaults(MEMORY_WRITER_AGENT_ID);
    let candidate = defaults
        .and_then(|d| d.model.as_deref())
        .or(workspace_model)
        .map(str::trim)
        .filter(|model| !model.is_empty())?;

    let requested = defaults
        .and_then(|d| d.thinking_level)
        .unwrap_or_default();

    Some(ResolvedModel {
        model_string: route_through_gateway(config, candidate),
        thinking_level: enforce_thinking_policy(candidate, requested),
    })
}

/// `provider:model` becomes `mux-gateway:provider/model` when the gateway is
/// enabled, a token is configured and the model is allow-listed.
pub fn route_through_gateway(config: &Config, model_string: &str) -> String {
    if !config.mux_gateway_enabled || !config.gateway_credentials_configured() {
        return model_string.to_string();
    }
    if !config.mux_gateway_models.iter().any(|m| m == model_string) {
        return model_string.to_string();
    }
    match model_string.split_once(':') {
        Some((provider, model)) if provider != GATEWAY_PROVIDER && !model.is_empty() => {
            format!("{GATEWAY_PROVIDER}:{provider}/{model}")
        }
        _ => model_string.to_string(),
    }
}

/// Undo [`route_through_gateway`] so policies see the upstream model.
fn upstream_model(model_string: &str) -> (&str, &str) {
    let (provider, model) = model_string.split_once(':').unwrap_or(("", model_string));
    if provider == GATEWAY_PROVIDER
        && let Some((inner_provider, inner_model)) = model.split_once('/')
    {
        return (inner_provider, inner_model);
    }
    (provider, model)
}

/// Clamp `requested` to what `model_string` supports.
///
/// - Models without reasoning support always run with `Off`.
/// - Fixed-effort models always run at `High`.
/// - `Xhigh` is only honoured by models that expose it; others get `High`.
pub fn enforce_thinking_policy(model_string: &str, requested: ThinkingLevel) -> ThinkingLevel {
    let (_, model) = upstream_model(model_string);
    let model = model.to_ascii_lowercase();

    const NO_REASONING: &[&str] = &["gpt-4o", "gpt-4.1", "claude-3-5", "claude-3-haiku"];
    const FIXED_HIGH: &[&str] = &["gpt-5-pro"];
    const SUPPORTS_XHIGH: &[&str] = &["codex-max", "gpt-5.2"];

    if NO_REASONING.iter().any(|prefix| model.starts_with(prefix)) {
        return ThinkingLevel::Off;
    }
    if FIXED_HIGH.iter().any(|prefix| model.starts_with(prefix)) {
        return ThinkingLevel::High;
    }
    if requested == ThinkingLevel::Xhigh && !SUPPORTS_XHIGH.iter().any(|tag| model.contains(tag)) {
        return ThinkingLevel::High;
    }
    requested
}
