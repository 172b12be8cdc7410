use super::types::DockLayoutState;
use super::validate::{ParseOptions, parse_dock_layout_state};
use crate::error::Result;
use crate::persistence::JsonFileStore;

const LAYOUT_KEY: &str = "dock-layout";

/// Load the layout persisted for `scope`.
///
/// Missing, unreadable or invalid data all resolve to
/// `options.default_state`; storage problems are logged, never returned.
pub fn load_layout(store: &JsonFileStore, scope: &str, options: ParseOptions<'_>) -> DockLayoutState {
    let raw = match store.read_value(scope, LAYOUT_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => serde_json::Value::Null,
        Err(error) => {
            tracing::debug!(scope = %scope, error = %error, "dock.layout_load_failed");
            serde_json::Value::Null
        }
    };
    parse_dock_layout_state(&raw, options)
}

/// Persist `state` for `scope`. Storage failures surface as
/// [`MuxError::Storage`](crate::error::MuxError::Storage).
pub fn save_layout(store: &JsonFileStore, scope: &str, state: &DockLayoutState) -> Result<()> {
    store.write(scope, LAYOUT_KEY, state)?;
    Ok(())
}
