//! Structural validation of untrusted (deserialized) layouts.
//!
//! Persisted data is only trusted after [`is_dock_layout_state`] accepts it;
//! [`parse_dock_layout_state`] is the entry point loaders use.

use super::types::{DOCK_LAYOUT_VERSION, DockLayoutNode, DockLayoutState, MAX_NEXT_ID};
use serde_json::{Map, Value};

/// Hook applied to a state after it passed validation.
pub type LayoutHook<'a> = &'a dyn Fn(DockLayoutState) -> DockLayoutState;

pub struct ParseOptions<'a> {
    /// What a valid tab id looks like for the embedding application.
    pub is_pane_id: &'a dyn Fn(&str) -> bool,
    /// Substituted whenever the raw value is not a valid layout.
    pub default_state: DockLayoutState,
    /// Schema uplift.
    pub migrate: Option<LayoutHook<'a>>,
    /// Self-healing, e.g. re-adding a pane that must always exist.
    pub ensure_required_panes: Option<LayoutHook<'a>>,
}

impl<'a> ParseOptions<'a> {
    pub fn new(is_pane_id: &'a dyn Fn(&str) -> bool, default_state: DockLayoutState) -> Self {
        Self {
            is_pane_id,
            default_state,
            migrate: None,
            ensure_required_panes: None,
        }
    }

    pub fn with_migrate(mut self, migrate: LayoutHook<'a>) -> Self {
        self.migrate = Some(migrate);
        self
    }

    pub fn with_ensure_required_panes(mut self, ensure: LayoutHook<'a>) -> Self {
        self.ensure_required_panes = Some(ensure);
        self
    }
}

/// Check `raw` has the exact shape of a [`DockLayoutState`] whose tabs all
/// satisfy `is_pane_id` and whose focus resolves to a tabset.
pub fn is_dock_layout_state(raw: &Value, is_pane_id: &dyn Fn(&str) -> bool) -> bool {
    let Some(obj) = raw.as_object() else {
        return false;
    };
    if obj.get("version").and_then(Value::as_u64) != Some(u64::from(DOCK_LAYOUT_VERSION)) {
        return false;
    }
    if obj.get("nextId").and_then(parse_next_id).is_none() {
        return false;
    }
    let Some(focused) = obj.get("focusedTabsetId").and_then(Value::as_str) else {
        return false;
    };
    let Some(root) = obj.get("root") else {
        return false;
    };
    is_node(root, is_pane_id) && contains_tabset(root, focused)
}

/// `nextId` as a counter. Integral floats (`5.0`) are accepted since JSON
/// writers do not distinguish them; anything past [`MAX_NEXT_ID`] is not.
fn parse_next_id(raw: &Value) -> Option<u64> {
    let id = match raw.as_u64() {
        Some(id) => id,
        None => {
            let float = raw.as_f64()?;
            let integral = float.is_finite() && float.fract() == 0.0;
            if !integral || float < 0.0 || float > MAX_NEXT_ID as f64 {
                return None;
            }
            float as u64
        }
    };
    (id <= MAX_NEXT_ID).then_some(id)
}

fn is_node(raw: &Value, is_pane_id: &dyn Fn(&str) -> bool) -> bool {
    let Some(obj) = raw.as_object() else {
        return false;
    };
    if obj.get("id").and_then(Value::as_str).is_none() {
        return false;
    }
    match obj.get("type").and_then(Value::as_str) {
        Some("split") => is_split(obj, is_pane_id),
        Some("tabset") => is_tabset(obj, is_pane_id),
        _ => false,
    }
}

fn is_split(obj: &Map<String, Value>, is_pane_id: &dyn Fn(&str) -> bool) -> bool {
    let direction_ok = matches!(
        obj.get("direction").and_then(Value::as_str),
        Some("horizontal" | "vertical")
    );
    let sizes_ok = obj
        .get("sizes")
        .and_then(Value::as_array)
        .is_some_and(|sizes| {
            sizes.len() == 2 && sizes.iter().all(|s| s.as_f64().is_some_and(f64::is_finite))
        });
    let children_ok = obj
        .get("children")
        .and_then(Value::as_array)
        .is_some_and(|children| {
            children.len() == 2 && children.iter().all(|child| is_node(child, is_pane_id))
        });
    direction_ok && sizes_ok && children_ok
}

fn is_tabset(obj: &Map<String, Value>, is_pane_id: &dyn Fn(&str) -> bool) -> bool {
    let Some(tabs) = obj.get("tabs").and_then(Value::as_array) else {
        return false;
    };
    if tabs.is_empty() {
        return false;
    }
    let all_panes = tabs
        .iter()
        .all(|tab| tab.as_str().is_some_and(|id| is_pane_id(id)));
    if !all_panes {
        return false;
    }
    obj.get("activeTab")
        .and_then(Value::as_str)
        .is_some_and(|active| tabs.iter().any(|tab| tab.as_str() == Some(active)))
}

fn contains_tabset(raw: &Value, id: &str) -> bool {
    match raw.get("type").and_then(Value::as_str) {
        Some("tabset") => raw.get("id").and_then(Value::as_str) == Some(id),
        Some("split") => raw
            .get("children")
            .and_then(Value::as_array)
            .is_some_and(|children| children.iter().any(|child| contains_tabset(child, id))),
        _ => false,
    }
}

/// Typed counterpart of [`is_dock_layout_state`], used to re-check the
/// output of migration and healing hooks.
pub fn is_well_formed(state: &DockLayoutState, is_pane_id: &dyn Fn(&str) -> bool) -> bool {
    fn node_ok(node: &DockLayoutNode, is_pane_id: &dyn Fn(&str) -> bool) -> bool {
        match node {
            DockLayoutNode::Tabset(tabset) => {
                !tabset.tabs.is_empty()
                    && tabset.tabs.iter().all(|tab| is_pane_id(tab.as_str()))
                    && tabset.contains(&tabset.active_tab)
            }
            DockLayoutNode::Split(split) => {
                split.sizes.iter().all(|s| s.is_finite())
                    && split.children.iter().all(|child| node_ok(child, is_pane_id))
            }
        }
    }
    state.version == DOCK_LAYOUT_VERSION
        && state.next_id <= MAX_NEXT_ID
        && node_ok(&state.root, is_pane_id)
        && super::tree::find_tabset(&state.root, &state.focused_tabset_id).is_some()
}

/// Load a layout from untrusted JSON.
///
/// Invalid input yields `options.default_state`; valid input goes through
/// `migrate` then `ensure_required_panes`. A hook that breaks the tree also
/// yields the default.
pub fn parse_dock_layout_state(raw: &Value, options: ParseOptions<'_>) -> DockLayoutState {
    let ParseOptions {
        is_pane_id,
        default_state,
        migrate,
        ensure_required_panes,
    } = options;

    if !is_dock_layout_state(raw, is_pane_id) {
        return default_state;
    }
    let mut raw = raw.clone();
    if let Some(next_id) = raw.get("nextId").and_then(parse_next_id) {
        raw["nextId"] = Value::from(next_id);
    }
    let Ok(mut state) = serde_json::from_value::<DockLayoutState>(raw) else {
        return default_state;
    };
    if let Some(migrate) = migrate {
        state = migrate(state);
    }
    if let Some(ensure) = ensure_required_panes {
        state = ensure(state);
    }
    if is_well_formed(&state, is_pane_id) {
        state
    } else {
        tracing::debug!("dock.layout_hook_produced_invalid_state");
        default_state
    }
}
