//! The pane vocabulary of the workspace dock: which tab ids exist and which
//! must always be reachable.

use super::types::{DockLayoutState, PaneId};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PaneKind {
    Chat,
    Explorer,
    Review,
    Costs,
    Stats,
    Terminal(String),
    File(String),
}

impl PaneKind {
    pub fn parse(id: &str) -> Option<Self> {
        match id {
            "chat" => Some(Self::Chat),
            "explorer" => Some(Self::Explorer),
            "review" => Some(Self::Review),
            "costs" => Some(Self::Costs),
            "stats" => Some(Self::Stats),
            _ => {
                if let Some(session) = id.strip_prefix("terminal:") {
                    (!session.is_empty()).then(|| Self::Terminal(session.to_string()))
                } else if let Some(path) = id.strip_prefix("file:") {
                    (!path.is_empty()).then(|| Self::File(path.to_string()))
                } else {
                    None
                }
            }
        }
    }

    pub fn pane_id(&self) -> PaneId {
        PaneId::new(self.to_string())
    }
}

impl fmt::Display for PaneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat => f.write_str("chat"),
            Self::Explorer => f.write_str("explorer"),
            Self::Review => f.write_str("review"),
            Self::Costs => f.write_str("costs"),
            Self::Stats => f.write_str("stats"),
            Self::Terminal(session) => write!(f, "terminal:{session}"),
            Self::File(path) => write!(f, "file:{path}"),
        }
    }
}

/// `is_pane_id` predicate for workspace layouts.
pub fn is_known_pane_id(id: &str) -> bool {
    PaneKind::parse(id).is_some()
}

/// Default workspace layout: a single tabset with the chat pane.
pub fn default_workspace_layout() -> DockLayoutState {
    DockLayoutState::single(PaneKind::Chat.pane_id())
}

/// Add `pane` to the focused tabset (inactive) if it is missing anywhere.
pub fn ensure_pane_present(state: DockLayoutState, pane: &PaneKind) -> DockLayoutState {
    let id = pane.pane_id();
    if state.contains_tab(&id) {
        return state;
    }
    state.add_tab_to_focused_tabset(&id, false)
}

/// Healing hook for workspace layouts: the chat pane must always exist.
pub fn ensure_required_panes(state: DockLayoutState) -> DockLayoutState {
    ensure_pane_present(state, &PaneKind::Chat)
}

/// Fallback for a tabset that would otherwise be empty after a split or an
/// edge drop: the explorer, unless the tab being moved already is one.
pub fn fallback_tab_for_empty_tabset(moving: &PaneId) -> PaneId {
    match PaneKind::parse(moving.as_str()) {
        Some(PaneKind::Explorer) => PaneKind::Chat.pane_id(),
        _ => PaneKind::Explorer.pane_id(),
    }
}
