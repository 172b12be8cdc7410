use serde::{Deserialize, Serialize};
use std::fmt;

/// Current schema version for persisted dock layouts.
pub const DOCK_LAYOUT_VERSION: u32 = 1;

/// Focus target used when a tree has no tabset at all. Unreachable for trees
/// built through the public operations, kept so focus is never empty.
pub const FALLBACK_TABSET_ID: &str = "tabset-1";

/// Largest `nextId` a layout may carry (2^53 - 1, exact in an f64). Layouts
/// are written by JSON peers that store the counter as a double.
pub const MAX_NEXT_ID: u64 = (1 << 53) - 1;

/// Opaque tab identifier. The embedding application decides what a valid id
/// looks like (see [`super::panes`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaneId(String);

impl PaneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PaneId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PaneId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for PaneId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitDirection {
    Horizontal,
    Vertical,
}

impl SplitDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "horizontal" => Some(Self::Horizontal),
            "vertical" => Some(Self::Vertical),
            _ => None,
        }
    }
}

/// Drop target when dragging a tab onto the edge of a tabset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DockEdge {
    Left,
    Right,
    Top,
    Bottom,
}

impl DockEdge {
    /// `left`/`right` dock side by side, `top`/`bottom` stack.
    pub fn direction(self) -> SplitDirection {
        match self {
            Self::Left | Self::Right => SplitDirection::Vertical,
            Self::Top | Self::Bottom => SplitDirection::Horizontal,
        }
    }

    /// Whether the docked pane becomes the first child of the new split.
    pub fn inserts_before(self) -> bool {
        matches!(self, Self::Left | Self::Top)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockSplitNode {
    pub id: String,
    pub direction: SplitDirection,
    /// Percentages; callers keep them summing to ~100.
    pub sizes: [f64; 2],
    pub children: Box<[DockLayoutNode; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockTabsetNode {
    pub id: String,
    /// Never empty.
    pub tabs: Vec<PaneId>,
    /// Always a member of `tabs`.
    pub active_tab: PaneId,
}

impl DockTabsetNode {
    pub fn contains(&self, tab: &PaneId) -> bool {
        self.tabs.contains(tab)
    }

    /// Copy of this tabset without `tab`, repairing `active_tab`. `None` when
    /// `tab` was the only entry.
    pub(crate) fn without_tab(&self, tab: &PaneId) -> Option<Self> {
        let Some(index) = self.tabs.iter().position(|t| t == tab) else {
            return Some(self.clone());
        };
        let mut tabs = self.tabs.clone();
        tabs.remove(index);
        let last = tabs.last()?.clone();
        let active_tab = if self.active_tab == *tab {
            tabs.get(index).cloned().unwrap_or(last)
        } else {
            self.active_tab.clone()
        };
        Some(Self {
            id: self.id.clone(),
            tabs,
            active_tab,
        })
    }

    /// Copy with `tab` present (appended if missing) and optionally active.
    pub(crate) fn with_tab(&self, tab: &PaneId, activate: bool) -> Self {
        let mut next = self.clone();
        if !next.contains(tab) {
            next.tabs.push(tab.clone());
        }
        if activate {
            next.active_tab = tab.clone();
        }
        next
    }
}

/// A node in the dock tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DockLayoutNode {
    Split(DockSplitNode),
    Tabset(DockTabsetNode),
}

impl DockLayoutNode {
    pub fn id(&self) -> &str {
        match self {
            Self::Split(split) => &split.id,
            Self::Tabset(tabset) => &tabset.id,
        }
    }

    pub fn tabset(id: impl Into<String>, tabs: Vec<PaneId>, active_tab: PaneId) -> Self {
        Self::Tabset(DockTabsetNode {
            id: id.into(),
            tabs,
            active_tab,
        })
    }

    pub fn split(
        id: impl Into<String>,
        direction: SplitDirection,
        sizes: [f64; 2],
        children: [DockLayoutNode; 2],
    ) -> Self {
        Self::Split(DockSplitNode {
            id: id.into(),
            direction,
            sizes,
            children: Box::new(children),
        })
    }
}

/// Serializable dock layout for one UI scope (usually a workspace).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockLayoutState {
    pub version: u32,
    /// Next value handed out by id allocation; never reused.
    pub next_id: u64,
    pub focused_tabset_id: String,
    pub root: DockLayoutNode,
}

impl DockLayoutState {
    /// Default template: one tabset holding `tab`.
    pub fn single(tab: impl Into<PaneId>) -> Self {
        let tab = tab.into();
        Self {
            version: DOCK_LAYOUT_VERSION,
            next_id: 2,
            focused_tabset_id: FALLBACK_TABSET_ID.to_string(),
            root: DockLayoutNode::tabset(FALLBACK_TABSET_ID, vec![tab.clone()], tab),
        }
    }

    /// Hand out `<prefix>-<next_id>`. `None` once the counter reaches
    /// [`MAX_NEXT_ID`]; ids are never reused.
    pub(crate) fn allocate_id(&mut self, prefix: &str) -> Option<String> {
        if self.next_id >= MAX_NEXT_ID {
            return None;
        }
        let id = format!("{prefix}-{}", self.next_id);
        self.next_id += 1;
        Some(id)
    }
}
