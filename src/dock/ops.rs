//! Pure layout edits. Every operation takes `&self` and returns the next
//! state; ids that do not resolve turn the call into a no-op.

use super::tree::{
    TabsetEdit, collect_all_tabs_with_tabset, find_first_tabset_id, find_split, find_tabset,
    find_tabset_containing, map_split, map_tabsets,
};
use super::types::{
    DockEdge, DockLayoutNode, DockLayoutState, DockTabsetNode, FALLBACK_TABSET_ID, PaneId,
    SplitDirection,
};

const EVEN_SPLIT: [f64; 2] = [50.0, 50.0];

impl DockLayoutState {
    pub fn focused_tabset(&self) -> Option<&DockTabsetNode> {
        find_tabset(&self.root, &self.focused_tabset_id)
    }

    pub fn contains_tab(&self, tab: &PaneId) -> bool {
        find_tabset_containing(&self.root, tab).is_some()
    }

    /// Active tab of the focused tabset.
    pub fn get_focused_active_tab(&self) -> Option<&PaneId> {
        self.focused_tabset().map(|tabset| &tabset.active_tab)
    }

    /// Move focus to `tabset_id` if it exists.
    pub fn focus_tabset(&self, tabset_id: &str) -> Self {
        if find_tabset(&self.root, tabset_id).is_none() {
            return self.clone();
        }
        Self {
            focused_tabset_id: tabset_id.to_string(),
            ..self.clone()
        }
    }

    /// Drop `tab` from whichever tabset holds it, collapsing emptied
    /// tabsets. Falls back to `default_state()` if nothing is left.
    pub fn remove_tab_everywhere(
        &self,
        tab: &PaneId,
        default_state: impl FnOnce() -> DockLayoutState,
    ) -> Self {
        let root = map_tabsets(&self.root, &mut |tabset| {
            if !tabset.contains(tab) {
                return TabsetEdit::Keep;
            }
            match tabset.without_tab(tab) {
                Some(next) => TabsetEdit::Replace(DockLayoutNode::Tabset(next)),
                None => TabsetEdit::Remove,
            }
        });
        match root {
            Some(root) => self.with_root(root, None),
            None => default_state(),
        }
    }

    /// Activate `tab` in `tabset_id`, appending it first when missing.
    pub fn select_tab_in_tabset(&self, tabset_id: &str, tab: &PaneId) -> Self {
        self.edit_tabset(tabset_id, |tabset| tabset.with_tab(tab, true))
    }

    /// Move the tab at `from_index` to `to_index`. Out-of-range or equal
    /// indices leave the state unchanged.
    pub fn reorder_tab_in_tabset(&self, tabset_id: &str, from_index: usize, to_index: usize) -> Self {
        self.edit_tabset(tabset_id, |tabset| {
            let len = tabset.tabs.len();
            if from_index == to_index || from_index >= len || to_index >= len {
                return tabset.clone();
            }
            let mut next = tabset.clone();
            let moved = next.tabs.remove(from_index);
            next.tabs.insert(to_index, moved);
            next
        })
    }

    pub fn select_tab_in_focused_tabset(&self, tab: &PaneId) -> Self {
        let focused = self.focused_tabset_id.clone();
        self.select_tab_in_tabset(&focused, tab)
    }

    /// Select the `index`-th tab of the depth-first flattened tab list and
    /// focus its tabset.
    pub fn select_tab_by_index(&self, index: usize) -> Self {
        let Some(location) = collect_all_tabs_with_tabset(&self.root).into_iter().nth(index) else {
            return self.clone();
        };
        self.select_tab_in_tabset(&location.tabset_id, &location.tab)
            .focus_tabset(&location.tabset_id)
    }

    /// Idempotent add to the focused tabset; an existing tab is only
    /// (re)activated when `activate` is set.
    pub fn add_tab_to_focused_tabset(&self, tab: &PaneId, activate: bool) -> Self {
        let focused = self.focused_tabset_id.clone();
        self.edit_tabset(&focused, |tabset| tabset.with_tab(tab, activate))
    }

    /// Split the focused tabset in two and focus the new half.
    ///
    /// A multi-tab tabset gives its active tab to the new sibling. A
    /// single-tab tabset stays intact and the new sibling gets
    /// `fallback_tab(kept_tab)` instead, so no tabset is ever empty.
    pub fn split_focused_tabset(
        &self,
        direction: SplitDirection,
        fallback_tab: impl FnOnce(&PaneId) -> PaneId,
    ) -> Self {
        let Some(focused) = self.focused_tabset().cloned() else {
            return self.clone();
        };

        let (kept, new_tab) = match focused.without_tab(&focused.active_tab) {
            Some(rest) if focused.tabs.len() > 1 => (rest, focused.active_tab.clone()),
            _ => {
                let fallback = fallback_tab(&focused.active_tab);
                (focused.clone(), fallback)
            }
        };

        let mut next = self.clone();
        let (Some(split_id), Some(tabset_id)) =
            (next.allocate_id("split"), next.allocate_id("tabset"))
        else {
            tracing::debug!(next_id = self.next_id, "dock.id_space_exhausted");
            return self.clone();
        };
        let replacement = DockLayoutNode::split(
            split_id,
            direction,
            EVEN_SPLIT,
            [
                DockLayoutNode::Tabset(kept),
                DockLayoutNode::tabset(tabset_id.clone(), vec![new_tab.clone()], new_tab),
            ],
        );
        next.replace_tabset(&focused.id, replacement, Some(tabset_id))
    }

    /// Set the size ratio of `split_id`. Sizes are taken as given.
    pub fn update_split_sizes(&self, split_id: &str, sizes: [f64; 2]) -> Self {
        let root = map_split(&self.root, split_id, &mut |split| {
            let mut split = split.clone();
            split.sizes = sizes;
            DockLayoutNode::Split(split)
        });
        match root {
            Some(root) => Self {
                root,
                ..self.clone()
            },
            None => self.clone(),
        }
    }

    /// Move `tab` from one tabset to another and focus the target.
    pub fn move_tab_to_tabset(
        &self,
        tab: &PaneId,
        source_tabset_id: &str,
        target_tabset_id: &str,
    ) -> Self {
        if source_tabset_id == target_tabset_id {
            return self.select_tab_in_tabset(target_tabset_id, tab);
        }
        let source_holds_tab =
            find_tabset(&self.root, source_tabset_id).is_some_and(|source| source.contains(tab));
        if !source_holds_tab || find_tabset(&self.root, target_tabset_id).is_none() {
            return self.clone();
        }

        let root = map_tabsets(&self.root, &mut |tabset| {
            if tabset.id == target_tabset_id {
                TabsetEdit::Replace(DockLayoutNode::Tabset(tabset.with_tab(tab, true)))
            } else if tabset.id == source_tabset_id {
                match tabset.without_tab(tab) {
                    Some(next) => TabsetEdit::Replace(DockLayoutNode::Tabset(next)),
                    None => TabsetEdit::Remove,
                }
            } else {
                TabsetEdit::Keep
            }
        });
        // The target survives, so the tree cannot collapse here.
        match root {
            Some(root) => self.with_root(root, Some(target_tabset_id.to_string())),
            None => self.clone(),
        }
    }

    /// Drop `tab` on an edge of `target_tabset_id`: the target's slot becomes
    /// a new split holding the target and a fresh single-tab tabset on the
    /// `edge` side. Focus moves to the fresh tabset.
    pub fn dock_tab_to_edge(
        &self,
        tab: &PaneId,
        source_tabset_id: &str,
        target_tabset_id: &str,
        edge: DockEdge,
        fallback_tab: impl FnOnce(&PaneId) -> PaneId,
    ) -> Self {
        let source_holds_tab =
            find_tabset(&self.root, source_tabset_id).is_some_and(|source| source.contains(tab));
        let Some(target) = find_tabset(&self.root, target_tabset_id) else {
            return self.clone();
        };
        if !source_holds_tab {
            return self.clone();
        }

        // Dragging a tabset's only tab onto its own edge would leave it empty.
        let remaining = match target.without_tab(tab) {
            Some(rest) => rest,
            None => {
                let fallback = fallback_tab(tab);
                DockTabsetNode {
                    id: target.id.clone(),
                    tabs: vec![fallback.clone()],
                    active_tab: fallback,
                }
            }
        };

        let mut next = self.clone();
        let (Some(split_id), Some(docked_id)) =
            (next.allocate_id("split"), next.allocate_id("tabset"))
        else {
            tracing::debug!(next_id = self.next_id, "dock.id_space_exhausted");
            return self.clone();
        };
        let docked = DockLayoutNode::tabset(docked_id.clone(), vec![tab.clone()], tab.clone());
        let remaining = DockLayoutNode::Tabset(remaining);
        let children = if edge.inserts_before() {
            [docked, remaining]
        } else {
            [remaining, docked]
        };
        let replacement = DockLayoutNode::split(split_id, edge.direction(), EVEN_SPLIT, children);
        let mut replacement = Some(replacement);

        let root = map_tabsets(&next.root, &mut |tabset| {
            if tabset.id == target_tabset_id {
                match replacement.take() {
                    Some(node) => TabsetEdit::Replace(node),
                    None => TabsetEdit::Keep,
                }
            } else if tabset.id == source_tabset_id {
                match tabset.without_tab(tab) {
                    Some(rest) => TabsetEdit::Replace(DockLayoutNode::Tabset(rest)),
                    None => TabsetEdit::Remove,
                }
            } else {
                TabsetEdit::Keep
            }
        });
        match root {
            Some(root) => next.with_root(root, Some(docked_id)),
            None => self.clone(),
        }
    }

    /// Replace split `split_id` with its child `keep_child_index` (0 or 1),
    /// discarding the other subtree.
    pub fn close_split(&self, split_id: &str, keep_child_index: usize) -> Self {
        if keep_child_index > 1 || find_split(&self.root, split_id).is_none() {
            return self.clone();
        }
        let root = map_split(&self.root, split_id, &mut |split| {
            split.children[keep_child_index].clone()
        });
        match root {
            Some(root) => self.with_root(root, None),
            None => self.clone(),
        }
    }

    fn edit_tabset(&self, tabset_id: &str, edit: impl FnOnce(&DockTabsetNode) -> DockTabsetNode) -> Self {
        if find_tabset(&self.root, tabset_id).is_none() {
            return self.clone();
        }
        let mut edit = Some(edit);
        let root = map_tabsets(&self.root, &mut |tabset| {
            if tabset.id != tabset_id {
                return TabsetEdit::Keep;
            }
            match edit.take() {
                Some(edit) => TabsetEdit::Replace(DockLayoutNode::Tabset(edit(tabset))),
                None => TabsetEdit::Keep,
            }
        });
        match root {
            Some(root) => Self {
                root,
                ..self.clone()
            },
            None => self.clone(),
        }
    }

    fn replace_tabset(
        &self,
        tabset_id: &str,
        replacement: DockLayoutNode,
        focus: Option<String>,
    ) -> Self {
        let mut replacement = Some(replacement);
        let root = map_tabsets(&self.root, &mut |tabset| {
            if tabset.id != tabset_id {
                return TabsetEdit::Keep;
            }
            match replacement.take() {
                Some(node) => TabsetEdit::Replace(node),
                None => TabsetEdit::Keep,
            }
        });
        match root {
            Some(root) => self.with_root(root, focus),
            None => self.clone(),
        }
    }

    /// Install `root`, focusing `focus` when given, and repair focus if it
    /// no longer resolves.
    fn with_root(&self, root: DockLayoutNode, focus: Option<String>) -> Self {
        let focused = focus.unwrap_or_else(|| self.focused_tabset_id.clone());
        let focused_tabset_id = if find_tabset(&root, &focused).is_some() {
            focused
        } else {
            find_first_tabset_id(&root)
                .unwrap_or(FALLBACK_TABSET_ID)
                .to_string()
        };
        Self {
            version: self.version,
            next_id: self.next_id,
            focused_tabset_id,
            root,
        }
    }
}
