//! Read-only queries and the copy-on-write rebuild helpers every edit goes
//! through.

use super::types::{DockLayoutNode, DockSplitNode, DockTabsetNode, PaneId};

/// Depth-first, left child first.
pub fn find_tabset<'a>(root: &'a DockLayoutNode, id: &str) -> Option<&'a DockTabsetNode> {
    match root {
        DockLayoutNode::Tabset(tabset) => (tabset.id == id).then_some(tabset),
        DockLayoutNode::Split(split) => split
            .children
            .iter()
            .find_map(|child| find_tabset(child, id)),
    }
}

pub fn find_first_tabset_id(root: &DockLayoutNode) -> Option<&str> {
    match root {
        DockLayoutNode::Tabset(tabset) => Some(&tabset.id),
        DockLayoutNode::Split(split) => split.children.iter().find_map(find_first_tabset_id),
    }
}

pub fn find_split<'a>(root: &'a DockLayoutNode, id: &str) -> Option<&'a DockSplitNode> {
    match root {
        DockLayoutNode::Tabset(_) => None,
        DockLayoutNode::Split(split) if split.id == id => Some(split),
        DockLayoutNode::Split(split) => split.children.iter().find_map(|child| find_split(child, id)),
    }
}

/// First tabset (depth-first) whose `tabs` include `tab`.
pub fn find_tabset_containing<'a>(
    root: &'a DockLayoutNode,
    tab: &PaneId,
) -> Option<&'a DockTabsetNode> {
    match root {
        DockLayoutNode::Tabset(tabset) => tabset.contains(tab).then_some(tabset),
        DockLayoutNode::Split(split) => split
            .children
            .iter()
            .find_map(|child| find_tabset_containing(child, tab)),
    }
}

pub fn collect_all_tabs(node: &DockLayoutNode) -> Vec<PaneId> {
    collect_all_tabs_with_tabset(node)
        .into_iter()
        .map(|entry| entry.tab)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabLocation {
    pub tab: PaneId,
    pub tabset_id: String,
}

pub fn collect_all_tabs_with_tabset(node: &DockLayoutNode) -> Vec<TabLocation> {
    let mut out = Vec::new();
    collect_into(node, &mut out);
    out
}

fn collect_into(node: &DockLayoutNode, out: &mut Vec<TabLocation>) {
    match node {
        DockLayoutNode::Tabset(tabset) => {
            out.extend(tabset.tabs.iter().map(|tab| TabLocation {
                tab: tab.clone(),
                tabset_id: tabset.id.clone(),
            }));
        }
        DockLayoutNode::Split(split) => {
            for child in split.children.iter() {
                collect_into(child, out);
            }
        }
    }
}

/// What to do with a visited tabset.
pub(crate) enum TabsetEdit {
    Keep,
    Replace(DockLayoutNode),
    Remove,
}

/// Rebuild the tree, letting `edit` keep, replace or delete each tabset.
///
/// Deleting a tabset promotes its sibling into the parent split's position;
/// a split whose children are both gone disappears too. `None` means the
/// whole tree collapsed.
pub(crate) fn map_tabsets(
    node: &DockLayoutNode,
    edit: &mut dyn FnMut(&DockTabsetNode) -> TabsetEdit,
) -> Option<DockLayoutNode> {
    match node {
        DockLayoutNode::Tabset(tabset) => match edit(tabset) {
            TabsetEdit::Keep => Some(node.clone()),
            TabsetEdit::Replace(replacement) => Some(replacement),
            TabsetEdit::Remove => None,
        },
        DockLayoutNode::Split(split) => {
            let [first, second] = &*split.children;
            let first = map_tabsets(first, edit);
            let second = map_tabsets(second, edit);
            match (first, second) {
                (None, None) => None,
                (Some(only), None) | (None, Some(only)) => Some(only),
                (Some(first), Some(second)) => Some(DockLayoutNode::split(
                    split.id.clone(),
                    split.direction,
                    split.sizes,
                    [first, second],
                )),
            }
        }
    }
}

/// Rebuild the tree with the split `id` swapped for `replace(split)`.
/// Returns `None` when no such split exists.
pub(crate) fn map_split(
    node: &DockLayoutNode,
    id: &str,
    replace: &mut dyn FnMut(&DockSplitNode) -> DockLayoutNode,
) -> Option<DockLayoutNode> {
    let DockLayoutNode::Split(split) = node else {
        return None;
    };
    if split.id == id {
        return Some(replace(split));
    }
    let [first, second] = &*split.children;
    if let Some(first) = map_split(first, id, replace) {
        return Some(DockLayoutNode::split(
            split.id.clone(),
            split.direction,
            split.sizes,
            [first, second.clone()],
        ));
    }
    let second = map_split(second, id, replace)?;
    Some(DockLayoutNode::split(
        split.id.clone(),
        split.direction,
        split.sizes,
        [first.clone(), second],
    ))
}
