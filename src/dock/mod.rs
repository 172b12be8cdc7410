//! Dock layout engine.
//!
//! A workspace's panes live in a binary tree of splits and tabsets. Every
//! edit is a pure function from one [`DockLayoutState`] to the next, and the
//! tree stays well-formed after each one:
//!
//! - every tabset holds at least one tab and its active tab is one of them;
//! - the focused tabset id always resolves;
//! - a tabset that loses its last tab is deleted and its sibling takes the
//!   parent split's place.
//!
//! ```text
//! split-2 (vertical, [50, 50])
//! ├── tabset-1 [chat]
//! └── tabset-3 [explorer, terminal:1]   <- focused
//! ```
//!
//! Persisted layouts must be loaded through [`parse_dock_layout_state`].

pub mod ops;
pub mod panes;
pub mod store;
pub mod tree;
pub mod types;
pub mod validate;

pub use tree::{
    TabLocation, collect_all_tabs, collect_all_tabs_with_tabset, find_first_tabset_id, find_split,
    find_tabset, find_tabset_containing,
};
pub use types::{
    DOCK_LAYOUT_VERSION, DockEdge, DockLayoutNode, DockLayoutState, DockSplitNode, DockTabsetNode,
    FALLBACK_TABSET_ID, MAX_NEXT_ID, PaneId, SplitDirection,
};
pub use validate::{
    LayoutHook, ParseOptions, is_dock_layout_state, is_well_formed, parse_dock_layout_state,
};
