use mux_core::dock::{
    DockEdge, DockLayoutNode, DockLayoutState, PaneId, SplitDirection, collect_all_tabs,
    find_tabset,
};

fn pane(id: &str) -> PaneId {
    PaneId::from(id)
}

fn tab_ids(node: &DockLayoutNode) -> Vec<String> {
    collect_all_tabs(node).iter().map(ToString::to_string).collect()
}

fn tabs_of(state: &DockLayoutState, tabset_id: &str) -> Vec<String> {
    find_tabset(&state.root, tabset_id)
        .map(|tabset| tabset.tabs.iter().map(ToString::to_string).collect())
        .unwrap_or_default()
}

/// tabset-1 [chat] | tabset-3 [explorer, review], focus on tabset-3.
fn two_pane_layout() -> DockLayoutState {
    DockLayoutState::single("chat")
        .split_focused_tabset(SplitDirection::Vertical, |_| pane("explorer"))
        .add_tab_to_focused_tabset(&pane("review"), false)
}

#[test]
fn split_of_single_tab_tabset_uses_fallback() {
    let state = DockLayoutState::single("chat:1");
    let next = state.split_focused_tabset(SplitDirection::Vertical, |_| pane("explorer"));

    let DockLayoutNode::Split(split) = &next.root else {
        panic!("root should become a split");
    };
    assert_eq!(split.direction, SplitDirection::Vertical);
    assert_eq!(split.sizes, [50.0, 50.0]);
    assert_eq!(tab_ids(&split.children[0]), ["chat:1"]);
    assert_eq!(tab_ids(&split.children[1]), ["explorer"]);
    assert_eq!(next.focused_tabset_id, split.children[1].id());
    assert_eq!(next.get_focused_active_tab(), Some(&pane("explorer")));
}

#[test]
fn split_ids_come_from_the_shared_counter() {
    let state = DockLayoutState::single("chat");
    let next = state.split_focused_tabset(SplitDirection::Horizontal, |_| pane("explorer"));
    assert_eq!(next.root.id(), "split-2");
    assert_eq!(next.focused_tabset_id, "tabset-3");
    assert_eq!(next.next_id, 4);
}

#[test]
fn removing_a_tab_activates_the_remaining_one() {
    let state = DockLayoutState::single("a").add_tab_to_focused_tabset(&pane("b"), false);
    let next = state.remove_tab_everywhere(&pane("a"), || DockLayoutState::single("chat"));
    assert_eq!(tab_ids(&next.root), ["b"]);
    assert_eq!(next.get_focused_active_tab(), Some(&pane("b")));
}

#[test]
fn removing_the_last_tab_of_a_split_child_collapses_the_split() {
    let state = two_pane_layout();
    let next = state.remove_tab_everywhere(&pane("chat"), || DockLayoutState::single("chat"));
    let DockLayoutNode::Tabset(tabset) = &next.root else {
        panic!("sibling should be promoted to the root");
    };
    assert_eq!(tabset.id, "tabset-3");
    assert_eq!(next.focused_tabset_id, "tabset-3");
}

#[test]
fn removing_every_tab_yields_the_default() {
    let state = DockLayoutState::single("chat");
    let default_state = DockLayoutState::single("explorer");
    let next = state.remove_tab_everywhere(&pane("chat"), || default_state.clone());
    assert_eq!(next, default_state);
}

#[test]
fn selecting_the_active_tab_twice_is_idempotent() {
    let state = two_pane_layout();
    let once = state.select_tab_in_tabset("tabset-3", &pane("review"));
    let twice = once.select_tab_in_tabset("tabset-3", &pane("review"));
    assert_eq!(once, twice);
    assert_eq!(once.get_focused_active_tab(), Some(&pane("review")));
}

#[test]
fn select_appends_missing_tabs() {
    let state = DockLayoutState::single("chat");
    let next = state.select_tab_in_focused_tabset(&pane("costs"));
    assert_eq!(tab_ids(&next.root), ["chat", "costs"]);
    assert_eq!(next.get_focused_active_tab(), Some(&pane("costs")));
}

#[test]
fn select_by_index_walks_tabs_depth_first_and_focuses() {
    let state = two_pane_layout();
    let next = state.select_tab_by_index(0);
    assert_eq!(next.focused_tabset_id, "tabset-1");
    assert_eq!(next.get_focused_active_tab(), Some(&pane("chat")));

    let next = state.select_tab_by_index(2);
    assert_eq!(next.focused_tabset_id, "tabset-3");
    assert_eq!(next.get_focused_active_tab(), Some(&pane("review")));

    assert_eq!(state.select_tab_by_index(9), state);
}

#[test]
fn moving_the_only_tab_collapses_the_source() {
    let state = two_pane_layout();
    let next = state.move_tab_to_tabset(&pane("chat"), "tabset-1", "tabset-3");
    let DockLayoutNode::Tabset(tabset) = &next.root else {
        panic!("emptied source should collapse");
    };
    assert_eq!(tabset.id, "tabset-3");
    assert_eq!(tab_ids(&next.root), ["explorer", "review", "chat"]);
    assert_eq!(next.get_focused_active_tab(), Some(&pane("chat")));
}

#[test]
fn moving_within_one_tabset_only_selects() {
    let state = two_pane_layout();
    let next = state.move_tab_to_tabset(&pane("explorer"), "tabset-3", "tabset-3");
    assert_eq!(tabs_of(&next, "tabset-3"), ["explorer", "review"]);
    assert_eq!(next.get_focused_active_tab(), Some(&pane("explorer")));
}

#[test]
fn moving_from_a_tabset_without_the_tab_is_a_no_op() {
    let state = two_pane_layout();
    assert_eq!(state.move_tab_to_tabset(&pane("review"), "tabset-1", "tabset-3"), state);
    assert_eq!(state.move_tab_to_tabset(&pane("chat"), "tabset-1", "tabset-404"), state);
}

#[test]
fn docking_to_left_edge_places_new_tabset_first() {
    let state = two_pane_layout();
    let next = state.dock_tab_to_edge(
        &pane("review"),
        "tabset-3",
        "tabset-1",
        DockEdge::Left,
        |_| pane("explorer"),
    );

    let target_slot = next.root.clone();
    let DockLayoutNode::Split(top) = &target_slot else {
        panic!("root stays a split");
    };
    let DockLayoutNode::Split(docked_split) = &top.children[0] else {
        panic!("target slot should become a split");
    };
    assert_eq!(docked_split.direction, SplitDirection::Vertical);
    assert_eq!(tab_ids(&docked_split.children[0]), ["review"]);
    assert_eq!(tab_ids(&docked_split.children[1]), ["chat"]);
    assert_eq!(next.focused_tabset_id, docked_split.children[0].id());
    assert_eq!(tabs_of(&next, "tabset-3"), ["explorer"]);
}

#[test]
fn docking_to_bottom_edge_places_new_tabset_second() {
    let state = two_pane_layout();
    let next = state.dock_tab_to_edge(
        &pane("review"),
        "tabset-3",
        "tabset-3",
        DockEdge::Bottom,
        |_| pane("chat"),
    );
    let DockLayoutNode::Split(top) = &next.root else {
        panic!("root stays a split");
    };
    let DockLayoutNode::Split(docked_split) = &top.children[1] else {
        panic!("target slot should become a split");
    };
    assert_eq!(docked_split.direction, SplitDirection::Horizontal);
    assert_eq!(tab_ids(&docked_split.children[0]), ["explorer"]);
    assert_eq!(tab_ids(&docked_split.children[1]), ["review"]);
}

#[test]
fn docking_a_lone_tab_onto_its_own_edge_uses_fallback() {
    let state = DockLayoutState::single("chat");
    let next = state.dock_tab_to_edge(
        &pane("chat"),
        "tabset-1",
        "tabset-1",
        DockEdge::Right,
        |moving| {
            assert_eq!(moving, &pane("chat"));
            pane("explorer")
        },
    );
    let DockLayoutNode::Split(split) = &next.root else {
        panic!("root should become a split");
    };
    assert_eq!(tab_ids(&split.children[0]), ["explorer"]);
    assert_eq!(tab_ids(&split.children[1]), ["chat"]);
    assert_eq!(next.get_focused_active_tab(), Some(&pane("chat")));
}

#[test]
fn docking_with_unknown_ids_is_a_no_op() {
    let state = two_pane_layout();
    let next = state.dock_tab_to_edge(
        &pane("review"),
        "tabset-3",
        "tabset-404",
        DockEdge::Top,
        |_| pane("chat"),
    );
    assert_eq!(next, state);
    let next = state.dock_tab_to_edge(
        &pane("review"),
        "tabset-1",
        "tabset-3",
        DockEdge::Top,
        |_| pane("chat"),
    );
    assert_eq!(next, state);
}

#[test]
fn close_split_keeps_the_requested_child() {
    let state = two_pane_layout();
    let next = state.close_split("split-2", 0);
    assert_eq!(tab_ids(&next.root), ["chat"]);
    assert_eq!(next.focused_tabset_id, "tabset-1");
    assert_eq!(state.close_split("split-2", 2), state);
    assert_eq!(state.close_split("split-404", 0), state);
}

#[test]
fn update_split_sizes_accepts_values_as_given() {
    let state = two_pane_layout();
    let next = state.update_split_sizes("split-2", [70.0, 30.0]);
    let DockLayoutNode::Split(split) = &next.root else {
        panic!("root stays a split");
    };
    assert_eq!(split.sizes, [70.0, 30.0]);
    assert_eq!(state.update_split_sizes("tabset-1", [1.0, 2.0]), state);
}

#[test]
fn reorder_moves_tabs_within_a_tabset() {
    let state = two_pane_layout().add_tab_to_focused_tabset(&pane("stats"), false);
    let next = state.reorder_tab_in_tabset("tabset-3", 2, 0);
    assert_eq!(tabs_of(&next, "tabset-3"), ["stats", "explorer", "review"]);
    assert_eq!(state.reorder_tab_in_tabset("tabset-3", 0, 7), state);
}
