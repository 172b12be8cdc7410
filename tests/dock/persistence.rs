use mux_core::dock::panes::{
    PaneKind, default_workspace_layout, ensure_required_panes, fallback_tab_for_empty_tabset,
    is_known_pane_id,
};
use mux_core::dock::store::{load_layout, save_layout};
use mux_core::dock::{DockLayoutState, ParseOptions, SplitDirection, collect_all_tabs};
use mux_core::persistence::JsonFileStore;
use tempfile::TempDir;

fn workspace_options<'a>() -> ParseOptions<'a> {
    ParseOptions::new(&is_known_pane_id, default_workspace_layout())
        .with_ensure_required_panes(&ensure_required_panes)
}

#[test]
fn workspace_layout_survives_restart() {
    let temp = TempDir::new().expect("temp dir should be created");
    let store = JsonFileStore::new(temp.path());

    let layout = default_workspace_layout()
        .split_focused_tabset(SplitDirection::Vertical, fallback_tab_for_empty_tabset)
        .add_tab_to_focused_tabset(&PaneKind::Terminal("1".into()).pane_id(), true);
    save_layout(&store, "ws-1", &layout).expect("layout should save");

    let loaded = load_layout(&store, "ws-1", workspace_options());
    assert_eq!(loaded, layout);
}

#[test]
fn layout_missing_chat_is_healed_on_load() {
    let temp = TempDir::new().expect("temp dir should be created");
    let store = JsonFileStore::new(temp.path());

    let layout = DockLayoutState::single(PaneKind::Explorer.pane_id());
    save_layout(&store, "ws-2", &layout).expect("layout should save");

    let loaded = load_layout(&store, "ws-2", workspace_options());
    let tabs: Vec<String> = collect_all_tabs(&loaded.root)
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(tabs, ["explorer", "chat"]);
}

#[test]
fn unknown_workspace_loads_the_default_layout() {
    let temp = TempDir::new().expect("temp dir should be created");
    let store = JsonFileStore::new(temp.path());
    assert_eq!(
        load_layout(&store, "never-saved", workspace_options()),
        default_workspace_layout()
    );
}

#[test]
fn layouts_are_scoped_per_workspace() {
    let temp = TempDir::new().expect("temp dir should be created");
    let store = JsonFileStore::new(temp.path());

    let a = default_workspace_layout().add_tab_to_focused_tabset(&PaneKind::Review.pane_id(), true);
    save_layout(&store, "ws-a", &a).expect("layout should save");
    assert_eq!(
        load_layout(&store, "ws-b", workspace_options()),
        default_workspace_layout()
    );
    assert_eq!(load_layout(&store, "ws-a", workspace_options()), a);
}
