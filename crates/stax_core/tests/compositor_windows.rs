use stax_core::compositor::{
    Compositor, Geometry, OpenOutcome, OpenRequest, Placement, WindowState,
};
use stax_core::linker::HandleMap;
use stax_core::{AppId, ShellConfig};

fn compositor() -> Compositor {
    Compositor::new(ShellConfig::default())
}

#[test]
fn centered_window_restores_to_centered_after_maximize() {
    let mut compositor = compositor();
    let id = AppId::finder();
    compositor.open(
        OpenRequest::internal(id.clone(), "Finder").with_size(600, 400),
        None,
    );
    let before = compositor.get(&id).expect("open").geometry;
    assert_eq!(before, Geometry::centered(600, 400));

    assert_eq!(compositor.toggle_maximize(&id), Some(true));
    let window = compositor.get(&id).expect("open");
    assert_eq!(window.state(), WindowState::Maximized);
    assert_eq!(window.geometry.placement, Placement::Absolute { x: 0, y: 0 });

    assert_eq!(compositor.toggle_maximize(&id), Some(false));
    let after = compositor.get(&id).expect("open").geometry;
    assert_eq!(after, before);
    assert!(after.is_centered());
}

#[test]
fn absolute_window_restores_exact_rectangle() {
    let mut compositor = compositor();
    let id = AppId::new("game");
    compositor.open(OpenRequest::sandboxed(id.clone(), "Game"), None);
    compositor.mark_live(&id);
    compositor.resize(&id, 640, 480).expect("resize");
    let before = compositor.get(&id).expect("open").geometry;

    compositor.toggle_maximize(&id);
    assert!(compositor.resize(&id, 300, 300).is_none());
    compositor.toggle_maximize(&id);

    assert_eq!(compositor.get(&id).expect("open").geometry, before);
    assert_eq!(compositor.get(&id).expect("open").state(), WindowState::Live);
}

#[test]
fn one_window_per_id_and_second_open_focuses() {
    let mut compositor = compositor();
    let id = AppId::new("game");

    assert_eq!(
        compositor.open(OpenRequest::sandboxed(id.clone(), "Game"), None),
        OpenOutcome::Opened
    );
    compositor.minimize(&id);
    assert_eq!(
        compositor.open(OpenRequest::sandboxed(id.clone(), "Game"), None),
        OpenOutcome::Focused
    );

    assert_eq!(compositor.len(), 1);
    assert!(!compositor.get(&id).expect("open").is_minimized());
}

#[test]
fn z_order_counter_is_monotonic() {
    let mut compositor = compositor();
    let a = AppId::new("a");
    let b = AppId::new("b");
    compositor.open(OpenRequest::sandboxed(a.clone(), "A"), None);
    compositor.open(OpenRequest::sandboxed(b.clone(), "B"), None);
    assert_eq!(compositor.get(&a).expect("a").z_index, 101);
    assert_eq!(compositor.get(&b).expect("b").z_index, 102);

    compositor.focus(&a);
    assert_eq!(compositor.get(&a).expect("a").z_index, 103);
    compositor.close(&a);
    compositor.focus(&b);
    assert_eq!(compositor.get(&b).expect("b").z_index, 104);
    assert_eq!(compositor.z_counter(), 104);
}

#[test]
fn minimized_windows_are_never_on_top() {
    let mut compositor = compositor();
    let a = AppId::new("a");
    let b = AppId::new("b");
    compositor.open(OpenRequest::sandboxed(a.clone(), "A"), None);
    compositor.open(OpenRequest::sandboxed(b.clone(), "B"), None);

    compositor.minimize(&b);
    assert_eq!(compositor.top_window(), Some(&a));
    assert!(!compositor.get(&b).expect("b").accepts_pointer());
    assert!(!compositor.begin_drag(&b, (0, 0)));

    compositor.minimize(&a);
    assert_eq!(compositor.top_window(), None);
}

#[test]
fn opening_becomes_live_with_loader_until_loaded() {
    let mut compositor = compositor();
    let id = AppId::new("a");
    compositor.open(OpenRequest::sandboxed(id.clone(), "A"), None);
    assert_eq!(compositor.get(&id).expect("a").state(), WindowState::Opening);

    compositor.mark_live(&id);
    let window = compositor.get(&id).expect("a");
    assert_eq!(window.state(), WindowState::Live);
    assert!(window.is_loading());

    compositor.mark_loaded(&id);
    assert!(!compositor.get(&id).expect("a").is_loading());
}

#[test]
fn close_returns_attached_handles_and_undocks() {
    let mut compositor = compositor();
    let id = AppId::new("a");
    compositor.open(OpenRequest::sandboxed(id.clone(), "A"), None);
    assert!(compositor.dock().contains(&id));

    let mut map = HandleMap::new();
    let mut store = stax_core::HandleStore::new("blob:stax");
    map.insert_path("a.js", store.materialize("a", "a.js", "text/javascript", vec![1]));
    let token = compositor.launch_token(&id).expect("token");
    compositor
        .attach_handles(&id, token, map.clone())
        .expect("attach");

    let closed = compositor.close(&id).expect("closed");
    assert_eq!(closed.handles, map);
    assert!(!compositor.dock().contains(&id));
    assert!(compositor.close(&id).is_none());
}

#[test]
fn system_windows_keep_their_dock_entry() {
    let mut compositor = compositor();
    compositor.open(OpenRequest::internal(AppId::settings(), "Settings"), None);
    compositor.close(&AppId::settings());
    assert!(compositor.dock().contains(&AppId::settings()));
}

#[test]
fn preview_scopes_are_not_docked() {
    let mut compositor = compositor();
    let preview = AppId::new("a").preview_scope();
    compositor.open(OpenRequest::sandboxed(preview.clone(), "Preview"), None);
    assert!(!compositor.dock().contains(&preview));
}
