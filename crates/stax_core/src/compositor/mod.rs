//! Window compositor.
//!
//! # Responsibility
//! - Own the set of open windows, their stacking order and geometry.
//! - Drive the per-instance state machine
//!   `absent -> opening -> live <-> {minimized, maximized} -> closed`.
//! - Keep the dock in step with open windows.
//!
//! # Invariants
//! - At most one window per app id; reopening focuses the existing one.
//! - The z-order counter only grows; focusing assigns `counter + 1`.
//! - Restoring from maximized reapplies the exact prior geometry,
//!   placement mode included.
//! - Closing hands the window's handle map back to the caller for release.
//! - Every allocation gets a fresh launch token; handles are attached only
//!   under the token of the window's current allocation.
//!
//! # See also
//! - crate::service::desktop for the launch flow that drives this state.

pub mod dock;
pub mod geometry;
pub mod window;

pub use dock::{Dock, DockEntry};
pub use geometry::{Geometry, Placement, SavedGeometry};
pub use window::{WindowInstance, WindowState, WindowSurface};

use crate::config::{ShellConfig, Viewport};
use crate::linker::handles::HandleMap;
use crate::model::app::AppId;
use indexmap::IndexMap;
use log::{debug, info};

/// Window allocation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub id: AppId,
    pub title: String,
    pub surface: WindowSurface,
    /// Declared size for internal windows; sandboxed windows use the default.
    pub size: Option<(i32, i32)>,
}

impl OpenRequest {
    pub fn sandboxed(id: AppId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            surface: WindowSurface::Sandboxed,
            size: None,
        }
    }

    pub fn internal(id: AppId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            surface: WindowSurface::Internal,
            size: None,
        }
    }

    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.size = Some((width, height));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// A new window was allocated.
    Opened,
    /// The id was already open; it was focused instead.
    Focused,
}

/// What a dock click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockAction {
    Focused,
    Minimized,
    /// No window is open for the entry; the host should launch it.
    LaunchRequested,
}

/// Released state of a closed window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedWindow {
    pub id: AppId,
    pub surface: WindowSurface,
    /// Handles the caller must revoke; empty when none were attached.
    pub handles: HandleMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DragSession {
    pointer_start: (i32, i32),
    origin_start: (i32, i32),
}

pub struct Compositor {
    config: ShellConfig,
    windows: IndexMap<AppId, WindowInstance>,
    z_counter: u32,
    dock: Dock,
    drag: Option<(AppId, DragSession)>,
    last_launch_token: u64,
}

impl Compositor {
    pub fn new(config: ShellConfig) -> Self {
        let z_counter = config.z_index_base;
        Self {
            config,
            windows: IndexMap::new(),
            z_counter,
            dock: Dock::with_system_entries(),
            drag: None,
            last_launch_token: 0,
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.config.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.config.viewport = viewport;
    }

    /// Allocates a window or focuses the existing one for `request.id`.
    ///
    /// `saved` geometry wins over the cascading default for sandboxed windows.
    pub fn open(&mut self, request: OpenRequest, saved: Option<SavedGeometry>) -> OpenOutcome {
        if self.windows.contains_key(&request.id) {
            self.focus(&request.id);
            debug!(
                "event=window_open module=compositor status=ok instance={} outcome=focused",
                request.id
            );
            return OpenOutcome::Focused;
        }

        let geometry = match request.surface {
            WindowSurface::Internal => {
                let (width, height) = request.size.unwrap_or((
                    self.config.internal_window_width,
                    self.config.internal_window_height,
                ));
                Geometry::centered(width, height)
            }
            WindowSurface::Sandboxed => match saved {
                Some(saved) => Geometry::from(saved),
                None => self.cascade_geometry(request.size),
            },
        };

        self.z_counter += 1;
        self.last_launch_token += 1;
        let window = WindowInstance::new(
            request.id.clone(),
            request.title.clone(),
            request.surface,
            geometry,
            self.z_counter,
            self.last_launch_token,
        );
        self.dock.add(&request.id, request.title.as_str());
        info!(
            "event=window_open module=compositor status=ok instance={} outcome=opened z={}",
            request.id, self.z_counter
        );
        self.windows.insert(request.id, window);
        OpenOutcome::Opened
    }

    fn cascade_geometry(&self, size: Option<(i32, i32)>) -> Geometry {
        let (width, height) = size.unwrap_or((
            self.config.default_window_width,
            self.config.default_window_height,
        ));
        let offset = self.windows.len() as i32 * self.config.cascade_step;
        let viewport = self.config.viewport;
        let x = ((viewport.width - width) / 2).max(self.config.min_margin) + offset;
        let y = ((viewport.height - height) / 2).max(self.config.min_margin) + offset;
        Geometry::absolute(x, y, width, height)
    }

    /// Token of the allocation currently holding `id`.
    pub fn launch_token(&self, id: &AppId) -> Option<u64> {
        self.windows.get(id).map(WindowInstance::launch_token)
    }

    /// Stores a launch's handle map on the window it was resolved for.
    ///
    /// Returns the map back when that allocation is gone, either closed
    /// mid-resolution or replaced by a reopened window, so the caller can
    /// release it.
    pub fn attach_handles(
        &mut self,
        id: &AppId,
        launch_token: u64,
        handles: HandleMap,
    ) -> Result<(), HandleMap> {
        match self.windows.get_mut(id) {
            Some(window) if window.launch_token == launch_token && window.handles.is_none() => {
                window.handles = Some(handles);
                Ok(())
            }
            _ => Err(handles),
        }
    }

    /// `opening -> live`: the document was handed to the sandbox.
    pub fn mark_live(&mut self, id: &AppId) -> bool {
        let Some(window) = self.windows.get_mut(id) else {
            return false;
        };
        if window.opening {
            window.opening = false;
            window.loading = true;
        }
        true
    }

    /// Clears the loading indicator after the first load signal.
    pub fn mark_loaded(&mut self, id: &AppId) -> bool {
        match self.windows.get_mut(id) {
            Some(window) => {
                window.loading = false;
                true
            }
            None => false,
        }
    }

    /// Brings a window to the front, restoring it first if minimized.
    pub fn focus(&mut self, id: &AppId) -> bool {
        let Some(window) = self.windows.get_mut(id) else {
            return false;
        };
        window.minimized = false;
        self.z_counter += 1;
        window.z_index = self.z_counter;
        true
    }

    pub fn minimize(&mut self, id: &AppId) -> bool {
        let Some(window) = self.windows.get_mut(id) else {
            return false;
        };
        window.minimized = true;
        if self.drag.as_ref().is_some_and(|(dragged, _)| dragged == id) {
            self.drag = None;
        }
        true
    }

    /// Toggles maximize; returns the new maximized flag.
    pub fn toggle_maximize(&mut self, id: &AppId) -> Option<bool> {
        let viewport = self.config.viewport;
        let window = self.windows.get_mut(id)?;
        if window.maximized {
            if let Some(previous) = window.restore.take() {
                window.geometry = previous;
            }
            window.maximized = false;
        } else {
            window.restore = Some(window.geometry);
            window.geometry = Geometry::fill(viewport);
            window.maximized = true;
        }
        if self.drag.as_ref().is_some_and(|(dragged, _)| dragged == id) {
            self.drag = None;
        }
        Some(window.maximized)
    }

    /// Removes a window from any state; releases its dock slot.
    pub fn close(&mut self, id: &AppId) -> Option<ClosedWindow> {
        let window = self.windows.shift_remove(id)?;
        self.dock.remove(id);
        if self.drag.as_ref().is_some_and(|(dragged, _)| dragged == id) {
            self.drag = None;
        }
        info!("event=window_close module=compositor status=ok instance={id}");
        Some(ClosedWindow {
            id: window.id,
            surface: window.surface,
            handles: window.handles.unwrap_or_default(),
        })
    }

    /// Starts a drag; ignored for maximized or minimized windows.
    pub fn begin_drag(&mut self, id: &AppId, pointer: (i32, i32)) -> bool {
        let viewport = self.config.viewport;
        let Some(window) = self.windows.get_mut(id) else {
            return false;
        };
        if window.maximized || window.minimized {
            return false;
        }
        if window.geometry.is_centered() {
            window.geometry = window.geometry.to_absolute(viewport);
        }
        let origin_start = window.geometry.origin(viewport);
        self.drag = Some((
            id.clone(),
            DragSession {
                pointer_start: pointer,
                origin_start,
            },
        ));
        self.focus(id);
        true
    }

    pub fn drag_to(&mut self, pointer: (i32, i32)) -> bool {
        let Some((id, session)) = self.drag.as_ref() else {
            return false;
        };
        let Some(window) = self.windows.get_mut(id) else {
            return false;
        };
        let x = session.origin_start.0 + pointer.0 - session.pointer_start.0;
        let y = session.origin_start.1 + pointer.1 - session.pointer_start.1;
        window.geometry.placement = Placement::Absolute { x, y };
        true
    }

    /// Finishes a drag and returns the geometry to persist.
    pub fn end_drag(&mut self) -> Option<(AppId, SavedGeometry)> {
        let (id, _) = self.drag.take()?;
        let window = self.windows.get(&id)?;
        let saved = window.geometry.to_saved(self.config.viewport);
        Some((id, saved))
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Resizes a window, clamped to the minimum size.
    pub fn resize(&mut self, id: &AppId, width: i32, height: i32) -> Option<SavedGeometry> {
        let viewport = self.config.viewport;
        let min_width = self.config.min_window_width;
        let min_height = self.config.min_window_height;
        let window = self.windows.get_mut(id)?;
        if window.maximized || window.minimized {
            return None;
        }
        window.geometry.width = width.max(min_width);
        window.geometry.height = height.max(min_height);
        Some(window.geometry.to_saved(viewport))
    }

    /// Dock click: minimized -> focus, topmost -> minimize, else focus.
    pub fn dock_click(&mut self, id: &AppId) -> DockAction {
        let Some(window) = self.windows.get(id) else {
            return DockAction::LaunchRequested;
        };
        if window.minimized {
            self.focus(id);
            return DockAction::Focused;
        }
        if self.top_window() == Some(id) {
            self.minimize(id);
            return DockAction::Minimized;
        }
        self.focus(id);
        DockAction::Focused
    }

    /// Highest-stacked window that is not minimized.
    pub fn top_window(&self) -> Option<&AppId> {
        self.windows
            .values()
            .filter(|window| !window.minimized)
            .max_by_key(|window| window.z_index)
            .map(|window| &window.id)
    }

    pub fn get(&self, id: &AppId) -> Option<&WindowInstance> {
        self.windows.get(id)
    }

    pub fn contains(&self, id: &AppId) -> bool {
        self.windows.contains_key(id)
    }

    pub fn windows(&self) -> impl Iterator<Item = &WindowInstance> {
        self.windows.values()
    }

    pub fn ids(&self) -> Vec<AppId> {
        self.windows.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn z_counter(&self) -> u32 {
        self.z_counter
    }

    pub fn dock(&self) -> &Dock {
        &self.dock
    }

    /// Desktop coordinates of a window's top-left corner.
    pub fn window_origin(&self, id: &AppId) -> Option<(i32, i32)> {
        self.windows
            .get(id)
            .map(|window| window.geometry.origin(self.config.viewport))
    }
}

#[cfg(test)]
mod tests {
    use super::{Compositor, DockAction, OpenOutcome, OpenRequest};
    use crate::compositor::geometry::{Geometry, Placement, SavedGeometry};
    use crate::compositor::window::WindowState;
    use crate::config::ShellConfig;
    use crate::model::app::AppId;

    fn compositor() -> Compositor {
        Compositor::new(ShellConfig::default())
    }

    #[test]
    fn cascade_offsets_by_open_count() {
        let mut compositor = compositor();
        compositor.open(OpenRequest::sandboxed(AppId::new("a"), "A"), None);
        compositor.open(OpenRequest::sandboxed(AppId::new("b"), "B"), None);

        let a = compositor.get(&AppId::new("a")).expect("a open");
        let b = compositor.get(&AppId::new("b")).expect("b open");
        assert_eq!(a.geometry, Geometry::absolute(270, 125, 900, 650));
        assert_eq!(b.geometry, Geometry::absolute(290, 145, 900, 650));
    }

    #[test]
    fn saved_geometry_overrides_cascade() {
        let mut compositor = compositor();
        let saved = SavedGeometry {
            x: 1,
            y: 2,
            w: 300,
            h: 400,
        };
        compositor.open(OpenRequest::sandboxed(AppId::new("a"), "A"), Some(saved));
        let window = compositor.get(&AppId::new("a")).expect("open");
        assert_eq!(window.geometry, Geometry::absolute(1, 2, 300, 400));
        assert_eq!(window.state(), WindowState::Opening);
    }

    #[test]
    fn reopen_focuses_existing_window() {
        let mut compositor = compositor();
        let id = AppId::new("a");
        assert_eq!(
            compositor.open(OpenRequest::sandboxed(id.clone(), "A"), None),
            OpenOutcome::Opened
        );
        compositor.open(OpenRequest::sandboxed(AppId::new("b"), "B"), None);
        assert_eq!(
            compositor.open(OpenRequest::sandboxed(id.clone(), "A"), None),
            OpenOutcome::Focused
        );
        assert_eq!(compositor.len(), 2);
        assert_eq!(compositor.top_window(), Some(&id));
        assert_eq!(compositor.z_counter(), 103);
    }

    #[test]
    fn internal_windows_open_centered_and_live() {
        let mut compositor = compositor();
        compositor.open(
            OpenRequest::internal(AppId::finder(), "Finder").with_size(600, 400),
            None,
        );
        let window = compositor.get(&AppId::finder()).expect("finder open");
        assert!(window.geometry.is_centered());
        assert_eq!(window.state(), WindowState::Live);
    }

    #[test]
    fn drag_converts_centered_to_absolute_and_reports_geometry() {
        let mut compositor = compositor();
        let id = AppId::finder();
        compositor.open(
            OpenRequest::internal(id.clone(), "Finder").with_size(440, 300),
            None,
        );
        assert!(compositor.begin_drag(&id, (500, 500)));
        assert!(compositor.drag_to((510, 490)));
        let (dragged, saved) = compositor.end_drag().expect("drag ended");
        assert_eq!(dragged, id);
        assert_eq!(
            saved,
            SavedGeometry {
                x: 510,
                y: 290,
                w: 440,
                h: 300
            }
        );
        assert_eq!(
            compositor.get(&id).expect("open").geometry.placement,
            Placement::Absolute { x: 510, y: 290 }
        );
    }

    #[test]
    fn drag_is_ignored_while_maximized() {
        let mut compositor = compositor();
        let id = AppId::new("a");
        compositor.open(OpenRequest::sandboxed(id.clone(), "A"), None);
        compositor.toggle_maximize(&id);
        assert!(!compositor.begin_drag(&id, (0, 0)));
        assert!(!compositor.is_dragging());
    }

    #[test]
    fn resize_clamps_to_minimum() {
        let mut compositor = compositor();
        let id = AppId::new("a");
        compositor.open(OpenRequest::sandboxed(id.clone(), "A"), None);
        let saved = compositor.resize(&id, 10, 10).expect("resized");
        assert_eq!((saved.w, saved.h), (200, 120));
    }

    #[test]
    fn dock_click_cycles_between_focus_and_minimize() {
        let mut compositor = compositor();
        let a = AppId::new("a");
        let b = AppId::new("b");
        compositor.open(OpenRequest::sandboxed(a.clone(), "A"), None);
        compositor.open(OpenRequest::sandboxed(b.clone(), "B"), None);

        assert_eq!(compositor.dock_click(&b), DockAction::Minimized);
        assert!(compositor.get(&b).expect("b").is_minimized());
        assert_eq!(compositor.dock_click(&b), DockAction::Focused);
        assert_eq!(compositor.top_window(), Some(&b));
        assert_eq!(compositor.dock_click(&a), DockAction::Focused);
        assert_eq!(compositor.top_window(), Some(&a));
        assert_eq!(
            compositor.dock_click(&AppId::settings()),
            DockAction::LaunchRequested
        );
    }

    #[test]
    fn attach_after_close_hands_map_back() {
        let mut compositor = compositor();
        let id = AppId::new("a");
        compositor.open(OpenRequest::sandboxed(id.clone(), "A"), None);
        let token = compositor.launch_token(&id).expect("token");
        let closed = compositor.close(&id).expect("closed");
        assert!(closed.handles.is_empty());
        assert!(compositor
            .attach_handles(&id, token, crate::linker::handles::HandleMap::new())
            .is_err());
        assert!(!compositor.dock().contains(&id));
    }

    #[test]
    fn reopened_window_refuses_handles_from_the_earlier_allocation() {
        let mut compositor = compositor();
        let id = AppId::new("a");
        compositor.open(OpenRequest::sandboxed(id.clone(), "A"), None);
        let stale = compositor.launch_token(&id).expect("token");
        compositor.close(&id);
        compositor.open(OpenRequest::sandboxed(id.clone(), "A"), None);
        let fresh = compositor.launch_token(&id).expect("token");
        assert_ne!(stale, fresh);

        assert!(compositor
            .attach_handles(&id, stale, crate::linker::handles::HandleMap::new())
            .is_err());
        assert!(compositor
            .attach_handles(&id, fresh, crate::linker::handles::HandleMap::new())
            .is_ok());
        assert!(compositor
            .attach_handles(&id, fresh, crate::linker::handles::HandleMap::new())
            .is_err());
    }
}
