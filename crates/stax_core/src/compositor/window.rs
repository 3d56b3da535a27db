//! Per-instance window state.

use crate::compositor::geometry::Geometry;
use crate::linker::handles::HandleMap;
use crate::model::app::AppId;

/// Lifecycle state derived from the instance flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// Allocated; resolved document not yet handed to the sandbox.
    Opening,
    Live,
    Minimized,
    Maximized,
}

/// What renders the window body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSurface {
    /// Resolved document inside a sandbox.
    Sandboxed,
    /// Host-rendered content (launcher, editor shell).
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInstance {
    pub id: AppId,
    pub title: String,
    pub surface: WindowSurface,
    pub geometry: Geometry,
    pub z_index: u32,
    pub(crate) opening: bool,
    pub(crate) minimized: bool,
    pub(crate) maximized: bool,
    /// Loading indicator shown until the sandbox reports its first load.
    pub(crate) loading: bool,
    /// Exact pre-maximize geometry, placement mode included.
    pub(crate) restore: Option<Geometry>,
    pub(crate) handles: Option<HandleMap>,
    /// Token of the launch that allocated this window.
    pub(crate) launch_token: u64,
}

impl WindowInstance {
    pub(crate) fn new(
        id: AppId,
        title: String,
        surface: WindowSurface,
        geometry: Geometry,
        z_index: u32,
        launch_token: u64,
    ) -> Self {
        let opening = surface == WindowSurface::Sandboxed;
        Self {
            id,
            title,
            surface,
            geometry,
            z_index,
            opening,
            minimized: false,
            maximized: false,
            loading: false,
            restore: None,
            handles: None,
            launch_token,
        }
    }

    pub fn state(&self) -> WindowState {
        if self.opening {
            WindowState::Opening
        } else if self.minimized {
            WindowState::Minimized
        } else if self.maximized {
            WindowState::Maximized
        } else {
            WindowState::Live
        }
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    pub fn is_maximized(&self) -> bool {
        self.maximized
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Minimized windows ignore pointer input.
    pub fn accepts_pointer(&self) -> bool {
        !self.minimized
    }

    pub fn launch_token(&self) -> u64 {
        self.launch_token
    }

    pub fn handles(&self) -> Option<&HandleMap> {
        self.handles.as_ref()
    }
}
