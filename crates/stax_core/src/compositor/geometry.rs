//! Window geometry and positioning modes.

use crate::config::Viewport;
use serde::{Deserialize, Serialize};

/// How a window's origin is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Placement {
    /// Fixed desktop coordinates of the top-left corner.
    Absolute { x: i32, y: i32 },
    /// Centered in the viewport, following viewport changes.
    Centered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub placement: Placement,
    pub width: i32,
    pub height: i32,
}

impl Geometry {
    pub fn absolute(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            placement: Placement::Absolute { x, y },
            width,
            height,
        }
    }

    pub fn centered(width: i32, height: i32) -> Self {
        Self {
            placement: Placement::Centered,
            width,
            height,
        }
    }

    /// Viewport-filling geometry used while maximized.
    pub fn fill(viewport: Viewport) -> Self {
        Self::absolute(0, 0, viewport.width, viewport.height)
    }

    pub fn is_centered(&self) -> bool {
        matches!(self.placement, Placement::Centered)
    }

    /// Resolved top-left corner on the desktop.
    pub fn origin(&self, viewport: Viewport) -> (i32, i32) {
        match self.placement {
            Placement::Absolute { x, y } => (x, y),
            Placement::Centered => (
                (viewport.width - self.width) / 2,
                (viewport.height - self.height) / 2,
            ),
        }
    }

    /// Same visual position expressed in absolute coordinates.
    pub fn to_absolute(&self, viewport: Viewport) -> Self {
        let (x, y) = self.origin(viewport);
        Self::absolute(x, y, self.width, self.height)
    }

    pub fn to_saved(&self, viewport: Viewport) -> SavedGeometry {
        let (x, y) = self.origin(viewport);
        SavedGeometry {
            x,
            y,
            w: self.width,
            h: self.height,
        }
    }
}

/// Host-local persisted rectangle, keyed by instance id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedGeometry {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl From<SavedGeometry> for Geometry {
    fn from(value: SavedGeometry) -> Self {
        Geometry::absolute(value.x, value.y, value.w, value.h)
    }
}

#[cfg(test)]
mod tests {
    use super::{Geometry, Placement, SavedGeometry};
    use crate::config::Viewport;

    const VIEWPORT: Viewport = Viewport {
        width: 1000,
        height: 800,
    };

    #[test]
    fn centered_origin_follows_viewport() {
        let geometry = Geometry::centered(400, 200);
        assert_eq!(geometry.origin(VIEWPORT), (300, 300));
        assert_eq!(
            geometry.to_absolute(VIEWPORT).placement,
            Placement::Absolute { x: 300, y: 300 }
        );
    }

    #[test]
    fn saved_geometry_roundtrips_through_absolute() {
        let saved = SavedGeometry {
            x: 5,
            y: 6,
            w: 700,
            h: 500,
        };
        let geometry = Geometry::from(saved);
        assert_eq!(geometry.to_saved(VIEWPORT), saved);
    }
}
