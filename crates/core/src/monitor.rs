//! Monitor geometry.
//!
//! The monitor list is resolved once at startup by the platform layer and is
//! immutable afterwards. Monitors are laid out side by side along the x axis;
//! a root-coordinate x position therefore identifies the monitor under the
//! pointer.

use serde::{Deserialize, Serialize};

use crate::{MonitorId, Rect};

/// A physical output, fixed after startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Horizontal origin of this monitor in root coordinates.
    pub x_origin: i32,
}

impl Monitor {
    pub fn new(width: i32, height: i32, x_origin: i32) -> Self {
        Self { width, height, x_origin }
    }

    /// The rectangle a maximized window occupies: the full monitor area
    /// minus the border drawn on each side.
    pub fn maximized_rect(&self, border_width: i32) -> Rect {
        Rect::new(
            self.x_origin,
            0,
            self.width - 2 * border_width,
            self.height - 2 * border_width,
        )
    }

    /// Center point of this monitor in root coordinates.
    pub fn center(&self) -> (i32, i32) {
        (self.x_origin + self.width / 2, self.height / 2)
    }

    /// Whether a root x-coordinate falls within this monitor's range.
    pub fn contains_x(&self, root_x: i32) -> bool {
        root_x >= self.x_origin && root_x < self.x_origin + self.width
    }
}

/// Map a root x-coordinate to the monitor whose horizontal range contains
/// it. Coordinates left or right of every monitor clamp to the nearest one,
/// so the result is always a valid index for a non-empty list.
pub fn monitor_at(monitors: &[Monitor], root_x: i32) -> MonitorId {
    debug_assert!(!monitors.is_empty());
    for (id, monitor) in monitors.iter().enumerate() {
        if monitor.contains_x(root_x) {
            return id;
        }
    }
    if root_x < monitors[0].x_origin {
        0
    } else {
        monitors.len() - 1
    }
}
