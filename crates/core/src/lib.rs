//! tagwm Core
//!
//! Platform-agnostic window-management state machine.
//!
//! This crate owns the model the window manager mutates in response to
//! protocol events: the registry of tracked windows, the tag-per-monitor
//! view, the tiling layout computation, the drag gesture tracker, and the
//! one-shot suppression state used after spawning helper programs. It never
//! talks to a display server itself; the [`transport`] module defines the
//! narrow interface a platform backend implements.

pub mod drag;
pub mod focus;
pub mod layout;
pub mod monitor;
pub mod registry;
pub mod suppress;
pub mod transport;
pub mod view;

use serde::{Deserialize, Serialize};

/// Unique identifier for a window.
/// This is the protocol-level XID; the transport owns the underlying
/// resource, the core only references it.
pub type WindowId = u32;

/// A virtual desktop identifier. Windows carry a tag and are visible only
/// while their tag is the one shown on their monitor. Practical range 1-9.
pub type TagId = u8;

/// Index into the monitor list resolved at startup.
pub type MonitorId = usize;

/// A rectangle in screen coordinates (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Create a new rectangle.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Get the right edge x-coordinate.
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// A rectangle of the same size positioned so its center lies on
    /// `(center_x, center_y)`.
    pub fn centered_on(&self, center_x: i32, center_y: i32) -> Rect {
        Rect::new(
            center_x - self.width / 2,
            center_y - self.height / 2,
            self.width,
            self.height,
        )
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_on() {
        let r = Rect::new(0, 0, 100, 60);
        let c = r.centered_on(500, 300);
        assert_eq!(c, Rect::new(450, 270, 100, 60));
    }
}
