//! Pointer-driven move/resize gesture tracking.
//!
//! A gesture starts on a button press over a window, snapshots the window's
//! geometry, and ends unconditionally on release. Every intermediate motion
//! is computed against the original snapshot rather than the previous frame,
//! so repeated small motions never compound rounding error.

use crate::{Rect, WindowId};

/// Button that moves the window while dragging.
pub const MOVE_BUTTON: u8 = 1;
/// Button that resizes the window while dragging.
pub const RESIZE_BUTTON: u8 = 3;

/// An in-progress gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drag {
    pub handle: WindowId,
    pub button: u8,
    /// Root pointer position at the press that started the gesture.
    pub origin_x: i32,
    pub origin_y: i32,
    /// Window geometry at the press; the base for every motion frame.
    pub original: Rect,
}

/// Gesture state machine: `Idle -> Dragging -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(Drag),
}

impl DragState {
    /// Enter `Dragging` with a snapshot of the target's geometry.
    pub fn begin(
        &mut self,
        handle: WindowId,
        button: u8,
        origin_x: i32,
        origin_y: i32,
        original: Rect,
    ) {
        *self = DragState::Dragging(Drag {
            handle,
            button,
            origin_x,
            origin_y,
            original,
        });
    }

    /// Geometry for the current pointer position, or `None` when idle or
    /// when the held button drives neither a move nor a resize.
    pub fn motion(&self, root_x: i32, root_y: i32) -> Option<(WindowId, Rect)> {
        let DragState::Dragging(drag) = self else {
            return None;
        };

        let dx = root_x - drag.origin_x;
        let dy = root_y - drag.origin_y;
        let base = drag.original;

        let rect = match drag.button {
            MOVE_BUTTON => Rect::new(base.x + dx, base.y + dy, base.width, base.height),
            RESIZE_BUTTON => Rect::new(
                base.x,
                base.y,
                (base.width + dx).max(1),
                (base.height + dy).max(1),
            ),
            _ => return None,
        };
        Some((drag.handle, rect))
    }

    /// Back to `Idle`, regardless of which button was released.
    pub fn release(&mut self) {
        *self = DragState::Idle;
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging(_))
    }
}
