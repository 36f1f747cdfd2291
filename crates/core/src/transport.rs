//! The narrow interface between the core and the display-server backend.
//!
//! The platform crate implements [`Transport`] over the real protocol
//! connection; tests implement it with a command recorder. Events use one
//! tagged variant per kind, each carrying only the fields guaranteed for
//! that kind.

use thiserror::Error;

use crate::{Rect, WindowId};

/// Errors a transport command can produce.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The command addressed a window that no longer exists. Recoverable:
    /// the registry is reconciled by the next structural notification.
    #[error("window {0} is gone")]
    Stale(WindowId),

    /// The connection to the display server was lost. Fatal: terminates the
    /// event loop.
    #[error("display connection lost: {0}")]
    ConnectionLost(String),
}

impl TransportError {
    /// Only connection loss tears down the event loop; everything else is
    /// logged and ignored.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransportError::ConnectionLost(_))
    }
}

/// Protocol notifications consumed by the dispatcher, one variant per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A top-level window asked to be shown.
    Created(WindowId),
    /// A tracked (or unknown) window went away.
    Destroyed(WindowId),
    /// A window was unmapped. Hiding a window for a tag switch echoes back
    /// through this event too, so it is not a removal by itself.
    Unmapped(WindowId),
    /// The pointer entered a window.
    PointerEntered(WindowId),
    /// The pointer left the window it was in.
    PointerLeft,
    KeyDown { keycode: u8, shifted: bool },
    KeyUp { keycode: u8 },
    ButtonDown {
        button: u8,
        root_x: i32,
        root_y: i32,
        /// The window under the pointer at the press, if any.
        target: Option<WindowId>,
    },
    ButtonUp { button: u8 },
    PointerMoved { root_x: i32, root_y: i32 },
    FocusGained(WindowId),
    FocusLost,
}

/// Fields of a geometry/stacking command; unset fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Configure {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub border_width: Option<i32>,
    /// Raise the window to the top of the stacking order.
    pub raise: bool,
}

impl Configure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position and size from a rectangle.
    pub fn rect(rect: Rect) -> Self {
        Self {
            x: Some(rect.x),
            y: Some(rect.y),
            width: Some(rect.width),
            height: Some(rect.height),
            ..Self::default()
        }
    }

    pub fn border_width(mut self, width: i32) -> Self {
        self.border_width = Some(width);
        self
    }

    pub fn raise(mut self) -> Self {
        self.raise = true;
        self
    }
}

/// Result of a pointer query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerStatus {
    pub root_x: i32,
    pub root_y: i32,
    /// Window under the pointer, if any.
    pub hovered: Option<WindowId>,
}

/// Commands and the blocking event source the core drives.
///
/// Every command is fire-and-forget from the core's perspective, but
/// [`Transport::flush`] must be called before the next event is read so
/// later events observe the command's effect in issue order.
pub trait Transport {
    /// Block until the next protocol event arrives.
    fn next_event(&mut self) -> Result<Event, TransportError>;

    fn configure(&mut self, handle: WindowId, cfg: Configure) -> Result<(), TransportError>;
    fn map_window(&mut self, handle: WindowId) -> Result<(), TransportError>;
    fn unmap_window(&mut self, handle: WindowId) -> Result<(), TransportError>;
    /// Ask the window to go away (close request).
    fn destroy_window(&mut self, handle: WindowId) -> Result<(), TransportError>;
    fn set_border_color(&mut self, handle: WindowId, pixel: u32) -> Result<(), TransportError>;
    fn set_input_focus(&mut self, handle: WindowId) -> Result<(), TransportError>;
    /// Current geometry of a window.
    fn geometry(&mut self, handle: WindowId) -> Result<Rect, TransportError>;
    fn query_pointer(&mut self) -> Result<PointerStatus, TransportError>;
    fn warp_pointer(&mut self, x: i32, y: i32) -> Result<(), TransportError>;
    fn flush(&mut self) -> Result<(), TransportError>;
}

/// Fire-and-forget spawner for auxiliary programs (terminal, menu).
pub trait Launcher {
    fn spawn(&self, command_line: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_rect_sets_geometry_fields() {
        let cfg = Configure::rect(Rect::new(1, 2, 3, 4));
        assert_eq!(cfg.x, Some(1));
        assert_eq!(cfg.y, Some(2));
        assert_eq!(cfg.width, Some(3));
        assert_eq!(cfg.height, Some(4));
        assert_eq!(cfg.border_width, None);
        assert!(!cfg.raise);
    }

    #[test]
    fn test_fatal_classification() {
        assert!(!TransportError::Stale(1).is_fatal());
        assert!(TransportError::ConnectionLost("eof".into()).is_fatal());
    }
}
