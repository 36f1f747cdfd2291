//! tagwm Platform X11
//!
//! X11 backend for tagwm, built on x11rb.
//!
//! This crate handles:
//! - The display connection and root-window event selection
//! - Translation of protocol events into the core event vocabulary
//! - Key/button grabs and keysym-to-keycode resolution
//! - Monitor discovery via RandR (with a root-screen fallback)
//! - Program spawning for the terminal and menu bindings

pub mod keys;

use std::process::Command;

use thiserror::Error;
use tracing::{debug, warn};
use x11rb::connection::Connection;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError};
use x11rb::protocol::randr::ConnectionExt as _;
use x11rb::protocol::xproto::{
    ButtonIndex, ChangeWindowAttributesAux, ConfigureWindowAux, ConnectionExt as _, EventMask,
    GrabMode, InputFocus, KeyButMask, ModMask, NotifyMode, StackMode, Window,
};
use x11rb::protocol::{ErrorKind, Event as XEvent};
use x11rb::rust_connection::RustConnection;

use tagwm_core::monitor::Monitor;
use tagwm_core::transport::{Configure, Event, Launcher, PointerStatus, Transport, TransportError};
use tagwm_core::{Rect, WindowId};

pub use keys::{keysym_from_name, modifier_from_name, Keymap, Keysym};
pub use x11rb::protocol::xproto::ModMask as Modifier;

/// Errors from X11 setup and requests.
#[derive(Debug, Error)]
pub enum X11Error {
    #[error("failed to connect to the X server: {0}")]
    Connect(#[from] ConnectError),

    #[error("X connection failed: {0}")]
    Connection(#[from] ConnectionError),

    #[error("X request failed: {0}")]
    Request(#[from] ReplyError),

    /// Another client already holds substructure redirection on the root.
    #[error("another window manager is already running")]
    AlreadyRunning,
}

/// Events a client window reports once it is under management. Selected when
/// the window is first mapped; hover focus depends on the enter mask.
fn client_event_mask() -> EventMask {
    EventMask::ENTER_WINDOW | EventMask::LEAVE_WINDOW | EventMask::FOCUS_CHANGE
}

/// The live X11 connection implementing the transport commands.
pub struct X11Transport {
    conn: RustConnection,
    root: Window,
    screen_width: u16,
    screen_height: u16,
}

impl X11Transport {
    /// Connect to the display and claim the root window's substructure
    /// redirection. Fails with [`X11Error::AlreadyRunning`] when another
    /// window manager holds it.
    pub fn connect() -> Result<Self, X11Error> {
        let (conn, screen_num) = x11rb::connect(None)?;
        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let screen_width = screen.width_in_pixels;
        let screen_height = screen.height_in_pixels;

        let mask = EventMask::SUBSTRUCTURE_REDIRECT
            | EventMask::SUBSTRUCTURE_NOTIFY
            | EventMask::POINTER_MOTION
            | EventMask::FOCUS_CHANGE;
        let attrs = ChangeWindowAttributesAux::new().event_mask(mask);
        let result = conn.change_window_attributes(root, &attrs)?.check();
        match result {
            Ok(()) => {}
            Err(ReplyError::X11Error(ref err)) if err.error_kind == ErrorKind::Access => {
                return Err(X11Error::AlreadyRunning);
            }
            Err(err) => return Err(err.into()),
        }
        conn.flush()?;

        debug!(screen = screen_num, root, "connected to X server");
        Ok(Self {
            conn,
            root,
            screen_width,
            screen_height,
        })
    }

    /// Connected outputs in ascending x-origin order. Falls back to a single
    /// monitor covering the root screen when RandR reports no active CRTC.
    pub fn monitors(&self) -> Result<Vec<Monitor>, X11Error> {
        let resources = self
            .conn
            .randr_get_screen_resources_current(self.root)?
            .reply()?;

        let mut monitors = Vec::new();
        for crtc in resources.crtcs {
            let info = self
                .conn
                .randr_get_crtc_info(crtc, resources.config_timestamp)?
                .reply()?;
            if info.width == 0 || info.height == 0 {
                continue;
            }
            monitors.push(Monitor::new(
                i32::from(info.width),
                i32::from(info.height),
                i32::from(info.x),
            ));
        }
        monitors.sort_by_key(|m| m.x_origin);

        if monitors.is_empty() {
            warn!("RandR reported no active outputs, using the root screen size");
            monitors.push(Monitor::new(
                i32::from(self.screen_width),
                i32::from(self.screen_height),
                0,
            ));
        }
        Ok(monitors)
    }

    /// Fetch the server's keysym table for binding resolution.
    pub fn keymap(&self) -> Result<Keymap, X11Error> {
        let (min, max) = {
            let setup = self.conn.setup();
            (setup.min_keycode, setup.max_keycode)
        };
        let reply = self.conn.get_keyboard_mapping(min, max - min + 1)?.reply()?;
        Ok(Keymap::new(min, reply.keysyms_per_keycode, reply.keysyms))
    }

    /// Grab a single keycode with the given modifiers on the root window.
    pub fn grab_key(&self, modifiers: ModMask, keycode: u8) -> Result<(), X11Error> {
        self.conn.grab_key(
            false,
            self.root,
            modifiers,
            keycode,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
        )?;
        Ok(())
    }

    /// Grab every pointer button with the given modifiers on the root
    /// window. Motion is included so drag gestures report while a button is
    /// held.
    pub fn grab_buttons(&self, modifiers: ModMask) -> Result<(), X11Error> {
        self.conn.grab_button(
            false,
            self.root,
            EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
            x11rb::NONE,
            x11rb::NONE,
            ButtonIndex::ANY,
            modifiers,
        )?;
        Ok(())
    }

    /// Translate a raw protocol event, or `None` for kinds the manager does
    /// not consume.
    fn translate(&self, event: XEvent) -> Option<Event> {
        match event {
            XEvent::MapRequest(e) => Some(Event::Created(e.window)),
            XEvent::DestroyNotify(e) => Some(Event::Destroyed(e.window)),
            XEvent::UnmapNotify(e) if e.event == self.root && !e.from_configure => {
                Some(Event::Unmapped(e.window))
            }
            // Enters synthesized by grab activation are not hover intent.
            XEvent::EnterNotify(e) if e.mode == NotifyMode::NORMAL => {
                Some(Event::PointerEntered(e.event))
            }
            XEvent::LeaveNotify(_) => Some(Event::PointerLeft),
            XEvent::KeyPress(e) => Some(Event::KeyDown {
                keycode: e.detail,
                shifted: u16::from(e.state) & u16::from(KeyButMask::SHIFT) != 0,
            }),
            XEvent::KeyRelease(e) => Some(Event::KeyUp { keycode: e.detail }),
            XEvent::ButtonPress(e) => Some(Event::ButtonDown {
                button: e.detail,
                root_x: i32::from(e.root_x),
                root_y: i32::from(e.root_y),
                target: (e.child != x11rb::NONE).then_some(e.child),
            }),
            XEvent::ButtonRelease(e) => Some(Event::ButtonUp { button: e.detail }),
            XEvent::MotionNotify(e) => Some(Event::PointerMoved {
                root_x: i32::from(e.root_x),
                root_y: i32::from(e.root_y),
            }),
            XEvent::FocusIn(e) if e.event != self.root => Some(Event::FocusGained(e.event)),
            XEvent::FocusOut(e) if e.event != self.root => Some(Event::FocusLost),
            XEvent::Error(err) => {
                // Asynchronous request failures, typically a command racing a
                // window's destruction. Recoverable, so log and move on.
                debug!(
                    kind = ?err.error_kind,
                    value = err.bad_value,
                    "ignoring X error event"
                );
                None
            }
            _ => None,
        }
    }
}

fn lost(err: ConnectionError) -> TransportError {
    TransportError::ConnectionLost(err.to_string())
}

/// Map a reply failure on `handle` to the transport taxonomy: protocol-level
/// errors mean the window is gone, everything else is connection loss.
fn reply_error(handle: WindowId, err: ReplyError) -> TransportError {
    match err {
        ReplyError::X11Error(_) => TransportError::Stale(handle),
        ReplyError::ConnectionError(err) => lost(err),
    }
}

impl Transport for X11Transport {
    fn next_event(&mut self) -> Result<Event, TransportError> {
        loop {
            let raw = self.conn.wait_for_event().map_err(lost)?;
            if let Some(event) = self.translate(raw) {
                return Ok(event);
            }
        }
    }

    fn configure(&mut self, handle: WindowId, cfg: Configure) -> Result<(), TransportError> {
        let mut aux = ConfigureWindowAux::new();
        aux.x = cfg.x;
        aux.y = cfg.y;
        // Protocol sizes are unsigned; the core already floors at 1 pixel.
        aux.width = cfg.width.map(|w| w.max(1) as u32);
        aux.height = cfg.height.map(|h| h.max(1) as u32);
        aux.border_width = cfg.border_width.map(|b| b.max(0) as u32);
        if cfg.raise {
            aux.stack_mode = Some(StackMode::ABOVE);
        }
        self.conn.configure_window(handle, &aux).map_err(lost)?;
        Ok(())
    }

    fn map_window(&mut self, handle: WindowId) -> Result<(), TransportError> {
        let attrs = ChangeWindowAttributesAux::new().event_mask(client_event_mask());
        self.conn
            .change_window_attributes(handle, &attrs)
            .map_err(lost)?;
        self.conn.map_window(handle).map_err(lost)?;
        Ok(())
    }

    fn unmap_window(&mut self, handle: WindowId) -> Result<(), TransportError> {
        self.conn.unmap_window(handle).map_err(lost)?;
        Ok(())
    }

    fn destroy_window(&mut self, handle: WindowId) -> Result<(), TransportError> {
        self.conn.destroy_window(handle).map_err(lost)?;
        Ok(())
    }

    fn set_border_color(&mut self, handle: WindowId, pixel: u32) -> Result<(), TransportError> {
        let attrs = ChangeWindowAttributesAux::new().border_pixel(pixel);
        self.conn
            .change_window_attributes(handle, &attrs)
            .map_err(lost)?;
        Ok(())
    }

    fn set_input_focus(&mut self, handle: WindowId) -> Result<(), TransportError> {
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, handle, x11rb::CURRENT_TIME)
            .map_err(lost)?;
        Ok(())
    }

    fn geometry(&mut self, handle: WindowId) -> Result<Rect, TransportError> {
        let reply = self
            .conn
            .get_geometry(handle)
            .map_err(lost)?
            .reply()
            .map_err(|e| reply_error(handle, e))?;
        Ok(Rect::new(
            i32::from(reply.x),
            i32::from(reply.y),
            i32::from(reply.width),
            i32::from(reply.height),
        ))
    }

    fn query_pointer(&mut self) -> Result<PointerStatus, TransportError> {
        let reply = self
            .conn
            .query_pointer(self.root)
            .map_err(lost)?
            .reply()
            .map_err(|e| reply_error(self.root, e))?;
        Ok(PointerStatus {
            root_x: i32::from(reply.root_x),
            root_y: i32::from(reply.root_y),
            hovered: (reply.child != x11rb::NONE).then_some(reply.child),
        })
    }

    fn warp_pointer(&mut self, x: i32, y: i32) -> Result<(), TransportError> {
        self.conn
            .warp_pointer(x11rb::NONE, self.root, 0, 0, 0, 0, x as i16, y as i16)
            .map_err(lost)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.conn.flush().map_err(lost)
    }
}

/// Spawns programs detached through the shell, matching how the terminal and
/// menu commands are written in the configuration.
#[derive(Debug, Default)]
pub struct ShellLauncher;

impl Launcher for ShellLauncher {
    fn spawn(&self, command_line: &str) {
        match Command::new("/bin/sh").arg("-c").arg(command_line).spawn() {
            Ok(child) => debug!(pid = child.id(), command = command_line, "spawned"),
            Err(err) => warn!(command = command_line, %err, "failed to spawn"),
        }
    }
}
