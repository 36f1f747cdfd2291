//! The event dispatcher: the single component that mutates manager state and
//! issues transport commands.
//!
//! Each protocol event is handled to completion before the next one is read.
//! Recoverable command failures (a window vanishing under us) are logged and
//! dropped; only connection loss propagates out of [`Dispatcher::handle_event`].

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use tagwm_core::drag::DragState;
use tagwm_core::focus::{self, FocusState};
use tagwm_core::layout;
use tagwm_core::monitor::{monitor_at, Monitor};
use tagwm_core::registry::{RegistryError, WindowRegistry};
use tagwm_core::suppress::{SuppressReason, Suppression};
use tagwm_core::transport::{Configure, Event, Launcher, Transport, TransportError};
use tagwm_core::view::CurrentView;
use tagwm_core::{Rect, TagId, WindowId};

/// A keyboard action bound to modifier+key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CycleForward,
    CycleBackward,
    ToggleTiling,
    ToggleMaximize,
    Center,
    Close,
    SpawnTerminal,
    SpawnMenu,
    Quit,
}

/// Resolved keycode bindings. Built once at startup from the configuration
/// and the server keymap.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    actions: HashMap<u8, Action>,
    tags: HashMap<u8, TagId>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_action(&mut self, keycode: u8, action: Action) {
        self.actions.insert(keycode, action);
    }

    pub fn bind_tag(&mut self, keycode: u8, tag: TagId) {
        self.tags.insert(keycode, tag);
    }

    pub fn action(&self, keycode: u8) -> Option<Action> {
        self.actions.get(&keycode).copied()
    }

    pub fn tag(&self, keycode: u8) -> Option<TagId> {
        self.tags.get(&keycode).copied()
    }

    /// Keycodes grabbed with the bare modifier.
    pub fn action_keycodes(&self) -> impl Iterator<Item = u8> + '_ {
        self.actions.keys().copied()
    }

    /// Keycodes grabbed both bare and shifted (view switch vs. window move).
    pub fn tag_keycodes(&self) -> impl Iterator<Item = u8> + '_ {
        self.tags.keys().copied()
    }
}

/// Border decoration resolved from the configuration.
#[derive(Debug, Clone, Copy)]
pub struct Decor {
    pub border_width: i32,
    pub active_pixel: u32,
    pub inactive_pixel: u32,
}

/// Command lines for the spawn bindings.
#[derive(Debug, Clone)]
pub struct Commands {
    pub terminal: String,
    pub menu: String,
}

/// Owns all manager state and reacts to transport events.
pub struct Dispatcher {
    monitors: Vec<Monitor>,
    registry: WindowRegistry,
    focus: FocusState,
    view: CurrentView,
    drag: DragState,
    suppression: Suppression,
    /// Views with tiling enabled. Absent means floating.
    tiled: HashSet<(TagId, tagwm_core::MonitorId)>,
    /// Cycle position remembered while no window is focused.
    cycle_pos: usize,
    /// Pre-maximize geometry, captured when a window is maximized and taken
    /// back when the toggle restores it.
    restore: HashMap<WindowId, Rect>,
    decor: Decor,
    bindings: Bindings,
    commands: Commands,
    launcher: Box<dyn Launcher>,
    running: bool,
}

impl Dispatcher {
    pub fn new(
        monitors: Vec<Monitor>,
        decor: Decor,
        bindings: Bindings,
        commands: Commands,
        launcher: Box<dyn Launcher>,
    ) -> Self {
        let view = CurrentView::new(monitors.len());
        Self {
            monitors,
            registry: WindowRegistry::new(),
            focus: FocusState::default(),
            view,
            drag: DragState::default(),
            suppression: Suppression::default(),
            tiled: HashSet::new(),
            cycle_pos: 0,
            restore: HashMap::new(),
            decor,
            bindings,
            commands,
            launcher,
            running: true,
        }
    }

    /// False once the quit binding has fired; the event loop exits.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The window currently holding focus, if any.
    pub fn focused(&self) -> Option<WindowId> {
        self.focus.current
    }

    /// Point the current monitor at a root x-coordinate. Called with the
    /// initial pointer position before the first event.
    pub fn track_monitor(&mut self, root_x: i32) {
        let monitor = monitor_at(&self.monitors, root_x);
        if monitor != self.view.monitor {
            debug!(monitor, "current monitor changed");
            self.view.monitor = monitor;
        }
    }

    /// Handle one event to completion. Only fatal transport errors escape.
    pub fn handle_event<T: Transport>(
        &mut self,
        transport: &mut T,
        event: Event,
    ) -> Result<(), TransportError> {
        match event {
            Event::Created(handle) => self.on_created(transport, handle),
            Event::Destroyed(handle) => self.on_destroyed(transport, handle),
            Event::Unmapped(handle) => self.on_unmapped(transport, handle),
            Event::PointerEntered(handle) => self.on_pointer_entered(transport, handle),
            Event::PointerLeft => Ok(()),
            Event::KeyDown { keycode, shifted } => self.on_key(transport, keycode, shifted),
            Event::KeyUp { .. } => Ok(()),
            Event::ButtonDown {
                button,
                root_x,
                root_y,
                target,
            } => self.on_button_down(transport, button, root_x, root_y, target),
            Event::ButtonUp { .. } => {
                self.drag.release();
                Ok(())
            }
            Event::PointerMoved { root_x, root_y } => self.on_pointer_moved(transport, root_x, root_y),
            Event::FocusGained(handle) => self.on_focus_gained(transport, handle),
            Event::FocusLost => Ok(()),
        }
    }

    fn on_created<T: Transport>(
        &mut self,
        transport: &mut T,
        handle: WindowId,
    ) -> Result<(), TransportError> {
        if self.suppression.consume() == Some(SuppressReason::MenuSpawn) {
            // The helper window is shown but never tracked.
            debug!(handle, "mapping untracked helper window");
            return allow_stale(transport.map_window(handle));
        }

        if self.registry.contains(handle) {
            // A repeated map request for a window we already manage.
            return allow_stale(transport.map_window(handle));
        }

        let tag = self.view.current_tag();
        let monitor = self.view.monitor;
        if let Err(err) = self.registry.register(handle, tag, monitor) {
            warn!(handle, %err, "could not track new window");
            return Ok(());
        }
        info!(handle, tag, monitor, "managing new window");

        allow_stale(transport.configure(
            handle,
            Configure::new().border_width(self.decor.border_width),
        ))?;
        allow_stale(transport.set_border_color(handle, self.decor.inactive_pixel))?;

        if self.tiled.contains(&(tag, monitor)) {
            self.retile(transport, tag, monitor)?;
        } else if let Some(rect) = try_geometry(transport, handle)? {
            let (cx, cy) = self.monitors[monitor].center();
            allow_stale(transport.configure(handle, Configure::rect(rect.centered_on(cx, cy))))?;
        }

        allow_stale(transport.map_window(handle))?;
        self.focus_window(transport, handle)
    }

    fn on_destroyed<T: Transport>(
        &mut self,
        transport: &mut T,
        handle: WindowId,
    ) -> Result<(), TransportError> {
        if let DragState::Dragging(drag) = self.drag {
            if drag.handle == handle {
                self.drag.release();
            }
        }

        let entry = match self.registry.unregister(handle) {
            Ok(entry) => entry,
            // Unmap and destroy both report removal; the second is a no-op.
            Err(RegistryError::NotFound(_)) => return Ok(()),
            Err(err) => {
                warn!(handle, %err, "could not untrack window");
                return Ok(());
            }
        };
        info!(handle, tag = entry.tag, monitor = entry.monitor, "window went away");
        self.restore.remove(&handle);

        let remaining = self
            .registry
            .handles_for(self.view.current_tag(), self.view.monitor)
            .len();
        self.cycle_pos = self.cycle_pos.min(remaining.saturating_sub(1));

        if self.view.tag_of(entry.monitor) == entry.tag {
            self.retile(transport, entry.tag, entry.monitor)?;
        }

        if self.focus.current == Some(handle) {
            self.focus.clear_if(handle);
            if let Some(next) = self.registry.most_recent_for(entry.tag, entry.monitor) {
                self.focus_window(transport, next)?;
            }
            // No fallback window means no focus command at all.
        }
        Ok(())
    }

    fn on_unmapped<T: Transport>(
        &mut self,
        transport: &mut T,
        handle: WindowId,
    ) -> Result<(), TransportError> {
        let Some(entry) = self.registry.find(handle).copied() else {
            return Ok(());
        };
        if self.view.is_visible(&entry) {
            // A visible window unmapped by its client is a withdrawal.
            self.on_destroyed(transport, handle)
        } else {
            // Echo of hiding the window ourselves for a tag switch.
            Ok(())
        }
    }

    fn on_pointer_entered<T: Transport>(
        &mut self,
        transport: &mut T,
        handle: WindowId,
    ) -> Result<(), TransportError> {
        // Crossing events during a drag or right after a helper spawn do not
        // shift focus.
        if self.drag.is_dragging() || self.suppression.is_active() {
            return Ok(());
        }
        self.focus_window(transport, handle)
    }

    fn on_key<T: Transport>(
        &mut self,
        transport: &mut T,
        keycode: u8,
        shifted: bool,
    ) -> Result<(), TransportError> {
        if let Some(action) = self.bindings.action(keycode) {
            return self.run_action(transport, action);
        }
        if let Some(tag) = self.bindings.tag(keycode) {
            return if shifted {
                self.move_focused_to_tag(transport, tag)
            } else {
                self.switch_tag(transport, tag)
            };
        }
        debug!(keycode, "unbound key");
        Ok(())
    }

    fn on_button_down<T: Transport>(
        &mut self,
        transport: &mut T,
        button: u8,
        root_x: i32,
        root_y: i32,
        target: Option<WindowId>,
    ) -> Result<(), TransportError> {
        self.track_monitor(root_x);

        let Some(handle) = target else {
            return Ok(());
        };
        if !self.registry.contains(handle) {
            return Ok(());
        }

        self.focus_window(transport, handle)?;
        if let Some(rect) = try_geometry(transport, handle)? {
            self.drag.begin(handle, button, root_x, root_y, rect);
        }
        Ok(())
    }

    fn on_pointer_moved<T: Transport>(
        &mut self,
        transport: &mut T,
        root_x: i32,
        root_y: i32,
    ) -> Result<(), TransportError> {
        self.track_monitor(root_x);
        if let Some((handle, rect)) = self.drag.motion(root_x, root_y) {
            allow_stale(transport.configure(handle, Configure::rect(rect)))?;
        }
        Ok(())
    }

    fn on_focus_gained<T: Transport>(
        &mut self,
        transport: &mut T,
        handle: WindowId,
    ) -> Result<(), TransportError> {
        // Echo of our own focus command; reasserting the border is
        // idempotent. Focus reports for other windows are ignored, the
        // manager's own state is authoritative.
        if self.focus.current == Some(handle) {
            allow_stale(transport.set_border_color(handle, self.decor.active_pixel))?;
        }
        Ok(())
    }

    /// The single place focus is granted. Skips ineligible handles, repaints
    /// borders, raises, and moves protocol input focus.
    fn focus_window<T: Transport>(
        &mut self,
        transport: &mut T,
        handle: WindowId,
    ) -> Result<(), TransportError> {
        if self.focus.current == Some(handle) {
            return Ok(());
        }
        if let Err(err) = focus::ensure_eligible(&self.registry, &self.view, handle) {
            debug!(handle, %err, "focus refused");
            return Ok(());
        }

        if let Some(previous) = self.focus.current {
            allow_stale(transport.set_border_color(previous, self.decor.inactive_pixel))?;
        }
        allow_stale(transport.set_border_color(handle, self.decor.active_pixel))?;
        allow_stale(transport.configure(handle, Configure::new().raise()))?;
        allow_stale(transport.set_input_focus(handle))?;
        self.focus.current = Some(handle);

        if let Some(entry) = self.registry.find(handle) {
            let order = self.registry.handles_for(entry.tag, entry.monitor);
            if let Some(pos) = order.iter().position(|&h| h == handle) {
                self.cycle_pos = pos;
            }
        }
        Ok(())
    }

    /// Take focus away without granting it elsewhere. The window keeps
    /// existing, so it gives up the active border on the way out.
    fn defocus<T: Transport>(&mut self, transport: &mut T) -> Result<(), TransportError> {
        if let Some(previous) = self.focus.current.take() {
            allow_stale(transport.set_border_color(previous, self.decor.inactive_pixel))?;
        }
        Ok(())
    }

    fn run_action<T: Transport>(
        &mut self,
        transport: &mut T,
        action: Action,
    ) -> Result<(), TransportError> {
        debug!(?action, "running action");
        match action {
            Action::CycleForward => self.cycle(transport, 1),
            Action::CycleBackward => self.cycle(transport, -1),
            Action::ToggleTiling => self.toggle_tiling(transport),
            Action::ToggleMaximize => self.toggle_maximize(transport),
            Action::Center => self.center_focused(transport),
            Action::Close => {
                if let Some(handle) = self.focus.current {
                    allow_stale(transport.destroy_window(handle))?;
                }
                Ok(())
            }
            Action::SpawnTerminal => {
                self.launcher.spawn(&self.commands.terminal);
                Ok(())
            }
            Action::SpawnMenu => {
                self.launcher.spawn(&self.commands.menu);
                self.suppression.arm(SuppressReason::MenuSpawn);
                Ok(())
            }
            Action::Quit => {
                info!("quit requested");
                self.running = false;
                Ok(())
            }
        }
    }

    fn cycle<T: Transport>(&mut self, transport: &mut T, step: i64) -> Result<(), TransportError> {
        let order = self
            .registry
            .handles_for(self.view.current_tag(), self.view.monitor);
        if order.is_empty() {
            return Ok(());
        }

        let position = self
            .focus
            .current
            .and_then(|h| order.iter().position(|&o| o == h))
            .unwrap_or_else(|| self.cycle_pos.min(order.len() - 1));
        let next = (position as i64 + step).rem_euclid(order.len() as i64) as usize;
        self.focus_window(transport, order[next])
    }

    fn toggle_tiling<T: Transport>(&mut self, transport: &mut T) -> Result<(), TransportError> {
        let key = (self.view.current_tag(), self.view.monitor);
        if self.tiled.remove(&key) {
            // Back to floating; windows keep their last tiled geometry.
            info!(tag = key.0, monitor = key.1, "tiling disabled");
            return Ok(());
        }
        info!(tag = key.0, monitor = key.1, "tiling enabled");
        self.tiled.insert(key);
        self.retile(transport, key.0, key.1)
    }

    /// Recompute columns for a view if it has tiling enabled.
    fn retile<T: Transport>(
        &mut self,
        transport: &mut T,
        tag: TagId,
        monitor: tagwm_core::MonitorId,
    ) -> Result<(), TransportError> {
        if !self.tiled.contains(&(tag, monitor)) {
            return Ok(());
        }
        let handles = self.registry.handles_for(tag, monitor);
        for placement in layout::tile(&self.monitors[monitor], &handles, self.decor.border_width) {
            allow_stale(transport.configure(placement.handle, Configure::rect(placement.rect)))?;
        }
        Ok(())
    }

    fn toggle_maximize<T: Transport>(&mut self, transport: &mut T) -> Result<(), TransportError> {
        let Some(handle) = self.focus.current else {
            return Ok(());
        };
        let Some(entry) = self.registry.find(handle).copied() else {
            return Ok(());
        };
        let monitor = self.monitors[entry.monitor];
        let maximized = monitor.maximized_rect(self.decor.border_width);

        let Some(current) = try_geometry(transport, handle)? else {
            return Ok(());
        };
        let target = if current == maximized {
            // Restore the geometry captured when the window was maximized.
            // A window that was never maximized by us falls back to a
            // centered half-size rectangle.
            self.restore.remove(&handle).unwrap_or_else(|| {
                let (cx, cy) = monitor.center();
                Rect::new(0, 0, monitor.width / 2, monitor.height / 2).centered_on(cx, cy)
            })
        } else {
            self.restore.insert(handle, current);
            maximized
        };
        allow_stale(transport.configure(handle, Configure::rect(target).raise()))
    }

    fn center_focused<T: Transport>(&mut self, transport: &mut T) -> Result<(), TransportError> {
        let Some(handle) = self.focus.current else {
            return Ok(());
        };
        let Some(entry) = self.registry.find(handle).copied() else {
            return Ok(());
        };
        let Some(rect) = try_geometry(transport, handle)? else {
            return Ok(());
        };
        let (cx, cy) = self.monitors[entry.monitor].center();
        allow_stale(transport.configure(handle, Configure::rect(rect.centered_on(cx, cy))))?;
        allow_stale(transport.warp_pointer(cx, cy))
    }

    /// Show `tag` on the current monitor, remapping windows accordingly.
    fn switch_tag<T: Transport>(&mut self, transport: &mut T, tag: TagId) -> Result<(), TransportError> {
        let monitor = self.view.monitor;
        if self.view.tag_of(monitor) == tag {
            // Re-applying visibility is idempotent; focus is untouched.
            return self.apply_visibility(transport, monitor);
        }
        info!(tag, monitor, "switching view");
        self.drag.release();
        self.view.set_tag(monitor, tag);

        self.apply_visibility(transport, monitor)?;
        self.retile(transport, tag, monitor)?;

        if let Some(next) = self.registry.most_recent_for(tag, monitor) {
            self.focus_window(transport, next)?;
        } else if let Some(current) = self.focus.current {
            // The focused window may have just been hidden. It still exists
            // and will be shown again later, so repaint it inactive before
            // forgetting it.
            if focus::ensure_eligible(&self.registry, &self.view, current).is_err() {
                self.defocus(transport)?;
            }
        }
        Ok(())
    }

    /// Move the focused window to `tag`, hiding it from the current view.
    fn move_focused_to_tag<T: Transport>(
        &mut self,
        transport: &mut T,
        tag: TagId,
    ) -> Result<(), TransportError> {
        let Some(handle) = self.focus.current else {
            return Ok(());
        };
        let Some(entry) = self.registry.find(handle).copied() else {
            return Ok(());
        };
        if entry.tag == tag {
            return Ok(());
        }
        info!(handle, from = entry.tag, to = tag, "moving window to tag");

        if let Err(err) = self.registry.set_tag(handle, tag) {
            warn!(handle, %err, "could not retag window");
            return Ok(());
        }
        self.apply_visibility(transport, entry.monitor)?;
        self.retile(transport, entry.tag, entry.monitor)?;

        self.defocus(transport)?;
        if let Some(next) = self.registry.most_recent_for(self.view.tag_of(entry.monitor), entry.monitor) {
            self.focus_window(transport, next)?;
        }
        Ok(())
    }

    /// Map every visible window and unmap every hidden one on a monitor.
    fn apply_visibility<T: Transport>(
        &mut self,
        transport: &mut T,
        monitor: tagwm_core::MonitorId,
    ) -> Result<(), TransportError> {
        let shown = self.view.tag_of(monitor);
        let changes: Vec<(WindowId, bool)> = self
            .registry
            .entries()
            .iter()
            .filter(|e| e.monitor == monitor)
            .map(|e| (e.handle, e.tag == shown))
            .collect();
        for (handle, visible) in changes {
            if visible {
                allow_stale(transport.map_window(handle))?;
            } else {
                allow_stale(transport.unmap_window(handle))?;
            }
        }
        Ok(())
    }
}

/// Drop recoverable command failures, keeping only connection loss.
fn allow_stale(result: Result<(), TransportError>) -> Result<(), TransportError> {
    match result {
        Err(err) if !err.is_fatal() => {
            debug!(%err, "dropping command to vanished window");
            Ok(())
        }
        other => other,
    }
}

/// Geometry query that treats a vanished window as "no geometry".
fn try_geometry<T: Transport>(
    transport: &mut T,
    handle: WindowId,
) -> Result<Option<Rect>, TransportError> {
    match transport.geometry(handle) {
        Ok(rect) => Ok(Some(rect)),
        Err(err) if !err.is_fatal() => {
            debug!(handle, %err, "geometry query hit a vanished window");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
