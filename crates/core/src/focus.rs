//! Input focus state and the eligibility rule.
//!
//! The state itself is a single `Option<WindowId>`; the decoration and
//! stacking side effects of a focus transfer are issued by the dispatcher,
//! which is the one choke point allowed to mutate this state alongside
//! transport commands.

use thiserror::Error;

use crate::registry::WindowRegistry;
use crate::view::CurrentView;
use crate::WindowId;

/// Why a window may not receive focus.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FocusError {
    #[error("window {0} is not registered")]
    NotRegistered(WindowId),

    #[error("window {0} is not on a visible view")]
    NotVisible(WindowId),
}

/// The window currently holding input focus.
///
/// Invariant: when set, the handle references a registry entry whose tag is
/// the current tag of its monitor. The eligibility check below is the only
/// gate through which the dispatcher admits a new value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusState {
    pub current: Option<WindowId>,
}

impl FocusState {
    /// Drop the focus if it points at `handle`. Used when a window is
    /// unregistered or becomes invisible; issues no protocol commands.
    pub fn clear_if(&mut self, handle: WindowId) {
        if self.current == Some(handle) {
            self.current = None;
        }
    }
}

/// A handle is focusable only if it is registered and its (tag, monitor)
/// matches the view currently shown on its monitor.
pub fn ensure_eligible(
    registry: &WindowRegistry,
    view: &CurrentView,
    handle: WindowId,
) -> Result<(), FocusError> {
    let entry = registry
        .find(handle)
        .ok_or(FocusError::NotRegistered(handle))?;
    if !view.is_visible(entry) {
        return Err(FocusError::NotVisible(handle));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_window_is_not_eligible() {
        let registry = WindowRegistry::new();
        let view = CurrentView::new(1);

        assert_eq!(
            ensure_eligible(&registry, &view, 7),
            Err(FocusError::NotRegistered(7))
        );
    }

    #[test]
    fn test_hidden_window_is_not_eligible() {
        let mut registry = WindowRegistry::new();
        registry.register(7, 3, 0).unwrap();
        let view = CurrentView::new(1); // showing tag 1

        assert_eq!(
            ensure_eligible(&registry, &view, 7),
            Err(FocusError::NotVisible(7))
        );
    }

    #[test]
    fn test_visible_window_is_eligible() {
        let mut registry = WindowRegistry::new();
        registry.register(7, 3, 0).unwrap();
        let mut view = CurrentView::new(1);
        view.set_tag(0, 3);

        assert_eq!(ensure_eligible(&registry, &view, 7), Ok(()));
    }

    #[test]
    fn test_clear_if_only_matches_own_handle() {
        let mut focus = FocusState { current: Some(7) };
        focus.clear_if(8);
        assert_eq!(focus.current, Some(7));
        focus.clear_if(7);
        assert_eq!(focus.current, None);
    }
}
