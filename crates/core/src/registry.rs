//! The authoritative set of tracked windows.
//!
//! The registry exclusively owns [`WindowEntry`] records; the protocol
//! transport owns the underlying window resources. Entries are kept in
//! insertion order, which is also the cycle order and the left-to-right
//! tiling order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{MonitorId, TagId, WindowId};

/// Errors from registry mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("window {0} is already registered")]
    DuplicateHandle(WindowId),

    #[error("window {0} is not registered")]
    NotFound(WindowId),
}

/// A tracked window and its (tag, monitor) assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowEntry {
    pub handle: WindowId,
    pub tag: TagId,
    pub monitor: MonitorId,
}

/// Insertion-ordered registry of tracked windows.
///
/// Invariant: at most one entry per handle at any time.
#[derive(Debug, Clone, Default)]
pub struct WindowRegistry {
    entries: Vec<WindowEntry>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new window on the given view. Fails if the handle is already
    /// present.
    pub fn register(
        &mut self,
        handle: WindowId,
        tag: TagId,
        monitor: MonitorId,
    ) -> Result<&WindowEntry, RegistryError> {
        if self.contains(handle) {
            return Err(RegistryError::DuplicateHandle(handle));
        }
        self.entries.push(WindowEntry { handle, tag, monitor });
        Ok(self.entries.last().unwrap_or_else(|| unreachable!()))
    }

    /// Remove a window. Callers must update focus/cycle/tiling state that
    /// referenced the removed entry in the same logical transaction.
    pub fn unregister(&mut self, handle: WindowId) -> Result<WindowEntry, RegistryError> {
        match self.entries.iter().position(|e| e.handle == handle) {
            Some(pos) => Ok(self.entries.remove(pos)),
            None => Err(RegistryError::NotFound(handle)),
        }
    }

    pub fn find(&self, handle: WindowId) -> Option<&WindowEntry> {
        self.entries.iter().find(|e| e.handle == handle)
    }

    pub fn contains(&self, handle: WindowId) -> bool {
        self.find(handle).is_some()
    }

    /// Reassign a window's tag.
    pub fn set_tag(&mut self, handle: WindowId, tag: TagId) -> Result<(), RegistryError> {
        match self.entries.iter_mut().find(|e| e.handle == handle) {
            Some(entry) => {
                entry.tag = tag;
                Ok(())
            }
            None => Err(RegistryError::NotFound(handle)),
        }
    }

    /// Reassign a window's monitor.
    pub fn set_monitor(&mut self, handle: WindowId, monitor: MonitorId) -> Result<(), RegistryError> {
        match self.entries.iter_mut().find(|e| e.handle == handle) {
            Some(entry) => {
                entry.monitor = monitor;
                Ok(())
            }
            None => Err(RegistryError::NotFound(handle)),
        }
    }

    /// All entries, insertion order.
    pub fn entries(&self) -> &[WindowEntry] {
        &self.entries
    }

    /// Handles of the windows on a (tag, monitor) view, insertion order.
    /// This order is stable and deterministic: it is the tiling
    /// left-to-right order and the cycle order.
    pub fn handles_for(&self, tag: TagId, monitor: MonitorId) -> Vec<WindowId> {
        self.entries
            .iter()
            .filter(|e| e.tag == tag && e.monitor == monitor)
            .map(|e| e.handle)
            .collect()
    }

    /// The most recently registered window on a view, if any.
    pub fn most_recent_for(&self, tag: TagId, monitor: MonitorId) -> Option<WindowId> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.tag == tag && e.monitor == monitor)
            .map(|e| e.handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_find() {
        let mut reg = WindowRegistry::new();
        reg.register(10, 1, 0).unwrap();

        let entry = reg.find(10).unwrap();
        assert_eq!(entry.tag, 1);
        assert_eq!(entry.monitor, 0);
        assert!(reg.find(11).is_none());
    }

    #[test]
    fn test_duplicate_handle_rejected() {
        let mut reg = WindowRegistry::new();
        reg.register(10, 1, 0).unwrap();

        assert_eq!(
            reg.register(10, 2, 1),
            Err(RegistryError::DuplicateHandle(10))
        );
        // The original entry is untouched.
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.find(10).unwrap().tag, 1);
    }

    #[test]
    fn test_unregister_missing_reports_not_found() {
        let mut reg = WindowRegistry::new();
        assert_eq!(reg.unregister(42), Err(RegistryError::NotFound(42)));
    }

    #[test]
    fn test_handles_for_is_insertion_order() {
        let mut reg = WindowRegistry::new();
        reg.register(3, 1, 0).unwrap();
        reg.register(1, 1, 0).unwrap();
        reg.register(2, 2, 0).unwrap();
        reg.register(4, 1, 0).unwrap();

        assert_eq!(reg.handles_for(1, 0), vec![3, 1, 4]);
        assert_eq!(reg.handles_for(2, 0), vec![2]);
        assert_eq!(reg.handles_for(1, 1), Vec::<WindowId>::new());
    }

    #[test]
    fn test_handles_for_never_returns_unregistered() {
        let mut reg = WindowRegistry::new();
        reg.register(1, 1, 0).unwrap();
        reg.register(2, 1, 0).unwrap();
        reg.unregister(1).unwrap();

        assert_eq!(reg.handles_for(1, 0), vec![2]);
        assert!(!reg.contains(1));
    }

    #[test]
    fn test_reregister_after_unregister() {
        let mut reg = WindowRegistry::new();
        reg.register(1, 1, 0).unwrap();
        reg.unregister(1).unwrap();
        reg.register(1, 3, 1).unwrap();

        let entry = reg.find(1).unwrap();
        assert_eq!(entry.tag, 3);
        assert_eq!(entry.monitor, 1);
    }

    #[test]
    fn test_set_tag_moves_between_views() {
        let mut reg = WindowRegistry::new();
        reg.register(1, 1, 0).unwrap();
        reg.set_tag(1, 5).unwrap();

        assert_eq!(reg.handles_for(1, 0), Vec::<WindowId>::new());
        assert_eq!(reg.handles_for(5, 0), vec![1]);
        assert_eq!(reg.set_tag(9, 5), Err(RegistryError::NotFound(9)));
    }

    #[test]
    fn test_most_recent_for() {
        let mut reg = WindowRegistry::new();
        assert_eq!(reg.most_recent_for(1, 0), None);

        reg.register(1, 1, 0).unwrap();
        reg.register(2, 1, 0).unwrap();
        reg.register(3, 2, 0).unwrap();

        assert_eq!(reg.most_recent_for(1, 0), Some(2));
        assert_eq!(reg.most_recent_for(2, 0), Some(3));
    }
}
