//! The current view: which tag each monitor displays, and which monitor the
//! pointer is on.

use serde::{Deserialize, Serialize};

use crate::registry::WindowEntry;
use crate::{MonitorId, TagId};

/// Default tag shown on every monitor at startup.
pub const DEFAULT_TAG: TagId = 1;

/// The tag currently displayed on each monitor, plus the monitor that owns
/// new windows and keyboard actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentView {
    /// Monitor the pointer was last seen on.
    pub monitor: MonitorId,
    tags: Vec<TagId>,
}

impl CurrentView {
    pub fn new(monitor_count: usize) -> Self {
        Self {
            monitor: 0,
            tags: vec![DEFAULT_TAG; monitor_count],
        }
    }

    /// Tag currently shown on a monitor.
    pub fn tag_of(&self, monitor: MonitorId) -> TagId {
        self.tags[monitor]
    }

    /// Tag shown on the current monitor.
    pub fn current_tag(&self) -> TagId {
        self.tags[self.monitor]
    }

    pub fn set_tag(&mut self, monitor: MonitorId, tag: TagId) {
        self.tags[monitor] = tag;
    }

    /// Whether a registry entry is on the view currently shown on its
    /// monitor. Only visible windows may be mapped or focused.
    pub fn is_visible(&self, entry: &WindowEntry) -> bool {
        entry.tag == self.tag_of(entry.monitor)
    }
}
