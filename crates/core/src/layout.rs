//! Tiling layout computation.
//!
//! Splits a monitor's width evenly into one column per window. The function
//! is pure: it reads only its arguments and recomputes the full layout every
//! time, so calling it twice on unchanged input yields identical geometry.

use crate::monitor::Monitor;
use crate::{Rect, WindowId};

/// Computed target geometry for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub handle: WindowId,
    pub rect: Rect,
}

/// Compute non-overlapping column rectangles for the given windows on one
/// monitor, in the order given (registry insertion order).
///
/// Each of the `n` windows gets a column of `floor(monitor.width / n)`
/// pixels, full monitor height, with the border subtracted from the interior
/// size so the decorated window fits its column. An empty window list
/// produces no placements.
pub fn tile(monitor: &Monitor, windows: &[WindowId], border_width: i32) -> Vec<Placement> {
    if windows.is_empty() {
        return Vec::new();
    }

    let count = windows.len() as i32;
    let column_width = monitor.width / count;

    windows
        .iter()
        .enumerate()
        .map(|(i, &handle)| Placement {
            handle,
            rect: Rect::new(
                monitor.x_origin + i as i32 * column_width,
                0,
                column_width - 2 * border_width,
                monitor.height - 2 * border_width,
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_produces_no_placements() {
        let monitor = Monitor::new(1200, 800, 0);
        assert!(tile(&monitor, &[], 2).is_empty());
    }

    #[test]
    fn test_three_columns_at_1200() {
        let monitor = Monitor::new(1200, 800, 0);
        let placements = tile(&monitor, &[10, 11, 12], 2);

        assert_eq!(placements.len(), 3);
        assert_eq!(placements[0].rect, Rect::new(0, 0, 396, 796));
        assert_eq!(placements[1].rect, Rect::new(400, 0, 396, 796));
        assert_eq!(placements[2].rect, Rect::new(800, 0, 396, 796));
    }

    #[test]
    fn test_columns_respect_monitor_origin() {
        let monitor = Monitor::new(1000, 600, 1920);
        let placements = tile(&monitor, &[1, 2], 1);

        assert_eq!(placements[0].rect.x, 1920);
        assert_eq!(placements[1].rect.x, 2420);
    }

    #[test]
    fn test_no_horizontal_overlap_and_equal_heights() {
        let monitor = Monitor::new(1366, 768, 0);
        let windows: Vec<WindowId> = (1..=5).collect();
        let placements = tile(&monitor, &windows, 2);

        for pair in placements.windows(2) {
            assert!(pair[0].rect.right() <= pair[1].rect.x);
        }
        assert!(placements.iter().all(|p| p.rect.height == 768 - 4));

        // Column strides cover the usable width up to rounding on the last
        // column.
        let stride = monitor.width / windows.len() as i32;
        let covered = stride * windows.len() as i32;
        assert!(monitor.width - covered < windows.len() as i32);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let monitor = Monitor::new(1200, 800, 0);
        let windows = [7, 8, 9, 10];

        let first = tile(&monitor, &windows, 2);
        let second = tile(&monitor, &windows, 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_order_follows_input_order() {
        let monitor = Monitor::new(900, 600, 0);
        let placements = tile(&monitor, &[30, 10, 20], 0);

        assert_eq!(placements[0].handle, 30);
        assert_eq!(placements[1].handle, 10);
        assert_eq!(placements[2].handle, 20);
        assert!(placements[0].rect.x < placements[1].rect.x);
        assert!(placements[1].rect.x < placements[2].rect.x);
    }
}
