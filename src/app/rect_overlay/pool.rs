// SPDX-License-Identifier: GPL-3.0-only

//! Fixed-size pool of overlay outlines
//!
//! Slots are allocated once; each detection pass reassigns them in order and
//! clears the rest. Paths are mapped into the drawing space only when the
//! caller knows the target bounds.

use super::{ViewPoint, ViewRect, mirror_horizontal};
use crate::app::frame_processor::Quadrilateral;
use crate::constants::overlay;

/// Fixed-capacity set of outline slots
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPool {
    slots: Vec<Option<Quadrilateral>>,
}

impl Default for OverlayPool {
    fn default() -> Self {
        Self::new(overlay::DEFAULT_SLOT_COUNT)
    }
}

impl OverlayPool {
    /// Create a pool with `capacity` empty slots
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots currently holding a shape
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    /// Slot contents in slot order
    pub fn slots(&self) -> &[Option<Quadrilateral>] {
        &self.slots
    }

    /// Assign detections to slots
    ///
    /// Slot `i` takes `quads[i]`; every slot past the last detection is
    /// cleared. Detections beyond the pool capacity are dropped. Returns the
    /// number of shapes now shown.
    pub fn assign(&mut self, quads: &[Quadrilateral]) -> usize {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            *slot = quads.get(i).copied();
        }

        let shown = quads.len().min(self.slots.len());
        if quads.len() > shown {
            tracing::trace!(
                detected = quads.len(),
                shown,
                "More rectangles than overlay slots"
            );
        }
        shown
    }

    /// Clear every slot
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    /// Change the slot count, keeping shapes that still fit
    pub fn resize(&mut self, capacity: usize) {
        self.slots.resize(capacity, None);
    }

    /// Outline paths of the active slots mapped into `target`
    ///
    /// With `mirrored` the paths are reflected horizontally to match a
    /// mirrored preview.
    pub fn layout(&self, target: ViewRect, mirrored: bool) -> Vec<[ViewPoint; 4]> {
        self.slots
            .iter()
            .flatten()
            .map(|quad| {
                let path = quad.map_to(target);
                if mirrored {
                    path.map(|p| mirror_horizontal(p, target))
                } else {
                    path
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::frame_processor::NormalizedPoint;

    fn quad(offset: f32) -> Quadrilateral {
        Quadrilateral::new(
            NormalizedPoint::new(offset, 0.5),
            NormalizedPoint::new(offset + 0.1, 0.5),
            NormalizedPoint::new(offset + 0.1, 0.4),
            NormalizedPoint::new(offset, 0.4),
        )
    }

    #[test]
    fn test_assign_fills_slots_in_order() {
        let mut pool = OverlayPool::new(4);
        assert_eq!(pool.assign(&[quad(0.1), quad(0.2)]), 2);

        assert_eq!(pool.slots()[0], Some(quad(0.1)));
        assert_eq!(pool.slots()[1], Some(quad(0.2)));
        assert_eq!(pool.slots()[2], None);
        assert_eq!(pool.active_count(), 2);
    }

    #[test]
    fn test_fewer_detections_clear_stale_slots() {
        let mut pool = OverlayPool::new(3);
        pool.assign(&[quad(0.1), quad(0.2), quad(0.3)]);
        pool.assign(&[quad(0.5)]);

        assert_eq!(pool.slots(), &[Some(quad(0.5)), None, None]);
    }

    #[test]
    fn test_clear() {
        let mut pool = OverlayPool::new(2);
        pool.assign(&[quad(0.1)]);
        pool.clear();
        assert!(pool.is_empty());
        assert_eq!(pool.capacity(), 2);
    }

    #[test]
    fn test_resize_keeps_leading_slots() {
        let mut pool = OverlayPool::new(3);
        pool.assign(&[quad(0.1), quad(0.2), quad(0.3)]);
        pool.resize(1);
        assert_eq!(pool.slots(), &[Some(quad(0.1))]);
    }

    #[test]
    fn test_layout_mirrors_paths() {
        let mut pool = OverlayPool::new(1);
        pool.assign(&[quad(0.1)]);
        let target = ViewRect::new(0.0, 0.0, 100.0, 100.0);

        let plain = pool.layout(target, false);
        let mirrored = pool.layout(target, true);

        assert_eq!(plain.len(), 1);
        assert!((plain[0][0].x - 10.0).abs() < 1e-4);
        assert!((mirrored[0][0].x - 90.0).abs() < 1e-4);
        assert_eq!(plain[0][0].y, mirrored[0][0].y);
    }
}
