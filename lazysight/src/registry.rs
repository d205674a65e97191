//! Insertion-ordered tracker registry keyed by element identity.

use indexmap::IndexMap;

use crate::dom::ElementId;
use crate::tracker::ImageTracker;

/// Live trackers, oldest first.
///
/// Removal preserves the relative order of the remaining trackers, which the
/// polling scan depends on.
#[derive(Debug, Default)]
pub struct TrackerRegistry {
    trackers: IndexMap<ElementId, ImageTracker>,
}

impl TrackerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tracker, returning any tracker previously registered for the
    /// same element.
    pub fn insert(&mut self, tracker: ImageTracker) -> Option<ImageTracker> {
        let previous = self.trackers.shift_remove(&tracker.element());
        self.trackers.insert(tracker.element(), tracker);
        previous
    }

    pub fn get(&self, element: ElementId) -> Option<&ImageTracker> {
        self.trackers.get(&element)
    }

    pub fn remove(&mut self, element: ElementId) -> Option<ImageTracker> {
        self.trackers.shift_remove(&element)
    }

    pub fn contains(&self, element: ElementId) -> bool {
        self.trackers.contains_key(&element)
    }

    /// Most recently added first.
    pub fn iter_newest_first(&self) -> impl Iterator<Item = &ImageTracker> {
        self.trackers.values().rev()
    }

    /// The most recently added element.
    pub fn newest(&self) -> Option<ElementId> {
        self.trackers.last().map(|(element, _)| *element)
    }

    pub fn elements(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.trackers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }
}
