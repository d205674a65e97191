//! Visibility through the platform intersection observer.

use std::rc::Rc;

use super::{StrategyKind, VisibilityStrategy};
use crate::dom::{IntersectionEntry, IntersectionObserver};
use crate::metrics::LazyMetrics;
use crate::registry::TrackerRegistry;
use crate::tracker::{ImageTracker, LoadState};

/// Loads trackers as the platform reports them intersecting the viewport.
///
/// One observer instance watches every tracked element. It is configured by
/// the coordinator with a zero root margin and a single `0.0` threshold, so a
/// report arrives as soon as any pixel of an element is visible.
pub struct IntersectionStrategy {
    observer: Box<dyn IntersectionObserver>,
    metrics: Rc<LazyMetrics>,
}

impl IntersectionStrategy {
    pub fn new(observer: Box<dyn IntersectionObserver>, metrics: Rc<LazyMetrics>) -> Self {
        Self { observer, metrics }
    }
}

impl VisibilityStrategy for IntersectionStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Intersection
    }

    fn observe(&mut self, tracker: &ImageTracker) {
        self.observer.observe(tracker.element());
    }

    fn unobserve(&mut self, tracker: &ImageTracker) {
        self.observer.unobserve(tracker.element());
    }

    fn on_intersection(&mut self, registry: &mut TrackerRegistry, entries: &[IntersectionEntry]) {
        for entry in entries.iter().filter(|entry| entry.is_intersecting()) {
            let Some(tracker) = registry.get(entry.target) else {
                continue;
            };

            if tracker.state() == LoadState::Resolved {
                if let Some(tracker) = registry.remove(entry.target) {
                    tracing::debug!(element = %entry.target, "resolved image retired");
                    self.unobserve(&tracker);
                    self.metrics.tracker_retired();
                }
                continue;
            }

            tracker.attempt_load();
        }
    }
}
