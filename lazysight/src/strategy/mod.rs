//! Visibility strategies.
//!
//! A strategy decides when a tracked element has become visible enough to
//! load. The coordinator picks one implementation at construction, based on
//! whether the host offers an intersection observer, and never switches:
//!
//! - [`IntersectionStrategy`] - delegates geometry to the platform observer
//! - [`PollingStrategy`] - shared, ref-counted scroll/resize listeners plus a
//!   throttled bounding-box scan of the registry
//!
//! Both retire trackers that are already `Resolved` when next seen visible,
//! freeing observer or listener resources for elements that need nothing
//! more.

mod intersection;
mod polling;
mod throttle;

pub use intersection::IntersectionStrategy;
pub use polling::{ListenerTargets, PollTrigger, PollingStrategy, DEFAULT_THROTTLE_WINDOW};
pub use throttle::Throttle;

use std::fmt;
use std::time::Instant;

use crate::dom::{IntersectionEntry, PlatformEvent, ScrollTarget};
use crate::registry::TrackerRegistry;
use crate::tracker::ImageTracker;

/// Which strategy a coordinator is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Intersection,
    Polling,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Intersection => "intersection",
            StrategyKind::Polling => "polling",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the coordinator learns that tracked elements became visible.
///
/// Hooks receive the registry so a strategy can load or retire trackers.
/// Hooks a strategy has no use for keep their no-op defaults.
pub trait VisibilityStrategy {
    fn kind(&self) -> StrategyKind;

    /// Start watching a tracker that is about to enter the registry.
    fn observe(&mut self, tracker: &ImageTracker);

    /// Release every resource held for a tracker that left the registry.
    fn unobserve(&mut self, tracker: &ImageTracker);

    /// Called after a tracker was registered.
    fn on_attached(&mut self, _registry: &mut TrackerRegistry, _now: Instant) {}

    /// A batch of reports from the intersection observer.
    fn on_intersection(
        &mut self,
        _registry: &mut TrackerRegistry,
        _entries: &[IntersectionEntry],
    ) {
    }

    /// A raw event from a listener target.
    fn on_platform_event(
        &mut self,
        _registry: &mut TrackerRegistry,
        _target: ScrollTarget,
        _event: PlatformEvent,
        _now: Instant,
    ) {
    }

    /// Run any deferred work that is due at `now`.
    fn poll(&mut self, _registry: &mut TrackerRegistry, _now: Instant) {}

    /// When [`poll`](Self::poll) next has work to do.
    fn next_deadline(&self) -> Option<Instant> {
        None
    }

    /// Reference count held on a listener target (polling only).
    fn listener_refs(&self, _target: ScrollTarget) -> usize {
        0
    }
}

impl fmt::Debug for dyn VisibilityStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibilityStrategy")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}
