//! Fallback visibility polling for hosts without an intersection observer.
//!
//! Each tracker holds one reference on its scroll parent and one on the
//! viewport. The first reference on a target attaches a listener for every
//! [`PlatformEvent`]; dropping the last one detaches them. All listeners feed
//! the same [`Throttle`], and every pass that gets through scans the registry
//! newest first with the cheap bounding-box test.
//!
//! A pass stops at the first visible tracker that is already `Resolved`,
//! retiring only that one. Under a saturated event burst this decides which
//! elements get attempted, so the order and the early exit are part of the
//! contract.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use super::throttle::Throttle;
use super::{StrategyKind, VisibilityStrategy};
use crate::dom::{ElementId, Host, PlatformEvent, ScrollTarget};
use crate::metrics::LazyMetrics;
use crate::registry::TrackerRegistry;
use crate::tracker::{ImageTracker, LoadState};

/// Default minimum gap between polling passes.
pub const DEFAULT_THROTTLE_WINDOW: Duration = Duration::from_millis(300);

/// What caused a polling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTrigger {
    /// A tracker was attached.
    Attached(ElementId),
    /// A listener target delivered an event.
    Event {
        target: ScrollTarget,
        event: PlatformEvent,
    },
}

/// Reference-counted listener attachments, one per target.
pub struct ListenerTargets {
    host: Rc<dyn Host>,
    refs: HashMap<ScrollTarget, usize>,
}

impl ListenerTargets {
    pub fn new(host: Rc<dyn Host>) -> Self {
        Self {
            host,
            refs: HashMap::new(),
        }
    }

    /// Take a reference on `target`, attaching listeners on the first one.
    pub fn acquire(&mut self, target: ScrollTarget) {
        let refs = self.refs.entry(target).or_insert(0);
        *refs += 1;
        if *refs == 1 {
            tracing::trace!(%target, "attaching listeners");
            for event in PlatformEvent::ALL {
                self.host.add_listener(target, event);
            }
        }
    }

    /// Drop a reference on `target`, detaching listeners with the last one.
    /// Releasing a target with no references is a no-op.
    pub fn release(&mut self, target: ScrollTarget) {
        let Some(refs) = self.refs.get_mut(&target) else {
            return;
        };
        *refs -= 1;
        if *refs == 0 {
            self.refs.remove(&target);
            tracing::trace!(%target, "detaching listeners");
            for event in PlatformEvent::ALL {
                self.host.remove_listener(target, event);
            }
        }
    }

    pub fn refs(&self, target: ScrollTarget) -> usize {
        self.refs.get(&target).copied().unwrap_or(0)
    }

    /// Number of targets with listeners attached.
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

/// Throttled bounding-box polling driven by shared listeners.
pub struct PollingStrategy {
    targets: ListenerTargets,
    throttle: Throttle<PollTrigger>,
    metrics: Rc<LazyMetrics>,
}

impl PollingStrategy {
    pub fn new(host: Rc<dyn Host>, window: Duration, metrics: Rc<LazyMetrics>) -> Self {
        Self {
            targets: ListenerTargets::new(host),
            throttle: Throttle::new(window),
            metrics,
        }
    }

    pub fn targets(&self) -> &ListenerTargets {
        &self.targets
    }

    fn trigger(&mut self, registry: &mut TrackerRegistry, trigger: PollTrigger, now: Instant) {
        match self.throttle.call(now, trigger) {
            Some(trigger) => self.scan(registry, trigger),
            None => tracing::trace!(?trigger, "polling pass deferred"),
        }
    }

    fn scan(&mut self, registry: &mut TrackerRegistry, trigger: PollTrigger) {
        tracing::trace!(?trigger, trackers = registry.len(), "polling pass");
        self.metrics.tick();

        let mut retired = None;
        for tracker in registry.iter_newest_first() {
            if !tracker.is_currently_visible() {
                continue;
            }
            if tracker.state() == LoadState::Resolved {
                retired = Some(tracker.element());
                break;
            }
            tracker.attempt_load();
        }

        if let Some(element) = retired {
            if let Some(tracker) = registry.remove(element) {
                tracing::debug!(%element, "resolved image retired from polling");
                self.unobserve(&tracker);
                self.metrics.tracker_retired();
            }
        }
    }
}

impl VisibilityStrategy for PollingStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Polling
    }

    fn observe(&mut self, tracker: &ImageTracker) {
        self.targets.acquire(tracker.scroll_parent());
        self.targets.acquire(ScrollTarget::Viewport);
    }

    fn unobserve(&mut self, tracker: &ImageTracker) {
        self.targets.release(tracker.scroll_parent());
        self.targets.release(ScrollTarget::Viewport);
    }

    fn on_attached(&mut self, registry: &mut TrackerRegistry, now: Instant) {
        if let Some(element) = registry.newest() {
            self.trigger(registry, PollTrigger::Attached(element), now);
        }
    }

    fn on_platform_event(
        &mut self,
        registry: &mut TrackerRegistry,
        target: ScrollTarget,
        event: PlatformEvent,
        now: Instant,
    ) {
        self.trigger(registry, PollTrigger::Event { target, event }, now);
    }

    fn poll(&mut self, registry: &mut TrackerRegistry, now: Instant) {
        if let Some(trigger) = self.throttle.poll(now) {
            self.scan(registry, trigger);
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.throttle.deadline()
    }

    fn listener_refs(&self, target: ScrollTarget) -> usize {
        self.targets.refs(target)
    }
}
