//! Lazy loading coordinator.
//!
//! The coordinator owns the tracker registry, the URL cache and the
//! visibility strategy, and mediates the host's element lifecycle:
//!
//! ```text
//! Host lifecycle ──► LazyCoordinator ──► ImageTracker ──► ImageLoader
//!                        │    ▲                │
//!                        ▼    │                ▼
//!               VisibilityStrategy        RenderSink
//!                   (observer or
//!                 throttled polling)
//! ```
//!
//! The strategy is chosen once in [`LazyCoordinatorBuilder::build`]: an
//! intersection observer when the host offers one, shared-listener polling
//! otherwise.

use std::fmt;
use std::rc::Rc;
use std::time::Instant;

use futures::task::LocalSpawn;

use crate::cache::UrlCache;
use crate::clock::{Clock, SystemClock};
use crate::config::LazyConfig;
use crate::dom::{
    scroll_parent, ElementId, Host, IntersectionEntry, IntersectionOptions, PlatformEvent,
    ScrollTarget,
};
use crate::loader::ImageLoader;
use crate::metrics::{LazyMetrics, MetricsSnapshot};
use crate::registry::TrackerRegistry;
use crate::strategy::{IntersectionStrategy, PollingStrategy, StrategyKind, VisibilityStrategy};
use crate::tracker::{ImageTracker, TrackerContext};

/// Builder for [`LazyCoordinator`].
pub struct LazyCoordinatorBuilder {
    host: Rc<dyn Host>,
    loader: Rc<dyn ImageLoader>,
    spawner: Rc<dyn LocalSpawn>,
    config: LazyConfig,
    clock: Rc<dyn Clock>,
    cache: UrlCache,
}

impl LazyCoordinatorBuilder {
    pub fn config(mut self, config: LazyConfig) -> Self {
        self.config = config;
        self
    }

    /// Time source for the polling throttle.
    pub fn clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Share a URL cache with other coordinators.
    pub fn cache(mut self, cache: UrlCache) -> Self {
        self.cache = cache;
        self
    }

    /// Probe the host and pick the visibility strategy.
    pub fn build(self) -> LazyCoordinator {
        let metrics = Rc::new(LazyMetrics::new());

        let strategy: Box<dyn VisibilityStrategy> = match self
            .host
            .intersection_observer(&IntersectionOptions::default())
        {
            Some(observer) => Box::new(IntersectionStrategy::new(observer, Rc::clone(&metrics))),
            None => Box::new(PollingStrategy::new(
                Rc::clone(&self.host),
                self.config.throttle,
                Rc::clone(&metrics),
            )),
        };

        tracing::info!(
            strategy = %strategy.kind(),
            throttle_ms = self.config.throttle.as_millis() as u64,
            "lazy image loading initialised"
        );

        let context = Rc::new(TrackerContext {
            host: self.host,
            loader: self.loader,
            spawner: self.spawner,
            cache: self.cache,
            metrics,
            placeholder_src: self.config.loading_url,
            error_src: self.config.error_url,
        });

        LazyCoordinator {
            context,
            registry: TrackerRegistry::new(),
            strategy,
            clock: self.clock,
        }
    }
}

/// Registry of tracked images and the strategy that watches them.
pub struct LazyCoordinator {
    context: Rc<TrackerContext>,
    registry: TrackerRegistry,
    strategy: Box<dyn VisibilityStrategy>,
    clock: Rc<dyn Clock>,
}

impl fmt::Debug for LazyCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyCoordinator")
            .field("strategy", &self.strategy.kind())
            .field("registry", &self.registry)
            .field("cached_urls", &self.context.cache.len())
            .finish_non_exhaustive()
    }
}

impl LazyCoordinator {
    /// Start building a coordinator with default configuration.
    pub fn builder(
        host: Rc<dyn Host>,
        loader: Rc<dyn ImageLoader>,
        spawner: Rc<dyn LocalSpawn>,
    ) -> LazyCoordinatorBuilder {
        LazyCoordinatorBuilder {
            host,
            loader,
            spawner,
            config: LazyConfig::default(),
            clock: Rc::new(SystemClock),
            cache: UrlCache::new(),
        }
    }

    /// Begin tracking `element`, rendering the placeholder right away.
    ///
    /// Attaching an element that is already tracked replaces its tracker.
    pub fn attach(&mut self, element: ElementId, src: impl Into<String>) {
        if let Some(previous) = self.registry.remove(element) {
            tracing::debug!(%element, "element attached twice, replacing tracker");
            self.release(&previous);
        }

        let parent = scroll_parent(self.context.host.as_ref(), element);
        let tracker = ImageTracker::new(element, parent, src, Rc::clone(&self.context));
        tracing::debug!(
            %element,
            scroll_parent = %parent,
            url = %tracker.target_src(),
            "tracking image"
        );

        self.strategy.observe(&tracker);
        self.registry.insert(tracker);
        self.context.metrics.tracker_attached();

        let now = self.clock.now();
        self.strategy.on_attached(&mut self.registry, now);
    }

    /// Point a tracked element at a new URL.
    ///
    /// Returns `true` if the element is tracked and its target changed.
    pub fn reconcile(&mut self, element: ElementId, src: &str) -> bool {
        match self.registry.get(element) {
            Some(tracker) => tracker.change_target(src),
            None => {
                tracing::debug!(%element, "reconcile for untracked element ignored");
                false
            }
        }
    }

    /// Stop tracking `element`. Returns `false` if it was not tracked.
    ///
    /// A fetch already in flight is not cancelled.
    pub fn detach(&mut self, element: ElementId) -> bool {
        match self.registry.remove(element) {
            Some(tracker) => {
                tracing::debug!(%element, state = %tracker.state(), "untracking image");
                self.release(&tracker);
                true
            }
            None => {
                tracing::debug!(%element, "detach for untracked element ignored");
                false
            }
        }
    }

    /// Stop tracking every element. Returns how many were tracked.
    pub fn detach_all(&mut self) -> usize {
        let elements: Vec<ElementId> = self.registry.elements().collect();
        for element in &elements {
            self.detach(*element);
        }
        elements.len()
    }

    /// Deliver a batch of intersection observer reports.
    pub fn on_intersection(&mut self, entries: &[IntersectionEntry]) {
        self.strategy.on_intersection(&mut self.registry, entries);
    }

    /// Deliver a raw event from a listener target.
    pub fn on_platform_event(&mut self, target: ScrollTarget, event: PlatformEvent) {
        let now = self.clock.now();
        self.strategy
            .on_platform_event(&mut self.registry, target, event, now);
    }

    /// Run deferred strategy work that is due now.
    pub fn poll(&mut self) {
        let now = self.clock.now();
        self.strategy.poll(&mut self.registry, now);
    }

    /// When [`poll`](Self::poll) next has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.strategy.next_deadline()
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    pub fn tracker(&self, element: ElementId) -> Option<&ImageTracker> {
        self.registry.get(element)
    }

    pub fn is_tracking(&self, element: ElementId) -> bool {
        self.registry.contains(element)
    }

    /// Tracked elements, oldest first.
    pub fn elements(&self) -> Vec<ElementId> {
        self.registry.elements().collect()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn cache(&self) -> &UrlCache {
        &self.context.cache
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.context.metrics.snapshot()
    }

    /// References held on a listener target. Always zero for the
    /// intersection strategy.
    pub fn listener_refs(&self, target: ScrollTarget) -> usize {
        self.strategy.listener_refs(target)
    }

    fn release(&mut self, tracker: &ImageTracker) {
        self.strategy.unobserve(tracker);
        self.context.metrics.tracker_detached();
    }
}
