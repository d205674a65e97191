//! Per-element load tracking.
//!
//! An [`ImageTracker`] owns one element's target URL and load state and is
//! the only thing that renders into that element.
//!
//! # State Machine
//!
//! ```text
//!             fetch ok / cache hit
//!   Pending ─────────────────────────► Resolved
//!      │  ▲                                │
//!      │  └──────── change_target ─────────┤
//!      │  ┌──────── change_target ─────────┘
//!      │  ▼
//!      └─────────────────────────────────► Failed
//!                   fetch error
//! ```
//!
//! `attempt_load` only acts in `Pending`, and at most one fetch per target is
//! in flight. A fetch that finishes after the target changed is superseded:
//! it still feeds the URL cache on success but no longer touches the element.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use futures::task::{LocalSpawn, LocalSpawnExt};

use crate::cache::UrlCache;
use crate::dom::{ElementId, Host, ScrollTarget};
use crate::loader::{ImageLoader, LoadError};
use crate::metrics::LazyMetrics;

/// Load state of a tracked element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Showing the placeholder; not yet decided.
    Pending,
    /// Showing the target image.
    Resolved,
    /// Showing the error image.
    Failed,
}

impl LoadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::Pending => "pending",
            LoadState::Resolved => "resolved",
            LoadState::Failed => "failed",
        }
    }

    /// `Resolved` or `Failed`.
    pub fn is_settled(&self) -> bool {
        !matches!(self, LoadState::Pending)
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a load attempt ended, as reported to its continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Target was already cached; resolved without a fetch.
    CacheHit,
    /// Fetch succeeded; target rendered.
    Loaded,
    /// Fetch failed; error image rendered.
    Failed,
    /// Fetch finished after the target changed; element left untouched.
    Superseded,
    /// Nothing to do: already settled or a fetch is in flight.
    Skipped,
}

/// Diagnostic recorded when a fetch fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub url: String,
    pub error: LoadError,
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load image {}: {}", self.url, self.error)
    }
}

/// Collaborators and configuration shared by every tracker of a coordinator.
pub(crate) struct TrackerContext {
    pub host: Rc<dyn Host>,
    pub loader: Rc<dyn ImageLoader>,
    pub spawner: Rc<dyn LocalSpawn>,
    pub cache: UrlCache,
    pub metrics: Rc<LazyMetrics>,
    pub placeholder_src: String,
    pub error_src: String,
}

#[derive(Debug)]
struct TrackerState {
    src: String,
    state: LoadState,
    /// Bumped on every target change; fetches carry the value they started with.
    generation: u64,
    in_flight: bool,
    failure: Option<LoadFailure>,
}

type Continuation = Box<dyn FnOnce(LoadOutcome)>;

/// Tracks one element's image.
///
/// State lives behind an `Rc` so an in-flight fetch can settle it even after
/// the coordinator has dropped the tracker.
pub struct ImageTracker {
    element: ElementId,
    scroll_parent: ScrollTarget,
    state: Rc<RefCell<TrackerState>>,
    context: Rc<TrackerContext>,
}

impl fmt::Debug for ImageTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageTracker")
            .field("element", &self.element)
            .field("scroll_parent", &self.scroll_parent)
            .field("state", &self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl ImageTracker {
    /// Creates a tracker and renders the placeholder.
    pub(crate) fn new(
        element: ElementId,
        scroll_parent: ScrollTarget,
        src: impl Into<String>,
        context: Rc<TrackerContext>,
    ) -> Self {
        let tracker = Self {
            element,
            scroll_parent,
            state: Rc::new(RefCell::new(TrackerState {
                src: src.into(),
                state: LoadState::Pending,
                generation: 0,
                in_flight: false,
                failure: None,
            })),
            context,
        };
        tracker.render(&tracker.context.placeholder_src);
        tracker
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn scroll_parent(&self) -> ScrollTarget {
        self.scroll_parent
    }

    pub fn target_src(&self) -> String {
        self.state.borrow().src.clone()
    }

    pub fn state(&self) -> LoadState {
        self.state.borrow().state
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().in_flight
    }

    /// The diagnostic from the most recent failed fetch of the current target.
    pub fn failure(&self) -> Option<LoadFailure> {
        self.state.borrow().failure.clone()
    }

    /// Start loading the target if still `Pending`.
    pub fn attempt_load(&self) {
        self.attempt_load_then(|_| {});
    }

    /// Like [`attempt_load`](Self::attempt_load), then call `next` exactly once
    /// with the outcome. For a fetch, `next` runs when the fetch settles.
    pub fn attempt_load_then<F>(&self, next: F)
    where
        F: FnOnce(LoadOutcome) + 'static,
    {
        let (url, generation) = {
            let mut state = self.state.borrow_mut();
            if state.state.is_settled() || state.in_flight {
                drop(state);
                next(LoadOutcome::Skipped);
                return;
            }

            if self.context.cache.contains(&state.src) {
                state.state = LoadState::Resolved;
                let src = state.src.clone();
                drop(state);

                tracing::trace!(element = %self.element, url = %src, "cache hit");
                self.context.metrics.cache_hit();
                self.render(&src);
                next(LoadOutcome::CacheHit);
                return;
            }

            state.in_flight = true;
            (state.src.clone(), state.generation)
        };

        tracing::debug!(element = %self.element, url = %url, "loading image");
        self.context.metrics.fetch_started();

        let next: Rc<RefCell<Option<Continuation>>> =
            Rc::new(RefCell::new(Some(Box::new(next))));
        let fetch = self.context.loader.load(&url);
        let task = {
            let state = Rc::clone(&self.state);
            let context = Rc::clone(&self.context);
            let next = Rc::clone(&next);
            let element = self.element;
            let url = url.clone();
            async move {
                let result = fetch.await;
                let outcome = settle(&state, &context, element, &url, generation, result);
                if let Some(next) = next.borrow_mut().take() {
                    next(outcome);
                }
            }
        };

        if let Err(e) = self.context.spawner.spawn_local(task) {
            tracing::error!(element = %self.element, url = %url, error = %e, "failed to spawn image load");
            let error = LoadError::Rejected(format!("executor unavailable: {}", e));
            let outcome = settle(
                &self.state,
                &self.context,
                self.element,
                &url,
                generation,
                Err(error),
            );
            if let Some(next) = next.borrow_mut().take() {
                next(outcome);
            }
        }
    }

    /// Cheap, direction-agnostic visibility test: the element's top-left
    /// corner lies above and left of the viewport's far edges.
    pub fn is_currently_visible(&self) -> bool {
        let rect = self.context.host.bounding_rect(self.element);
        let viewport = self.context.host.viewport_size();
        rect.top < viewport.height && rect.left < viewport.width
    }

    /// Point the tracker at a new URL.
    ///
    /// A different URL resets to `Pending` and immediately attempts a load.
    /// Returns `false` if `new_src` equals the current target.
    pub fn change_target(&self, new_src: &str) -> bool {
        {
            let mut state = self.state.borrow_mut();
            if state.src == new_src {
                return false;
            }

            tracing::debug!(
                element = %self.element,
                from = %state.src,
                to = %new_src,
                "image target changed"
            );
            state.src = new_src.to_string();
            state.state = LoadState::Pending;
            state.generation += 1;
            state.in_flight = false;
            state.failure = None;
        }

        self.attempt_load();
        true
    }

    fn render(&self, url: &str) {
        self.context.host.set_src(self.element, url);
    }
}

/// Apply a fetch result to the tracker state that started it.
fn settle(
    state: &RefCell<TrackerState>,
    context: &TrackerContext,
    element: ElementId,
    url: &str,
    generation: u64,
    result: Result<(), LoadError>,
) -> LoadOutcome {
    match &result {
        Ok(()) => {
            context.cache.insert(url);
            context.metrics.fetch_succeeded();
        }
        Err(_) => context.metrics.fetch_failed(),
    }

    let mut current = state.borrow_mut();
    if current.generation != generation {
        tracing::debug!(element = %element, url = %url, "stale image load ignored");
        return LoadOutcome::Superseded;
    }
    current.in_flight = false;

    match result {
        Ok(()) => {
            current.state = LoadState::Resolved;
            drop(current);

            tracing::debug!(element = %element, url = %url, "image loaded");
            context.host.set_src(element, url);
            LoadOutcome::Loaded
        }
        Err(error) => {
            let failure = LoadFailure {
                url: url.to_string(),
                error,
            };
            tracing::warn!(element = %element, url = %url, error = %failure.error, "{}", failure);
            current.state = LoadState::Failed;
            current.failure = Some(failure);
            drop(current);

            context.host.set_src(element, &context.error_src);
            LoadOutcome::Failed
        }
    }
}
