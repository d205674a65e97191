//! In-crate test doubles: a synthetic document, a loader that completes on
//! demand, and a hand-driven clock.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::{Duration, Instant};

use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};
use futures::task::LocalSpawn;

use crate::cache::UrlCache;
use crate::clock::Clock;
use crate::dom::{
    ElementId, EventTargets, Geometry, IntersectionObserver, IntersectionOptions,
    IntersectionSupport, NodeTree, PlatformEvent, Rect, RenderSink, ScrollTarget, Size,
};
use crate::loader::{ImageLoader, LoadError};
use crate::metrics::LazyMetrics;
use crate::tracker::TrackerContext;

pub const LOADING: &str = "loading.gif";
pub const ERROR: &str = "error.gif";

/// Tracker context over test doubles, with fresh cache and metrics.
pub fn tracker_context(
    doc: Rc<FakeDocument>,
    loader: Rc<ScriptedLoader>,
    spawner: Rc<dyn LocalSpawn>,
) -> Rc<TrackerContext> {
    Rc::new(TrackerContext {
        host: doc,
        loader,
        spawner,
        cache: UrlCache::new(),
        metrics: Rc::new(LazyMetrics::new()),
        placeholder_src: LOADING.to_string(),
        error_src: ERROR.to_string(),
    })
}

/// Rect used for elements nobody has positioned: far below the fold.
pub const OFFSCREEN: Rect = Rect {
    top: 10_000.0,
    left: 0.0,
    width: 100.0,
    height: 100.0,
};

/// Rect inside the default viewport.
pub const ONSCREEN: Rect = Rect {
    top: 10.0,
    left: 10.0,
    width: 100.0,
    height: 100.0,
};

#[derive(Default)]
pub struct FakeObserver {
    pub observed: RefCell<Vec<ElementId>>,
    pub options: RefCell<Option<IntersectionOptions>>,
}

struct ObserverHandle(Rc<FakeObserver>);

impl IntersectionObserver for ObserverHandle {
    fn observe(&self, element: ElementId) {
        self.0.observed.borrow_mut().push(element);
    }

    fn unobserve(&self, element: ElementId) {
        self.0.observed.borrow_mut().retain(|e| *e != element);
    }
}

pub struct FakeDocument {
    parents: RefCell<HashMap<ElementId, ElementId>>,
    roots: RefCell<HashSet<ElementId>>,
    styles: RefCell<HashMap<(ElementId, String), String>>,
    rects: RefCell<HashMap<ElementId, Rect>>,
    viewport: Cell<Size>,
    renders: RefCell<HashMap<ElementId, Vec<String>>>,
    listeners: RefCell<HashMap<(ScrollTarget, PlatformEvent), usize>>,
    listener_adds: Cell<usize>,
    observer: Option<Rc<FakeObserver>>,
}

impl FakeDocument {
    fn build(observer: Option<Rc<FakeObserver>>) -> Self {
        Self {
            parents: RefCell::default(),
            roots: RefCell::default(),
            styles: RefCell::default(),
            rects: RefCell::default(),
            viewport: Cell::new(Size::new(1024.0, 768.0)),
            renders: RefCell::default(),
            listeners: RefCell::default(),
            listener_adds: Cell::new(0),
            observer,
        }
    }

    /// Document with an intersection observer available.
    pub fn with_intersection() -> Self {
        Self::build(Some(Rc::new(FakeObserver::default())))
    }

    /// Document without intersection support (polling fallback).
    pub fn without_intersection() -> Self {
        Self::build(None)
    }

    pub fn observer(&self) -> Rc<FakeObserver> {
        Rc::clone(self.observer.as_ref().expect("document has no observer"))
    }

    pub fn link(&self, child: u64, parent: u64) {
        self.parents
            .borrow_mut()
            .insert(ElementId(child), ElementId(parent));
    }

    pub fn mark_root(&self, node: u64) {
        self.roots.borrow_mut().insert(ElementId(node));
    }

    pub fn set_style(&self, node: u64, property: &str, value: &str) {
        self.styles
            .borrow_mut()
            .insert((ElementId(node), property.to_string()), value.to_string());
    }

    pub fn place(&self, node: u64, rect: Rect) {
        self.rects.borrow_mut().insert(ElementId(node), rect);
    }

    pub fn rendered(&self, node: u64) -> Option<String> {
        self.renders
            .borrow()
            .get(&ElementId(node))
            .and_then(|history| history.last().cloned())
    }

    pub fn render_count(&self, node: u64) -> usize {
        self.renders
            .borrow()
            .get(&ElementId(node))
            .map_or(0, Vec::len)
    }

    pub fn listener_count(&self, target: ScrollTarget, event: PlatformEvent) -> usize {
        self.listeners
            .borrow()
            .get(&(target, event))
            .copied()
            .unwrap_or(0)
    }

    pub fn listener_adds(&self) -> usize {
        self.listener_adds.get()
    }
}

impl NodeTree for FakeDocument {
    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.parents.borrow().get(&element).copied()
    }

    fn is_document_root(&self, element: ElementId) -> bool {
        self.roots.borrow().contains(&element)
    }

    fn computed_style(&self, element: ElementId, property: &str) -> String {
        self.styles
            .borrow()
            .get(&(element, property.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

impl Geometry for FakeDocument {
    fn bounding_rect(&self, element: ElementId) -> Rect {
        self.rects
            .borrow()
            .get(&element)
            .copied()
            .unwrap_or(OFFSCREEN)
    }

    fn viewport_size(&self) -> Size {
        self.viewport.get()
    }
}

impl RenderSink for FakeDocument {
    fn set_src(&self, element: ElementId, url: &str) {
        self.renders
            .borrow_mut()
            .entry(element)
            .or_default()
            .push(url.to_string());
    }
}

impl EventTargets for FakeDocument {
    fn add_listener(&self, target: ScrollTarget, event: PlatformEvent) {
        *self.listeners.borrow_mut().entry((target, event)).or_insert(0) += 1;
        self.listener_adds.set(self.listener_adds.get() + 1);
    }

    fn remove_listener(&self, target: ScrollTarget, event: PlatformEvent) {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(count) = listeners.get_mut(&(target, event)) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                listeners.remove(&(target, event));
            }
        }
    }
}

impl IntersectionSupport for FakeDocument {
    fn intersection_observer(
        &self,
        options: &IntersectionOptions,
    ) -> Option<Box<dyn IntersectionObserver>> {
        let observer = self.observer.as_ref()?;
        *observer.options.borrow_mut() = Some(options.clone());
        Some(Box::new(ObserverHandle(Rc::clone(observer))))
    }
}

type Reply = oneshot::Sender<Result<(), LoadError>>;

/// Loader whose fetches stay pending until the test completes them.
#[derive(Default)]
pub struct ScriptedLoader {
    calls: RefCell<Vec<String>>,
    pending: RefCell<Vec<(String, Reply)>>,
}

impl ScriptedLoader {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Resolve the oldest pending fetch of `url`.
    pub fn complete(&self, url: &str, result: Result<(), LoadError>) -> bool {
        let reply = {
            let mut pending = self.pending.borrow_mut();
            match pending.iter().position(|(u, _)| u == url) {
                Some(index) => pending.remove(index).1,
                None => return false,
            }
        };
        reply.send(result).is_ok()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.borrow().iter().filter(|u| *u == url).count()
    }
}

impl ImageLoader for ScriptedLoader {
    fn load(&self, url: &str) -> LocalBoxFuture<'static, Result<(), LoadError>> {
        self.calls.borrow_mut().push(url.to_string());
        let (tx, rx) = oneshot::channel();
        self.pending.borrow_mut().push((url.to_string(), tx));
        async move {
            rx.await
                .unwrap_or_else(|_| Err(LoadError::Rejected("cancelled".to_string())))
        }
        .boxed_local()
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            now: Cell::new(Instant::now()),
        })
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}
