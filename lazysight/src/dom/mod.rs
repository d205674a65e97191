//! Host document abstraction.
//!
//! The lazy loader never touches a concrete rendering DOM. Everything it needs
//! from the host is expressed as a small set of traits that a binding layer
//! (web-sys, a native UI toolkit, or a synthetic tree in tests) implements:
//!
//! ```text
//! NodeTree ──────────► scroll parent detection (pure)
//! Geometry ──────────► cheap in-viewport test (polling strategy)
//! RenderSink ────────► `src` attribute updates (the only mutation)
//! EventTargets ──────► shared scroll/resize listener attachment
//! IntersectionSupport► capability probe + intersection observer factory
//! ```
//!
//! [`Host`] bundles all of them and is blanket-implemented for any type that
//! provides each capability.

mod scroll_parent;

pub use scroll_parent::{has_scrollable_overflow, scroll_parent, OVERFLOW_PROPERTIES};

use std::fmt;

/// Identity of a host element.
///
/// Hosts assign these; the loader only compares them and hands them back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something listeners can be attached to: a scrollable element or the
/// global viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollTarget {
    /// The window / top-level viewport.
    Viewport,
    /// A scrollable ancestor element.
    Element(ElementId),
}

impl fmt::Display for ScrollTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrollTarget::Viewport => write!(f, "viewport"),
            ScrollTarget::Element(id) => write!(f, "element {}", id),
        }
    }
}

/// Platform events that may move an element into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformEvent {
    Scroll,
    Wheel,
    MouseWheel,
    Resize,
    AnimationEnd,
    TransitionEnd,
    TouchMove,
    TransitionCancel,
}

impl PlatformEvent {
    /// Every event kind the polling strategy listens for, in attach order.
    pub const ALL: [PlatformEvent; 8] = [
        PlatformEvent::Scroll,
        PlatformEvent::Wheel,
        PlatformEvent::MouseWheel,
        PlatformEvent::Resize,
        PlatformEvent::AnimationEnd,
        PlatformEvent::TransitionEnd,
        PlatformEvent::TouchMove,
        PlatformEvent::TransitionCancel,
    ];

    /// The DOM event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformEvent::Scroll => "scroll",
            PlatformEvent::Wheel => "wheel",
            PlatformEvent::MouseWheel => "mousewheel",
            PlatformEvent::Resize => "resize",
            PlatformEvent::AnimationEnd => "animationend",
            PlatformEvent::TransitionEnd => "transitionend",
            PlatformEvent::TouchMove => "touchmove",
            PlatformEvent::TransitionCancel => "transitioncancel",
        }
    }
}

impl fmt::Display for PlatformEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Viewport-relative bounding box, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }
}

/// Viewport dimensions, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Parent links and computed style, enough to find a scroll container.
pub trait NodeTree {
    /// Parent node, or `None` for a detached or root node.
    fn parent(&self, element: ElementId) -> Option<ElementId>;

    /// Whether `element` is the document body or document element.
    fn is_document_root(&self, element: ElementId) -> bool;

    /// Computed value of a CSS property (empty string if unset).
    fn computed_style(&self, element: ElementId, property: &str) -> String;
}

/// Layout queries used by the cheap visibility test.
pub trait Geometry {
    fn bounding_rect(&self, element: ElementId) -> Rect;
    fn viewport_size(&self) -> Size;
}

/// The single mutation the loader performs on a tracked element.
pub trait RenderSink {
    /// Equivalent of `element.setAttribute("src", url)`.
    ///
    /// Must tolerate elements the host no longer knows about.
    fn set_src(&self, element: ElementId, url: &str);
}

/// Listener attachment for the polling strategy.
///
/// The host routes every attached event back into
/// [`LazyCoordinator::on_platform_event`](crate::LazyCoordinator::on_platform_event).
pub trait EventTargets {
    fn add_listener(&self, target: ScrollTarget, event: PlatformEvent);
    fn remove_listener(&self, target: ScrollTarget, event: PlatformEvent);
}

/// Options for the platform intersection observer.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionOptions {
    /// CSS margin around the root, e.g. `"0px"`.
    pub root_margin: String,
    /// Intersection ratios at which reports fire.
    pub thresholds: Vec<f64>,
}

impl Default for IntersectionOptions {
    fn default() -> Self {
        Self {
            root_margin: "0px".to_string(),
            thresholds: vec![0.0],
        }
    }
}

/// A platform intersection observer instance.
///
/// Reports are delivered by the host through
/// [`LazyCoordinator::on_intersection`](crate::LazyCoordinator::on_intersection).
pub trait IntersectionObserver {
    fn observe(&self, element: ElementId);
    fn unobserve(&self, element: ElementId);
}

/// Capability probe for intersection detection.
pub trait IntersectionSupport {
    /// Create an observer, or `None` when the platform has no intersection
    /// primitive. Called exactly once, when the coordinator is built.
    fn intersection_observer(
        &self,
        options: &IntersectionOptions,
    ) -> Option<Box<dyn IntersectionObserver>>;
}

/// One element's entry in an intersection report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub target: ElementId,
    /// Absent on platforms that predate the `isIntersecting` field.
    pub is_intersecting: Option<bool>,
    pub intersection_ratio: f64,
}

impl IntersectionEntry {
    pub fn new(target: ElementId, is_intersecting: bool) -> Self {
        Self {
            target,
            is_intersecting: Some(is_intersecting),
            intersection_ratio: if is_intersecting { 1.0 } else { 0.0 },
        }
    }

    /// Entry from a platform that only reports the ratio.
    pub fn from_ratio(target: ElementId, intersection_ratio: f64) -> Self {
        Self {
            target,
            is_intersecting: None,
            intersection_ratio,
        }
    }

    /// Whether the target currently intersects the root.
    pub fn is_intersecting(&self) -> bool {
        self.is_intersecting.unwrap_or(self.intersection_ratio > 0.0)
    }
}

/// Everything the lazy loader needs from its host.
pub trait Host: NodeTree + Geometry + RenderSink + EventTargets + IntersectionSupport {}

impl<T> Host for T where T: NodeTree + Geometry + RenderSink + EventTargets + IntersectionSupport {}
