//! Scroll container detection.
//!
//! The polling strategy attaches listeners to the nearest scrollable
//! container of each tracked element. Detection is a pure walk over
//! [`NodeTree`], so it works against any host and against synthetic trees.

use super::{ElementId, NodeTree, ScrollTarget};

/// Computed-style properties consulted for scrollability.
pub const OVERFLOW_PROPERTIES: [&str; 3] = ["overflow", "overflow-y", "overflow-x"];

/// Whether `element` clips its content with a scrolling overflow mode.
pub fn has_scrollable_overflow<T: NodeTree + ?Sized>(tree: &T, element: ElementId) -> bool {
    OVERFLOW_PROPERTIES.iter().any(|property| {
        let value = tree.computed_style(element, property);
        value.contains("scroll") || value.contains("auto")
    })
}

/// Find the nearest scroll container for `element`.
///
/// The walk starts at `element` itself and stops at the document root or a
/// node without a parent. Falls back to [`ScrollTarget::Viewport`].
pub fn scroll_parent<T: NodeTree + ?Sized>(tree: &T, element: ElementId) -> ScrollTarget {
    let mut current = element;

    loop {
        if tree.is_document_root(current) {
            break;
        }

        let Some(parent) = tree.parent(current) else {
            break;
        };

        if has_scrollable_overflow(tree, current) {
            return ScrollTarget::Element(current);
        }

        current = parent;
    }

    ScrollTarget::Viewport
}
