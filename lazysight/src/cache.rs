//! Shared record of URLs that have loaded successfully.
//!
//! Every tracker created by one coordinator holds a handle to the same
//! [`UrlCache`]. A URL in the cache renders immediately, without asking the
//! loader again; the host's own HTTP cache is trusted to serve the bytes.
//!
//! Entries are never evicted. The cache lives exactly as long as the
//! coordinator and the trackers (or in-flight loads) that reference it.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Cheaply cloneable handle to the shared set of loaded URLs.
#[derive(Debug, Clone, Default)]
pub struct UrlCache {
    urls: Rc<RefCell<HashSet<String>>>,
}

impl UrlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `url` has loaded successfully before.
    pub fn contains(&self, url: &str) -> bool {
        self.urls.borrow().contains(url)
    }

    /// Record a successful load. Returns `false` if already present.
    pub fn insert(&self, url: impl Into<String>) -> bool {
        self.urls.borrow_mut().insert(url.into())
    }

    pub fn len(&self) -> usize {
        self.urls.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.borrow().is_empty()
    }
}
