//! Image fetch collaborator.
//!
//! The tracker asks an [`ImageLoader`] to fetch a URL and only cares whether
//! it succeeded. Loaders return a local boxed future so hosts on a
//! single-threaded executor can use `!Send` handles.
//!
//! # Implementors
//!
//! - [`HttpImageLoader`] - async reqwest client with content sniffing
//! - Test loaders that complete on demand (see the integration tests)

mod http;

pub use http::{HttpImageLoader, DEFAULT_TIMEOUT_SECS};

use futures::future::LocalBoxFuture;
use thiserror::Error;

/// Why an image failed to load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Transport-level failure (DNS, TLS, connection reset, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}")]
    Status { status: u16 },

    /// The payload is not a recognisable image.
    #[error("not an image: {0}")]
    Decode(String),

    /// The host's loader rejected the URL with its own reason.
    #[error("{0}")]
    Rejected(String),
}

/// Fetches an image and reports success or failure.
///
/// Each returned future resolves exactly once.
pub trait ImageLoader {
    fn load(&self, url: &str) -> LocalBoxFuture<'static, Result<(), LoadError>>;
}
