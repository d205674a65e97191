//! lazysight - lazy image loading for visual documents
//!
//! Elements bound to an image URL show a placeholder until they become
//! visible, then the real image is fetched and swapped in, with an error
//! image on failure. Visibility comes from the host's intersection observer
//! when it has one, or from throttled polling driven by shared,
//! reference-counted scroll and resize listeners when it does not.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     LazyCoordinator                       │
//! │  attach / reconcile / detach          on_intersection     │
//! │  TrackerRegistry (insertion ordered)  on_platform_event   │
//! │  UrlCache (shared)                    poll / deadline     │
//! └───────────────┬───────────────────────────┬──────────────┘
//!                 │                           │
//!                 ▼                           ▼
//!          ImageTracker ◄──────── VisibilityStrategy
//!          (per element)          Intersection | Polling
//!                 │
//!                 ▼
//!          ImageLoader ──► RenderSink
//! ```
//!
//! Everything runs on one thread. The only suspension point is the image
//! fetch, spawned on a [`futures::task::LocalSpawn`] executor.
//!
//! # Example
//!
//! ```ignore
//! let coordinator = LazyCoordinator::builder(host, Rc::new(HttpImageLoader::new()?), spawner)
//!     .config(LazyConfig::from_ini_file("lazysight.ini")?)
//!     .build();
//! ```

pub mod cache;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod dom;
pub mod driver;
pub mod loader;
pub mod logging;
pub mod metrics;
pub mod registry;
pub mod strategy;
pub mod tracker;

#[cfg(test)]
mod testing;

pub use cache::UrlCache;
pub use clock::{Clock, SystemClock};
pub use config::{ConfigError, LazyConfig, DEFAULT_IMAGE_URL};
pub use coordinator::{LazyCoordinator, LazyCoordinatorBuilder};
pub use dom::{ElementId, Host, IntersectionEntry, PlatformEvent, Rect, ScrollTarget, Size};
pub use driver::{HostEvent, LazyDriver, TokioClock, TokioSpawner};
pub use loader::{HttpImageLoader, ImageLoader, LoadError};
pub use metrics::{LazyMetrics, MetricsSnapshot};
pub use strategy::StrategyKind;
pub use tracker::{ImageTracker, LoadFailure, LoadOutcome, LoadState};
