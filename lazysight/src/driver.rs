//! Tokio event loop for a coordinator.
//!
//! Hosts that live on a tokio runtime can forward their lifecycle and
//! platform callbacks as [`HostEvent`]s over an unbounded channel and let
//! [`LazyDriver`] own the coordinator. The driver also sleeps until the
//! polling throttle's trailing deadline, so deferred passes run without the
//! host having to schedule them.
//!
//! ```text
//! host callbacks ──► mpsc::UnboundedSender<HostEvent>
//!                               │
//!                               ▼
//!                         LazyDriver::run ──► LazyCoordinator
//!                               ▲
//!                    sleep_until(next_deadline)
//! ```
//!
//! Everything here is `!Send`: run the driver inside a
//! [`LocalSet`](tokio::task::LocalSet) and build the coordinator with
//! [`TokioSpawner`] and [`TokioClock`].

use std::time::Instant;

use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};
use tokio::sync::mpsc;

use crate::clock::Clock;
use crate::coordinator::LazyCoordinator;
use crate::dom::{ElementId, IntersectionEntry, PlatformEvent, ScrollTarget};

/// A host callback, queued for the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// An element bound to an image URL entered the document.
    Attached { element: ElementId, src: String },
    /// A bound element's URL changed.
    Updated { element: ElementId, src: String },
    /// A bound element left the document.
    Detached { element: ElementId },
    /// A batch of intersection observer reports.
    Intersections(Vec<IntersectionEntry>),
    /// A listener target fired.
    Platform {
        target: ScrollTarget,
        event: PlatformEvent,
    },
}

impl LazyCoordinator {
    /// Apply one host event.
    pub fn dispatch(&mut self, event: HostEvent) {
        match event {
            HostEvent::Attached { element, src } => self.attach(element, src),
            HostEvent::Updated { element, src } => {
                self.reconcile(element, &src);
            }
            HostEvent::Detached { element } => {
                self.detach(element);
            }
            HostEvent::Intersections(entries) => self.on_intersection(&entries),
            HostEvent::Platform { target, event } => self.on_platform_event(target, event),
        }
    }
}

/// Spawns fetches onto the current [`LocalSet`](tokio::task::LocalSet).
///
/// # Panics
///
/// Spawning panics when called outside a `LocalSet`, as
/// [`tokio::task::spawn_local`] does.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSpawner;

impl LocalSpawn for TokioSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        tokio::task::spawn_local(future);
        Ok(())
    }
}

/// Reads time from tokio, so paused test runtimes drive the throttle.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// Owns a coordinator and feeds it host events until the channel closes.
#[derive(Debug)]
pub struct LazyDriver {
    coordinator: LazyCoordinator,
}

impl LazyDriver {
    pub fn new(coordinator: LazyCoordinator) -> Self {
        Self { coordinator }
    }

    pub fn coordinator(&self) -> &LazyCoordinator {
        &self.coordinator
    }

    /// Process events in delivery order, running deferred polling passes as
    /// they fall due. Returns the coordinator once every sender is dropped.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<HostEvent>) -> LazyCoordinator {
        tracing::debug!(strategy = %self.coordinator.strategy_kind(), "lazy driver started");

        loop {
            let deadline = self.coordinator.next_deadline();
            tokio::select! {
                biased;

                event = events.recv() => match event {
                    Some(event) => self.coordinator.dispatch(event),
                    None => break,
                },
                _ = sleep_until(deadline) => self.coordinator.poll(),
            }
        }

        tracing::debug!(
            tracked = self.coordinator.len(),
            metrics = %self.coordinator.metrics(),
            "lazy driver stopped"
        );
        self.coordinator
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending::<()>().await,
    }
}
