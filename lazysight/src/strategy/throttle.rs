//! Leading-edge throttle with a guaranteed trailing call.
//!
//! The polling strategy funnels every raw scroll/resize/transition event from
//! every listener target through one [`Throttle`]. It is a global rate
//! limiter: at most one call passes per window, no matter which target or
//! event kind produced it.
//!
//! # Timeline
//!
//! ```text
//! events:  x  x x x x  x                       x
//!          │                                   │
//! fires:   ▼ (leading)          ▼ (trailing)   ▼ (leading)
//!          |<──── window ──────>|
//! ```
//!
//! Calls inside an open window are coalesced into one trailing call carrying
//! the most recent event. The throttle does not own a timer: the caller reads
//! [`deadline`](Throttle::deadline) and invokes [`poll`](Throttle::poll) once
//! it has passed.

use std::time::{Duration, Instant};

/// Rate limiter for a single shared handler.
#[derive(Debug)]
pub struct Throttle<T> {
    window: Duration,
    last_fired: Option<Instant>,
    /// When the trailing call is due, if one is scheduled.
    due: Option<Instant>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fired: None,
            due: None,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Offer an event at `now`.
    ///
    /// Returns the event if the handler should run immediately; otherwise
    /// the event replaces any pending one and a trailing call is scheduled.
    pub fn call(&mut self, now: Instant, event: T) -> Option<T> {
        if let Some(due) = self.due {
            if now < due {
                self.pending = Some(event);
                return None;
            }
            // The caller missed the deadline; the newest event stands in
            // for the overdue trailing call.
            self.due = None;
            self.pending = None;
            self.last_fired = Some(now);
            return Some(event);
        }

        match self.last_fired {
            Some(last) if now.saturating_duration_since(last) < self.window => {
                self.due = Some(last + self.window);
                self.pending = Some(event);
                None
            }
            _ => {
                self.last_fired = Some(now);
                Some(event)
            }
        }
    }

    /// Release the trailing event if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                self.last_fired = Some(now);
                self.pending.take()
            }
            _ => None,
        }
    }

    /// When the scheduled trailing call becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.due
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}
