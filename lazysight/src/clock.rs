//! Time source for the polling throttle.

use std::time::Instant;

/// Supplies the current instant.
///
/// The coordinator reads time only through this trait so throttle windows can
/// be driven deterministically.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-clock time via [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
