//! Fixed-interval publish throttle.
//!
//! Each [`Throttle`] carries its own last-publish timestamp, so independent
//! viewports on one page never share a timer. Timestamps are supplied by the
//! caller in milliseconds, which keeps the throttle deterministic under test.

#[cfg(test)]
#[path = "throttle_test.rs"]
mod throttle_test;

use crate::consts::PUBLISH_INTERVAL_MS;

#[derive(Debug, Clone)]
pub struct Throttle {
    interval_ms: f64,
    last_publish: Option<f64>,
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(PUBLISH_INTERVAL_MS)
    }
}

impl Throttle {
    #[must_use]
    pub fn new(interval_ms: f64) -> Self {
        Self { interval_ms: interval_ms.max(0.0), last_publish: None }
    }

    #[must_use]
    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Returns `true` and records `now_ms` if a publish is allowed now.
    ///
    /// A clock that moved backwards counts as an elapsed interval.
    pub fn try_acquire(&mut self, now_ms: f64) -> bool {
        if self.remaining(now_ms) > 0.0 {
            return false;
        }
        self.last_publish = Some(now_ms);
        true
    }

    /// Milliseconds until the next publish is allowed; zero when ready.
    #[must_use]
    pub fn remaining(&self, now_ms: f64) -> f64 {
        let Some(last) = self.last_publish else {
            return 0.0;
        };
        let elapsed = now_ms - last;
        if elapsed < 0.0 {
            return 0.0;
        }
        (self.interval_ms - elapsed).max(0.0)
    }
}
