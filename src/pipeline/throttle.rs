//! Frame admission throttle.
//! The capture source produces frames far faster than analysis + translation
//! can consume them; at most one frame per interval gets through and the
//! rest are dropped before any processing.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Stateful minimum-interval gate. Purely time-based; the only side effect
/// is the stored timestamp of the last admitted frame.
pub struct ThrottleGate {
    min_interval: Duration,
    last_admitted: Mutex<Option<Instant>>,
}

impl ThrottleGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_admitted: Mutex::new(None),
        }
    }

    /// Admit the frame observed at `now`? True updates the stored timestamp;
    /// false means the caller must release the frame immediately without
    /// further processing.
    pub fn should_admit(&self, now: Instant) -> bool {
        let mut last = self.last_admitted.lock();
        match *last {
            Some(prev) if now.duration_since(prev) < self.min_interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}
