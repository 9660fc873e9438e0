//! Minimum-interval gate shared by the rotation and button streams.

use digipot_traits::Timestamp;

/// An event that passed the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accepted {
    pub timestamp: Timestamp,
    /// Time since the previously accepted event; `None` for the first one.
    pub interval_us: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct DebounceGate {
    min_interval_us: u64,
    last_accepted: Option<Timestamp>,
    last_seen: Option<Timestamp>,
}

impl DebounceGate {
    pub fn new(min_interval_us: u64) -> Self {
        Self {
            min_interval_us,
            last_accepted: None,
            last_seen: None,
        }
    }

    pub fn min_interval_us(&self) -> u64 {
        self.min_interval_us
    }

    pub fn last_accepted(&self) -> Option<Timestamp> {
        self.last_accepted
    }

    /// Most recent raw event, accepted or not.
    pub fn last_seen(&self) -> Option<Timestamp> {
        self.last_seen
    }

    /// Offer a raw event. Accepted when nothing was accepted before or at
    /// least `min_interval_us` has passed since the last acceptance.
    pub fn offer(&mut self, t: Timestamp) -> Option<Accepted> {
        self.last_seen = Some(t);
        let interval_us = match self.last_accepted {
            Some(prev) => {
                let dt = t.micros_since(prev);
                if dt < self.min_interval_us {
                    tracing::trace!(dt, min = self.min_interval_us, "debounced");
                    return None;
                }
                Some(dt)
            }
            None => None,
        };
        self.last_accepted = Some(t);
        Some(Accepted {
            timestamp: t,
            interval_us,
        })
    }

    /// Record a raw event without offering it (release edges).
    pub fn observe(&mut self, t: Timestamp) {
        self.last_seen = Some(t);
    }

    /// Forget acceptance history, e.g. on a page change.
    pub fn reset(&mut self) {
        self.last_accepted = None;
        self.last_seen = None;
    }
}
