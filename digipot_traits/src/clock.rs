use std::thread;
use std::time::{Duration, Instant};

/// Monotonic microsecond timestamp attached to every input edge.
///
/// Only differences between timestamps are meaningful; the epoch is whatever
/// the edge source counts from (kernel event time, process start, a test).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    #[inline]
    pub const fn from_micros(us: u64) -> Self {
        Self(us)
    }

    #[inline]
    pub fn from_duration(d: Duration) -> Self {
        Self(u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
    }

    #[inline]
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// Microseconds elapsed since `earlier`, saturating at 0 if the source
    /// ever reports time going backwards.
    #[inline]
    pub const fn micros_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    #[inline]
    pub const fn add_micros(self, us: u64) -> Self {
        Self(self.0.saturating_add(us))
    }
}

/// Time source for anything that stamps edges itself or waits on time.
///
/// Edge sources that get kernel timestamps do not need one; the simulator
/// and tests do.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Timestamp of `now()` measured from `epoch`; 0 if `epoch` is later.
    fn timestamp_since(&self, epoch: Instant) -> Timestamp {
        Timestamp::from_duration(self.now().saturating_duration_since(epoch))
    }
}

/// Wall-clock monotonic time.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, d: Duration) {
        if !d.is_zero() {
            thread::sleep(d);
        }
    }
}

pub mod test_clock {
    use super::{Clock, Duration, Instant};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Manual clock: time moves only through `advance` or `sleep`. Clones
    /// share the same elapsed counter.
    #[derive(Debug, Clone)]
    pub struct TestClock {
        origin: Instant,
        elapsed_us: Arc<AtomicU64>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                elapsed_us: Arc::new(AtomicU64::new(0)),
            }
        }

        pub fn origin(&self) -> Instant {
            self.origin
        }

        pub fn advance(&self, d: Duration) {
            let us = u64::try_from(d.as_micros()).unwrap_or(u64::MAX);
            self.elapsed_us.fetch_add(us, Ordering::SeqCst);
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            self.origin + Duration::from_micros(self.elapsed_us.load(Ordering::SeqCst))
        }

        fn sleep(&self, d: Duration) {
            self.advance(d);
        }
    }
}
