//! Time sources for scheduling decisions that depend on "now".

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use atomic_float::AtomicF64;

use crate::Seconds;

/// Monotonic time source, in the same units as every scheduled time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Seconds;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    #[inline]
    fn now(&self) -> Seconds {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now(&self) -> Seconds {
        (**self).now()
    }
}

/// Seconds elapsed since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Seconds {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Clock that only moves when told to. Shared through an [`Arc`] so a test
/// can advance time under a timeline that owns a handle to it.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicF64,
}

impl ManualClock {
    pub fn new(start: Seconds) -> Self {
        Self {
            now: AtomicF64::new(start),
        }
    }

    pub fn shared(start: Seconds) -> Arc<Self> {
        Arc::new(Self::new(start))
    }

    pub fn set(&self, time: Seconds) {
        self.now.store(time, Ordering::Release);
    }

    pub fn advance(&self, delta: Seconds) {
        self.now.fetch_add(delta, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> Seconds {
        self.now.load(Ordering::Acquire)
    }
}
