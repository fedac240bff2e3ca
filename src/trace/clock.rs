//! Monotonic timestamps and the clocks that produce them.
//!
//! An [`Instant`] is a raw `(seconds, nanoseconds)` pair read from a monotonic
//! clock. It carries no epoch and is only meaningful when subtracted from
//! another instant taken during the same process run. The all-zero value is the
//! [`Instant::UNSET`] sentinel, meaning "never recorded".

use std::cell::Cell;
use std::ops::Add;
use std::time::Duration;

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// A monotonic timestamp split into whole seconds and a sub-second remainder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant {
    secs: u64,
    nanos: u32,
}

impl Instant {
    /// The "never recorded" sentinel.
    pub const UNSET: Instant = Instant { secs: 0, nanos: 0 };

    /// Build an instant, carrying any whole seconds out of `nanos`.
    pub const fn new(secs: u64, nanos: u32) -> Self {
        Self {
            secs: secs + (nanos / NANOS_PER_SEC) as u64,
            nanos: nanos % NANOS_PER_SEC,
        }
    }

    pub const fn from_duration(offset: Duration) -> Self {
        Self::new(offset.as_secs(), offset.subsec_nanos())
    }

    pub const fn secs(&self) -> u64 {
        self.secs
    }

    pub const fn subsec_nanos(&self) -> u32 {
        self.nanos
    }

    pub const fn is_unset(&self) -> bool {
        self.secs == 0 && self.nanos == 0
    }

    /// Normalized time elapsed from `earlier` to `self`.
    ///
    /// The seconds are subtracted separately from the nanosecond remainders;
    /// when the remainder difference is negative one second is borrowed so the
    /// result is always a non-negative `(secs, nanos)` pair. A pair that runs
    /// backwards saturates to zero.
    pub fn duration_since(&self, earlier: Instant) -> Duration {
        let mut secs = self.secs as i128 - earlier.secs as i128;
        let mut nanos = i64::from(self.nanos) - i64::from(earlier.nanos);

        if nanos < 0 {
            secs -= 1;
            nanos += i64::from(NANOS_PER_SEC);
        }

        if secs < 0 {
            return Duration::ZERO;
        }

        Duration::new(secs as u64, nanos as u32)
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Instant {
        let nanos = self.nanos + rhs.subsec_nanos();
        Instant::new(self.secs.saturating_add(rhs.as_secs()), nanos)
    }
}

/// Source of monotonic, non-decreasing timestamps.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Process clock backed by [`std::time::Instant`].
///
/// Reads are measured from the moment the clock was created and shifted by one
/// second, so a real read can never collide with [`Instant::UNSET`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: std::time::Instant,
}

impl MonotonicClock {
    const BASE: Duration = Duration::from_secs(1);

    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::from_duration(Self::BASE + self.origin.elapsed())
    }
}

/// Hand-driven clock for deterministic reports.
///
/// Time only moves when [`advance`](Self::advance) or [`set`](Self::set) is
/// called, or by a fixed step after every read when built with
/// [`with_step`](Self::with_step).
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Instant>,
    step: Duration,
}

impl ManualClock {
    pub fn starting_at(start: Instant) -> Self {
        Self {
            now: Cell::new(start),
            step: Duration::ZERO,
        }
    }

    /// Clock that moves forward by `step` after each read.
    pub fn with_step(start: Instant, step: Duration) -> Self {
        Self {
            now: Cell::new(start),
            step,
        }
    }

    pub fn set(&self, instant: Instant) {
        self.now.set(instant);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let now = self.now.get();
        if !self.step.is_zero() {
            self.now.set(now + self.step);
        }
        now
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}
