//! Clock injection.
//!
//! Every time-sensitive component accepts an overrideable clock instead of reading the wall
//! clock directly. This is the single hook tests use to exercise lease expiry, retry windows,
//! and throttle deadlines deterministically.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// A source of the current UTC time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The default clock, backed by the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that never advances on its own; tests move it forward explicitly.
///
/// Stores the timestamp as milliseconds since the epoch in an `AtomicI64` so the clock can be
/// shared (via `Arc`) across a store and the test driving it without interior mutability
/// footguns.
pub struct FixedClock {
    millis: AtomicI64,
}

impl FixedClock {
    pub fn new(start: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            millis: AtomicI64::new(start.timestamp_millis()),
        })
    }

    pub fn epoch() -> Arc<Self> {
        Self::new(DateTime::<Utc>::from_timestamp(0, 0).expect("valid epoch"))
    }

    /// Advances the clock by `duration`, returning the new time.
    pub fn advance(&self, duration: chrono::Duration) -> DateTime<Utc> {
        let delta = duration.num_milliseconds();
        let new_millis = self.millis.fetch_add(delta, Ordering::SeqCst) + delta;
        DateTime::<Utc>::from_timestamp_millis(new_millis).expect("valid timestamp")
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.millis.store(at.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.millis.load(Ordering::SeqCst))
            .expect("valid timestamp")
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
