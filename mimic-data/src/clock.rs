use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Defines how harness components determine the current time.
///
/// Generally a component will use a:
/// * [`LiveClock`] when driving a real venue simulation.
/// * [`FixedClock`] for deterministic tests.
pub trait Clock {
    fn time(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.time().date_naive()
    }
}

/// Live `Clock` using `Utc::now()`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct LiveClock;

impl Clock for LiveClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable `Clock` pinned to an explicit instant.
///
/// Cloning shares the underlying instant, so a test can hold one handle and advance the time
/// observed by every component it was passed to.
#[derive(Debug, Clone)]
pub struct FixedClock {
    inner: Arc<parking_lot::RwLock<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            inner: Arc::new(parking_lot::RwLock::new(time)),
        }
    }

    pub fn set(&self, time: DateTime<Utc>) {
        *self.inner.write() = time;
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut lock = self.inner.write();
        *lock = lock.checked_add_signed(delta).unwrap_or(*lock);
    }
}

impl Clock for FixedClock {
    fn time(&self) -> DateTime<Utc> {
        *self.inner.read()
    }
}
