/// Clock collaborator
///
/// The engine never reads wall time directly; it asks an injected clock.
/// Sale-window behavior becomes deterministic in tests by swapping in the
/// manual implementation.
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

/// External time source consulted on every gated operation.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock with second resolution, for deterministic tests and
/// replay tooling.
#[derive(Debug)]
pub struct ManualClock {
    epoch_secs: AtomicI64,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            epoch_secs: AtomicI64::new(now.timestamp()),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.epoch_secs.store(now.timestamp(), Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.epoch_secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.epoch_secs.load(Ordering::SeqCst), 0)
            .unwrap_or(DateTime::UNIX_EPOCH)
    }
}
