use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use nym_types::TxnTime;

/// Source of commit timestamps.
pub trait Clock: Send + Sync {
    /// Current time in unix seconds.
    fn now(&self) -> TxnTime;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TxnTime {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: TxnTime) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn set(&self, time: TxnTime) {
        self.now.store(time, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: u64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TxnTime {
        self.now.load(Ordering::SeqCst)
    }
}
