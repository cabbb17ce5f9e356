use crate::error::CoreError;
use crate::state::KeyValueStore;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Key under which the last completed scan time is persisted.
pub const LAST_CHECK_KEY: &str = "periodic.last_check_timestamp";

/// Wall-clock source in seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start)),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Limits how often catch-up scans run, based on the time of the last
/// completed scan.
pub struct ThrottleGate<K, C> {
    store: K,
    clock: C,
    interval_secs: i64,
}

impl<K: KeyValueStore, C: Clock> ThrottleGate<K, C> {
    pub fn new(store: K, clock: C, interval_secs: i64) -> Self {
        Self {
            store,
            clock,
            interval_secs,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn interval_secs(&self) -> i64 {
        self.interval_secs
    }

    /// Last completed scan time, 0 if none was ever recorded.
    pub async fn last_check(&self) -> Result<i64, CoreError> {
        Ok(self.store.get_i64(LAST_CHECK_KEY).await?.unwrap_or(0))
    }

    pub async fn should_run_scan(&self) -> Result<bool, CoreError> {
        let last = self.last_check().await?;
        let elapsed = self.clock.now().saturating_sub(last);
        let due = elapsed > self.interval_secs;
        tracing::debug!(last, elapsed, due, "throttle check");
        Ok(due)
    }

    /// Records that a scan finished now. Call only after the scan completes.
    pub async fn mark_scan_completed(&self) -> Result<(), CoreError> {
        self.store.set_i64(LAST_CHECK_KEY, self.clock.now()).await
    }

    /// Forgets the last scan so the next check lets a scan through.
    pub async fn reset_throttle(&self) -> Result<(), CoreError> {
        self.store.remove(LAST_CHECK_KEY).await
    }
}
