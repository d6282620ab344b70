use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Process-wide gate spacing outbound upstream calls.
///
/// One instance is shared by every in-flight request; it protects the
/// gateway's upstream quota, not any single client (that is the admission
/// cap's job). The last-call slot stays locked for the whole
/// check-wait-stamp sequence, so concurrent acquirers queue first-come
/// first-served and can never compute a wait from a stale timestamp.
pub struct Throttle {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Suspends until `min_interval` has elapsed since the last permitted
    /// call, then records the new call time and returns.
    pub async fn acquire(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(last) = *last_call {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}
