use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

pub const ADMISSION_MAX_REQUESTS: usize = 10;
pub const ADMISSION_WINDOW: Duration = Duration::from_secs(60);

/// Per-source inbound request cap over a sliding window.
///
/// Keyed by originating identity (client IP). Independent of, and stricter
/// than, the upstream throttle: a source over its cap is turned away before
/// the throttle or upstream is consulted at all. Stamps expire lazily on
/// access; the critical sections never await, so a std mutex suffices.
pub struct AdmissionCap {
    max_requests: usize,
    window: Duration,
    entries: Mutex<HashMap<String, Vec<Instant>>>,
}

impl AdmissionCap {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Records the request and reports whether the source is still within
    /// its cap. Rejected requests do not consume a slot.
    pub fn try_admit(&self, source: &str) -> bool {
        let now = Instant::now();
        let mut entries = self.lock_entries();
        entries.retain(|_, stamps| {
            stamps.retain(|stamp| now.duration_since(*stamp) < self.window);
            !stamps.is_empty()
        });

        let stamps = entries.entry(source.to_string()).or_default();
        if stamps.len() >= self.max_requests {
            return false;
        }
        stamps.push(now);
        true
    }

    /// Returns the source's most recent slot. Used when a request dies on a
    /// transport failure or deadline, which must not count against the cap.
    pub fn release(&self, source: &str) {
        let mut entries = self.lock_entries();
        if let Some(stamps) = entries.get_mut(source) {
            stamps.pop();
        }
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Instant>>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn admits_up_to_cap_then_rejects() {
        let cap = AdmissionCap::new(3, ADMISSION_WINDOW);
        for _ in 0..3 {
            assert!(cap.try_admit("10.0.0.1"));
        }
        assert!(!cap.try_admit("10.0.0.1"));
    }

    #[tokio::test(start_paused = true)]
    async fn sources_are_counted_independently() {
        let cap = AdmissionCap::new(1, ADMISSION_WINDOW);
        assert!(cap.try_admit("10.0.0.1"));
        assert!(cap.try_admit("10.0.0.2"));
        assert!(!cap.try_admit("10.0.0.1"));
    }

    #[tokio::test(start_paused = true)]
    async fn slots_expire_once_the_window_passes() {
        let cap = AdmissionCap::new(1, ADMISSION_WINDOW);
        assert!(cap.try_admit("10.0.0.1"));
        assert!(!cap.try_admit("10.0.0.1"));

        tokio::time::advance(ADMISSION_WINDOW + Duration::from_millis(1)).await;
        assert!(cap.try_admit("10.0.0.1"));
    }

    #[tokio::test(start_paused = true)]
    async fn release_restores_a_slot() {
        let cap = AdmissionCap::new(1, ADMISSION_WINDOW);
        assert!(cap.try_admit("10.0.0.1"));
        cap.release("10.0.0.1");
        assert!(cap.try_admit("10.0.0.1"));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_requests_do_not_consume_slots() {
        let cap = AdmissionCap::new(2, ADMISSION_WINDOW);
        assert!(cap.try_admit("10.0.0.1"));
        assert!(cap.try_admit("10.0.0.1"));
        assert!(!cap.try_admit("10.0.0.1"));

        // A release after a rejection must free one of the admitted slots,
        // not a phantom slot from the rejected call.
        cap.release("10.0.0.1");
        assert!(cap.try_admit("10.0.0.1"));
        assert!(!cap.try_admit("10.0.0.1"));
    }
}
