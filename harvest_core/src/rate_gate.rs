use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::time::sleep_until;

/// Global, single-producer token stream: one permit every `interval`.
///
/// Every outbound HTTP request — JSON fetch or media download — acquires a
/// permit before issuing. There is no burst allowance beyond scheduler
/// jitter and no cancellation; a suspended `acquire()` simply waits its
/// turn. Safe to share behind an `Arc` across every worker in every stage.
pub struct RateGate {
    interval: Duration,
    next_slot: Mutex<Instant>,
}

impl RateGate {
    /// `permits_per_second` governs the spacing between grants; the spec's
    /// default corresponds to ~200/s.
    pub fn new(permits_per_second: u32) -> Self {
        let interval = Duration::from_secs_f64(1.0 / permits_per_second.max(1) as f64);
        Self {
            interval,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    /// Suspend until a permit is available, then consume it.
    pub async fn acquire(&self) {
        let mut next_slot = self.next_slot.lock().await;
        let now = Instant::now();
        let grant_at = (*next_slot).max(now);
        *next_slot = grant_at + self.interval;
        // Drop the guard before sleeping so other callers can queue behind us
        // instead of serializing on the mutex for the sleep duration too.
        let target = grant_at;
        drop(next_slot);
        sleep_until(tokio::time::Instant::from_std(target)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn spaces_permits_at_the_configured_rate() {
        let gate = Arc::new(RateGate::new(1000)); // 1ms apart
        let start = Instant::now();
        for _ in 0..5 {
            gate.acquire().await;
        }
        assert!(start.elapsed() >= Duration::from_millis(4));
    }

    #[tokio::test]
    async fn concurrent_callers_each_get_a_distinct_slot() {
        let gate = Arc::new(RateGate::new(500));
        let mut handles = Vec::new();
        for _ in 0..10 {
            let gate = Arc::clone(&gate);
            handles.push(tokio::spawn(async move {
                gate.acquire().await;
                Instant::now()
            }));
        }
        let mut times = Vec::new();
        for h in handles {
            times.push(h.await.unwrap());
        }
        times.sort();
        times.dedup();
        assert_eq!(times.len(), 10, "every caller should observe a distinct grant time");
    }
}
