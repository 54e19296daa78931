use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// The adaptive-sleep backpressure policy shared by the intake queues
/// and (a separate instance of) the worker pool's task queue
/// (spec.md §4.6, §4.8): when the queue a caller is about to push
/// onto is already over its limit, grow a shared sleep duration by 10
/// ms and block the caller for that long before it retries; shrink it
/// by 10 ms (floor zero) whenever the queue was under the limit.
///
/// Grounded on the single `queue_sleep_time` field the original
/// plugin shares across all four of its intake queues
/// (`examples/original_source/elasticsearch_plugin.cpp`,
/// `elasticsearch_plugin_impl::queue`).
pub struct Backpressure {
    max_queue_size: usize,
    sleep_ms: AtomicI64,
}

const STEP_MS: i64 = 10;
const WARN_THRESHOLD_MS: i64 = 1000;

impl Backpressure {
    pub fn new(max_queue_size: usize) -> Self {
        Self {
            max_queue_size,
            sleep_ms: AtomicI64::new(0),
        }
    }

    pub fn max_queue_size(&self) -> usize {
        self.max_queue_size
    }

    /// Current adaptive sleep duration, in milliseconds. Exposed for
    /// tests asserting backpressure monotonicity (spec.md §8, property 1).
    pub fn current_sleep_ms(&self) -> i64 {
        self.sleep_ms.load(Ordering::Relaxed)
    }

    /// Returns `Some(sleep_duration)` the caller must sleep for if
    /// `queue_len` is already over the limit; otherwise decays the
    /// shared sleep counter and returns `None`.
    pub fn observe(&self, queue_len: usize) -> Option<Duration> {
        if queue_len > self.max_queue_size {
            let new_sleep = self.sleep_ms.fetch_add(STEP_MS, Ordering::Relaxed) + STEP_MS;
            if new_sleep > WARN_THRESHOLD_MS {
                tracing::warn!(queue_size = queue_len, sleep_ms = new_sleep, "queue backlogged");
            }
            Some(Duration::from_millis(new_sleep as u64))
        } else {
            let mut cur = self.sleep_ms.load(Ordering::Relaxed);
            loop {
                let next = (cur - STEP_MS).max(0);
                match self
                    .sleep_ms
                    .compare_exchange_weak(cur, next, Ordering::Relaxed, Ordering::Relaxed)
                {
                    Ok(_) => break,
                    Err(v) => cur = v,
                }
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_grows_by_ten_ms_per_overshoot_and_decays_when_under() {
        let bp = Backpressure::new(100);
        assert!(bp.observe(50).is_none());
        assert_eq!(bp.current_sleep_ms(), 0);

        let d1 = bp.observe(200).unwrap();
        assert_eq!(d1, Duration::from_millis(10));
        let d2 = bp.observe(200).unwrap();
        assert_eq!(d2, Duration::from_millis(20));

        assert!(bp.observe(10).is_none());
        assert_eq!(bp.current_sleep_ms(), 10);
    }

    #[test]
    fn sleep_never_goes_negative() {
        let bp = Backpressure::new(100);
        bp.observe(10);
        bp.observe(10);
        assert_eq!(bp.current_sleep_ms(), 0);
    }
}
