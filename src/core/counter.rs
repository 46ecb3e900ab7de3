//! Atomic in-flight job counter with blocking wait.
//!
//! A `Counter` is caller-owned and shared with jobs by cheap clone. It is
//! incremented once per job created against it and decremented once per
//! completed job; `wait()` blocks until the observed value is zero. The
//! decrement is release-ordered, so a waiter that observes zero also
//! observes every side effect of the jobs that completed.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Shared atomic count of in-flight jobs.
///
/// Clones are handles to the same count. A counter may outlive the
/// scheduler and may be reused across graphs.
#[derive(Clone, Debug, Default)]
pub struct Counter {
    inner: Arc<CounterInner>,
}

#[derive(Debug, Default)]
struct CounterInner {
    value: AtomicU32,
    lock: Mutex<()>,
    zero: Condvar,
}

impl Counter {
    /// Create a counter with value zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increase the count by `n`.
    pub fn add(&self, n: u32) {
        self.inner.value.fetch_add(n, Ordering::Relaxed);
    }

    /// Decrease the count by `n`, waking all waiters if zero is reached.
    ///
    /// Release-ordered: writes performed before the decrement are visible
    /// to any thread that subsequently observes the zero.
    pub fn sub(&self, n: u32) {
        let prev = self.inner.value.fetch_sub(n, Ordering::AcqRel);
        debug_assert!(prev >= n, "counter underflow: {prev} - {n}");
        if prev == n {
            // Lock before notifying so a waiter between its zero check and
            // its condvar wait cannot miss the wakeup.
            let _guard = self.inner.lock.lock();
            self.inner.zero.notify_all();
        }
    }

    /// Current count.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.inner.value.load(Ordering::Acquire)
    }

    /// Block the calling thread until the count is zero.
    ///
    /// Returns immediately if the count is already zero.
    pub fn wait(&self) {
        if self.value() == 0 {
            return;
        }
        let mut guard = self.inner.lock.lock();
        while self.value() != 0 {
            self.inner.zero.wait(&mut guard);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_add_sub_value() {
        let counter = Counter::new();
        assert_eq!(counter.value(), 0);
        counter.add(5);
        assert_eq!(counter.value(), 5);
        counter.sub(2);
        counter.sub(3);
        assert_eq!(counter.value(), 0);
    }

    #[test]
    fn test_wait_on_zero_returns_immediately() {
        let counter = Counter::new();
        counter.wait();
    }

    #[test]
    fn test_wait_releases_on_last_decrement() {
        let counter = Counter::new();
        counter.add(3);

        let decrementer = counter.clone();
        let handle = thread::spawn(move || {
            for _ in 0..3 {
                thread::sleep(Duration::from_millis(5));
                decrementer.sub(1);
            }
        });

        counter.wait();
        assert_eq!(counter.value(), 0);
        handle.join().unwrap();
    }

    #[test]
    fn test_clones_share_the_count() {
        let counter = Counter::new();
        let other = counter.clone();
        counter.add(2);
        other.sub(1);
        assert_eq!(counter.value(), 1);
        assert_eq!(other.value(), 1);
    }

    #[test]
    fn test_many_waiters_all_released() {
        let counter = Counter::new();
        counter.add(1);

        let mut waiters = Vec::new();
        for _ in 0..4 {
            let c = counter.clone();
            waiters.push(thread::spawn(move || c.wait()));
        }

        thread::sleep(Duration::from_millis(10));
        counter.sub(1);

        for w in waiters {
            w.join().unwrap();
        }
    }
}
