//! Interruptible sleep.

use std::time::Instant;

use parking_lot::{Condvar, Mutex};

/// A one-shot cancellation flag that wakes any thread sleeping on it.
#[derive(Debug, Default)]
pub struct CancelSignal {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag and wake all sleepers. Stays raised.
    pub fn cancel(&self) {
        *self.cancelled.lock() = true;
        self.wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.lock()
    }

    /// Sleep until `deadline` or cancellation, whichever comes first.
    ///
    /// Returns true if cancelled. The flag is re-checked after every wake, so
    /// spurious wakeups neither end the sleep early nor miss a cancellation.
    pub fn sleep_until(&self, deadline: Instant) -> bool {
        let mut cancelled = self.cancelled.lock();
        loop {
            if *cancelled {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            self.wake.wait_until(&mut cancelled, deadline);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_sleep_runs_to_deadline() {
        let signal = CancelSignal::new();
        let start = Instant::now();
        assert!(!signal.sleep_until(start + Duration::from_millis(50)));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_past_deadline_returns_immediately() {
        let signal = CancelSignal::new();
        assert!(!signal.sleep_until(Instant::now()));
    }

    #[test]
    fn test_cancel_wakes_sleeper() {
        let signal = Arc::new(CancelSignal::new());
        let sleeper = {
            let signal = signal.clone();
            thread::spawn(move || {
                let start = Instant::now();
                let cancelled = signal.sleep_until(start + Duration::from_secs(30));
                (cancelled, start.elapsed())
            })
        };

        thread::sleep(Duration::from_millis(50));
        signal.cancel();
        let (cancelled, elapsed) = sleeper.join().unwrap();
        assert!(cancelled);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_cancel_before_sleep() {
        let signal = CancelSignal::new();
        signal.cancel();
        assert!(signal.is_cancelled());
        assert!(signal.sleep_until(Instant::now() + Duration::from_secs(30)));
    }
}
