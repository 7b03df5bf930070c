//! Cancellable timed waits for the execution gate.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Shared cancellation flag. Clones observe the same flag.
///
/// Cancelling wakes every thread blocked in [`CancelToken::wait_timeout`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (flag, signal) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        signal.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block for up to `timeout`. Returns `true` if cancelled before or during the wait.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (flag, signal) = &*self.inner;
        let guard = flag.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = signal
            .wait_timeout_while(guard, timeout, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn wait_runs_full_timeout_when_not_cancelled() {
        let token = CancelToken::new();
        let started = Instant::now();
        assert!(!token.wait_timeout(Duration::from_millis(30)));
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn cancel_wakes_waiter_early() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = thread::spawn(move || {
            let started = Instant::now();
            let cancelled = waiter.wait_timeout(Duration::from_secs(10));
            (cancelled, started.elapsed())
        });
        thread::sleep(Duration::from_millis(20));
        token.cancel();
        let (cancelled, elapsed) = handle.join().expect("join");
        assert!(cancelled);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn already_cancelled_returns_immediately() {
        let token = CancelToken::new();
        token.cancel();
        assert!(token.is_cancelled());
        assert!(token.wait_timeout(Duration::from_secs(10)));
    }
}
