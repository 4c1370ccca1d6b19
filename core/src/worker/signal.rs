//! Cancellation signal observed by worker code.
//!
//! One signal carries two escalation levels: a cooperative cancel request
//! and, on top of it, a forced abort. Work polls it with
//! [`CancelSignal::check`] or waits on it with [`CancelSignal::sleep`], which
//! wakes as soon as either level is raised.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::WorkerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Level {
    Clear,
    Cancelled,
    Aborted,
}

struct SignalInner {
    level: Mutex<Level>,
    changed: Condvar,
}

/// Shared cancellation signal of one worker run.
///
/// Cloning is cheap; every clone observes the same state. Levels only ever
/// go up: aborting a cancelled signal is allowed, un-cancelling is not.
#[derive(Clone)]
pub struct CancelSignal {
    inner: Arc<SignalInner>,
}

impl CancelSignal {
    /// A fresh signal with nothing requested.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalInner {
                level: Mutex::new(Level::Clear),
                changed: Condvar::new(),
            }),
        }
    }

    fn raise(&self, to: Level) {
        let mut level = self.inner.level.lock();
        if *level < to {
            *level = to;
            self.inner.changed.notify_all();
        }
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.raise(Level::Cancelled);
    }

    /// Escalate to a forced abort.
    pub fn abort(&self) {
        self.raise(Level::Aborted);
    }

    /// True once cancel or abort has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.inner.level.lock() >= Level::Cancelled
    }

    /// True once a forced abort has been requested.
    pub fn is_aborted(&self) -> bool {
        *self.inner.level.lock() == Level::Aborted
    }

    /// `Ok` while nothing is requested, otherwise the matching error.
    ///
    /// Meant to be used with `?` at the top of a work loop.
    pub fn check(&self) -> Result<(), WorkerError> {
        match *self.inner.level.lock() {
            Level::Clear => Ok(()),
            Level::Cancelled => Err(WorkerError::Cancelled),
            Level::Aborted => Err(WorkerError::Aborted),
        }
    }

    /// Sleep for `duration`, waking early if the signal is raised.
    ///
    /// Returns the same value as [`check`](Self::check) after waking.
    pub fn sleep(&self, duration: Duration) -> Result<(), WorkerError> {
        self.wait_raised(duration);
        self.check()
    }

    /// Block until the signal is raised or `timeout` passes.
    ///
    /// Returns whether the signal is raised.
    pub fn wait_raised(&self, timeout: Duration) -> bool {
        let mut level = self.inner.level.lock();
        match Instant::now().checked_add(timeout) {
            Some(deadline) => {
                while *level == Level::Clear {
                    if self.inner.changed.wait_until(&mut level, deadline).timed_out() {
                        break;
                    }
                }
            }
            None => {
                while *level == Level::Clear {
                    self.inner.changed.wait(&mut level);
                }
            }
        }
        *level != Level::Clear
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelSignal")
            .field("level", &*self.inner.level.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_levels_only_go_up() {
        let signal = CancelSignal::new();
        assert!(signal.check().is_ok());
        assert!(!signal.is_cancelled());

        signal.abort();
        signal.cancel();
        assert!(signal.is_cancelled());
        assert!(signal.is_aborted());
        assert_eq!(signal.check(), Err(WorkerError::Aborted));
    }

    #[test]
    fn test_clones_share_state() {
        let signal = CancelSignal::new();
        let observer = signal.clone();
        signal.cancel();
        assert_eq!(observer.check(), Err(WorkerError::Cancelled));
        assert!(!observer.is_aborted());
    }

    #[test]
    fn test_sleep_times_out_when_clear() {
        let signal = CancelSignal::new();
        let started = Instant::now();
        assert!(signal.sleep(Duration::from_millis(20)).is_ok());
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_sleep_wakes_on_cancel() {
        let signal = CancelSignal::new();
        let canceller = signal.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            canceller.cancel();
        });

        let started = Instant::now();
        let result = signal.sleep(Duration::from_secs(30));
        handle.join().unwrap();

        assert_eq!(result, Err(WorkerError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_wait_raised_with_unbounded_timeout() {
        let signal = CancelSignal::new();
        let aborter = signal.clone();
        let handle = thread::spawn(move || aborter.abort());

        assert!(signal.wait_raised(Duration::MAX));
        handle.join().unwrap();
        assert!(signal.is_aborted());
    }
}
