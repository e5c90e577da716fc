//! Timer primitives consumed by the debounce and throttle controllers
//!
//! A controller only needs three things from its host: a monotonic clock, a way
//! to run a callback after a delay, and a way to cancel that callback. The
//! [`Scheduler`] trait captures exactly that. [`TokioScheduler`] is the
//! production implementation; [`ManualScheduler`] drives a virtual clock by hand.

use std::fmt;
use std::time::{Duration, Instant};
use toolite_common::{Error, Result};

/// Callback run when a scheduled delay elapses
pub type Wakeup = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a scheduled wakeup
pub trait TimerHandle: Send {
    /// Prevent the wakeup from running. Calling this after the wakeup ran, or
    /// more than once, has no effect.
    fn cancel(&self);
}

/// Host timer capability
pub trait Scheduler: Send + Sync + 'static {
    /// Current monotonic time
    fn now(&self) -> Instant;

    /// Run `wakeup` once `delay` has elapsed.
    ///
    /// Implementations must never run the wakeup before returning, even for a
    /// zero delay.
    fn schedule(&self, delay: Duration, wakeup: Wakeup) -> Box<dyn TimerHandle>;
}

// ============================================================================
// Tokio
// ============================================================================

/// Scheduler backed by tokio timers
///
/// Each wakeup is a spawned task sleeping until its deadline; cancelling aborts
/// the task. Under a paused tokio clock (`test-util`) the virtual time is used.
#[derive(Clone)]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

impl TokioScheduler {
    /// Bind to the runtime of the calling context
    pub fn current() -> Result<Self> {
        tokio::runtime::Handle::try_current()
            .map(|handle| Self { handle })
            .map_err(|e| Error::runtime(format!("No tokio runtime available for timers: {}", e)))
    }

    /// Bind to an explicit runtime
    pub fn from_handle(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }
}

impl fmt::Debug for TokioScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioScheduler").finish_non_exhaustive()
    }
}

impl TimerHandle for tokio::task::JoinHandle<()> {
    fn cancel(&self) {
        self.abort();
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> Instant {
        let _guard = self.handle.enter();
        tokio::time::Instant::now().into_std()
    }

    fn schedule(&self, delay: Duration, wakeup: Wakeup) -> Box<dyn TimerHandle> {
        let _guard = self.handle.enter();
        // Deadline is fixed here, not at the task's first poll
        let deadline = tokio::time::Instant::now() + delay;
        Box::new(self.handle.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            wakeup();
        }))
    }
}

// ============================================================================
// Manual (virtual clock)
// ============================================================================

#[cfg(any(test, feature = "test-utils"))]
pub use manual::ManualScheduler;

#[cfg(any(test, feature = "test-utils"))]
mod manual {
    use super::{Scheduler, TimerHandle, Wakeup};
    use parking_lot::Mutex;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Weak};
    use std::time::{Duration, Instant};

    /// (deadline offset, schedule sequence)
    type Key = (Duration, u64);

    struct ManualState {
        origin: Instant,
        elapsed: Duration,
        next_seq: u64,
        queue: BTreeMap<Key, Wakeup>,
    }

    /// Virtual-clock scheduler advanced explicitly by the caller
    ///
    /// Wakeups run on the thread calling [`ManualScheduler::advance`], ordered
    /// by deadline and then by the order they were scheduled.
    #[derive(Clone)]
    pub struct ManualScheduler {
        state: Arc<Mutex<ManualState>>,
    }

    impl Default for ManualScheduler {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ManualScheduler {
        pub fn new() -> Self {
            Self {
                state: Arc::new(Mutex::new(ManualState {
                    origin: Instant::now(),
                    elapsed: Duration::ZERO,
                    next_seq: 0,
                    queue: BTreeMap::new(),
                })),
            }
        }

        /// Virtual time elapsed since creation
        pub fn elapsed(&self) -> Duration {
            self.state.lock().elapsed
        }

        /// Number of wakeups still queued
        pub fn pending(&self) -> usize {
            self.state.lock().queue.len()
        }

        /// Move the clock forward by `by`, running every wakeup that falls due
        pub fn advance(&self, by: Duration) {
            let target = self.state.lock().elapsed + by;
            loop {
                let due = {
                    let mut state = self.state.lock();
                    match state.queue.keys().next().copied() {
                        Some(key) if key.0 <= target => {
                            state.elapsed = state.elapsed.max(key.0);
                            state.queue.remove(&key)
                        },
                        _ => None,
                    }
                };
                // Lock released: the wakeup may schedule or cancel freely
                match due {
                    Some(wakeup) => wakeup(),
                    None => break,
                }
            }
            self.state.lock().elapsed = target;
        }

        /// Shorthand for `advance(Duration::from_millis(ms))`
        pub fn advance_ms(&self, ms: u64) {
            self.advance(Duration::from_millis(ms));
        }
    }

    struct ManualHandle {
        state: Weak<Mutex<ManualState>>,
        key: Key,
    }

    impl TimerHandle for ManualHandle {
        fn cancel(&self) {
            if let Some(state) = self.state.upgrade() {
                state.lock().queue.remove(&self.key);
            }
        }
    }

    impl Scheduler for ManualScheduler {
        fn now(&self) -> Instant {
            let state = self.state.lock();
            state.origin + state.elapsed
        }

        fn schedule(&self, delay: Duration, wakeup: Wakeup) -> Box<dyn TimerHandle> {
            let mut state = self.state.lock();
            let key = (state.elapsed + delay, state.next_seq);
            state.next_seq += 1;
            state.queue.insert(key, wakeup);
            Box::new(ManualHandle {
                state: Arc::downgrade(&self.state),
                key,
            })
        }
    }
}
