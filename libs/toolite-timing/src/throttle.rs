//! Throttle controller
//!
//! Runs the target at most once per `wait` window. A call that lands in an
//! open window fires synchronously (leading edge); calls inside a closed
//! window can arm a single trailing execution that replays the most recent
//! arguments when the window ends.

use crate::options::ThrottleOptions;
use crate::scheduler::{Scheduler, TimerHandle, TokioScheduler};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use toolite_common::Result;
use tracing::{debug, trace};

type Target<A, R> = Box<dyn Fn(A) -> R + Send + Sync + 'static>;

struct Trailing {
    id: u64,
    handle: Box<dyn TimerHandle>,
}

struct ThrottleState<A, R> {
    /// Latest arguments, replayed by the trailing execution
    pending: Option<A>,
    trailing: Option<Trailing>,
    next_id: u64,
    /// Unset until the first fire, and again after a trailing fire when
    /// leading is disabled
    last_fire: Option<Instant>,
    last_result: Option<R>,
}

struct ThrottleInner<A, R> {
    target: Target<A, R>,
    options: ThrottleOptions,
    scheduler: Arc<dyn Scheduler>,
    state: Mutex<ThrottleState<A, R>>,
}

impl<A, R> Drop for ThrottleInner<A, R> {
    fn drop(&mut self) {
        if let Some(trailing) = self.state.get_mut().trailing.take() {
            trailing.handle.cancel();
        }
    }
}

/// Throttled wrapper around a target function
///
/// Clones share the same controller state.
pub struct Throttled<A, R> {
    inner: Arc<ThrottleInner<A, R>>,
}

impl<A, R> Clone for Throttled<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, R> fmt::Debug for Throttled<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttled")
            .field("options", &self.inner.options)
            .field("trailing_armed", &self.inner.state.lock().trailing.is_some())
            .finish()
    }
}

/// Throttle `target` on the current tokio runtime
///
/// `leading: true, trailing: false` matches [`ThrottleOptions::new`]. Fails
/// when called outside a tokio runtime.
pub fn throttle<A, R, F>(
    target: F,
    wait: Duration,
    leading: bool,
    trailing: bool,
) -> Result<Throttled<A, R>>
where
    A: Send + 'static,
    R: Clone + Send + 'static,
    F: Fn(A) -> R + Send + Sync + 'static,
{
    let scheduler = TokioScheduler::current()?;
    let options = ThrottleOptions::new(wait).leading(leading).trailing(trailing);
    Ok(Throttled::with_scheduler(target, options, Arc::new(scheduler)))
}

/// Time left in the current window, or `None` when the call may fire now.
///
/// A last fire in the future (clock went backwards) also opens the window.
fn remaining(wait: Duration, last_fire: Option<Instant>, now: Instant) -> Option<Duration> {
    let elapsed = now.checked_duration_since(last_fire?)?;
    wait.checked_sub(elapsed).filter(|left| !left.is_zero())
}

impl<A, R> Throttled<A, R>
where
    A: Send + 'static,
    R: Clone + Send + 'static,
{
    pub fn with_scheduler<F>(target: F, options: ThrottleOptions, scheduler: Arc<dyn Scheduler>) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(ThrottleInner {
                target: Box::new(target),
                options,
                scheduler,
                state: Mutex::new(ThrottleState {
                    pending: None,
                    trailing: None,
                    next_id: 0,
                    last_fire: None,
                    last_result: None,
                }),
            }),
        }
    }

    /// Invoke the wrapper
    ///
    /// Returns the latest known result: this call's own result when it fired,
    /// otherwise the result of the most recent execution.
    pub fn call(&self, args: A) -> Option<R> {
        let inner = &self.inner;
        let mut state = inner.state.lock();
        // Read under the lock so `last_fire` never lies ahead of `now`
        let now = inner.scheduler.now();

        if state.last_fire.is_none() && !inner.options.leading {
            state.last_fire = Some(now);
        }

        match remaining(inner.options.wait, state.last_fire, now) {
            None => {
                if let Some(trailing) = state.trailing.take() {
                    trailing.handle.cancel();
                }
                state.last_fire = Some(now);
                state.pending = None;
                drop(state);

                let result = (inner.target)(args);

                let mut state = inner.state.lock();
                state.last_result = Some(result.clone());
                if state.trailing.is_none() {
                    state.pending = None;
                }
                Some(result)
            },
            Some(left) => {
                state.pending = Some(args);
                if state.trailing.is_none() && inner.options.trailing {
                    arm(inner, &mut state, left);
                }
                state.last_result.clone()
            },
        }
    }

    /// Drop the trailing execution and forget the window
    ///
    /// The next call behaves like the first call ever made.
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock();
        if let Some(trailing) = state.trailing.take() {
            trailing.handle.cancel();
            debug!("Throttle cancelled (trailing {})", trailing.id);
        }
        state.pending = None;
        state.last_fire = None;
    }

    /// Whether a trailing execution is armed
    pub fn is_pending(&self) -> bool {
        self.inner.state.lock().trailing.is_some()
    }

    /// Result of the most recent actual invocation
    pub fn last_result(&self) -> Option<R> {
        self.inner.state.lock().last_result.clone()
    }

    pub fn options(&self) -> ThrottleOptions {
        self.inner.options
    }
}

fn arm<A, R>(inner: &Arc<ThrottleInner<A, R>>, state: &mut ThrottleState<A, R>, delay: Duration)
where
    A: Send + 'static,
    R: Clone + Send + 'static,
{
    let id = state.next_id;
    state.next_id += 1;

    let weak: Weak<ThrottleInner<A, R>> = Arc::downgrade(inner);
    let handle = inner.scheduler.schedule(
        delay,
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                fire_trailing(&inner, id);
            }
        }),
    );
    trace!("Throttle armed trailing {} for {:?}", id, delay);
    state.trailing = Some(Trailing { id, handle });
}

fn fire_trailing<A, R>(inner: &Arc<ThrottleInner<A, R>>, id: u64) {
    let mut state = inner.state.lock();
    if state.trailing.as_ref().map(|trailing| trailing.id) != Some(id) {
        return;
    }
    let now = inner.scheduler.now();
    state.trailing = None;
    state.last_fire = inner.options.leading.then_some(now);

    let Some(args) = state.pending.take() else {
        return;
    };
    drop(state);

    trace!("Throttle trailing {} invoking target", id);
    let result = (inner.target)(args);

    let mut state = inner.state.lock();
    state.last_result = Some(result);
    if state.trailing.is_none() {
        state.pending = None;
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;

    type Calls = Arc<Mutex<Vec<(u64, &'static str)>>>;

    fn recording(
        scheduler: &ManualScheduler,
        options: ThrottleOptions,
    ) -> (Throttled<&'static str, &'static str>, Calls) {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let clock = scheduler.clone();
        let throttled = Throttled::with_scheduler(
            move |arg: &'static str| {
                sink.lock().push((clock.elapsed().as_millis() as u64, arg));
                arg
            },
            options,
            Arc::new(scheduler.clone()),
        );
        (throttled, calls)
    }

    fn window(ms: u64) -> ThrottleOptions {
        ThrottleOptions::new(Duration::from_millis(ms))
    }

    #[test]
    fn test_remaining() {
        let base = Instant::now();
        let wait = Duration::from_millis(100);

        assert_eq!(remaining(wait, None, base), None);
        assert_eq!(remaining(wait, Some(base), base), Some(wait));
        assert_eq!(
            remaining(wait, Some(base), base + Duration::from_millis(40)),
            Some(Duration::from_millis(60))
        );
        assert_eq!(remaining(wait, Some(base), base + wait), None);
        // Last fire ahead of now
        assert_eq!(remaining(wait, Some(base + wait), base), None);
    }

    #[test]
    fn test_default_fires_once_on_leading_edge() {
        let scheduler = ManualScheduler::new();
        let (throttled, calls) = recording(&scheduler, window(100));

        for arg in ["a", "b", "c", "d", "e"] {
            assert_eq!(throttled.call(arg), Some("a"));
        }
        scheduler.advance_ms(500);

        assert_eq!(*calls.lock(), vec![(0, "a")]);
    }

    #[test]
    fn test_default_spaced_calls() {
        let scheduler = ManualScheduler::new();
        let (throttled, calls) = recording(&scheduler, window(100));

        throttled.call("t0");
        scheduler.advance_ms(50);
        assert_eq!(throttled.call("t50"), Some("t0"));
        scheduler.advance_ms(70);
        assert_eq!(throttled.call("t120"), Some("t120"));
        scheduler.advance_ms(500);

        assert_eq!(*calls.lock(), vec![(0, "t0"), (120, "t120")]);
    }

    #[test]
    fn test_trailing_only_uses_last_arguments() {
        let scheduler = ManualScheduler::new();
        let (throttled, calls) = recording(&scheduler, window(100).leading(false).trailing(true));

        for arg in ["a", "b", "c", "d", "e"] {
            assert_eq!(throttled.call(arg), None);
        }
        assert_eq!(scheduler.pending(), 1);

        scheduler.advance_ms(99);
        assert!(calls.lock().is_empty());
        scheduler.advance_ms(1);
        assert_eq!(*calls.lock(), vec![(100, "e")]);
        assert_eq!(throttled.last_result(), Some("e"));

        scheduler.advance_ms(500);
        assert_eq!(calls.lock().len(), 1);
    }

    #[test]
    fn test_trailing_replays_arguments_captured_at_fire_time() {
        let scheduler = ManualScheduler::new();
        let (throttled, calls) = recording(&scheduler, window(100).leading(false).trailing(true));

        throttled.call("scheduled-with");
        scheduler.advance_ms(90);
        throttled.call("replaced-by");
        scheduler.advance_ms(10);

        assert_eq!(*calls.lock(), vec![(100, "replaced-by")]);
    }

    #[test]
    fn test_leading_and_trailing_across_two_windows() {
        let scheduler = ManualScheduler::new();
        let (throttled, calls) = recording(&scheduler, window(100).trailing(true));

        throttled.call("w1-start");
        scheduler.advance_ms(50);
        throttled.call("w1-mid");
        scheduler.advance_ms(50);
        // Trailing fired at 100 with w1-mid
        scheduler.advance_ms(110);
        throttled.call("w2-start");

        assert_eq!(
            *calls.lock(),
            vec![(0, "w1-start"), (100, "w1-mid"), (210, "w2-start")]
        );
    }

    #[test]
    fn test_no_trailing_without_call_after_leading_fire() {
        let scheduler = ManualScheduler::new();
        let (throttled, calls) = recording(&scheduler, window(100).trailing(true));

        throttled.call("only");
        scheduler.advance_ms(300);

        assert_eq!(*calls.lock(), vec![(0, "only")]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_trailing_fire_restarts_window_when_leading() {
        let scheduler = ManualScheduler::new();
        let (throttled, calls) = recording(&scheduler, window(100).trailing(true));

        throttled.call("a");
        scheduler.advance_ms(60);
        throttled.call("b");
        scheduler.advance_ms(40);
        // Window restarted at 100 by the trailing fire
        scheduler.advance_ms(30);
        throttled.call("c");
        assert!(throttled.is_pending());
        scheduler.advance_ms(70);

        assert_eq!(*calls.lock(), vec![(0, "a"), (100, "b"), (200, "c")]);
    }

    #[test]
    fn test_neither_edge_suppresses_burst() {
        let scheduler = ManualScheduler::new();
        let (throttled, calls) = recording(&scheduler, window(100).leading(false));

        for arg in ["a", "b", "c"] {
            assert_eq!(throttled.call(arg), None);
        }
        scheduler.advance_ms(1_000);

        assert!(calls.lock().is_empty());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_zero_wait_always_fires() {
        let scheduler = ManualScheduler::new();
        let (throttled, calls) = recording(&scheduler, window(0).trailing(true));

        throttled.call("a");
        throttled.call("b");

        assert_eq!(*calls.lock(), vec![(0, "a"), (0, "b")]);
    }

    #[test]
    fn test_cancel_drops_trailing_and_resets_window() {
        let scheduler = ManualScheduler::new();
        let (throttled, calls) = recording(&scheduler, window(100).trailing(true));

        throttled.call("a");
        scheduler.advance_ms(10);
        throttled.call("b");
        throttled.cancel();
        throttled.cancel();
        assert!(!throttled.is_pending());

        throttled.call("c");
        scheduler.advance_ms(500);

        assert_eq!(*calls.lock(), vec![(0, "a"), (10, "c")]);
    }

    type Hook = Box<dyn FnOnce() + Send>;

    /// Manual clock that runs a one-shot hook right after a `now()` read
    struct HookedClock {
        clock: ManualScheduler,
        hook: Mutex<Option<Hook>>,
    }

    impl Scheduler for HookedClock {
        fn now(&self) -> Instant {
            let now = self.clock.now();
            let hook = self.hook.lock().take();
            if let Some(hook) = hook {
                hook();
            }
            now
        }

        fn schedule(&self, delay: Duration, wakeup: crate::scheduler::Wakeup) -> Box<dyn TimerHandle> {
            self.clock.schedule(delay, wakeup)
        }
    }

    #[test]
    fn test_concurrent_call_between_clock_read_and_lock() {
        let clock = ManualScheduler::new();
        let hooked = Arc::new(HookedClock {
            clock: clock.clone(),
            hook: Mutex::new(None),
        });
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);
        let throttled = Throttled::with_scheduler(
            move |arg: &'static str| {
                sink.lock().push(arg);
                arg
            },
            window(100),
            hooked.clone(),
        );

        throttled.call("a");
        clock.advance_ms(150);

        // While "b" holds its clock reading of 150, another thread calls at 160
        let other = throttled.clone();
        let competing = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&competing);
        *hooked.hook.lock() = Some(Box::new(move || {
            clock.advance_ms(10);
            let (tx, rx) = std::sync::mpsc::channel();
            let handle = std::thread::spawn(move || {
                other.call("c");
                let _ = tx.send(());
            });
            // Blocked on the state lock unless the clock was read outside it
            let _ = rx.recv_timeout(Duration::from_millis(50));
            *slot.lock() = Some(handle);
        }));

        throttled.call("b");
        let handle = competing.lock().take().unwrap();
        handle.join().unwrap();

        assert_eq!(*fired.lock(), vec!["a", "b"]);
    }

    #[test]
    fn test_call_from_target_during_trailing_fire() {
        let scheduler = ManualScheduler::new();
        let slot: Arc<Mutex<Option<Throttled<&'static str, &'static str>>>> = Arc::new(Mutex::new(None));
        let inner_slot = Arc::clone(&slot);
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let clock = scheduler.clone();

        let throttled = Throttled::with_scheduler(
            move |arg: &'static str| {
                sink.lock().push((clock.elapsed().as_millis() as u64, arg));
                if arg == "first" {
                    let wrapper = inner_slot.lock().clone();
                    if let Some(wrapper) = wrapper {
                        wrapper.call("from-target");
                    }
                }
                arg
            },
            window(100).leading(false).trailing(true),
            Arc::new(scheduler.clone()),
        );
        *slot.lock() = Some(throttled.clone());

        throttled.call("first");
        scheduler.advance_ms(100);
        // The nested call armed the next trailing run
        assert!(throttled.is_pending());

        scheduler.advance_ms(100);
        assert_eq!(*calls.lock(), vec![(100, "first"), (200, "from-target")]);
        assert_eq!(throttled.last_result(), Some("from-target"));
        assert!(!throttled.is_pending());
        slot.lock().take();
    }
}
