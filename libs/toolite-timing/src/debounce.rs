//! Debounce controller
//!
//! Coalesces a burst of calls into at most one execution per quiet period.
//!
//! - Trailing mode (default): every call re-arms the timer; when it finally
//!   fires, the target runs with the arguments of the last call.
//! - Immediate mode: the first call of a burst runs the target synchronously;
//!   later calls only push the end of the burst further out.

use crate::options::DebounceOptions;
use crate::scheduler::{Scheduler, TimerHandle, TokioScheduler};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use toolite_common::Result;
use tracing::{debug, trace};

type Target<A, R> = Box<dyn Fn(A) -> R + Send + Sync + 'static>;

/// Timer currently armed by a controller
struct Armed {
    id: u64,
    handle: Box<dyn TimerHandle>,
}

struct DebounceState<A, R> {
    /// Arguments waiting for the trailing execution
    pending: Option<A>,
    /// At most one outstanding wakeup
    armed: Option<Armed>,
    next_id: u64,
    last_result: Option<R>,
}

struct DebounceInner<A, R> {
    target: Target<A, R>,
    options: DebounceOptions,
    scheduler: Arc<dyn Scheduler>,
    state: Mutex<DebounceState<A, R>>,
}

impl<A, R> Drop for DebounceInner<A, R> {
    fn drop(&mut self) {
        if let Some(armed) = self.state.get_mut().armed.take() {
            armed.handle.cancel();
        }
    }
}

/// Debounced wrapper around a target function
///
/// Clones share the same controller state.
pub struct Debounced<A, R> {
    inner: Arc<DebounceInner<A, R>>,
}

impl<A, R> Clone for Debounced<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, R> fmt::Debug for Debounced<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debounced")
            .field("options", &self.inner.options)
            .field("pending", &self.inner.state.lock().armed.is_some())
            .finish()
    }
}

/// Debounce `target` on the current tokio runtime
///
/// Fails when called outside a tokio runtime.
pub fn debounce<A, R, F>(target: F, delay: Duration, immediate: bool) -> Result<Debounced<A, R>>
where
    A: Send + 'static,
    R: Clone + Send + 'static,
    F: Fn(A) -> R + Send + Sync + 'static,
{
    let scheduler = TokioScheduler::current()?;
    Ok(Debounced::with_scheduler(
        target,
        DebounceOptions::new(delay).immediate(immediate),
        Arc::new(scheduler),
    ))
}

impl<A, R> Debounced<A, R>
where
    A: Send + 'static,
    R: Clone + Send + 'static,
{
    pub fn with_scheduler<F>(target: F, options: DebounceOptions, scheduler: Arc<dyn Scheduler>) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(DebounceInner {
                target: Box::new(target),
                options,
                scheduler,
                state: Mutex::new(DebounceState {
                    pending: None,
                    armed: None,
                    next_id: 0,
                    last_result: None,
                }),
            }),
        }
    }

    /// Invoke the wrapper
    ///
    /// Returns the result of the most recent actual invocation of the target,
    /// which in immediate mode may be the invocation this call just made.
    pub fn call(&self, args: A) -> Option<R> {
        let inner = &self.inner;
        let mut state = inner.state.lock();

        let was_armed = match state.armed.take() {
            Some(armed) => {
                armed.handle.cancel();
                true
            },
            None => false,
        };

        if !inner.options.immediate {
            state.pending = Some(args);
            arm(inner, &mut state);
            return state.last_result.clone();
        }

        arm(inner, &mut state);
        if was_armed {
            trace!("Debounce suppressed call inside active window");
            return state.last_result.clone();
        }
        drop(state);

        // Lock released so the target may call back into this wrapper
        let result = (inner.target)(args);
        inner.state.lock().last_result = Some(result.clone());
        Some(result)
    }

    /// Drop the outstanding wakeup and any pending arguments
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock();
        if let Some(armed) = state.armed.take() {
            armed.handle.cancel();
            debug!("Debounce cancelled (wakeup {})", armed.id);
        }
        state.pending = None;
    }

    /// Whether a wakeup is outstanding
    pub fn is_pending(&self) -> bool {
        self.inner.state.lock().armed.is_some()
    }

    /// Result of the most recent actual invocation
    pub fn last_result(&self) -> Option<R> {
        self.inner.state.lock().last_result.clone()
    }

    pub fn options(&self) -> DebounceOptions {
        self.inner.options
    }
}

fn arm<A, R>(inner: &Arc<DebounceInner<A, R>>, state: &mut DebounceState<A, R>)
where
    A: Send + 'static,
    R: Clone + Send + 'static,
{
    let id = state.next_id;
    state.next_id += 1;

    let weak: Weak<DebounceInner<A, R>> = Arc::downgrade(inner);
    let handle = inner.scheduler.schedule(
        inner.options.delay,
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                fire(&inner, id);
            }
        }),
    );
    trace!("Debounce armed wakeup {} for {:?}", id, inner.options.delay);
    state.armed = Some(Armed { id, handle });
}

fn fire<A, R>(inner: &Arc<DebounceInner<A, R>>, id: u64) {
    let mut state = inner.state.lock();
    // Superseded wakeups can still run if the host timer raced the cancel
    if state.armed.as_ref().map(|armed| armed.id) != Some(id) {
        return;
    }
    state.armed = None;

    if inner.options.immediate {
        trace!("Debounce window {} closed", id);
        return;
    }

    let Some(args) = state.pending.take() else {
        return;
    };
    drop(state);

    trace!("Debounce wakeup {} invoking target", id);
    let result = (inner.target)(args);
    inner.state.lock().last_result = Some(result);
}
