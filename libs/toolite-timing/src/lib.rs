//! Timing-control utilities
//!
//! Debounce and throttle controllers. Each controller owns its state
//! exclusively and talks to its host only through the [`Scheduler`] trait:
//! a monotonic clock plus cancellable delayed callbacks.
//!
//! ```ignore
//! let save = toolite_timing::debounce(|text: String| store(text), Duration::from_millis(300), false)?;
//! save.call("draft".to_string());
//! ```

pub mod debounce;
pub mod options;
pub mod scheduler;
pub mod throttle;

pub use debounce::{debounce, Debounced};
pub use options::{DebounceConfig, DebounceOptions, ThrottleConfig, ThrottleOptions};
pub use scheduler::{Scheduler, TimerHandle, TokioScheduler, Wakeup};
pub use throttle::{throttle, Throttled};

#[cfg(any(test, feature = "test-utils"))]
pub use scheduler::ManualScheduler;
