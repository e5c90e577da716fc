//! Toolite
//!
//! Debounce/throttle controllers and front-end helper functions behind one
//! configurable [`Toolkit`] context. The individual crates are re-exported for
//! callers that need only part of the toolkit.
//!
//! ```ignore
//! let config = toolite::ToolkitConfig::load()?;
//! let _guard = toolite::init_logging(&config.logging)?;
//! let toolkit = toolite::Toolkit::new(config)?;
//!
//! let search = toolkit.debounce(|query: String| run_search(&query));
//! search.call("rust".into());
//! ```

pub mod config;
pub mod toolkit;

pub use config::{DateConfig, ToolkitConfig};
pub use toolkit::Toolkit;

pub use toolite_common::{init_logging, Error, LogConfig, Result};
pub use toolite_timing::{
    debounce, throttle, DebounceOptions, Debounced, Scheduler, ThrottleOptions, Throttled,
};

pub use toolite_common as common;
pub use toolite_timing as timing;
pub use toolite_utils as utils;
