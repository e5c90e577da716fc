//! Controller options and their configuration-file form

use serde::{Deserialize, Serialize};
use std::time::Duration;
use toolite_common::{Error, Result};
use tracing::warn;

/// Default debounce delay (milliseconds)
pub const DEFAULT_DEBOUNCE_MS: i64 = 300;

/// Default throttle window (milliseconds)
pub const DEFAULT_THROTTLE_MS: i64 = 300;

/// Validated debounce settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceOptions {
    /// Quiet period after the last call
    pub delay: Duration,
    /// Fire on the leading edge of a burst instead of the trailing edge
    pub immediate: bool,
}

impl DebounceOptions {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            immediate: false,
        }
    }

    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Build from a signed millisecond count, rejecting negative values
    pub fn from_millis(delay_ms: i64, immediate: bool) -> Result<Self> {
        Ok(Self {
            delay: non_negative_millis("delay_ms", delay_ms)?,
            immediate,
        })
    }
}

/// Validated throttle settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleOptions {
    /// Minimum spacing between invocations
    pub wait: Duration,
    /// Fire at the start of a window
    pub leading: bool,
    /// Fire at the end of a window with the latest arguments
    pub trailing: bool,
}

impl ThrottleOptions {
    /// `leading: true, trailing: false`
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            leading: true,
            trailing: false,
        }
    }

    pub fn leading(mut self, leading: bool) -> Self {
        self.leading = leading;
        self
    }

    pub fn trailing(mut self, trailing: bool) -> Self {
        self.trailing = trailing;
        self
    }

    /// Build from a signed millisecond count, rejecting negative values
    pub fn from_millis(wait_ms: i64, leading: bool, trailing: bool) -> Result<Self> {
        Ok(Self {
            wait: non_negative_millis("wait_ms", wait_ms)?,
            leading,
            trailing,
        })
    }
}

fn non_negative_millis(field: &str, ms: i64) -> Result<Duration> {
    if ms < 0 {
        warn!("Rejected negative {}: {}", field, ms);
        return Err(Error::invalid_input(format!(
            "{} must not be negative, got {}",
            field, ms
        )));
    }
    Ok(Duration::from_millis(ms as u64))
}

/// Debounce section of a configuration file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DebounceConfig {
    pub delay_ms: i64,
    pub immediate: bool,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DEBOUNCE_MS,
            immediate: false,
        }
    }
}

impl TryFrom<&DebounceConfig> for DebounceOptions {
    type Error = Error;

    fn try_from(config: &DebounceConfig) -> Result<Self> {
        DebounceOptions::from_millis(config.delay_ms, config.immediate)
    }
}

/// Throttle section of a configuration file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ThrottleConfig {
    pub wait_ms: i64,
    pub leading: bool,
    pub trailing: bool,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            wait_ms: DEFAULT_THROTTLE_MS,
            leading: true,
            trailing: false,
        }
    }
}

impl TryFrom<&ThrottleConfig> for ThrottleOptions {
    type Error = Error;

    fn try_from(config: &ThrottleConfig) -> Result<Self> {
        ThrottleOptions::from_millis(config.wait_ms, config.leading, config.trailing)
    }
}
