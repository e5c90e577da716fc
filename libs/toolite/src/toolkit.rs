//! Shared toolkit context
//!
//! Owns the configuration, the timer scheduler and the event bus, and hands
//! out controllers and helpers preset with the configured defaults.

use crate::config::ToolkitConfig;
use std::path::PathBuf;
use std::sync::Arc;
use toolite_common::Result;
use toolite_timing::{
    DebounceOptions, Debounced, Scheduler, ThrottleOptions, Throttled, TokioScheduler,
};
use toolite_utils::{date, export, DateInput, Emitter, Sheet};
use tracing::debug;

/// Configured entry point to the toolkit
pub struct Toolkit {
    config: ToolkitConfig,
    debounce: DebounceOptions,
    throttle: ThrottleOptions,
    scheduler: Arc<dyn Scheduler>,
    emitter: Arc<Emitter>,
}

impl std::fmt::Debug for Toolkit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolkit")
            .field("config", &self.config)
            .field("emitter", &self.emitter)
            .finish_non_exhaustive()
    }
}

impl Toolkit {
    /// Bind to the current tokio runtime
    pub fn new(config: ToolkitConfig) -> Result<Self> {
        Self::with_scheduler(config, Arc::new(TokioScheduler::current()?))
    }

    /// Bind to an explicit runtime handle
    pub fn with_handle(config: ToolkitConfig, handle: tokio::runtime::Handle) -> Result<Self> {
        Self::with_scheduler(config, Arc::new(TokioScheduler::from_handle(handle)))
    }

    pub fn with_scheduler(config: ToolkitConfig, scheduler: Arc<dyn Scheduler>) -> Result<Self> {
        config.validate()?;
        let debounce = config.debounce_options()?;
        let throttle = config.throttle_options()?;
        debug!(?debounce, ?throttle, "Toolkit ready");
        Ok(Self {
            config,
            debounce,
            throttle,
            scheduler,
            emitter: Arc::new(Emitter::new()),
        })
    }

    pub fn config(&self) -> &ToolkitConfig {
        &self.config
    }

    /// The shared event bus
    pub fn emitter(&self) -> &Arc<Emitter> {
        &self.emitter
    }

    // ------------------------------------------------------------------
    // Timing
    // ------------------------------------------------------------------

    /// Debounce `target` with the configured delay and edge
    pub fn debounce<A, R, F>(&self, target: F) -> Debounced<A, R>
    where
        A: Send + 'static,
        R: Clone + Send + 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        self.debounce_with(target, self.debounce)
    }

    pub fn debounce_with<A, R, F>(&self, target: F, options: DebounceOptions) -> Debounced<A, R>
    where
        A: Send + 'static,
        R: Clone + Send + 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Debounced::with_scheduler(target, options, Arc::clone(&self.scheduler))
    }

    /// Throttle `target` with the configured wait and edges
    pub fn throttle<A, R, F>(&self, target: F) -> Throttled<A, R>
    where
        A: Send + 'static,
        R: Clone + Send + 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        self.throttle_with(target, self.throttle)
    }

    pub fn throttle_with<A, R, F>(&self, target: F, options: ThrottleOptions) -> Throttled<A, R>
    where
        A: Send + 'static,
        R: Clone + Send + 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Throttled::with_scheduler(target, options, Arc::clone(&self.scheduler))
    }

    // ------------------------------------------------------------------
    // Helpers with configured defaults
    // ------------------------------------------------------------------

    /// Format with the configured pattern and offset; empty on invalid input
    pub fn format_date(&self, input: impl Into<DateInput>) -> String {
        let date = &self.config.date;
        date::date_format(input, Some(&date.pattern), date.offset_hours)
    }

    /// `end - start` in the configured default unit
    pub fn date_diff(
        &self,
        start: impl Into<DateInput>,
        end: impl Into<DateInput>,
    ) -> Result<i64> {
        date::date_diff(start, end, self.config.date.diff_unit)
    }

    pub fn check_password(&self, word: &str) -> bool {
        self.config.password.check(word)
    }

    pub fn generate_password(&self) -> Result<String> {
        self.config.password.generate()
    }

    /// Export into the configured directory under the configured name
    pub fn export_csv(&self, sheet: &Sheet) -> Result<PathBuf> {
        export::export_csv(sheet, &self.config.export)
    }

    pub fn export_many(&self, sheets: &[Sheet]) -> Result<Vec<PathBuf>> {
        export::export_many(sheets, &self.config.export)
    }
}
