//! Logging facilities for Horizon Observable.
//!
//! Horizon Observable uses the `tracing` crate for instrumentation. To see
//! logs, install a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("horizon_observable=debug")
//!         .init();
//! }
//! ```

/// Span names used throughout Horizon Observable for tracing.
pub mod span_names {
    /// Performance measurement span.
    pub const PERF: &str = "horizon_observable::perf";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "horizon_observable_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_observable_core::signal";
    /// Property system target.
    pub const PROPERTY: &str = "horizon_observable_core::property";
    /// Collection mutation target.
    pub const COLLECTION: &str = "horizon_observable::collection";
    /// Selection bookkeeping target.
    pub const SELECTION: &str = "horizon_observable::selection";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// This is useful for tracking the duration of operations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: span_names::PERF, "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

/// Trace-level log with the collection target.
#[macro_export]
macro_rules! observable_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: $crate::logging::targets::COLLECTION, $($arg)*)
    };
}

/// Debug-level log with the collection target.
#[macro_export]
macro_rules! observable_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: $crate::logging::targets::COLLECTION, $($arg)*)
    };
}
