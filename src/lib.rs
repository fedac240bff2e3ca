//! In-process call-tree instrumentation.
//!
//! Start a trace, bracket sub-operations with nested probes, and render a
//! plain-text report of elapsed times and each probe's share of the trace.
//! Tracing is off until enabled, so the instrumentation can stay compiled in.

pub mod config;
pub mod trace;

pub use config::TraceConfig;
pub use trace::{
    Clock, Instant, ManualClock, MonotonicClock, ProbeGuard, ProbeNode, Report, Resolution,
    SequenceError, Trace, TraceController, TraceGuard,
};
