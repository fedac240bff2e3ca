//! Call-tree tracing: timed probes nested inside one trace.
//!
//! A trace brackets one top-level operation. Probes bracket the sub-operations
//! inside it and may nest as deeply as the call stack does. Once the trace is
//! finished, [`TraceController::to_report`] renders the whole tree:
//!
//! ```text
//! request processed for 20 ms
//! #1 -> parse took 3 ms - 15.00% of total time
//! #2 -> execute took 7 ms - 35.00% of total time
//! #3 --> query took 4 ms - 20.00% of total time
//! ```
//!
//! # Modules
//!
//! - [`controller`]: the start/finish state machine and the report
//! - [`probe`]: the probe tree and its renderer
//! - [`guard`]: scope guards that finish on drop
//! - [`clock`]: monotonic instants and clock sources
//! - [`resolution`]: report units

pub mod clock;
pub mod controller;
pub mod error;
pub mod guard;
pub mod probe;
pub mod resolution;

// Re-export main types for convenience
pub use clock::{Clock, Instant, ManualClock, MonotonicClock};
pub use controller::{Report, Trace, TraceController};
pub use error::SequenceError;
pub use guard::{ProbeGuard, TraceGuard};
pub use probe::{ProbeNode, RenderContext};
pub use resolution::Resolution;
