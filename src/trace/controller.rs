//! The trace state machine.
//!
//! A [`TraceController`] holds at most one [`Trace`]. Probe starts and finishes
//! move a cursor down and up the probe tree, so finishes must arrive in the
//! reverse order of their starts, exactly like nested scopes:
//!
//! ```
//! use calltree::{Resolution, TraceController};
//!
//! let mut tracer = TraceController::new();
//! tracer.set_enabled(true);
//! tracer.set_resolution(Resolution::Microseconds);
//!
//! tracer.start_trace("request");
//! tracer.start_probe("parse");
//! tracer.finish_probe(false);
//! tracer.finish_trace(false);
//!
//! let report = tracer.to_report();
//! assert!(report.starts_with("request processed for "));
//! assert!(report.contains("#1 -> parse took "));
//! ```
//!
//! Calls that don't match the current state (finishing with nothing open,
//! probing without a trace) are logged and ignored.

use std::fmt;

use super::clock::{Clock, MonotonicClock};
use super::error::SequenceError;
use super::probe::{ProbeNode, RenderContext};
use super::resolution::Resolution;
use crate::config::TraceConfig;

/// One trace: the root span and the cursor into its probe tree.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    root: ProbeNode,
    probe_count: usize,
    active: bool,
    /// Child indices from the root down to the innermost open probe.
    cursor: Vec<usize>,
}

impl Trace {
    /// The span covering the whole trace; its name is the trace name.
    pub fn root(&self) -> &ProbeNode {
        &self.root
    }

    /// Probes started since the trace began.
    pub fn probe_count(&self) -> usize {
        self.probe_count
    }

    /// Whether the trace still accepts probes.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Number of probes currently open.
    pub fn depth(&self) -> usize {
        self.cursor.len()
    }

    fn current_mut(&mut self) -> &mut ProbeNode {
        let mut node = &mut self.root;
        for &index in &self.cursor {
            node = match node.child_mut(index) {
                Some(child) => child,
                None => unreachable!("cursor points outside the probe tree"),
            };
        }
        node
    }
}

/// Owner of the current trace, the resolution and the enabled gate.
///
/// Tracing is disabled until [`set_enabled`](Self::set_enabled) is called, so
/// instrumented code can ship with the controller compiled in.
#[derive(Debug)]
pub struct TraceController<C: Clock = MonotonicClock> {
    clock: C,
    enabled: bool,
    resolution: Resolution,
    trace: Option<Trace>,
}

impl TraceController<MonotonicClock> {
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }

    pub fn from_config(config: &TraceConfig) -> Self {
        let mut controller = Self::new();
        controller.apply_config(config);
        controller
    }
}

impl Default for TraceController<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> TraceController<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            enabled: false,
            resolution: Resolution::default(),
            trace: None,
        }
    }

    pub fn apply_config(&mut self, config: &TraceConfig) {
        self.set_enabled(config.enabled);
        self.set_resolution(config.resolution);
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Change the unit of future reports. Recorded instants are kept raw, so
    /// this also applies to traces that are already finished.
    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = resolution;
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// The held trace, open or finished.
    pub fn trace(&self) -> Option<&Trace> {
        self.trace.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.trace.as_ref().is_some_and(Trace::is_active)
    }

    pub fn probe_count(&self) -> usize {
        self.trace.as_ref().map_or(0, Trace::probe_count)
    }

    /// Number of probes still open in the held trace.
    pub fn open_probes(&self) -> usize {
        self.trace.as_ref().map_or(0, Trace::depth)
    }

    /// Begin a new trace, discarding whatever the previous one held.
    pub fn start_trace(&mut self, name: &str) {
        if !self.enabled {
            return;
        }

        if let Some(previous) = &self.trace
            && previous.active
        {
            log::debug!(
                "Discarding active trace {} with {} open probe(s)",
                previous.root.name(),
                previous.depth()
            );
        }

        let now = self.clock.now();
        let trace = self.trace.get_or_insert_with(Trace::default);
        trace.root.reset();
        trace.root.begin(name, now);
        trace.probe_count = 0;
        trace.cursor.clear();
        trace.active = true;

        log::debug!("Started trace {name}");
    }

    /// Stamp the end of the trace. Open probes are left open.
    pub fn finish_trace(&mut self, failed: bool) {
        if let Err(err) = self.try_finish_trace(failed) {
            log::warn!("{err}");
        }
    }

    pub fn try_finish_trace(&mut self, failed: bool) -> Result<(), SequenceError> {
        if !self.enabled {
            return Ok(());
        }

        let trace = self
            .trace
            .as_mut()
            .filter(|trace| trace.active)
            .ok_or(SequenceError::FinishTraceWithoutTrace)?;

        trace.root.finish(self.clock.now(), failed);
        trace.active = false;

        log::debug!(
            "Finished trace {} ({} probe(s), failed={failed})",
            trace.root.name(),
            trace.probe_count
        );
        Ok(())
    }

    /// Open a probe under the innermost open probe (or the trace root).
    pub fn start_probe(&mut self, name: &str) {
        if let Err(err) = self.try_start_probe(name) {
            log::warn!("{err}");
        }
    }

    pub fn try_start_probe(&mut self, name: &str) -> Result<(), SequenceError> {
        if !self.enabled {
            return Ok(());
        }

        let trace = self
            .trace
            .as_mut()
            .filter(|trace| trace.active)
            .ok_or(SequenceError::ProbeWithoutTrace)?;

        let probe = ProbeNode::started(name, self.clock.now());
        let index = trace.current_mut().push_child(probe);
        trace.cursor.push(index);
        trace.probe_count += 1;
        Ok(())
    }

    /// Close the innermost open probe and move the cursor back to its parent.
    pub fn finish_probe(&mut self, failed: bool) {
        if let Err(err) = self.try_finish_probe(failed) {
            log::warn!("{err}");
        }
    }

    pub fn try_finish_probe(&mut self, failed: bool) -> Result<(), SequenceError> {
        if !self.enabled {
            return Ok(());
        }

        let trace = self
            .trace
            .as_mut()
            .filter(|trace| trace.active)
            .ok_or(SequenceError::FinishProbeWithoutTrace)?;

        if trace.cursor.is_empty() {
            return Err(SequenceError::NoOpenProbe);
        }

        let now = self.clock.now();
        trace.current_mut().finish(now, failed);
        trace.cursor.pop();
        Ok(())
    }

    /// A displayable view of the held trace.
    pub fn report(&self) -> Report<'_> {
        Report {
            trace: self.trace.as_ref().filter(|_| self.enabled),
            resolution: self.resolution,
        }
    }

    /// Render the held trace, or an empty string when disabled or idle.
    pub fn to_report(&self) -> String {
        self.report().to_string()
    }
}

/// The text report for one trace.
///
/// The first line summarizes the trace; one numbered line per probe follows
/// in call order, indented by nesting depth.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    trace: Option<&'a Trace>,
    resolution: Resolution,
}

impl Report<'_> {
    pub fn is_empty(&self) -> bool {
        self.trace.is_none()
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(trace) = self.trace else {
            return Ok(());
        };
        let root = &trace.root;

        let total = match root.elapsed(self.resolution) {
            Some(total) => {
                writeln!(
                    f,
                    "{} processed for {total} {}",
                    root.name(),
                    self.resolution.unit()
                )?;
                total
            }
            None => {
                writeln!(f, "{} has invalid start/end time", root.name())?;
                0
            }
        };

        if trace.probe_count > 0 {
            let mut ctx = RenderContext::new(total, trace.probe_count, self.resolution);
            for probe in root.children() {
                probe.render(f, 1, &mut ctx)?;
            }
        }

        Ok(())
    }
}
