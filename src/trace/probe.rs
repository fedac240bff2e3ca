//! The probe tree and its text rendering.
//!
//! Each [`ProbeNode`] is one timed span; its children are the spans opened while
//! it was the innermost open probe, kept in call order. Rendering is a single
//! pre-order walk that numbers every probe with one shared counter:
//!
//! ```text
//! #1 -> parse took 3 ms - 15.00% of total time
//! #2 -> execute took 7 ms - 35.00% of total time
//! #3 --> query took 4 ms - 20.00% of total time
//! ```

use std::fmt::{self, Write};

use super::clock::Instant;
use super::resolution::Resolution;

/// One timed span and the spans nested inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeNode {
    name: String,
    start: Instant,
    end: Instant,
    failed: bool,
    children: Vec<ProbeNode>,
}

impl ProbeNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self::started(name, Instant::UNSET)
    }

    pub(crate) fn started(name: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.into(),
            start,
            end: Instant::UNSET,
            failed: false,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    pub fn end(&self) -> Instant {
        self.end
    }

    /// Whether the caller marked this span as having ended in error.
    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn children(&self) -> &[ProbeNode] {
        &self.children
    }

    /// A node is open until its end time is recorded.
    pub fn is_open(&self) -> bool {
        self.end.is_unset()
    }

    /// Clear the node back to an unnamed, unset leaf.
    pub fn reset(&mut self) {
        self.name.clear();
        self.start = Instant::UNSET;
        self.end = Instant::UNSET;
        self.failed = false;
        self.children.clear();
    }

    /// This node's own elapsed time, or `None` if either end is unrecorded.
    ///
    /// Time spent in children is not added: a parent's span already covers it.
    pub fn elapsed(&self, resolution: Resolution) -> Option<u64> {
        if self.start.is_unset() || self.end.is_unset() {
            return None;
        }
        Some(resolution.convert(self.end.duration_since(self.start)))
    }

    /// Name and start a node that was just reset, reusing its allocations.
    pub(crate) fn begin(&mut self, name: &str, start: Instant) {
        self.name.push_str(name);
        self.start = start;
    }

    pub(crate) fn finish(&mut self, end: Instant, failed: bool) {
        self.end = end;
        self.failed = failed;
    }

    /// Append a child and return its index.
    pub(crate) fn push_child(&mut self, child: ProbeNode) -> usize {
        self.children.push(child);
        self.children.len() - 1
    }

    pub(crate) fn child_mut(&mut self, index: usize) -> Option<&mut ProbeNode> {
        self.children.get_mut(index)
    }

    /// Render this node's line, then every descendant in pre-order, each one
    /// level deeper than its parent.
    ///
    /// The walk keeps its own stack, so nesting depth is bounded by memory
    /// rather than by the thread's stack.
    pub fn render<W: Write>(
        &self,
        out: &mut W,
        depth: usize,
        ctx: &mut RenderContext,
    ) -> fmt::Result {
        let mut pending = vec![(self, depth)];
        while let Some((node, depth)) = pending.pop() {
            node.render_line(out, depth, ctx)?;
            pending.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        }
        Ok(())
    }

    fn render_line<W: Write>(
        &self,
        out: &mut W,
        depth: usize,
        ctx: &mut RenderContext,
    ) -> fmt::Result {
        let sequence = ctx.next_sequence();
        write!(
            out,
            "#{sequence:0width$} {dashes}> {name}",
            width = ctx.width,
            dashes = "-".repeat(depth),
            name = self.name,
        )?;

        match self.elapsed(ctx.resolution) {
            Some(elapsed) => writeln!(
                out,
                " took {elapsed} {unit} - {percent:.2}% of total time",
                unit = ctx.resolution.unit(),
                percent = ctx.percent_of_total(elapsed),
            ),
            None => writeln!(out, " has invalid start/end time"),
        }
    }
}

// Iterative so that dropping a deep chain cannot overflow the stack.
impl Drop for ProbeNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// State threaded through one report render.
///
/// The trace total is fixed for the whole walk; the sequence counter is shared
/// by every node so numbering is global pre-order, not per sibling group.
#[derive(Debug, Clone)]
pub struct RenderContext {
    trace_total: u64,
    width: usize,
    resolution: Resolution,
    sequence: usize,
}

impl RenderContext {
    pub fn new(trace_total: u64, probe_count: usize, resolution: Resolution) -> Self {
        Self {
            trace_total,
            width: digit_count(probe_count),
            resolution,
            sequence: 0,
        }
    }

    fn next_sequence(&mut self) -> usize {
        self.sequence += 1;
        self.sequence
    }

    fn percent_of_total(&self, elapsed: u64) -> f64 {
        // An unfinished or sub-unit trace has no meaningful total.
        if self.trace_total == 0 {
            return 0.0;
        }
        (elapsed as f64 / self.trace_total as f64) * 100.0
    }
}

fn digit_count(mut value: usize) -> usize {
    let mut digits = 0;
    while value > 0 {
        digits += 1;
        value /= 10;
    }
    digits
}
