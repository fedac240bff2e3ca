//! Caller-discipline violations.
//!
//! A [`SequenceError`] never means the tree is corrupt: the offending call is
//! dropped and the trace keeps whatever state it had before. The unchecked
//! controller methods log these at `warn` level; the `try_*` methods return
//! them.

/// A start/finish call that does not match the current trace state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceError {
    /// `start_probe` without an open trace.
    ProbeWithoutTrace,
    /// `finish_probe` without an open trace.
    FinishProbeWithoutTrace,
    /// `finish_probe` while the cursor is already at the trace root.
    NoOpenProbe,
    /// `finish_trace` without an open trace.
    FinishTraceWithoutTrace,
}

impl SequenceError {
    /// The controller operation that was rejected.
    pub fn operation(&self) -> &'static str {
        match self {
            SequenceError::ProbeWithoutTrace => "start_probe",
            SequenceError::FinishProbeWithoutTrace | SequenceError::NoOpenProbe => "finish_probe",
            SequenceError::FinishTraceWithoutTrace => "finish_trace",
        }
    }
}

impl std::error::Error for SequenceError {}

impl std::fmt::Display for SequenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let operation = self.operation();
        match self {
            SequenceError::ProbeWithoutTrace
            | SequenceError::FinishProbeWithoutTrace
            | SequenceError::FinishTraceWithoutTrace => {
                write!(f, "{operation}() called for inactive trace")
            }
            SequenceError::NoOpenProbe => {
                write!(f, "{operation}() called with no open probe")
            }
        }
    }
}
