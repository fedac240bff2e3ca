//! Scope guards that finish a trace or probe when dropped.
//!
//! A guard mutably borrows the controller and dereferences to it, so nested
//! probes are opened through the enclosing guard and the borrow checker keeps
//! finishes in reverse start order:
//!
//! ```
//! use calltree::TraceController;
//!
//! let mut tracer = TraceController::new();
//! tracer.set_enabled(true);
//!
//! {
//!     let mut trace = tracer.trace_scope("startup");
//!     {
//!         let mut config = trace.probe_scope("load config");
//!         let _parse = config.probe_scope("parse");
//!     }
//!     let _plugins = trace.probe_scope("load plugins");
//! }
//!
//! assert_eq!(tracer.probe_count(), 3);
//! assert!(!tracer.is_active());
//! ```

use std::ops::{Deref, DerefMut};

use super::clock::Clock;
use super::controller::TraceController;

/// Finishes the trace it started when dropped.
#[must_use = "the trace finishes as soon as the guard is dropped"]
#[derive(Debug)]
pub struct TraceGuard<'a, C: Clock> {
    controller: &'a mut TraceController<C>,
    failed: bool,
}

impl<C: Clock> TraceGuard<'_, C> {
    /// Report the trace as failed when it finishes.
    pub fn mark_failed(&mut self) {
        self.failed = true;
    }

    /// Finish now instead of at the end of the scope.
    pub fn finish(mut self, failed: bool) {
        self.failed |= failed;
    }
}

impl<C: Clock> Deref for TraceGuard<'_, C> {
    type Target = TraceController<C>;

    fn deref(&self) -> &Self::Target {
        self.controller
    }
}

impl<C: Clock> DerefMut for TraceGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.controller
    }
}

impl<C: Clock> Drop for TraceGuard<'_, C> {
    fn drop(&mut self) {
        self.controller.finish_trace(self.failed);
    }
}

/// Finishes the probe it started when dropped.
#[must_use = "the probe finishes as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ProbeGuard<'a, C: Clock> {
    controller: &'a mut TraceController<C>,
    failed: bool,
    started: bool,
}

impl<C: Clock> ProbeGuard<'_, C> {
    /// Report the probe as failed when it finishes.
    pub fn mark_failed(&mut self) {
        self.failed = true;
    }

    /// Finish now instead of at the end of the scope.
    pub fn finish(mut self, failed: bool) {
        self.failed |= failed;
    }
}

impl<C: Clock> Deref for ProbeGuard<'_, C> {
    type Target = TraceController<C>;

    fn deref(&self) -> &Self::Target {
        self.controller
    }
}

impl<C: Clock> DerefMut for ProbeGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.controller
    }
}

impl<C: Clock> Drop for ProbeGuard<'_, C> {
    fn drop(&mut self) {
        // A probe that was rejected at start must not close its parent.
        if self.started {
            self.controller.finish_probe(self.failed);
        }
    }
}

impl<C: Clock> TraceController<C> {
    /// Start a trace that finishes when the returned guard is dropped.
    pub fn trace_scope(&mut self, name: &str) -> TraceGuard<'_, C> {
        self.start_trace(name);
        TraceGuard {
            controller: self,
            failed: false,
        }
    }

    /// Start a probe that finishes when the returned guard is dropped.
    pub fn probe_scope(&mut self, name: &str) -> ProbeGuard<'_, C> {
        let started = match self.try_start_probe(name) {
            Ok(()) => self.is_enabled(),
            Err(err) => {
                log::warn!("{err}");
                false
            }
        };
        ProbeGuard {
            controller: self,
            failed: false,
            started,
        }
    }
}
