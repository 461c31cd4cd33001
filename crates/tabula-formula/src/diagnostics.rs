//! Diagnostic reporting
//!
//! Every evaluation failure is reported once, where it originates, with a
//! human-readable message. The cell still shows `#####`; the sink receives
//! the cause.

use std::cell::RefCell;
use std::rc::Rc;

/// Receiver of evaluation diagnostics
pub trait DiagnosticSink {
    fn on_invalid_formula(&self, message: &str);
}

impl<F: Fn(&str)> DiagnosticSink for F {
    fn on_invalid_formula(&self, message: &str) {
        self(message)
    }
}

/// Forwards diagnostics to `tracing` at warn level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn on_invalid_formula(&self, message: &str) {
        tracing::warn!(target: "tabula::formula", "{}", message);
    }
}

/// Keeps diagnostics in memory
///
/// Clones share the same buffer, so one handle can be given to an engine
/// and the other inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    messages: Rc<RefCell<Vec<String>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the messages received so far
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    pub fn clear(&self) {
        self.messages.borrow_mut().clear();
    }
}

impl DiagnosticSink for CollectingSink {
    fn on_invalid_formula(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}
