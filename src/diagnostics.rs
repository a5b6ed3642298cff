//! Where the controller reports failures. Nothing reported here reaches the page.

use std::cell::RefCell;
use std::rc::Rc;

pub trait Diagnostics {
    fn error(&self, message: &str);
}

/// Reports through `tracing` at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn error(&self, message: &str) {
        tracing::error!(target: "nlhelp::diagnostics", "{message}");
    }
}

/// Keeps every message; handy when the caller wants to inspect failures afterwards.
impl Diagnostics for Rc<RefCell<Vec<String>>> {
    fn error(&self, message: &str) {
        self.borrow_mut().push(message.to_string());
    }
}
