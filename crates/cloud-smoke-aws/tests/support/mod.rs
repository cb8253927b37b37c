// crates/cloud-smoke-aws/tests/support/mod.rs
// ============================================================================
// Module: Fake API Support
// Description: Call journal with failure injection shared by service fakes.
// Purpose: Let tester tests assert call order and simulate service errors.
// Dependencies: cloud-smoke-core
// ============================================================================

#![allow(dead_code, reason = "Each test crate uses a different subset of helpers.")]

use std::sync::Mutex;

use cloud_smoke_core::ApiError;

/// Records operations and fails the configured ones.
#[derive(Default)]
pub struct Journal {
    /// Operations in call order.
    calls: Mutex<Vec<&'static str>>,
    /// Operations that fail with the paired service code.
    failures: Mutex<Vec<(&'static str, Option<&'static str>)>>,
}

impl Journal {
    /// Makes `operation` fail without a service code.
    pub fn fail(&self, operation: &'static str) {
        self.failures.lock().unwrap().push((operation, None));
    }

    /// Makes `operation` fail with service `code`.
    pub fn fail_with_code(&self, operation: &'static str, code: &'static str) {
        self.failures.lock().unwrap().push((operation, Some(code)));
    }

    /// Records `operation` and returns its injected failure, if any.
    pub fn enter(&self, operation: &'static str) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(operation);
        let failures = self.failures.lock().unwrap();
        match failures.iter().find(|(name, _)| *name == operation) {
            Some((_, code)) => Err(ApiError::new(operation, "injected failure")
                .with_code(code.map(str::to_string))),
            None => Ok(()),
        }
    }

    /// Operations recorded so far.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}
