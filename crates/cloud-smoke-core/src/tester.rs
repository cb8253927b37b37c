// crates/cloud-smoke-core/src/tester.rs
// ============================================================================
// Module: Tester Trait
// Description: Async trait implemented by every service tester.
// Purpose: Let the runner drive heterogeneous testers uniformly.
// Dependencies: async-trait
// ============================================================================

//! ## Overview
//! A tester runs a scripted sequence against one service and always tears
//! down what it created. Sequence shape:
//! 1. log start;
//! 2. run steps in order, stopping at the first failure;
//! 3. run cleanup, logging (never returning) its failures;
//! 4. return the first step error, if any.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Display;

use async_trait::async_trait;

use crate::error::TesterError;
use crate::logger::PrefixedLogger;

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Scripted smoke sequence against a single service.
#[async_trait]
pub trait Tester: Send + Sync {
    /// Stable service label (for example `S3`).
    fn name(&self) -> &'static str;

    /// Runs the scripted sequence, including cleanup.
    ///
    /// # Errors
    ///
    /// Returns [`TesterError`] describing the first failed step.
    async fn run(&self) -> Result<(), TesterError>;
}

// ============================================================================
// SECTION: Cleanup Reporting
// ============================================================================

/// Logs the outcome of a cleanup step.
///
/// Errors whose service code is in `not_found_codes` mean the sequence
/// already removed the resource and are logged at info level.
pub fn report_cleanup(
    logger: &PrefixedLogger,
    result: Result<(), TesterError>,
    not_found_codes: &[&str],
    not_found_message: impl Display,
) {
    let Err(err) = result else {
        return;
    };
    if err.api_error().is_some_and(|api| api.is_code(not_found_codes)) {
        logger.log(not_found_message);
    } else {
        logger.error(err);
    }
}
