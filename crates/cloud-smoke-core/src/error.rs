// crates/cloud-smoke-core/src/error.rs
// ============================================================================
// Module: Tester Errors
// Description: Error types shared by every service tester.
// Purpose: Wrap SDK failures without losing the service error code.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Service crates translate their SDK errors into [`ApiError`] so tester
//! logic can inspect error codes (for example `NoSuchBucket`) without
//! depending on a particular SDK. Testers surface failures as
//! [`TesterError`], which keeps the failed action in its message.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::error::Error as StdError;

use thiserror::Error;

// ============================================================================
// SECTION: Api Error
// ============================================================================

/// SDK-independent record of a failed service call.
///
/// # Invariants
/// - `operation` names the service API call (for example `CreateBucket`).
/// - `code` holds the service error code when the service returned one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation}: {message}")]
pub struct ApiError {
    /// Service API operation name.
    pub operation: &'static str,
    /// Service error code, when reported.
    pub code: Option<String>,
    /// Rendered error message including nested causes.
    pub message: String,
}

impl ApiError {
    /// Creates an error without a service error code.
    #[must_use]
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            code: None,
            message: message.into(),
        }
    }

    /// Attaches a service error code.
    #[must_use]
    pub fn with_code(mut self, code: Option<String>) -> Self {
        self.code = code;
        self
    }

    /// Returns true when the service error code matches one of `codes`.
    #[must_use]
    pub fn is_code(&self, codes: &[&str]) -> bool {
        self.code.as_deref().is_some_and(|code| codes.contains(&code))
    }
}

// ============================================================================
// SECTION: Tester Error
// ============================================================================

/// Failure reported by a tester run.
#[derive(Debug, Error)]
pub enum TesterError {
    /// A scripted step failed; `source` is the underlying service error.
    #[error("failed to {action}: {source}")]
    Step {
        /// Human-readable step description (for example `create bucket test-bucket`).
        action: String,
        /// Underlying failure.
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },
    /// Data read back from the service differs from what was written.
    #[error("{what} mismatch: expected `{expected}`, got `{actual}`")]
    Mismatch {
        /// What was compared.
        what: String,
        /// Value that was written.
        expected: String,
        /// Value that was read back.
        actual: String,
    },
    /// Tester setup is invalid.
    #[error("invalid tester setup: {0}")]
    Config(String),
    /// The tester task stopped before reporting a result.
    #[error("tester aborted: {0}")]
    Aborted(String),
}

impl TesterError {
    /// Builds a step failure from any error.
    pub fn step(
        action: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
    ) -> Self {
        Self::Step {
            action: action.into(),
            source: source.into(),
        }
    }

    /// Builds a read-back mismatch.
    pub fn mismatch(
        what: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::Mismatch {
            what: what.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Returns the wrapped [`ApiError`] when this is a step failure caused by one.
    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Step {
                source, ..
            } => source.downcast_ref::<ApiError>(),
            _ => None,
        }
    }
}
