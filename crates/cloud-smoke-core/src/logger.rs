// crates/cloud-smoke-core/src/logger.rs
// ============================================================================
// Module: Prefixed Logger
// Description: Service-prefixed log lines on top of tracing.
// Purpose: Keep interleaved tester output attributable to a service.
// Dependencies: tracing
// ============================================================================

//! ## Overview
//! Every line is rendered as `[<PREFIX>] <message>`. The logger never
//! installs a subscriber; the binary decides where events go.

use std::borrow::Cow;
use std::fmt::Display;

/// Tracing target used for every tester event.
pub const LOG_TARGET: &str = "cloud_smoke";

/// Logger that stamps every message with a fixed prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixedLogger {
    /// Prefix rendered in brackets ahead of each message.
    prefix: Cow<'static, str>,
}

impl PrefixedLogger {
    /// Creates a logger for the given prefix.
    #[must_use]
    pub fn new(prefix: impl Into<Cow<'static, str>>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns the prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Logs an informational message.
    pub fn log(&self, message: impl Display) {
        tracing::info!(target: LOG_TARGET, "[{}] {}", self.prefix, message);
    }

    /// Logs a warning.
    pub fn warn(&self, message: impl Display) {
        tracing::warn!(target: LOG_TARGET, "[{}] {}", self.prefix, message);
    }

    /// Logs an error.
    pub fn error(&self, message: impl Display) {
        tracing::error!(target: LOG_TARGET, "[{}] {}", self.prefix, message);
    }

    /// Logs a fatal error. The caller is responsible for stopping.
    pub fn fatal(&self, message: impl Display) {
        tracing::error!(target: LOG_TARGET, "[{}][FATAL] {}", self.prefix, message);
    }
}
