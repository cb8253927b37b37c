// system-tests/tests/helpers/timeouts.rs
// ============================================================================
// Module: Suite Timeouts
// Description: Upper bound on how long one suite may run.
// Purpose: Turn a hung emulator into a test failure instead of a stalled job.
// Dependencies: system-tests, tokio
// ============================================================================

//! ## Overview
//! The bound defaults to three minutes and follows
//! `CLOUD_SMOKE_SYSTEM_TIMEOUT_SEC` when set.

use std::future::Future;
use std::time::Duration;

use system_tests::config::SystemTestConfig;

/// Default bound for a single suite.
pub const DEFAULT_SUITE_TIMEOUT: Duration = Duration::from_secs(180);

/// Returns the configured suite bound.
pub fn suite_timeout(config: &SystemTestConfig) -> Duration {
    config.timeout.unwrap_or(DEFAULT_SUITE_TIMEOUT)
}

/// Awaits `future`, failing once `limit` elapses.
pub async fn within<F>(limit: Duration, label: &str, future: F) -> Result<F::Output, String>
where
    F: Future,
{
    tokio::time::timeout(limit, future)
        .await
        .map_err(|_| format!("{label} did not finish within {}s", limit.as_secs()))
}
