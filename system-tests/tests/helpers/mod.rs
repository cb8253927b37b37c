// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Shared helpers for cloud-smoke system-tests.
// Purpose: Provide emulator fixtures and suite timeouts.
// Dependencies: system-tests, testcontainers, aws-config
// ============================================================================

//! ## Overview
//! Shared helpers for cloud-smoke system-tests.
//! Invariants:
//! - Fixtures reuse an external endpoint when one is configured.
//! - Containers live as long as the fixture value.

#![allow(dead_code, reason = "Shared helpers are reused across multiple test suites.")]

pub mod env;
pub mod infra;
pub mod timeouts;
