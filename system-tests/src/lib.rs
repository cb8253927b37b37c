// system-tests/src/lib.rs
// ============================================================================
// Module: Cloud Smoke System Tests Library
// Description: Shared configuration for the system-test binaries.
// Purpose: Resolve where the emulated services live before a suite starts.
// Dependencies: std, url
// ============================================================================

//! ## Overview
//! This crate hosts the environment configuration used by the system-test
//! binaries in `system-tests/tests`. Suites either start LocalStack and the
//! Datastore emulator through testcontainers or reuse endpoints named here.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
