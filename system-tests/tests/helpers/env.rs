// system-tests/tests/helpers/env.rs
// ============================================================================
// Module: Test Environment Helpers
// Description: Safe wrappers for test-only environment mutation.
// Purpose: Feed static emulator credentials to the standard provider chain.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The AWS fixture loads its configuration through the same path as the CLI,
//! so LocalStack credentials are supplied as environment variables.

#![allow(unsafe_code, reason = "Test harness mutates process env for configuration.")]

/// Sets an environment variable for the current process.
pub fn set_var(key: &str, value: &str) {
    // SAFETY: Fixtures set the same fixed values before any client is built.
    unsafe {
        std::env::set_var(key, value);
    }
}
