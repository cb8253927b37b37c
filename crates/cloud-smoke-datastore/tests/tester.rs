// crates/cloud-smoke-datastore/tests/tester.rs
// ============================================================================
// Module: Datastore Tester Tests
// Description: Scripted Datastore run against the in-process emulator.
// Purpose: Verify step order, read-back checks, and cleanup.
// Dependencies: cloud-smoke-core, cloud-smoke-datastore, tiny_http, tokio
// ============================================================================

//! Scripted Datastore run against the in-process emulator.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod support;

use std::sync::Arc;

use cloud_smoke_core::Tester;
use cloud_smoke_core::TesterError;
use cloud_smoke_datastore::DatastoreTester;
use support::Emulator;

/// A full run touches every endpoint and leaves nothing behind.
#[tokio::test]
async fn happy_path_runs_every_step() {
    let emulator = Emulator::start();
    let tester = DatastoreTester::new(Arc::new(emulator.driver()));
    assert_eq!(tester.name(), "Datastore");

    tester.run().await.unwrap();

    assert_eq!(
        emulator.methods(),
        ["commit", "runQuery", "runQuery", "commit", "lookup", "commit"]
    );
    assert_eq!(emulator.entity_count(), 0);
    let requests = emulator.requests();
    let updated = &requests[3].body["mutations"][0]["upsert"]["properties"];
    assert_eq!(updated["Sound"]["stringValue"], "purr");
    assert!(requests[5].body["mutations"][0].get("delete").is_some());
}

/// A failed read-back still deletes the created entity.
#[tokio::test]
async fn failed_lookup_cleans_up() {
    let emulator = Emulator::start();
    emulator.fail("lookup", 500, "backend unavailable");
    let tester = DatastoreTester::new(Arc::new(emulator.driver()));

    let err = tester.run().await.unwrap_err();

    assert!(matches!(err, TesterError::Step { .. }), "{err:?}");
    assert!(err.to_string().contains("backend unavailable"), "{err}");
    assert_eq!(emulator.methods().last().map(String::as_str), Some("commit"));
    assert_eq!(emulator.entity_count(), 0);
}

/// A failed create stops the run without cleanup calls.
#[tokio::test]
async fn failed_create_skips_cleanup() {
    let emulator = Emulator::start();
    emulator.fail("commit", 403, "permission denied");
    let tester = DatastoreTester::new(Arc::new(emulator.driver()));

    let err = tester.run().await.unwrap_err();

    assert!(err.to_string().starts_with("failed to create Animal entity"), "{err}");
    assert_eq!(emulator.methods(), ["commit"]);
}

/// Query failures are step errors and the entity is removed afterwards.
#[tokio::test]
async fn failed_query_cleans_up() {
    let emulator = Emulator::start();
    emulator.fail("runQuery", 400, "no matching index found");
    let tester = DatastoreTester::new(Arc::new(emulator.driver()));

    let err = tester.run().await.unwrap_err();

    assert!(err.to_string().contains("find Animal entities"), "{err}");
    assert_eq!(emulator.methods(), ["commit", "runQuery", "commit"]);
    assert_eq!(emulator.entity_count(), 0);
}
