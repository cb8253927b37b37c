// crates/cloud-smoke-core/tests/logger.rs
// ============================================================================
// Module: Prefixed Logger Tests
// Description: Captures tracing output emitted by PrefixedLogger.
// Purpose: Verify the `[PREFIX] message` line format and levels.
// Dependencies: cloud-smoke-core, tracing-subscriber
// ============================================================================

//! Captures tracing output emitted by PrefixedLogger.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::io;
use std::sync::Arc;
use std::sync::Mutex;

use cloud_smoke_core::ApiError;
use cloud_smoke_core::PrefixedLogger;
use cloud_smoke_core::TesterError;
use cloud_smoke_core::report_cleanup;

/// In-memory writer shared with the subscriber.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    /// Returns everything written so far.
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

/// Runs `body` with a plain-text subscriber writing into the returned buffer.
fn capture(body: impl FnOnce()) -> String {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .finish();
    tracing::subscriber::with_default(subscriber, body);
    captured.text()
}

/// Info lines carry the bracketed prefix.
#[test]
fn log_lines_carry_prefix() {
    let logger = PrefixedLogger::new("S3");
    let output = capture(|| {
        logger.log("Creating Bucket: test-bucket");
        logger.log(format_args!("  {}. {}", 1, "test-bucket"));
    });
    assert!(output.contains("INFO [S3] Creating Bucket: test-bucket"), "{output}");
    assert!(output.contains("[S3]   1. test-bucket"), "{output}");
}

/// Warn and error methods map to tracing levels.
#[test]
fn levels_follow_method() {
    let logger = PrefixedLogger::new(String::from("SQS"));
    let output = capture(|| {
        logger.warn("slow");
        logger.error("boom");
    });
    assert!(output.contains("WARN [SQS] slow"), "{output}");
    assert!(output.contains("ERROR [SQS] boom"), "{output}");
}

/// Fatal lines are tagged and return control.
#[test]
fn fatal_marks_line_without_exiting() {
    let logger = PrefixedLogger::new("CONFIG");
    let output = capture(|| logger.fatal("cannot load"));
    assert!(output.contains("[CONFIG][FATAL] cannot load"), "{output}");
    assert_eq!(logger.prefix(), "CONFIG");
}

/// Cleanup outcomes rely on the level alone, with no textual level tag.
#[test]
fn cleanup_reports_use_levels_only() {
    let logger = PrefixedLogger::new("S3");
    let missing = ApiError::new("DeleteBucket", "gone").with_code(Some("NoSuchBucket".to_string()));
    let denied = ApiError::new("DeleteBucket", "denied");
    let output = capture(|| {
        report_cleanup(
            &logger,
            Err(TesterError::step("delete bucket test-bucket", missing)),
            &["NoSuchBucket"],
            "Bucket test-bucket not found",
        );
        report_cleanup(
            &logger,
            Err(TesterError::step("delete bucket test-bucket", denied)),
            &["NoSuchBucket"],
            "Bucket test-bucket not found",
        );
        report_cleanup(&logger, Ok(()), &["NoSuchBucket"], "unused");
    });
    assert!(output.contains("INFO [S3] Bucket test-bucket not found"), "{output}");
    assert!(
        output.contains("ERROR [S3] failed to delete bucket test-bucket: DeleteBucket: denied"),
        "{output}"
    );
    assert!(!output.contains("INFO:"), "{output}");
    assert!(!output.contains("ERROR:"), "{output}");
    assert!(!output.contains("unused"), "{output}");
}
