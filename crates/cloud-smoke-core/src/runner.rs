// crates/cloud-smoke-core/src/runner.rs
// ============================================================================
// Module: Tester Runner
// Description: Executes registered testers and summarizes their outcomes.
// Purpose: Run every tester even when earlier ones fail, then report once.
// Dependencies: serde, tokio
// ============================================================================

//! ## Overview
//! The runner executes testers sequentially (default) or concurrently on the
//! tokio runtime. Either way outcomes are reported in registration order and
//! one failing tester never prevents the others from running.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use serde::Deserialize;
use serde::Serialize;

use crate::error::TesterError;
use crate::logger::PrefixedLogger;
use crate::tester::Tester;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Tester execution strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// One tester at a time, in registration order.
    #[default]
    Sequential,
    /// All testers spawned at once.
    Concurrent,
}

/// Result of a single tester.
#[derive(Debug)]
pub struct TesterOutcome {
    /// Tester name.
    pub name: &'static str,
    /// Tester result.
    pub result: Result<(), TesterError>,
    /// Wall-clock time spent in the tester.
    pub elapsed: Duration,
}

/// Outcomes of a full run, in registration order.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Per-tester outcomes.
    outcomes: Vec<TesterOutcome>,
}

impl RunReport {
    /// Returns every outcome.
    #[must_use]
    pub fn outcomes(&self) -> &[TesterOutcome] {
        &self.outcomes
    }

    /// Iterates over failed testers and their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&'static str, &TesterError)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().err().map(|err| (outcome.name, err)))
    }

    /// Returns true when every tester passed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_ok())
    }

    /// Number of testers that passed.
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.result.is_ok()).count()
    }

    /// Number of testers that failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.passed_count()
    }
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Drives a set of testers to completion.
#[derive(Debug, Clone)]
pub struct Runner {
    /// Execution strategy.
    mode: RunMode,
    /// Logger for run-level messages.
    logger: PrefixedLogger,
}

impl Runner {
    /// Creates a runner with the given strategy.
    #[must_use]
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            logger: PrefixedLogger::new("RUNNER"),
        }
    }

    /// Returns the execution strategy.
    #[must_use]
    pub const fn mode(&self) -> RunMode {
        self.mode
    }

    /// Runs every tester and logs the summary.
    pub async fn run(&self, testers: Vec<Arc<dyn Tester>>) -> RunReport {
        self.logger.log("Starting testing cloud services...");
        let outcomes = match self.mode {
            RunMode::Sequential => {
                let mut outcomes = Vec::with_capacity(testers.len());
                for tester in testers {
                    outcomes.push(run_one(tester).await);
                }
                outcomes
            }
            RunMode::Concurrent => run_concurrently(testers).await,
        };
        let report = RunReport {
            outcomes,
        };
        self.log_summary(&report);
        report
    }

    /// Logs the numbered failure list or the success line.
    fn log_summary(&self, report: &RunReport) {
        if report.is_success() {
            self.logger.log("All tests passed");
            return;
        }
        for (index, (name, err)) in report.failures().enumerate() {
            self.logger.error(format_args!("  {}. Failed running test: {name}: {err}", index + 1));
        }
        self.logger.error("Errors occurred when running the services tests.");
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Runs one tester and times it.
async fn run_one(tester: Arc<dyn Tester>) -> TesterOutcome {
    let started = Instant::now();
    let result = tester.run().await;
    TesterOutcome {
        name: tester.name(),
        result,
        elapsed: started.elapsed(),
    }
}

/// Spawns every tester, then collects outcomes in registration order.
async fn run_concurrently(testers: Vec<Arc<dyn Tester>>) -> Vec<TesterOutcome> {
    let handles: Vec<_> = testers
        .into_iter()
        .map(|tester| (tester.name(), tokio::spawn(run_one(tester))))
        .collect();
    let mut outcomes = Vec::with_capacity(handles.len());
    for (name, handle) in handles {
        let outcome = handle.await.unwrap_or_else(|err| TesterOutcome {
            name,
            result: Err(TesterError::Aborted(err.to_string())),
            elapsed: Duration::ZERO,
        });
        outcomes.push(outcome);
    }
    outcomes
}
