// crates/cloud-smoke-core/src/lib.rs
// ============================================================================
// Module: Cloud Smoke Core
// Description: Shared tester abstraction, logging, runner, and configuration.
// Purpose: Give every service tester the same sequencing and reporting model.
// Dependencies: async-trait, serde, thiserror, tokio, toml, tracing, url
// ============================================================================

//! ## Overview
//! Cloud Smoke exercises cloud service SDKs with short scripted sequences
//! (create, list, read/write, delete) and reports which services misbehave.
//! This crate holds the pieces every service crate shares:
//! - [`Tester`]: the async trait each service tester implements.
//! - [`PrefixedLogger`]: `[<SERVICE>] message` log lines over `tracing`.
//! - [`Runner`]: sequential or concurrent execution plus the final report.
//! - [`SmokeConfig`]: layered TOML, environment, and CLI configuration.
//!
//! Invariants:
//! - Tester cleanup always runs after the scripted sequence.
//! - Cleanup failures are logged and never replace the sequence result.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod error;
pub mod logger;
pub mod runner;
pub mod tester;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::AwsSettings;
pub use config::ConfigError;
pub use config::DatastoreSettings;
pub use config::RunSettings;
pub use config::Service;
pub use config::SmokeConfig;
pub use config::get_env;
pub use config::parse_services;
pub use error::ApiError;
pub use error::TesterError;
pub use logger::PrefixedLogger;
pub use runner::RunMode;
pub use runner::RunReport;
pub use runner::Runner;
pub use runner::TesterOutcome;
pub use tester::Tester;
pub use tester::report_cleanup;
