// crates/cloud-smoke-cli/src/main.rs
// ============================================================================
// Module: Cloud Smoke CLI Entry Point
// Description: Command dispatcher for the cloud service smoke testers.
// Purpose: Resolve configuration, build testers, run them, report the result.
// Dependencies: clap, cloud-smoke-aws, cloud-smoke-core, cloud-smoke-datastore, tokio
// ============================================================================

//! ## Overview
//! `cloud-smoke run` resolves configuration (file, environment, then flags),
//! builds a tester per selected service, and exits non-zero when any tester
//! failed. `cloud-smoke list` prints the service names accepted by
//! `--services`. Running without a subcommand behaves like `run`.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod logging;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use aws_config::SdkConfig;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use cloud_smoke_aws::load_sdk_config;
use cloud_smoke_core::RunMode;
use cloud_smoke_core::RunReport;
use cloud_smoke_core::Runner;
use cloud_smoke_core::Service;
use cloud_smoke_core::SmokeConfig;
use cloud_smoke_core::Tester;
use cloud_smoke_core::parse_services;
use cloud_smoke_datastore::DatastoreDriver;
use cloud_smoke_datastore::DatastoreTester;
use cloud_smoke_datastore::Driver;
use thiserror::Error;

use crate::logging::LogFormat;
use crate::logging::init_logging;

// ============================================================================
// SECTION: CLI Definitions
// ============================================================================

/// Cloud Smoke command-line interface.
#[derive(Parser, Debug)]
#[command(name = "cloud-smoke", version, about = "Smoke tests for cloud service SDKs.")]
struct Cli {
    /// Log line format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,
    /// Command to run; defaults to `run`.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the selected service testers.
    Run(RunCommand),
    /// List the service names accepted by `--services`.
    List,
}

/// Flags of the `run` command; every flag overrides file and environment.
#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
struct RunCommand {
    /// TOML configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Comma-separated services, for example `s3,sqs,datastore`.
    #[arg(long, value_name = "LIST")]
    services: Option<String>,
    /// AWS region.
    #[arg(long, value_name = "REGION")]
    region: Option<String>,
    /// Endpoint override for every AWS client.
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,
    /// Target live AWS instead of the endpoint override.
    #[arg(long)]
    live: bool,
    /// Shared config/credentials profile.
    #[arg(long, value_name = "NAME")]
    profile: Option<String>,
    /// Run testers concurrently.
    #[arg(long)]
    concurrent: bool,
    /// Datastore project id.
    #[arg(long, value_name = "ID")]
    project_id: Option<String>,
    /// Datastore emulator `host:port`.
    #[arg(long, value_name = "HOST")]
    emulator_host: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error carrying the message shown to the user.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_format)
        .map_err(|err| CliError::new(format!("failed to install logger: {err}")))?;
    match cli.command.unwrap_or_else(|| Commands::Run(RunCommand::default())) {
        Commands::Run(command) => command_run(&command).await,
        Commands::List => command_list(),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Runs the selected testers.
async fn command_run(command: &RunCommand) -> CliResult<ExitCode> {
    let config = resolve_config(command)?;
    let datastore = if config.services.contains(&Service::Datastore) {
        let driver = DatastoreDriver::from_settings(&config.datastore)
            .map_err(|err| CliError::new(format!("failed to create Datastore client: {err}")))?;
        Some(Arc::new(driver))
    } else {
        None
    };
    let sdk = if config.services.iter().any(|service| service.is_aws()) {
        let sdk = load_sdk_config(&config.aws)
            .await
            .map_err(|err| CliError::new(format!("failed to load AWS configuration: {err}")))?;
        Some(sdk)
    } else {
        None
    };

    let testers = build_testers(&config, sdk.as_ref(), datastore.as_ref());
    let report = Runner::new(config.run.mode).run(testers).await;
    if let Some(driver) = datastore {
        driver.close().await;
    }

    write_stdout_line(&render_summary(&report))
        .map_err(|err| CliError::new(format!("failed to write stdout: {err}")))?;
    Ok(if report.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Prints every service name, marking the default selection.
fn command_list() -> CliResult<ExitCode> {
    for service in Service::ALL {
        let line = if Service::DEFAULTS.contains(&service) {
            format!("{service} (default)")
        } else {
            service.to_string()
        };
        write_stdout_line(&line)
            .map_err(|err| CliError::new(format!("failed to write stdout: {err}")))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Resolves file and environment layers, then applies the flags.
fn resolve_config(command: &RunCommand) -> CliResult<SmokeConfig> {
    let mut config = SmokeConfig::resolve(command.config.as_deref())
        .map_err(|err| CliError::new(err.to_string()))?;
    apply_overrides(&mut config, command)?;
    config.validate().map_err(|err| CliError::new(err.to_string()))?;
    Ok(config)
}

/// Applies `run` flags on top of the resolved configuration.
fn apply_overrides(config: &mut SmokeConfig, command: &RunCommand) -> CliResult<()> {
    if let Some(services) = &command.services {
        config.services = parse_services(services).map_err(|err| CliError::new(err.to_string()))?;
    }
    if let Some(region) = &command.region {
        config.aws.region.clone_from(region);
    }
    if let Some(endpoint) = &command.endpoint {
        config.aws.endpoint_url = Some(endpoint.clone());
    }
    if command.live {
        config.aws.live = true;
    }
    if let Some(profile) = &command.profile {
        config.aws.profile.clone_from(profile);
    }
    if command.concurrent {
        config.run.mode = RunMode::Concurrent;
    }
    if let Some(project_id) = &command.project_id {
        config.datastore.project_id.clone_from(project_id);
    }
    if let Some(host) = &command.emulator_host {
        config.datastore.emulator_host = Some(host.clone());
    }
    Ok(())
}

// ============================================================================
// SECTION: Tester Registry
// ============================================================================

/// Builds testers in the order services were selected.
///
/// AWS services are skipped when `sdk` is absent, Datastore when `datastore` is.
fn build_testers(
    config: &SmokeConfig,
    sdk: Option<&SdkConfig>,
    datastore: Option<&Arc<DatastoreDriver>>,
) -> Vec<Arc<dyn Tester>> {
    let mut testers: Vec<Arc<dyn Tester>> = Vec::with_capacity(config.services.len());
    for service in &config.services {
        if *service == Service::Datastore {
            if let Some(driver) = datastore {
                testers.push(Arc::new(DatastoreTester::new(Arc::clone(driver))));
            }
        } else if let Some(sdk) = sdk {
            testers.extend(cloud_smoke_aws::build_testers(
                sdk,
                &config.aws,
                std::slice::from_ref(service),
            ));
        }
    }
    testers
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Renders the per-tester result table and the totals line.
fn render_summary(report: &RunReport) -> String {
    let mut lines: Vec<String> = report
        .outcomes()
        .iter()
        .map(|outcome| {
            let status = if outcome.result.is_ok() { "PASS" } else { "FAIL" };
            let name = outcome.name;
            let seconds = outcome.elapsed.as_secs_f64();
            format!("{status} {name:<16} {seconds:>8.2}s")
        })
        .collect();
    lines.push(format!("{} passed, {} failed", report.passed_count(), report.failed_count()));
    lines.join("\n")
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
