// crates/cloud-smoke-core/tests/config.rs
// ============================================================================
// Module: Configuration Tests
// Description: Loading, environment overlay, and validation of SmokeConfig.
// Purpose: Pin defaults and the error messages operators rely on.
// Dependencies: cloud-smoke-core, tempfile
// ============================================================================

//! ## Overview
//! Covers the three configuration layers (defaults, TOML file, environment)
//! and the validation rules applied before any client is built.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::HashMap;
use std::io::Write;

use cloud_smoke_core::ConfigError;
use cloud_smoke_core::RunMode;
use cloud_smoke_core::Service;
use cloud_smoke_core::SmokeConfig;
use cloud_smoke_core::config::DEFAULT_ENDPOINT_URL;
use cloud_smoke_core::get_env;
use cloud_smoke_core::parse_services;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a lookup closure over a fixed variable map.
fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> =
        vars.iter().map(|(key, value)| ((*key).to_string(), (*value).to_string())).collect();
    move |key| map.get(key).cloned()
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Defaults point every AWS client at LocalStack.
#[test]
fn defaults_target_localstack() {
    let config = SmokeConfig::default();
    assert_eq!(config.aws.region, "us-east-1");
    assert_eq!(config.aws.profile, "default");
    assert_eq!(config.aws.effective_endpoint(), Some(DEFAULT_ENDPOINT_URL));
    assert!(config.aws.force_path_style);
    assert_eq!(config.services, vec![Service::S3, Service::Sqs, Service::Sns, Service::Dynamodb]);
    assert_eq!(config.run.mode, RunMode::Sequential);
    assert_eq!(config.datastore.project_id, "klaboratory");
    assert_eq!(config.datastore.timeout_ms, 10_000);
    config.validate().unwrap();
}

/// Live mode ignores the endpoint override.
#[test]
fn live_mode_drops_endpoint_override() {
    let mut config = SmokeConfig::default();
    config.aws.live = true;
    assert_eq!(config.aws.effective_endpoint(), None);
    config.validate().unwrap();
}

// ============================================================================
// SECTION: TOML Layer
// ============================================================================

/// File values replace defaults field by field.
#[test]
fn toml_overrides_defaults() {
    let config = SmokeConfig::from_toml_str(
        r#"
services = ["s3", "secrets-manager", "datastore"]

[aws]
region = "eu-west-1"
endpoint_url = "http://127.0.0.1:4566"

[datastore]
project_id = "smoke"
emulator_host = "localhost:8081"

[run]
mode = "concurrent"
"#,
    )
    .unwrap();
    assert_eq!(config.services, vec![Service::S3, Service::Secretsmanager, Service::Datastore]);
    assert_eq!(config.aws.region, "eu-west-1");
    assert_eq!(config.aws.profile, "default");
    assert_eq!(config.datastore.emulator_host.as_deref(), Some("localhost:8081"));
    assert_eq!(config.run.mode, RunMode::Concurrent);
}

/// Misspelled keys fail parsing instead of being ignored.
#[test]
fn toml_rejects_unknown_fields() {
    let err = SmokeConfig::from_toml_str("[aws]\nregoin = \"us-east-1\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

/// File service names follow the flag rules: case-insensitive, unknown is invalid.
#[test]
fn toml_rejects_unknown_service() {
    let err = SmokeConfig::from_toml_str("services = [\"kinesis\"]\n").unwrap_err();
    assert_eq!(err, ConfigError::Invalid("unknown service: kinesis".to_string()));

    let config = SmokeConfig::from_toml_str("services = [\"SQS\", \"Secrets-Manager\", \"sqs\"]\n")
        .unwrap();
    assert_eq!(config.services, vec![Service::Sqs, Service::Secretsmanager]);

    let err = SmokeConfig::from_toml_str("services = \"s3\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
    let err = SmokeConfig::from_toml_str("bogus = 1\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)), "{err}");
}

/// An explicit path is read.
#[test]
fn load_reads_file_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "services = [\"sqs\"]").unwrap();
    let config = SmokeConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.services, vec![Service::Sqs]);
}

/// A missing file is an I/O error.
#[test]
fn load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = SmokeConfig::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

/// Non UTF-8 files are rejected.
#[test]
fn load_rejects_non_utf8() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[0xff, 0xfe, 0x00]).unwrap();
    let err = SmokeConfig::load(Some(file.path())).unwrap_err();
    assert_eq!(err, ConfigError::Invalid("config file must be utf-8".to_string()));
}

// ============================================================================
// SECTION: Environment Layer
// ============================================================================

/// Environment values overlay the file layer.
#[test]
fn env_overrides_file_values() {
    let mut config = SmokeConfig::default();
    config
        .apply_env_with(lookup(&[
            ("AWS_REGION", "ap-south-1"),
            ("AWS_ENDPOINT_URL", "http://localstack:4566"),
            ("AWS_PROFILE", "smoke"),
            ("CLOUD_SMOKE_SERVICES", "dynamodb, s3"),
            ("DATASTORE_PROJECT_ID", "other"),
            ("DATASTORE_EMULATOR_HOST", "localhost:8432"),
        ]))
        .unwrap();
    assert_eq!(config.aws.region, "ap-south-1");
    assert_eq!(config.aws.endpoint_url.as_deref(), Some("http://localstack:4566"));
    assert_eq!(config.aws.profile, "smoke");
    assert_eq!(config.services, vec![Service::Dynamodb, Service::S3]);
    assert_eq!(config.datastore.project_id, "other");
    assert_eq!(config.datastore.emulator_host.as_deref(), Some("localhost:8432"));
}

/// An invalid service selection in the environment is reported.
#[test]
fn env_rejects_unknown_service() {
    let mut config = SmokeConfig::default();
    let err =
        config.apply_env_with(lookup(&[("CLOUD_SMOKE_SERVICES", "s3,lambda")])).unwrap_err();
    assert_eq!(err, ConfigError::Invalid("unknown service: lambda".to_string()));
}

/// Unset variables fall back to the default.
#[test]
fn get_env_falls_back_when_unset() {
    assert_eq!(get_env("CLOUD_SMOKE_TEST_SURELY_UNSET_VARIABLE", "fallback"), "fallback");
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// A blank region fails validation.
#[test]
fn empty_region_is_rejected() {
    let mut config = SmokeConfig::default();
    config.aws.region = "  ".to_string();
    assert_eq!(
        config.validate().unwrap_err(),
        ConfigError::Invalid("AWS Region is empty".to_string())
    );
}

/// A blank endpoint override fails validation.
#[test]
fn empty_endpoint_is_rejected() {
    let mut config = SmokeConfig::default();
    config.aws.endpoint_url = Some(String::new());
    assert_eq!(
        config.validate().unwrap_err(),
        ConfigError::Invalid("AWS EndPoint is empty".to_string())
    );
}

/// Endpoints must be http or https.
#[test]
fn endpoint_without_scheme_is_rejected() {
    let mut config = SmokeConfig::default();
    config.aws.endpoint_url = Some("ftp://localhost:4566".to_string());
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

/// AWS settings are not validated when no AWS service is selected.
#[test]
fn aws_settings_ignored_without_aws_services() {
    let mut config = SmokeConfig::default();
    config.services = vec![Service::Datastore];
    config.aws.region = String::new();
    config.validate().unwrap();
}

/// Datastore settings are validated when Datastore is selected.
#[test]
fn datastore_settings_checked_when_selected() {
    let mut config = SmokeConfig::default();
    config.services = vec![Service::Datastore];
    config.datastore.timeout_ms = 0;
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    config.datastore.timeout_ms = 1;
    config.datastore.project_id = String::new();
    assert_eq!(
        config.validate().unwrap_err(),
        ConfigError::Invalid("Datastore project id is empty".to_string())
    );
}

// ============================================================================
// SECTION: Service Selection
// ============================================================================

/// Service lists are case-insensitive and deduplicated.
#[test]
fn parse_services_dedupes_and_keeps_order() {
    let services = parse_services("SQS, s3,,sqs ,Secrets-Manager").unwrap();
    assert_eq!(services, vec![Service::Sqs, Service::S3, Service::Secretsmanager]);
}

/// A selection with no names is rejected.
#[test]
fn parse_services_rejects_empty_selection() {
    assert_eq!(
        parse_services(" , ").unwrap_err(),
        ConfigError::Invalid("no services selected".to_string())
    );
}

/// Every selector parses back to its service.
#[test]
fn service_selectors_round_trip() {
    for service in Service::ALL {
        assert_eq!(service.as_str().parse::<Service>().unwrap(), service);
    }
    assert!(!Service::Datastore.is_aws());
    assert!(Service::Secretsmanager.is_aws());
}
