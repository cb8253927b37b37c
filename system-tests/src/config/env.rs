// system-tests/src/config/env.rs
// ============================================================================
// Module: System Test Environment
// Description: Environment-backed configuration for system tests.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std, url
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid UTF-8, empty values, and malformed endpoints fail
//! closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use url::Url;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys for system test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemTestEnv {
    /// Existing LocalStack endpoint; skips the container.
    Endpoint,
    /// Region used against the LocalStack endpoint.
    Region,
    /// Existing Datastore emulator `host:port`; skips the container.
    DatastoreHost,
    /// Project id used against the Datastore emulator.
    ProjectId,
    /// Optional per-suite timeout override in seconds (positive integer).
    TimeoutSeconds,
}

impl SystemTestEnv {
    /// Every key, in documentation order.
    pub const ALL: [Self; 5] =
        [Self::Endpoint, Self::Region, Self::DatastoreHost, Self::ProjectId, Self::TimeoutSeconds];

    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Endpoint => "CLOUD_SMOKE_SYSTEM_ENDPOINT",
            Self::Region => "CLOUD_SMOKE_SYSTEM_REGION",
            Self::DatastoreHost => "CLOUD_SMOKE_SYSTEM_DATASTORE_HOST",
            Self::ProjectId => "CLOUD_SMOKE_SYSTEM_PROJECT_ID",
            Self::TimeoutSeconds => "CLOUD_SMOKE_SYSTEM_TIMEOUT_SEC",
        }
    }
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Typed system test configuration derived from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemTestConfig {
    /// External LocalStack endpoint.
    pub endpoint: Option<String>,
    /// Region override.
    pub region: Option<String>,
    /// External Datastore emulator `host:port`.
    pub datastore_host: Option<String>,
    /// Datastore project id override.
    pub project_id: Option<String>,
    /// Optional timeout override in seconds (positive integer).
    pub timeout: Option<Duration>,
}

impl SystemTestConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when an environment value is not valid UTF-8, is empty,
    /// or fails validation (for example, a relative endpoint or a zero timeout).
    pub fn load() -> Result<Self, String> {
        let endpoint = read_env_nonempty(SystemTestEnv::Endpoint.as_str())?
            .map(|value| parse_endpoint(SystemTestEnv::Endpoint.as_str(), &value))
            .transpose()?;
        let region = read_env_nonempty(SystemTestEnv::Region.as_str())?;
        let datastore_host = read_env_nonempty(SystemTestEnv::DatastoreHost.as_str())?;
        let project_id = read_env_nonempty(SystemTestEnv::ProjectId.as_str())?;
        let timeout = read_env_nonempty(SystemTestEnv::TimeoutSeconds.as_str())?
            .map(|value| parse_timeout_seconds(SystemTestEnv::TimeoutSeconds.as_str(), &value))
            .transpose()?;
        Ok(Self {
            endpoint,
            region,
            datastore_host,
            project_id,
            timeout,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, String> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

/// Reads an environment variable and rejects empty values.
///
/// # Errors
///
/// Returns an error when the variable is set but empty or whitespace.
fn read_env_nonempty(name: &str) -> Result<Option<String>, String> {
    match read_env_strict(name)? {
        Some(value) if value.trim().is_empty() => Err(format!("{name} must not be empty")),
        Some(value) => Ok(Some(value.trim().to_string())),
        None => Ok(None),
    }
}

/// Parses an absolute `http`/`https` endpoint.
///
/// # Errors
///
/// Returns an error when the value is not an absolute HTTP URL.
fn parse_endpoint(name: &str, raw: &str) -> Result<String, String> {
    let url = Url::parse(raw).map_err(|err| format!("{name} must be an absolute URL: {err}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("{name} must use http or https"));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

/// Parses a positive timeout value from an environment variable string.
///
/// # Errors
///
/// Returns an error when the value is missing, non-numeric, or zero.
fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, String> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{name} must be a positive integer number of seconds"))?;
    if secs == 0 {
        return Err(format!("{name} must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}
