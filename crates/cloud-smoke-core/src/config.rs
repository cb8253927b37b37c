// crates/cloud-smoke-core/src/config.rs
// ============================================================================
// Module: Cloud Smoke Configuration
// Description: Configuration model, loading, environment overlay, validation.
// Purpose: Resolve which services to test and where their endpoints live.
// Dependencies: serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is layered: optional TOML file, then environment variables,
//! then CLI flags (applied by the binary). With no file and no environment
//! the defaults target a LocalStack instance on `http://localhost:4566`.
//! Environment variables that are set but empty count as unset.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::runner::RunMode;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default AWS profile name.
pub const DEFAULT_PROFILE: &str = "default";
/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";
/// Default emulated endpoint (LocalStack edge port).
pub const DEFAULT_ENDPOINT_URL: &str = "http://localhost:4566";
/// Default Datastore project id.
pub const DEFAULT_DATASTORE_PROJECT_ID: &str = "klaboratory";
/// Default per-call Datastore timeout in milliseconds.
pub const DEFAULT_DATASTORE_TIMEOUT_MS: u64 = 10_000;
/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "CLOUD_SMOKE_CONFIG";
/// Environment variable selecting services (comma separated).
pub const SERVICES_ENV_VAR: &str = "CLOUD_SMOKE_SERVICES";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Services
// ============================================================================

/// Services a tester exists for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Service {
    /// Amazon S3.
    S3,
    /// Amazon SQS.
    Sqs,
    /// Amazon SNS.
    Sns,
    /// Amazon DynamoDB.
    Dynamodb,
    /// AWS Secrets Manager.
    Secretsmanager,
    /// Google Cloud Datastore.
    Datastore,
}

impl Service {
    /// Every known service, in default run order.
    pub const ALL: [Self; 6] =
        [Self::S3, Self::Sqs, Self::Sns, Self::Dynamodb, Self::Secretsmanager, Self::Datastore];
    /// Services enabled when nothing is selected explicitly.
    pub const DEFAULTS: [Self; 4] = [Self::S3, Self::Sqs, Self::Sns, Self::Dynamodb];

    /// Returns the lowercase selector used in config and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S3 => "s3",
            Self::Sqs => "sqs",
            Self::Sns => "sns",
            Self::Dynamodb => "dynamodb",
            Self::Secretsmanager => "secretsmanager",
            Self::Datastore => "datastore",
        }
    }

    /// Returns true for services reached through the AWS SDK.
    #[must_use]
    pub const fn is_aws(self) -> bool {
        !matches!(self, Self::Datastore)
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Service {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "sqs" => Ok(Self::Sqs),
            "sns" => Ok(Self::Sns),
            "dynamodb" => Ok(Self::Dynamodb),
            "secretsmanager" | "secrets-manager" => Ok(Self::Secretsmanager),
            "datastore" => Ok(Self::Datastore),
            other => Err(ConfigError::Invalid(format!("unknown service: {other}"))),
        }
    }
}

impl TryFrom<String> for Service {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Parses a comma-separated service list, dropping duplicates.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] for unknown names or an empty list.
pub fn parse_services(list: &str) -> Result<Vec<Service>, ConfigError> {
    collect_services(list.split(','))
}

/// Parses service names in order, skipping blanks and duplicates.
fn collect_services<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<Service>, ConfigError> {
    let mut services = Vec::new();
    for name in names.into_iter().map(str::trim).filter(|name| !name.is_empty()) {
        let service = name.parse::<Service>()?;
        if !services.contains(&service) {
            services.push(service);
        }
    }
    if services.is_empty() {
        return Err(ConfigError::Invalid("no services selected".to_string()));
    }
    Ok(services)
}

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SmokeConfig {
    /// Services to test, in run order.
    #[serde(default = "default_services")]
    pub services: Vec<Service>,
    /// AWS client settings.
    #[serde(default)]
    pub aws: AwsSettings,
    /// Datastore client settings.
    #[serde(default)]
    pub datastore: DatastoreSettings,
    /// Runner settings.
    #[serde(default)]
    pub run: RunSettings,
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            services: default_services(),
            aws: AwsSettings::default(),
            datastore: DatastoreSettings::default(),
            run: RunSettings::default(),
        }
    }
}

/// AWS client settings.
///
/// # Invariants
/// - `endpoint_url` is ignored when `live` is set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AwsSettings {
    /// Region used for signing and endpoint resolution.
    pub region: String,
    /// Endpoint override shared by every service client.
    pub endpoint_url: Option<String>,
    /// Shared config/credentials profile.
    pub profile: String,
    /// Target live AWS instead of the endpoint override.
    pub live: bool,
    /// Use path-style S3 addressing.
    pub force_path_style: bool,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint_url: Some(DEFAULT_ENDPOINT_URL.to_string()),
            profile: DEFAULT_PROFILE.to_string(),
            live: false,
            force_path_style: true,
        }
    }
}

impl AwsSettings {
    /// Returns the endpoint override in effect, if any.
    #[must_use]
    pub fn effective_endpoint(&self) -> Option<&str> {
        if self.live { None } else { self.endpoint_url.as_deref() }
    }

    /// Validates region and endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the region or endpoint is unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::Invalid("AWS Region is empty".to_string()));
        }
        if let Some(endpoint) = self.effective_endpoint() {
            validate_endpoint(endpoint)?;
        }
        Ok(())
    }
}

/// Datastore client settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatastoreSettings {
    /// Project id owning the entities.
    pub project_id: String,
    /// Emulator `host:port`; the public API is used when unset.
    pub emulator_host: Option<String>,
    /// Optional namespace for every key.
    pub namespace: Option<String>,
    /// OAuth access token sent as a bearer token.
    pub access_token: Option<String>,
    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for DatastoreSettings {
    fn default() -> Self {
        Self {
            project_id: DEFAULT_DATASTORE_PROJECT_ID.to_string(),
            emulator_host: None,
            namespace: None,
            access_token: None,
            timeout_ms: DEFAULT_DATASTORE_TIMEOUT_MS,
        }
    }
}

impl DatastoreSettings {
    /// Validates the Datastore settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a setting is unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::Invalid("Datastore project id is empty".to_string()));
        }
        if self.emulator_host.as_deref().is_some_and(|host| host.trim().is_empty()) {
            return Err(ConfigError::Invalid("Datastore emulator host is empty".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "datastore.timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Runner settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSettings {
    /// Execution strategy.
    pub mode: RunMode,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl SmokeConfig {
    /// Loads the file layer, then overlays the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file or an environment value is invalid.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_with(env_value)?;
        Ok(config)
    }

    /// Loads the file layer only.
    ///
    /// Uses `path`, else the file named by `CLOUD_SMOKE_CONFIG`, else defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved =
            path.map(Path::to_path_buf).or_else(|| env_value(CONFIG_ENV_VAR).map(PathBuf::from));
        let Some(resolved) = resolved else {
            return Ok(Self::default());
        };
        let bytes = fs::read(&resolved)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", resolved.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses configuration from TOML text.
    ///
    /// `services` goes through the same name parsing as `--services` and
    /// `CLOUD_SMOKE_SERVICES`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not a valid config and
    /// [`ConfigError::Invalid`] for an unusable `services` list.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let parse_error = |err: toml::de::Error| ConfigError::Parse(err.to_string());
        let mut table: toml::Table = toml::from_str(content).map_err(parse_error)?;
        let services = table.remove("services");
        let mut config: Self = toml::Value::Table(table).try_into().map_err(parse_error)?;
        if let Some(services) = services {
            config.services = services_from_toml(&services)?;
        }
        Ok(config)
    }

    /// Overlays environment values obtained through `lookup`.
    ///
    /// `lookup` must return `None` for unset or empty variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `CLOUD_SMOKE_SERVICES` is invalid.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(region) = lookup("AWS_REGION") {
            self.aws.region = region;
        }
        if let Some(endpoint) = lookup("AWS_ENDPOINT_URL") {
            self.aws.endpoint_url = Some(endpoint);
        }
        if let Some(profile) = lookup("AWS_PROFILE") {
            self.aws.profile = profile;
        }
        if let Some(services) = lookup(SERVICES_ENV_VAR) {
            self.services = parse_services(&services)?;
        }
        if let Some(project_id) = lookup("DATASTORE_PROJECT_ID") {
            self.datastore.project_id = project_id;
        }
        if let Some(host) = lookup("DATASTORE_EMULATOR_HOST") {
            self.datastore.emulator_host = Some(host);
        }
        if let Some(namespace) = lookup("DATASTORE_NAMESPACE") {
            self.datastore.namespace = Some(namespace);
        }
        if let Some(token) = lookup("DATASTORE_ACCESS_TOKEN") {
            self.datastore.access_token = Some(token);
        }
        Ok(())
    }

    /// Validates the settings of every selected service.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a selected service is misconfigured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.services.is_empty() {
            return Err(ConfigError::Invalid("no services selected".to_string()));
        }
        if self.services.iter().any(|service| service.is_aws()) {
            self.aws.validate()?;
        }
        if self.services.contains(&Service::Datastore) {
            self.datastore.validate()?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the value of `key`, or `default` when unset or empty.
#[must_use]
pub fn get_env(key: &str, default: &str) -> String {
    env_value(key).unwrap_or_else(|| default.to_string())
}

/// Reads an environment variable, treating empty values as unset.
fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

/// Reads the TOML `services` array.
fn services_from_toml(value: &toml::Value) -> Result<Vec<Service>, ConfigError> {
    let invalid = || ConfigError::Invalid("services must be a list of service names".to_string());
    let items = value.as_array().ok_or_else(invalid)?;
    let names: Vec<&str> =
        items.iter().map(|item| item.as_str().ok_or_else(invalid)).collect::<Result<_, _>>()?;
    collect_services(names)
}

/// Default service selection.
fn default_services() -> Vec<Service> {
    Service::DEFAULTS.to_vec()
}

/// Validates an endpoint override.
fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid("AWS EndPoint is empty".to_string()));
    }
    let url = Url::parse(trimmed)
        .map_err(|err| ConfigError::Invalid(format!("invalid AWS endpoint {trimmed}: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid(
            "AWS endpoint must include http:// or https://".to_string(),
        ));
    }
    Ok(())
}
