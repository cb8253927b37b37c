// crates/cloud-smoke-aws/src/secretsmanager.rs
// ============================================================================
// Module: Secrets Manager Tester
// Description: Secret lifecycle against AWS Secrets Manager.
// Purpose: Create a secret, read its value back, and force-delete it.
// Dependencies: aws-sdk-secretsmanager, async-trait, cloud-smoke-core
// ============================================================================

//! ## Overview
//! Deletion always bypasses the recovery window so the same secret name can
//! be created again by the next run. Secret values are never written to the
//! log; only their length is.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_secretsmanager::Client;
use cloud_smoke_core::ApiError;
use cloud_smoke_core::PrefixedLogger;
use cloud_smoke_core::Tester;
use cloud_smoke_core::TesterError;
use cloud_smoke_core::report_cleanup;

use crate::error::api_error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Logger prefix and tester name.
pub const SECRETS_MANAGER_SERVICE_NAME: &str = "Secrets-Manager";
/// Service codes meaning the secret is already gone.
pub const SECRET_NOT_FOUND_CODES: &[&str] = &["ResourceNotFoundException"];

// ============================================================================
// SECTION: API Seam
// ============================================================================

/// Secret operations used by [`SecretsManagerTester`].
#[async_trait]
pub trait SecretApi: Send + Sync {
    /// Creates a string secret.
    async fn create_secret(&self, name: &str, value: &str) -> Result<(), ApiError>;
    /// Returns every secret name.
    async fn list_secrets(&self) -> Result<Vec<String>, ApiError>;
    /// Returns the string value of a secret; empty when it holds binary data.
    async fn get_secret_value(&self, name: &str) -> Result<String, ApiError>;
    /// Deletes a secret without a recovery window.
    async fn force_delete_secret(&self, name: &str) -> Result<(), ApiError>;
}

/// SDK-backed [`SecretApi`].
#[derive(Clone)]
pub struct SmSecrets {
    /// Secrets Manager client.
    client: Client,
}

impl SmSecrets {
    /// Builds a client from shared configuration.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl SecretApi for SmSecrets {
    async fn create_secret(&self, name: &str, value: &str) -> Result<(), ApiError> {
        self.client
            .create_secret()
            .name(name)
            .secret_string(value)
            .send()
            .await
            .map_err(|err| api_error("CreateSecret", err))?;
        Ok(())
    }

    async fn list_secrets(&self) -> Result<Vec<String>, ApiError> {
        let output =
            self.client.list_secrets().send().await.map_err(|err| api_error("ListSecrets", err))?;
        Ok(output
            .secret_list()
            .iter()
            .filter_map(|secret| secret.name().map(str::to_string))
            .collect())
    }

    async fn get_secret_value(&self, name: &str) -> Result<String, ApiError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|err| api_error("GetSecretValue", err))?;
        Ok(output.secret_string.unwrap_or_default())
    }

    async fn force_delete_secret(&self, name: &str) -> Result<(), ApiError> {
        self.client
            .delete_secret()
            .secret_id(name)
            .force_delete_without_recovery(true)
            .send()
            .await
            .map_err(|err| api_error("DeleteSecret", err))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Scenario
// ============================================================================

/// Names and payload used by one Secrets Manager run.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretsScenario {
    /// Secret name.
    pub name: String,
    /// Secret value.
    pub value: String,
}

impl Default for SecretsScenario {
    fn default() -> Self {
        Self {
            name: "TestSecret".to_string(),
            value: "MySecretValue".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Tester
// ============================================================================

/// Smoke tester for Secrets Manager.
pub struct SecretsManagerTester<A = SmSecrets> {
    /// Secret operations.
    api: A,
    /// Resource names.
    scenario: SecretsScenario,
    /// `[Secrets-Manager]` logger.
    logger: PrefixedLogger,
}

impl<A: SecretApi> SecretsManagerTester<A> {
    /// Creates a tester with the default scenario.
    pub fn new(api: A) -> Self {
        Self {
            api,
            scenario: SecretsScenario::default(),
            logger: PrefixedLogger::new(SECRETS_MANAGER_SERVICE_NAME),
        }
    }

    /// Replaces the scenario.
    #[must_use]
    pub fn with_scenario(mut self, scenario: SecretsScenario) -> Self {
        self.scenario = scenario;
        self
    }

    /// Returns the underlying API.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Runs the steps after creation, stopping at the first failure.
    async fn steps(&self) -> Result<(), TesterError> {
        let SecretsScenario {
            name,
            value,
        } = &self.scenario;
        self.list_secrets().await?;
        self.get_secret_value(name, value).await?;
        self.delete_secret(name).await
    }

    /// Removes the secret if the sequence left it behind.
    ///
    /// Only called once `CreateSecret` succeeded, so a pre-existing secret of
    /// the same name is never force-deleted.
    async fn clean(&self) {
        self.logger.log("Start Cleaning Testing...");
        let name = &self.scenario.name;
        let result = self.delete_secret(name).await;
        report_cleanup(
            &self.logger,
            result,
            SECRET_NOT_FOUND_CODES,
            format_args!("Secret {name} not found"),
        );
        self.logger.log("Cleaning Testing Complete");
    }

    /// Creates the secret.
    async fn create_secret(&self, name: &str, value: &str) -> Result<(), TesterError> {
        self.logger.log(format_args!("Creating Secret: {name}"));
        self.api
            .create_secret(name, value)
            .await
            .map_err(|err| TesterError::step(format!("create secret {name}"), err))?;
        self.logger.log(format_args!("Secret {name} created successfully"));
        Ok(())
    }

    /// Lists every secret.
    async fn list_secrets(&self) -> Result<(), TesterError> {
        self.logger.log("Listing Secrets");
        let names =
            self.api.list_secrets().await.map_err(|err| TesterError::step("list secrets", err))?;
        for (index, name) in names.iter().enumerate() {
            self.logger.log(format_args!("  {}. Name: {name}", index + 1));
        }
        Ok(())
    }

    /// Reads the value back and compares it with what was stored.
    async fn get_secret_value(&self, name: &str, expected: &str) -> Result<(), TesterError> {
        self.logger.log(format_args!("Retrieving Secret: {name}"));
        let value = self
            .api
            .get_secret_value(name)
            .await
            .map_err(|err| TesterError::step(format!("get secret value for {name}"), err))?;
        self.logger.log(format_args!("Secret Value: <redacted, {} bytes>", value.len()));
        if value != expected {
            return Err(TesterError::mismatch(
                format!("secret {name} value"),
                "<stored value>",
                format!("<{} bytes that differ>", value.len()),
            ));
        }
        Ok(())
    }

    /// Force-deletes the secret.
    async fn delete_secret(&self, name: &str) -> Result<(), TesterError> {
        self.logger.log(format_args!("Deleting Secret: {name}"));
        self.api
            .force_delete_secret(name)
            .await
            .map_err(|err| TesterError::step(format!("delete secret {name}"), err))?;
        self.logger.log("Secret deleted successfully");
        Ok(())
    }
}

#[async_trait]
impl<A: SecretApi> Tester for SecretsManagerTester<A> {
    fn name(&self) -> &'static str {
        SECRETS_MANAGER_SERVICE_NAME
    }

    async fn run(&self) -> Result<(), TesterError> {
        self.logger.log("Running Secrets Manager testing...");
        self.create_secret(&self.scenario.name, &self.scenario.value).await?;
        let outcome = self.steps().await;
        if outcome.is_ok() {
            self.logger.log("Testing Completed");
        }
        self.clean().await;
        outcome
    }
}
