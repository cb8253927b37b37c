// system-tests/tests/helpers/infra.rs
// ============================================================================
// Module: System Test Infrastructure
// Description: LocalStack and Datastore emulator fixtures.
// Purpose: Provide isolated service endpoints for the real testers.
// Dependencies: testcontainers, aws-config, cloud-smoke-aws, cloud-smoke-core
// ============================================================================

//! ## Overview
//! Each fixture first looks for an external endpoint in the environment
//! (see [`SystemTestConfig`]) and only starts a container when none is set.
//! Container startup requires a reachable Docker daemon.

use aws_config::SdkConfig;
use cloud_smoke_aws::load_sdk_config;
use cloud_smoke_core::AwsSettings;
use cloud_smoke_core::DatastoreSettings;
use cloud_smoke_core::config::DEFAULT_REGION;
use system_tests::config::SystemTestConfig;
use testcontainers::ContainerAsync;
use testcontainers::GenericImage;
use testcontainers::ImageExt;
use testcontainers::core::IntoContainerPort;
use testcontainers::core::WaitFor;
use testcontainers::runners::AsyncRunner;

/// LocalStack edge port.
const LOCALSTACK_PORT: u16 = 4566;
/// Services LocalStack is asked to start.
const LOCALSTACK_SERVICES: &str = "s3,sqs,sns,dynamodb,secretsmanager";
/// Datastore emulator port inside the container.
const DATASTORE_PORT: u16 = 8081;
/// Project id used when none is configured.
const DEFAULT_PROJECT_ID: &str = "smoke-test";

// ============================================================================
// SECTION: LocalStack
// ============================================================================

/// LocalStack endpoint shared by every AWS tester.
pub struct LocalStackFixture {
    /// Edge endpoint URL.
    pub endpoint: String,
    /// Signing region.
    pub region: String,
    /// Container handle; `None` when an external endpoint is used.
    _container: Option<ContainerAsync<GenericImage>>,
}

impl LocalStackFixture {
    /// Reuses the configured endpoint or starts a LocalStack container.
    pub async fn start(config: &SystemTestConfig) -> Result<Self, String> {
        let region = config.region.clone().unwrap_or_else(|| DEFAULT_REGION.to_string());
        if let Some(endpoint) = &config.endpoint {
            return Ok(Self {
                endpoint: endpoint.clone(),
                region,
                _container: None,
            });
        }

        ensure_docker_available()?;
        let container = GenericImage::new("localstack/localstack", "latest")
            .with_exposed_port(LOCALSTACK_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stdout("Ready."))
            .with_env_var("SERVICES", LOCALSTACK_SERVICES)
            .with_env_var("DEFAULT_REGION", region.clone())
            .start()
            .await
            .map_err(|err| format!("failed to start localstack container: {err}"))?;
        let port = container
            .get_host_port_ipv4(LOCALSTACK_PORT.tcp())
            .await
            .map_err(|err| format!("failed to resolve localstack port: {err}"))?;
        Ok(Self {
            endpoint: format!("http://127.0.0.1:{port}"),
            region,
            _container: Some(container),
        })
    }

    /// Settings pointing every client at the fixture.
    pub fn settings(&self) -> AwsSettings {
        AwsSettings {
            region: self.region.clone(),
            endpoint_url: Some(self.endpoint.clone()),
            ..AwsSettings::default()
        }
    }

    /// SDK configuration loaded the way the CLI loads it, with static
    /// LocalStack credentials in the environment.
    pub async fn sdk_config(&self) -> Result<SdkConfig, String> {
        super::env::set_var("AWS_ACCESS_KEY_ID", "test");
        super::env::set_var("AWS_SECRET_ACCESS_KEY", "test");
        super::env::set_var("AWS_EC2_METADATA_DISABLED", "true");
        load_sdk_config(&self.settings())
            .await
            .map_err(|err| format!("failed to load sdk config: {err}"))
    }
}

// ============================================================================
// SECTION: Datastore Emulator
// ============================================================================

/// Datastore emulator endpoint.
pub struct DatastoreFixture {
    /// Emulator `host:port`.
    pub host: String,
    /// Project id the emulator serves.
    pub project_id: String,
    /// Container handle; `None` when an external emulator is used.
    _container: Option<ContainerAsync<GenericImage>>,
}

impl DatastoreFixture {
    /// Reuses the configured emulator or starts one in a container.
    pub async fn start(config: &SystemTestConfig) -> Result<Self, String> {
        let project_id =
            config.project_id.clone().unwrap_or_else(|| DEFAULT_PROJECT_ID.to_string());
        if let Some(host) = &config.datastore_host {
            return Ok(Self {
                host: host.clone(),
                project_id,
                _container: None,
            });
        }

        ensure_docker_available()?;
        let args = vec![
            "gcloud".to_string(),
            "beta".to_string(),
            "emulators".to_string(),
            "datastore".to_string(),
            "start".to_string(),
            format!("--host-port=0.0.0.0:{DATASTORE_PORT}"),
            format!("--project={project_id}"),
            "--no-store-on-disk".to_string(),
            "--consistency=1.0".to_string(),
        ];
        let container =
            GenericImage::new("gcr.io/google.com/cloudsdktool/google-cloud-cli", "emulators")
                .with_exposed_port(DATASTORE_PORT.tcp())
                .with_wait_for(WaitFor::message_on_stderr("Dev App Server is now running"))
                .with_cmd(args)
                .start()
                .await
                .map_err(|err| format!("failed to start datastore emulator: {err}"))?;
        let port = container
            .get_host_port_ipv4(DATASTORE_PORT.tcp())
            .await
            .map_err(|err| format!("failed to resolve datastore emulator port: {err}"))?;
        Ok(Self {
            host: format!("127.0.0.1:{port}"),
            project_id,
            _container: Some(container),
        })
    }

    /// Settings pointing the driver at the fixture.
    pub fn settings(&self) -> DatastoreSettings {
        DatastoreSettings {
            project_id: self.project_id.clone(),
            emulator_host: Some(self.host.clone()),
            ..DatastoreSettings::default()
        }
    }
}

// ============================================================================
// SECTION: Docker
// ============================================================================

/// Fails early with a readable message when Docker is unreachable.
fn ensure_docker_available() -> Result<(), String> {
    let output = std::process::Command::new("docker")
        .arg("info")
        .output()
        .map_err(|err| format!("docker info failed: {err}"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("docker info failed: {stderr}"));
    }
    Ok(())
}
