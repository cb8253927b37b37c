// crates/cloud-smoke-aws/src/sdk.rs
// ============================================================================
// Module: AWS SDK Configuration
// Description: Loads the shared SdkConfig for every AWS service client.
// Purpose: Point all clients at live AWS or at one emulated endpoint.
// Dependencies: aws-config, cloud-smoke-core
// ============================================================================

//! ## Overview
//! Two modes, chosen by [`AwsSettings::effective_endpoint`]:
//! - region only: clients resolve the public AWS endpoints;
//! - region plus endpoint: every client resolves to the same URL.
//!
//! Credentials come from the standard provider chain (environment, profile,
//! container, instance metadata).

use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_config::SdkConfig;
use cloud_smoke_core::AwsSettings;
use cloud_smoke_core::ConfigError;
use cloud_smoke_core::PrefixedLogger;
use cloud_smoke_core::config::DEFAULT_PROFILE;

/// Loads the shared SDK configuration.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the region or endpoint is empty or malformed.
pub async fn load_sdk_config(settings: &AwsSettings) -> Result<SdkConfig, ConfigError> {
    let logger = PrefixedLogger::new("CONFIG");
    settings.validate()?;

    let region = Region::new(settings.region.clone());
    let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);
    if let Some(endpoint) = settings.effective_endpoint() {
        logger.log("Loading AWS configurations with endpoint");
        logger.log(format_args!("  Region: {}", settings.region));
        logger.log(format_args!("  Endpoint: {endpoint}"));
        loader = loader.endpoint_url(endpoint.trim());
    } else {
        logger.log("Loading AWS configurations");
        logger.log(format_args!("  Region: {}", settings.region));
    }
    if settings.profile != DEFAULT_PROFILE {
        logger.log(format_args!("  Profile: {}", settings.profile));
        loader = loader.profile_name(settings.profile.clone());
    }
    Ok(loader.load().await)
}
