// crates/cloud-smoke-aws/src/registry.rs
// ============================================================================
// Module: AWS Tester Registry
// Description: Maps selected services to SDK-backed testers.
// Purpose: Build the runner's tester list from one shared SdkConfig.
// Dependencies: aws-config, cloud-smoke-core
// ============================================================================

//! ## Overview
//! Maps selected services to SDK-backed testers built from one shared
//! [`SdkConfig`].

use std::sync::Arc;

use aws_config::SdkConfig;
use cloud_smoke_core::AwsSettings;
use cloud_smoke_core::Service;
use cloud_smoke_core::Tester;

use crate::dynamodb::DynamoDbTester;
use crate::dynamodb::DynamoTables;
use crate::s3::S3Buckets;
use crate::s3::S3Tester;
use crate::secretsmanager::SecretsManagerTester;
use crate::secretsmanager::SmSecrets;
use crate::sns::SnsTester;
use crate::sns::SnsTopics;
use crate::sqs::SqsQueues;
use crate::sqs::SqsTester;

/// Builds testers for the AWS services in `services`, in the given order.
///
/// Services outside AWS are skipped; the caller registers those separately.
#[must_use]
pub fn build_testers(
    config: &SdkConfig,
    settings: &AwsSettings,
    services: &[Service],
) -> Vec<Arc<dyn Tester>> {
    services
        .iter()
        .filter_map(|service| -> Option<Arc<dyn Tester>> {
            match service {
                Service::S3 => {
                    Some(Arc::new(S3Tester::new(S3Buckets::new(config, settings.force_path_style))))
                }
                Service::Sqs => Some(Arc::new(SqsTester::new(SqsQueues::new(config)))),
                Service::Sns => Some(Arc::new(SnsTester::new(SnsTopics::new(config)))),
                Service::Dynamodb => Some(Arc::new(DynamoDbTester::new(DynamoTables::new(config)))),
                Service::Secretsmanager => {
                    Some(Arc::new(SecretsManagerTester::new(SmSecrets::new(config))))
                }
                Service::Datastore => None,
            }
        })
        .collect()
}
