// crates/cloud-smoke-aws/src/lib.rs
// ============================================================================
// Module: Cloud Smoke AWS
// Description: AWS SDK configuration and per-service smoke testers.
// Purpose: Exercise S3, SQS, SNS, DynamoDB, and Secrets Manager end to end.
// Dependencies: aws-config, aws-sdk-*, aws-smithy-types, cloud-smoke-core
// ============================================================================

//! ## Overview
//! Each service module defines a narrow async API trait (for example
//! [`BucketApi`]), an SDK-backed implementation of it, and a tester that
//! drives the scripted sequence through the trait. The SDK-backed
//! implementations share one [`aws_config::SdkConfig`], so a single endpoint
//! override (LocalStack) applies to every service.
//!
//! Invariants:
//! - Testers clean up after themselves whether or not the sequence passed.
//! - SDK errors keep their service error code (see [`cloud_smoke_core::ApiError`]).

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod dynamodb;
mod error;
pub mod registry;
pub mod s3;
pub mod sdk;
pub mod secretsmanager;
pub mod sns;
pub mod sqs;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use dynamodb::DynamoDbTester;
pub use dynamodb::DynamoTables;
pub use dynamodb::Item;
pub use dynamodb::TableApi;
pub use registry::build_testers;
pub use s3::BucketApi;
pub use s3::S3Buckets;
pub use s3::S3Tester;
pub use sdk::load_sdk_config;
pub use secretsmanager::SecretApi;
pub use secretsmanager::SecretsManagerTester;
pub use secretsmanager::SmSecrets;
pub use sns::SnsTester;
pub use sns::SnsTopics;
pub use sns::TopicApi;
pub use sqs::QueueApi;
pub use sqs::ReceivedMessage;
pub use sqs::SqsQueues;
pub use sqs::SqsTester;
