// crates/cloud-smoke-aws/src/s3.rs
// ============================================================================
// Module: S3 Tester
// Description: Bucket and object round trip against S3.
// Purpose: Create a bucket, write and read an object, and remove both.
// Dependencies: aws-sdk-s3, async-trait, cloud-smoke-core
// ============================================================================

//! ## Overview
//! [`S3Tester`] drives the bucket lifecycle through [`BucketApi`]. The
//! SDK-backed [`S3Buckets`] uses path-style addressing by default so bucket
//! names never have to resolve as DNS labels against an emulator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::BucketLocationConstraint;
use aws_sdk_s3::types::CreateBucketConfiguration;
use cloud_smoke_core::ApiError;
use cloud_smoke_core::PrefixedLogger;
use cloud_smoke_core::Tester;
use cloud_smoke_core::TesterError;
use cloud_smoke_core::config::DEFAULT_REGION;
use cloud_smoke_core::report_cleanup;

use crate::error::api_error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Logger prefix and tester name.
pub const S3_SERVICE_NAME: &str = "S3";
/// Service codes meaning the bucket is already gone.
pub const BUCKET_NOT_FOUND_CODES: &[&str] = &["NoSuchBucket"];

// ============================================================================
// SECTION: API Seam
// ============================================================================

/// Bucket and object operations used by [`S3Tester`].
#[async_trait]
pub trait BucketApi: Send + Sync {
    /// Creates a bucket.
    async fn create_bucket(&self, bucket: &str) -> Result<(), ApiError>;
    /// Returns the names of all buckets.
    async fn list_buckets(&self) -> Result<Vec<String>, ApiError>;
    /// Stores `body` under `key`.
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), ApiError>;
    /// Returns the keys in a bucket.
    async fn list_objects(&self, bucket: &str) -> Result<Vec<String>, ApiError>;
    /// Reads the full body of an object.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ApiError>;
    /// Deletes one object.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ApiError>;
    /// Deletes an empty bucket.
    async fn delete_bucket(&self, bucket: &str) -> Result<(), ApiError>;
}

/// SDK-backed [`BucketApi`].
#[derive(Clone)]
pub struct S3Buckets {
    /// S3 client.
    client: Client,
}

impl S3Buckets {
    /// Builds a client from shared configuration.
    #[must_use]
    pub fn new(config: &SdkConfig, force_path_style: bool) -> Self {
        let s3_config =
            aws_sdk_s3::config::Builder::from(config).force_path_style(force_path_style).build();
        Self {
            client: Client::from_conf(s3_config),
        }
    }

    /// Location constraint for regions other than the default one.
    fn location(&self) -> Option<CreateBucketConfiguration> {
        let region = self.client.config().region()?.as_ref();
        if region == DEFAULT_REGION {
            return None;
        }
        Some(
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region))
                .build(),
        )
    }
}

#[async_trait]
impl BucketApi for S3Buckets {
    async fn create_bucket(&self, bucket: &str) -> Result<(), ApiError> {
        self.client
            .create_bucket()
            .bucket(bucket)
            .set_create_bucket_configuration(self.location())
            .send()
            .await
            .map_err(|err| api_error("CreateBucket", err))?;
        Ok(())
    }

    async fn list_buckets(&self) -> Result<Vec<String>, ApiError> {
        let output =
            self.client.list_buckets().send().await.map_err(|err| api_error("ListBuckets", err))?;
        Ok(output.buckets().iter().filter_map(|bucket| bucket.name().map(str::to_string)).collect())
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), ApiError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| api_error("PutObject", err))?;
        Ok(())
    }

    async fn list_objects(&self, bucket: &str) -> Result<Vec<String>, ApiError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .send()
            .await
            .map_err(|err| api_error("ListObjectsV2", err))?;
        Ok(output.contents().iter().filter_map(|object| object.key().map(str::to_string)).collect())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ApiError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| api_error("GetObject", err))?;
        let body = output
            .body
            .collect()
            .await
            .map_err(|err| ApiError::new("GetObject", format!("failed to read body: {err}")))?;
        Ok(body.into_bytes().to_vec())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ApiError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| api_error("DeleteObject", err))?;
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), ApiError> {
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|err| api_error("DeleteBucket", err))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Scenario
// ============================================================================

/// Names and payload used by one S3 run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Scenario {
    /// Bucket to create and delete.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Object body.
    pub content: String,
}

impl Default for S3Scenario {
    fn default() -> Self {
        Self {
            bucket: "test-bucket".to_string(),
            key: "test-file.txt".to_string(),
            content: "Hello, this is a test file!".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Tester
// ============================================================================

/// Smoke tester for S3.
pub struct S3Tester<A = S3Buckets> {
    /// Bucket operations.
    api: A,
    /// Resource names.
    scenario: S3Scenario,
    /// `[S3]` logger.
    logger: PrefixedLogger,
}

impl<A: BucketApi> S3Tester<A> {
    /// Creates a tester with the default scenario.
    pub fn new(api: A) -> Self {
        Self {
            api,
            scenario: S3Scenario::default(),
            logger: PrefixedLogger::new(S3_SERVICE_NAME),
        }
    }

    /// Replaces the scenario.
    #[must_use]
    pub fn with_scenario(mut self, scenario: S3Scenario) -> Self {
        self.scenario = scenario;
        self
    }

    /// Returns the underlying API.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Runs the scripted steps, stopping at the first failure.
    async fn steps(&self) -> Result<(), TesterError> {
        let S3Scenario {
            bucket,
            key,
            content,
        } = &self.scenario;
        self.create_bucket(bucket).await?;
        self.list_buckets().await?;
        self.upload_file(bucket, key, content).await?;
        self.list_objects(bucket).await?;
        self.download_file(bucket, key, content).await?;
        self.delete_bucket(bucket).await
    }

    /// Removes the bucket if the sequence left it behind.
    async fn clean(&self) {
        self.logger.log("Start Cleaning Testing...");
        let bucket = &self.scenario.bucket;
        let result = self.delete_bucket(bucket).await;
        report_cleanup(
            &self.logger,
            result,
            BUCKET_NOT_FOUND_CODES,
            format_args!("Bucket {bucket} not found"),
        );
        self.logger.log("Cleaning Testing Complete");
    }

    /// Creates the bucket.
    async fn create_bucket(&self, bucket: &str) -> Result<(), TesterError> {
        self.logger.log(format_args!("Creating Bucket: {bucket}"));
        self.api
            .create_bucket(bucket)
            .await
            .map_err(|err| TesterError::step(format!("create bucket {bucket}"), err))?;
        self.logger.log(format_args!("Bucket {bucket} created successfully"));
        Ok(())
    }

    /// Lists every bucket.
    async fn list_buckets(&self) -> Result<(), TesterError> {
        self.logger.log("Listing Buckets");
        let buckets =
            self.api.list_buckets().await.map_err(|err| TesterError::step("list buckets", err))?;
        self.logger.log("Buckets:");
        for (index, name) in buckets.iter().enumerate() {
            self.logger.log(format_args!("  {}. {name}", index + 1));
        }
        Ok(())
    }

    /// Uploads the object.
    async fn upload_file(&self, bucket: &str, key: &str, content: &str) -> Result<(), TesterError> {
        self.logger.log(format_args!("Uploading File to Bucket: {bucket}, Key: {key}"));
        self.api.put_object(bucket, key, content.as_bytes().to_vec()).await.map_err(|err| {
            TesterError::step(format!("upload file {key} to bucket {bucket}"), err)
        })?;
        self.logger.log("File uploaded successfully");
        Ok(())
    }

    /// Lists the bucket's objects.
    async fn list_objects(&self, bucket: &str) -> Result<(), TesterError> {
        self.logger.log(format_args!("Listing Objects in Bucket: {bucket}"));
        let keys = self
            .api
            .list_objects(bucket)
            .await
            .map_err(|err| TesterError::step(format!("list objects in bucket {bucket}"), err))?;
        self.logger.log("Objects:");
        for (index, key) in keys.iter().enumerate() {
            self.logger.log(format_args!("  {}. {key}", index + 1));
        }
        Ok(())
    }

    /// Downloads the object and compares it with what was uploaded.
    async fn download_file(
        &self,
        bucket: &str,
        key: &str,
        expected: &str,
    ) -> Result<(), TesterError> {
        self.logger.log(format_args!("Downloading File from Bucket: {bucket}, Key: {key}"));
        let body = self.api.get_object(bucket, key).await.map_err(|err| {
            TesterError::step(format!("download file {key} from bucket {bucket}"), err)
        })?;
        let text = String::from_utf8_lossy(&body);
        self.logger.log(format_args!("Downloaded file content: {text}"));
        if body != expected.as_bytes() {
            return Err(TesterError::mismatch(format!("object {key} content"), expected, text));
        }
        Ok(())
    }

    /// Deletes every object and then the bucket.
    async fn delete_bucket(&self, bucket: &str) -> Result<(), TesterError> {
        self.logger.log(format_args!("Deleting Bucket: {bucket}"));
        self.delete_all_objects(bucket).await?;
        self.api
            .delete_bucket(bucket)
            .await
            .map_err(|err| TesterError::step(format!("delete bucket {bucket}"), err))?;
        self.logger.log("Bucket deleted successfully");
        Ok(())
    }

    /// Empties the bucket; S3 refuses to delete a bucket with objects.
    async fn delete_all_objects(&self, bucket: &str) -> Result<(), TesterError> {
        self.logger.log(format_args!("Deleting all objects in Bucket: {bucket}"));
        let keys = self
            .api
            .list_objects(bucket)
            .await
            .map_err(|err| TesterError::step(format!("list objects in bucket {bucket}"), err))?;
        for key in keys {
            self.api
                .delete_object(bucket, &key)
                .await
                .map_err(|err| TesterError::step(format!("delete object {key}"), err))?;
            self.logger.log(format_args!("Deleted object {key}"));
        }
        Ok(())
    }
}

#[async_trait]
impl<A: BucketApi> Tester for S3Tester<A> {
    fn name(&self) -> &'static str {
        S3_SERVICE_NAME
    }

    async fn run(&self) -> Result<(), TesterError> {
        self.logger.log("Start Testing...");
        let outcome = self.steps().await;
        if outcome.is_ok() {
            self.logger.log("Testing Completed.");
        }
        self.clean().await;
        outcome
    }
}
