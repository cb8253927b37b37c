// crates/cloud-smoke-aws/src/sns.rs
// ============================================================================
// Module: SNS Tester
// Description: Topic lifecycle, subscription, and publish against SNS.
// Purpose: Create a topic, subscribe an endpoint, publish, and delete.
// Dependencies: aws-sdk-sns, async-trait, cloud-smoke-core
// ============================================================================

//! ## Overview
//! [`SnsTester`] addresses the topic by its ARN. The subscription endpoint
//! is never confirmed, so the subscription stays pending and disappears
//! with the topic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sns::Client;
use cloud_smoke_core::ApiError;
use cloud_smoke_core::PrefixedLogger;
use cloud_smoke_core::Tester;
use cloud_smoke_core::TesterError;
use cloud_smoke_core::report_cleanup;

use crate::error::api_error;
use crate::error::missing_field;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Logger prefix and tester name.
pub const SNS_SERVICE_NAME: &str = "SNS";
/// Service codes meaning the topic is already gone.
pub const TOPIC_NOT_FOUND_CODES: &[&str] = &["NotFound"];

// ============================================================================
// SECTION: API Seam
// ============================================================================

/// Topic operations used by [`SnsTester`].
#[async_trait]
pub trait TopicApi: Send + Sync {
    /// Creates a topic and returns its ARN.
    async fn create_topic(&self, name: &str) -> Result<String, ApiError>;
    /// Subscribes `endpoint` over `protocol`.
    async fn subscribe(
        &self,
        topic_arn: &str,
        protocol: &str,
        endpoint: &str,
    ) -> Result<(), ApiError>;
    /// Returns the subscription ARNs of a topic.
    async fn list_subscriptions(&self, topic_arn: &str) -> Result<Vec<String>, ApiError>;
    /// Publishes one message.
    async fn publish(&self, topic_arn: &str, message: &str) -> Result<(), ApiError>;
    /// Returns every topic ARN.
    async fn list_topics(&self) -> Result<Vec<String>, ApiError>;
    /// Deletes the topic.
    async fn delete_topic(&self, topic_arn: &str) -> Result<(), ApiError>;
}

/// SDK-backed [`TopicApi`].
#[derive(Clone)]
pub struct SnsTopics {
    /// SNS client.
    client: Client,
}

impl SnsTopics {
    /// Builds a client from shared configuration.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl TopicApi for SnsTopics {
    async fn create_topic(&self, name: &str) -> Result<String, ApiError> {
        let output = self
            .client
            .create_topic()
            .name(name)
            .send()
            .await
            .map_err(|err| api_error("CreateTopic", err))?;
        output.topic_arn.ok_or_else(|| missing_field("CreateTopic", "TopicArn"))
    }

    async fn subscribe(
        &self,
        topic_arn: &str,
        protocol: &str,
        endpoint: &str,
    ) -> Result<(), ApiError> {
        self.client
            .subscribe()
            .topic_arn(topic_arn)
            .protocol(protocol)
            .endpoint(endpoint)
            .send()
            .await
            .map_err(|err| api_error("Subscribe", err))?;
        Ok(())
    }

    async fn list_subscriptions(&self, topic_arn: &str) -> Result<Vec<String>, ApiError> {
        let output = self
            .client
            .list_subscriptions_by_topic()
            .topic_arn(topic_arn)
            .send()
            .await
            .map_err(|err| api_error("ListSubscriptionsByTopic", err))?;
        Ok(output
            .subscriptions()
            .iter()
            .filter_map(|subscription| subscription.subscription_arn().map(str::to_string))
            .collect())
    }

    async fn publish(&self, topic_arn: &str, message: &str) -> Result<(), ApiError> {
        self.client
            .publish()
            .topic_arn(topic_arn)
            .message(message)
            .send()
            .await
            .map_err(|err| api_error("Publish", err))?;
        Ok(())
    }

    async fn list_topics(&self) -> Result<Vec<String>, ApiError> {
        let output =
            self.client.list_topics().send().await.map_err(|err| api_error("ListTopics", err))?;
        Ok(output
            .topics()
            .iter()
            .filter_map(|topic| topic.topic_arn().map(str::to_string))
            .collect())
    }

    async fn delete_topic(&self, topic_arn: &str) -> Result<(), ApiError> {
        self.client
            .delete_topic()
            .topic_arn(topic_arn)
            .send()
            .await
            .map_err(|err| api_error("DeleteTopic", err))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Scenario
// ============================================================================

/// Names and payload used by one SNS run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnsScenario {
    /// Topic name.
    pub topic: String,
    /// Published message.
    pub message: String,
    /// Subscription protocol (`email`, `http`, `sqs`, ...).
    pub protocol: String,
    /// Subscription endpoint for the protocol.
    pub endpoint: String,
}

impl Default for SnsScenario {
    fn default() -> Self {
        Self {
            topic: "TestTopic".to_string(),
            message: "Hello, this is a test message!".to_string(),
            protocol: "email".to_string(),
            endpoint: "example@example.com".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Tester
// ============================================================================

/// Smoke tester for SNS.
pub struct SnsTester<A = SnsTopics> {
    /// Topic operations.
    api: A,
    /// Resource names.
    scenario: SnsScenario,
    /// `[SNS]` logger.
    logger: PrefixedLogger,
}

impl<A: TopicApi> SnsTester<A> {
    /// Creates a tester with the default scenario.
    pub fn new(api: A) -> Self {
        Self {
            api,
            scenario: SnsScenario::default(),
            logger: PrefixedLogger::new(SNS_SERVICE_NAME),
        }
    }

    /// Replaces the scenario.
    #[must_use]
    pub fn with_scenario(mut self, scenario: SnsScenario) -> Self {
        self.scenario = scenario;
        self
    }

    /// Returns the underlying API.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Steps that run once the topic exists.
    async fn steps(&self, topic_arn: &str) -> Result<(), TesterError> {
        let SnsScenario {
            message,
            protocol,
            endpoint,
            ..
        } = &self.scenario;
        self.subscribe(topic_arn, protocol, endpoint).await?;
        self.list_subscriptions(topic_arn).await?;
        self.publish_message(topic_arn, message).await?;
        self.list_topics().await?;
        self.delete_topic(topic_arn).await
    }

    /// Removes the topic if the sequence left it behind.
    async fn clean(&self, topic_arn: &str) {
        self.logger.log("Start Cleaning Testing...");
        let result = self.delete_topic(topic_arn).await;
        report_cleanup(
            &self.logger,
            result,
            TOPIC_NOT_FOUND_CODES,
            format_args!("Topic not found: {topic_arn}"),
        );
        self.logger.log("Testing Cleaning Completed");
    }

    /// Creates the topic and returns its ARN.
    async fn create_topic(&self, name: &str) -> Result<String, TesterError> {
        self.logger.log(format_args!("Creating Topic: {name}"));
        let topic_arn = self
            .api
            .create_topic(name)
            .await
            .map_err(|err| TesterError::step(format!("create topic {name}"), err))?;
        self.logger.log(format_args!("Topic {name} created successfully: {topic_arn}"));
        Ok(topic_arn)
    }

    /// Subscribes the scenario endpoint.
    async fn subscribe(
        &self,
        topic_arn: &str,
        protocol: &str,
        endpoint: &str,
    ) -> Result<(), TesterError> {
        self.logger.log(format_args!("Subscribing to Topic: {topic_arn}"));
        self.api
            .subscribe(topic_arn, protocol, endpoint)
            .await
            .map_err(|err| TesterError::step(format!("subscribe to topic {topic_arn}"), err))?;
        self.logger.log("Subscription request sent successfully");
        Ok(())
    }

    /// Lists the topic's subscriptions.
    async fn list_subscriptions(&self, topic_arn: &str) -> Result<(), TesterError> {
        self.logger.log(format_args!("Listing Subscriptions for Topic: {topic_arn}"));
        let subscriptions = self.api.list_subscriptions(topic_arn).await.map_err(|err| {
            TesterError::step(format!("list subscriptions for topic {topic_arn}"), err)
        })?;
        self.logger.log("Subscriptions:");
        for (index, arn) in subscriptions.iter().enumerate() {
            self.logger.log(format_args!("  {}. {arn}", index + 1));
        }
        Ok(())
    }

    /// Publishes the scenario message.
    async fn publish_message(&self, topic_arn: &str, message: &str) -> Result<(), TesterError> {
        self.logger.log(format_args!("Publishing Message to Topic: {topic_arn}"));
        self.logger.log(format_args!("Sending message: {message}"));
        self.api.publish(topic_arn, message).await.map_err(|err| {
            TesterError::step(format!("publish message to topic {topic_arn}"), err)
        })?;
        self.logger.log("Message published successfully");
        Ok(())
    }

    /// Lists every topic.
    async fn list_topics(&self) -> Result<(), TesterError> {
        self.logger.log("Listing Topics");
        let topics =
            self.api.list_topics().await.map_err(|err| TesterError::step("list topics", err))?;
        self.logger.log("Topics:");
        for (index, arn) in topics.iter().enumerate() {
            self.logger.log(format_args!("  {}. {arn}", index + 1));
        }
        Ok(())
    }

    /// Deletes the topic.
    async fn delete_topic(&self, topic_arn: &str) -> Result<(), TesterError> {
        self.logger.log(format_args!("Deleting Topic: {topic_arn}"));
        self.api
            .delete_topic(topic_arn)
            .await
            .map_err(|err| TesterError::step(format!("delete topic {topic_arn}"), err))?;
        self.logger.log("Topic deleted successfully");
        Ok(())
    }
}

#[async_trait]
impl<A: TopicApi> Tester for SnsTester<A> {
    fn name(&self) -> &'static str {
        SNS_SERVICE_NAME
    }

    async fn run(&self) -> Result<(), TesterError> {
        self.logger.log("Running Testing...");
        let topic_arn = self.create_topic(&self.scenario.topic).await?;
        let outcome = self.steps(&topic_arn).await;
        if outcome.is_ok() {
            self.logger.log("Testing Completed");
        }
        self.clean(&topic_arn).await;
        outcome
    }
}
