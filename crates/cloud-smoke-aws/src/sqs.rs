// crates/cloud-smoke-aws/src/sqs.rs
// ============================================================================
// Module: SQS Tester
// Description: Queue lifecycle and one message round trip against SQS.
// Purpose: Create a queue, send, receive, and acknowledge a message.
// Dependencies: aws-sdk-sqs, async-trait, cloud-smoke-core
// ============================================================================

//! ## Overview
//! [`SqsTester`] addresses the queue by the URL returned from creation, so
//! cleanup is only armed once the queue exists. Receiving uses a single
//! long poll; an empty receive is logged and is not a failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sqs::Client;
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
pub const SQS_SERVICE_NAME: &str = "SQS";
/// Service codes meaning the queue is already gone.
pub const QUEUE_NOT_FOUND_CODES: &[&str] =
    &["AWS.SimpleQueueService.NonExistentQueue", "QueueDoesNotExist"];
/// Messages requested per receive.
pub const RECEIVE_MAX_MESSAGES: i32 = 1;
/// Long-poll wait in seconds.
pub const RECEIVE_WAIT_SECONDS: i32 = 5;

// ============================================================================
// SECTION: API Seam
// ============================================================================

/// A message taken from a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    /// Message body.
    pub body: String,
    /// Handle used to delete the message.
    pub receipt_handle: String,
}

/// Queue operations used by [`SqsTester`].
#[async_trait]
pub trait QueueApi: Send + Sync {
    /// Creates a queue and returns its URL.
    async fn create_queue(&self, name: &str) -> Result<String, ApiError>;
    /// Returns every queue URL.
    async fn list_queues(&self) -> Result<Vec<String>, ApiError>;
    /// Sends one message.
    async fn send_message(&self, queue_url: &str, body: &str) -> Result<(), ApiError>;
    /// Receives up to `max_messages`, waiting at most `wait_seconds`.
    async fn receive_messages(
        &self,
        queue_url: &str,
        max_messages: i32,
        wait_seconds: i32,
    ) -> Result<Vec<ReceivedMessage>, ApiError>;
    /// Deletes a received message.
    async fn delete_message(&self, queue_url: &str, receipt_handle: &str) -> Result<(), ApiError>;
    /// Deletes the queue.
    async fn delete_queue(&self, queue_url: &str) -> Result<(), ApiError>;
}

/// SDK-backed [`QueueApi`].
#[derive(Clone)]
pub struct SqsQueues {
    /// SQS client.
    client: Client,
}

impl SqsQueues {
    /// Builds a client from shared configuration.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl QueueApi for SqsQueues {
    async fn create_queue(&self, name: &str) -> Result<String, ApiError> {
        let output = self
            .client
            .create_queue()
            .queue_name(name)
            .send()
            .await
            .map_err(|err| api_error("CreateQueue", err))?;
        output.queue_url.ok_or_else(|| missing_field("CreateQueue", "QueueUrl"))
    }

    async fn list_queues(&self) -> Result<Vec<String>, ApiError> {
        let output =
            self.client.list_queues().send().await.map_err(|err| api_error("ListQueues", err))?;
        Ok(output.queue_urls.unwrap_or_default())
    }

    async fn send_message(&self, queue_url: &str, body: &str) -> Result<(), ApiError> {
        self.client
            .send_message()
            .queue_url(queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|err| api_error("SendMessage", err))?;
        Ok(())
    }

    async fn receive_messages(
        &self,
        queue_url: &str,
        max_messages: i32,
        wait_seconds: i32,
    ) -> Result<Vec<ReceivedMessage>, ApiError> {
        let output = self
            .client
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(wait_seconds)
            .send()
            .await
            .map_err(|err| api_error("ReceiveMessage", err))?;
        Ok(output
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|message| ReceivedMessage {
                body: message.body.unwrap_or_default(),
                receipt_handle: message.receipt_handle.unwrap_or_default(),
            })
            .collect())
    }

    async fn delete_message(&self, queue_url: &str, receipt_handle: &str) -> Result<(), ApiError> {
        self.client
            .delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|err| api_error("DeleteMessage", err))?;
        Ok(())
    }

    async fn delete_queue(&self, queue_url: &str) -> Result<(), ApiError> {
        self.client
            .delete_queue()
            .queue_url(queue_url)
            .send()
            .await
            .map_err(|err| api_error("DeleteQueue", err))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Scenario
// ============================================================================

/// Names and payload used by one SQS run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqsScenario {
    /// Queue name.
    pub queue: String,
    /// Message body.
    pub message: String,
}

impl Default for SqsScenario {
    fn default() -> Self {
        Self {
            queue: "TestQueue".to_string(),
            message: "Hello, this is a test message!".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Tester
// ============================================================================

/// Smoke tester for SQS.
pub struct SqsTester<A = SqsQueues> {
    /// Queue operations.
    api: A,
    /// Resource names.
    scenario: SqsScenario,
    /// `[SQS]` logger.
    logger: PrefixedLogger,
}

impl<A: QueueApi> SqsTester<A> {
    /// Creates a tester with the default scenario.
    pub fn new(api: A) -> Self {
        Self {
            api,
            scenario: SqsScenario::default(),
            logger: PrefixedLogger::new(SQS_SERVICE_NAME),
        }
    }

    /// Replaces the scenario.
    #[must_use]
    pub fn with_scenario(mut self, scenario: SqsScenario) -> Self {
        self.scenario = scenario;
        self
    }

    /// Returns the underlying API.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Steps that run once the queue exists.
    async fn steps(&self, queue_url: &str) -> Result<(), TesterError> {
        self.list_queues().await?;
        self.send_message(queue_url, &self.scenario.message).await?;
        self.receive_messages(queue_url).await?;
        self.delete_queue(queue_url).await
    }

    /// Removes the queue if the sequence left it behind.
    async fn clean(&self, queue_url: &str) {
        self.logger.log("Start Cleaning Testing...");
        let result = self.delete_queue(queue_url).await;
        report_cleanup(
            &self.logger,
            result,
            QUEUE_NOT_FOUND_CODES,
            format_args!("Queue not found: {queue_url}"),
        );
        self.logger.log("Cleaning Testing Completed");
    }

    /// Creates the queue and returns its URL.
    async fn create_queue(&self, name: &str) -> Result<String, TesterError> {
        self.logger.log(format_args!("Creating Queue: {name}"));
        let queue_url = self
            .api
            .create_queue(name)
            .await
            .map_err(|err| TesterError::step(format!("create {name} queue"), err))?;
        self.logger.log(format_args!("Queue {name} created successfully: {queue_url}"));
        Ok(queue_url)
    }

    /// Lists every queue.
    async fn list_queues(&self) -> Result<(), TesterError> {
        self.logger.log("List Queues");
        let urls =
            self.api.list_queues().await.map_err(|err| TesterError::step("list queues", err))?;
        self.logger.log("Queues:");
        for (index, url) in urls.iter().enumerate() {
            self.logger.log(format_args!("  {}. {url}", index + 1));
        }
        Ok(())
    }

    /// Sends the scenario message.
    async fn send_message(&self, queue_url: &str, body: &str) -> Result<(), TesterError> {
        self.logger.log(format_args!("Sending Message to Queue: {queue_url}"));
        self.logger.log(format_args!("Sending message: {body}"));
        self.api
            .send_message(queue_url, body)
            .await
            .map_err(|err| TesterError::step(format!("send message to queue {queue_url}"), err))?;
        self.logger.log("Message sent successfully");
        Ok(())
    }

    /// Receives and acknowledges waiting messages.
    async fn receive_messages(&self, queue_url: &str) -> Result<(), TesterError> {
        self.logger.log(format_args!("Receiving Messages from Queue: {queue_url}"));
        let messages = self
            .api
            .receive_messages(queue_url, RECEIVE_MAX_MESSAGES, RECEIVE_WAIT_SECONDS)
            .await
            .map_err(|err| {
                TesterError::step(format!("receive messages from queue {queue_url}"), err)
            })?;
        if messages.is_empty() {
            self.logger.log("No messages received");
            return Ok(());
        }
        for message in messages {
            self.logger.log(format_args!("Received message: {}", message.body));
            self.delete_message(queue_url, &message.receipt_handle).await?;
        }
        Ok(())
    }

    /// Deletes one received message.
    async fn delete_message(
        &self,
        queue_url: &str,
        receipt_handle: &str,
    ) -> Result<(), TesterError> {
        self.logger.log(format_args!("Deleting Message from Queue: {queue_url}"));
        self.api.delete_message(queue_url, receipt_handle).await.map_err(|err| {
            TesterError::step(format!("delete message from queue {queue_url}"), err)
        })?;
        self.logger.log("Message deleted successfully");
        Ok(())
    }

    /// Deletes the queue.
    async fn delete_queue(&self, queue_url: &str) -> Result<(), TesterError> {
        self.logger.log(format_args!("Deleting Queue: {queue_url}"));
        self.api
            .delete_queue(queue_url)
            .await
            .map_err(|err| TesterError::step(format!("delete queue {queue_url}"), err))?;
        self.logger.log("Queue deleted successfully");
        Ok(())
    }
}

#[async_trait]
impl<A: QueueApi> Tester for SqsTester<A> {
    fn name(&self) -> &'static str {
        SQS_SERVICE_NAME
    }

    async fn run(&self) -> Result<(), TesterError> {
        self.logger.log("Start Testing...");
        let queue_url = self.create_queue(&self.scenario.queue).await?;
        let outcome = self.steps(&queue_url).await;
        if outcome.is_ok() {
            self.logger.log("Testing Completed.");
        }
        self.clean(&queue_url).await;
        outcome
    }
}
