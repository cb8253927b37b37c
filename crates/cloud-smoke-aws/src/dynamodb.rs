// crates/cloud-smoke-aws/src/dynamodb.rs
// ============================================================================
// Module: DynamoDB Tester
// Description: Table lifecycle and item CRUD against DynamoDB.
// Purpose: Create a table, write, read, update, and delete one item.
// Dependencies: aws-sdk-dynamodb, async-trait, thiserror, cloud-smoke-core
// ============================================================================

//! ## Overview
//! The table is keyed by a single string hash attribute `ID` and billed on
//! demand. [`Item`] converts to and from attribute maps explicitly; a missing
//! or non-string attribute is an [`ItemDecodeError`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::client::Waiters;
use aws_sdk_dynamodb::types::AttributeDefinition;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::types::BillingMode;
use aws_sdk_dynamodb::types::KeySchemaElement;
use aws_sdk_dynamodb::types::KeyType;
use aws_sdk_dynamodb::types::ReturnValue;
use aws_sdk_dynamodb::types::ScalarAttributeType;
use aws_smithy_types::error::display::DisplayErrorContext;
use cloud_smoke_core::ApiError;
use cloud_smoke_core::PrefixedLogger;
use cloud_smoke_core::Tester;
use cloud_smoke_core::TesterError;
use cloud_smoke_core::report_cleanup;
use thiserror::Error;

use crate::error::api_error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Logger prefix and tester name.
pub const DYNAMODB_SERVICE_NAME: &str = "DynamoDB";
/// Service codes meaning the table is already gone.
pub const TABLE_NOT_FOUND_CODES: &[&str] = &["ResourceNotFoundException"];
/// Hash key attribute name.
pub const ID_ATTRIBUTE: &str = "ID";
/// Name attribute.
pub const NAME_ATTRIBUTE: &str = "Name";
/// Longest wait for a new table to become active.
const TABLE_ACTIVE_TIMEOUT: Duration = Duration::from_secs(60);

/// DynamoDB attribute map.
pub type AttributeMap = HashMap<String, AttributeValue>;

// ============================================================================
// SECTION: Item
// ============================================================================

/// Item stored by the tester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Hash key.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Attribute map could not be read as an [`Item`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemDecodeError {
    /// Required attribute absent.
    #[error("missing attribute {0}")]
    Missing(&'static str),
    /// Attribute present with a non-string type.
    #[error("attribute {0} is not a string")]
    NotString(&'static str),
}

impl Item {
    /// Builds an item.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Converts the item into an attribute map.
    #[must_use]
    pub fn to_attributes(&self) -> AttributeMap {
        HashMap::from([
            (ID_ATTRIBUTE.to_string(), AttributeValue::S(self.id.clone())),
            (NAME_ATTRIBUTE.to_string(), AttributeValue::S(self.name.clone())),
        ])
    }

    /// Reads an item from an attribute map; extra attributes are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ItemDecodeError`] when `ID` or `Name` is missing or not a string.
    pub fn from_attributes(attributes: &AttributeMap) -> Result<Self, ItemDecodeError> {
        Ok(Self {
            id: string_attribute(attributes, ID_ATTRIBUTE)?,
            name: string_attribute(attributes, NAME_ATTRIBUTE)?,
        })
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ID:{} Name:{}}}", self.id, self.name)
    }
}

/// Reads one string attribute.
fn string_attribute(
    attributes: &AttributeMap,
    name: &'static str,
) -> Result<String, ItemDecodeError> {
    let value = attributes.get(name).ok_or(ItemDecodeError::Missing(name))?;
    value.as_s().map(String::clone).map_err(|_| ItemDecodeError::NotString(name))
}

/// Key map addressing one item.
fn key_of(id: &str) -> AttributeMap {
    HashMap::from([(ID_ATTRIBUTE.to_string(), AttributeValue::S(id.to_string()))])
}

// ============================================================================
// SECTION: API Seam
// ============================================================================

/// Table and item operations used by [`DynamoDbTester`].
#[async_trait]
pub trait TableApi: Send + Sync {
    /// Creates a table keyed by a string `ID` hash key and waits until it is usable.
    async fn create_table(&self, table: &str) -> Result<(), ApiError>;
    /// Returns every table name.
    async fn list_tables(&self) -> Result<Vec<String>, ApiError>;
    /// Writes an item.
    async fn put_item(&self, table: &str, item: AttributeMap) -> Result<(), ApiError>;
    /// Reads an item by id; `None` when absent.
    async fn get_item(&self, table: &str, id: &str) -> Result<Option<AttributeMap>, ApiError>;
    /// Sets the `Name` attribute and returns the updated attributes.
    async fn update_name(
        &self,
        table: &str,
        id: &str,
        name: &str,
    ) -> Result<AttributeMap, ApiError>;
    /// Deletes an item by id.
    async fn delete_item(&self, table: &str, id: &str) -> Result<(), ApiError>;
    /// Deletes the table.
    async fn delete_table(&self, table: &str) -> Result<(), ApiError>;
}

/// SDK-backed [`TableApi`].
#[derive(Clone)]
pub struct DynamoTables {
    /// DynamoDB client.
    client: Client,
}

impl DynamoTables {
    /// Builds a client from shared configuration.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl TableApi for DynamoTables {
    async fn create_table(&self, table: &str) -> Result<(), ApiError> {
        let key = KeySchemaElement::builder()
            .attribute_name(ID_ATTRIBUTE)
            .key_type(KeyType::Hash)
            .build()
            .map_err(|err| ApiError::new("CreateTable", err.to_string()))?;
        let attribute = AttributeDefinition::builder()
            .attribute_name(ID_ATTRIBUTE)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(|err| ApiError::new("CreateTable", err.to_string()))?;
        self.client
            .create_table()
            .table_name(table)
            .key_schema(key)
            .attribute_definitions(attribute)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await
            .map_err(|err| api_error("CreateTable", err))?;
        self.client
            .wait_until_table_exists()
            .table_name(table)
            .wait(TABLE_ACTIVE_TIMEOUT)
            .await
            .map_err(|err| {
                ApiError::new("DescribeTable", DisplayErrorContext(&err).to_string())
            })?;
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<String>, ApiError> {
        let output =
            self.client.list_tables().send().await.map_err(|err| api_error("ListTables", err))?;
        Ok(output.table_names.unwrap_or_default())
    }

    async fn put_item(&self, table: &str, item: AttributeMap) -> Result<(), ApiError> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|err| api_error("PutItem", err))?;
        Ok(())
    }

    async fn get_item(&self, table: &str, id: &str) -> Result<Option<AttributeMap>, ApiError> {
        let output = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(key_of(id)))
            .send()
            .await
            .map_err(|err| api_error("GetItem", err))?;
        Ok(output.item)
    }

    async fn update_name(
        &self,
        table: &str,
        id: &str,
        name: &str,
    ) -> Result<AttributeMap, ApiError> {
        let output = self
            .client
            .update_item()
            .table_name(table)
            .set_key(Some(key_of(id)))
            .update_expression("set #n = :name")
            .expression_attribute_names("#n", NAME_ATTRIBUTE)
            .expression_attribute_values(":name", AttributeValue::S(name.to_string()))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(|err| api_error("UpdateItem", err))?;
        Ok(output.attributes.unwrap_or_default())
    }

    async fn delete_item(&self, table: &str, id: &str) -> Result<(), ApiError> {
        self.client
            .delete_item()
            .table_name(table)
            .set_key(Some(key_of(id)))
            .send()
            .await
            .map_err(|err| api_error("DeleteItem", err))?;
        Ok(())
    }

    async fn delete_table(&self, table: &str) -> Result<(), ApiError> {
        self.client
            .delete_table()
            .table_name(table)
            .send()
            .await
            .map_err(|err| api_error("DeleteTable", err))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Scenario
// ============================================================================

/// Names and data used by one DynamoDB run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamoDbScenario {
    /// Table name.
    pub table: String,
    /// Item written first.
    pub item: Item,
    /// Name written by the update step.
    pub new_name: String,
}

impl Default for DynamoDbScenario {
    fn default() -> Self {
        Self {
            table: "TestTable".to_string(),
            item: Item::new("123", "Sample Item"),
            new_name: "Sample2".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Tester
// ============================================================================

/// Smoke tester for DynamoDB.
pub struct DynamoDbTester<A = DynamoTables> {
    /// Table operations.
    api: A,
    /// Resource names.
    scenario: DynamoDbScenario,
    /// `[DynamoDB]` logger.
    logger: PrefixedLogger,
}

impl<A: TableApi> DynamoDbTester<A> {
    /// Creates a tester with the default scenario.
    pub fn new(api: A) -> Self {
        Self {
            api,
            scenario: DynamoDbScenario::default(),
            logger: PrefixedLogger::new(DYNAMODB_SERVICE_NAME),
        }
    }

    /// Replaces the scenario.
    #[must_use]
    pub fn with_scenario(mut self, scenario: DynamoDbScenario) -> Self {
        self.scenario = scenario;
        self
    }

    /// Returns the underlying API.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Runs the scripted steps, stopping at the first failure.
    async fn steps(&self) -> Result<(), TesterError> {
        let DynamoDbScenario {
            table,
            item,
            new_name,
        } = &self.scenario;
        self.create_table(table).await?;
        self.list_tables().await?;
        self.put_item(table, item).await?;
        self.get_item(table, item).await?;
        self.update_item(table, &item.id, new_name).await?;
        self.delete_item(table, &item.id).await?;
        self.delete_table(table).await
    }

    /// Removes the table if the sequence left it behind.
    async fn clean(&self) {
        self.logger.log("Start cleaning tests...");
        let table = &self.scenario.table;
        let result = self.delete_table(table).await;
        report_cleanup(
            &self.logger,
            result,
            TABLE_NOT_FOUND_CODES,
            format_args!("Table {table} not found"),
        );
        self.logger.log("Tests cleaning completed.");
    }

    /// Creates the table.
    async fn create_table(&self, table: &str) -> Result<(), TesterError> {
        self.logger.log(format_args!("Creating \"{table}\" Table"));
        self.api
            .create_table(table)
            .await
            .map_err(|err| TesterError::step(format!("create table {table}"), err))?;
        self.logger.log(format_args!("Table \"{table}\" created successfully"));
        Ok(())
    }

    /// Lists every table.
    async fn list_tables(&self) -> Result<(), TesterError> {
        self.logger.log("Listing Tables");
        let tables =
            self.api.list_tables().await.map_err(|err| TesterError::step("list tables", err))?;
        if tables.is_empty() {
            self.logger.log("No tables found.");
            return Ok(());
        }
        self.logger.log("Tables:");
        for (index, name) in tables.iter().enumerate() {
            self.logger.log(format_args!("  {}. {name}", index + 1));
        }
        Ok(())
    }

    /// Writes the scenario item.
    async fn put_item(&self, table: &str, item: &Item) -> Result<(), TesterError> {
        self.logger.log(format_args!("Putting Item {item} to {table} Table"));
        self.api
            .put_item(table, item.to_attributes())
            .await
            .map_err(|err| TesterError::step(format!("put item in table {table}"), err))?;
        self.logger.log("Item put successfully");
        Ok(())
    }

    /// Reads the item back and compares it with what was written.
    async fn get_item(&self, table: &str, expected: &Item) -> Result<(), TesterError> {
        self.logger.log(format_args!("Getting Item {} from Table: {table}", expected.id));
        let attributes = self
            .api
            .get_item(table, &expected.id)
            .await
            .map_err(|err| TesterError::step(format!("get item from table {table}"), err))?;
        let Some(attributes) = attributes else {
            self.logger.log("Item not found");
            return Ok(());
        };
        let item = Item::from_attributes(&attributes)
            .map_err(|err| TesterError::step("unmarshal item", err))?;
        self.logger.log(format_args!("Retrieved item: {item}"));
        if &item != expected {
            return Err(TesterError::mismatch("item", expected.to_string(), item.to_string()));
        }
        Ok(())
    }

    /// Renames the item and checks the returned attributes.
    async fn update_item(&self, table: &str, id: &str, new_name: &str) -> Result<(), TesterError> {
        self.logger
            .log(format_args!("Updating Item {id} With New Name \"{new_name}\" in Table: {table}"));
        let updated = self
            .api
            .update_name(table, id, new_name)
            .await
            .map_err(|err| TesterError::step(format!("update item in table {table}"), err))?;
        let name = string_attribute(&updated, NAME_ATTRIBUTE)
            .map_err(|err| TesterError::step("read updated attributes", err))?;
        if name != new_name {
            return Err(TesterError::mismatch("updated name", new_name, name));
        }
        self.logger.log("Item updated successfully");
        Ok(())
    }

    /// Deletes the item.
    async fn delete_item(&self, table: &str, id: &str) -> Result<(), TesterError> {
        self.logger.log(format_args!("Deleting Item {id} from Table: {table}"));
        self.api
            .delete_item(table, id)
            .await
            .map_err(|err| TesterError::step(format!("delete item from table {table}"), err))?;
        self.logger.log(format_args!("Item {id} deleted successfully"));
        Ok(())
    }

    /// Deletes the table.
    async fn delete_table(&self, table: &str) -> Result<(), TesterError> {
        self.logger.log(format_args!("Deleting Table: {table}"));
        self.api
            .delete_table(table)
            .await
            .map_err(|err| TesterError::step(format!("delete table {table}"), err))?;
        self.logger.log(format_args!("Table {table} deleted successfully"));
        Ok(())
    }
}

#[async_trait]
impl<A: TableApi> Tester for DynamoDbTester<A> {
    fn name(&self) -> &'static str {
        DYNAMODB_SERVICE_NAME
    }

    async fn run(&self) -> Result<(), TesterError> {
        self.logger.log("Running Testing...");
        let outcome = self.steps().await;
        if outcome.is_ok() {
            self.logger.log("Testing Completed");
        }
        self.clean().await;
        outcome
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
