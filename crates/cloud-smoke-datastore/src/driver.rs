// crates/cloud-smoke-datastore/src/driver.rs
// ============================================================================
// Module: Datastore Driver
// Description: Driver trait and its HTTP implementation over the v1 REST API.
// Purpose: Find, create, update, read, and delete entities of any serde type.
// Dependencies: async-trait, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! [`DatastoreDriver`] talks to `POST {base}/v1/projects/{project}:<method>`
//! with JSON bodies, against either the public endpoint or an emulator.
//! Results of [`Driver::find`] are paged lazily by [`EntityIterator`], which
//! follows `endCursor` while the service reports `NOT_FINISHED`.
//!
//! The driver is a plain value: callers own it and share it with `Arc`.
//! Once [`Driver::close`] ran, every call fails with
//! [`DatastoreError::Closed`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use cloud_smoke_core::DatastoreSettings;
use cloud_smoke_core::PrefixedLogger;
use reqwest::Client;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::json;

use crate::error::DatastoreError;
use crate::filter::DataFilter;
use crate::key::Key;
use crate::query::Query;
use crate::value::decode_entity;
use crate::value::encode_object;
use crate::value::entity;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Public Datastore endpoint.
pub const PUBLIC_BASE_URL: &str = "https://datastore.googleapis.com";
/// Log prefix shared by the driver and the tester.
pub const DATASTORE_SERVICE_NAME: &str = "Datastore";
/// `moreResults` value meaning another page exists.
const NOT_FINISHED: &str = "NOT_FINISHED";

// ============================================================================
// SECTION: Driver Trait
// ============================================================================

/// Entity operations used by the Datastore tester.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Starts a query over `kind`; pages are fetched as the iterator advances.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] for an invalid filter or a closed driver.
    fn find(
        &self,
        ancestor: Option<&Key>,
        kind: &str,
        filter: Option<&dyn DataFilter>,
        sort: &str,
    ) -> Result<EntityIterator, DatastoreError>;

    /// Runs a keys-only query and returns the encoded keys.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the query fails.
    async fn find_ids(
        &self,
        ancestor: Option<&Key>,
        kind: &str,
        filter: Option<&dyn DataFilter>,
        sort: &str,
    ) -> Result<Vec<String>, DatastoreError>;

    /// Upserts `object` under `key` and returns the encoded stored key.
    ///
    /// Incomplete keys come back with the id the service allocated.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when encoding or the commit fails.
    async fn create<T>(&self, key: &Key, object: &T) -> Result<String, DatastoreError>
    where
        T: Serialize + Sync + ?Sized;

    /// Reads the entity at `key`; `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the lookup or decoding fails.
    async fn get<T>(&self, key: &Key) -> Result<Option<T>, DatastoreError>
    where
        T: DeserializeOwned + Send;

    /// Replaces the entity at an existing, complete `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError::InvalidKey`] for incomplete keys and
    /// [`DatastoreError`] when the commit fails.
    async fn update<T>(&self, key: &Key, data: &T) -> Result<(), DatastoreError>
    where
        T: Serialize + Sync + ?Sized;

    /// Deletes the entity at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the commit fails.
    async fn delete(&self, key: &Key) -> Result<(), DatastoreError>;

    /// Releases the driver. Failures are logged, never returned.
    async fn close(&self);
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Connection settings for [`DatastoreDriver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    /// Project id.
    pub project_id: String,
    /// Namespace applied to keys without one.
    pub namespace: Option<String>,
    /// Bearer token.
    pub access_token: Option<String>,
    /// Per-call timeout.
    pub timeout: Duration,
}

impl DriverConfig {
    /// Derives driver settings; an emulator host wins over the public endpoint.
    #[must_use]
    pub fn from_settings(settings: &DatastoreSettings) -> Self {
        let base_url = settings.emulator_host.as_deref().map_or_else(
            || PUBLIC_BASE_URL.to_string(),
            |host| {
                let host = host.trim();
                if host.starts_with("http://") || host.starts_with("https://") {
                    host.to_string()
                } else {
                    format!("http://{host}")
                }
            },
        );
        Self {
            base_url,
            project_id: settings.project_id.trim().to_string(),
            namespace: settings.namespace.clone().filter(|namespace| !namespace.is_empty()),
            access_token: settings.access_token.clone(),
            timeout: Duration::from_millis(settings.timeout_ms),
        }
    }
}

// ============================================================================
// SECTION: Transport
// ============================================================================

/// Cloneable HTTP access to one project.
#[derive(Debug, Clone)]
struct Transport {
    /// HTTP client configured with the call timeout.
    client: Client,
    /// `{base}/v1/projects/{project}`.
    project_url: String,
    /// Project id.
    project_id: String,
    /// Namespace applied to keys and queries.
    namespace: Option<String>,
    /// Default request headers.
    headers: HeaderMap,
}

impl Transport {
    /// Builds the transport from driver settings.
    fn new(config: &DriverConfig) -> Result<Self, DatastoreError> {
        let client = Client::builder()
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|err| DatastoreError::Http(err.to_string()))?;
        let base_url = config.base_url.trim_end_matches('/');
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.access_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| DatastoreError::Http("invalid access token".to_string()))?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }
        Ok(Self {
            client,
            project_url: format!("{base_url}/v1/projects/{}", config.project_id),
            project_id: config.project_id.clone(),
            namespace: config.namespace.clone(),
            headers,
        })
    }

    /// Key with the driver's project and namespace filled in.
    fn scope(&self, key: &Key) -> Key {
        key.scoped(&self.project_id, self.namespace.as_deref())
    }

    /// Partition sent with queries.
    fn partition(&self) -> Value {
        match &self.namespace {
            Some(namespace) => json!({ "projectId": self.project_id, "namespaceId": namespace }),
            None => json!({ "projectId": self.project_id }),
        }
    }

    /// Posts `body` to `:{method}` and returns the decoded response.
    async fn call(&self, method: &str, body: &Value) -> Result<Value, DatastoreError> {
        let url = format!("{}:{method}", self.project_url);
        let response = self
            .client
            .post(url)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await
            .map_err(|err| DatastoreError::Http(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(|err| DatastoreError::Decode(err.to_string()));
        }
        let text = response.text().await.unwrap_or_default();
        Err(DatastoreError::Status {
            status: status.as_u16(),
            message: error_message(&text).unwrap_or_else(|| {
                status.canonical_reason().unwrap_or("unknown status").to_string()
            }),
        })
    }

    /// Runs one `runQuery` page.
    async fn run_query(&self, query: &Query) -> Result<QueryPage, DatastoreError> {
        let body = json!({ "partitionId": self.partition(), "query": query.to_wire() });
        let response = self.call("runQuery", &body).await?;
        QueryPage::parse(&response)
    }

    /// Commits mutations outside a transaction.
    async fn commit(&self, mutations: Vec<Value>) -> Result<Value, DatastoreError> {
        let body = json!({ "mode": "NON_TRANSACTIONAL", "mutations": mutations });
        self.call("commit", &body).await
    }
}

/// Extracts `error.message` from a Google error envelope.
fn error_message(body: &str) -> Option<String> {
    let envelope: Value = serde_json::from_str(body).ok()?;
    envelope
        .get("error")?
        .get("message")?
        .as_str()
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}

// ============================================================================
// SECTION: Query Pages
// ============================================================================

/// One decoded `runQuery` batch.
#[derive(Debug, Default)]
struct QueryPage {
    /// Raw entities of the batch.
    entities: Vec<Value>,
    /// Cursor after the last result.
    end_cursor: Option<String>,
    /// True when the service reported `NOT_FINISHED`.
    more: bool,
}

impl QueryPage {
    /// Parses the `batch` of a `runQuery` response.
    fn parse(response: &Value) -> Result<Self, DatastoreError> {
        let Some(batch) = response.get("batch") else {
            return Err(DatastoreError::Decode("runQuery response has no batch".to_string()));
        };
        let entities = batch
            .get("entityResults")
            .and_then(Value::as_array)
            .map(|results| results.iter().filter_map(|result| result.get("entity")).cloned())
            .map(Iterator::collect)
            .unwrap_or_default();
        Ok(Self {
            entities,
            end_cursor: batch.get("endCursor").and_then(Value::as_str).map(str::to_string),
            more: batch.get("moreResults").and_then(Value::as_str) == Some(NOT_FINISHED),
        })
    }
}

/// Lazily paged query results.
#[derive(Debug)]
pub struct EntityIterator {
    /// Transport used for follow-up pages.
    transport: Transport,
    /// Query; its start cursor advances with each page.
    query: Query,
    /// Entities fetched but not yet returned.
    buffer: VecDeque<Value>,
    /// True until a page reports no more results.
    more: bool,
}

impl EntityIterator {
    /// Iterator that has not fetched any page yet.
    const fn new(transport: Transport, query: Query) -> Self {
        Self {
            transport,
            query,
            buffer: VecDeque::new(),
            more: true,
        }
    }

    /// Returns the next entity and its key, fetching pages as needed.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when a page request or decoding fails.
    pub async fn next_entity<T>(&mut self) -> Result<Option<(Key, T)>, DatastoreError>
    where
        T: DeserializeOwned,
    {
        while self.buffer.is_empty() && self.more {
            self.fetch_page().await?;
        }
        self.buffer.pop_front().map(|raw| decode_entity(&raw)).transpose()
    }

    /// Drains the iterator into a vector.
    ///
    /// # Errors
    ///
    /// Returns the first [`DatastoreError`] hit while paging.
    pub async fn collect_all<T>(mut self) -> Result<Vec<(Key, T)>, DatastoreError>
    where
        T: DeserializeOwned,
    {
        let mut entities = Vec::new();
        while let Some(entity) = self.next_entity().await? {
            entities.push(entity);
        }
        Ok(entities)
    }

    /// Fetches the next page into the buffer.
    async fn fetch_page(&mut self) -> Result<(), DatastoreError> {
        let page = self.transport.run_query(&self.query).await?;
        self.buffer.extend(page.entities);
        let previous = self.query.start_cursor().map(str::to_string);
        // A cursor that does not move would page forever.
        self.more = page.more && page.end_cursor.is_some() && page.end_cursor != previous;
        self.query.set_start_cursor(page.end_cursor);
        Ok(())
    }
}

// ============================================================================
// SECTION: HTTP Driver
// ============================================================================

/// [`Driver`] over the Datastore v1 REST API.
#[derive(Debug)]
pub struct DatastoreDriver {
    /// HTTP access.
    transport: Transport,
    /// Set once [`Driver::close`] ran.
    closed: AtomicBool,
    /// Driver log lines.
    logger: PrefixedLogger,
}

impl DatastoreDriver {
    /// Builds a driver.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError::Http`] when the HTTP client cannot be built.
    pub fn new(config: &DriverConfig) -> Result<Self, DatastoreError> {
        Ok(Self {
            transport: Transport::new(config)?,
            closed: AtomicBool::new(false),
            logger: PrefixedLogger::new(DATASTORE_SERVICE_NAME),
        })
    }

    /// Builds a driver from configuration settings.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError::Http`] when the HTTP client cannot be built.
    pub fn from_settings(settings: &DatastoreSettings) -> Result<Self, DatastoreError> {
        Self::new(&DriverConfig::from_settings(settings))
    }

    /// Returns the project id.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.transport.project_id
    }

    /// Fails once the driver is closed.
    fn ensure_open(&self) -> Result<(), DatastoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DatastoreError::Closed);
        }
        Ok(())
    }

    /// Builds a scoped query.
    fn query(
        &self,
        ancestor: Option<&Key>,
        kind: &str,
        filter: Option<&dyn DataFilter>,
        sort: &str,
    ) -> Result<Query, DatastoreError> {
        let mut query = Query::new(kind).order(sort);
        if let Some(ancestor) = ancestor {
            query = query.ancestor(self.transport.scope(ancestor));
        }
        if let Some(filter) = filter {
            query = query.filter(filter)?;
        }
        Ok(query)
    }

    /// Upserts one entity and returns the stored key.
    async fn upsert(&self, key: &Key, object: Value) -> Result<Key, DatastoreError> {
        let properties = encode_object(&object)?;
        let key = self.transport.scope(key);
        let mutation = json!({ "upsert": entity(&key, properties) });
        let response = self.transport.commit(vec![mutation]).await?;
        if key.is_complete() {
            return Ok(key);
        }
        let allocated = response
            .get("mutationResults")
            .and_then(|results| results.get(0))
            .and_then(|result| result.get("key"))
            .cloned()
            .ok_or_else(|| DatastoreError::Decode("commit returned no allocated key".to_string()))?;
        serde_json::from_value(allocated).map_err(|err| DatastoreError::Decode(err.to_string()))
    }
}

#[async_trait]
impl Driver for DatastoreDriver {
    fn find(
        &self,
        ancestor: Option<&Key>,
        kind: &str,
        filter: Option<&dyn DataFilter>,
        sort: &str,
    ) -> Result<EntityIterator, DatastoreError> {
        self.ensure_open()?;
        let query = self.query(ancestor, kind, filter, sort)?;
        Ok(EntityIterator::new(self.transport.clone(), query))
    }

    async fn find_ids(
        &self,
        ancestor: Option<&Key>,
        kind: &str,
        filter: Option<&dyn DataFilter>,
        sort: &str,
    ) -> Result<Vec<String>, DatastoreError> {
        self.ensure_open()?;
        let mut query = self.query(ancestor, kind, filter, sort)?.keys_only();
        let mut ids = Vec::new();
        loop {
            let page = self.transport.run_query(&query).await?;
            for raw in &page.entities {
                let key: Key = raw
                    .get("key")
                    .cloned()
                    .map(serde_json::from_value::<Key>)
                    .transpose()
                    .map_err(|err| DatastoreError::Decode(err.to_string()))?
                    .ok_or_else(|| DatastoreError::Decode("entity has no key".to_string()))?;
                ids.push(key.encode()?);
            }
            if !page.more || page.end_cursor.is_none() {
                break;
            }
            if page.end_cursor.as_deref() == query.start_cursor() {
                break;
            }
            query.set_start_cursor(page.end_cursor);
        }
        Ok(ids)
    }

    async fn create<T>(&self, key: &Key, object: &T) -> Result<String, DatastoreError>
    where
        T: Serialize + Sync + ?Sized,
    {
        self.ensure_open()?;
        let object =
            serde_json::to_value(object).map_err(|err| DatastoreError::Encode(err.to_string()))?;
        self.upsert(key, object).await?.encode()
    }

    async fn get<T>(&self, key: &Key) -> Result<Option<T>, DatastoreError>
    where
        T: DeserializeOwned + Send,
    {
        self.ensure_open()?;
        if !key.is_complete() {
            return Err(DatastoreError::InvalidKey(format!("{key} is incomplete")));
        }
        let body = json!({ "keys": [self.transport.scope(key)] });
        let response = self.transport.call("lookup", &body).await?;
        let Some(found) = response.get("found").and_then(Value::as_array) else {
            return Ok(None);
        };
        let Some(raw) = found.first().and_then(|result| result.get("entity")) else {
            return Ok(None);
        };
        let (_, object) = decode_entity(raw)?;
        Ok(Some(object))
    }

    async fn update<T>(&self, key: &Key, data: &T) -> Result<(), DatastoreError>
    where
        T: Serialize + Sync + ?Sized,
    {
        self.ensure_open()?;
        if !key.is_complete() {
            return Err(DatastoreError::InvalidKey(format!("cannot update {key}")));
        }
        let data =
            serde_json::to_value(data).map_err(|err| DatastoreError::Encode(err.to_string()))?;
        self.upsert(key, data).await?;
        Ok(())
    }

    async fn delete(&self, key: &Key) -> Result<(), DatastoreError> {
        self.ensure_open()?;
        if !key.is_complete() {
            return Err(DatastoreError::InvalidKey(format!("cannot delete {key}")));
        }
        let mutation = json!({ "delete": self.transport.scope(key) });
        self.transport.commit(vec![mutation]).await?;
        Ok(())
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            self.logger.error("datastore client close failure: already closed");
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
