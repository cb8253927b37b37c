// crates/cloud-smoke-datastore/tests/support/mod.rs
// ============================================================================
// Module: Datastore Test Emulator
// Description: In-process HTTP stand-in for the Datastore v1 REST API.
// Purpose: Serve runQuery, commit, and lookup from in-memory state.
// Dependencies: tiny_http, serde_json
// ============================================================================

//! ## Overview
//! Supports the subset the driver uses: kind queries with `EQUAL` and
//! `HAS_ANCESTOR` filters (plain or under a composite `AND`), `__key__`
//! projection, cursor paging, upsert/delete commits with id allocation,
//! and lookups. Cursors are decimal offsets.

#![allow(dead_code, reason = "Each test binary uses a different subset of helpers.")]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread::JoinHandle;

use cloud_smoke_core::DatastoreSettings;
use cloud_smoke_datastore::DatastoreDriver;
use serde_json::Value;
use serde_json::json;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

/// Project id used by every test.
pub const PROJECT: &str = "smoke-test";

/// Recorded request.
#[derive(Debug, Clone)]
pub struct Recorded {
    /// Method suffix (`runQuery`, `commit`, `lookup`).
    pub method: String,
    /// Authorization header value.
    pub authorization: Option<String>,
    /// Parsed body.
    pub body: Value,
}

/// Emulator state.
#[derive(Debug, Default)]
struct Store {
    /// Entities keyed by their serialized path.
    entities: BTreeMap<String, Value>,
    /// Next allocated id.
    next_id: i64,
    /// Page size for queries; unlimited when `None`.
    page_size: Option<usize>,
    /// Method that fails, with status and message.
    failure: Option<(String, u16, String)>,
    /// Requests seen so far.
    requests: Vec<Recorded>,
}

/// Running emulator; stops on drop.
pub struct Emulator {
    /// HTTP server.
    server: Arc<Server>,
    /// Shared state.
    store: Arc<Mutex<Store>>,
    /// Serving thread.
    handle: Option<JoinHandle<()>>,
}

impl Emulator {
    /// Starts the emulator on an ephemeral port.
    pub fn start() -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("http server"));
        let store = Arc::new(Mutex::new(Store {
            next_id: 1000,
            ..Store::default()
        }));
        let handle = {
            let server = Arc::clone(&server);
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for mut request in server.incoming_requests() {
                    let mut raw = String::new();
                    request.as_reader().read_to_string(&mut raw).expect("read body");
                    let body: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);
                    let method = request.url().rsplit(':').next().unwrap_or_default().to_string();
                    let authorization = request
                        .headers()
                        .iter()
                        .find(|header| header.field.equiv("Authorization"))
                        .map(|header| header.value.as_str().to_string());
                    let (status, reply) = dispatch(&store, method, authorization, body);
                    let response = Response::from_string(reply.to_string())
                        .with_status_code(status)
                        .with_header(
                            Header::from_bytes("Content-Type", "application/json")
                                .expect("header"),
                        );
                    request.respond(response).expect("respond");
                }
            })
        };
        Self {
            server,
            store,
            handle: Some(handle),
        }
    }

    /// Emulator host in `host:port` form.
    pub fn host(&self) -> String {
        let addr = self.server.server_addr().to_ip().expect("ip listener");
        addr.to_string()
    }

    /// Settings pointing at this emulator.
    pub fn settings(&self) -> DatastoreSettings {
        DatastoreSettings {
            project_id: PROJECT.to_string(),
            emulator_host: Some(self.host()),
            timeout_ms: 5_000,
            ..DatastoreSettings::default()
        }
    }

    /// Driver pointing at this emulator.
    pub fn driver(&self) -> DatastoreDriver {
        DatastoreDriver::from_settings(&self.settings()).expect("driver")
    }

    /// Limits query pages to `size` results.
    pub fn set_page_size(&self, size: usize) {
        self.store.lock().expect("store").page_size = Some(size);
    }

    /// Makes every call to `method` fail.
    pub fn fail(&self, method: &str, status: u16, message: &str) {
        self.store.lock().expect("store").failure =
            Some((method.to_string(), status, message.to_string()));
    }

    /// Number of stored entities.
    pub fn entity_count(&self) -> usize {
        self.store.lock().expect("store").entities.len()
    }

    /// Stored entities.
    pub fn entities(&self) -> Vec<Value> {
        self.store.lock().expect("store").entities.values().cloned().collect()
    }

    /// Requests seen so far.
    pub fn requests(&self) -> Vec<Recorded> {
        self.store.lock().expect("store").requests.clone()
    }

    /// Method names of the requests seen so far.
    pub fn methods(&self) -> Vec<String> {
        self.requests().into_iter().map(|request| request.method).collect()
    }
}

impl Drop for Emulator {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Dispatches one request.
fn dispatch(
    store: &Mutex<Store>,
    method: String,
    authorization: Option<String>,
    body: Value,
) -> (u16, Value) {
    let mut store = store.lock().expect("store");
    store.requests.push(Recorded {
        method: method.clone(),
        authorization,
        body: body.clone(),
    });
    if let Some((failing, status, message)) = store.failure.clone() {
        if failing == method {
            return (status, json!({ "error": { "code": status, "message": message } }));
        }
    }
    match method.as_str() {
        "runQuery" => (200, run_query(&store, &body)),
        "commit" => (200, commit(&mut store, &body)),
        "lookup" => (200, lookup(&store, &body)),
        _ => (404, json!({ "error": { "code": 404, "message": "unknown method" } })),
    }
}

/// Identity of a key.
fn path_id(key: &Value) -> String {
    key["path"].to_string()
}

/// Evaluates a query filter against an entity.
fn matches(filter: &Value, entity: &Value) -> bool {
    if let Some(composite) = filter.get("compositeFilter") {
        let filters = composite["filters"].as_array().cloned().unwrap_or_default();
        return filters.iter().all(|inner| matches(inner, entity));
    }
    let property = &filter["propertyFilter"];
    let name = property["property"]["name"].as_str().unwrap_or_default();
    match property["op"].as_str().unwrap_or_default() {
        "EQUAL" => entity["properties"].get(name).is_some_and(|value| value == &property["value"]),
        "HAS_ANCESTOR" => {
            let ancestor = property["value"]["keyValue"]["path"].as_array().cloned();
            let path = entity["key"]["path"].as_array().cloned().unwrap_or_default();
            ancestor.is_some_and(|ancestor| path.starts_with(&ancestor))
        }
        _ => false,
    }
}

/// Handles `runQuery`.
fn run_query(store: &Store, body: &Value) -> Value {
    let query = &body["query"];
    let kind = query["kind"][0]["name"].as_str().unwrap_or_default();
    let keys_only = query.get("projection").is_some();
    let offset: usize =
        query.get("startCursor").and_then(Value::as_str).and_then(|c| c.parse().ok()).unwrap_or(0);
    let matching: Vec<Value> = store
        .entities
        .values()
        .filter(|entity| {
            entity["key"]["path"].as_array().and_then(|path| path.last()).map(|leaf| &leaf["kind"])
                == Some(&Value::String(kind.to_string()))
        })
        .filter(|entity| query.get("filter").is_none_or(|filter| matches(filter, entity)))
        .cloned()
        .collect();
    let size = store.page_size.unwrap_or(usize::MAX);
    let page: Vec<Value> = matching
        .iter()
        .skip(offset)
        .take(size)
        .map(|entity| {
            let entity = if keys_only { json!({ "key": entity["key"] }) } else { entity.clone() };
            json!({ "entity": entity })
        })
        .collect();
    let end = offset + page.len();
    let more = if end < matching.len() { "NOT_FINISHED" } else { "NO_MORE_RESULTS" };
    json!({ "batch": {
        "entityResults": page,
        "endCursor": end.to_string(),
        "moreResults": more,
    }})
}

/// Handles `commit`.
fn commit(store: &mut Store, body: &Value) -> Value {
    let mut results = Vec::new();
    for mutation in body["mutations"].as_array().cloned().unwrap_or_default() {
        if let Some(entity) = mutation.get("upsert") {
            let mut entity = entity.clone();
            let leaf = entity["key"]["path"].as_array_mut().and_then(|path| path.last_mut());
            let mut allocated = false;
            if let Some(leaf) = leaf {
                if leaf.get("id").is_none() && leaf.get("name").is_none() {
                    leaf["id"] = Value::String(store.next_id.to_string());
                    store.next_id += 1;
                    allocated = true;
                }
            }
            let key = entity["key"].clone();
            store.entities.insert(path_id(&key), entity);
            results.push(if allocated { json!({ "key": key }) } else { json!({ "version": "1" }) });
        } else if let Some(key) = mutation.get("delete") {
            store.entities.remove(&path_id(key));
            results.push(json!({ "version": "1" }));
        }
    }
    json!({ "mutationResults": results })
}

/// Handles `lookup`.
fn lookup(store: &Store, body: &Value) -> Value {
    let mut found = Vec::new();
    let mut missing = Vec::new();
    for key in body["keys"].as_array().cloned().unwrap_or_default() {
        match store.entities.get(&path_id(&key)) {
            Some(entity) => found.push(json!({ "entity": entity })),
            None => missing.push(json!({ "entity": { "key": key } })),
        }
    }
    json!({ "found": found, "missing": missing })
}
