// crates/cloud-smoke-datastore/src/query.rs
// ============================================================================
// Module: Query Construction
// Description: Builds Datastore v1 REST query bodies.
// Purpose: Combine kind, ancestor, filter, order, and projection.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! When both an ancestor and a property filter are set they are combined
//! with a composite `AND`; either alone is emitted as a single property
//! filter. A sort string with a leading `-` orders descending.

use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::error::DatastoreError;
use crate::filter::DataFilter;
use crate::filter::PropertyFilter;
use crate::key::Key;
use crate::value::to_datastore;

/// Reserved property naming the entity key.
pub const KEY_PROPERTY: &str = "__key__";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// One ordering clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Property name.
    pub property: String,
    /// Direction.
    pub direction: Direction,
}

impl Order {
    /// Parses `name` or `-name`; empty input yields `None`.
    #[must_use]
    pub fn parse(sort: &str) -> Option<Self> {
        let sort = sort.trim();
        let (property, direction) = match sort.strip_prefix('-') {
            Some(rest) => (rest.trim(), Direction::Descending),
            None => (sort, Direction::Ascending),
        };
        if property.is_empty() {
            return None;
        }
        Some(Self {
            property: property.to_string(),
            direction,
        })
    }
}

/// Query over one kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Entity kind.
    kind: String,
    /// Ancestor key restricting results to its descendants.
    ancestor: Option<Key>,
    /// Validated property filter.
    filter: Option<PropertyFilter>,
    /// Ordering clauses in priority order.
    orders: Vec<Order>,
    /// Return keys only.
    keys_only: bool,
    /// Resume position.
    start_cursor: Option<String>,
}

// ============================================================================
// SECTION: Builder
// ============================================================================

impl Query {
    /// Query over every entity of `kind`.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ancestor: None,
            filter: None,
            orders: Vec::new(),
            keys_only: false,
            start_cursor: None,
        }
    }

    /// Restricts results to descendants of `key`.
    #[must_use]
    pub fn ancestor(mut self, key: Key) -> Self {
        self.ancestor = Some(key);
        self
    }

    /// Adds a property filter.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError::InvalidFilter`] when the filter is not valid.
    pub fn filter(mut self, filter: &dyn DataFilter) -> Result<Self, DatastoreError> {
        self.filter = Some(PropertyFilter::from_filter(filter)?);
        Ok(self)
    }

    /// Adds an ordering; empty strings are ignored.
    #[must_use]
    pub fn order(mut self, sort: &str) -> Self {
        self.orders.extend(Order::parse(sort));
        self
    }

    /// Projects only entity keys.
    #[must_use]
    pub const fn keys_only(mut self) -> Self {
        self.keys_only = true;
        self
    }

    /// Sets the cursor to resume from.
    pub fn set_start_cursor(&mut self, cursor: Option<String>) {
        self.start_cursor = cursor;
    }

    /// Cursor the next page starts from.
    #[must_use]
    pub fn start_cursor(&self) -> Option<&str> {
        self.start_cursor.as_deref()
    }

    /// Entity kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    // ========================================================================
    // SECTION: Wire Form
    // ========================================================================

    /// Builds the JSON `query` object of a `runQuery` request.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        let mut query = Map::new();
        query.insert("kind".to_string(), json!([{ "name": self.kind }]));

        let mut filters = Vec::new();
        if let Some(ancestor) = &self.ancestor {
            filters.push(json!({
                "propertyFilter": {
                    "property": { "name": KEY_PROPERTY },
                    "op": "HAS_ANCESTOR",
                    "value": { "keyValue": ancestor },
                }
            }));
        }
        if let Some(filter) = &self.filter {
            filters.push(json!({
                "propertyFilter": {
                    "property": { "name": filter.property },
                    "op": filter.op.as_wire(),
                    "value": to_datastore(&filter.value),
                }
            }));
        }
        match filters.len() {
            0 => {}
            1 => {
                query.insert("filter".to_string(), filters.remove(0));
            }
            _ => {
                query.insert(
                    "filter".to_string(),
                    json!({ "compositeFilter": { "op": "AND", "filters": filters } }),
                );
            }
        }

        if !self.orders.is_empty() {
            let orders: Vec<Value> = self
                .orders
                .iter()
                .map(|order| {
                    let direction = match order.direction {
                        Direction::Ascending => "ASCENDING",
                        Direction::Descending => "DESCENDING",
                    };
                    json!({ "property": { "name": order.property }, "direction": direction })
                })
                .collect();
            query.insert("order".to_string(), Value::Array(orders));
        }
        if self.keys_only {
            let projection = json!([{ "property": { "name": KEY_PROPERTY } }]);
            query.insert("projection".to_string(), projection);
        }
        if let Some(cursor) = &self.start_cursor {
            query.insert("startCursor".to_string(), Value::String(cursor.clone()));
        }
        Value::Object(query)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
