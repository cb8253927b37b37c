// crates/cloud-smoke-datastore/src/filter.rs
// ============================================================================
// Module: Data Filters
// Description: Field/condition/value filters for Datastore queries.
// Purpose: Let callers describe a property filter without wire details.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! [`DataFilter`] is the caller-facing description of a single property
//! filter. [`FilterOperator::parse`] maps the textual condition to the
//! Datastore operator; `in` and `not-in` require an array value.

use std::fmt;

use serde_json::Value;

use crate::error::DatastoreError;

// ============================================================================
// SECTION: Filter Trait
// ============================================================================

/// A single property filter.
pub trait DataFilter: Send + Sync {
    /// Property name.
    fn field(&self) -> &str;
    /// Condition such as `=`, `<`, `>=`, `!=`, `in`, or `not-in`.
    fn condition(&self) -> &str;
    /// Comparison value.
    fn value(&self) -> Value;
}

/// Plain [`DataFilter`] value.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    /// Property name.
    pub field: String,
    /// Condition text.
    pub condition: String,
    /// Comparison value.
    pub value: Value,
}

impl FieldFilter {
    /// Builds a filter.
    pub fn new(
        field: impl Into<String>,
        condition: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            field: field.into(),
            condition: condition.into(),
            value: value.into(),
        }
    }

    /// Equality filter.
    pub fn equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, "=", value)
    }
}

impl DataFilter for FieldFilter {
    fn field(&self) -> &str {
        &self.field
    }

    fn condition(&self) -> &str {
        &self.condition
    }

    fn value(&self) -> Value {
        self.value.clone()
    }
}

// ============================================================================
// SECTION: Operators
// ============================================================================

/// Datastore property filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// `=` or `==`.
    Equal,
    /// `<`.
    LessThan,
    /// `<=`.
    LessThanOrEqual,
    /// `>`.
    GreaterThan,
    /// `>=`.
    GreaterThanOrEqual,
    /// `!=`.
    NotEqual,
    /// `in`.
    In,
    /// `not-in`.
    NotIn,
}

impl FilterOperator {
    /// Parses a condition; surrounding whitespace and word case are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError::InvalidFilter`] for unknown conditions.
    pub fn parse(condition: &str) -> Result<Self, DatastoreError> {
        let normalized = condition.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "=" | "==" => Ok(Self::Equal),
            "<" => Ok(Self::LessThan),
            "<=" => Ok(Self::LessThanOrEqual),
            ">" => Ok(Self::GreaterThan),
            ">=" => Ok(Self::GreaterThanOrEqual),
            "!=" => Ok(Self::NotEqual),
            "in" => Ok(Self::In),
            "not-in" | "not in" => Ok(Self::NotIn),
            _ => Err(DatastoreError::InvalidFilter(format!("unknown condition `{condition}`"))),
        }
    }

    /// Operator name in the v1 REST API.
    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Equal => "EQUAL",
            Self::LessThan => "LESS_THAN",
            Self::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
            Self::GreaterThan => "GREATER_THAN",
            Self::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
            Self::NotEqual => "NOT_EQUAL",
            Self::In => "IN",
            Self::NotIn => "NOT_IN",
        }
    }

    /// True for operators whose value must be an array.
    #[must_use]
    pub const fn takes_list(self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

// ============================================================================
// SECTION: Validated Filter
// ============================================================================

/// A filter whose condition and value were checked.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFilter {
    /// Property name.
    pub property: String,
    /// Operator.
    pub op: FilterOperator,
    /// Plain JSON value.
    pub value: Value,
}

impl PropertyFilter {
    /// Validates a [`DataFilter`].
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError::InvalidFilter`] for an empty field, an
    /// unknown condition, or a non-array value with `in` / `not-in`.
    pub fn from_filter(filter: &dyn DataFilter) -> Result<Self, DatastoreError> {
        let property = filter.field().trim();
        if property.is_empty() {
            return Err(DatastoreError::InvalidFilter("field is empty".to_string()));
        }
        let op = FilterOperator::parse(filter.condition())?;
        let value = filter.value();
        if op.takes_list() && !value.is_array() {
            return Err(DatastoreError::InvalidFilter(format!(
                "{op} on {property} requires an array value"
            )));
        }
        Ok(Self {
            property: property.to_string(),
            op,
            value,
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
