// crates/cloud-smoke-datastore/src/value.rs
// ============================================================================
// Module: Datastore Values
// Description: Conversion between plain JSON and Datastore typed values.
// Purpose: Store any serde object as entity properties and read it back.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Objects are serialized with `serde_json` first, then each JSON value is
//! wrapped in the Datastore typed form (`stringValue`, `integerValue`, ...).
//! Reading reverses the mapping. Integers travel as decimal strings; keys
//! read back as their JSON object form; timestamps and blobs as strings.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::error::DatastoreError;
use crate::key::Key;

/// Entity property map in Datastore wire form.
pub type Properties = Map<String, Value>;

// ============================================================================
// SECTION: Encoding
// ============================================================================

/// Wraps a JSON value in its Datastore typed form.
#[must_use]
pub fn to_datastore(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(flag) => json!({ "booleanValue": flag }),
        Value::Number(number) => number.as_i64().map_or_else(
            || json!({ "doubleValue": number.as_f64().unwrap_or_default() }),
            |int| json!({ "integerValue": int.to_string() }),
        ),
        Value::String(text) => json!({ "stringValue": text }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(to_datastore).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(fields) => json!({ "entityValue": { "properties": to_properties(fields) } }),
    }
}

/// Converts JSON object fields into entity properties.
fn to_properties(fields: &Map<String, Value>) -> Properties {
    fields.iter().map(|(name, value)| (name.clone(), to_datastore(value))).collect()
}

/// Serializes an object into entity properties.
///
/// # Errors
///
/// Returns [`DatastoreError::Encode`] when the object does not serialize to a JSON object.
pub fn encode_object<T: Serialize + ?Sized>(object: &T) -> Result<Properties, DatastoreError> {
    match serde_json::to_value(object).map_err(|err| DatastoreError::Encode(err.to_string()))? {
        Value::Object(fields) => Ok(to_properties(&fields)),
        other => Err(DatastoreError::Encode(format!(
            "entity must serialize to an object, got {}",
            json_type(&other)
        ))),
    }
}

/// Builds a wire entity from a key and properties.
#[must_use]
pub fn entity(key: &Key, properties: Properties) -> Value {
    json!({ "key": key, "properties": properties })
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Unwraps a Datastore typed value into plain JSON.
///
/// # Errors
///
/// Returns [`DatastoreError::Decode`] for unknown or malformed value types.
pub fn from_datastore(value: &Value) -> Result<Value, DatastoreError> {
    let Some(fields) = value.as_object() else {
        return Err(DatastoreError::Decode("value is not an object".to_string()));
    };
    for (name, inner) in fields {
        let decoded = match name.as_str() {
            "nullValue" => Value::Null,
            "booleanValue" | "doubleValue" | "geoPointValue" | "stringValue" | "timestampValue"
            | "blobValue" | "keyValue" => inner.clone(),
            "integerValue" => decode_integer(inner)?,
            "arrayValue" => {
                let items = inner.get("values").and_then(Value::as_array);
                let items = items.map_or(&[][..], Vec::as_slice);
                Value::Array(items.iter().map(from_datastore).collect::<Result<_, _>>()?)
            }
            "entityValue" => {
                let properties = inner.get("properties").and_then(Value::as_object);
                Value::Object(properties.map(from_properties).transpose()?.unwrap_or_default())
            }
            _ => continue,
        };
        return Ok(decoded);
    }
    Err(DatastoreError::Decode(format!("unsupported value: {value}")))
}

/// Parses a string- or number-encoded integer.
fn decode_integer(inner: &Value) -> Result<Value, DatastoreError> {
    match inner {
        Value::Number(_) => Ok(inner.clone()),
        Value::String(text) => text
            .parse::<i64>()
            .map(Value::from)
            .map_err(|err| DatastoreError::Decode(format!("integerValue {text}: {err}"))),
        _ => Err(DatastoreError::Decode("integerValue is not a number".to_string())),
    }
}

/// Converts entity properties into a plain JSON object.
///
/// # Errors
///
/// Returns [`DatastoreError::Decode`] when a property value is malformed.
pub fn from_properties(properties: &Properties) -> Result<Map<String, Value>, DatastoreError> {
    properties
        .iter()
        .map(|(name, value)| Ok((name.clone(), from_datastore(value)?)))
        .collect()
}

/// Splits a wire entity into its key and decoded object.
///
/// # Errors
///
/// Returns [`DatastoreError::Decode`] when the entity or the object shape is invalid.
pub fn decode_entity<T: DeserializeOwned>(entity: &Value) -> Result<(Key, T), DatastoreError> {
    let key = entity
        .get("key")
        .cloned()
        .ok_or_else(|| DatastoreError::Decode("entity has no key".to_string()))?;
    let key: Key =
        serde_json::from_value(key).map_err(|err| DatastoreError::Decode(err.to_string()))?;
    let properties = match entity.get("properties") {
        Some(Value::Object(properties)) => from_properties(properties)?,
        Some(_) => return Err(DatastoreError::Decode("properties is not an object".to_string())),
        None => Map::new(),
    };
    let object = serde_json::from_value(Value::Object(properties))
        .map_err(|err| DatastoreError::Decode(format!("entity {key}: {err}")))?;
    Ok((key, object))
}

/// Short JSON type name for messages.
const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
