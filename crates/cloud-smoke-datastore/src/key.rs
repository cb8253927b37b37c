// crates/cloud-smoke-datastore/src/key.rs
// ============================================================================
// Module: Datastore Keys
// Description: Entity keys in the Datastore v1 JSON shape.
// Purpose: Build, scope, and encode keys addressing entities.
// Dependencies: serde, serde_json, base64
// ============================================================================

//! ## Overview
//! A [`Key`] is a partition plus an ancestor path ending in the entity's own
//! element. The final element carries either a numeric id, a name, or
//! neither (an incomplete key that the service completes on insert).
//!
//! The encoded form is URL-safe base64 (no padding) of the key's JSON, so it
//! round-trips through [`Key::decode`] and is safe in URLs and logs.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use serde::Serialize;

use crate::error::DatastoreError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Project and namespace a key belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionId {
    /// Owning project; filled from the driver when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Namespace; the default namespace when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_id: Option<String>,
}

/// One `(kind, id | name)` step of a key path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathElement {
    /// Entity kind.
    pub kind: String,
    /// Numeric id, transported as a decimal string.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "int64_string")]
    pub id: Option<i64>,
    /// String name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Entity key.
///
/// # Invariants
/// - `path` is never empty for keys built through the constructors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    /// Partition of the key.
    #[serde(default)]
    pub partition_id: PartitionId,
    /// Ancestor path, root first.
    pub path: Vec<PathElement>,
}

// ============================================================================
// SECTION: Constructors
// ============================================================================

impl Key {
    /// Key with a string name.
    pub fn name_key(
        kind: impl Into<String>,
        name: impl Into<String>,
        parent: Option<&Self>,
    ) -> Self {
        Self::child(
            parent,
            PathElement {
                kind: kind.into(),
                id: None,
                name: Some(name.into()),
            },
        )
    }

    /// Key with a numeric id.
    pub fn id_key(kind: impl Into<String>, id: i64, parent: Option<&Self>) -> Self {
        Self::child(
            parent,
            PathElement {
                kind: kind.into(),
                id: Some(id),
                name: None,
            },
        )
    }

    /// Key whose id the service allocates on insert.
    pub fn incomplete_key(kind: impl Into<String>, parent: Option<&Self>) -> Self {
        Self::child(
            parent,
            PathElement {
                kind: kind.into(),
                id: None,
                name: None,
            },
        )
    }

    /// Appends `element` to the parent's path, inheriting its partition.
    fn child(parent: Option<&Self>, element: PathElement) -> Self {
        let (partition_id, mut path) = parent
            .map(|parent| (parent.partition_id.clone(), parent.path.clone()))
            .unwrap_or_default();
        path.push(element);
        Self {
            partition_id,
            path,
        }
    }

    // ========================================================================
    // SECTION: Accessors
    // ========================================================================

    /// Final path element.
    #[must_use]
    pub fn leaf(&self) -> Option<&PathElement> {
        self.path.last()
    }

    /// Kind of the entity the key addresses.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.leaf().map(|leaf| leaf.kind.as_str())
    }

    /// True when the final element has an id or a name.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.leaf().is_some_and(|leaf| leaf.id.is_some() || leaf.name.is_some())
    }

    /// Key of the parent entity, if any.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.path.len() < 2 {
            return None;
        }
        Some(Self {
            partition_id: self.partition_id.clone(),
            path: self.path[..self.path.len() - 1].to_vec(),
        })
    }

    /// Fills the project and namespace where the key leaves them unset.
    #[must_use]
    pub fn scoped(&self, project_id: &str, namespace: Option<&str>) -> Self {
        let mut key = self.clone();
        if key.partition_id.project_id.is_none() {
            key.partition_id.project_id = Some(project_id.to_string());
        }
        if key.partition_id.namespace_id.is_none() {
            key.partition_id.namespace_id = namespace.map(str::to_string);
        }
        key
    }

    // ========================================================================
    // SECTION: Encoding
    // ========================================================================

    /// Encodes the key as URL-safe base64 of its JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError::Encode`] when the key cannot be serialized.
    pub fn encode(&self) -> Result<String, DatastoreError> {
        let json = serde_json::to_vec(self).map_err(|err| DatastoreError::Encode(err.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Decodes a key produced by [`Key::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError::InvalidKey`] for malformed input or an empty path.
    pub fn decode(encoded: &str) -> Result<Self, DatastoreError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded.trim())
            .map_err(|err| DatastoreError::InvalidKey(format!("not base64: {err}")))?;
        let key: Self = serde_json::from_slice(&bytes)
            .map_err(|err| DatastoreError::InvalidKey(format!("not a key: {err}")))?;
        if key.path.is_empty() {
            return Err(DatastoreError::InvalidKey("key path is empty".to_string()));
        }
        Ok(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in &self.path {
            write!(f, "/{},", element.kind)?;
            match (&element.name, element.id) {
                (Some(name), _) => write!(f, "{name}")?,
                (None, Some(id)) => write!(f, "{id}")?,
                (None, None) => f.write_str("<incomplete>")?,
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Serde Helpers
// ============================================================================

/// `Option<i64>` carried as a JSON string (int64 JSON mapping).
mod int64_string {
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;
    use serde::de::Error as _;

    /// Accepted wire forms.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        /// Decimal string.
        Text(String),
        /// Bare number.
        Number(i64),
    }

    /// Writes the id as a decimal string.
    #[allow(clippy::ref_option, reason = "Signature required by serde `with`.")]
    pub fn serialize<S: Serializer>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(id) => serializer.serialize_str(&id.to_string()),
            None => serializer.serialize_none(),
        }
    }

    /// Reads the id from a string or a number.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Wire>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Wire::Number(id)) => Ok(Some(id)),
            Some(Wire::Text(text)) => text.parse().map(Some).map_err(D::Error::custom),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::*;

    /// Children inherit the parent's partition and path.
    #[test]
    fn child_keys_extend_parent() {
        let parent = Key::name_key("Zoo", "central", None).scoped("klaboratory", Some("ns"));
        let child = Key::id_key("Animal", 42, Some(&parent));
        assert_eq!(child.path.len(), 2);
        assert_eq!(child.partition_id.project_id.as_deref(), Some("klaboratory"));
        assert_eq!(child.parent(), Some(parent));
        assert_eq!(child.to_string(), "/Zoo,central/Animal,42");
    }

    /// Ids travel as strings and incomplete keys have no id or name.
    #[test]
    fn wire_shape_uses_string_ids() {
        let key = Key::id_key("Animal", 5_634_161_670_881_280, None);
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json["path"][0]["id"], "5634161670881280");
        assert!(!Key::incomplete_key("Animal", None).is_complete());
        let parsed: Key =
            serde_json::from_str(r#"{"path":[{"kind":"Animal","id":7}]}"#).unwrap();
        assert_eq!(parsed.leaf().unwrap().id, Some(7));
    }

    /// Encoded keys decode to the same key; garbage is rejected.
    #[test]
    fn encode_decode() {
        let key = Key::name_key("Animal", "Rex", None).scoped("p", None);
        let encoded = key.encode().unwrap();
        assert!(!encoded.contains('='));
        assert_eq!(Key::decode(&encoded).unwrap(), key);
        assert!(matches!(Key::decode("%%%"), Err(DatastoreError::InvalidKey(_))));
        let empty = URL_SAFE_NO_PAD.encode(br#"{"path":[]}"#);
        assert!(matches!(Key::decode(&empty), Err(DatastoreError::InvalidKey(_))));
    }
}
