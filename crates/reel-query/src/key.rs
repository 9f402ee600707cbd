//! Canonical query identity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QueryError;

/// Serializable identity of a logical paginated query.
///
/// A key is an endpoint plus a parameter mapping. Parameters are kept
/// in a `BTreeMap` so the serialized form is independent of the order
/// they were added in; two logically identical queries always produce
/// the same key. Parameters whose value serializes to `null` are
/// omitted entirely, matching the behavior of absent parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryKey {
    endpoint: String,
    params: BTreeMap<String, Value>,
}

impl QueryKey {
    /// Create a key for an endpoint with no parameters.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter.
    ///
    /// Fails with [`QueryError::InvalidParameter`] if the value is not
    /// representable as plain JSON (e.g. a map with non-string keys).
    /// A `null` value is treated as absent and omitted.
    pub fn with_param(
        mut self,
        name: impl Into<String>,
        value: impl Serialize,
    ) -> Result<Self, QueryError> {
        let name = name.into();
        let value = serde_json::to_value(value).map_err(|e| QueryError::InvalidParameter {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        if !value.is_null() {
            self.params.insert(name, value);
        }
        Ok(self)
    }

    /// Get the endpoint identifier.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get the parameter mapping (canonically ordered).
    pub fn params(&self) -> &BTreeMap<String, Value> {
        &self.params
    }

    /// Canonical serialized form, used as the cache lookup key.
    ///
    /// Deterministic: parameter order is normalized by the `BTreeMap`,
    /// and the encoding round-trips through [`QueryKey::parse`]
    /// unchanged.
    pub fn serialized(&self) -> String {
        // String-keyed JSON maps cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Invert [`QueryKey::serialized`].
    pub fn parse(serialized: &str) -> Result<Self, QueryError> {
        serde_json::from_str(serialized).map_err(|e| QueryError::HydrationMismatch {
            key: serialized.to_string(),
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.serialized())
    }
}
