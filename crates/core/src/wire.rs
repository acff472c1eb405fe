//! JSON envelopes exchanged between the admin editors and the REST
//! collaborator.
//!
//! Bulk request keys depend on the content type (`updatedEducation`,
//! `newCertifications`, ...), so the request envelopes serialize through
//! explicit `to_json` / `from_json` pairs instead of serde derives.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::content::ContentType;
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// List responses
// ---------------------------------------------------------------------------

/// Normalize a list response to a plain array of records.
///
/// Accepts a bare array or an object carrying the array under `list_key`.
/// Every other shape yields an empty collection.
pub fn normalize_collection(value: Value, list_key: &str) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(list_key) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Build the `{ <listKey>: [...] }` list envelope.
pub fn list_envelope(kind: ContentType, records: Vec<Value>) -> Value {
    let mut map = Map::new();
    map.insert(kind.list_key().to_string(), Value::Array(records));
    Value::Object(map)
}

// ---------------------------------------------------------------------------
// Bulk update / delete
// ---------------------------------------------------------------------------

/// Body of `PUT /api/{T}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkUpdateRequest {
    /// Full field values of every changed record, each carrying `_id`.
    pub updated: Vec<Value>,
    /// Persistent ids to delete.
    pub deleted_ids: Vec<String>,
}

impl BulkUpdateRequest {
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.deleted_ids.is_empty()
    }

    pub fn to_json(&self, kind: ContentType) -> Value {
        let mut map = Map::new();
        map.insert(
            kind.update_key().to_string(),
            Value::Array(self.updated.clone()),
        );
        map.insert(
            "deletedIds".to_string(),
            Value::Array(
                self.deleted_ids
                    .iter()
                    .map(|id| Value::String(id.clone()))
                    .collect(),
            ),
        );
        Value::Object(map)
    }

    /// Parse a request body. At least one of the two arrays must be present.
    pub fn from_json(kind: ContentType, value: &Value) -> Result<Self, CoreError> {
        let obj = value
            .as_object()
            .ok_or_else(|| CoreError::Validation("Request body must be a JSON object".into()))?;

        let updated = optional_array(obj, kind.update_key())?;
        let deleted = optional_array(obj, "deletedIds")?;

        if updated.is_none() && deleted.is_none() {
            return Err(CoreError::Validation(format!(
                "Invalid request: {} or deletedIds array is required",
                kind.update_key()
            )));
        }

        let deleted_ids = deleted
            .unwrap_or_default()
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(s),
                other => Err(CoreError::Validation(format!(
                    "deletedIds must contain strings, got {other}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            updated: updated.unwrap_or_default(),
            deleted_ids,
        })
    }
}

/// Why the server could not apply one record of a bulk update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    NotFound,
    Validation,
    Conflict,
}

/// One record the server could not apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFailure {
    #[serde(rename = "_id")]
    pub id: String,
    pub reason: FailureReason,
    pub message: String,
}

/// Response of `PUT /api/{T}`.
///
/// `success` is `false` exactly when `failed` is non-empty; every record not
/// listed in `failed` was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUpdateResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub failed: Vec<RecordFailure>,
}

impl BulkUpdateResponse {
    pub fn from_failures(kind: ContentType, failed: Vec<RecordFailure>) -> Self {
        let message = if failed.is_empty() {
            format!("{} data updated successfully", kind.entity_name())
        } else {
            format!(
                "{} {} record(s) could not be applied",
                failed.len(),
                kind.entity_name()
            )
        };
        Self {
            success: failed.is_empty(),
            message,
            failed,
        }
    }
}

// ---------------------------------------------------------------------------
// Bulk create
// ---------------------------------------------------------------------------

/// Body of `POST /api/{T}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkCreateRequest {
    /// New records without any identifier.
    pub records: Vec<Value>,
}

impl BulkCreateRequest {
    pub fn to_json(&self, kind: ContentType) -> Value {
        let mut map = Map::new();
        map.insert(
            kind.create_key().to_string(),
            Value::Array(self.records.clone()),
        );
        Value::Object(map)
    }

    /// Parse a request body. The array must be present and non-empty.
    pub fn from_json(kind: ContentType, value: &Value) -> Result<Self, CoreError> {
        let records = value
            .get(kind.create_key())
            .and_then(Value::as_array)
            .filter(|items| !items.is_empty())
            .cloned()
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid request: {} array is required",
                    kind.create_key()
                ))
            })?;
        Ok(Self { records })
    }
}

/// Response of `POST /api/{T}`: created records in submission order.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkCreateResponse {
    pub records: Vec<Value>,
}

impl BulkCreateResponse {
    pub fn to_json(&self, kind: ContentType) -> Value {
        let mut map = Map::new();
        map.insert("success".to_string(), Value::Bool(true));
        map.insert(
            kind.list_key().to_string(),
            Value::Array(self.records.clone()),
        );
        Value::Object(map)
    }

    pub fn from_json(kind: ContentType, value: Value) -> Self {
        Self {
            records: normalize_collection(value, kind.list_key()),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// JSON body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

fn optional_array(obj: &Map<String, Value>, key: &str) -> Result<Option<Vec<Value>>, CoreError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items.clone())),
        Some(_) => Err(CoreError::Validation(format!("{key} must be an array"))),
    }
}
