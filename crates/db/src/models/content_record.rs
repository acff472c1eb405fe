//! Content record model.

use folio_core::types::{Timestamp, ID_FIELD};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `content_records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContentRecord {
    pub id: Uuid,
    pub collection: String,
    pub data: Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ContentRecord {
    /// Wire representation: the stored fields plus `_id`, `createdAt` and
    /// `updatedAt`.
    pub fn to_document(&self) -> Value {
        let mut doc = match &self.data {
            Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        doc.insert(ID_FIELD.to_string(), Value::String(self.id.to_string()));
        doc.insert(
            "createdAt".to_string(),
            Value::String(self.created_at.to_rfc3339()),
        );
        doc.insert(
            "updatedAt".to_string(),
            Value::String(self.updated_at.to_rfc3339()),
        );
        Value::Object(doc)
    }

    /// Stored upload file name, if the record carries one.
    pub fn stored_filename(&self) -> Option<&str> {
        self.data.get("filename").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(data: Value) -> ContentRecord {
        ContentRecord {
            id: Uuid::nil(),
            collection: "projects".into(),
            data,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_document_carries_id_and_timestamps() {
        let doc = record(json!({"title": "Folio"})).to_document();
        assert_eq!(doc["_id"], Uuid::nil().to_string());
        assert_eq!(doc["title"], "Folio");
        assert!(doc["createdAt"].is_string());
        assert!(doc["updatedAt"].is_string());
    }

    #[test]
    fn test_stored_filename() {
        assert_eq!(
            record(json!({"filename": "a.png"})).stored_filename(),
            Some("a.png")
        );
        assert_eq!(record(json!({})).stored_filename(), None);
    }
}
