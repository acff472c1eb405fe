use serde::{Deserialize, Serialize};

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Name of the persistent identifier field on the wire.
pub const ID_FIELD: &str = "_id";

/// Server-assigned persistent identifier, opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Client-only marker standing in for a not-yet-assigned server id.
///
/// Random v4 UUIDs, so two records added in the same millisecond never
/// collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TempId(uuid::Uuid);

impl TempId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl std::fmt::Display for TempId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "temp-{}", self.0)
    }
}

/// Identifier of a record in an edit session: persistent or temporary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Persisted(RecordId),
    Temp(TempId),
}

impl RecordKey {
    pub fn is_temp(&self) -> bool {
        matches!(self, RecordKey::Temp(_))
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKey::Persisted(id) => id.fmt(f),
            RecordKey::Temp(temp) => temp.fmt(f),
        }
    }
}

impl From<RecordId> for RecordKey {
    fn from(id: RecordId) -> Self {
        RecordKey::Persisted(id)
    }
}

impl From<TempId> for RecordKey {
    fn from(id: TempId) -> Self {
        RecordKey::Temp(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_ids_are_unique() {
        let ids: std::collections::HashSet<_> = (0..1000).map(|_| TempId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_record_id_is_transparent_on_the_wire() {
        let id = RecordId::new("65f0c2");
        assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!("65f0c2"));
    }

    #[test]
    fn test_key_kind() {
        assert!(RecordKey::from(TempId::generate()).is_temp());
        assert!(!RecordKey::from(RecordId::new("a")).is_temp());
    }
}
