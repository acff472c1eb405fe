//! Subscriber model.

use folio_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `subscribers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    pub created_at: Timestamp,
}
