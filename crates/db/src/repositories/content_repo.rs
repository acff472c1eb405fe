//! Repository for the `content_records` table.
//!
//! Every method is scoped to one collection; an id that exists in another
//! collection is treated as absent.

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::content_record::ContentRecord;

/// Column list for `content_records` queries.
const COLUMNS: &str = "id, collection, data, created_at, updated_at";

/// Display order: explicit `order` field first, then creation time.
const ORDER_BY: &str = "COALESCE((data->>'order')::int, 0), created_at, id";

/// Provides data access for content records.
pub struct ContentRepo;

impl ContentRepo {
    /// List every record of a collection in display order.
    pub async fn list(pool: &PgPool, collection: &str) -> Result<Vec<ContentRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_records WHERE collection = $1 ORDER BY {ORDER_BY}"
        );
        sqlx::query_as::<_, ContentRecord>(&query)
            .bind(collection)
            .fetch_all(pool)
            .await
    }

    /// Find one record by id.
    pub async fn find_by_id(
        pool: &PgPool,
        collection: &str,
        id: Uuid,
    ) -> Result<Option<ContentRecord>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM content_records WHERE collection = $1 AND id = $2");
        sqlx::query_as::<_, ContentRecord>(&query)
            .bind(collection)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert documents in one transaction.
    ///
    /// Returns the created rows in the order the documents were given.
    pub async fn create_many(
        pool: &PgPool,
        collection: &str,
        documents: &[Value],
    ) -> Result<Vec<ContentRecord>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut created = Vec::with_capacity(documents.len());

        let query = format!(
            "INSERT INTO content_records (id, collection, data) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );

        for data in documents {
            let row = sqlx::query_as::<_, ContentRecord>(&query)
                .bind(Uuid::new_v4())
                .bind(collection)
                .bind(data)
                .fetch_one(&mut *tx)
                .await?;
            created.push(row);
        }

        tx.commit().await?;
        tracing::debug!(collection, count = created.len(), "Inserted content records");
        Ok(created)
    }

    /// Replace the stored document of one record.
    ///
    /// Returns `None` if the record does not exist in this collection.
    pub async fn replace_data(
        pool: &PgPool,
        collection: &str,
        id: Uuid,
        data: &Value,
    ) -> Result<Option<ContentRecord>, sqlx::Error> {
        let query = format!(
            "UPDATE content_records SET data = $3 \
             WHERE collection = $1 AND id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentRecord>(&query)
            .bind(collection)
            .bind(id)
            .bind(data)
            .fetch_optional(pool)
            .await
    }

    /// Delete one record, returning the deleted row.
    pub async fn delete(
        pool: &PgPool,
        collection: &str,
        id: Uuid,
    ) -> Result<Option<ContentRecord>, sqlx::Error> {
        let query = format!(
            "DELETE FROM content_records WHERE collection = $1 AND id = $2 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentRecord>(&query)
            .bind(collection)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether a record with this id exists in the collection.
    pub async fn exists(pool: &PgPool, collection: &str, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM content_records WHERE collection = $1 AND id = $2)",
        )
        .bind(collection)
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Count records of `collection` whose string field `field` equals
    /// `value`. Used for the skill -> category reference.
    pub async fn count_referencing(
        pool: &PgPool,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM content_records WHERE collection = $1 AND data->>$2 = $3",
        )
        .bind(collection)
        .bind(field)
        .bind(value)
        .fetch_one(pool)
        .await
    }
}
