//! Repository for the `subscribers` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::subscriber::Subscriber;

/// Provides data access for newsletter subscribers.
pub struct SubscriberRepo;

impl SubscriberRepo {
    /// Insert a subscriber.
    ///
    /// A duplicate address fails with the `uq_subscribers_email` unique
    /// violation.
    pub async fn create(pool: &PgPool, email: &str) -> Result<Subscriber, sqlx::Error> {
        sqlx::query_as::<_, Subscriber>(
            "INSERT INTO subscribers (id, email) VALUES ($1, $2) \
             RETURNING id, email, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .fetch_one(pool)
        .await
    }

    /// Find a subscriber by address.
    pub async fn find_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<Subscriber>, sqlx::Error> {
        sqlx::query_as::<_, Subscriber>(
            "SELECT id, email, created_at FROM subscribers WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }
}
