//! Handler for newsletter subscriptions.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use folio_core::error::CoreError;
use folio_core::subscriber::NewSubscriber;
use folio_db::repositories::SubscriberRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Unique constraint on `subscribers.email`.
const UNIQUE_EMAIL: &str = "uq_subscribers_email";

/// POST /api/subscribe
///
/// Body: `{ "email": "..." }`. Responds 201 with the stored subscriber,
/// 409 if the address is already subscribed.
pub async fn subscribe(
    State(state): State<AppState>,
    Json(body): Json<NewSubscriber>,
) -> AppResult<impl IntoResponse> {
    let request = body.normalized()?;

    let subscriber = SubscriberRepo::create(&state.pool, &request.email)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(ref db) if db.constraint() == Some(UNIQUE_EMAIL) => {
                AppError::Core(CoreError::Conflict("Already subscribed".to_string()))
            }
            other => AppError::Database(other),
        })?;

    tracing::info!(subscriber_id = %subscriber.id, "New subscriber");

    Ok((StatusCode::CREATED, Json(DataResponse::ok(subscriber))))
}
