//! Route definitions for newsletter subscriptions.

use axum::routing::post;
use axum::Router;

use crate::handlers::subscribers;
use crate::state::AppState;

/// Subscriber routes mounted at `/api`.
///
/// ```text
/// POST   /subscribe             -> subscribe
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/subscribe", post(subscribers::subscribe))
}
