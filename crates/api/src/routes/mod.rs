pub mod content;
pub mod health;
pub mod subscribers;

use axum::Router;

use crate::config::ServerConfig;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /skills/grouped                  categories with their skills (GET)
/// /subscribe                       newsletter subscription (POST)
///
/// /{collection}                    list (GET), bulk update (PUT), bulk create (POST)
/// /{collection}/upload             image upload (POST, multipart)
/// /{collection}/{id}               get (GET), update (PUT), delete (DELETE) one
/// ```
///
/// `{collection}` is one of the content type slugs (`stats`, `education`,
/// `certifications`, `timelines`, `experiences`, `categories`, `skills`,
/// `projects`, `now`); anything else answers 404.
pub fn api_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .merge(subscribers::router())
        .merge(content::router(config.max_upload_bytes))
}
