//! Route definitions for the content collections.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{content, skills, uploads};
use crate::state::AppState;

/// Room for the multipart framing and the `recordId` field on top of the
/// file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Content routes mounted at `/api`.
///
/// ```text
/// GET    /skills/grouped        -> grouped_skills
/// GET    /{collection}          -> list_records
/// PUT    /{collection}          -> bulk_update
/// POST   /{collection}          -> bulk_create
/// POST   /{collection}/upload   -> upload_image
/// GET    /{collection}/{id}     -> get_record
/// PUT    /{collection}/{id}     -> update_record
/// DELETE /{collection}/{id}     -> delete_record
/// ```
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/skills/grouped", get(skills::grouped_skills))
        .route(
            "/{collection}",
            get(content::list_records)
                .put(content::bulk_update)
                .post(content::bulk_create),
        )
        .route(
            "/{collection}/upload",
            post(uploads::upload_image).layer(DefaultBodyLimit::max(
                max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
            )),
        )
        .route(
            "/{collection}/{id}",
            get(content::get_record)
                .put(content::update_record)
                .delete(content::delete_record),
        )
}
