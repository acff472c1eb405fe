//! Image upload for content types that carry an image field.

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use folio_core::error::CoreError;
use folio_core::upload::UploadPolicy;
use folio_db::repositories::ContentRepo;
use serde_json::{Map, Value};

use super::{parse_record_id, resolve_collection};
use crate::error::{AppError, AppResult};
use crate::response::{DataResponse, UploadResult};
use crate::state::AppState;

/// POST /api/{collection}/upload
///
/// Multipart form with a required `file` field and a required `recordId`
/// field. The image is checked against the upload policy, stored under a
/// generated name, and the record's image field and `filename` are pointed
/// at it. The file it replaces is removed.
pub async fn upload_image(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let kind = resolve_collection(&collection)?;
    let image_field = kind.image_field().ok_or_else(|| {
        AppError::BadRequest(format!("{} records do not accept images", kind.entity_name()))
    })?;

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut record_id: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let mime = field.content_type().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((mime, data.to_vec()));
            }
            "recordId" => {
                let text = field.text().await.map_err(multipart_error)?;
                record_id = Some(text.trim().to_string());
            }
            _ => {} // ignore unknown fields
        }
    }

    let (mime, bytes) =
        file.ok_or_else(|| CoreError::Validation("No file uploaded".to_string()))?;
    let record_id = record_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| CoreError::Validation("recordId is required".to_string()))?;

    let id = parse_record_id(kind, &record_id)?;
    let existing = ContentRepo::find_by_id(&state.pool, kind.slug(), id)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: kind.entity_name(),
            id: record_id.clone(),
        })?;

    let extension = UploadPolicy::new(state.config.max_upload_bytes).check(&mime, &bytes)?;
    let filename = state
        .storage
        .save(extension, &bytes)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    let url = state.storage.url_for(&filename);

    let mut data = match &existing.data {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    data.insert(image_field.to_string(), Value::String(url.clone()));
    data.insert("filename".to_string(), Value::String(filename.clone()));

    let updated =
        match ContentRepo::replace_data(&state.pool, kind.slug(), id, &Value::Object(data)).await {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                state.storage.remove_logged(&filename).await;
                return Err(AppError::Core(CoreError::NotFound {
                    entity: kind.entity_name(),
                    id: record_id,
                }));
            }
            Err(e) => {
                state.storage.remove_logged(&filename).await;
                return Err(e.into());
            }
        };

    if let Some(previous) = existing.stored_filename() {
        if previous != filename {
            state.storage.remove_logged(previous).await;
        }
    }

    tracing::info!(
        collection = kind.slug(),
        record_id = %record_id,
        %filename,
        size = bytes.len(),
        "Image uploaded",
    );

    Ok((
        StatusCode::OK,
        Json(DataResponse::ok(UploadResult {
            url,
            filename,
            record: updated.to_document(),
        })),
    ))
}

/// Bodies over the route's limit surface as multipart errors carrying 413.
fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}
