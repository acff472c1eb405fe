//! Handlers for the generic content collections.
//!
//! Every collection shares the same operations: list, bulk update (with
//! deletes), bulk create, and single-record get, update and delete. The
//! collection is taken from the path and validated against the closed
//! record type of that content type.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use folio_core::content::{validate_document, ContentType};
use folio_core::error::CoreError;
use folio_core::types::ID_FIELD;
use folio_core::wire::{
    list_envelope, BulkCreateRequest, BulkCreateResponse, BulkUpdateRequest, BulkUpdateResponse,
    FailureReason, RecordFailure,
};
use folio_db::models::content_record::ContentRecord;
use folio_db::repositories::ContentRepo;
use serde_json::{Map, Value};

use super::{check_references, ensure_unreferenced, parse_record_id, resolve_collection};
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Fields the server owns; never taken from a request body. `filename`
/// names the stored upload and is only set by the upload handler.
const SERVER_FIELDS: &[&str] = &[ID_FIELD, "createdAt", "updatedAt", "filename"];

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/{collection}
///
/// Returns `{ <listKey>: [...] }` in display order.
pub async fn list_records(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> AppResult<impl IntoResponse> {
    let kind = resolve_collection(&collection)?;
    let records = ContentRepo::list(&state.pool, kind.slug()).await?;
    let documents = records.iter().map(ContentRecord::to_document).collect();

    Ok(Json(list_envelope(kind, documents)))
}

// ---------------------------------------------------------------------------
// Single record
// ---------------------------------------------------------------------------

/// GET /api/{collection}/{id}
pub async fn get_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let kind = resolve_collection(&collection)?;
    let record_id = parse_record_id(kind, &id)?;
    let record = ContentRepo::find_by_id(&state.pool, kind.slug(), record_id)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: kind.entity_name(),
            id: id.clone(),
        })?;

    Ok(Json(DataResponse::ok(record.to_document())))
}

/// PUT /api/{collection}/{id}
///
/// Body: the fields to change. Merged and revalidated like one entry of a
/// bulk update; the id comes from the path.
pub async fn update_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> AppResult<impl IntoResponse> {
    let kind = resolve_collection(&collection)?;
    let updated = update_one(&state, kind, &id, &body).await?;

    tracing::info!(collection = kind.slug(), record_id = %id, "Record updated");

    Ok(Json(DataResponse::ok(updated.to_document())))
}

// ---------------------------------------------------------------------------
// Bulk update / delete
// ---------------------------------------------------------------------------

/// PUT /api/{collection}
///
/// Body: `{ "updated<Name>": [...], "deletedIds": [...] }`. Each listed
/// record is merged over its stored document and revalidated. Records that
/// cannot be applied are reported in `failed`; all others are applied.
pub async fn bulk_update(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> AppResult<impl IntoResponse> {
    let kind = resolve_collection(&collection)?;
    let request = BulkUpdateRequest::from_json(kind, &body)?;

    let mut failed = Vec::new();

    for document in &request.updated {
        let id = document
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if let Err(err) = update_one(&state, kind, &id, document).await {
            failed.push(into_failure(id, err)?);
        }
    }

    for id in &request.deleted_ids {
        if let Err(err) = delete_one(&state, kind, id).await {
            failed.push(into_failure(id.clone(), err)?);
        }
    }

    tracing::info!(
        collection = kind.slug(),
        updated = request.updated.len(),
        deleted = request.deleted_ids.len(),
        failed = failed.len(),
        "Bulk update applied",
    );

    Ok(Json(BulkUpdateResponse::from_failures(kind, failed)))
}

async fn update_one(
    state: &AppState,
    kind: ContentType,
    id: &str,
    document: &Value,
) -> AppResult<ContentRecord> {
    if id.is_empty() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "{} record is missing {ID_FIELD}",
            kind.entity_name()
        ))));
    }
    let record_id = parse_record_id(kind, id)?;
    let existing = ContentRepo::find_by_id(&state.pool, kind.slug(), record_id)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: kind.entity_name(),
            id: id.to_string(),
        })?;

    let merged = merge_fields(&existing.data, document)?;
    let validated = validate_document(kind, &merged)?;
    check_references(&state.pool, &validated.references).await?;

    let updated = ContentRepo::replace_data(&state.pool, kind.slug(), record_id, &validated.data)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: kind.entity_name(),
            id: id.to_string(),
        })?;

    Ok(updated)
}

/// Overlay the request fields onto the stored document.
fn merge_fields(stored: &Value, incoming: &Value) -> Result<Value, CoreError> {
    let incoming = incoming
        .as_object()
        .ok_or_else(|| CoreError::Validation("Updated record must be a JSON object".into()))?;

    let mut merged = match stored {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    for (key, value) in incoming {
        if !SERVER_FIELDS.contains(&key.as_str()) {
            merged.insert(key.clone(), value.clone());
        }
    }
    Ok(Value::Object(merged))
}

/// Drop server-owned fields from a submitted record.
fn without_server_fields(record: &Value) -> Value {
    match record {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| !SERVER_FIELDS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Map a per-record error to a reported failure. Database and internal
/// errors abort the whole request.
fn into_failure(id: String, err: AppError) -> AppResult<RecordFailure> {
    let (reason, message) = match err {
        AppError::Core(core @ CoreError::NotFound { .. }) => {
            (FailureReason::NotFound, core.to_string())
        }
        AppError::Core(CoreError::Validation(msg)) => (FailureReason::Validation, msg),
        AppError::Core(CoreError::Conflict(msg)) => (FailureReason::Conflict, msg),
        other => return Err(other),
    };
    tracing::debug!(record_id = %id, ?reason, %message, "Record not applied");
    Ok(RecordFailure {
        id,
        reason,
        message,
    })
}

// ---------------------------------------------------------------------------
// Bulk create
// ---------------------------------------------------------------------------

/// POST /api/{collection}
///
/// Body: `{ "new<Name>": [...] }`. All records are validated before any is
/// inserted; the insert runs in one transaction. Returns 201 with the
/// created records in submission order.
pub async fn bulk_create(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> AppResult<impl IntoResponse> {
    let kind = resolve_collection(&collection)?;
    let request = BulkCreateRequest::from_json(kind, &body)?;

    let mut documents = Vec::with_capacity(request.records.len());
    for (index, record) in request.records.iter().enumerate() {
        let record = without_server_fields(record);
        let validated = validate_document(kind, &record).map_err(|e| match e {
            CoreError::Validation(msg) => {
                CoreError::Validation(format!("Record {}: {msg}", index + 1))
            }
            other => other,
        })?;
        check_references(&state.pool, &validated.references)
            .await
            .map_err(|e| match e {
                AppError::Core(CoreError::Validation(msg)) => AppError::Core(
                    CoreError::Validation(format!("Record {}: {msg}", index + 1)),
                ),
                other => other,
            })?;
        documents.push(validated.data);
    }

    let created = ContentRepo::create_many(&state.pool, kind.slug(), &documents).await?;

    tracing::info!(
        collection = kind.slug(),
        count = created.len(),
        "Records created",
    );

    let response = BulkCreateResponse {
        records: created.iter().map(ContentRecord::to_document).collect(),
    };
    Ok((StatusCode::CREATED, Json(response.to_json(kind))))
}

// ---------------------------------------------------------------------------
// Single delete
// ---------------------------------------------------------------------------

/// DELETE /api/{collection}/{id}
///
/// Returns 204 on success, 404 if absent, 409 when other records still
/// reference it.
pub async fn delete_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    let kind = resolve_collection(&collection)?;
    delete_one(&state, kind, &id).await?;

    tracing::info!(collection = kind.slug(), record_id = %id, "Record deleted");

    Ok(StatusCode::NO_CONTENT)
}

async fn delete_one(state: &AppState, kind: ContentType, id: &str) -> AppResult<()> {
    let record_id = parse_record_id(kind, id)?;
    ensure_unreferenced(&state.pool, kind, record_id).await?;

    let deleted = ContentRepo::delete(&state.pool, kind.slug(), record_id)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: kind.entity_name(),
            id: id.to_string(),
        })?;

    if let Some(filename) = deleted.stored_filename() {
        state.storage.remove_logged(filename).await;
    }
    Ok(())
}
