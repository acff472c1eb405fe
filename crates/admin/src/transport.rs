//! The seam between the reconciler and the content API.

use async_trait::async_trait;
use folio_core::content::ContentType;
use folio_core::types::RecordId;
use folio_core::wire::{
    BulkCreateRequest, BulkCreateResponse, BulkUpdateRequest, BulkUpdateResponse,
};
use serde_json::Value;

use crate::error::TransportError;

/// Calls the reconciler makes against one content API.
///
/// Implemented over HTTP by [`crate::client::HttpResourceClient`]; tests
/// substitute an in-memory recorder.
#[async_trait]
pub trait ResourceTransport: Send + Sync {
    /// `GET /api/{T}`. Returns the raw body; the caller normalizes its shape.
    async fn list(&self, kind: ContentType) -> Result<Value, TransportError>;

    /// `PUT /api/{T}`.
    async fn bulk_update(
        &self,
        kind: ContentType,
        request: &BulkUpdateRequest,
    ) -> Result<BulkUpdateResponse, TransportError>;

    /// `POST /api/{T}`.
    async fn bulk_create(
        &self,
        kind: ContentType,
        request: &BulkCreateRequest,
    ) -> Result<BulkCreateResponse, TransportError>;

    /// `DELETE /api/{T}/{id}`.
    async fn delete_one(&self, kind: ContentType, id: &RecordId) -> Result<(), TransportError>;
}
