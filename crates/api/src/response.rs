//! Shared response envelope types for API handlers.
//!
//! List and bulk endpoints answer with content-specific keys built in
//! `folio_core::wire`; everything else uses the envelopes below.

use serde::Serialize;

/// Standard `{ "success": true, "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse::ok(upload)))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Result of a successful image upload.
#[derive(Debug, Serialize)]
pub struct UploadResult {
    /// Public URL of the stored image.
    pub url: String,
    /// Stored file name, kept on the record for later cleanup.
    pub filename: String,
    /// The updated record.
    pub record: serde_json::Value,
}
