//! File handlers for Web API.
//!
//! - `POST /upload`: multipart body with `file`, `user` and
//!   `fileCreationDate` (`yyyy-MM-dd`) parts; `user` and `fileCreationDate`
//!   may also come from the query string
//! - `GET /metadata?user={user}&fileCreationDate={date}`: metadata records
//!   owned by `user`, optionally filtered by creation date

use axum::{
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::file::MetadataMap;
use crate::web::dto::{MetadataQuery, UploadForm, UploadParams};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Message returned after a successful upload.
pub const UPLOAD_SUCCESS: &str = "File successfully uploaded";

/// Message returned by the index route.
pub const WELCOME: &str = "Welcome, Guest...!";

/// GET / - Welcome message.
pub async fn index() -> &'static str {
    WELCOME
}

fn multipart_error(e: MultipartError, what: &str) -> ApiError {
    tracing::error!("Failed to read {}: {}", what, e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("File too large")
    } else {
        ApiError::bad_request(format!("Invalid multipart data in {what}"))
    }
}

/// POST /upload - Upload a file with its owner and creation date.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> Result<&'static str, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "request"))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let file_name = field
                    .file_name()
                    .filter(|s| !s.is_empty())
                    .unwrap_or(&name)
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, "file content"))?;
                form.file_name = Some(file_name);
                form.content = Some(bytes.to_vec());
            }
            "user" => {
                form.user = Some(field.text().await.map_err(|e| multipart_error(e, "user"))?);
            }
            "fileCreationDate" => {
                form.file_creation_date = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| multipart_error(e, "fileCreationDate"))?,
                );
            }
            _ => {}
        }
    }

    form.fill_from(params);
    let container = form.into_container()?;

    if container.size() as u64 > state.max_upload_size {
        let max_mb = state.max_upload_size / 1024 / 1024;
        return Err(ApiError::payload_too_large(format!(
            "File too large (max {}MB)",
            max_mb
        )));
    }

    let service = state.service.clone();
    tokio::task::spawn_blocking(move || service.upload(container))
        .await
        .map_err(|e| {
            tracing::error!("Upload task failed: {}", e);
            ApiError::internal("Failed to store file")
        })??;

    Ok(UPLOAD_SUCCESS)
}

/// GET /metadata - Find metadata records for a user.
pub async fn get_metadata(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MetadataQuery>,
) -> Result<Json<Vec<MetadataMap>>, ApiError> {
    let user = query.user()?.to_string();
    let creation_date = query.creation_date()?;

    let service = state.service.clone();
    let records = tokio::task::spawn_blocking(move || service.query(&user, creation_date))
        .await
        .map_err(|e| {
            tracing::error!("Metadata query task failed: {}", e);
            ApiError::internal("Failed to read file metadata")
        })??;

    Ok(Json(records))
}
