//! File handlers: upload, retrieve, remove

use crate::multipart::read_upload_parts;
use crate::{ApiError, AppState, ErrorCode};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use filegate_core::{validate_directory, CoreError, NamingMode};
use serde::Deserialize;
use std::sync::Arc;

/// Query parameters for uploads
#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    #[serde(rename = "generate-file-name")]
    pub generate_file_name: Option<String>,
}

impl UploadParams {
    /// Only a case-insensitive `true` turns generation on
    pub fn naming_mode(&self) -> NamingMode {
        let generate = self
            .generate_file_name
            .as_deref()
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
        NamingMode::from_flag(generate)
    }
}

/// POST /{directory}/upload/files - Upload one or more files
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    Path(directory): Path<String>,
    Query(params): Query<UploadParams>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    // Reject a bad target before any of the body is read
    validate_directory(&directory)?;

    let mut multipart = multipart
        .map_err(|e| ApiError::new(ErrorCode::InvalidArgument, e.body_text()))?;

    let mode = params.naming_mode();
    let parts = read_upload_parts(&mut multipart, state.config.upload_limits(), mode).await?;
    let filenames = state.gateway.upload(&directory, mode, parts).await?;

    Ok((StatusCode::OK, Json(filenames)).into_response())
}

/// GET /{directory}/retrieve/files/{filename} - Retrieve a file
pub async fn fetch_file(
    State(state): State<Arc<AppState>>,
    Path((directory, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let blob = state.gateway.fetch(&directory, &filename).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, blob.content_type),
            (header::CONTENT_LENGTH, blob.content.len().to_string()),
        ],
        blob.content,
    )
        .into_response())
}

/// DELETE /{directory}/remove/files/{filename} - Remove a file
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path((directory, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let removal = state
        .gateway
        .delete_file(&directory, &filename)
        .await
        .map_err(|e| match e {
            CoreError::Storage(_) => ApiError::new(
                ErrorCode::StorageUnavailable,
                format!("Unable to delete file: {}", filename),
            ),
            other => other.into(),
        })?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, mime::TEXT_PLAIN_UTF_8.as_ref())],
        removal.message(),
    )
        .into_response())
}
