//! Folder handlers

use crate::{ApiError, AppState, ErrorCode};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use filegate_core::CoreError;
use std::sync::Arc;

/// DELETE /remove/folders/{directory} - Delete every object in a folder
pub async fn delete_folder(
    State(state): State<Arc<AppState>>,
    Path(directory): Path<String>,
) -> Result<Response, ApiError> {
    let removal = state
        .gateway
        .delete_folder(&directory)
        .await
        .map_err(|e| match e {
            CoreError::Storage(_) => ApiError::new(
                ErrorCode::StorageUnavailable,
                format!("Unable to delete folder: {}", directory),
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
