//! Reading `multipart/form-data` upload bodies

use crate::error::{ApiError, ErrorCode};
use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use bytes::BytesMut;
use filegate_core::{validate_filename, NamingMode, UploadPart};
use tracing::debug;

/// Form field carrying the uploaded files
pub const FILES_FIELD: &str = "files";

/// Per-request upload bounds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadLimits {
    /// Most file parts accepted in one request
    pub max_parts: usize,
    /// Largest single part, in bytes
    pub max_part_size: usize,
}

/// Collect every `files` part into memory, in request order.
///
/// Other form fields are drained and ignored. When names are preserved, each
/// filename is checked before any of its content is read.
pub async fn read_upload_parts(
    multipart: &mut Multipart,
    limits: UploadLimits,
    mode: NamingMode,
) -> Result<Vec<UploadPart>, ApiError> {
    let mut parts = Vec::new();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILES_FIELD) {
            debug!(field = ?field.name(), "Skipping non-file form field");
            continue;
        }

        if parts.len() == limits.max_parts {
            return Err(ApiError::new(
                ErrorCode::TooManyParts,
                format!("At most {} files may be uploaded at once", limits.max_parts),
            ));
        }

        let filename = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(ApiError::new(
                    ErrorCode::InvalidArgument,
                    "Each file part must carry a filename",
                ))
            }
        };
        if mode == NamingMode::Preserve {
            validate_filename(&filename)?;
        }

        let mut data = BytesMut::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            if data.len() + chunk.len() > limits.max_part_size {
                return Err(ApiError::new(
                    ErrorCode::EntityTooLarge,
                    format!("File {} exceeds the {} byte limit", filename, limits.max_part_size),
                ));
            }
            data.extend_from_slice(&chunk);
        }

        debug!(filename = %filename, size = data.len(), "Read upload part");
        parts.push(UploadPart::new(filename, data.freeze()));
    }

    Ok(parts)
}

/// Map a multipart parsing failure onto an API error
pub fn multipart_error(err: MultipartError) -> ApiError {
    let code = if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ErrorCode::EntityTooLarge
    } else {
        ErrorCode::InvalidArgument
    };
    ApiError::new(code, err.body_text())
}
