use axum::{
    extract::{
        multipart::{Multipart, MultipartError, MultipartRejection},
        State,
    },
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::ImportError;
use crate::ingest::ImportSummary;
use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::services::ImportService;

/// Multipart field carrying the spreadsheet.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    #[serde(flatten)]
    pub summary: ImportSummary,
}

pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart =
        multipart.map_err(|rejection| ImportError::InvalidRequest(rejection.body_text()))?;
    let limit = state.max_upload_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_error(err, limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| multipart_error(err, limit))?;
        if bytes.len() > limit {
            return Err(ImportError::FileTooLarge { limit }.into());
        }

        info!("Received upload '{}' ({} bytes)", file_name, bytes.len());
        let summary = ImportService::new(state.db.clone())
            .import_file(&file_name, &bytes)
            .await?;
        if summary.failed > 0 {
            warn!(
                "Upload '{}' had {} rejected rows",
                file_name, summary.failed
            );
        }

        return Ok(Json(UploadResponse {
            message: summary.message(),
            summary,
        }));
    }

    Err(ImportError::MissingFile.into())
}

fn multipart_error(err: MultipartError, limit: usize) -> ImportError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ImportError::FileTooLarge { limit }
    } else {
        ImportError::InvalidRequest(err.body_text())
    }
}
