//! # File Listing and Upload API
//!
//! `GET /files` lists recorded uploads newest first. `POST /files` accepts
//! a multipart form whose `uploadfile` field carries the file, and runs it
//! through the upload/commit orchestrator.

use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use fgate_core::FileRecord;
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;
use crate::upload::{UploadError, UploadOutcome};

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "uploadfile";

/// One uploaded file as shown to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileView {
    pub content_id: String,
    pub file_name: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    pub file_system_id: String,
    pub download_url: String,
}

impl From<&FileRecord> for FileView {
    fn from(record: &FileRecord) -> Self {
        Self {
            content_id: record.content_id.to_string(),
            file_name: record.file_name.to_string(),
            size_bytes: record.size_bytes,
            uploaded_at: record.uploaded_at,
            file_system_id: record.file_system_id.to_string(),
            download_url: format!("/download/{}", record.content_id),
        }
    }
}

/// Response body for `GET /files`.
#[derive(Debug, Serialize, Deserialize)]
pub struct FileListResponse {
    pub files: Vec<FileView>,
}

/// Response body for `POST /files`.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub file: FileView,
}

/// Build the files router.
pub fn router() -> Router<AppState> {
    Router::new().route("/files", get(list_files).post(upload_file))
}

/// `GET /files`: uploaded files, newest first.
async fn list_files(State(state): State<AppState>) -> Result<Json<FileListResponse>, AppError> {
    let files = state.catalog.list_files().await?;
    Ok(Json(FileListResponse {
        files: files.iter().map(FileView::from).collect(),
    }))
}

/// `POST /files`: upload a file and commit it through the gateway.
///
/// Responds `201` for a new record and `200` when the content was already
/// stored.
async fn upload_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let result = receive(&state, &headers, multipart).await;

    let outcome = match &result {
        Ok(UploadOutcome::Committed(_)) => "committed",
        Ok(UploadOutcome::AlreadyStored(_)) => "duplicate",
        Err(AppError::InvalidInput(_) | AppError::PayloadTooLarge(_)) => "invalid",
        Err(AppError::Gateway(_)) => "gateway_error",
        Err(_) => "internal",
    };
    state.metrics.record_upload(outcome);

    let outcome = result?;
    let status = match outcome {
        UploadOutcome::Committed(_) => StatusCode::CREATED,
        UploadOutcome::AlreadyStored(_) => StatusCode::OK,
    };
    Ok((
        status,
        Json(UploadResponse {
            message: outcome.message(),
            file: FileView::from(outcome.record()),
        }),
    ))
}

async fn receive(
    state: &AppState,
    headers: &HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UploadOutcome, AppError> {
    let limit = state.config.max_upload_bytes;
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len > limit as u64) {
        return Err(AppError::PayloadTooLarge(format!(
            "upload exceeds the {limit} byte limit"
        )));
    }

    let mut multipart =
        multipart.map_err(|e| AppError::InvalidInput(format!("expected a multipart form: {e}")))?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let original_name = field.file_name().unwrap_or_default().to_string();
        if original_name.is_empty() {
            return Err(AppError::InvalidInput("no file selected".into()));
        }
        let overflow = AtomicBool::new(false);
        let body = field.inspect_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                overflow.store(true, Ordering::Relaxed);
            }
        });
        let result = state.uploader.upload_stream(&original_name, body).await;
        if overflow.load(Ordering::Relaxed) {
            return Err(AppError::PayloadTooLarge(format!(
                "upload exceeds the {limit} byte limit"
            )));
        }
        return result.map_err(AppError::from);
    }

    Err(UploadError::InvalidInput(format!("missing multipart field '{UPLOAD_FIELD}'")).into())
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::InvalidInput(err.body_text())
    }
}
