//! # Download API
//!
//! `GET /download/{content_id}` streams the stored bytes back without
//! buffering them.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use fgate_core::ContentId;

use crate::download::{Download, DownloadError};
use crate::error::AppError;
use crate::state::AppState;

/// Build the download router.
pub fn router() -> Router<AppState> {
    Router::new().route("/download/{content_id}", get(download_file))
}

/// `GET /download/{content_id}`: stream a stored file.
///
/// A malformed content id cannot be in the catalog, so it is reported as
/// not found without reaching the gateway.
async fn download_file(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Response, AppError> {
    let result = match ContentId::new(raw.as_str()) {
        Ok(content_id) => state.downloader.download(&content_id).await,
        Err(_) => Err(DownloadError::NotFound(raw)),
    };

    let outcome = match &result {
        Ok(_) => "started",
        Err(DownloadError::NotFound(_)) => "not_found",
        Err(DownloadError::InconsistentState(_)) => "inconsistent",
        Err(DownloadError::Gateway(_)) => "gateway_error",
        Err(DownloadError::Internal(_)) => "internal",
    };
    state.metrics.record_download(outcome);

    let Download { record, stream } = result?;
    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", record.file_name),
        ),
        (header::CONTENT_LENGTH, record.size_bytes.to_string()),
    ];
    Ok((headers, Body::from_stream(stream)).into_response())
}
