//! # Download, Listing and Probe Integration Tests

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, StatusCode};
use common::*;
use fgate_api::catalog::{Catalog, CatalogError, MemoryCatalog};
use fgate_api::state::AppState;
use fgate_core::{ContentId, FileRecord, FileSystemId, FileSystemRecord};
use tower::ServiceExt;

// -- Download -----------------------------------------------------------------

#[tokio::test]
async fn unknown_content_id_is_not_found_without_gateway_call() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(ScriptedGateway::new());
    let (state, _) = test_state(gateway.clone(), test_config(&dir));

    let response = fgate_api::app(state)
        .oneshot(get("/download/bafkunknown"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "NOT_FOUND");
    assert_eq!(gateway.calls.total(), 0);
}

#[tokio::test]
async fn malformed_content_id_is_not_found_without_gateway_call() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(ScriptedGateway::new());
    let (state, _) = test_state(gateway.clone(), test_config(&dir));

    let response = fgate_api::app(state)
        .oneshot(get("/download/not..a..cid"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(gateway.calls.total(), 0);
}

#[tokio::test]
async fn upload_then_download_returns_identical_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(ScriptedGateway::new());
    let (state, _) = test_state(gateway.clone(), test_config(&dir));
    let app = fgate_api::app(state);

    let data = report_bytes();
    let upload = app
        .clone()
        .oneshot(multipart_upload("uploadfile", "report.pdf", &data))
        .await
        .unwrap();
    let cid = body_json(upload).await["file"]["content_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(get(&format!("/download/{cid}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"report.pdf\""
    );
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "1024");
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    let body = body_bytes(response).await;
    assert_eq!(body.len(), 1024);
    assert_eq!(&body[..], &data[..]);
    assert_eq!(ScriptedGateway::count(&gateway.calls.get), 1);
}

#[tokio::test]
async fn gateway_failure_on_get_is_bad_gateway() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(ScriptedGateway::new().failing_get("retrieval unavailable"));
    let (state, catalog) = test_state(gateway, test_config(&dir));
    let metrics = state.metrics.clone();
    let app = fgate_api::app(state);

    let upload = app
        .clone()
        .oneshot(multipart_upload("uploadfile", "a.txt", b"abc"))
        .await
        .unwrap();
    let cid = body_json(upload).await["file"]["content_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(get(&format!("/download/{cid}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("retrieval unavailable"));
    assert_eq!(catalog.count_files().await.unwrap(), 1);
    assert_eq!(metrics.downloads("gateway_error"), 1);
}

/// Catalog that has lost its namespace rows.
struct DanglingCatalog(MemoryCatalog);

#[async_trait]
impl Catalog for DanglingCatalog {
    async fn default_file_system(&self) -> Result<Option<FileSystemRecord>, CatalogError> {
        self.0.default_file_system().await
    }
    async fn insert_file_system(&self, record: &FileSystemRecord) -> Result<(), CatalogError> {
        self.0.insert_file_system(record).await
    }
    async fn file_system(
        &self,
        _id: &FileSystemId,
    ) -> Result<Option<FileSystemRecord>, CatalogError> {
        Ok(None)
    }
    async fn insert_file(&self, record: &FileRecord) -> Result<(), CatalogError> {
        self.0.insert_file(record).await
    }
    async fn file_by_content_id(
        &self,
        content_id: &ContentId,
    ) -> Result<Option<FileRecord>, CatalogError> {
        self.0.file_by_content_id(content_id).await
    }
    async fn list_files(&self) -> Result<Vec<FileRecord>, CatalogError> {
        self.0.list_files().await
    }
    async fn count_files(&self) -> Result<u64, CatalogError> {
        self.0.count_files().await
    }
    async fn ping(&self) -> Result<(), CatalogError> {
        Ok(())
    }
}

#[tokio::test]
async fn dangling_namespace_is_inconsistent_state() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(ScriptedGateway::new());
    let catalog = Arc::new(DanglingCatalog(MemoryCatalog::new()));
    let state = AppState::new(test_config(&dir), catalog, gateway.clone()).unwrap();
    let app = fgate_api::app(state);

    let upload = app
        .clone()
        .oneshot(multipart_upload("uploadfile", "a.txt", b"abc"))
        .await
        .unwrap();
    assert_eq!(upload.status(), StatusCode::CREATED);
    let cid = body_json(upload).await["file"]["content_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(get(&format!("/download/{cid}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "INCONSISTENT_STATE");
    assert_eq!(json["error"]["message"], "An internal error occurred");
    assert_eq!(ScriptedGateway::count(&gateway.calls.get), 0);
}

// -- Listing ------------------------------------------------------------------

#[tokio::test]
async fn list_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(Arc::new(ScriptedGateway::new()), test_config(&dir));
    let response = fgate_api::app(state).oneshot(get("/files")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["files"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn list_shows_uploaded_files_with_download_links() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(Arc::new(ScriptedGateway::new()), test_config(&dir));
    let app = fgate_api::app(state);

    for (name, data) in [("a.txt", &b"alpha"[..]), ("b.txt", &b"bravo"[..])] {
        app.clone()
            .oneshot(multipart_upload("uploadfile", name, data))
            .await
            .unwrap();
    }

    let response = app.oneshot(get("/files")).await.unwrap();
    let json = body_json(response).await;
    let files = json["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    for file in files {
        let cid = file["content_id"].as_str().unwrap();
        assert_eq!(file["download_url"], format!("/download/{cid}"));
        assert_eq!(file["file_system_id"], "fs-0");
    }
}

// -- Probes -------------------------------------------------------------------

#[tokio::test]
async fn liveness_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(Arc::new(ScriptedGateway::new()), test_config(&dir));
    let response = fgate_api::app(state)
        .oneshot(get("/health/liveness"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&body_bytes(response).await[..], b"ok");
}

#[tokio::test]
async fn readiness_probes_gateway() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(ScriptedGateway::new());
    let (state, _) = test_state(gateway.clone(), test_config(&dir));
    let response = fgate_api::app(state)
        .oneshot(get("/health/readiness"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&body_bytes(response).await[..], b"ready");
    assert_eq!(ScriptedGateway::count(&gateway.calls.health), 1);
}

#[tokio::test]
async fn readiness_fails_when_gateway_is_down() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(ScriptedGateway::new().failing_health("lotus offline"));
    let (state, _) = test_state(gateway, test_config(&dir));
    let response = fgate_api::app(state)
        .oneshot(get("/health/readiness"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = String::from_utf8(body_bytes(response).await.to_vec()).unwrap();
    assert!(body.contains("gateway unreachable"));
}

#[tokio::test]
async fn metrics_endpoint_reports_catalog_size() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(Arc::new(ScriptedGateway::new()), test_config(&dir));
    let app = fgate_api::app(state);

    app.clone()
        .oneshot(multipart_upload("uploadfile", "a.txt", b"alpha"))
        .await
        .unwrap();
    app.clone().oneshot(get("/download/bafkmissing")).await.unwrap();

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(body_bytes(response).await.to_vec()).unwrap();
    assert!(text.contains("fgate_files_total 1"));
    assert!(text.contains("fgate_uploads_total{outcome=\"committed\"} 1"));
    assert!(text.contains("fgate_downloads_total{outcome=\"not_found\"} 1"));
    assert!(text.contains("fgate_http_requests_total"));
}
