//! End-to-end tests over real HTTP against the in-process gateway stub.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::*;
use fgate_api::catalog::{Catalog, MemoryCatalog};
use fgate_api::state::AppState;
use fgate_core::CommitStatus;
use fgate_gateway::{GatewayConfig, HttpGateway};
use fgate_gateway_stub::StubState;
use tower::ServiceExt;

/// Serve the stub on an ephemeral port and return an HTTP gateway client for it.
async fn spawn_stub(stub: StubState) -> HttpGateway {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, fgate_gateway_stub::router(stub))
            .await
            .unwrap();
    });
    HttpGateway::new(&GatewayConfig::local_mock(port).unwrap()).unwrap()
}

#[tokio::test]
async fn report_round_trips_through_gateway_stub() {
    let dir = tempfile::tempdir().unwrap();
    let stub = StubState::new();
    let gateway = spawn_stub(stub.clone()).await;
    let config = test_config(&dir);
    let catalog = Arc::new(MemoryCatalog::new());
    let state = AppState::new(config.clone(), catalog.clone(), Arc::new(gateway)).unwrap();
    let app = fgate_api::app(state);

    let data = report_bytes();
    let upload = app
        .clone()
        .oneshot(multipart_upload("uploadfile", "report.pdf", &data))
        .await
        .unwrap();
    assert_eq!(upload.status(), StatusCode::CREATED);
    let json = body_json(upload).await;
    let cid = json["file"]["content_id"].as_str().unwrap().to_string();
    assert_eq!(cid, fgate_gateway_stub::content_id(&data));
    assert_eq!(json["message"], "'report.pdf' uploaded to Filecoin.");
    assert_eq!(stub.namespaces().len(), 1);
    assert_eq!(catalog.count_files().await.unwrap(), 1);
    assert!(staged_files(&config).is_empty());

    let stored = std::fs::read(config.upload_dir.join(&cid).join("report.pdf")).unwrap();
    assert_eq!(stored, data);

    let download = app
        .oneshot(get(&format!("/download/{cid}")))
        .await
        .unwrap();
    assert_eq!(download.status(), StatusCode::OK);
    let body = body_bytes(download).await;
    assert_eq!(body.len(), 1024);
    assert_eq!(&body[..], &data[..]);
}

#[tokio::test]
async fn failed_commitment_is_reported_and_nothing_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = spawn_stub(StubState::with_commit_outcome(CommitStatus::Failed)).await;
    let config = test_config(&dir);
    let catalog = Arc::new(MemoryCatalog::new());
    let state = AppState::new(config.clone(), catalog.clone(), Arc::new(gateway)).unwrap();

    let response = fgate_api::app(state)
        .oneshot(multipart_upload("uploadfile", "report.pdf", &report_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "GATEWAY_ERROR");
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("commitment failed"));
    assert_eq!(catalog.count_files().await.unwrap(), 0);
    assert_eq!(staged_files(&config).len(), 1);
}
