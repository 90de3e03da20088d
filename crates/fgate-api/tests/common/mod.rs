//! Shared helpers for fgate-api integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use bytes::Bytes;
use fgate_api::catalog::{Catalog, MemoryCatalog};
use fgate_api::state::{AppConfig, AppState};
use fgate_core::{CommitStatus, ContentId, FileSystemId, FileSystemToken};
use fgate_gateway::{
    ByteStream, ContentInfo, CreatedFileSystem, GatewayError, StorageGateway, UploadStream,
};
use futures::StreamExt;
use http_body_util::BodyExt;
use parking_lot::Mutex;
use tempfile::TempDir;

/// Per-operation call counters.
#[derive(Debug, Default)]
pub struct Calls {
    pub create: AtomicUsize,
    pub hot: AtomicUsize,
    pub commit: AtomicUsize,
    pub info: AtomicUsize,
    pub get: AtomicUsize,
    pub health: AtomicUsize,
}

impl Calls {
    pub fn total(&self) -> usize {
        [
            &self.create,
            &self.hot,
            &self.commit,
            &self.info,
            &self.get,
            &self.health,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }
}

/// In-process gateway double with scripted failures and call counting.
pub struct ScriptedGateway {
    pub calls: Calls,
    hot_failure: Option<String>,
    get_failure: Option<String>,
    health_failure: Option<String>,
    /// Statuses returned by successive `info` calls; the last one repeats.
    statuses: Mutex<Vec<CommitStatus>>,
    create_delay: Duration,
    hot_delay: Duration,
    content: Mutex<HashMap<String, Bytes>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            calls: Calls::default(),
            hot_failure: None,
            get_failure: None,
            health_failure: None,
            statuses: Mutex::new(vec![CommitStatus::Committed]),
            create_delay: Duration::ZERO,
            hot_delay: Duration::ZERO,
            content: Mutex::new(HashMap::new()),
        }
    }

    pub fn failing_hot_set(mut self, body: &str) -> Self {
        self.hot_failure = Some(body.to_string());
        self
    }

    pub fn failing_get(mut self, body: &str) -> Self {
        self.get_failure = Some(body.to_string());
        self
    }

    pub fn failing_health(mut self, body: &str) -> Self {
        self.health_failure = Some(body.to_string());
        self
    }

    pub fn with_statuses(self, statuses: Vec<CommitStatus>) -> Self {
        *self.statuses.lock() = statuses;
        self
    }

    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    pub fn with_hot_delay(mut self, delay: Duration) -> Self {
        self.hot_delay = delay;
        self
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn api_error(endpoint: &str, status: u16, body: &str) -> GatewayError {
        GatewayError::Api {
            endpoint: endpoint.to_string(),
            status,
            body: body.to_string(),
        }
    }
}

#[async_trait]
impl StorageGateway for ScriptedGateway {
    async fn create_file_system(&self) -> Result<CreatedFileSystem, GatewayError> {
        let n = self.calls.create.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.create_delay).await;
        Ok(CreatedFileSystem {
            id: FileSystemId::new(format!("fs-{n}")).unwrap(),
            token: FileSystemToken::new(format!("tok-{n}")).unwrap(),
        })
    }

    async fn add_to_hot_set(
        &self,
        mut data: UploadStream,
        _token: &FileSystemToken,
    ) -> Result<ContentId, GatewayError> {
        self.calls.hot.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.hot_delay).await;
        if let Some(body) = &self.hot_failure {
            return Err(Self::api_error("POST /ffs/hot", 503, body));
        }
        let mut buf = Vec::new();
        while let Some(chunk) = data.next().await {
            buf.extend_from_slice(&chunk?);
        }
        let cid = fgate_gateway_stub::content_id(&buf);
        self.content.lock().insert(cid.clone(), Bytes::from(buf));
        Ok(ContentId::new(cid).unwrap())
    }

    async fn commit(&self, _cid: &ContentId, _token: &FileSystemToken) -> Result<(), GatewayError> {
        self.calls.commit.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn info(
        &self,
        cid: &ContentId,
        _token: &FileSystemToken,
    ) -> Result<ContentInfo, GatewayError> {
        self.calls.info.fetch_add(1, Ordering::SeqCst);
        let status = {
            let mut statuses = self.statuses.lock();
            if statuses.len() > 1 {
                statuses.remove(0)
            } else {
                statuses[0]
            }
        };
        let message = (status == CommitStatus::Failed).then(|| "deal rejected".to_string());
        Ok(ContentInfo {
            cid: cid.clone(),
            status,
            message,
        })
    }

    async fn get(
        &self,
        cid: &ContentId,
        _token: &FileSystemToken,
    ) -> Result<ByteStream, GatewayError> {
        self.calls.get.fetch_add(1, Ordering::SeqCst);
        if let Some(body) = &self.get_failure {
            return Err(Self::api_error("GET /ffs/get", 500, body));
        }
        let data = self
            .content
            .lock()
            .get(cid.as_str())
            .cloned()
            .ok_or_else(|| Self::api_error("GET /ffs/get", 404, "not found"))?;
        let chunks: Vec<Result<Bytes, GatewayError>> = data
            .chunks(100)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    async fn health(&self) -> Result<(), GatewayError> {
        self.calls.health.fetch_add(1, Ordering::SeqCst);
        match &self.health_failure {
            Some(body) => Err(Self::api_error("GET /health", 503, body)),
            None => Ok(()),
        }
    }
}

/// Test configuration rooted at a fresh temporary upload directory.
pub fn test_config(dir: &TempDir) -> AppConfig {
    AppConfig {
        upload_dir: dir.path().join("uploads"),
        commit_poll_attempts: 3,
        commit_poll_interval: Duration::from_millis(1),
        gateway_timeout: Duration::from_secs(5),
        ..AppConfig::default()
    }
}

/// App state over a scripted gateway and an in-memory catalog.
pub fn test_state(
    gateway: Arc<ScriptedGateway>,
    config: AppConfig,
) -> (AppState, Arc<MemoryCatalog>) {
    let catalog = Arc::new(MemoryCatalog::new());
    let state = AppState::new(config, catalog.clone() as Arc<dyn Catalog>, gateway).unwrap();
    (state, catalog)
}

pub const BOUNDARY: &str = "fgate-test-boundary";

/// Build a `POST /files` request with a single multipart field.
pub fn multipart_upload(field: &str, file_name: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/files")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Read response body as bytes.
pub async fn body_bytes(response: axum::http::Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

/// Read response body as JSON.
pub async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// 1024 bytes of recognisable content.
pub fn report_bytes() -> Vec<u8> {
    (0..1024u32).map(|i| (i * 7 % 256) as u8).collect()
}

/// Files currently in the staging area.
pub fn staged_files(config: &AppConfig) -> Vec<String> {
    match std::fs::read_dir(config.upload_dir.join(fgate_api::upload::STAGING_DIR)) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}
