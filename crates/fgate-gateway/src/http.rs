//! Typed client for the gateway HTTP API.
//!
//! ## API Paths
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/ffs/create` | Create namespace |
//! | POST   | `/ffs/hot` | Add streamed body to hot set |
//! | POST   | `/ffs/push/{cid}` | Commit content |
//! | GET    | `/ffs/info/{cid}` | Commitment status |
//! | GET    | `/ffs/get/{cid}` | Stream content |
//! | GET    | `/health` | Liveness |
//!
//! Namespace-scoped calls send the credential in [`TOKEN_HEADER`].

use std::time::Duration;

use async_trait::async_trait;
use fgate_core::{ContentId, FileSystemToken};
use futures::TryStreamExt;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::types::{AddedContent, ContentInfo, CreatedFileSystem, TOKEN_HEADER};
use crate::{ByteStream, StorageGateway, UploadStream};

/// HTTP implementation of [`StorageGateway`].
#[derive(Debug, Clone)]
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: url::Url,
}

impl HttpGateway {
    /// Create a new gateway client from configuration.
    ///
    /// Only the connect phase is bounded here; whole-call bounds are applied
    /// by callers so long transfers are not cut off by a client-wide limit.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| GatewayError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self {
            http,
            base_url: config.address.clone(),
        })
    }

    /// Base URL this client talks to.
    pub fn base_url(&self) -> &url::Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    async fn send(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, GatewayError> {
        let resp = request.send().await.map_err(|e| GatewayError::Http {
            endpoint: endpoint.to_string(),
            source: e,
        })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                endpoint: endpoint.to_string(),
                status,
                body,
            });
        }
        Ok(resp)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        endpoint: &str,
        resp: reqwest::Response,
    ) -> Result<T, GatewayError> {
        resp.json().await.map_err(|e| GatewayError::Deserialization {
            endpoint: endpoint.to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl StorageGateway for HttpGateway {
    /// Calls `POST {base_url}/ffs/create`.
    async fn create_file_system(&self) -> Result<CreatedFileSystem, GatewayError> {
        let endpoint = "POST /ffs/create";
        let resp = self
            .send(endpoint, self.http.post(self.url("/ffs/create")))
            .await?;
        Self::decode(endpoint, resp).await
    }

    /// Calls `POST {base_url}/ffs/hot` with the data as a streamed body.
    async fn add_to_hot_set(
        &self,
        data: UploadStream,
        token: &FileSystemToken,
    ) -> Result<ContentId, GatewayError> {
        let endpoint = "POST /ffs/hot";
        let request = self
            .http
            .post(self.url("/ffs/hot"))
            .header(TOKEN_HEADER, token.expose())
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(reqwest::Body::wrap_stream(data));
        let resp = self.send(endpoint, request).await?;
        let added: AddedContent = Self::decode(endpoint, resp).await?;
        Ok(added.cid)
    }

    /// Calls `POST {base_url}/ffs/push/{cid}`.
    async fn commit(&self, cid: &ContentId, token: &FileSystemToken) -> Result<(), GatewayError> {
        let endpoint = format!("POST /ffs/push/{cid}");
        let request = self
            .http
            .post(self.url(&format!("/ffs/push/{cid}")))
            .header(TOKEN_HEADER, token.expose());
        self.send(&endpoint, request).await?;
        Ok(())
    }

    /// Calls `GET {base_url}/ffs/info/{cid}`.
    async fn info(
        &self,
        cid: &ContentId,
        token: &FileSystemToken,
    ) -> Result<ContentInfo, GatewayError> {
        let endpoint = format!("GET /ffs/info/{cid}");
        let request = self
            .http
            .get(self.url(&format!("/ffs/info/{cid}")))
            .header(TOKEN_HEADER, token.expose());
        let resp = self.send(&endpoint, request).await?;
        let info: ContentInfo = Self::decode(&endpoint, resp).await?;
        if &info.cid != cid {
            return Err(GatewayError::InvalidResponse {
                endpoint,
                reason: format!("status reported for {} instead of {cid}", info.cid),
            });
        }
        Ok(info)
    }

    /// Calls `GET {base_url}/ffs/get/{cid}` and hands back the body stream
    /// without buffering it.
    async fn get(
        &self,
        cid: &ContentId,
        token: &FileSystemToken,
    ) -> Result<ByteStream, GatewayError> {
        let endpoint = format!("GET /ffs/get/{cid}");
        let request = self
            .http
            .get(self.url(&format!("/ffs/get/{cid}")))
            .header(TOKEN_HEADER, token.expose());
        let resp = self.send(&endpoint, request).await?;
        let stream = resp.bytes_stream().map_err(move |e| GatewayError::Http {
            endpoint: endpoint.clone(),
            source: e,
        });
        Ok(Box::pin(stream))
    }

    /// Calls `GET {base_url}/health`.
    async fn health(&self) -> Result<(), GatewayError> {
        self.send("GET /health", self.http.get(self.url("/health")))
            .await?;
        Ok(())
    }
}
