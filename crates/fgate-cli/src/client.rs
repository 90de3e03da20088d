//! # HTTP client for the fgate API
//!
//! Thin typed wrapper over `reqwest`. Uploads stream the local file as the
//! `uploadfile` multipart field; downloads stream the response body to disk
//! through a `<uuid>.part` file that is renamed once complete, so the
//! temporary name never depends on the length of the real one.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use url::Url;
use uuid::Uuid;

/// Multipart field name the upload endpoint reads.
pub const UPLOAD_FIELD: &str = "uploadfile";

/// One catalogued file as listed by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct FileSummary {
    pub content_id: String,
    pub file_name: String,
    pub size_bytes: u64,
    pub uploaded_at: String,
    pub file_system_id: String,
    pub download_url: String,
}

#[derive(Debug, Deserialize)]
struct FileList {
    files: Vec<FileSummary>,
}

/// Result of `POST /files`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadSummary {
    pub message: String,
    pub file: FileSummary,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Client for a running fgate API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid API URL \"{base_url}\""))?;
        let http = reqwest::Client::builder()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// `GET /files`, newest first.
    pub async fn list_files(&self) -> Result<Vec<FileSummary>> {
        let resp = self
            .http
            .get(self.url("/files"))
            .send()
            .await
            .context("GET /files failed")?;
        let resp = check(resp).await?;
        let list: FileList = resp.json().await.context("invalid file list")?;
        Ok(list.files)
    }

    /// Upload a local file. The file is streamed, never read into memory.
    pub async fn upload(&self, path: &Path) -> Result<UploadSummary> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("{} has no usable file name", path.display()))?
            .to_string();
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("cannot open {}", path.display()))?;
        let len = file
            .metadata()
            .await
            .with_context(|| format!("cannot stat {}", path.display()))?
            .len();

        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let part = reqwest::multipart::Part::stream_with_length(body, len)
            .file_name(name)
            .mime_str("application/octet-stream")?;
        let form = reqwest::multipart::Form::new().part(UPLOAD_FIELD, part);

        let resp = self
            .http
            .post(self.url("/files"))
            .multipart(form)
            .send()
            .await
            .context("POST /files failed")?;
        let resp = check(resp).await?;
        resp.json().await.context("invalid upload response")
    }

    /// Stream `GET /download/{cid}` into `out_dir`, returning the written path.
    ///
    /// The local name comes from the response's `content-disposition` header,
    /// sanitized; the content id is used when the header carries none.
    pub async fn download(&self, content_id: &str, out_dir: &Path) -> Result<PathBuf> {
        let resp = self
            .http
            .get(self.url(&format!("/download/{content_id}")))
            .send()
            .await
            .with_context(|| format!("GET /download/{content_id} failed"))?;
        let resp = check(resp).await?;

        let header_name = resp
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_file_name);
        let name = local_file_name(header_name.as_deref(), content_id)?;

        tokio::fs::create_dir_all(out_dir)
            .await
            .with_context(|| format!("cannot create {}", out_dir.display()))?;
        let target = out_dir.join(&name);
        let part = out_dir.join(format!("{}.part", Uuid::new_v4()));

        let mut file = tokio::fs::File::create(&part)
            .await
            .with_context(|| format!("cannot create {}", part.display()))?;
        let mut stream = resp.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    drop(file);
                    let _ = tokio::fs::remove_file(&part).await;
                    return Err(e).context("download interrupted");
                }
            };
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&part, &target)
            .await
            .with_context(|| format!("cannot move download to {}", target.display()))?;

        tracing::debug!(content_id, bytes = written, path = %target.display(), "download complete");
        Ok(target)
    }
}

/// Turn a non-2xx response into an error carrying the API's error envelope.
async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => bail!(
            "{} {}: {}",
            status.as_u16(),
            envelope.error.code,
            envelope.error.message
        ),
        Err(_) => bail!("{}: {}", status, body),
    }
}

/// Extract the `filename` parameter of a `content-disposition` value.
pub fn attachment_file_name(value: &str) -> Option<String> {
    value.split(';').map(str::trim).find_map(|param| {
        let (key, raw) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let raw = raw.trim();
        let name = match raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
            Some(quoted) => quoted.replace("\\\"", "\""),
            None => raw.to_string(),
        };
        (!name.is_empty()).then_some(name)
    })
}

/// Sanitized local name for a download.
pub fn local_file_name(header_name: Option<&str>, content_id: &str) -> Result<String> {
    let candidate = header_name.unwrap_or(content_id);
    match fgate_core::sanitize_file_name(candidate) {
        Ok(name) => Ok(name.as_str().to_string()),
        Err(_) => fgate_core::sanitize_file_name(content_id)
            .map(|name| name.as_str().to_string())
            .with_context(|| format!("no usable local name for {content_id}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_file_name() {
        assert_eq!(
            attachment_file_name("attachment; filename=\"report.pdf\"").as_deref(),
            Some("report.pdf")
        );
    }

    #[test]
    fn unquoted_file_name() {
        assert_eq!(
            attachment_file_name("attachment; filename=notes.txt").as_deref(),
            Some("notes.txt")
        );
    }

    #[test]
    fn missing_or_empty_file_name() {
        assert_eq!(attachment_file_name("attachment"), None);
        assert_eq!(attachment_file_name("attachment; filename=\"\""), None);
        assert_eq!(attachment_file_name("inline; name=\"x\""), None);
    }

    #[test]
    fn local_name_is_sanitized() {
        assert_eq!(
            local_file_name(Some("../../etc/passwd"), "bafk1").unwrap(),
            "etc_passwd"
        );
    }

    #[test]
    fn local_name_falls_back_to_content_id() {
        assert_eq!(local_file_name(None, "bafk1").unwrap(), "bafk1");
        assert_eq!(local_file_name(Some(".."), "bafk1").unwrap(), "bafk1");
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(ApiClient::new("not a url").is_err());
    }

    #[test]
    fn joins_paths_without_double_slash() {
        let client = ApiClient::new("http://127.0.0.1:8080/").unwrap();
        assert_eq!(client.url("/files"), "http://127.0.0.1:8080/files");
    }
}
