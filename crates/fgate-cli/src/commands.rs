//! # Subcommand handlers
//!
//! Each handler writes human-readable output to the supplied writer and
//! returns the process exit code.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Subcommand;

use crate::client::{ApiClient, FileSummary};

/// Default download directory when neither `--out` nor `FGATE_DOWNLOAD_DIR` is set.
pub const DEFAULT_DOWNLOAD_DIR: &str = "./downloads";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List catalogued files, newest first.
    Files,

    /// Upload a local file and wait for its commitment.
    Upload {
        /// Path of the file to upload.
        path: PathBuf,
    },

    /// Download a file by content id.
    Download {
        /// Content id returned by `upload` or shown by `files`.
        content_id: String,
        /// Directory to write into.
        #[arg(long, env = "FGATE_DOWNLOAD_DIR", default_value = DEFAULT_DOWNLOAD_DIR)]
        out: PathBuf,
    },
}

pub async fn run(client: &ApiClient, command: &Command, out: &mut impl Write) -> Result<u8> {
    match command {
        Command::Files => run_files(client, out).await,
        Command::Upload { path } => run_upload(client, path, out).await,
        Command::Download { content_id, out: dir } => {
            run_download(client, content_id, dir, out).await
        }
    }
}

pub async fn run_files(client: &ApiClient, out: &mut impl Write) -> Result<u8> {
    let files = client.list_files().await?;
    if files.is_empty() {
        writeln!(out, "no files uploaded yet")?;
        return Ok(0);
    }
    for file in &files {
        writeln!(out, "{}", format_row(file))?;
    }
    Ok(0)
}

pub async fn run_upload(client: &ApiClient, path: &Path, out: &mut impl Write) -> Result<u8> {
    tracing::info!(path = %path.display(), "uploading");
    let summary = client.upload(path).await?;
    writeln!(out, "{}", summary.message)?;
    writeln!(out, "content id: {}", summary.file.content_id)?;
    Ok(0)
}

pub async fn run_download(
    client: &ApiClient,
    content_id: &str,
    dir: &Path,
    out: &mut impl Write,
) -> Result<u8> {
    let path = client.download(content_id, dir).await?;
    writeln!(out, "saved {}", path.display())?;
    Ok(0)
}

fn format_row(file: &FileSummary) -> String {
    format!(
        "{}  {:>12}  {}  {}",
        file.content_id, file.size_bytes, file.uploaded_at, file.file_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_lists_id_size_time_and_name() {
        let file = FileSummary {
            content_id: "bafk1".into(),
            file_name: "report.pdf".into(),
            size_bytes: 1024,
            uploaded_at: "2026-01-01T00:00:00Z".into(),
            file_system_id: "fs-0".into(),
            download_url: "/download/bafk1".into(),
        };
        let row = format_row(&file);
        assert!(row.starts_with("bafk1"));
        assert!(row.contains("1024"));
        assert!(row.ends_with("report.pdf"));
    }
}
