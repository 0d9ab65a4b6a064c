use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::core::errors::MediaError;
use crate::core::mime::mime_type_for;
use crate::core::options::build_fetch_options;
use crate::core::ytdlp::MediaTool;
use crate::fs_paths;
use crate::models::media::{DownloadRequest, DownloadResult};
use crate::models::settings::ExtractionSettings;

pub async fn download_content(
    tool: &dyn MediaTool,
    request: &DownloadRequest,
    settings: &ExtractionSettings,
) -> anyhow::Result<DownloadResult> {
    download_content_in(tool, request, settings, &fs_paths::scratch_root()).await
}

/// Fetches into a fresh scratch dir under `scratch_root` and returns the
/// produced file in memory. The scratch dir is gone when this returns.
pub async fn download_content_in(
    tool: &dyn MediaTool,
    request: &DownloadRequest,
    settings: &ExtractionSettings,
    scratch_root: &Path,
) -> anyhow::Result<DownloadResult> {
    tracing::info!(
        "Starting download: type={}, ext={}, quality={}",
        request.content_type,
        request.extension,
        request.quality
    );

    // TempDir also removes itself if this future is dropped mid-fetch
    let scratch = tempfile::Builder::new()
        .prefix("mediagrab-")
        .tempdir_in(scratch_root)?;

    let result = fetch_into(tool, request, settings, scratch.path()).await;

    let scratch_path = scratch.path().to_path_buf();
    if let Err(e) = scratch.close() {
        tracing::warn!("Failed to remove scratch dir {}: {}", scratch_path.display(), e);
    }

    match result {
        Ok(result) => {
            tracing::info!("Download complete: {} ({} bytes)", result.file_name, result.size_bytes());
            Ok(result)
        }
        Err(e) => {
            tracing::error!("Download error: {:#}", e);
            Err(e)
        }
    }
}

async fn fetch_into(
    tool: &dyn MediaTool,
    request: &DownloadRequest,
    settings: &ExtractionSettings,
    scratch_dir: &Path,
) -> anyhow::Result<DownloadResult> {
    let opts = build_fetch_options(
        scratch_dir,
        request.content_type,
        &request.extension,
        &request.quality,
        settings,
    );

    tool.fetch(&request.url, &opts).await?;

    let file_path = find_output_file(scratch_dir).await?;
    let file_name = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.to_string())
        .ok_or_else(|| MediaError::NoOutputFile(scratch_dir.to_path_buf()))?;

    let bytes = tokio::fs::read(&file_path).await?;
    let mime_type = mime_type_for(&file_name);

    Ok(DownloadResult {
        file_name,
        bytes: Bytes::from(bytes),
        mime_type,
    })
}

fn is_leftover(name: &str) -> bool {
    name.starts_with('.')
        || name.ends_with(".part")
        || name.ends_with(".ytdl")
        || name.ends_with(".temp")
}

async fn find_output_file(dir: &Path) -> anyhow::Result<PathBuf> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut candidates: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let meta = entry.metadata().await?;
        if !meta.is_file() {
            continue;
        }

        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if is_leftover(name) {
            continue;
        }

        let modified = meta.modified().unwrap_or(std::time::UNIX_EPOCH);
        candidates.push((path, modified));
    }

    if candidates.len() > 1 {
        tracing::warn!(
            "Expected one output file in {}, found {}; taking the newest",
            dir.display(),
            candidates.len()
        );
    }

    candidates
        .into_iter()
        .max_by_key(|(_, modified)| *modified)
        .map(|(path, _)| path)
        .ok_or_else(|| MediaError::NoOutputFile(dir.to_path_buf()).into())
}
