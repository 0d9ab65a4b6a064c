use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

use crate::core::errors::MediaError;
use crate::core::options::{FetchOptions, InspectOptions};
use crate::core::process;
use crate::fs_paths;
use crate::models::settings::ToolSettings;

/// The external extraction tool, in its two operating modes.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Returns `Ok(None)` when the tool succeeds but produces no record.
    async fn inspect(&self, url: &str, opts: &InspectOptions) -> anyhow::Result<Option<serde_json::Value>>;
    async fn fetch(&self, url: &str, opts: &FetchOptions) -> anyhow::Result<()>;
}

fn bin_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "yt-dlp.exe"
    } else {
        "yt-dlp"
    }
}

async fn responds_to_version(program: &Path) -> bool {
    process::command(program)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

pub async fn find_ytdlp() -> Option<PathBuf> {
    let on_path = PathBuf::from(bin_name());
    if responds_to_version(&on_path).await {
        return Some(on_path);
    }

    let managed = managed_ytdlp_path()?;
    if managed.exists() {
        return Some(managed);
    }

    None
}

fn managed_ytdlp_path() -> Option<PathBuf> {
    Some(fs_paths::bin_dir()?.join(bin_name()))
}

pub async fn ensure_ytdlp(settings: &ToolSettings) -> anyhow::Result<PathBuf> {
    if let Some(ref configured) = settings.ytdlp_path {
        if responds_to_version(configured).await {
            return Ok(configured.clone());
        }
        tracing::warn!("Configured yt-dlp at {} does not run, searching elsewhere", configured.display());
    }

    if let Some(path) = find_ytdlp().await {
        return Ok(path);
    }

    if !settings.auto_install {
        return Err(MediaError::ToolUnavailable("not found on PATH and auto-install is disabled".into()).into());
    }

    download_ytdlp_binary()
        .await
        .map_err(|e| MediaError::ToolUnavailable(format!("{:#}", e)).into())
}

const INSTALL_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(120);

fn release_asset_url() -> &'static str {
    if cfg!(target_os = "windows") {
        "https://github.com/yt-dlp/yt-dlp/releases/latest/download/yt-dlp.exe"
    } else if cfg!(target_os = "macos") {
        "https://github.com/yt-dlp/yt-dlp/releases/latest/download/yt-dlp_macos"
    } else {
        "https://github.com/yt-dlp/yt-dlp/releases/latest/download/yt-dlp"
    }
}

async fn download_ytdlp_binary() -> anyhow::Result<PathBuf> {
    let target = managed_ytdlp_path().ok_or_else(|| anyhow!("Could not determine the data directory"))?;
    let dir = target
        .parent()
        .ok_or_else(|| anyhow!("Managed yt-dlp path has no parent: {}", target.display()))?
        .to_path_buf();
    tokio::fs::create_dir_all(&dir).await?;

    let url = release_asset_url();
    tracing::info!("Installing yt-dlp from {} into {}", url, target.display());

    let bytes = reqwest::Client::builder()
        .timeout(INSTALL_TIMEOUT)
        .build()?
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    // Staged in the same dir so the final rename never crosses filesystems
    // and a half-written binary is never left at `target`.
    let staged = tempfile::NamedTempFile::new_in(&dir)?;
    tokio::fs::write(staged.path(), &bytes).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(staged.path(), std::fs::Permissions::from_mode(0o755)).await?;
    }

    staged.persist(&target)?;
    tracing::info!("yt-dlp installed ({} bytes)", bytes.len());
    Ok(target)
}

pub struct Ytdlp {
    path: PathBuf,
}

impl Ytdlp {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl MediaTool for Ytdlp {
    async fn inspect(&self, url: &str, opts: &InspectOptions) -> anyhow::Result<Option<serde_json::Value>> {
        let output = process::command(&self.path)
            .args(opts.to_args(url))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(MediaError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::ToolFailed {
                status: output.status.code(),
                stderr: stderr.trim().to_string(),
            }
            .into());
        }

        parse_inspect_output(&output.stdout)
    }

    async fn fetch(&self, url: &str, opts: &FetchOptions) -> anyhow::Result<()> {
        let mut child = process::command(&self.path)
            .args(opts.to_args(url))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(MediaError::Spawn)?;

        let stdout = child.stdout.take().ok_or_else(|| anyhow!("yt-dlp stdout not captured"))?;
        let stderr = child.stderr.take().ok_or_else(|| anyhow!("yt-dlp stderr not captured"))?;

        let line_reader = tokio::spawn(drain_stdout(stdout));
        let stderr_reader = tokio::spawn(read_stderr(stderr));

        let status = child.wait().await.map_err(MediaError::Spawn)?;

        let _ = line_reader.await;
        let stderr = stderr_reader.await.unwrap_or_default();

        if !status.success() {
            return Err(MediaError::ToolFailed {
                status: status.code(),
                stderr,
            }
            .into());
        }

        Ok(())
    }
}

fn parse_inspect_output(stdout: &[u8]) -> anyhow::Result<Option<serde_json::Value>> {
    let text = String::from_utf8_lossy(stdout);
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let json: serde_json::Value = serde_json::from_str(text).map_err(MediaError::InvalidJson)?;
    if json.is_null() {
        return Ok(None);
    }
    Ok(Some(json))
}

/// Reads stdout to the end so yt-dlp never blocks on a full pipe. Lines are
/// decoded lossily; returns the last progress value seen.
async fn drain_stdout<R: AsyncRead + Unpin>(stdout: R) -> Option<f64> {
    let mut segments = BufReader::new(stdout).split(b'\n');
    let mut last_logged: Option<f64> = None;
    let mut last_seen = None;

    while let Ok(Some(raw)) = segments.next_segment().await {
        let line = String::from_utf8_lossy(&raw);
        let line = line.trim_end_matches('\r');
        match parse_progress_line(line) {
            Some(pct) => {
                last_seen = Some(pct);
                if last_logged.map_or(true, |prev| pct - prev >= 10.0) || pct >= 100.0 {
                    tracing::debug!("yt-dlp progress {:.1}%", pct);
                    last_logged = Some(pct);
                }
            }
            None if !line.trim().is_empty() => tracing::debug!("yt-dlp: {}", line),
            None => {}
        }
    }

    last_seen
}

async fn read_stderr<R: AsyncRead + Unpin>(mut stderr: R) -> String {
    let mut buf = Vec::new();
    if let Err(e) = stderr.read_to_end(&mut buf).await {
        tracing::warn!("Failed to read yt-dlp stderr: {}", e);
    }
    String::from_utf8_lossy(&buf).trim().to_string()
}

/// Parses lines produced by `--progress-template download:%(progress._percent_str)s`.
fn parse_progress_line(line: &str) -> Option<f64> {
    line.trim()
        .strip_prefix("download:")?
        .trim()
        .strip_suffix('%')?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_template_line() {
        assert_eq!(parse_progress_line("download: 42.5%"), Some(42.5));
        assert_eq!(parse_progress_line("download:100.0%"), Some(100.0));
    }

    #[test]
    fn non_progress_lines() {
        assert_eq!(parse_progress_line("[youtube] abc123: Downloading webpage"), None);
        assert_eq!(parse_progress_line("[download]  12.0% of 3.00MiB"), None);
        assert_eq!(parse_progress_line("download: N/A"), None);
        assert_eq!(parse_progress_line(""), None);
    }

    #[tokio::test]
    async fn stdout_reading_survives_invalid_utf8() {
        let out: &[u8] = b"[info] \xff\xfe title\r\ndownload:  40.0%\n[info] \xc3\ndownload: 100.0%\n";
        assert_eq!(drain_stdout(out).await, Some(100.0));
    }

    #[tokio::test]
    async fn stderr_keeps_text_around_invalid_utf8() {
        let err: &[u8] = b"ERROR: \xff\xfe HTTP Error 403: Forbidden\n";
        let text = read_stderr(err).await;
        assert!(text.starts_with("ERROR: "));
        assert!(text.ends_with("HTTP Error 403: Forbidden"));
    }

    #[test]
    fn inspect_output_with_record() {
        let value = parse_inspect_output(br#"{"title":"Clip"}"#).unwrap().unwrap();
        assert_eq!(value["title"], "Clip");
    }

    #[test]
    fn inspect_output_empty_or_null_is_no_record() {
        assert!(parse_inspect_output(b"").unwrap().is_none());
        assert!(parse_inspect_output(b"  \n").unwrap().is_none());
        assert!(parse_inspect_output(b"null\n").unwrap().is_none());
    }

    #[test]
    fn inspect_output_garbage_is_invalid_json() {
        let err = parse_inspect_output(b"<html>").unwrap_err();
        assert!(matches!(err.downcast_ref::<MediaError>(), Some(MediaError::InvalidJson(_))));
    }

    #[tokio::test]
    async fn missing_configured_binary_without_install_is_unavailable() {
        let settings = ToolSettings {
            ytdlp_path: Some(PathBuf::from("/nonexistent/yt-dlp")),
            auto_install: false,
        };
        // only meaningful when no yt-dlp is installed on the test host
        if find_ytdlp().await.is_none() {
            let err = ensure_ytdlp(&settings).await.unwrap_err();
            assert!(matches!(err.downcast_ref::<MediaError>(), Some(MediaError::ToolUnavailable(_))));
        }
    }
}
