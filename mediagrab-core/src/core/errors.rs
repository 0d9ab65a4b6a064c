use std::path::PathBuf;

/// Failures callers need to tell apart. Travel inside `anyhow::Error`;
/// recover with `downcast_ref::<MediaError>()`.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("yt-dlp is not available: {0}")]
    ToolUnavailable(String),

    #[error("failed to start yt-dlp: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("yt-dlp failed ({}): {stderr}", .status.map(|c| c.to_string()).unwrap_or_else(|| String::from("signal")))]
    ToolFailed { status: Option<i32>, stderr: String },

    #[error("yt-dlp returned invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("yt-dlp returned no media record")]
    EmptyResult,

    #[error("no output file found in {}", .0.display())]
    NoOutputFile(PathBuf),
}

pub fn media_error(err: &anyhow::Error) -> Option<&MediaError> {
    err.chain().find_map(|e| e.downcast_ref::<MediaError>())
}
