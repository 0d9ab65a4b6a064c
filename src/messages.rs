use mediagrab_core::core::errors::{media_error, MediaError};
use serde::Serialize;

const GENERIC_ANALYZE_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidUrl,
    LoginRequired,
    InstagramLogin,
    Blocked,
    Unavailable,
    EmptyResult,
    NoOutputFile,
    ToolUnavailable,
    Generic,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::InvalidUrl => "invalid_url",
            FailureKind::LoginRequired => "login_required",
            FailureKind::InstagramLogin => "instagram_login",
            FailureKind::Blocked => "blocked",
            FailureKind::Unavailable => "unavailable",
            FailureKind::EmptyResult => "empty_result",
            FailureKind::NoOutputFile => "no_output_file",
            FailureKind::ToolUnavailable => "tool_unavailable",
            FailureKind::Generic => "generic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserMessage {
    pub kind: FailureKind,
    pub message: String,
}

impl UserMessage {
    fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

pub fn invalid_url() -> UserMessage {
    UserMessage::new(
        FailureKind::InvalidUrl,
        "The link you entered is not valid. Please paste a full http(s) link.",
    )
}

pub fn analyze_failure(err: &anyhow::Error) -> UserMessage {
    if let Some(msg) = typed_failure(err) {
        return msg;
    }

    let raw = raw_text(err);
    let lower = raw.to_lowercase();

    if lower.contains("login") || lower.contains("cookies") {
        UserMessage::new(
            FailureKind::LoginRequired,
            "This platform requires login. Try another platform (YouTube, public TikTok, etc).",
        )
    } else if lower.contains("instagram") {
        UserMessage::new(
            FailureKind::InstagramLogin,
            "Instagram requires login. Try a public video from another platform.",
        )
    } else if raw.contains("403") || lower.contains("blocked") || lower.contains("rate") {
        UserMessage::new(
            FailureKind::Blocked,
            "Access was temporarily blocked. Wait a minute and try again.",
        )
    } else if lower.contains("not available") {
        UserMessage::new(
            FailureKind::Unavailable,
            "The content is unavailable or private. Try another link.",
        )
    } else {
        UserMessage::new(
            FailureKind::Generic,
            format!("Error: {}", truncate_chars(&raw, GENERIC_ANALYZE_LIMIT)),
        )
    }
}

pub fn download_failure(err: &anyhow::Error) -> UserMessage {
    if let Some(msg) = typed_failure(err) {
        return msg;
    }

    let raw = raw_text(err);
    if raw.contains("403") {
        UserMessage::new(
            FailureKind::Blocked,
            "Access was blocked. Try another link or another platform.",
        )
    } else {
        UserMessage::new(FailureKind::Generic, format!("Download error: {}", raw))
    }
}

fn typed_failure(err: &anyhow::Error) -> Option<UserMessage> {
    match media_error(err)? {
        MediaError::EmptyResult => Some(UserMessage::new(
            FailureKind::EmptyResult,
            "Could not analyze this link. Try another one.",
        )),
        MediaError::NoOutputFile(_) => Some(UserMessage::new(
            FailureKind::NoOutputFile,
            "The download finished but produced no file. Try another format.",
        )),
        MediaError::ToolUnavailable(_) | MediaError::Spawn(_) => Some(UserMessage::new(
            FailureKind::ToolUnavailable,
            "The downloader is not available on the server.",
        )),
        _ => None,
    }
}

/// Tool stderr when there is one, so the prefix added by `MediaError`
/// never reaches the user.
fn raw_text(err: &anyhow::Error) -> String {
    match media_error(err) {
        Some(MediaError::ToolFailed { stderr, .. }) if !stderr.is_empty() => stderr.clone(),
        _ => format!("{:#}", err),
    }
}

fn truncate_chars(s: &str, limit: usize) -> &str {
    match s.char_indices().nth(limit) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
