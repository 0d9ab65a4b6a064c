use crate::core::errors::MediaError;
use crate::core::options::build_inspect_options;
use crate::core::ytdlp::MediaTool;
use crate::models::media::{FormatInfo, Metadata};
use crate::models::settings::ExtractionSettings;
use crate::platforms::Platform;

const UNKNOWN: &str = "Unknown";

/// Runs the tool in inspect mode and normalizes its record. A missing record
/// is an error (`MediaError::EmptyResult`), never an all-defaults `Metadata`.
pub async fn extract_metadata(
    tool: &dyn MediaTool,
    url: &str,
    settings: &ExtractionSettings,
) -> anyhow::Result<Metadata> {
    tracing::info!("Extracting metadata from: {}", url);

    let opts = build_inspect_options(settings);
    let json = match tool.inspect(url, &opts).await {
        Ok(Some(json)) => json,
        Ok(None) => {
            tracing::warn!("No media record returned for {}", url);
            return Err(MediaError::EmptyResult.into());
        }
        Err(e) => {
            tracing::error!("Error extracting metadata: {:#}", e);
            return Err(e);
        }
    };

    let metadata = normalize(&json, url);
    tracing::info!(
        "Metadata extracted: {} ({} formats)",
        metadata.title,
        metadata.available_formats.len()
    );
    Ok(metadata)
}

pub fn normalize(json: &serde_json::Value, url: &str) -> Metadata {
    let title = json
        .get("title")
        .and_then(|v| v.as_str())
        .unwrap_or(UNKNOWN)
        .to_string();

    let uploader = json
        .get("uploader")
        .and_then(|v| v.as_str())
        .unwrap_or(UNKNOWN)
        .to_string();

    let duration_seconds = json
        .get("duration")
        .and_then(|v| v.as_f64())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .map(|d| d as u64);

    let thumbnail_url = json
        .get("thumbnail")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_string());

    let view_count = json.get("view_count").and_then(|v| v.as_u64()).unwrap_or(0);

    Metadata {
        title,
        duration_seconds,
        thumbnail_url,
        uploader,
        view_count,
        available_formats: parse_formats(json),
        source_url: url.to_string(),
        platform: Platform::from_url(url),
    }
}

pub fn parse_formats(json: &serde_json::Value) -> Vec<FormatInfo> {
    let formats = match json.get("formats").and_then(|v| v.as_array()) {
        Some(f) => f,
        None => return Vec::new(),
    };

    let mut result = Vec::new();
    for f in formats {
        let format_id = match f.get("format_id").and_then(|v| v.as_str()) {
            Some(id) => id.to_string(),
            None => continue,
        };

        let ext = f.get("ext").and_then(|v| v.as_str()).unwrap_or("").to_string();
        let width = f.get("width").and_then(|v| v.as_u64()).map(|v| v as u32);
        let height = f.get("height").and_then(|v| v.as_u64()).map(|v| v as u32);
        let fps = f.get("fps").and_then(|v| v.as_f64());
        let vcodec = f.get("vcodec").and_then(|v| v.as_str()).map(|s| s.to_string());
        let acodec = f.get("acodec").and_then(|v| v.as_str()).map(|s| s.to_string());
        let filesize = f
            .get("filesize")
            .or_else(|| f.get("filesize_approx"))
            .and_then(|v| v.as_u64());
        let tbr = f.get("tbr").and_then(|v| v.as_f64());
        let format_note = f.get("format_note").and_then(|v| v.as_str()).map(|s| s.to_string());

        let has_video = vcodec.as_deref().map(|v| v != "none").unwrap_or(false);
        let has_audio = acodec.as_deref().map(|v| v != "none").unwrap_or(false);

        let resolution = match (width, height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some(format!("{}x{}", w, h)),
            _ => f.get("resolution").and_then(|v| v.as_str()).map(|s| s.to_string()),
        };

        result.push(FormatInfo {
            format_id,
            ext,
            resolution,
            width,
            height,
            fps,
            vcodec,
            acodec,
            filesize,
            tbr,
            has_video,
            has_audio,
            format_note,
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::{FetchOptions, InspectOptions};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    enum Reply {
        Record(serde_json::Value),
        Nothing,
        Fail(&'static str),
    }

    struct FakeTool {
        reply: Reply,
        seen: Mutex<Vec<InspectOptions>>,
    }

    impl FakeTool {
        fn new(reply: Reply) -> Self {
            Self { reply, seen: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl MediaTool for FakeTool {
        async fn inspect(&self, _url: &str, opts: &InspectOptions) -> anyhow::Result<Option<serde_json::Value>> {
            self.seen.lock().unwrap().push(opts.clone());
            match &self.reply {
                Reply::Record(v) => Ok(Some(v.clone())),
                Reply::Nothing => Ok(None),
                Reply::Fail(msg) => Err(MediaError::ToolFailed { status: Some(1), stderr: msg.to_string() }.into()),
            }
        }

        async fn fetch(&self, _url: &str, _opts: &FetchOptions) -> anyhow::Result<()> {
            unreachable!("inspect-only test")
        }
    }

    #[test]
    fn normalizes_full_record() {
        let raw = json!({
            "title": "Launch stream",
            "duration": 754.6,
            "thumbnail": "https://i.ytimg.com/vi/abc/hq.jpg",
            "uploader": "Space Channel",
            "view_count": 1200,
            "formats": [
                { "format_id": "137", "ext": "mp4", "width": 1920, "height": 1080, "vcodec": "avc1", "acodec": "none" },
                { "format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a", "filesize_approx": 4096 }
            ]
        });

        let m = normalize(&raw, "https://www.youtube.com/watch?v=abc");
        assert_eq!(m.title, "Launch stream");
        assert_eq!(m.duration_seconds, Some(754));
        assert_eq!(m.thumbnail_url.as_deref(), Some("https://i.ytimg.com/vi/abc/hq.jpg"));
        assert_eq!(m.uploader, "Space Channel");
        assert_eq!(m.view_count, 1200);
        assert_eq!(m.platform, Platform::YouTube);
        assert_eq!(m.available_formats.len(), 2);
        assert_eq!(m.available_formats[0].resolution.as_deref(), Some("1920x1080"));
        assert!(m.available_formats[0].has_video && !m.available_formats[0].has_audio);
        assert_eq!(m.available_formats[1].filesize, Some(4096));
    }

    #[test]
    fn missing_fields_get_defaults() {
        let m = normalize(&json!({}), "https://example.com/v");
        assert_eq!(m.title, "Unknown");
        assert_eq!(m.uploader, "Unknown");
        assert_eq!(m.view_count, 0);
        assert_eq!(m.duration_seconds, None);
        assert_eq!(m.thumbnail_url, None);
        assert!(m.available_formats.is_empty());
        assert_eq!(m.duration_label(), "unknown");
    }

    #[test]
    fn negative_duration_and_blank_thumbnail_are_absent() {
        let m = normalize(&json!({ "duration": -5, "thumbnail": "" }), "https://example.com/v");
        assert_eq!(m.duration_seconds, None);
        assert_eq!(m.thumbnail_url, None);
    }

    #[test]
    fn formats_without_id_are_skipped() {
        let formats = parse_formats(&json!({ "formats": [ { "ext": "mp4" }, { "format_id": "18", "ext": "mp4" } ] }));
        assert_eq!(formats.len(), 1);
        assert_eq!(formats[0].format_id, "18");
    }

    #[tokio::test]
    async fn extractor_passes_bounded_options() {
        let tool = FakeTool::new(Reply::Record(json!({ "title": "x" })));
        let settings = ExtractionSettings::default();
        extract_metadata(&tool, "https://youtu.be/x", &settings).await.unwrap();

        let seen = tool.seen.lock().unwrap();
        assert_eq!(seen[0].socket_timeout_secs, 30);
        assert_eq!(seen[0].retries, 3);
        assert_eq!(seen[0].extractor_args, vec!["youtube:player_client=android,web".to_string()]);
    }

    #[tokio::test]
    async fn empty_record_is_distinguishable_error() {
        let tool = FakeTool::new(Reply::Nothing);
        let err = extract_metadata(&tool, "https://youtu.be/x", &ExtractionSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<MediaError>(), Some(MediaError::EmptyResult)));
    }

    #[tokio::test]
    async fn tool_errors_propagate_unchanged() {
        let tool = FakeTool::new(Reply::Fail("ERROR: Private video. Sign in if you've been granted access"));
        let err = extract_metadata(&tool, "https://youtu.be/x", &ExtractionSettings::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Private video"));
    }
}
