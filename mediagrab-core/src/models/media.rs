use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::platforms::Platform;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Video,
    Audio,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Video => "video",
            ContentType::Audio => "audio",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoContainer {
    Mp4,
    Mkv,
    Webm,
}

impl VideoContainer {
    pub const ALL: [VideoContainer; 3] = [VideoContainer::Mp4, VideoContainer::Mkv, VideoContainer::Webm];

    /// Unrecognized extensions fall back to mp4.
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim().to_lowercase().as_str() {
            "mkv" => VideoContainer::Mkv,
            "webm" => VideoContainer::Webm,
            _ => VideoContainer::Mp4,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            VideoContainer::Mp4 => "mp4",
            VideoContainer::Mkv => "mkv",
            VideoContainer::Webm => "webm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    Mp3,
    M4a,
    Wav,
}

impl AudioCodec {
    pub const ALL: [AudioCodec; 3] = [AudioCodec::Mp3, AudioCodec::M4a, AudioCodec::Wav];

    /// Unrecognized extensions fall back to mp3.
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim().to_lowercase().as_str() {
            "m4a" => AudioCodec::M4a,
            "wav" => AudioCodec::Wav,
            _ => AudioCodec::Mp3,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "mp3",
            AudioCodec::M4a => "m4a",
            AudioCodec::Wav => "wav",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoQuality {
    Best,
    Uhd2160,
    Fhd1080,
    Hd720,
}

impl VideoQuality {
    pub const ALL: [VideoQuality; 4] = [
        VideoQuality::Best,
        VideoQuality::Uhd2160,
        VideoQuality::Fhd1080,
        VideoQuality::Hd720,
    ];

    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "2160p" | "4k" | "4k (2160p)" => VideoQuality::Uhd2160,
            "1080p" => VideoQuality::Fhd1080,
            "720p" => VideoQuality::Hd720,
            _ => VideoQuality::Best,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VideoQuality::Best => "best",
            VideoQuality::Uhd2160 => "2160p",
            VideoQuality::Fhd1080 => "1080p",
            VideoQuality::Hd720 => "720p",
        }
    }

    pub fn max_height(&self) -> Option<u32> {
        match self {
            VideoQuality::Best => None,
            VideoQuality::Uhd2160 => Some(2160),
            VideoQuality::Fhd1080 => Some(1080),
            VideoQuality::Hd720 => Some(720),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioQuality {
    Best,
    Kbps192,
    Kbps128,
}

impl AudioQuality {
    pub const ALL: [AudioQuality; 3] = [AudioQuality::Best, AudioQuality::Kbps192, AudioQuality::Kbps128];

    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "192kbps" => AudioQuality::Kbps192,
            "128kbps" => AudioQuality::Kbps128,
            _ => AudioQuality::Best,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AudioQuality::Best => "best",
            AudioQuality::Kbps192 => "192kbps",
            AudioQuality::Kbps128 => "128kbps",
        }
    }

    /// Value handed to the audio extractor; "0" is its best-quality code.
    pub fn code(&self) -> &'static str {
        match self {
            AudioQuality::Best => "0",
            AudioQuality::Kbps192 => "192",
            AudioQuality::Kbps128 => "128",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MediaReference {
    pub url: String,
    pub platform: Platform,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormatInfo {
    pub format_id: String,
    pub ext: String,
    pub resolution: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub filesize: Option<u64>,
    pub tbr: Option<f64>,
    pub has_video: bool,
    pub has_audio: bool,
    pub format_note: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Metadata {
    pub title: String,
    pub duration_seconds: Option<u64>,
    pub thumbnail_url: Option<String>,
    pub uploader: String,
    pub view_count: u64,
    pub available_formats: Vec<FormatInfo>,
    pub source_url: String,
    pub platform: Platform,
}

impl Metadata {
    pub fn duration_label(&self) -> String {
        format_duration(self.duration_seconds)
    }
}

pub fn format_duration(seconds: Option<u64>) -> String {
    let seconds = match seconds {
        Some(s) if s > 0 => s,
        _ => return "unknown".to_string(),
    };

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub content_type: ContentType,
    pub extension: String,
    pub quality: String,
}

#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub file_name: String,
    pub bytes: Bytes,
    pub mime_type: &'static str,
}

impl DownloadResult {
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}
