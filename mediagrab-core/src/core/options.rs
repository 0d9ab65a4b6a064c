use std::path::Path;

use serde::Serialize;

use crate::models::media::{AudioCodec, AudioQuality, ContentType, VideoContainer, VideoQuality};
use crate::models::settings::ExtractionSettings;

pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";
const PROGRESS_TEMPLATE: &str = "download:%(progress._percent_str)s";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "key")]
pub enum PostProcessor {
    VideoConvertor { preferred_format: String },
    ExtractAudio { codec: String, quality: String },
}

/// Everything a fetch-mode invocation needs besides the URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchOptions {
    pub output_template: String,
    pub format: String,
    pub merge_output_format: Option<String>,
    pub postprocessors: Vec<PostProcessor>,
    pub postprocessor_args: Vec<String>,
    pub http_headers: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectOptions {
    pub socket_timeout_secs: u32,
    pub retries: u32,
    pub fragment_retries: u32,
    pub http_headers: Vec<(String, String)>,
    pub extractor_args: Vec<String>,
}

pub fn video_format_selector(quality: VideoQuality) -> String {
    match quality.max_height() {
        Some(h) => format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]"),
        None => "bestvideo+bestaudio/best".to_string(),
    }
}

pub fn build_fetch_options(
    scratch_dir: &Path,
    content_type: ContentType,
    extension: &str,
    quality: &str,
    settings: &ExtractionSettings,
) -> FetchOptions {
    let output_template = scratch_dir
        .join(OUTPUT_TEMPLATE)
        .to_string_lossy()
        .to_string();

    let (format, merge_output_format, postprocessors) = match content_type {
        ContentType::Video => {
            let container = VideoContainer::from_extension(extension);
            let mut postprocessors = Vec::new();
            if container == VideoContainer::Mp4 {
                postprocessors.push(PostProcessor::VideoConvertor {
                    preferred_format: "mp4".to_string(),
                });
            }
            (
                video_format_selector(VideoQuality::from_label(quality)),
                Some(container.extension().to_string()),
                postprocessors,
            )
        }
        ContentType::Audio => {
            let codec = AudioCodec::from_extension(extension);
            let quality = AudioQuality::from_label(quality);
            (
                "bestaudio/best".to_string(),
                None,
                vec![PostProcessor::ExtractAudio {
                    codec: codec.extension().to_string(),
                    quality: quality.code().to_string(),
                }],
            )
        }
    };

    FetchOptions {
        output_template,
        format,
        merge_output_format,
        postprocessors,
        postprocessor_args: vec!["-y".to_string()],
        http_headers: vec![
            ("User-Agent".to_string(), settings.user_agent.clone()),
            ("Accept".to_string(), settings.accept.clone()),
            ("Accept-Language".to_string(), settings.accept_language.clone()),
        ],
    }
}

pub fn build_inspect_options(settings: &ExtractionSettings) -> InspectOptions {
    let mut extractor_args = Vec::new();
    if !settings.youtube_player_clients.is_empty() {
        extractor_args.push(format!(
            "youtube:player_client={}",
            settings.youtube_player_clients.join(",")
        ));
    }

    InspectOptions {
        socket_timeout_secs: settings.socket_timeout_secs,
        retries: settings.retries,
        fragment_retries: settings.fragment_retries,
        http_headers: vec![
            ("User-Agent".to_string(), settings.user_agent.clone()),
            ("Accept".to_string(), settings.accept.clone()),
            ("Accept-Language".to_string(), settings.accept_language.clone()),
            ("Referer".to_string(), settings.referer.clone()),
        ],
        extractor_args,
    }
}

fn push_headers(args: &mut Vec<String>, headers: &[(String, String)]) {
    for (name, value) in headers {
        args.push("--add-header".to_string());
        args.push(format!("{}:{}", name, value));
    }
}

impl FetchOptions {
    pub fn to_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            self.format.clone(),
            "-o".to_string(),
            self.output_template.clone(),
        ];

        if let Some(ref merge) = self.merge_output_format {
            args.push("--merge-output-format".to_string());
            args.push(merge.clone());
        }

        for pp in &self.postprocessors {
            match pp {
                PostProcessor::VideoConvertor { preferred_format } => {
                    args.push("--recode-video".to_string());
                    args.push(preferred_format.clone());
                }
                PostProcessor::ExtractAudio { codec, quality } => {
                    args.push("-x".to_string());
                    args.push("--audio-format".to_string());
                    args.push(codec.clone());
                    args.push("--audio-quality".to_string());
                    args.push(quality.clone());
                }
            }
        }

        if !self.postprocessor_args.is_empty() {
            args.push("--postprocessor-args".to_string());
            args.push(format!("ffmpeg:{}", self.postprocessor_args.join(" ")));
        }

        push_headers(&mut args, &self.http_headers);

        args.extend([
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "--progress-template".to_string(),
            PROGRESS_TEMPLATE.to_string(),
            "--".to_string(),
            url.to_string(),
        ]);
        args
    }
}

impl InspectOptions {
    pub fn to_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--dump-single-json".to_string(),
            "--skip-download".to_string(),
            "--no-playlist".to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            self.socket_timeout_secs.to_string(),
            "--retries".to_string(),
            self.retries.to_string(),
            "--fragment-retries".to_string(),
            self.fragment_retries.to_string(),
        ];

        push_headers(&mut args, &self.http_headers);

        for extractor_arg in &self.extractor_args {
            args.push("--extractor-args".to_string());
            args.push(extractor_arg.clone());
        }

        args.push("--".to_string());
        args.push(url.to_string());
        args
    }
}
