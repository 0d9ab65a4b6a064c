use std::path::Path;

const MIME_TABLE: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("mkv", "video/x-matroska"),
    ("webm", "video/webm"),
    ("mp3", "audio/mpeg"),
    ("m4a", "audio/mp4"),
    ("wav", "audio/wav"),
];

pub const FALLBACK_MIME: &str = "application/octet-stream";

pub fn mime_type_for(file_name: &str) -> &'static str {
    let ext = match Path::new(file_name).extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_lowercase(),
        None => return FALLBACK_MIME,
    };

    MIME_TABLE
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(FALLBACK_MIME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions() {
        assert_eq!(mime_type_for("clip.mp4"), "video/mp4");
        assert_eq!(mime_type_for("clip.mkv"), "video/x-matroska");
        assert_eq!(mime_type_for("clip.webm"), "video/webm");
        assert_eq!(mime_type_for("song.mp3"), "audio/mpeg");
        assert_eq!(mime_type_for("song.m4a"), "audio/mp4");
        assert_eq!(mime_type_for("song.wav"), "audio/wav");
    }

    #[test]
    fn extension_case_is_ignored() {
        assert_eq!(mime_type_for("CLIP.MP4"), "video/mp4");
    }

    #[test]
    fn title_dots_do_not_confuse_lookup() {
        assert_eq!(mime_type_for("Live at 5.30 p.m..webm"), "video/webm");
    }

    #[test]
    fn unknown_or_missing_extension() {
        assert_eq!(mime_type_for("archive.zip"), FALLBACK_MIME);
        assert_eq!(mime_type_for("noext"), FALLBACK_MIME);
    }
}
