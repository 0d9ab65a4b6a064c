use regex::Regex;
use std::sync::LazyLock;

use crate::models::media::MediaReference;
use crate::platforms::Platform;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^https?://",
        r"(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+[A-Z]{2,6}\.?|",
        r"localhost|",
        r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})",
        r"(?::\d+)?",
        r"(?:/?|[/?]\S+)$",
    ))
    .unwrap()
});

/// Syntactic check only; no network access.
pub fn is_valid_url(input: &str) -> bool {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return false;
    }
    URL_RE.is_match(trimmed)
}

pub fn parse_reference(input: &str) -> Option<MediaReference> {
    if !is_valid_url(input) {
        return None;
    }
    let url = input.trim().to_string();
    let platform = Platform::from_url(&url);
    Some(MediaReference { url, platform })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_media_urls() {
        assert!(is_valid_url("https://www.youtube.com/watch?v=abc123"));
        assert!(is_valid_url("https://youtu.be/abc123"));
        assert!(is_valid_url("http://vimeo.com/12345"));
        assert!(is_valid_url("https://www.tiktok.com/@user/video/7000000000"));
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert!(is_valid_url("HTTPS://Example.com/x"));
        assert!(is_valid_url("Http://EXAMPLE.COM"));
    }

    #[test]
    fn accepts_localhost_ip_and_port() {
        assert!(is_valid_url("http://localhost"));
        assert!(is_valid_url("http://localhost:8080/video.mp4"));
        assert!(is_valid_url("http://192.168.1.20:3000/stream?id=4"));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert!(is_valid_url("  https://example.com/watch  "));
    }

    #[test]
    fn rejects_empty_and_blank() {
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("   \t"));
    }

    #[test]
    fn rejects_missing_or_foreign_scheme() {
        assert!(!is_valid_url("not-a-url"));
        assert!(!is_valid_url("www.youtube.com/watch?v=abc"));
        assert!(!is_valid_url("ftp://example.com/file"));
        assert!(!is_valid_url("javascript:alert(1)"));
        assert!(!is_valid_url("file:///etc/passwd"));
    }

    #[test]
    fn rejects_malformed_hosts() {
        assert!(!is_valid_url("https://example"));
        assert!(!is_valid_url("https://example.c"));
        assert!(!is_valid_url("https://-bad-.com"));
        assert!(!is_valid_url("https://exa mple.com"));
        assert!(!is_valid_url("https://example.com/has space"));
    }

    #[test]
    fn reference_carries_trimmed_url_and_platform() {
        let r = parse_reference(" https://www.instagram.com/reel/xyz/ ").unwrap();
        assert_eq!(r.url, "https://www.instagram.com/reel/xyz/");
        assert_eq!(r.platform, Platform::Instagram);
        assert!(parse_reference("nope").is_none());
    }
}
