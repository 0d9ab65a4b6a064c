use serde::{Serialize, Serializer};

/// Display-only classification of a URL. Never consulted when extracting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    YouTube,
    TikTok,
    Instagram,
    Facebook,
    Twitter,
    Vimeo,
    Dailymotion,
    Twitch,
    Reddit,
    SoundCloud,
    Spotify,
    Other,
}

// Ordered: first substring hit wins.
const DOMAIN_TABLE: &[(&str, Platform)] = &[
    ("youtube.com", Platform::YouTube),
    ("youtu.be", Platform::YouTube),
    ("tiktok.com", Platform::TikTok),
    ("instagram.com", Platform::Instagram),
    ("facebook.com", Platform::Facebook),
    ("twitter.com", Platform::Twitter),
    ("x.com", Platform::Twitter),
    ("vimeo.com", Platform::Vimeo),
    ("dailymotion.com", Platform::Dailymotion),
    ("twitch.tv", Platform::Twitch),
    ("reddit.com", Platform::Reddit),
    ("soundcloud.com", Platform::SoundCloud),
    ("spotify.com", Platform::Spotify),
];

const GLYPH_TABLE: &[(&str, &str)] = &[
    ("YouTube", "🎬"),
    ("TikTok", "🎵"),
    ("Instagram", "📸"),
    ("Facebook", "👥"),
    ("X (Twitter)", "🐦"),
    ("Vimeo", "🎥"),
    ("Dailymotion", "📺"),
    ("Twitch", "🎮"),
    ("Reddit", "🤖"),
    ("SoundCloud", "🔊"),
    ("Spotify", "🎧"),
];

const DEFAULT_GLYPH: &str = "🌐";

impl Platform {
    pub fn from_url(url: &str) -> Self {
        let lower = url.to_lowercase();
        DOMAIN_TABLE
            .iter()
            .find(|(domain, _)| lower.contains(domain))
            .map(|(_, platform)| *platform)
            .unwrap_or(Platform::Other)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Platform::YouTube => "YouTube",
            Platform::TikTok => "TikTok",
            Platform::Instagram => "Instagram",
            Platform::Facebook => "Facebook",
            Platform::Twitter => "X (Twitter)",
            Platform::Vimeo => "Vimeo",
            Platform::Dailymotion => "Dailymotion",
            Platform::Twitch => "Twitch",
            Platform::Reddit => "Reddit",
            Platform::SoundCloud => "SoundCloud",
            Platform::Spotify => "Spotify",
            Platform::Other => "Other",
        }
    }

    pub fn glyph(&self) -> &'static str {
        glyph_for_label(self.label())
    }
}

pub fn glyph_for_label(label: &str) -> &'static str {
    GLYPH_TABLE
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, glyph)| *glyph)
        .unwrap_or(DEFAULT_GLYPH)
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Platform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
