use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub server: ServerSettings,
    pub extraction: ExtractionSettings,
    pub tool: ToolSettings,
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractionSettings {
    pub socket_timeout_secs: u32,
    pub retries: u32,
    pub fragment_retries: u32,
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub referer: String,
    pub youtube_player_clients: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub ytdlp_path: Option<PathBuf>,
    pub auto_install: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub idle_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8501".into(),
        }
    }
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            socket_timeout_secs: 30,
            retries: 3,
            fragment_retries: 3,
            user_agent: BROWSER_USER_AGENT.into(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".into(),
            accept_language: "en-US,en;q=0.5".into(),
            referer: "https://www.google.com/".into(),
            youtube_player_clients: vec!["android".into(), "web".into()],
        }
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            auto_install: true,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 3600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let json = r#"{ "server": { "bind_address": "0.0.0.0:9000" }, "extraction": { "retries": 5 } }"#;
        let settings: AppSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.server.bind_address, "0.0.0.0:9000");
        assert_eq!(settings.extraction.retries, 5);
        assert_eq!(settings.extraction.socket_timeout_secs, 30);
        assert_eq!(settings.extraction.user_agent, BROWSER_USER_AGENT);
        assert!(settings.tool.auto_install);
        assert_eq!(settings.session.idle_timeout_secs, 3600);
    }

    #[test]
    fn unknown_keys_from_older_files_are_ignored() {
        let json = r#"{ "schema_version": 1, "session": { "idle_timeout_secs": 60 } }"#;
        let settings: AppSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.session.idle_timeout_secs, 60);

        let written = serde_json::to_value(&settings).unwrap();
        assert!(written.get("schema_version").is_none());
    }
}
