use std::path::Path;

use mediagrab_core::fs_paths;
use mediagrab_core::models::settings::AppSettings;

pub fn load_settings() -> AppSettings {
    load_settings_from(&fs_paths::settings_file())
}

/// Missing file means defaults; an unreadable or malformed one is logged and
/// also falls back to defaults.
pub fn load_settings_from(path: &Path) -> AppSettings {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            return AppSettings::default();
        }
        Err(e) => {
            tracing::warn!("Could not read {}: {}", path.display(), e);
            return AppSettings::default();
        }
    };

    match serde_json::from_str::<AppSettings>(&raw) {
        Ok(settings) => {
            tracing::info!("Loaded settings from {}", path.display());
            settings
        }
        Err(e) => {
            tracing::warn!("Invalid settings in {}: {}", path.display(), e);
            AppSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from(&dir.path().join("settings.json"));
        assert_eq!(settings.server.bind_address, "127.0.0.1:8501");
    }

    #[test]
    fn reads_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "tool": { "auto_install": false }, "session": { "idle_timeout_secs": 60 } }"#).unwrap();

        let settings = load_settings_from(&path);
        assert!(!settings.tool.auto_install);
        assert_eq!(settings.session.idle_timeout_secs, 60);
        assert_eq!(settings.extraction.retries, 3);
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let settings = load_settings_from(&path);
        assert!(settings.tool.auto_install);
    }
}
