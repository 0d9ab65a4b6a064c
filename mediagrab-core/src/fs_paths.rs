use std::path::PathBuf;

const APP_DIR: &str = "mediagrab";

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn settings_file() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn bin_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(APP_DIR).join("bin"))
}

pub fn scratch_root() -> PathBuf {
    std::env::temp_dir()
}
