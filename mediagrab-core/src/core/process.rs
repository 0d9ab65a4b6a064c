use std::ffi::{OsStr, OsString};

use crate::fs_paths;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// `PATH` with the managed bin dir searched first.
fn search_path() -> Option<OsString> {
    let bin_dir = fs_paths::bin_dir()?;
    let inherited = std::env::var_os("PATH").unwrap_or_default();
    let dirs = std::iter::once(bin_dir).chain(std::env::split_paths(&inherited));
    match std::env::join_paths(dirs) {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!("Keeping inherited PATH: {}", e);
            None
        }
    }
}

/// Child process with the managed bin dir on `PATH` and UTF-8 Python I/O.
pub fn command(program: impl AsRef<OsStr>) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(program);
    if let Some(path) = search_path() {
        cmd.env("PATH", path);
    }
    cmd.env("PYTHONIOENCODING", "utf-8").env("PYTHONUTF8", "1");
    #[cfg(windows)]
    cmd.creation_flags(CREATE_NO_WINDOW);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn managed_bin_dir_is_searched_first() {
        let (Some(bin_dir), Some(path)) = (fs_paths::bin_dir(), search_path()) else {
            return;
        };
        let mut dirs = std::env::split_paths(&path);
        assert_eq!(dirs.next(), Some(bin_dir));

        let inherited: Vec<_> = std::env::var_os("PATH")
            .map(|p| std::env::split_paths(&p).collect())
            .unwrap_or_default();
        assert_eq!(dirs.collect::<Vec<_>>(), inherited);
    }
}
