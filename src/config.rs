use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Directory name under the platform config root.
pub const APP_DIR_NAME: &str = "claude-model-manager";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const HISTORY_FILE_NAME: &str = "history.json";
/// Name of the assistant binary looked up on PATH.
pub const DEFAULT_CLAUDE_BIN: &str = "claude";

/// Get the cm base directory path (without creating it)
/// Can be overridden with CM_CONFIG_DIR environment variable
pub fn cm_dir() -> PathBuf {
    if let Some(custom_dir) = env::var_os("CM_CONFIG_DIR")
        && !custom_dir.is_empty()
    {
        PathBuf::from(custom_dir)
    } else {
        platform_config_root().join(APP_DIR_NAME)
    }
}

/// Roaming app-data on Windows.
#[cfg(windows)]
fn platform_config_root() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from("./"))
}

/// `~/.config` everywhere else, macOS included.
#[cfg(not(windows))]
fn platform_config_root() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".config"))
        .unwrap_or_else(|| PathBuf::from("./.config"))
}

/// Get the path of the profiles document inside `dir`
pub fn config_file_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

/// Get the path of the change-log document inside `dir`
pub fn history_file_path(dir: &Path) -> PathBuf {
    dir.join(HISTORY_FILE_NAME)
}

/// Get the assistant binary to launch (can be overridden with CM_CLAUDE_BIN env var)
pub fn claude_binary() -> OsString {
    env::var_os("CM_CLAUDE_BIN")
        .filter(|bin| !bin.is_empty())
        .unwrap_or_else(|| OsString::from(DEFAULT_CLAUDE_BIN))
}
