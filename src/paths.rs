//! Per-platform application directories.
//!
//! - macOS: ~/Library/Application Support/mdnote (config and data)
//! - Linux: $XDG_CONFIG_HOME/mdnote and $XDG_DATA_HOME/mdnote
//!   (falling back to ~/.config and ~/.local/share)
//! - Windows: %APPDATA%\mdnote

use std::io;
use std::path::PathBuf;

pub const APP_NAME: &str = "mdnote";
const LOG_DIR: &str = "logs";
const SETTINGS_FILE: &str = "settings.json";

/// Directory holding the settings record.
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        home().map(|h| h.join("Library/Application Support").join(APP_NAME))
    }

    #[cfg(target_os = "windows")]
    {
        appdata().map(|p| p.join(APP_NAME))
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        xdg_dir("XDG_CONFIG_HOME", ".config").map(|p| p.join(APP_NAME))
    }
}

/// Directory holding logs and other generated state.
pub fn data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        home().map(|h| h.join("Library/Application Support").join(APP_NAME))
    }

    #[cfg(target_os = "windows")]
    {
        appdata().map(|p| p.join(APP_NAME))
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        xdg_dir("XDG_DATA_HOME", ".local/share").map(|p| p.join(APP_NAME))
    }
}

/// Base of the XDG data hierarchy (without the app name), used for
/// desktop entries under `applications/`.
pub fn xdg_data_home() -> Option<PathBuf> {
    xdg_dir("XDG_DATA_HOME", ".local/share")
}

pub fn settings_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(SETTINGS_FILE))
}

pub fn log_dir() -> Option<PathBuf> {
    data_dir().map(|d| d.join(LOG_DIR))
}

/// Creates the log directory if needed and returns it.
pub fn ensure_log_dir() -> io::Result<PathBuf> {
    let dir = log_dir().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "Cannot determine log directory")
    })?;
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

fn home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(target_os = "windows")]
fn appdata() -> Option<PathBuf> {
    std::env::var_os("APPDATA").map(PathBuf::from)
}

fn xdg_dir(var: &str, fallback: &str) -> Option<PathBuf> {
    // Relative XDG values are ignored.
    match std::env::var_os(var).map(PathBuf::from) {
        Some(dir) if dir.is_absolute() => Some(dir),
        _ => home().map(|h| h.join(fallback)),
    }
}
