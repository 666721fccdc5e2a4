//! Path utilities for the fleet console
//!
//! Handles XDG Base Directory specification compliance for config,
//! state, and data directories.

use directories::ProjectDirs;
use std::path::PathBuf;

/// Application identifier for XDG directories
const APP_NAME: &str = "fleet-console";

/// Get project directories
fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME)
}

/// Get the configuration directory
///
/// Location: `$XDG_CONFIG_HOME/fleet-console` or `~/.config/fleet-console`
pub fn config_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.config_dir().to_path_buf())
        .unwrap_or_else(fallback_config_dir)
}

/// Get the main configuration file path
///
/// Location: `$XDG_CONFIG_HOME/fleet-console/config.toml`
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Get the state directory
///
/// Location: `$XDG_STATE_HOME/fleet-console` or `~/.local/state/fleet-console`
pub fn state_dir() -> PathBuf {
    project_dirs()
        .and_then(|p| p.state_dir().map(|d| d.to_path_buf()))
        .unwrap_or_else(fallback_state_dir)
}

/// Get the data directory (persistent data like the send history)
///
/// Location: `$XDG_DATA_HOME/fleet-console` or `~/.local/share/fleet-console`
pub fn data_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(fallback_data_dir)
}

/// Get the send-history file path
///
/// Location: `$XDG_DATA_HOME/fleet-console/history.json`
pub fn history_file() -> PathBuf {
    data_dir().join("history.json")
}

/// Get the log directory
///
/// Location: `$XDG_STATE_HOME/fleet-console/log`
pub fn log_dir() -> PathBuf {
    state_dir().join("log")
}

/// Get the download directory for retrieved log files
///
/// Location: `$XDG_RUNTIME_DIR/fleet-console` or `/tmp/fleet-console-$UID`
pub fn download_dir() -> PathBuf {
    if let Ok(xdg_runtime) = std::env::var("XDG_RUNTIME_DIR") {
        PathBuf::from(xdg_runtime).join(APP_NAME)
    } else {
        // Fallback to /tmp with UID for security
        // SAFETY: getuid() is always safe to call
        let uid = unsafe { libc::getuid() };
        PathBuf::from(format!("/tmp/{}-{}", APP_NAME, uid))
    }
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &PathBuf) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Ensure all required directories exist
pub fn ensure_all_dirs() -> std::io::Result<()> {
    ensure_dir(&config_dir())?;
    ensure_dir(&state_dir())?;
    ensure_dir(&data_dir())?;
    ensure_dir(&log_dir())?;
    Ok(())
}

// Fallback implementations when ProjectDirs is unavailable

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

fn fallback_config_dir() -> PathBuf {
    home_dir().join(".config").join(APP_NAME)
}

fn fallback_state_dir() -> PathBuf {
    home_dir().join(".local").join("state").join(APP_NAME)
}

fn fallback_data_dir() -> PathBuf {
    home_dir().join(".local").join("share").join(APP_NAME)
}
