//! Path utilities for polyclinic
//!
//! Respects XDG Base Directory Specification

use crate::error::Result;
use std::env;
use tokio::fs;

const APP_NAME: &str = "polyclinic";

/// Get config directory path
/// Respects XDG_CONFIG_HOME, defaults to ~/.config/polyclinic
pub fn get_config_dir() -> String {
    let base = env::var("XDG_CONFIG_HOME")
        .unwrap_or_else(|_| {
            dirs::config_dir()
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_else(|| format!("{}/.config", env::var("HOME").unwrap_or_default()))
        });

    format!("{}/{}", base, APP_NAME)
}

/// Get data directory path
/// Respects XDG_DATA_HOME, defaults to ~/.local/share/polyclinic
pub fn get_data_dir() -> String {
    let base = env::var("XDG_DATA_HOME")
        .unwrap_or_else(|_| {
            dirs::data_dir()
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_else(|| format!("{}/.local/share", env::var("HOME").unwrap_or_default()))
        });

    format!("{}/{}", base, APP_NAME)
}

/// Get config file path
pub fn get_config_path() -> String {
    format!("{}/config.json", get_config_dir())
}

/// Get stored credential path
pub fn get_credentials_path() -> String {
    format!("{}/token", get_data_dir())
}

/// Get log file path
pub fn get_log_path() -> String {
    format!("{}/{}.log", get_data_dir(), APP_NAME)
}

/// Ensure a directory exists
pub async fn ensure_dir(path: &str) -> Result<()> {
    fs::create_dir_all(path).await?;
    Ok(())
}

/// Ensure all required app directories exist
pub async fn ensure_app_dirs() -> Result<()> {
    ensure_dir(&get_config_dir()).await?;
    ensure_dir(&get_data_dir()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_end_with_app_files() {
        assert!(get_config_path().ends_with("polyclinic/config.json"));
        assert!(get_credentials_path().ends_with("polyclinic/token"));
        assert!(get_log_path().ends_with("polyclinic/polyclinic.log"));
    }
}
