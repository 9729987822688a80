//! Configuration management

use std::path::Path;

use log::LevelFilter;
use tokio::fs;
use tokio::process::Command;

use crate::error::{PolyclinicError, Result};
use crate::types::Config;
use crate::utils::paths::{ensure_dir, get_config_dir, get_config_path};

/// Environment variable overriding `api_url`
pub const API_URL_ENV: &str = "POLYCLINIC_API_URL";

/// Load configuration from the default file, merging with defaults
pub async fn load_config() -> Result<Config> {
    let mut config = load_config_from(&get_config_path()).await?;

    if let Ok(url) = std::env::var(API_URL_ENV) {
        if !url.trim().is_empty() {
            config.api_url = url;
        }
    }

    Ok(normalize(config))
}

/// Load configuration from `path`. A missing file yields the defaults;
/// fields absent from the file keep their default values.
pub async fn load_config_from(path: &str) -> Result<Config> {
    if !Path::new(path).exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path).await?;
    let user_config: Config = serde_json::from_str(&content)
        .map_err(|e| PolyclinicError::InvalidConfig(format!("{}: {}", path, e)))?;

    Ok(normalize(user_config))
}

/// Blank values fall back to defaults; the base URL loses its trailing slash
fn normalize(mut config: Config) -> Config {
    let defaults = Config::default();

    config.api_url = config.api_url.trim().trim_end_matches('/').to_string();
    if config.api_url.is_empty() {
        config.api_url = defaults.api_url;
    }
    if config.editor.trim().is_empty() {
        config.editor = defaults.editor;
    }
    if config.request_timeout_secs == 0 {
        config.request_timeout_secs = defaults.request_timeout_secs;
    }
    // Zero would expire every notice before it is printed
    if config.notice_seconds == 0 {
        config.notice_seconds = defaults.notice_seconds;
    }

    config
}

/// Parse the configured log level
pub fn log_level(config: &Config) -> Result<LevelFilter> {
    config
        .log_level
        .parse()
        .map_err(|_| PolyclinicError::InvalidConfig(format!("unknown log level \"{}\"", config.log_level)))
}

/// Save configuration to file
pub async fn save_config(config: &Config) -> Result<()> {
    ensure_dir(&get_config_dir()).await?;
    let content = serde_json::to_string_pretty(config)?;
    fs::write(get_config_path(), content).await?;
    Ok(())
}

/// Open config file in editor
pub async fn edit_config(editor: &str) -> Result<()> {
    let config_path = get_config_path();

    // Ensure config file exists
    if !Path::new(&config_path).exists() {
        save_config(&Config::default()).await?;
    }

    let status = Command::new(editor)
        .arg(&config_path)
        .status()
        .await
        .map_err(|e| PolyclinicError::Spawn(format!("Failed to start {}: {}", editor, e)))?;

    if !status.success() {
        return Err(PolyclinicError::Spawn(format!(
            "{} exited with code: {:?}",
            editor,
            status.code()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let cfg = load_config_from(&path.to_string_lossy()).await.unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[tokio::test]
    async fn test_partial_file_merges_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"api_url": "https://clinic.example/api/", "request_timeout_secs": 0, "notice_seconds": 0}"#,
        )
        .unwrap();

        let cfg = load_config_from(&path.to_string_lossy()).await.unwrap();
        assert_eq!(cfg.api_url, "https://clinic.example/api");
        assert_eq!(cfg.request_timeout_secs, 15);
        assert_eq!(cfg.notice_seconds, 4);
        assert_eq!(cfg.editor, "nvim");
    }

    #[tokio::test]
    async fn test_malformed_file_is_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_config_from(&path.to_string_lossy()).await.unwrap_err();
        assert!(matches!(err, PolyclinicError::InvalidConfig(_)));
    }

    #[test]
    fn test_log_level_parsing() {
        let mut cfg = Config::default();
        assert_eq!(log_level(&cfg).unwrap(), LevelFilter::Info);
        cfg.log_level = "DEBUG".into();
        assert_eq!(log_level(&cfg).unwrap(), LevelFilter::Debug);
        cfg.log_level = "loud".into();
        assert!(log_level(&cfg).is_err());
    }
}
