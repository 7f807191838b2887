//! Worker settings loading

use crate::config::Settings;
use crate::ConfigError;
use std::fs;
use std::path::Path;

/// Loads and validates the worker settings TOML file
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let settings: Settings = toml::from_str(&contents)?;
    validate_settings(&settings)?;
    Ok(settings)
}

fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    if settings.queue.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "queue.database-path cannot be empty".to_string(),
        ));
    }

    if settings.queue.poll_interval_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "queue.poll-interval-ms must be >= 100, got {}",
            settings.queue.poll_interval_ms
        )));
    }

    if let Some(endpoint) = &settings.queue.progress_endpoint {
        url::Url::parse(endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("queue.progress-endpoint: {e}")))?;
    }

    if settings.browser.viewport_width < 320 || settings.browser.viewport_height < 240 {
        return Err(ConfigError::Validation(
            "browser viewport is too small".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_minimal_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            r#"
[queue]
database-path = "./queue.db"

[artifacts]
root-dir = "./artifacts"
"#,
        )
        .unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.queue.database_path, "./queue.db");
        assert_eq!(settings.queue.poll_interval_ms, 2000);
        assert_eq!(settings.browser.viewport_width, 1440);
    }

    #[test]
    fn test_bad_progress_endpoint_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            r#"
[queue]
database-path = "./queue.db"
progress-endpoint = "not a url"

[artifacts]
root-dir = "./artifacts"
"#,
        )
        .unwrap();

        assert!(load_settings(&path).is_err());
    }
}
