//! Settings and configuration utilities.
//!
//! This module reads settings from $HOME/.diffscribe/settings.json and uses
//! them as a fallback for environment variables.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Settings loaded from $HOME/.diffscribe/settings.json.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Environment variable overrides.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Settings {
    /// Loads settings from the default location.
    pub fn load() -> Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Self::load_from_path(&settings_path)
    }

    /// Loads settings from a specific path.
    ///
    /// A missing file yields empty settings.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        serde_json::from_str::<Self>(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Returns the default settings path.
    pub fn get_settings_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;

        Ok(home_dir.join(".diffscribe").join("settings.json"))
    }

    /// Returns an environment variable with fallback to settings.
    pub fn get_env_var(&self, key: &str) -> Option<String> {
        env::var(key)
            .ok()
            .or_else(|| self.env.get(key).cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_settings(json: &str) -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let settings_path = temp_dir.path().join("settings.json");
        fs::write(&settings_path, json).unwrap();
        (temp_dir, settings_path)
    }

    #[test]
    fn settings_load_from_path() {
        let (_dir, path) = write_settings(
            r#"{
                "env": {
                    "DIFFSCRIBE_TEST_SETTING": "test_value",
                    "DIFFSCRIBE_TEST_KEY": "test_api_key"
                }
            }"#,
        );

        let settings = Settings::load_from_path(&path).unwrap();
        assert_eq!(
            settings.env.get("DIFFSCRIBE_TEST_SETTING").unwrap(),
            "test_value"
        );
        assert_eq!(settings.env.get("DIFFSCRIBE_TEST_KEY").unwrap(), "test_api_key");
    }

    #[test]
    fn missing_file_yields_empty_settings() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from_path(temp_dir.path().join("nope.json")).unwrap();
        assert!(settings.env.is_empty());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let (_dir, path) = write_settings("{ not json");
        let err = Settings::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse settings file"));
    }

    #[test]
    fn settings_env_var_precedence() {
        let (_dir, path) = write_settings(
            r#"{"env": {"DIFFSCRIBE_TEST_PRECEDENCE": "from_settings"}}"#,
        );
        let settings = Settings::load_from_path(&path).unwrap();

        assert_eq!(
            settings.get_env_var("DIFFSCRIBE_TEST_PRECEDENCE").unwrap(),
            "from_settings"
        );

        env::set_var("DIFFSCRIBE_TEST_PRECEDENCE", "from_env");
        assert_eq!(
            settings.get_env_var("DIFFSCRIBE_TEST_PRECEDENCE").unwrap(),
            "from_env"
        );
        env::remove_var("DIFFSCRIBE_TEST_PRECEDENCE");
    }
}
