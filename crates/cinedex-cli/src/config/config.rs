//! `AppConfig` struct and TOML loading.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Default search debounce in milliseconds.
const DEFAULT_DEBOUNCE_MS: u64 = 400;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// TMDB connection settings.
    #[serde(default)]
    pub tmdb: TmdbConfig,
    /// Browser settings.
    #[serde(default)]
    pub browse: BrowseConfig,
}

/// TMDB connection configuration.
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
pub struct TmdbConfig {
    /// API base URL override.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Response language (e.g. "en-US").
    #[serde(default)]
    pub language: Option<String>,
}

/// Browser configuration.
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct BrowseConfig {
    /// Quiet period after the last search keystroke, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

const fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

impl BrowseConfig {
    /// Returns the debounce delay.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found; using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_default_config() {
        // Arrange & Act
        let config = AppConfig::default();

        // Assert
        assert!(config.tmdb.base_url.is_none());
        assert!(config.tmdb.language.is_none());
        assert_eq!(config.browse.debounce(), Duration::from_millis(400));
    }

    #[test]
    fn test_parse_full_config() {
        // Arrange
        let toml_str = r#"
            [tmdb]
            base_url = "http://localhost:8080/3/"
            language = "ja-JP"

            [browse]
            debounce_ms = 250
        "#;

        // Act
        let config: AppConfig = toml::from_str(toml_str).unwrap();

        // Assert
        assert_eq!(
            config,
            AppConfig {
                tmdb: TmdbConfig {
                    base_url: Some(String::from("http://localhost:8080/3/")),
                    language: Some(String::from("ja-JP")),
                },
                browse: BrowseConfig { debounce_ms: 250 },
            }
        );
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        // Act
        let config = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_partial_config() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tmdb]\nlanguage = \"en-US\"\n[browse]\n").unwrap();

        // Act
        let config = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(config.tmdb.language.as_deref(), Some("en-US"));
        assert_eq!(config.browse, BrowseConfig::default());
    }

    #[test]
    fn test_load_invalid_config() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[browse]\ndebounce_ms = \"soon\"\n").unwrap();

        // Act
        let err = AppConfig::load(&path).unwrap_err();

        // Assert
        assert!(err.to_string().starts_with("failed to parse"));
    }
}
