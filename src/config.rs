/// Application configuration
///
/// Loaded once at startup from `<config_dir>/moments/config.json`.
/// Every field has a default so a partial (or missing) file is fine.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tuning for the full-screen media viewer
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    /// Gap between pages in pixels, used by both the static offset and
    /// the commit seeding so committed and dragged positions line up
    pub page_gap: f32,
    /// Fraction of the viewport width a drag must exceed to commit
    pub distance_ratio: f32,
    /// Release velocity (px/ms) above which a short flick commits
    pub momentum_threshold: f32,
    /// Duration of the eased slide between pages
    pub transition_ms: u64,
    /// Delay after opening before animated transitions are re-enabled
    pub enable_delay_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            page_gap: 16.0,
            distance_ratio: 0.5,
            momentum_threshold: 0.5,
            transition_ms: 300,
            enable_delay_ms: 50,
        }
    }
}

/// Settings for the sequential upload helper
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct UploadConfig {
    /// Attempts per file before giving up (at least 1)
    pub max_attempts: u32,
    /// Pause between attempts of the same file
    pub retry_delay_ms: u64,
    /// Longest side of a stored photo; larger photos are downscaled
    pub max_dimension: u32,
    /// JPEG quality used when re-encoding photos (1-100)
    pub jpeg_quality: u8,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 250,
            max_dimension: 2048,
            jpeg_quality: 82,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub viewer: ViewerConfig,
    pub upload: UploadConfig,
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            viewer: ViewerConfig::default(),
            upload: UploadConfig::default(),
            log_filter: "moments=info".to_string(),
        }
    }
}

impl AppConfig {
    /// Default location of the config file
    /// - Linux: ~/.config/moments/config.json
    /// - macOS: ~/Library/Application Support/moments/config.json
    /// - Windows: %APPDATA%\moments\config.json
    pub fn default_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or(Error::NoDirectory("config"))?;
        path.push("moments");
        path.push("config.json");
        Ok(path)
    }

    /// Load from the default location. A missing file is created with the
    /// defaults so there is something to edit.
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            let config = Self::default();
            if let Err(e) = config.save(&path) {
                tracing::warn!(path = %path.display(), error = %e, "could not write default config");
            }
            return Ok(config);
        }
        Self::load_from(&path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate(path)
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn validate(self, path: &Path) -> Result<Self> {
        let invalid = |reason: &str| Error::Config {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };
        if self.upload.max_attempts == 0 {
            return Err(invalid("upload.max_attempts must be at least 1"));
        }
        if !(1..=100).contains(&self.upload.jpeg_quality) {
            return Err(invalid("upload.jpeg_quality must be within 1..=100"));
        }
        if self.viewer.distance_ratio <= 0.0 || self.viewer.page_gap < 0.0 {
            return Err(invalid("viewer distances must be positive"));
        }
        if self.viewer.distance_ratio >= 1.0 {
            return Err(invalid("viewer.distance_ratio must be below 1"));
        }
        if self.viewer.momentum_threshold < 0.0 {
            return Err(invalid("viewer.momentum_threshold must not be negative"));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.viewer.page_gap, 16.0);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "viewer": { "transition_ms": 120 } }"#).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.viewer.transition_ms, 120);
        assert_eq!(config.viewer.distance_ratio, 0.5);
        assert_eq!(config.upload.max_attempts, 3);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(AppConfig::load_from(&path), Err(Error::Config { .. })));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "upload": { "max_attempts": 0 } }"#).unwrap();

        assert!(matches!(AppConfig::load_from(&path), Err(Error::Config { .. })));
    }

    #[test]
    fn test_swipe_thresholds_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        for json in [
            r#"{ "viewer": { "momentum_threshold": -0.1 } }"#,
            r#"{ "viewer": { "distance_ratio": 1.0 } }"#,
            r#"{ "viewer": { "distance_ratio": 0.0 } }"#,
        ] {
            std::fs::write(&path, json).unwrap();
            assert!(matches!(AppConfig::load_from(&path), Err(Error::Config { .. })), "{json}");
        }

        std::fs::write(&path, r#"{ "viewer": { "momentum_threshold": 0.0, "distance_ratio": 0.9 } }"#).unwrap();
        assert!(AppConfig::load_from(&path).is_ok());
    }

    #[test]
    fn test_saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moments").join("config.json");
        let mut config = AppConfig::default();
        config.log_filter = "moments=debug".into();

        config.save(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }
}
