//! Settings that survive a restart: the selected program and the brightness.

use crate::program::ProgramKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_BRIGHTNESS: u8 = 75;
pub const MAX_BRIGHTNESS: u8 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub program: ProgramKind,
    /// Percent, 0-100.
    pub brightness: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            program: ProgramKind::Fire,
            brightness: DEFAULT_BRIGHTNESS,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let text = fs::read_to_string(path)?;
        let mut config: AppConfig = serde_json::from_str(&text)?;
        config.brightness = config.brightness.min(MAX_BRIGHTNESS);
        Ok(config)
    }

    /// Load the config, falling back to defaults if the file is missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring unreadable config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = AppConfig {
            program: ProgramKind::LavaLamp,
            brightness: 40,
        };
        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("absent.json"));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn corrupt_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(AppConfig::load_or_default(&path), AppConfig::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "program": "ripples" }"#).unwrap();
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.program, ProgramKind::Ripples);
        assert_eq!(config.brightness, DEFAULT_BRIGHTNESS);
    }

    #[test]
    fn brightness_is_capped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "program": "static", "brightness": 250 }"#).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap().brightness, MAX_BRIGHTNESS);
    }
}
