// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::geo::Coordinate;
use crate::GeopinError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/reverse";
pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const DEFAULT_MARKER_ICON_URL: &str = "https://cdn-icons-png.flaticon.com/512/684/684908.png";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub endpoint: String,
    /// Nominatim rejects requests without an identifying agent.
    pub user_agent: String,
    /// `None` leaves the request unbounded.
    pub timeout_secs: Option<u64>,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEOCODER_URL.to_string(),
            user_agent: format!("GeoPin/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub center: Coordinate,
    pub zoom: f64,
    pub tile_url: String,
    pub marker_icon_url: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: Coordinate::new(107.9019822944495, -7.215907720160664),
            zoom: 12.0,
            tile_url: DEFAULT_TILE_URL.to_string(),
            marker_icon_url: DEFAULT_MARKER_ICON_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub geocoder: GeocoderConfig,
    pub map: MapConfig,
}

impl Settings {
    pub fn default_path() -> PathBuf {
        crate::get_config_root().join("settings.json")
    }

    /// Reads `settings.json` from the config root, or defaults when there is none.
    pub fn load() -> Result<Self, GeopinError> {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, GeopinError> {
        if !path.exists() {
            debug!("No settings file; using defaults — path={}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        info!("Loaded settings — path={}", path.display());
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), GeopinError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.map.zoom, 12.0);
        assert_eq!(settings.geocoder.timeout_secs, None);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"geocoder": {"endpoint": "http://localhost:8080/reverse"}, "map": {"zoom": 5.5}}"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.geocoder.endpoint, "http://localhost:8080/reverse");
        assert!(settings.geocoder.user_agent.starts_with("GeoPin/"));
        assert_eq!(settings.map.zoom, 5.5);
        assert_eq!(settings.map.tile_url, DEFAULT_TILE_URL);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = Settings::default();
        settings.geocoder.timeout_secs = Some(10);
        settings.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_garbage_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ nope").unwrap();
        assert!(matches!(
            Settings::load_from(&path),
            Err(GeopinError::Settings(_))
        ));
    }
}
