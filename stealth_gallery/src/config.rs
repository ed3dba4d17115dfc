//! Stealth Gallery - Configuration
//!
//! Gesture thresholds, import limits and storage location. Loaded from a
//! JSON file; every field falls back to its default when missing.

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{GalleryError, GalleryResult};

/// Gesture recognizer tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GestureConfig {
    /// Long press hold time (ms)
    pub long_press_ms: u64,
    /// Acceleration magnitude counted as an impulse
    pub shake_threshold: f64,
    /// Minimum gap between two counted impulses (ms)
    pub shake_cooldown_ms: u64,
    /// Gap after which the impulse count starts over (ms)
    pub shake_sequence_timeout_ms: u64,
    /// Impulses needed to trigger
    pub shake_required: u32,
    /// Simultaneous contacts that make a tap
    pub multi_touch_contacts: u32,
    /// Max gap between taps (ms)
    pub multi_touch_window_ms: u64,
    /// Taps needed to trigger
    pub multi_touch_taps: u32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            long_press_ms: 2500,
            shake_threshold: 25.0,
            shake_cooldown_ms: 200,
            shake_sequence_timeout_ms: 1500,
            shake_required: 3,
            multi_touch_contacts: 3,
            multi_touch_window_ms: 600,
            multi_touch_taps: 2,
        }
    }
}

/// Onboarding import limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImportConfig {
    /// Max candidates taken from one selection
    pub max_items: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self { max_items: 150 }
    }
}

/// Gallery configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GalleryConfig {
    /// SQLite database file
    pub db_path: PathBuf,
    pub gestures: GestureConfig,
    pub import: ImportConfig,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./gallery/media.db"),
            gestures: GestureConfig::default(),
            import: ImportConfig::default(),
        }
    }
}

impl GalleryConfig {
    /// Load from a JSON file, or defaults if the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> GalleryResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)?;
        serde_json::from_str(&data)
            .map_err(|e| GalleryError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> GalleryResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, data)?;
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
        let config = GalleryConfig::load(dir.path().join("none.json")).unwrap();
        assert_eq!(config, GalleryConfig::default());
        assert_eq!(config.gestures.long_press_ms, 2500);
        assert_eq!(config.import.max_items, 150);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gallery.json");
        std::fs::write(&path, r#"{ "gestures": { "shake_required": 4 } }"#).unwrap();

        let config = GalleryConfig::load(&path).unwrap();
        assert_eq!(config.gestures.shake_required, 4);
        assert_eq!(config.gestures.shake_cooldown_ms, 200);
        assert_eq!(config.import.max_items, 150);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("gallery.json");

        let mut config = GalleryConfig::default();
        config.gestures.multi_touch_taps = 3;
        config.save(&path).unwrap();

        assert_eq!(GalleryConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gallery.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(GalleryConfig::load(&path), Err(GalleryError::Config(_))));
    }
}
