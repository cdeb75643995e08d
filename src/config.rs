// Editor configuration, read from TOML.
// Missing keys fall back to the defaults below.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{BrushSize, FitMode, Viewport};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Size of the image box on screen (24rem square by default).
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub fit: FitMode,

    /// Brush diameter when the editor starts; clamped into [5, 80].
    pub default_brush_size: i64,

    pub checker_size: usize,
    pub checker_light: u32,
    pub checker_dark: u32,
    pub ring_fill: u32,
    pub ring_fill_opacity: f32,
    pub ring_outline: u32,
    pub placeholder: u32,
    pub page_background: u32,

    /// Used when the export target has no alpha channel.
    pub background: [u8; 3],

    /// Uploads above this many pixels are refused.
    pub max_decoded_pixels: u64,

    pub event_queue_capacity: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            viewport_width: 384,
            viewport_height: 384,
            fit: FitMode::Cover,
            default_brush_size: 20,
            checker_size: 8,
            checker_light: 0xFFFFFF,
            checker_dark: 0xCCCCCC,
            ring_fill: 0xFFFFFF,
            ring_fill_opacity: 0.7,
            ring_outline: 0x4B5563,
            placeholder: 0xE5E7EB,
            page_background: 0xFFFFFF,
            background: [255, 255, 255],
            max_decoded_pixels: 40_000_000,
            event_queue_capacity: 256,
        }
    }
}

impl EditorConfig {
    pub const FILE_NAME: &'static str = "photo-mask.toml";

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// An explicit file must load. Without one, the per-user config file is
    /// used when present and readable; otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let text = fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
            return Self::from_toml(&text);
        }

        let Some(path) = Self::config_file() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        match fs::read_to_string(&path) {
            Ok(text) => match Self::from_toml(&text) {
                Ok(config) => {
                    log::info!("using config {}", path.display());
                    Ok(config)
                }
                Err(err) => {
                    log::error!("Error parsing config file {}: {err}", path.display());
                    Ok(Self::default())
                }
            },
            Err(err) => {
                log::error!("Error reading config file {}: {err}", path.display());
                Ok(Self::default())
            }
        }
    }

    pub fn config_file() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "GitHub", "photo-mask").map(|p| p.config_dir().join(Self::FILE_NAME))
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.viewport_width as f32, self.viewport_height as f32, self.fit)
    }

    pub fn brush_size(&self) -> BrushSize {
        BrushSize::new(self.default_brush_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = EditorConfig::from_toml("fit = \"contain\"\ndefault_brush_size = 500\n").unwrap();
        assert_eq!(config.fit, FitMode::Contain);
        assert_eq!(config.brush_size().get(), 80);
        assert_eq!(config.viewport_width, 384);
        assert_eq!(config.background, [255, 255, 255]);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        assert!(matches!(EditorConfig::from_toml("fit = 3"), Err(Error::Config(_))));
        assert!(matches!(EditorConfig::from_toml("fit = \"zoom\""), Err(Error::Config(_))));
    }

    #[test]
    fn round_trips_through_toml() {
        let config = EditorConfig { fit: FitMode::Fill, checker_size: 4, ..EditorConfig::default() };
        let text = config.to_toml().unwrap();
        assert_eq!(EditorConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn missing_explicit_file_fails() {
        let err = EditorConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
