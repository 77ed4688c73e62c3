//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ReelcutError, ReelcutResult};

/// Environment variable that force-enables or disables burned-in captions.
pub const CAPTIONS_ENV_VAR: &str = "REELCUT_CAPTIONS";

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where rendered clips are written by default.
    pub output_dir: PathBuf,

    /// Encoder and canvas settings.
    pub render: RenderDefaults,

    /// Foreground/background layer geometry.
    pub layout: LayoutConfig,

    /// Caption segmentation and styling.
    pub captions: CaptionConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default encoder parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// Output frame rate.
    pub fps: u32,

    /// x264 constant rate factor (lower = higher quality).
    pub crf: u8,

    /// x264 speed preset.
    pub preset: String,

    /// Encoder thread count (0 lets ffmpeg decide).
    pub threads: u32,

    /// AAC bitrate for the preserved source audio.
    pub audio_bitrate_kbps: u32,

    /// Output canvas width.
    pub target_width: u32,

    /// Output canvas height.
    pub target_height: u32,

    /// ffmpeg executable name or path.
    pub ffmpeg_bin: String,

    /// ffprobe executable name or path.
    pub ffprobe_bin: String,
}

/// Layer geometry for the vertical canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Total margin (px) subtracted from the constrained foreground axis.
    pub foreground_margin_px: u32,

    /// Gaussian blur radius applied to the background layer.
    pub blur_radius_px: u32,

    /// Opacity of the black overlay dimming the background [0.0, 1.0].
    pub dim_opacity: f64,
}

/// Caption segmentation and text style.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Whether captions are burned in at all.
    pub enabled: bool,

    /// Words per caption chunk (1 = single-word captions).
    pub chunk_size: usize,

    /// Minimum on-screen duration of a chunk.
    pub min_duration_secs: f64,

    /// Font size in pixels.
    pub font_size: u32,

    /// Fill color (`#RRGGBB`, `#RGB`, or a color name).
    pub fill_color: String,

    /// Outline color.
    pub stroke_color: String,

    /// Outline offset in pixels (0 disables the outline).
    pub stroke_width: u32,

    /// Explicit TrueType/OpenType font file.
    pub font_path: Option<PathBuf>,

    /// Vertical center of the caption line as a fraction of canvas height.
    pub vertical_anchor: f64,

    /// Bottom band (fraction of height) kept free of captions.
    pub bottom_safe_fraction: f64,

    /// Right band (fraction of width) kept free of captions.
    pub right_safe_fraction: f64,

    /// Write an `.srt` next to each rendered clip.
    pub write_sidecar: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reelcut=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: dirs_default_output(),
            render: RenderDefaults::default(),
            layout: LayoutConfig::default(),
            captions: CaptionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            fps: 24,
            crf: 20,
            preset: "medium".to_string(),
            threads: 4,
            audio_bitrate_kbps: 192,
            target_width: 1080,
            target_height: 1920,
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            foreground_margin_px: 60,
            blur_radius_px: 51,
            dim_opacity: 0.6,
        }
    }
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chunk_size: 4,
            min_duration_secs: 0.1,
            font_size: 80,
            fill_color: "yellow".to_string(),
            stroke_color: "black".to_string(),
            stroke_width: 4,
            font_path: None,
            vertical_anchor: 0.65,
            bottom_safe_fraction: 0.15,
            right_safe_fraction: 0.12,
            write_sidecar: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    ///
    /// Environment overrides are applied on top of whatever was loaded.
    pub fn load() -> Self {
        let config_path = config_file_path();
        let mut config = if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        config
    }

    /// Load and validate config from an explicit path.
    pub fn load_from(path: &Path) -> ReelcutResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }

    /// Apply `REELCUT_CAPTIONS` if set to a recognizable boolean.
    pub fn apply_env_overrides(&mut self) {
        let Ok(raw) = std::env::var(CAPTIONS_ENV_VAR) else {
            return;
        };
        match parse_bool_flag(&raw) {
            Some(enabled) => self.captions.enabled = enabled,
            None => tracing::warn!(
                value = %raw,
                "Ignoring unrecognized {CAPTIONS_ENV_VAR} override"
            ),
        }
    }

    /// Reject values that would make a render meaningless.
    pub fn validate(&self) -> ReelcutResult<()> {
        if self.captions.chunk_size == 0 {
            return Err(ReelcutError::config("captions.chunk_size must be >= 1"));
        }
        if self.captions.font_size == 0 {
            return Err(ReelcutError::config("captions.font_size must be >= 1"));
        }
        let min_duration = self.captions.min_duration_secs;
        if min_duration.is_nan() || min_duration < 0.0 {
            return Err(ReelcutError::config(
                "captions.min_duration_secs must be non-negative",
            ));
        }
        if !(0.0..=1.0).contains(&self.captions.vertical_anchor) {
            return Err(ReelcutError::config(
                "captions.vertical_anchor must be within [0, 1]",
            ));
        }
        for (name, value) in [
            ("captions.bottom_safe_fraction", self.captions.bottom_safe_fraction),
            ("captions.right_safe_fraction", self.captions.right_safe_fraction),
        ] {
            if !(0.0..0.5).contains(&value) {
                return Err(ReelcutError::config(format!(
                    "{name} must be within [0, 0.5)"
                )));
            }
        }
        if self.render.fps == 0 {
            return Err(ReelcutError::config("render.fps must be >= 1"));
        }
        if self.render.target_width < 2 || self.render.target_height < 2 {
            return Err(ReelcutError::config("render target must be at least 2x2"));
        }
        if !(0.0..=1.0).contains(&self.layout.dim_opacity) {
            return Err(ReelcutError::config(
                "layout.dim_opacity must be within [0, 1]",
            ));
        }
        Ok(())
    }
}

fn parse_bool_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("reelcut").join("config.json")
}

/// Default clip output directory.
fn dirs_default_output() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("reelcut").join("clips")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.render.fps, 24);
        assert_eq!(config.render.target_width, 1080);
        assert_eq!(config.render.target_height, 1920);
        assert_eq!(config.captions.stroke_width, 4);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let mut config = AppConfig::default();
        config.captions.chunk_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ReelcutError::Config { .. })
        ));
    }

    #[test]
    fn test_safe_fraction_out_of_range_rejected() {
        let mut config = AppConfig::default();
        config.captions.bottom_safe_fraction = 0.6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"captions": {"chunk_size": 1, "enabled": false}}"#).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.captions.chunk_size, 1);
        assert!(!config.captions.enabled);
        assert_eq!(config.captions.font_size, 80);
        assert_eq!(config.render.preset, "medium");
    }

    #[test]
    fn test_invalid_file_surfaces_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ReelcutError::Json(_))
        ));
    }

    #[test]
    fn test_parse_bool_flag() {
        assert_eq!(parse_bool_flag("TRUE"), Some(true));
        assert_eq!(parse_bool_flag(" off "), Some(false));
        assert_eq!(parse_bool_flag("maybe"), None);
    }
}
