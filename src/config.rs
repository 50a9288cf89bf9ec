use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    composition::CaptureMode,
    error::{ConfigError, Result},
    export::ExportFormat,
    filters::FilterSelection,
    frame::FrameSize,
};

/// Main configuration for the Photobooth
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial capture mode and filter/flip selection
    pub booth: BoothConfig,

    /// Where frames come from
    pub source: SourceConfig,

    /// Border and gap sizes of composed photos
    pub layout: LayoutConfig,

    /// Countdown before each shot of a multi-shot capture
    pub countdown: CountdownConfig,

    /// Live preview settings
    pub preview: PreviewConfig,

    /// Composed photo output
    pub export: ExportConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.source.validate()?;
        self.layout.validate()?;
        self.countdown.validate()?;
        self.preview.validate()?;
        self.export.validate()?;
        Ok(())
    }
}

/// Initial user selections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoothConfig {
    pub mode: CaptureMode,
    pub filter: FilterSelection,
    pub flip: bool,
}

/// Kind of frame source to acquire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Synthetic animated gradient
    #[default]
    TestPattern,
    /// A still image file served as a live track
    Image,
}

/// Frame source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,

    /// Image path, required for `image` sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Test pattern resolution
    pub width: u32,
    pub height: u32,

    /// Test pattern sensor noise (0.0-1.0)
    pub noise: f32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::TestPattern,
            path: None,
            width: FrameSize::DEFAULT.width,
            height: FrameSize::DEFAULT.height,
            noise: 0.0,
        }
    }
}

impl SourceConfig {
    /// Largest test pattern edge, in pixels
    pub const MAX_RESOLUTION: u32 = 8192;

    fn validate(&self) -> Result<()> {
        if self.width == 0
            || self.height == 0
            || self.width > Self::MAX_RESOLUTION
            || self.height > Self::MAX_RESOLUTION
        {
            return Err(ConfigError::InvalidValue {
                key: "source.resolution".to_string(),
                value: format!("{}x{}", self.width, self.height)
            }.into());
        }

        if !(0.0..=1.0).contains(&self.noise) {
            return Err(ConfigError::InvalidValue {
                key: "source.noise".to_string(),
                value: self.noise.to_string()
            }.into());
        }

        if self.kind == SourceKind::Image && self.path.is_none() {
            return Err(ConfigError::InvalidValue {
                key: "source.path".to_string(),
                value: "<unset>".to_string()
            }.into());
        }

        Ok(())
    }
}

/// Composed photo geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// White border on the sides and top (and bottom for triple strips)
    pub border_width: u32,

    /// Caption-style bottom border of single photos
    pub bottom_border_width: u32,

    /// Space between shots of a triple strip
    pub gap: u32,
}

impl LayoutConfig {
    /// Largest border or gap, in pixels
    pub const MAX_SIZE: u32 = 1000;

    fn validate(&self) -> Result<()> {
        let sizes = [
            ("layout.border_width", self.border_width),
            ("layout.bottom_border_width", self.bottom_border_width),
            ("layout.gap", self.gap),
        ];
        for (key, value) in sizes {
            if value > Self::MAX_SIZE {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string()
                }.into());
            }
        }
        Ok(())
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            border_width: 20,
            bottom_border_width: 60,
            gap: 10,
        }
    }
}

/// Countdown configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownConfig {
    /// Number shown first; counts down to 1
    pub steps: u32,

    /// Duration of each step in milliseconds
    pub step_ms: u64,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            steps: 3,
            step_ms: 1000,
        }
    }
}

impl CountdownConfig {
    pub fn step_duration(&self) -> Duration {
        Duration::from_millis(self.step_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.steps == 0 || self.steps > 10 {
            return Err(ConfigError::InvalidValue {
                key: "countdown.steps".to_string(),
                value: self.steps.to_string()
            }.into());
        }
        Ok(())
    }
}

/// Preview render loop configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Target display refresh rate
    pub fps: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self { fps: 60 }
    }
}

impl PreviewConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }

    fn validate(&self) -> Result<()> {
        if self.fps == 0 || self.fps > 240 {
            return Err(ConfigError::InvalidValue {
                key: "preview.fps".to_string(),
                value: self.fps.to_string()
            }.into());
        }
        Ok(())
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory composed photos are written to
    pub output_dir: PathBuf,

    pub format: ExportFormat,

    /// JPEG quality (1-100), ignored for PNG
    pub jpeg_quality: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("photos"),
            format: ExportFormat::Png,
            jpeg_quality: 90,
        }
    }
}

impl ExportConfig {
    fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::InvalidValue {
                key: "export.jpeg_quality".to_string(),
                value: self.jpeg_quality.to_string()
            }.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.layout.border_width, 20);
        assert_eq!(config.layout.bottom_border_width, 60);
        assert_eq!(config.layout.gap, 10);
        assert_eq!(config.countdown.step_duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("photobooth.toml");

        let mut original = Config::default();
        original.booth.filter = FilterSelection::Sepia;
        original.booth.mode = CaptureMode::Triple;
        original.export.format = ExportFormat::Jpeg;

        original.save_to_file(&file_path).unwrap();
        let loaded = Config::from_file(&file_path).unwrap();

        assert_eq!(loaded.booth.filter, FilterSelection::Sepia);
        assert_eq!(loaded.booth.mode, CaptureMode::Triple);
        assert_eq!(loaded.export.format, ExportFormat::Jpeg);
        assert_eq!(loaded.layout, original.layout);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[booth]\nmode = \"triple\"\nfilter = \"blur\"\nflip = true\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.booth.mode, CaptureMode::Triple);
        assert!(config.booth.flip);
        assert_eq!(config.preview.fps, 60);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let result = Config::from_file(dir.path().join("nope.toml"));
        assert!(matches!(
            result,
            Err(crate::error::PhotoboothError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_invalid_values() {
        let mut config = Config::default();
        config.preview.fps = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.countdown.steps = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.source.kind = SourceKind::Image;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_layout_and_resolution_limits() {
        let mut config = Config::default();
        config.layout.border_width = u32::MAX / 2;
        assert!(matches!(
            config.validate(),
            Err(crate::error::PhotoboothError::Config(ConfigError::InvalidValue { ref key, .. }))
                if key == "layout.border_width"
        ));

        let mut config = Config::default();
        config.layout.gap = LayoutConfig::MAX_SIZE + 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.layout.bottom_border_width = LayoutConfig::MAX_SIZE;
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        config.source.width = SourceConfig::MAX_RESOLUTION + 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.source.height = u32::MAX;
        assert!(config.validate().is_err());
    }
}
