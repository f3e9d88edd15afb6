//! Viewer configuration.
//!
//! Capture settings are ideals: the acquirer falls back to looser
//! constraints when the device cannot honour them.

use super::FacingMode;
use crate::collaborators::CollaboratorConfig;
use crate::pump::PumpConfig;
use crate::transform::TransformPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for camera capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera device index; `None` lets the backend choose by facing.
    pub device_index: Option<u32>,
    /// Preferred camera facing.
    pub facing: FacingMode,
    /// Ideal frame width in pixels.
    pub ideal_width: u32,
    /// Ideal frame height in pixels.
    pub ideal_height: u32,
    /// Ideal frames per second.
    pub ideal_fps: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_index: None,
            facing: FacingMode::Environment,
            ideal_width: 1920,
            ideal_height: 1080,
            ideal_fps: 30,
        }
    }
}

impl CaptureConfig {
    /// Creates a new configuration with the specified ideal dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            ideal_width: width,
            ideal_height: height,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ideal_width == 0 || self.ideal_height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.ideal_fps == 0 || self.ideal_fps > 120 {
            return Err(ConfigError::InvalidFrameRate);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Width or height is zero.
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    /// Frame rate outside 1-120 fps.
    #[error("invalid frame rate (must be 1-120 fps)")]
    InvalidFrameRate,
    /// Refresh rate outside 1-240 Hz.
    #[error("invalid refresh rate (must be 1-240 Hz)")]
    InvalidRefreshRate,
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Transform section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Pixel mapping applied to every frame.
    pub policy: TransformPolicy,
}

/// Still capture section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StillConfig {
    /// Directory stills are saved into.
    pub output_dir: PathBuf,
}

impl Default for StillConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("stills"),
        }
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Camera preferences.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Frame pump cadence and timeouts.
    #[serde(default)]
    pub pump: PumpConfig,
    /// Pixel transform selection.
    #[serde(default)]
    pub transform: TransformConfig,
    /// Still capture output.
    #[serde(default)]
    pub still: StillConfig,
    /// Optional page collaborators.
    #[serde(default)]
    pub collaborators: Vec<CollaboratorConfig>,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.capture.validate()?;
        config.pump.validate()?;
        Ok(config)
    }
}
