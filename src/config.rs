//! Thumbnail configuration.
//!
//! A thumbnail is described by a flat option mapping, usually kept in a
//! `thumb.toml` next to where the command runs:
//!
//! ```toml
//! width = 100               # Target width in pixels (required)
//! height = 100              # Target height in pixels (required)
//! crop = false              # Crop to exactly width x height
//! watermark = true          # Composite the watermark image
//! watermark_opacity = 25    # Watermark opacity, 0-100
//! quality = 90              # Encoder quality, 0-100
//! ```
//!
//! `watermarkOpacity` is accepted as an alias of `watermark_opacity`.
//! Unrecognized keys are ignored.
//!
//! ## Layering
//!
//! Options are sparse. A file and command-line flags are combined with
//! [`ThumbOptions::merge`] (later layer wins per key), and only the merged
//! result is validated into a [`ThumbConfig`]. A config is derived once per
//! request and never shared between requests.

use crate::imaging::{Opacity, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the working directory when no config is given.
pub const DEFAULT_CONFIG_FILE: &str = "thumb.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("No path to source image specified")]
    MissingSource,
    #[error("No output path specified")]
    MissingOutput,
    #[error("Missing required option `{0}`")]
    MissingField(&'static str),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Raw, sparse option mapping as read from a file or the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark: Option<bool>,
    #[serde(alias = "watermarkOpacity", skip_serializing_if = "Option::is_none")]
    pub watermark_opacity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
}

impl ThumbOptions {
    /// Parse options from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Layer `overlay` on top of `self`. Keys set in the overlay win.
    pub fn merge(self, overlay: ThumbOptions) -> ThumbOptions {
        ThumbOptions {
            width: overlay.width.or(self.width),
            height: overlay.height.or(self.height),
            crop: overlay.crop.or(self.crop),
            watermark: overlay.watermark.or(self.watermark),
            watermark_opacity: overlay.watermark_opacity.or(self.watermark_opacity),
            quality: overlay.quality.or(self.quality),
        }
    }
}

/// Validated thumbnail settings for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThumbConfig {
    /// Target width in pixels, always > 0.
    pub width: u32,
    /// Target height in pixels, always > 0.
    pub height: u32,
    /// Crop to exactly `width` x `height`.
    pub crop: bool,
    /// Composite the watermark image.
    pub watermark: bool,
    pub watermark_opacity: Opacity,
    pub quality: Quality,
}

impl ThumbConfig {
    /// Normalize raw options into a config.
    ///
    /// `watermark` is forced off when no watermark file is available, whatever
    /// the options say.
    pub fn from_options(
        options: &ThumbOptions,
        has_watermark_file: bool,
    ) -> Result<Self, ConfigError> {
        let width = options.width.ok_or(ConfigError::MissingField("width"))?;
        let height = options.height.ok_or(ConfigError::MissingField("height"))?;

        if width == 0 || height == 0 {
            return Err(ConfigError::Validation(format!(
                "width and height must be non-zero (got {width}x{height})"
            )));
        }
        let opacity = options.watermark_opacity.unwrap_or(Opacity::default().value());
        if opacity > 100 {
            return Err(ConfigError::Validation(
                "watermark_opacity must be 0-100".into(),
            ));
        }
        let quality = options.quality.unwrap_or(Quality::default().value());
        if quality > 100 {
            return Err(ConfigError::Validation("quality must be 0-100".into()));
        }

        Ok(Self {
            width,
            height,
            crop: options.crop.unwrap_or(false),
            watermark: has_watermark_file && options.watermark.unwrap_or(false),
            watermark_opacity: Opacity::new(opacity),
            quality: Quality::new(quality),
        })
    }
}

/// Load options from a TOML file.
pub fn load_options(path: &Path) -> Result<ThumbOptions, ConfigError> {
    let content = fs::read_to_string(path)?;
    ThumbOptions::from_toml_str(&content)
}

/// Load `thumb.toml` from a directory.
///
/// Returns `Ok(None)` if the directory has no `thumb.toml`.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_default_options(dir: &Path) -> Result<Option<ThumbOptions>, ConfigError> {
    let config_path = dir.join(DEFAULT_CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    load_options(&config_path).map(Some)
}

/// Returns a fully-commented stock `thumb.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Thumb Configuration
# ==========================
# Command-line flags override any value set here.
# Unknown keys are ignored.

# Target size in pixels. Both are required.
# The image is scaled to `height` first, then to `width`.
width = 100
height = 100

# Crop to exactly width x height (centre-anchored).
# Without cropping the final height follows the source aspect ratio.
crop = false

# Composite the watermark image, scaled to the thumbnail width and centred.
# Ignored when no watermark file is given.
watermark = false

# Watermark opacity, 0 (invisible) to 100 (the mark's own alpha).
watermark_opacity = 100

# Encoder quality for lossy formats (JPEG, AVIF), 0-100.
quality = 90
"##
}
