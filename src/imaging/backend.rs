//! Image processing backend traits and shared types.
//!
//! The [`ImageBackend`] trait opens images; every opened image is an
//! [`ImageHandle`] exposing the five operations the thumbnail pipeline needs:
//! sharpen, resize, crop, watermark, and save.
//!
//! | Operation | [`RustBackend`](super::rust_backend::RustBackend) | [`MagickBackend`](super::magick_backend::MagickBackend) |
//! |---|---|---|
//! | open | `image::ImageReader` decode | `src[0] -format "%w %h" info:` |
//! | sharpen | `DynamicImage::unsharpen` | `-unsharp 0x{sigma}` |
//! | resize | `DynamicImage::resize_exact`, Lanczos3 | `-filter Lanczos -resize WxH!` |
//! | crop | `DynamicImage::crop_imm`, centred | `-crop WxH+X+Y +repage`, centred offsets |
//! | watermark | alpha-scaled `imageops::overlay` | `-compose over -composite` |
//! | save | encoder chosen by extension | one `magick` invocation |
//!
//! Handles own their pixels (or their pending command) and release them on
//! drop, so every early return in the pipeline frees what it acquired.

use super::params::{Opacity, Placement, Quality};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {}: {message}", .path.display())]
    Decode { path: PathBuf, message: String },
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("ImageMagick binary not found: {0}")]
    ToolNotFound(String),
    #[error("{program} failed ({status}): {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Pixel size of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Trait for image processing backends.
///
/// A backend is chosen once, when the pipeline is constructed. It holds only
/// configuration, so a single value can serve any number of runs.
pub trait ImageBackend: Sync {
    /// The decoded-image type this backend hands out.
    type Image: ImageHandle;

    /// Short name for logs and reports.
    fn name(&self) -> &'static str;

    /// Open and measure an image.
    fn open(&self, path: &Path) -> Result<Self::Image, BackendError>;
}

/// A decoded image owned by one pipeline run.
pub trait ImageHandle {
    /// Current dimensions, reflecting every operation applied so far.
    fn dimensions(&self) -> Dimensions;

    fn width(&self) -> u32 {
        self.dimensions().width
    }

    fn height(&self) -> u32 {
        self.dimensions().height
    }

    /// Unsharp-mask the image. See [`Sharpening::from_amount`](super::Sharpening::from_amount).
    fn sharpen(&mut self, amount: u32) -> Result<(), BackendError>;

    /// Resize; a `None` dimension follows the aspect ratio.
    fn resize(&mut self, width: Option<u32>, height: Option<u32>) -> Result<(), BackendError>;

    /// Centre-crop to at most `width` x `height`.
    fn crop(&mut self, width: u32, height: u32) -> Result<(), BackendError>;

    /// Composite `mark` onto this image.
    fn watermark(
        &mut self,
        mark: &Self,
        placement: Placement,
        opacity: Opacity,
    ) -> Result<(), BackendError>;

    /// Encode to `path`, format chosen by extension.
    fn save(&self, path: &Path, quality: Quality) -> Result<(), BackendError>;
}

/// Lowercased extension of `path`, empty when there is none.
pub(crate) fn output_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}
