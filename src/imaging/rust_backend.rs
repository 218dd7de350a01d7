//! Pure Rust image processing backend.
//!
//! Decodes into memory with the `image` crate and keeps the pixels in the
//! handle until it is dropped.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image::ImageReader` (format sniffed from content) |
//! | Sharpen | `DynamicImage::unsharpen` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Crop | `DynamicImage::crop_imm`, centre-anchored |
//! | Watermark | alpha scaled per pixel, then `imageops::overlay` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with quality |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Encode → GIF | `save_with_format` after conversion to RGBA8 |
//! | Encode → others | `DynamicImage::save_with_format` |

use super::backend::{BackendError, Dimensions, ImageBackend, ImageHandle, output_extension};
use super::calculations::{calculate_center_crop, calculate_placement, calculate_resize_dimensions};
use super::params::{Opacity, Placement, Quality, Sharpening};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Output extensions and the format each one encodes to.
const OUTPUT_FORMATS: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("webp", ImageFormat::WebP),
    ("avif", ImageFormat::Avif),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
];

/// Returns the output extensions this backend can encode.
#[cfg(test)]
fn supported_output_extensions() -> Vec<&'static str> {
    OUTPUT_FORMATS
        .iter()
        .filter(|(_, fmt)| fmt.writing_enabled())
        .map(|(ext, _)| *ext)
        .collect()
}

fn output_format(path: &Path) -> Result<ImageFormat, BackendError> {
    let ext = output_extension(path);
    OUTPUT_FORMATS
        .iter()
        .find(|(candidate, fmt)| *candidate == ext && fmt.writing_enabled())
        .map(|(_, fmt)| *fmt)
        .ok_or(BackendError::UnsupportedFormat(ext))
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// A decoded image held in memory.
pub struct RustImage {
    image: DynamicImage,
}

impl RustImage {
    /// Wrap an already decoded image.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| BackendError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Encode and save, inferring format from extension.
fn save_image(img: &DynamicImage, path: &Path, quality: Quality) -> Result<(), BackendError> {
    let format = output_format(path)?;
    let encode_err =
        |e: image::ImageError| BackendError::ProcessingFailed(format!("{format:?} encode failed: {e}"));

    match format {
        ImageFormat::Jpeg => {
            let writer = BufWriter::new(File::create(path)?);
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality.value() as u8);
            // JPEG has no alpha channel
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(encode_err)
        }
        ImageFormat::Avif => {
            let writer = BufWriter::new(File::create(path)?);
            let encoder = image::codecs::avif::AvifEncoder::new_with_speed_quality(
                writer,
                6,
                quality.value() as u8,
            );
            img.write_with_encoder(encoder).map_err(encode_err)
        }
        // The GIF encoder only takes 8-bit RGB(A)
        ImageFormat::Gif => DynamicImage::ImageRgba8(img.to_rgba8())
            .save_with_format(path, ImageFormat::Gif)
            .map_err(encode_err),
        other => img.save_with_format(path, other).map_err(encode_err),
    }
}

impl ImageBackend for RustBackend {
    type Image = RustImage;

    fn name(&self) -> &'static str {
        "rust"
    }

    fn open(&self, path: &Path) -> Result<RustImage, BackendError> {
        let image = load_image(path)?;
        debug!(path = %path.display(), width = image.width(), height = image.height(), "decoded image");
        Ok(RustImage { image })
    }
}

impl ImageHandle for RustImage {
    fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.image.width(), self.image.height())
    }

    fn sharpen(&mut self, amount: u32) -> Result<(), BackendError> {
        let sharpening = Sharpening::from_amount(amount);
        self.image = self
            .image
            .unsharpen(sharpening.sigma, sharpening.threshold);
        Ok(())
    }

    fn resize(&mut self, width: Option<u32>, height: Option<u32>) -> Result<(), BackendError> {
        let current = self.dimensions().as_tuple();
        let (w, h) = calculate_resize_dimensions(current, width, height);
        if (w, h) != current {
            self.image = self.image.resize_exact(w, h, FilterType::Lanczos3);
        }
        Ok(())
    }

    fn crop(&mut self, width: u32, height: u32) -> Result<(), BackendError> {
        let rect = calculate_center_crop(self.dimensions().as_tuple(), width, height);
        self.image = self.image.crop_imm(rect.x, rect.y, rect.width, rect.height);
        Ok(())
    }

    fn watermark(
        &mut self,
        mark: &RustImage,
        placement: Placement,
        opacity: Opacity,
    ) -> Result<(), BackendError> {
        let mut overlay = mark.image.to_rgba8();
        if opacity.value() < 100 {
            let factor = opacity.factor();
            for pixel in overlay.pixels_mut() {
                pixel[3] = (pixel[3] as f32 * factor).round() as u8;
            }
        }

        let (x, y) = calculate_placement(
            placement,
            self.dimensions().as_tuple(),
            (overlay.width(), overlay.height()),
        );

        let mut base = self.image.to_rgba8();
        image::imageops::overlay(&mut base, &overlay, x, y);
        self.image = DynamicImage::ImageRgba8(base);
        Ok(())
    }

    fn save(&self, path: &Path, quality: Quality) -> Result<(), BackendError> {
        save_image(&self.image, path, quality)
    }
}
