//! The thumbnail pipeline.
//!
//! One run opens one source image, applies a fixed transform sequence, and
//! writes one output file:
//!
//! ```text
//! open ─► sharpen? ─► resize(h) ─► crop? ─► watermark? ─► resize(w) ─► crop again? ─► save
//! ```
//!
//! | Step | Fires when |
//! |---|---|
//! | sharpen by `width - source_width` | the *native* source is narrower than the target |
//! | resize to `height` | always |
//! | crop to `width` x `height` | `crop` is set |
//! | watermark, scaled to the current width | `watermark` is set (a file is then required) |
//! | resize to `width` | always |
//! | crop to `width` x `height` again | `crop` is set and the height still overflows |
//!
//! The first resize fixes the height so the crop has something to bite on; the
//! second fixes the width, which may leave the height over target again for
//! wide crops, hence the corrective crop.
//!
//! Runs share nothing. Every handle is owned by the run and dropped on every
//! exit path.

use crate::config::{ConfigError, ThumbConfig, ThumbOptions};
use crate::imaging::{BackendError, Dimensions, ImageBackend, ImageHandle, Placement};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Watermark requested but no watermark file was supplied")]
    MissingWatermarkSource,
    #[error("error saving file: {}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("Image processing failed: {0}")]
    Backend(#[from] BackendError),
}

/// Everything one run needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRequest {
    pub source: PathBuf,
    pub output: PathBuf,
    pub watermark: Option<PathBuf>,
    pub config: ThumbConfig,
}

impl PipelineRequest {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }
}

/// Collects paths and raw options, then validates them into a [`PipelineRequest`].
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    source: Option<PathBuf>,
    output: Option<PathBuf>,
    watermark: Option<PathBuf>,
    options: ThumbOptions,
}

impl RequestBuilder {
    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn watermark(mut self, path: impl Into<PathBuf>) -> Self {
        self.watermark = Some(path.into());
        self
    }

    pub fn options(mut self, options: ThumbOptions) -> Self {
        self.options = options;
        self
    }

    /// Validate paths and derive the config. No image I/O happens here.
    ///
    /// Empty paths count as missing. Without a watermark path the config's
    /// `watermark` flag is forced off.
    pub fn build(self) -> Result<PipelineRequest, ConfigError> {
        let source = non_empty(self.source).ok_or(ConfigError::MissingSource)?;
        let output = non_empty(self.output).ok_or(ConfigError::MissingOutput)?;
        let watermark = non_empty(self.watermark);
        let config = ThumbConfig::from_options(&self.options, watermark.is_some())?;

        Ok(PipelineRequest {
            source,
            output,
            watermark,
            config,
        })
    }
}

fn non_empty(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty())
}

/// One transform the pipeline applied, with the size it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Sharpen {
        amount: u32,
    },
    Resize {
        width: Option<u32>,
        height: Option<u32>,
        result: Dimensions,
    },
    Crop {
        width: u32,
        height: u32,
        result: Dimensions,
    },
    Watermark {
        mark: Dimensions,
        opacity: u32,
    },
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Sharpen { amount } => write!(f, "sharpen {amount}"),
            Step::Resize {
                width: Some(w),
                height: None,
                result,
            } => write!(f, "resize to width {w} → {result}"),
            Step::Resize {
                width: None,
                height: Some(h),
                result,
            } => write!(f, "resize to height {h} → {result}"),
            Step::Resize { result, .. } => write!(f, "resize → {result}"),
            Step::Crop {
                width,
                height,
                result,
            } => write!(f, "crop {width}x{height} → {result}"),
            Step::Watermark { mark, opacity } => write!(f, "watermark {mark} at {opacity}%"),
        }
    }
}

/// A written thumbnail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thumbnail {
    /// Where the thumbnail was written (the request's output path).
    pub path: PathBuf,
    /// Backend that produced it.
    pub backend: &'static str,
    /// Native size of the source image.
    pub source: Dimensions,
    /// Size of the written image.
    pub dimensions: Dimensions,
    pub steps: Vec<Step>,
}

/// Runs requests against a backend chosen at construction.
pub struct ThumbnailPipeline<B: ImageBackend> {
    backend: B,
}

impl<B: ImageBackend> ThumbnailPipeline<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Build a request and run it.
    pub fn create(&self, request: RequestBuilder) -> Result<Thumbnail, PipelineError> {
        let request = request.build()?;
        self.run(&request)
    }

    /// Execute the transform sequence and write the output file.
    ///
    /// Any failure aborts the run; nothing is retried and nothing partial is
    /// saved.
    pub fn run(&self, request: &PipelineRequest) -> Result<Thumbnail, PipelineError> {
        let config = &request.config;
        info!(
            source = %request.source.display(),
            output = %request.output.display(),
            backend = self.backend.name(),
            "creating thumbnail"
        );

        let mut image = self.backend.open(&request.source)?;
        let source = image.dimensions();
        let mut steps = Vec::new();

        if source.width < config.width {
            let amount = config.width - source.width;
            image.sharpen(amount)?;
            apply(&mut steps, Step::Sharpen { amount });
        }

        resize(&mut image, &mut steps, None, Some(config.height))?;

        if config.crop {
            crop(&mut image, &mut steps, config)?;
        }

        if config.watermark {
            let mark_path = request
                .watermark
                .as_deref()
                .ok_or(PipelineError::MissingWatermarkSource)?;
            self.watermark(&mut image, &mut steps, mark_path, config)?;
        }

        resize(&mut image, &mut steps, Some(config.width), None)?;

        if config.crop && image.height() > config.height {
            crop(&mut image, &mut steps, config)?;
        }

        image
            .save(&request.output, config.quality)
            .map_err(|source| PipelineError::Save {
                path: request.output.clone(),
                source,
            })?;

        let dimensions = image.dimensions();
        info!(output = %request.output.display(), %dimensions, "thumbnail written");

        Ok(Thumbnail {
            path: request.output.clone(),
            backend: self.backend.name(),
            source,
            dimensions,
            steps,
        })
    }

    /// Open the mark, fit it to the image's current width, and composite it.
    fn watermark(
        &self,
        image: &mut B::Image,
        steps: &mut Vec<Step>,
        mark_path: &Path,
        config: &ThumbConfig,
    ) -> Result<(), PipelineError> {
        let mut mark = self.backend.open(mark_path)?;
        mark.resize(Some(image.width()), None)?;
        image.watermark(&mark, Placement::default(), config.watermark_opacity)?;
        apply(
            steps,
            Step::Watermark {
                mark: mark.dimensions(),
                opacity: config.watermark_opacity.value(),
            },
        );
        Ok(())
    }
}

fn apply(steps: &mut Vec<Step>, step: Step) {
    debug!(%step, "applied");
    steps.push(step);
}

fn resize<H: ImageHandle>(
    image: &mut H,
    steps: &mut Vec<Step>,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<(), BackendError> {
    image.resize(width, height)?;
    apply(
        steps,
        Step::Resize {
            width,
            height,
            result: image.dimensions(),
        },
    );
    Ok(())
}

fn crop<H: ImageHandle>(
    image: &mut H,
    steps: &mut Vec<Step>,
    config: &ThumbConfig,
) -> Result<(), BackendError> {
    image.crop(config.width, config.height)?;
    apply(
        steps,
        Step::Crop {
            width: config.width,
            height: config.height,
            result: image.dimensions(),
        },
    );
    Ok(())
}
