//! # Simple Thumb
//!
//! Turns one source image into one thumbnail: resized, optionally cropped to
//! an exact size, optionally watermarked, and encoded at a chosen quality.
//!
//! ```no_run
//! use simple_thumb::config::ThumbOptions;
//! use simple_thumb::imaging::RustBackend;
//! use simple_thumb::pipeline::{PipelineRequest, ThumbnailPipeline};
//!
//! let request = PipelineRequest::builder()
//!     .source("photo.jpg")
//!     .output("thumb.jpg")
//!     .watermark("mark.png")
//!     .options(ThumbOptions {
//!         width: Some(100),
//!         height: Some(100),
//!         crop: Some(true),
//!         watermark: Some(true),
//!         watermark_opacity: Some(25),
//!         ..ThumbOptions::default()
//!     })
//!     .build()?;
//!
//! let thumb = ThumbnailPipeline::new(RustBackend::new()).run(&request)?;
//! assert_eq!(thumb.path, request.output);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | The transform sequence, request validation, run report |
//! | [`config`] | Raw options, validated `ThumbConfig`, `thumb.toml` loading |
//! | [`imaging`] | Backend traits plus the `image`-crate and ImageMagick backends |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## Backends Are Types, Not Flags
//!
//! [`ThumbnailPipeline`](pipeline::ThumbnailPipeline) is generic over
//! [`ImageBackend`](imaging::ImageBackend). The backend is picked once when
//! the pipeline is built, and the pipeline code never asks which one it has.
//! Tests use a recording mock through the same trait.
//!
//! ## No Shared State
//!
//! There is no global pipeline instance and no cached config. Each request is
//! built, validated, and run on its own; two runs with the same inputs produce
//! the same geometry.
//!
//! ## Fixed Geometry Policy
//!
//! Crops are centre-anchored and watermarks centred by default. All size math
//! lives in one place (`imaging::calculations`), so both backends agree on
//! every intermediate dimension the pipeline branches on.

pub mod config;
pub mod imaging;
pub mod output;
pub mod pipeline;
