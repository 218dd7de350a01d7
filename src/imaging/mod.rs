//! Image processing backends.
//!
//! | Backend | Runs | Selected with |
//! |---|---|---|
//! | [`RustBackend`] | in process, `image` crate | `--backend rust` (default) |
//! | [`MagickBackend`] | `magick` / `convert` CLI | `--backend magick` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Value types for quality, opacity, sharpening, placement
//! - **Backend**: [`ImageBackend`] and [`ImageHandle`] traits, shared by both backends
//! - **Backends**: [`RustBackend`] and [`MagickBackend`]

pub mod backend;
mod calculations;
pub mod magick_backend;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, ImageHandle};
pub use magick_backend::MagickBackend;
pub use params::{Opacity, Placement, Quality, Sharpening};
pub use rust_backend::RustBackend;
