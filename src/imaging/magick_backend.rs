//! ImageMagick backend: drives the `magick` (or legacy `convert`) CLI.
//!
//! Opening an image only measures it. Every later operation is recorded as
//! command-line arguments while the handle tracks the resulting dimensions
//! with the shared [`calculations`](super::calculations), so the pipeline can
//! branch on sizes without touching pixels. `save` renders the whole chain as
//! a single invocation:
//!
//! ```text
//! magick src.jpg[0] -unsharp 0x1.50 -filter Lanczos -resize 200x100! \
//!     -crop 100x100+50+0 +repage -quality 90 out.jpg
//! ```
//!
//! Resizes are emitted with `!` and explicit sizes, and crops with explicit
//! offsets, so ImageMagick's own rounding never disagrees with the tracked
//! dimensions.

use super::backend::{BackendError, Dimensions, ImageBackend, ImageHandle, output_extension};
use super::calculations::{calculate_center_crop, calculate_placement, calculate_resize_dimensions};
use super::params::{Opacity, Placement, Quality, Sharpening};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Environment variable naming the ImageMagick binary to use.
pub const MAGICK_BINARY_ENV: &str = "MAGICK_BINARY";

/// Programs tried, in order, when none is configured.
const CANDIDATE_PROGRAMS: &[&str] = &["magick", "convert"];

/// Extensions ImageMagick is asked to write. Anything else is rejected before
/// spawning a process.
const OUTPUT_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "avif", "gif", "bmp", "tif", "tiff",
];

/// Backend that shells out to ImageMagick.
#[derive(Debug, Clone)]
pub struct MagickBackend {
    program: PathBuf,
}

impl MagickBackend {
    /// Use a specific ImageMagick binary without probing it.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Resolve the ImageMagick binary.
    ///
    /// Order: `explicit`, then `$MAGICK_BINARY`, then `magick`, then `convert`
    /// on `PATH`. The first candidate that answers `-version` wins.
    pub fn locate(explicit: Option<&Path>) -> Result<Self, BackendError> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(path) = explicit {
            candidates.push(path.to_path_buf());
        } else if let Some(env) = std::env::var_os(MAGICK_BINARY_ENV) {
            candidates.push(PathBuf::from(env));
        } else {
            candidates.extend(CANDIDATE_PROGRAMS.iter().map(PathBuf::from));
        }

        candidates
            .iter()
            .find(|program| responds_to_version(program))
            .map(|program| {
                debug!(program = %program.display(), "using ImageMagick");
                Self::with_program(program)
            })
            .ok_or_else(|| {
                let tried: Vec<String> = candidates
                    .iter()
                    .map(|c| c.display().to_string())
                    .collect();
                BackendError::ToolNotFound(tried.join(", "))
            })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

fn responds_to_version(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// `path[0]`: read only the first frame of multi-frame inputs.
fn first_frame(path: &Path) -> OsString {
    let mut arg = path.as_os_str().to_os_string();
    arg.push("[0]");
    arg
}

/// Run the program, mapping spawn and exit failures onto [`BackendError`].
fn run(program: &Path, args: &[OsString]) -> Result<Vec<u8>, BackendError> {
    debug!(program = %program.display(), ?args, "running ImageMagick");
    let output = Command::new(program).args(args).output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            BackendError::ToolNotFound(program.display().to_string())
        } else {
            BackendError::Io(e)
        }
    })?;

    if !output.status.success() {
        return Err(BackendError::CommandFailed {
            program: program.display().to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output.stdout)
}

/// Parse the `"%w %h"` answer of an `info:` query.
fn parse_dimensions(answer: &str) -> Option<Dimensions> {
    let mut parts = answer.split_whitespace();
    let width = parts.next()?.parse().ok()?;
    let height = parts.next()?.parse().ok()?;
    Some(Dimensions::new(width, height))
}

impl ImageBackend for MagickBackend {
    type Image = MagickImage;

    fn name(&self) -> &'static str {
        "magick"
    }

    fn open(&self, path: &Path) -> Result<MagickImage, BackendError> {
        if !path.is_file() {
            return Err(BackendError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }

        let args = vec![
            first_frame(path),
            "-format".into(),
            "%w %h".into(),
            "info:".into(),
        ];
        let stdout = run(&self.program, &args)?;
        let answer = String::from_utf8_lossy(&stdout);
        let dims = parse_dimensions(&answer).ok_or_else(|| BackendError::Decode {
            path: path.to_path_buf(),
            message: format!("unexpected info: output: {:?}", answer.trim()),
        })?;

        Ok(MagickImage {
            program: self.program.clone(),
            source: path.to_path_buf(),
            dims,
            ops: Vec::new(),
        })
    }
}

/// An image as ImageMagick will see it: source, pending operations, and the
/// dimensions those operations produce.
#[derive(Debug, Clone)]
pub struct MagickImage {
    program: PathBuf,
    source: PathBuf,
    dims: Dimensions,
    ops: Vec<OsString>,
}

impl MagickImage {
    fn push<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.ops
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
    }

    /// The source read plus every recorded operation.
    fn image_args(&self) -> Vec<OsString> {
        let mut args = vec![first_frame(&self.source)];
        args.extend(self.ops.iter().cloned());
        args
    }

    /// Full argument list for writing this image to `output`.
    pub fn command_args(&self, output: &Path, quality: Quality) -> Vec<OsString> {
        let mut args = self.image_args();
        args.push("-quality".into());
        args.push(quality.value().to_string().into());
        args.push(output.as_os_str().to_os_string());
        args
    }
}

impl ImageHandle for MagickImage {
    fn dimensions(&self) -> Dimensions {
        self.dims
    }

    fn sharpen(&mut self, amount: u32) -> Result<(), BackendError> {
        let sharpening = Sharpening::from_amount(amount);
        self.push(["-unsharp".to_string(), format!("0x{:.2}", sharpening.sigma)]);
        Ok(())
    }

    fn resize(&mut self, width: Option<u32>, height: Option<u32>) -> Result<(), BackendError> {
        let current = self.dims.as_tuple();
        let (w, h) = calculate_resize_dimensions(current, width, height);
        if (w, h) != current {
            self.push(["-filter", "Lanczos", "-resize"]);
            self.push([format!("{w}x{h}!")]);
            self.dims = Dimensions::new(w, h);
        }
        Ok(())
    }

    fn crop(&mut self, width: u32, height: u32) -> Result<(), BackendError> {
        let rect = calculate_center_crop(self.dims.as_tuple(), width, height);
        self.push([
            "-crop".to_string(),
            format!("{}x{}+{}+{}", rect.width, rect.height, rect.x, rect.y),
            "+repage".to_string(),
        ]);
        self.dims = Dimensions::new(rect.width, rect.height);
        Ok(())
    }

    fn watermark(
        &mut self,
        mark: &MagickImage,
        placement: Placement,
        opacity: Opacity,
    ) -> Result<(), BackendError> {
        let (x, y) = calculate_placement(placement, self.dims.as_tuple(), mark.dims.as_tuple());

        self.push(["("]);
        self.push(mark.image_args());
        self.push(["-alpha", "set"]);
        if opacity.value() < 100 {
            self.push(["-channel", "A", "-evaluate", "multiply"]);
            self.push([format!("{:.2}", opacity.factor())]);
            self.push(["+channel"]);
        }
        self.push([")"]);
        self.push(["-geometry".to_string(), format!("{x:+}{y:+}")]);
        self.push(["-compose", "over", "-composite"]);
        Ok(())
    }

    fn save(&self, path: &Path, quality: Quality) -> Result<(), BackendError> {
        let ext = output_extension(path);
        if !OUTPUT_EXTENSIONS.contains(&ext.as_str()) {
            return Err(BackendError::UnsupportedFormat(ext));
        }
        run(&self.program, &self.command_args(path, quality))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(width: u32, height: u32) -> MagickImage {
        MagickImage {
            program: PathBuf::from("magick"),
            source: PathBuf::from("/in/src.jpg"),
            dims: Dimensions::new(width, height),
            ops: Vec::new(),
        }
    }

    fn args_of(img: &MagickImage) -> Vec<String> {
        img.command_args(Path::new("/out/thumb.jpg"), Quality::new(90))
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn parse_dimensions_answer() {
        assert_eq!(parse_dimensions("640 480"), Some(Dimensions::new(640, 480)));
        assert_eq!(parse_dimensions("640 480\n"), Some(Dimensions::new(640, 480)));
        assert_eq!(parse_dimensions("640"), None);
        assert_eq!(parse_dimensions("wide tall"), None);
    }

    #[test]
    fn untouched_image_is_plain_conversion() {
        assert_eq!(
            args_of(&image(10, 10)),
            vec!["/in/src.jpg[0]", "-quality", "90", "/out/thumb.jpg"]
        );
    }

    #[test]
    fn resize_emits_exact_geometry() {
        let mut img = image(2000, 1000);
        img.resize(None, Some(100)).unwrap();
        assert_eq!(img.dimensions(), Dimensions::new(200, 100));
        assert_eq!(
            args_of(&img)[1..5],
            ["-filter", "Lanczos", "-resize", "200x100!"]
        );
    }

    #[test]
    fn resize_to_same_size_emits_nothing() {
        let mut img = image(100, 100);
        img.resize(Some(100), None).unwrap();
        assert!(img.ops.is_empty());
    }

    #[test]
    fn crop_emits_centered_offsets() {
        let mut img = image(200, 100);
        img.crop(100, 100).unwrap();
        assert_eq!(img.dimensions(), Dimensions::new(100, 100));
        assert_eq!(args_of(&img)[1..4], ["-crop", "100x100+50+0", "+repage"]);
    }

    #[test]
    fn sharpen_emits_unsharp_sigma() {
        let mut img = image(50, 50);
        img.sharpen(50).unwrap();
        assert_eq!(args_of(&img)[1..3], ["-unsharp", "0x1.50"]);
    }

    #[test]
    fn watermark_embeds_mark_chain() {
        let mut img = image(100, 100);
        let mut mark = image(400, 80);
        mark.source = PathBuf::from("/in/mark.png");
        mark.resize(Some(100), None).unwrap();

        img.watermark(&mark, Placement::Center, Opacity::new(25))
            .unwrap();

        let args = args_of(&img);
        let expected = [
            "(",
            "/in/mark.png[0]",
            "-filter",
            "Lanczos",
            "-resize",
            "100x20!",
            "-alpha",
            "set",
            "-channel",
            "A",
            "-evaluate",
            "multiply",
            "0.25",
            "+channel",
            ")",
            "-geometry",
            "+0+40",
            "-compose",
            "over",
            "-composite",
        ];
        assert_eq!(args[1..1 + expected.len()], expected);
        // Compositing does not change the base size
        assert_eq!(img.dimensions(), Dimensions::new(100, 100));
    }

    #[test]
    fn watermark_full_opacity_skips_alpha_multiply() {
        let mut img = image(100, 100);
        let mark = image(100, 100);
        img.watermark(&mark, Placement::Center, Opacity::new(100))
            .unwrap();
        assert!(!args_of(&img).iter().any(|a| a == "multiply"));
    }

    #[test]
    fn watermark_negative_geometry() {
        let mut img = image(100, 50);
        let mark = image(100, 80);
        img.watermark(&mark, Placement::Center, Opacity::default())
            .unwrap();
        assert!(args_of(&img).iter().any(|a| a == "+0-15"));
    }

    #[test]
    fn save_rejects_unknown_extension_before_spawning() {
        let img = image(10, 10);
        let result = img.save(Path::new("/out/thumb.xyz"), Quality::default());
        assert!(matches!(result, Err(BackendError::UnsupportedFormat(ext)) if ext == "xyz"));
    }

    #[test]
    fn missing_program_is_tool_not_found() {
        let backend = MagickBackend::with_program("/nonexistent/magick-binary");
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("src.jpg");
        std::fs::write(&source, b"x").unwrap();

        let result = backend.open(&source);
        assert!(matches!(result, Err(BackendError::ToolNotFound(_))));
    }

    #[test]
    fn locate_with_bogus_explicit_program_fails() {
        let result = MagickBackend::locate(Some(Path::new("/nonexistent/magick-binary")));
        assert!(matches!(result, Err(BackendError::ToolNotFound(tried)) if tried.contains("magick-binary")));
    }

    #[test]
    fn open_missing_source_is_io_error() {
        let backend = MagickBackend::with_program("magick");
        let result = backend.open(Path::new("/nonexistent/src.jpg"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }
}
