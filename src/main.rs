use clap::{Parser, Subcommand, ValueEnum};
use simple_thumb::config::{self, ThumbOptions};
use simple_thumb::imaging::{ImageBackend, MagickBackend, RustBackend};
use simple_thumb::output;
use simple_thumb::pipeline::{PipelineRequest, ThumbnailPipeline};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "simple-thumb")]
#[command(about = "Create a resized, cropped, and watermarked thumbnail")]
#[command(long_about = "\
Create a resized, cropped, and watermarked thumbnail

Options are read from thumb.toml in the working directory (or --config),
then overridden by flags. width and height are required.

Pipeline (each step only when it applies):

  sharpen      source narrower than --width, by the pixel deficit
  resize       to --height, keeping aspect ratio
  crop         to --width x --height, centred          (--crop / --no-crop)
  watermark    scaled to the current width, centred    (--watermark)
  resize       to --width, keeping aspect ratio
  crop         again, if the height still overflows    (--crop)

Run 'simple-thumb gen-config' to print a documented thumb.toml.")]
#[command(version)]
struct Cli {
    /// Log every pipeline step (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create one thumbnail
    Create(CreateArgs),
    /// Print a stock thumb.toml with all options documented
    GenConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendKind {
    /// In-process decoding and encoding with the `image` crate
    Rust,
    /// Shell out to ImageMagick (`magick` or `convert`)
    Magick,
}

#[derive(clap::Args)]
struct CreateArgs {
    /// Source image
    #[arg(long)]
    source: PathBuf,

    /// Output file; the extension picks the format
    #[arg(long)]
    output: PathBuf,

    /// Watermark image; giving one enables watermarking
    #[arg(long)]
    watermark: Option<PathBuf>,

    /// Options file (default: ./thumb.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Target height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Crop to exactly width x height
    #[arg(long, conflicts_with = "no_crop")]
    crop: bool,

    /// Do not crop, even if the config file says `crop = true`
    #[arg(long)]
    no_crop: bool,

    /// Watermark opacity (0-100)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
    watermark_opacity: Option<u32>,

    /// Encoder quality (0-100)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
    quality: Option<u32>,

    /// Imaging backend
    #[arg(long, value_enum, default_value_t = BackendKind::Rust)]
    backend: BackendKind,

    /// ImageMagick binary for --backend magick (default: $MAGICK_BINARY, magick, convert)
    #[arg(long)]
    magick_binary: Option<PathBuf>,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,
}

impl CreateArgs {
    /// Flags as an option layer. Unset flags leave file values alone.
    fn option_overrides(&self) -> ThumbOptions {
        ThumbOptions {
            width: self.width,
            height: self.height,
            crop: match (self.crop, self.no_crop) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
            watermark: self.watermark.as_ref().map(|_| true),
            watermark_opacity: self.watermark_opacity,
            quality: self.quality,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Create(args) => {
            let base = match &args.config {
                Some(path) => config::load_options(path)?,
                None => config::load_default_options(Path::new("."))?.unwrap_or_default(),
            };
            let options = base.merge(args.option_overrides());

            let mut builder = PipelineRequest::builder()
                .source(&args.source)
                .output(&args.output)
                .options(options);
            if let Some(mark) = &args.watermark {
                builder = builder.watermark(mark);
            }
            let request = builder.build()?;

            match args.backend {
                BackendKind::Rust => create(RustBackend::new(), &request, args.json)?,
                BackendKind::Magick => {
                    let backend = MagickBackend::locate(args.magick_binary.as_deref())?;
                    create(backend, &request, args.json)?
                }
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Run one request on the chosen backend and report it.
fn create<B: ImageBackend>(
    backend: B,
    request: &PipelineRequest,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let thumbnail = ThumbnailPipeline::new(backend).run(request)?;
    if json {
        println!("{}", output::format_thumbnail_json(&thumbnail)?);
    } else {
        output::print_thumbnail(request, &thumbnail);
    }
    Ok(())
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise warnings only, or debug with `--verbose`.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("simple_thumb={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_args(extra: &[&str]) -> CreateArgs {
        let mut argv = vec![
            "simple-thumb",
            "create",
            "--source",
            "in.jpg",
            "--output",
            "out.jpg",
        ];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Create(args) => args,
            Command::GenConfig => panic!("expected create"),
        }
    }

    #[test]
    fn crop_flags_override_file_either_way() {
        let file = ThumbOptions {
            width: Some(100),
            height: Some(100),
            crop: Some(true),
            ..ThumbOptions::default()
        };

        let off = file.clone().merge(create_args(&["--no-crop"]).option_overrides());
        assert_eq!(off.crop, Some(false));

        let kept = file.clone().merge(create_args(&[]).option_overrides());
        assert_eq!(kept.crop, Some(true));

        let on = ThumbOptions::default().merge(create_args(&["--crop"]).option_overrides());
        assert_eq!(on.crop, Some(true));
    }

    #[test]
    fn crop_and_no_crop_conflict() {
        let result = Cli::try_parse_from([
            "simple-thumb",
            "create",
            "--source",
            "in.jpg",
            "--output",
            "out.jpg",
            "--crop",
            "--no-crop",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn watermark_path_enables_watermarking() {
        let args = create_args(&["--watermark", "mark.png"]);
        assert_eq!(args.option_overrides().watermark, Some(true));
        assert_eq!(create_args(&[]).option_overrides().watermark, None);
    }
}
