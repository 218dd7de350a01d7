//! CLI output formatting.
//!
//! A run is reported as a header for the source, one indented line per
//! applied step, and a footer for the written file:
//!
//! ```text
//! Source: photo.jpg (2000x1000, rust backend)
//!     resize to height 100 → 200x100
//!     crop 100x100 → 100x100
//!     resize to width 100 → 100x100
//! Output: thumb.jpg (100x100, quality 90)
//! ```
//!
//! [`format_thumbnail`] is pure and returns lines for testability;
//! [`print_thumbnail`] writes them to stdout. `--json` output goes through
//! [`format_thumbnail_json`] instead.

use crate::pipeline::{PipelineRequest, Thumbnail};

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format a finished run as report lines.
pub fn format_thumbnail(request: &PipelineRequest, thumbnail: &Thumbnail) -> Vec<String> {
    let mut lines = vec![format!(
        "Source: {} ({}, {} backend)",
        request.source.display(),
        thumbnail.source,
        thumbnail.backend
    )];

    if let Some(mark) = request.watermark.as_ref().filter(|_| request.config.watermark) {
        lines.push(format!("{}Watermark: {}", indent(1), mark.display()));
    }

    for step in &thumbnail.steps {
        lines.push(format!("{}{}", indent(1), step));
    }

    lines.push(format!(
        "Output: {} ({}, quality {})",
        thumbnail.path.display(),
        thumbnail.dimensions,
        request.config.quality.value()
    ));
    lines
}

/// Print a finished run to stdout.
pub fn print_thumbnail(request: &PipelineRequest, thumbnail: &Thumbnail) {
    for line in format_thumbnail(request, thumbnail) {
        println!("{}", line);
    }
}

/// Render a finished run as pretty JSON.
pub fn format_thumbnail_json(thumbnail: &Thumbnail) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(thumbnail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThumbConfig;
    use crate::imaging::{Dimensions, Opacity, Quality};
    use crate::pipeline::Step;

    fn request(watermark: bool) -> PipelineRequest {
        PipelineRequest {
            source: "photo.jpg".into(),
            output: "thumb.jpg".into(),
            watermark: Some("mark.png".into()),
            config: ThumbConfig {
                width: 100,
                height: 100,
                crop: true,
                watermark,
                watermark_opacity: Opacity::new(25),
                quality: Quality::new(80),
            },
        }
    }

    fn thumbnail(steps: Vec<Step>) -> Thumbnail {
        Thumbnail {
            path: "thumb.jpg".into(),
            backend: "rust",
            source: Dimensions::new(2000, 1000),
            dimensions: Dimensions::new(100, 100),
            steps,
        }
    }

    #[test]
    fn report_lists_steps_between_source_and_output() {
        let lines = format_thumbnail(
            &request(false),
            &thumbnail(vec![
                Step::Resize {
                    width: None,
                    height: Some(100),
                    result: Dimensions::new(200, 100),
                },
                Step::Crop {
                    width: 100,
                    height: 100,
                    result: Dimensions::new(100, 100),
                },
            ]),
        );

        assert_eq!(
            lines,
            vec![
                "Source: photo.jpg (2000x1000, rust backend)",
                "    resize to height 100 → 200x100",
                "    crop 100x100 → 100x100",
                "Output: thumb.jpg (100x100, quality 80)",
            ]
        );
    }

    #[test]
    fn report_names_watermark_only_when_applied() {
        let with = format_thumbnail(&request(true), &thumbnail(vec![]));
        assert!(with.iter().any(|l| l == "    Watermark: mark.png"));

        let without = format_thumbnail(&request(false), &thumbnail(vec![]));
        assert!(!without.iter().any(|l| l.contains("Watermark")));
    }

    #[test]
    fn json_report_tags_steps() {
        let json = format_thumbnail_json(&thumbnail(vec![Step::Sharpen { amount: 7 }])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["steps"][0]["step"], "sharpen");
        assert_eq!(value["steps"][0]["amount"], 7);
        assert_eq!(value["dimensions"]["width"], 100);
        assert_eq!(value["path"], "thumb.jpg");
    }
}
