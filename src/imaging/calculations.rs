//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images. Both
//! backends route their geometry through this module, so a thumbnail has the
//! same pixel size no matter which backend produced it.

use super::params::Placement;

/// Calculate the size of an image after an aspect-preserving resize.
///
/// Exactly the given dimensions are honoured; a missing dimension follows the
/// source aspect ratio, rounded to the nearest pixel and never below 1.
///
/// # Arguments
/// * `current` - Current image dimensions (width, height)
/// * `width` - Requested width, or `None` to derive it from `height`
/// * `height` - Requested height, or `None` to derive it from `width`
///
/// # Returns
/// * `(width, height)` - Resized dimensions. With neither requested, `current`.
pub fn calculate_resize_dimensions(
    current: (u32, u32),
    width: Option<u32>,
    height: Option<u32>,
) -> (u32, u32) {
    let (cur_w, cur_h) = current;

    match (width, height) {
        (Some(w), Some(h)) => (w.max(1), h.max(1)),
        (Some(w), None) => {
            let w = w.max(1);
            let h = (cur_h as f64 * w as f64 / cur_w.max(1) as f64).round() as u32;
            (w, h.max(1))
        }
        (None, Some(h)) => {
            let h = h.max(1);
            let w = (cur_w as f64 * h as f64 / cur_h.max(1) as f64).round() as u32;
            (w.max(1), h)
        }
        (None, None) => current,
    }
}

/// A rectangle inside an image, in pixels from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Calculate a centre-anchored crop.
///
/// The requested size is clamped to the current size, so cropping never
/// enlarges the canvas. Odd leftovers go to the right/bottom edge.
pub fn calculate_center_crop(current: (u32, u32), width: u32, height: u32) -> CropRect {
    let (cur_w, cur_h) = current;
    let width = width.clamp(1, cur_w.max(1));
    let height = height.clamp(1, cur_h.max(1));

    CropRect {
        x: (cur_w - width) / 2,
        y: (cur_h - height) / 2,
        width,
        height,
    }
}

/// Calculate the top-left corner of a watermark on the main image.
///
/// - `Center` → centred, odd leftovers rounded half away from zero; a mark
///   larger than the image gets negative offsets.
/// - `Offset` → used as given; negative values are measured from the
///   right/bottom edge (`-10` puts the mark 10px inside the far edge).
pub fn calculate_placement(
    placement: Placement,
    image: (u32, u32),
    mark: (u32, u32),
) -> (i64, i64) {
    let free_w = image.0 as i64 - mark.0 as i64;
    let free_h = image.1 as i64 - mark.1 as i64;

    match placement {
        Placement::Center => (half_rounded(free_w), half_rounded(free_h)),
        Placement::Offset { x, y } => {
            let x = if x < 0 { free_w + x } else { x };
            let y = if y < 0 { free_h + y } else { y };
            (x, y)
        }
    }
}

/// `n / 2`, rounding halves away from zero.
fn half_rounded(n: i64) -> i64 {
    if n >= 0 { (n + 1) / 2 } else { -((1 - n) / 2) }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // calculate_resize_dimensions tests
    // =========================================================================

    #[test]
    fn resize_by_height_landscape() {
        // 2000x1000 to height 100 → 200x100
        assert_eq!(
            calculate_resize_dimensions((2000, 1000), None, Some(100)),
            (200, 100)
        );
    }

    #[test]
    fn resize_by_width_portrait() {
        // 600x800 to width 300 → 300x400
        assert_eq!(
            calculate_resize_dimensions((600, 800), Some(300), None),
            (300, 400)
        );
    }

    #[test]
    fn resize_upscales() {
        assert_eq!(
            calculate_resize_dimensions((50, 50), None, Some(100)),
            (100, 100)
        );
    }

    #[test]
    fn resize_rounds_to_nearest() {
        // 1000x333 to width 100 → 33.3 → 33
        assert_eq!(
            calculate_resize_dimensions((1000, 333), Some(100), None),
            (100, 33)
        );
        // 1000x335 to width 100 → 33.5 → 34
        assert_eq!(
            calculate_resize_dimensions((1000, 335), Some(100), None),
            (100, 34)
        );
    }

    #[test]
    fn resize_never_below_one_pixel() {
        assert_eq!(
            calculate_resize_dimensions((5000, 10), Some(100), None),
            (100, 1)
        );
    }

    #[test]
    fn resize_both_dimensions_is_exact() {
        assert_eq!(
            calculate_resize_dimensions((640, 480), Some(10), Some(90)),
            (10, 90)
        );
    }

    #[test]
    fn resize_without_dimensions_is_noop() {
        assert_eq!(calculate_resize_dimensions((640, 480), None, None), (640, 480));
    }

    // =========================================================================
    // calculate_center_crop tests
    // =========================================================================

    #[test]
    fn center_crop_landscape() {
        // 200x100 → 100x100, offset 50 from the left
        assert_eq!(
            calculate_center_crop((200, 100), 100, 100),
            CropRect {
                x: 50,
                y: 0,
                width: 100,
                height: 100
            }
        );
    }

    #[test]
    fn center_crop_odd_leftover() {
        // 101 wide → 100 leaves 1px, which stays on the right
        let rect = calculate_center_crop((101, 100), 100, 100);
        assert_eq!(rect.x, 0);
        assert_eq!(rect.width, 100);
    }

    #[test]
    fn center_crop_clamps_to_image() {
        // Crop larger than the image keeps the whole image
        assert_eq!(
            calculate_center_crop((80, 60), 100, 100),
            CropRect {
                x: 0,
                y: 0,
                width: 80,
                height: 60
            }
        );
    }

    #[test]
    fn center_crop_clamps_one_axis() {
        let rect = calculate_center_crop((100, 300), 200, 100);
        assert_eq!((rect.width, rect.height), (100, 100));
        assert_eq!((rect.x, rect.y), (0, 100));
    }

    // =========================================================================
    // calculate_placement tests
    // =========================================================================

    #[test]
    fn placement_center() {
        assert_eq!(
            calculate_placement(Placement::Center, (100, 100), (100, 20)),
            (0, 40)
        );
    }

    #[test]
    fn placement_center_larger_mark_goes_negative() {
        assert_eq!(
            calculate_placement(Placement::Center, (100, 50), (100, 80)),
            (0, -15)
        );
    }

    #[test]
    fn placement_center_odd_leftover_rounds_away_from_zero() {
        // 101 - 100 = 1 → 0.5 → 1;  100 - 85 = 15 → 7.5 → 8
        assert_eq!(
            calculate_placement(Placement::Center, (101, 100), (100, 85)),
            (1, 8)
        );
        // 50 - 65 = -15 → -7.5 → -8
        assert_eq!(
            calculate_placement(Placement::Center, (50, 50), (65, 50)),
            (-8, 0)
        );
    }

    #[test]
    fn placement_positive_offset_is_absolute() {
        assert_eq!(
            calculate_placement(Placement::Offset { x: 5, y: 7 }, (100, 100), (20, 20)),
            (5, 7)
        );
    }

    #[test]
    fn placement_negative_offset_from_far_edge() {
        // 100 - 20 - 10 = 70
        assert_eq!(
            calculate_placement(Placement::Offset { x: -10, y: -10 }, (100, 100), (20, 20)),
            (70, 70)
        );
    }
}
