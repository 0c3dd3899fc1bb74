// reframe/src/processors/geometry.rs
//! Pure rectangle math. Every operation reads the entity's original
//! dimensions and replaces both pending rectangles in one commit; on any
//! failure the entity keeps its previous rectangles.

use crate::core::{EngineError, Result};
use crate::entity::{Image, Rect};

/// Where the crop window sits along the axis that has excess to discard.
///
/// `Top`/`Left` keep the near edge, `Bottom`/`Right` push the window to the
/// far edge, `Center` splits the excess evenly. `TopCenter` offsets by a
/// quarter of the excess, an inherited asymmetric default that is distinct
/// from true centering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropPosition {
    Top,
    #[default]
    Center,
    Bottom,
    Left,
    Right,
    TopCenter,
}

fn crop_offset(excess: f64, position: CropPosition) -> f64 {
    match position {
        CropPosition::Top | CropPosition::Left => 0.0,
        CropPosition::Bottom | CropPosition::Right => excess,
        CropPosition::Center => excess / 2.0,
        CropPosition::TopCenter => excess / 4.0,
    }
}

fn ensure_positive(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(EngineError::InvalidGeometry(
            "target dimensions must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Apply the enlargement rule: when enlargement is disallowed and either
/// requested axis exceeds the source, both axes reset to the original
/// dimensions together.
fn clamp_enlarge(image: &Image, width: u32, height: u32, allow_enlarge: bool) -> (u32, u32) {
    if !allow_enlarge && (width > image.orig_width() || height > image.orig_height()) {
        (image.orig_width(), image.orig_height())
    } else {
        (width, height)
    }
}

fn height_for_width(image: &Image, width: u32) -> u32 {
    let ratio = f64::from(width) / f64::from(image.orig_width());
    (f64::from(image.orig_height()) * ratio).round().max(1.0) as u32
}

fn width_for_height(image: &Image, height: u32) -> u32 {
    let ratio = f64::from(height) / f64::from(image.orig_height());
    (f64::from(image.orig_width()) * ratio).round().max(1.0) as u32
}

/// Base operation: full source rect mapped onto a `width` x `height`
/// destination.
pub fn resize(image: &mut Image, width: u32, height: u32, allow_enlarge: bool) -> Result<()> {
    ensure_positive(width, height)?;
    let (width, height) = clamp_enlarge(image, width, height, allow_enlarge);

    image.set_rects(
        Rect::full(image.orig_width(), image.orig_height()),
        Rect::new(0, 0, width, height),
    )
}

/// Proportional resize pinned to a target width.
pub fn resize_to_width(image: &mut Image, width: u32, allow_enlarge: bool) -> Result<()> {
    ensure_positive(width, 1)?;
    let height = height_for_width(image, width);
    resize(image, width, height, allow_enlarge)
}

/// Proportional resize pinned to a target height.
pub fn resize_to_height(image: &mut Image, height: u32, allow_enlarge: bool) -> Result<()> {
    ensure_positive(1, height)?;
    let width = width_for_height(image, height);
    resize(image, width, height, allow_enlarge)
}

/// Scale the shorter source side to `max_short`, the longer side by the same
/// ratio.
pub fn resize_to_short_side(image: &mut Image, max_short: u32, allow_enlarge: bool) -> Result<()> {
    ensure_positive(max_short, 1)?;

    if image.orig_height() < image.orig_width() {
        let long = width_for_height(image, max_short);
        resize(image, long, max_short, allow_enlarge)
    } else {
        let long = height_for_width(image, max_short);
        resize(image, max_short, long, allow_enlarge)
    }
}

/// Scale the longer source side to `max_long`, the shorter side by the same
/// ratio.
pub fn resize_to_long_side(image: &mut Image, max_long: u32, allow_enlarge: bool) -> Result<()> {
    ensure_positive(max_long, 1)?;

    if image.orig_height() > image.orig_width() {
        let short = width_for_height(image, max_long);
        resize(image, short, max_long, allow_enlarge)
    } else {
        let short = height_for_width(image, max_long);
        resize(image, max_long, short, allow_enlarge)
    }
}

/// Fit inside a `max_width` x `max_height` box, preserving aspect ratio.
///
/// A source that already fits is left untouched when enlargement is
/// disallowed. Scales by width first and falls back to height when that
/// would overflow the vertical bound.
pub fn resize_to_best_fit(
    image: &mut Image,
    max_width: u32,
    max_height: u32,
    allow_enlarge: bool,
) -> Result<()> {
    ensure_positive(max_width, max_height)?;

    if image.orig_width() <= max_width && image.orig_height() <= max_height && !allow_enlarge {
        return Ok(());
    }

    let ratio = f64::from(image.orig_height()) / f64::from(image.orig_width());
    let mut width = max_width;
    let mut height = (f64::from(width) * ratio).round() as u32;

    if height > max_height {
        height = max_height;
        width = (f64::from(height) / ratio).round() as u32;
    }

    resize(image, width.max(1), height.max(1), allow_enlarge)
}

/// Uniform scale by a percentage of the original size. Enlargement is always
/// permitted.
pub fn scale(image: &mut Image, percent: f64) -> Result<()> {
    if !percent.is_finite() || percent <= 0.0 {
        return Err(EngineError::InvalidGeometry(
            "scale percentage must be positive".to_string(),
        ));
    }

    let width = (f64::from(image.orig_width()) * percent / 100.0)
        .round()
        .max(1.0) as u32;
    let height = (f64::from(image.orig_height()) * percent / 100.0)
        .round()
        .max(1.0) as u32;

    resize(image, width, height, true)
}

/// Crop to an exact `width` x `height` window, discarding excess along the
/// axis whose aspect does not match.
///
/// The requested size is first clamped down to the source. When the target is
/// relatively taller than the source the image is resized to the target
/// height and the horizontal excess (measured in source pixels) is trimmed
/// from the source rect; the symmetric path trims vertically.
pub fn crop(
    image: &mut Image,
    width: u32,
    height: u32,
    allow_enlarge: bool,
    position: CropPosition,
) -> Result<()> {
    ensure_positive(width, height)?;

    let width = width.min(image.orig_width());
    let height = height.min(image.orig_height());

    let source_ratio = f64::from(image.orig_width()) / f64::from(image.orig_height());
    let dest_ratio = f64::from(width) / f64::from(height);

    let (source, dest) = if dest_ratio < source_ratio {
        let resized_width = width_for_height(image, height);
        let (resized_width, resized_height) =
            clamp_enlarge(image, resized_width, height, allow_enlarge);

        let excess = ((f64::from(resized_width) - f64::from(width)) / f64::from(resized_width)
            * f64::from(image.orig_width()))
        .max(0.0);

        let x = crop_offset(excess, position).round() as u32;
        let source_width =
            ((f64::from(image.orig_width()) - excess).round() as u32).min(image.orig_width() - x);

        (
            Rect::new(x, 0, source_width, image.orig_height()),
            Rect::new(0, 0, width, resized_height),
        )
    } else {
        let resized_height = height_for_width(image, width);
        let (resized_width, resized_height) =
            clamp_enlarge(image, width, resized_height, allow_enlarge);

        let excess = ((f64::from(resized_height) - f64::from(height)) / f64::from(resized_height)
            * f64::from(image.orig_height()))
        .max(0.0);

        let y = crop_offset(excess, position).round() as u32;
        let source_height =
            ((f64::from(image.orig_height()) - excess).round() as u32).min(image.orig_height() - y);

        (
            Rect::new(0, y, image.orig_width(), source_height),
            Rect::new(0, 0, resized_width, height),
        )
    };

    image.set_rects(source, dest)
}

/// Crop an explicitly positioned window with no aspect correction.
///
/// With either offset absent this falls through to a centered [`crop`]. The
/// source height clamps to the space below `y` whenever the requested *width*
/// exceeds it; callers rely on that inherited quirk, so it stays.
pub fn free_crop(
    image: &mut Image,
    width: u32,
    height: u32,
    x: Option<u32>,
    y: Option<u32>,
) -> Result<()> {
    let (x, y) = match (x, y) {
        (Some(x), Some(y)) => (x, y),
        _ => return crop(image, width, height, false, CropPosition::Center),
    };

    ensure_positive(width, height)?;

    if x >= image.orig_width() || y >= image.orig_height() {
        return Err(EngineError::InvalidGeometry(format!(
            "crop offset {}+{} lies outside the {}x{} source",
            x,
            y,
            image.orig_width(),
            image.orig_height()
        )));
    }

    let remaining_height = image.orig_height() - y;
    let source_height = if width > remaining_height {
        remaining_height
    } else {
        height.min(remaining_height)
    };

    let source = Rect::new(x, y, width.min(image.orig_width() - x), source_height);
    let dest = Rect::new(0, 0, width, height);

    image.set_rects(source, dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::SourceFormat;
    use image::DynamicImage;

    fn entity(width: u32, height: u32) -> Image {
        let pixels = DynamicImage::new_rgb8(width, height);
        Image::new(pixels, SourceFormat::Png).unwrap()
    }

    #[test]
    fn resize_to_width_keeps_ratio() {
        let mut image = entity(800, 600);
        resize_to_width(&mut image, 400, false).unwrap();
        assert_eq!(image.dest_rect(), Rect::new(0, 0, 400, 300));
        assert_eq!(image.source_rect(), Rect::full(800, 600));
    }

    #[test]
    fn resize_to_height_keeps_ratio() {
        let mut image = entity(800, 600);
        resize_to_height(&mut image, 300, false).unwrap();
        assert_eq!(image.dest_rect(), Rect::new(0, 0, 400, 300));
    }

    #[test]
    fn resize_rounds_derived_axis() {
        // 1000x333: width 500 -> height round(166.5) = 167
        let mut image = entity(1000, 333);
        resize_to_width(&mut image, 500, false).unwrap();
        assert_eq!(image.dest_rect().height, 167);
    }

    #[test]
    fn enlarge_disallowed_resets_both_axes() {
        let mut image = entity(800, 600);
        resize(&mut image, 1600, 500, false).unwrap();
        // One overflowing axis resets both, not just the offender.
        assert_eq!(image.dest_rect(), Rect::new(0, 0, 800, 600));
    }

    #[test]
    fn enlarge_allowed_exceeds_source() {
        let mut image = entity(800, 600);
        resize_to_width(&mut image, 1600, true).unwrap();
        assert_eq!(image.dest_rect(), Rect::new(0, 0, 1600, 1200));
    }

    #[test]
    fn enlarge_disallowed_never_exceeds_source() {
        for target in [601, 800, 1200, 10_000] {
            let mut image = entity(800, 600);
            resize_to_height(&mut image, target, false).unwrap();
            assert!(image.dest_rect().width <= 800);
            assert!(image.dest_rect().height <= 600);
        }
    }

    #[test]
    fn short_side_scales_landscape() {
        let mut image = entity(1000, 500);
        resize_to_short_side(&mut image, 250, false).unwrap();
        assert_eq!(image.dest_rect(), Rect::new(0, 0, 500, 250));
    }

    #[test]
    fn short_side_scales_portrait() {
        let mut image = entity(500, 1000);
        resize_to_short_side(&mut image, 250, false).unwrap();
        assert_eq!(image.dest_rect(), Rect::new(0, 0, 250, 500));
    }

    #[test]
    fn long_side_scales_landscape() {
        let mut image = entity(1000, 500);
        resize_to_long_side(&mut image, 500, false).unwrap();
        assert_eq!(image.dest_rect(), Rect::new(0, 0, 500, 250));
    }

    #[test]
    fn long_side_scales_portrait() {
        let mut image = entity(500, 1000);
        resize_to_long_side(&mut image, 500, false).unwrap();
        assert_eq!(image.dest_rect(), Rect::new(0, 0, 250, 500));
    }

    #[test]
    fn best_fit_is_noop_when_already_within_bounds() {
        let mut image = entity(300, 200);
        resize_to_best_fit(&mut image, 800, 600, false).unwrap();
        assert_eq!(image.dest_rect(), Rect::full(300, 200));
    }

    #[test]
    fn best_fit_scales_by_width_first() {
        let mut image = entity(1600, 900);
        resize_to_best_fit(&mut image, 800, 600, false).unwrap();
        assert_eq!(image.dest_rect(), Rect::new(0, 0, 800, 450));
    }

    #[test]
    fn best_fit_falls_back_to_height() {
        let mut image = entity(900, 1600);
        resize_to_best_fit(&mut image, 800, 600, false).unwrap();
        assert_eq!(image.dest_rect(), Rect::new(0, 0, 338, 600));
    }

    #[test]
    fn best_fit_never_exceeds_bounds() {
        for (w, h) in [(3000, 1000), (1000, 3000), (777, 513), (640, 640)] {
            let mut image = entity(w, h);
            resize_to_best_fit(&mut image, 500, 400, true).unwrap();
            let dest = image.dest_rect();
            assert!(dest.width <= 500 && dest.height <= 400, "{}x{}", w, h);

            let source_aspect = f64::from(w) / f64::from(h);
            let dest_aspect = f64::from(dest.width) / f64::from(dest.height);
            assert!(
                (source_aspect - dest_aspect).abs() / source_aspect < 0.01,
                "aspect drifted for {}x{}",
                w,
                h
            );
        }
    }

    #[test]
    fn scale_ignores_enlarge_restriction() {
        let mut image = entity(400, 300);
        scale(&mut image, 200.0).unwrap();
        assert_eq!(image.dest_rect(), Rect::new(0, 0, 800, 600));
    }

    #[test]
    fn scale_down() {
        let mut image = entity(400, 300);
        scale(&mut image, 50.0).unwrap();
        assert_eq!(image.dest_rect(), Rect::new(0, 0, 200, 150));
    }

    #[test]
    fn scale_rejects_non_positive_percent() {
        let mut image = entity(400, 300);
        assert!(scale(&mut image, 0.0).is_err());
        assert!(scale(&mut image, -20.0).is_err());
        assert_eq!(image.dest_rect(), Rect::full(400, 300));
    }

    #[test]
    fn crop_taller_target_takes_height_path() {
        // 1000x500 crop to 400x400: dest ratio 1.0 < source ratio 2.0.
        // Height-based resize gives 800x400; excess = 400/800 * 1000 = 500.
        let mut image = entity(1000, 500);
        crop(&mut image, 400, 400, false, CropPosition::Center).unwrap();
        assert_eq!(image.source_rect(), Rect::new(250, 0, 500, 500));
        assert_eq!(image.dest_rect(), Rect::new(0, 0, 400, 400));
    }

    #[test]
    fn crop_wider_target_takes_width_path() {
        let mut image = entity(500, 1000);
        crop(&mut image, 400, 400, false, CropPosition::Center).unwrap();
        assert_eq!(image.source_rect(), Rect::new(0, 250, 500, 500));
        assert_eq!(image.dest_rect(), Rect::new(0, 0, 400, 400));
    }

    #[test]
    fn crop_position_offsets() {
        // Excess along x is 500 source pixels.
        let cases = [
            (CropPosition::Left, 0),
            (CropPosition::Top, 0),
            (CropPosition::Center, 250),
            (CropPosition::TopCenter, 125),
            (CropPosition::Right, 500),
            (CropPosition::Bottom, 500),
        ];

        for (position, expected_x) in cases {
            let mut image = entity(1000, 500);
            crop(&mut image, 400, 400, false, position).unwrap();
            assert_eq!(image.source_rect().x, expected_x, "{:?}", position);
        }
    }

    #[test]
    fn crop_clamps_oversized_request() {
        let mut image = entity(300, 200);
        crop(&mut image, 900, 200, false, CropPosition::Center).unwrap();
        // Request clamps to 300x200, which matches the source exactly.
        assert_eq!(image.source_rect(), Rect::full(300, 200));
        assert_eq!(image.dest_rect(), Rect::new(0, 0, 300, 200));
    }

    #[test]
    fn crop_rejects_zero_dimensions() {
        let mut image = entity(300, 200);
        assert!(crop(&mut image, 0, 100, false, CropPosition::Center).is_err());
        assert_eq!(image.source_rect(), Rect::full(300, 200));
    }

    #[test]
    fn free_crop_sets_offsets_directly() {
        let mut image = entity(1000, 800);
        free_crop(&mut image, 200, 300, Some(50), Some(60)).unwrap();
        let source = image.source_rect();
        assert_eq!((source.x, source.y), (50, 60));
        assert_eq!(source.width, 200);
        assert_eq!(source.height, 300);
        assert_eq!(image.dest_rect(), Rect::new(0, 0, 200, 300));
    }

    #[test]
    fn free_crop_without_offsets_centers() {
        let mut image = entity(1000, 500);
        free_crop(&mut image, 400, 400, None, None).unwrap();
        assert_eq!(image.source_rect(), Rect::new(250, 0, 500, 500));
    }

    #[test]
    fn free_crop_width_governs_height_clamp() {
        // Requested width 700 exceeds the 600 rows below y=100, so the
        // source height clamps to 600 even though the requested height (200)
        // would fit.
        let mut image = entity(1000, 700);
        free_crop(&mut image, 700, 200, Some(0), Some(100)).unwrap();
        assert_eq!(image.source_rect().height, 600);
        assert_eq!(image.dest_rect(), Rect::new(0, 0, 700, 200));
    }

    #[test]
    fn free_crop_rejects_out_of_range_offset() {
        let mut image = entity(100, 100);
        assert!(free_crop(&mut image, 10, 10, Some(100), Some(0)).is_err());
        assert_eq!(image.source_rect(), Rect::full(100, 100));
    }

    #[test]
    fn operations_replace_rather_than_compose() {
        let mut image = entity(1000, 500);
        crop(&mut image, 400, 400, false, CropPosition::Center).unwrap();
        resize_to_width(&mut image, 100, false).unwrap();
        // The later call wins outright; no trace of the crop remains.
        assert_eq!(image.source_rect(), Rect::full(1000, 500));
        assert_eq!(image.dest_rect(), Rect::new(0, 0, 100, 50));
    }
}
