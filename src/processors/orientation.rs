// reframe/src/processors/orientation.rs
use exif::{In, Tag};
use image::DynamicImage;
use std::io::Cursor;

/// Correct freshly decoded pixel data for the EXIF Orientation tag.
///
/// Only JPEG sources carry the tag; callers skip this for PNG/GIF. A missing
/// or unreadable EXIF block leaves the buffer unchanged. For quarter-turn
/// orientations the returned image has swapped width/height, which become the
/// entity's original dimensions.
pub fn normalize(pixels: DynamicImage, raw: &[u8]) -> DynamicImage {
    match orientation_code(raw) {
        Some(code) if (2..=8).contains(&code) => {
            log::debug!("applying EXIF orientation {}", code);
            apply(pixels, code)
        }
        _ => pixels,
    }
}

/// Read the Orientation tag (0x0112) from a raw JPEG buffer, if present.
pub fn orientation_code(raw: &[u8]) -> Option<u32> {
    let exif = exif::Reader::new()
        .read_from_container(&mut Cursor::new(raw))
        .ok()?;
    let field = exif.get_field(Tag::Orientation, In::PRIMARY)?;
    field.value.get_uint(0)
}

/// Apply one of the 8 standard orientation codes: rotate first, then mirror.
///
/// Codes 5-8 are quarter turns. `rotate90` here is a clockwise quarter turn,
/// which undoes the camera's 270° counter-clockwise rotation for codes 5/6;
/// `rotate270` likewise undoes the 90° counter-clockwise rotation for 7/8.
pub(crate) fn apply(pixels: DynamicImage, code: u32) -> DynamicImage {
    let rotated = match code {
        3 | 4 => pixels.rotate180(),
        5 | 6 => pixels.rotate90(),
        7 | 8 => pixels.rotate270(),
        _ => pixels,
    };

    match code {
        2 | 4 | 5 | 7 => rotated.fliph(),
        _ => rotated,
    }
}
