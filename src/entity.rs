// reframe/src/entity.rs
use crate::core::{EngineError, Result};
use image::{ColorType, DynamicImage};
use std::fmt;

/// Axis-aligned region in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The full-image rectangle at the origin.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        u64::from(self.x) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// The closed set of decode/encode targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
    Gif,
}

impl SourceFormat {
    pub fn from_image_format(format: image::ImageFormat) -> Result<Self> {
        match format {
            image::ImageFormat::Jpeg => Ok(SourceFormat::Jpeg),
            image::ImageFormat::Png => Ok(SourceFormat::Png),
            image::ImageFormat::Gif => Ok(SourceFormat::Gif),
            other => Err(EngineError::UnsupportedFormat(format!("{:?}", other))),
        }
    }

    pub fn to_image_format(self) -> image::ImageFormat {
        match self {
            SourceFormat::Jpeg => image::ImageFormat::Jpeg,
            SourceFormat::Png => image::ImageFormat::Png,
            SourceFormat::Gif => image::ImageFormat::Gif,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(SourceFormat::Jpeg),
            "png" => Some(SourceFormat::Png),
            "gif" => Some(SourceFormat::Gif),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            SourceFormat::Jpeg => "jpg",
            SourceFormat::Png => "png",
            SourceFormat::Gif => "gif",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            SourceFormat::Jpeg => "image/jpeg",
            SourceFormat::Png => "image/png",
            SourceFormat::Gif => "image/gif",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceFormat::Jpeg => "JPEG",
            SourceFormat::Png => "PNG",
            SourceFormat::Gif => "GIF",
        };
        f.write_str(name)
    }
}

/// A decoded raster plus the pending source/dest rectangles that describe
/// what the next encode will read and produce.
///
/// Geometry operations overwrite the rectangles wholesale; only the most
/// recent call is in effect when the entity is encoded. The pixel buffer and
/// original dimensions never change after construction (orientation
/// correction happens before the entity is built).
#[derive(Debug)]
pub struct Image {
    pixels: DynamicImage,
    format: SourceFormat,
    orig_width: u32,
    orig_height: u32,
    source_rect: Rect,
    dest_rect: Rect,
}

impl Image {
    pub(crate) fn new(pixels: DynamicImage, format: SourceFormat) -> Result<Self> {
        let width = pixels.width();
        let height = pixels.height();

        if width == 0 || height == 0 {
            return Err(EngineError::CorruptOrUnreadableImage(
                "image has zero dimensions".to_string(),
            ));
        }

        Ok(Self {
            pixels,
            format,
            orig_width: width,
            orig_height: height,
            source_rect: Rect::full(width, height),
            dest_rect: Rect::full(width, height),
        })
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    pub fn orig_width(&self) -> u32 {
        self.orig_width
    }

    pub fn orig_height(&self) -> u32 {
        self.orig_height
    }

    pub fn source_rect(&self) -> Rect {
        self.source_rect
    }

    pub fn dest_rect(&self) -> Rect {
        self.dest_rect
    }

    /// Whether the decoded buffer uses a full-color (non-palette, non-gray)
    /// pixel model.
    pub fn is_truecolor(&self) -> bool {
        matches!(
            self.pixels.color(),
            ColorType::Rgb8
                | ColorType::Rgba8
                | ColorType::Rgb16
                | ColorType::Rgba16
                | ColorType::Rgb32F
                | ColorType::Rgba32F
        )
    }

    /// Single commit point for geometry operations. Either both rectangles
    /// are replaced or, on a validation failure, neither is.
    pub(crate) fn set_rects(&mut self, source: Rect, dest: Rect) -> Result<()> {
        if !source.fits_within(self.orig_width, self.orig_height) {
            return Err(EngineError::InvalidGeometry(format!(
                "source rectangle {}x{}+{}+{} exceeds image bounds {}x{}",
                source.width, source.height, source.x, source.y, self.orig_width, self.orig_height
            )));
        }

        if dest.is_empty() {
            return Err(EngineError::InvalidGeometry(
                "destination rectangle must be non-empty".to_string(),
            ));
        }

        self.source_rect = source;
        self.dest_rect = dest;
        Ok(())
    }

    /// Restore the full-image rectangles, discarding any pending transform.
    pub fn reset(&mut self) {
        self.source_rect = Rect::full(self.orig_width, self.orig_height);
        self.dest_rect = Rect::full(self.orig_width, self.orig_height);
    }
}
