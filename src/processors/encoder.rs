// reframe/src/processors/encoder.rs
use crate::core::{EncoderConfig, EngineError, Result};
use crate::entity::{Image, SourceFormat};
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{imageops, DynamicImage, ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use std::io::{Cursor, Write};
use std::path::Path;

/// Alpha values below this become fully transparent in GIF output; GIF only
/// supports a single keyed transparent color, not continuous alpha.
const GIF_ALPHA_THRESHOLD: u8 = 128;

/// Materializes an [`Image`] entity's pending rectangles into an encoded
/// buffer. This is the single place where pixel resampling happens: the
/// source rect is cropped out and mapped onto the dest rect size, then
/// composited onto a format-specific canvas.
pub struct Encoder {
    config: EncoderConfig,
}

impl Encoder {
    pub fn new(config: EncoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encode into an in-memory buffer. The target format defaults to the
    /// entity's declared format; an out-of-range `quality` falls back to the
    /// configured default for the format.
    pub fn encode(
        &self,
        image: &Image,
        format: Option<SourceFormat>,
        quality: Option<u8>,
    ) -> Result<Vec<u8>> {
        let format = format.unwrap_or_else(|| image.format());
        let dest = image.dest_rect();

        if dest.is_empty() {
            return Err(EngineError::InvalidGeometry(
                "destination rectangle is empty".to_string(),
            ));
        }

        log::debug!(
            "encoding {}x{} -> {}x{} as {} (interlace requested: {})",
            image.source_rect().width,
            image.source_rect().height,
            dest.width,
            dest.height,
            format,
            self.config.interlace,
        );

        let resampled = self.resample(image);

        let mut buffer = Cursor::new(Vec::new());
        match format {
            SourceFormat::Jpeg => self.encode_jpeg(&resampled, &mut buffer, quality)?,
            SourceFormat::Gif => self.encode_gif(&resampled, &mut buffer)?,
            SourceFormat::Png => self.encode_png(image, &resampled, &mut buffer, quality)?,
        }

        Ok(buffer.into_inner())
    }

    /// Encode and persist to `path`. Permission bits, when given, are applied
    /// after the write; this is the delegation point for the file-system
    /// collaborator.
    pub fn save(
        &self,
        image: &Image,
        path: &Path,
        format: Option<SourceFormat>,
        quality: Option<u8>,
        permissions: Option<u32>,
    ) -> Result<()> {
        let bytes = self.encode(image, format, quality)?;
        std::fs::write(path, &bytes)?;

        if let Some(mode) = permissions {
            apply_permissions(path, mode)?;
        }

        log::info!("saved {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    /// Crop the source window and resample it onto the destination size.
    fn resample(&self, image: &Image) -> DynamicImage {
        let source = image.source_rect();
        let dest = image.dest_rect();

        let window = image
            .pixels()
            .crop_imm(source.x, source.y, source.width, source.height);

        if (window.width(), window.height()) == (dest.width, dest.height) {
            return window;
        }

        window.resize_exact(dest.width, dest.height, self.config.filter.to_filter_type())
    }

    fn encode_jpeg<W: Write>(
        &self,
        resampled: &DynamicImage,
        writer: W,
        quality: Option<u8>,
    ) -> Result<()> {
        let quality = match quality {
            Some(q) if q > 0 && q <= 100 => q,
            _ => self.config.jpeg_quality,
        };

        // Opaque truecolor canvas filled white; any alpha in the source is
        // blended away.
        let mut canvas = RgbaImage::from_pixel(
            resampled.width(),
            resampled.height(),
            Rgba([255, 255, 255, 255]),
        );
        imageops::overlay(&mut canvas, &resampled.to_rgba8(), 0, 0);
        let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();

        let encoder = JpegEncoder::new_with_quality(writer, quality);
        encoder.write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )?;
        Ok(())
    }

    fn encode_gif<W: Write>(&self, resampled: &DynamicImage, writer: W) -> Result<()> {
        let mut rgba = resampled.to_rgba8();
        for pixel in rgba.pixels_mut() {
            pixel[3] = if pixel[3] < GIF_ALPHA_THRESHOLD { 0 } else { 255 };
        }

        let width = rgba.width();
        let height = rgba.height();
        let mut encoder = GifEncoder::new(writer);
        encoder.encode(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)?;
        Ok(())
    }

    fn encode_png<W: Write>(
        &self,
        image: &Image,
        resampled: &DynamicImage,
        writer: W,
        quality: Option<u8>,
    ) -> Result<()> {
        let level = match quality {
            Some(q) if q <= 9 => q,
            _ => self.config.png_compression,
        };

        let encoder =
            PngEncoder::new_with_quality(writer, compression_for_level(level), PngFilter::Adaptive);

        // Alpha is preserved unblended. A non-truecolor source keeps its
        // reduced grayscale representation unless truecolor is preferred.
        if self.config.prefer_truecolor || image.is_truecolor() {
            let rgba = resampled.to_rgba8();
            encoder.write_image(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                ExtendedColorType::Rgba8,
            )?;
        } else {
            let la = resampled.to_luma_alpha8();
            encoder.write_image(
                la.as_raw(),
                la.width(),
                la.height(),
                ExtendedColorType::La8,
            )?;
        }
        Ok(())
    }
}

/// Map the 0-9 compression scale onto the png crate's coarser presets.
fn compression_for_level(level: u8) -> CompressionType {
    match level {
        0..=2 => CompressionType::Fast,
        3..=7 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

#[cfg(unix)]
fn apply_permissions(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn apply_permissions(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Rect;
    use crate::processors::geometry;
    use image::GenericImageView;

    fn entity_from(pixels: DynamicImage, format: SourceFormat) -> Image {
        Image::new(pixels, format).unwrap()
    }

    fn encoder() -> Encoder {
        Encoder::new(EncoderConfig::default()).unwrap()
    }

    #[test]
    fn resample_maps_source_rect_onto_dest() {
        // Left half red, right half blue; cropping the right half and
        // shrinking it must come out all blue.
        let mut img = RgbaImage::new(4, 2);
        for (x, _, pixel) in img.enumerate_pixels_mut() {
            *pixel = if x < 2 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            };
        }
        let mut image = entity_from(DynamicImage::ImageRgba8(img), SourceFormat::Png);
        image
            .set_rects(Rect::new(2, 0, 2, 2), Rect::new(0, 0, 1, 1))
            .unwrap();

        let out = encoder().resample(&image);
        assert_eq!(out.dimensions(), (1, 1));
        let pixel = out.to_rgba8().get_pixel(0, 0).0;
        assert!(pixel[2] > 200 && pixel[0] < 50, "expected blue, got {:?}", pixel);
    }

    #[test]
    fn jpeg_blends_transparency_onto_white() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        let image = entity_from(DynamicImage::ImageRgba8(img), SourceFormat::Png);

        let bytes = encoder().encode(&image, Some(SourceFormat::Jpeg), None).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        let pixel = decoded.get_pixel(1, 1).0;
        assert!(pixel.iter().all(|&c| c > 240), "expected white, got {:?}", pixel);
    }

    #[test]
    fn png_keeps_alpha_channel() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 0]));
        let image = entity_from(DynamicImage::ImageRgba8(img), SourceFormat::Png);

        let bytes = encoder().encode(&image, None, Some(5)).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn gif_snaps_alpha_to_binary() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([200, 10, 10, 255]));
        img.put_pixel(1, 0, Rgba([200, 10, 10, 40]));
        let image = entity_from(DynamicImage::ImageRgba8(img), SourceFormat::Gif);

        let bytes = encoder().encode(&image, None, None).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0[3], 255);
        assert_eq!(decoded.get_pixel(1, 0).0[3], 0);
    }

    #[test]
    fn encode_defaults_to_source_format() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]));
        let image = entity_from(DynamicImage::ImageRgba8(img), SourceFormat::Png);

        let bytes = encoder().encode(&image, None, None).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Png);
    }

    #[test]
    fn cross_format_encode() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]));
        let image = entity_from(DynamicImage::ImageRgba8(img), SourceFormat::Jpeg);

        let bytes = encoder().encode(&image, Some(SourceFormat::Gif), None).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Gif);
    }

    #[test]
    fn out_of_range_jpeg_quality_falls_back() {
        // Quality 0 is outside (0, 100], so the configured default applies
        // instead of an error.
        let img = RgbaImage::from_pixel(8, 8, Rgba([128, 64, 32, 255]));
        let image = entity_from(DynamicImage::ImageRgba8(img), SourceFormat::Jpeg);

        let bytes = encoder().encode(&image, None, Some(0)).unwrap();
        assert!(image::load_from_memory(&bytes).is_ok());
    }

    #[test]
    fn geometry_then_encode_produces_dest_size() {
        let img = RgbaImage::from_pixel(800, 600, Rgba([100, 150, 200, 255]));
        let mut image = entity_from(DynamicImage::ImageRgba8(img), SourceFormat::Jpeg);
        geometry::resize_to_height(&mut image, 300, false).unwrap();

        let bytes = encoder().encode(&image, Some(SourceFormat::Png), Some(5)).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (400, 300));
        assert!(matches!(
            decoded.color(),
            image::ColorType::Rgba8 | image::ColorType::Rgb8
        ));
    }

    #[test]
    fn compression_level_mapping() {
        assert!(matches!(compression_for_level(0), CompressionType::Fast));
        assert!(matches!(compression_for_level(5), CompressionType::Default));
        assert!(matches!(compression_for_level(9), CompressionType::Best));
    }
}
