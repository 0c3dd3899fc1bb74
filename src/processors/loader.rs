// reframe/src/processors/loader.rs
use crate::core::{EngineError, Result};
use crate::entity::{Image, SourceFormat};
use crate::processors::orientation;
use image::ImageReader;
use std::io::Cursor;
use std::path::Path;

/// Decodes byte buffers or files into [`Image`] entities.
///
/// Validation order: empty input, unreadable path, MIME sniff, format
/// whitelist, dimension probe, then the full decode. JPEG sources get their
/// EXIF orientation normalized before the entity records its original
/// dimensions.
#[derive(Clone)]
pub struct Loader {
    max_dimensions: Option<(u32, u32)>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            max_dimensions: Some((100_000, 100_000)),
        }
    }

    pub fn with_max_dimensions(mut self, width: u32, height: u32) -> Self {
        self.max_dimensions = Some((width, height));
        self
    }

    pub fn load_path(&self, path: &Path) -> Result<Image> {
        if path.as_os_str().is_empty() {
            return Err(EngineError::EmptyOrMissingInput);
        }

        if !path.is_file() {
            return Err(EngineError::UnreadableFile(path.to_path_buf()));
        }

        log::debug!("loading image from {}", path.display());
        let data = std::fs::read(path)?;
        self.load_bytes(&data)
    }

    pub fn load_bytes(&self, data: &[u8]) -> Result<Image> {
        if data.is_empty() {
            return Err(EngineError::EmptyOrMissingInput);
        }

        let sniffed =
            image::guess_format(data).map_err(|_| EngineError::UnsupportedMimeCategory)?;
        let format = SourceFormat::from_image_format(sniffed)?;

        // Probe dimensions from the header before committing to a full decode.
        let (width, height) = ImageReader::with_format(Cursor::new(data), sniffed)
            .into_dimensions()
            .map_err(|e| EngineError::CorruptOrUnreadableImage(e.to_string()))?;

        if width == 0 || height == 0 {
            return Err(EngineError::CorruptOrUnreadableImage(
                "image reports zero dimensions".to_string(),
            ));
        }

        if let Some((max_w, max_h)) = self.max_dimensions {
            if width > max_w || height > max_h {
                return Err(EngineError::InvalidGeometry(format!(
                    "image dimensions {}x{} exceed maximum {}x{}",
                    width, height, max_w, max_h
                )));
            }
        }

        let decoded = image::load_from_memory_with_format(data, sniffed)
            .map_err(|e| EngineError::DecodeFailure(e.to_string()))?;

        let decoded = match format {
            SourceFormat::Jpeg => orientation::normalize(decoded, data),
            _ => decoded,
        };

        log::info!(
            "decoded {} image: {}x{} pixels",
            format,
            decoded.width(),
            decoded.height()
        );

        Image::new(decoded, format)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
