// reframe/src/core/mod.rs
use std::path::PathBuf;
use thiserror::Error;

pub mod registry;

/// Resampling filter used for the single source-to-destination copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleFilter {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl ResampleFilter {
    pub(crate) fn to_filter_type(self) -> image::imageops::FilterType {
        match self {
            ResampleFilter::Nearest => image::imageops::FilterType::Nearest,
            ResampleFilter::Bilinear => image::imageops::FilterType::Triangle,
            ResampleFilter::Bicubic => image::imageops::FilterType::CatmullRom,
            ResampleFilter::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Immutable encode-time settings. Built once and handed to the
/// [`Encoder`](crate::Encoder); per-call quality overrides that fall outside
/// the valid range fall back to the values here.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// JPEG quality in (0, 100].
    pub jpeg_quality: u8,
    /// PNG compression level in [0, 9].
    pub png_compression: u8,
    /// Prefer a truecolor canvas for PNG output even when the source is not.
    pub prefer_truecolor: bool,
    /// Requested interlaced output. The pure-Rust encoders currently emit
    /// non-interlaced data, so the flag is recorded but not applied.
    pub interlace: bool,
    pub filter: ResampleFilter,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            png_compression: 9,
            prefer_truecolor: true,
            interlace: true,
            filter: ResampleFilter::Lanczos3,
        }
    }
}

impl EncoderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(EngineError::InvalidParameter(
                "JPEG quality must be between 1 and 100".to_string(),
            ));
        }

        if self.png_compression > 9 {
            return Err(EngineError::InvalidParameter(
                "PNG compression must be between 0 and 9".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("input is empty or missing")]
    EmptyOrMissingInput,

    #[error("file does not exist or could not be opened: {0}")]
    UnreadableFile(PathBuf),

    #[error("input is not an image")]
    UnsupportedMimeCategory,

    #[error("could not read image: {0}")]
    CorruptOrUnreadableImage(String),

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("could not decode image: {0}")]
    DecodeFailure(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("encode error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
