// reframe/src/cli.rs
use crate::core::ResampleFilter;
use crate::entity::SourceFormat;
use crate::processors::CropPosition;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reframe", version, about = "Image geometry and re-encoding engine")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resize with an aspect-preserving strategy
    Resize {
        input: PathBuf,

        /// Target width (alone: proportional; with --height: exact size)
        #[arg(long)]
        width: Option<u32>,

        /// Target height (alone: proportional; with --width: exact size)
        #[arg(long)]
        height: Option<u32>,

        /// Scale the shorter side to this bound
        #[arg(long, conflicts_with_all = ["width", "height"])]
        short_side: Option<u32>,

        /// Scale the longer side to this bound
        #[arg(long, conflicts_with_all = ["width", "height", "short_side"])]
        long_side: Option<u32>,

        /// Fit within WIDTHxHEIGHT, e.g. 800x600
        #[arg(long, value_name = "WxH", conflicts_with_all = ["width", "height", "short_side", "long_side"])]
        fit: Option<String>,

        /// Allow the result to exceed the source dimensions
        #[arg(long)]
        allow_enlarge: bool,

        #[command(flatten)]
        encode: EncodeArgs,
    },

    /// Scale both axes by a percentage of the original size
    Scale {
        input: PathBuf,

        /// Percentage, e.g. 50 halves each axis
        percent: f64,

        #[command(flatten)]
        encode: EncodeArgs,
    },

    /// Crop to an exact size, discarding excess along one axis
    Crop {
        input: PathBuf,

        width: u32,

        height: u32,

        /// Where the crop window sits along the trimmed axis
        #[arg(long, value_enum, default_value = "center")]
        position: PositionArg,

        #[arg(long)]
        allow_enlarge: bool,

        #[command(flatten)]
        encode: EncodeArgs,
    },

    /// Crop an explicitly positioned window with no aspect correction
    FreeCrop {
        input: PathBuf,

        width: u32,

        height: u32,

        /// Horizontal offset of the window (omit both offsets to center)
        #[arg(short, long)]
        x: Option<u32>,

        /// Vertical offset of the window
        #[arg(short, long)]
        y: Option<u32>,

        #[command(flatten)]
        encode: EncodeArgs,
    },

    /// Print dimensions, format and EXIF orientation of an image
    Info { input: PathBuf },

    /// Apply one resize to every image in a directory
    Batch {
        input: PathBuf,

        output: PathBuf,

        /// Fit every image within WIDTHxHEIGHT
        #[arg(long, value_name = "WxH")]
        fit: String,

        #[arg(long)]
        recursive: bool,

        /// Worker threads (0 = rayon default)
        #[arg(long, default_value_t = 0)]
        threads: usize,

        /// Target format (defaults to each source's own format)
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Resampling filter
        #[arg(long, value_enum, default_value = "lanczos3")]
        filter: FilterArg,
    },
}

#[derive(Args)]
pub struct EncodeArgs {
    /// Output file (defaults to the input name plus a suffix)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Target format (defaults to the source format)
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// JPEG quality 1-100 (out-of-range values fall back to 90)
    #[arg(long)]
    pub quality: Option<u8>,

    /// PNG compression level 0-9 (out-of-range values fall back to 9)
    #[arg(long)]
    pub png_compression: Option<u8>,

    /// Resampling filter
    #[arg(long, value_enum, default_value = "lanczos3")]
    pub filter: FilterArg,

    /// Encode a non-truecolor source PNG with its reduced pixel model
    #[arg(long)]
    pub no_truecolor: bool,

    /// Octal permission bits to apply to the saved file, e.g. 644
    #[arg(long, value_name = "OCTAL")]
    pub chmod: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FormatArg {
    Jpeg,
    Png,
    Gif,
}

impl From<FormatArg> for SourceFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Jpeg => SourceFormat::Jpeg,
            FormatArg::Png => SourceFormat::Png,
            FormatArg::Gif => SourceFormat::Gif,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum PositionArg {
    Top,
    #[default]
    Center,
    Bottom,
    Left,
    Right,
    TopCenter,
}

impl From<PositionArg> for CropPosition {
    fn from(value: PositionArg) -> Self {
        match value {
            PositionArg::Top => CropPosition::Top,
            PositionArg::Center => CropPosition::Center,
            PositionArg::Bottom => CropPosition::Bottom,
            PositionArg::Left => CropPosition::Left,
            PositionArg::Right => CropPosition::Right,
            PositionArg::TopCenter => CropPosition::TopCenter,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum FilterArg {
    Nearest,
    Bilinear,
    Bicubic,
    #[default]
    Lanczos3,
}

impl From<FilterArg> for ResampleFilter {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::Nearest => ResampleFilter::Nearest,
            FilterArg::Bilinear => ResampleFilter::Bilinear,
            FilterArg::Bicubic => ResampleFilter::Bicubic,
            FilterArg::Lanczos3 => ResampleFilter::Lanczos3,
        }
    }
}
