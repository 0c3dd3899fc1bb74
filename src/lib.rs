pub mod cli;
mod core;
mod entity;
mod processors;
mod utils;

pub use crate::core::registry::{BatchRunner, BatchStats, ImageRegistry};
pub use crate::core::{EncoderConfig, EngineError, ResampleFilter, Result};
pub use entity::{Image, Rect, SourceFormat};
pub use processors::{geometry, orientation, CropPosition, Encoder, Loader};
pub use utils::{
    calculate_aspect_ratio, format_file_size, generate_output_path, parse_dimensions,
};

pub mod prelude {
    pub use crate::{
        geometry, CropPosition, Encoder, EncoderConfig, Image, ImageRegistry, Loader, Rect,
        SourceFormat,
    };
}

// Re-export commonly used types
pub use image::DynamicImage;
