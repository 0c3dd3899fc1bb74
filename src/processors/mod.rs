// reframe/src/processors/mod.rs
mod encoder;
pub mod geometry;
mod loader;
pub mod orientation;

pub use encoder::Encoder;
pub use geometry::CropPosition;
pub use loader::Loader;
