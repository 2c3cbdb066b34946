//! Pixel formats, color conversion and surfaces

pub mod format;
pub mod surface;

pub use format::{Color, PixelFormat};
pub use surface::Surface;

#[cfg(test)]
#[path = "pixel_tests.rs"]
mod tests;
