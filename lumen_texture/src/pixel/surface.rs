/// Surface: pixel storage for one (mip level, face) pair
///
/// Texels are tightly packed in row-major order; depth slices follow each
/// other. The byte length always equals `width * height * depth * bpp`.

use crate::error::Result;
use crate::engine_bail;
use super::format::{Color, PixelFormat};

/// Pixel storage for one subresource of a texture
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    depth: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Surface {
    /// Create a zero-filled surface
    pub fn new_zeroed(width: u32, height: u32, depth: u32, format: PixelFormat) -> Self {
        let len = Self::byte_len(width, height, depth, format);
        Self {
            width,
            height,
            depth,
            format,
            data: vec![0u8; len],
        }
    }

    /// Wrap pre-formatted bytes
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if `data` is not exactly `width * height * depth * bpp` bytes.
    pub fn from_bytes(
        width: u32,
        height: u32,
        depth: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self> {
        let expected = Self::byte_len(width, height, depth, format);
        if data.len() != expected {
            engine_bail!("lumen::Surface", ShapeMismatch,
                "{}x{}x{} {:?} surface needs {} bytes, got {}",
                width, height, depth, format, expected, data.len());
        }
        Ok(Self { width, height, depth, format, data })
    }

    /// Encode a flat color array into a new surface
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if `colors.len() != width * height * depth`.
    pub fn from_colors(
        width: u32,
        height: u32,
        depth: u32,
        format: PixelFormat,
        colors: &[Color],
    ) -> Result<Self> {
        let expected = width as usize * height as usize * depth as usize;
        if colors.len() != expected {
            engine_bail!("lumen::Surface", ShapeMismatch,
                "{}x{}x{} surface needs {} colors, got {}",
                width, height, depth, expected, colors.len());
        }
        Ok(Self {
            width,
            height,
            depth,
            format,
            data: format.encode_all(colors),
        })
    }

    fn byte_len(width: u32, height: u32, depth: u32, format: PixelFormat) -> usize {
        width as usize * height as usize * depth as usize * format.bytes_per_pixel() as usize
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Raw texel bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the surface and return its bytes
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Number of texels (width * height * depth)
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize * self.depth as usize
    }

    /// Bytes between two consecutive rows
    pub fn row_pitch(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel() as usize
    }

    /// Bytes between two consecutive depth slices
    pub fn slice_pitch(&self) -> usize {
        self.row_pitch() * self.height as usize
    }

    /// True when both surfaces cover the same width, height and depth
    pub fn same_extent(&self, other: &Surface) -> bool {
        self.extent() == other.extent()
    }

    /// (width, height, depth)
    pub fn extent(&self) -> (u32, u32, u32) {
        (self.width, self.height, self.depth)
    }

    fn texel_offset(&self, x: u32, y: u32, z: u32) -> Result<usize> {
        if x >= self.width || y >= self.height || z >= self.depth {
            engine_bail!("lumen::Surface", RangeError,
                "texel ({}, {}, {}) outside {}x{}x{} surface",
                x, y, z, self.width, self.height, self.depth);
        }
        let bpp = self.format.bytes_per_pixel() as usize;
        Ok(z as usize * self.slice_pitch() + y as usize * self.row_pitch() + x as usize * bpp)
    }

    /// Decode the texel at (x, y, z)
    pub fn color_at(&self, x: u32, y: u32, z: u32) -> Result<Color> {
        let offset = self.texel_offset(x, y, z)?;
        let bpp = self.format.bytes_per_pixel() as usize;
        Ok(self.format.decode(&self.data[offset..offset + bpp]))
    }

    /// Encode `color` into the texel at (x, y, z)
    pub fn set_color_at(&mut self, x: u32, y: u32, z: u32, color: Color) -> Result<()> {
        let offset = self.texel_offset(x, y, z)?;
        let bpp = self.format.bytes_per_pixel() as usize;
        self.format.encode(color, &mut self.data[offset..offset + bpp]);
        Ok(())
    }

    /// Decode every texel, in storage order
    pub fn colors(&self) -> Vec<Color> {
        self.format.decode_all(&self.data)
    }

    /// Re-encode into another format. Same-format conversion is a plain copy.
    pub fn convert(&self, format: PixelFormat) -> Surface {
        if format == self.format {
            return self.clone();
        }
        Surface {
            width: self.width,
            height: self.height,
            depth: self.depth,
            format,
            data: format.encode_all(&self.colors()),
        }
    }
}
