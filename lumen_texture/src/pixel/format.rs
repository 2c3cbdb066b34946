/// Pixel formats and conversion from the generic RGBA color representation

use glam::Vec4;

/// Generic RGBA color (linear floats, 0.0..1.0 for normalized formats)
pub type Color = Vec4;

/// Native pixel storage format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum PixelFormat {
    R8_UNORM,
    R8G8_UNORM,
    R8G8B8A8_UNORM,
    B8G8R8A8_UNORM,
    R32_SFLOAT,
    R32G32_SFLOAT,
    R32G32B32A32_SFLOAT,
    D32_FLOAT,
}

impl PixelFormat {
    /// Size of one texel in bytes
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::R8_UNORM => 1,
            PixelFormat::R8G8_UNORM => 2,
            PixelFormat::R8G8B8A8_UNORM | PixelFormat::B8G8R8A8_UNORM => 4,
            PixelFormat::R32_SFLOAT | PixelFormat::D32_FLOAT => 4,
            PixelFormat::R32G32_SFLOAT => 8,
            PixelFormat::R32G32B32A32_SFLOAT => 16,
        }
    }

    /// Number of stored channels
    pub fn channel_count(&self) -> u32 {
        match self {
            PixelFormat::R8_UNORM | PixelFormat::R32_SFLOAT | PixelFormat::D32_FLOAT => 1,
            PixelFormat::R8G8_UNORM | PixelFormat::R32G32_SFLOAT => 2,
            PixelFormat::R8G8B8A8_UNORM
            | PixelFormat::B8G8R8A8_UNORM
            | PixelFormat::R32G32B32A32_SFLOAT => 4,
        }
    }

    /// Depth formats can only back depth/stencil textures
    pub fn is_depth(&self) -> bool {
        matches!(self, PixelFormat::D32_FLOAT)
    }

    /// Float formats store channels bit-exactly
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            PixelFormat::R32_SFLOAT
                | PixelFormat::R32G32_SFLOAT
                | PixelFormat::R32G32B32A32_SFLOAT
                | PixelFormat::D32_FLOAT
        )
    }

    /// Encode one color into `out`, which must be exactly `bytes_per_pixel()` long.
    ///
    /// Normalized channels are clamped to 0..1 and rounded; float channels are
    /// stored as-is. Channels the format does not store are dropped.
    pub fn encode(&self, color: Color, out: &mut [u8]) {
        debug_assert_eq!(out.len(), self.bytes_per_pixel() as usize);
        match self {
            PixelFormat::R8_UNORM => {
                out[0] = unorm8(color.x);
            }
            PixelFormat::R8G8_UNORM => {
                out[0] = unorm8(color.x);
                out[1] = unorm8(color.y);
            }
            PixelFormat::R8G8B8A8_UNORM => {
                out.copy_from_slice(&[unorm8(color.x), unorm8(color.y), unorm8(color.z), unorm8(color.w)]);
            }
            PixelFormat::B8G8R8A8_UNORM => {
                out.copy_from_slice(&[unorm8(color.z), unorm8(color.y), unorm8(color.x), unorm8(color.w)]);
            }
            PixelFormat::R32_SFLOAT | PixelFormat::D32_FLOAT => {
                out.copy_from_slice(bytemuck::bytes_of(&color.x));
            }
            PixelFormat::R32G32_SFLOAT => {
                out.copy_from_slice(bytemuck::bytes_of(&color.truncate().truncate()));
            }
            PixelFormat::R32G32B32A32_SFLOAT => {
                out.copy_from_slice(bytemuck::bytes_of(&color));
            }
        }
    }

    /// Decode one texel. Missing color channels read as 0, missing alpha as 1.
    pub fn decode(&self, texel: &[u8]) -> Color {
        debug_assert_eq!(texel.len(), self.bytes_per_pixel() as usize);
        match self {
            PixelFormat::R8_UNORM => Vec4::new(from_unorm8(texel[0]), 0.0, 0.0, 1.0),
            PixelFormat::R8G8_UNORM => Vec4::new(from_unorm8(texel[0]), from_unorm8(texel[1]), 0.0, 1.0),
            PixelFormat::R8G8B8A8_UNORM => Vec4::new(
                from_unorm8(texel[0]),
                from_unorm8(texel[1]),
                from_unorm8(texel[2]),
                from_unorm8(texel[3]),
            ),
            PixelFormat::B8G8R8A8_UNORM => Vec4::new(
                from_unorm8(texel[2]),
                from_unorm8(texel[1]),
                from_unorm8(texel[0]),
                from_unorm8(texel[3]),
            ),
            PixelFormat::R32_SFLOAT | PixelFormat::D32_FLOAT => {
                Vec4::new(bytemuck::pod_read_unaligned::<f32>(texel), 0.0, 0.0, 1.0)
            }
            PixelFormat::R32G32_SFLOAT => {
                let rg = bytemuck::pod_read_unaligned::<glam::Vec2>(texel);
                Vec4::new(rg.x, rg.y, 0.0, 1.0)
            }
            PixelFormat::R32G32B32A32_SFLOAT => bytemuck::pod_read_unaligned::<Vec4>(texel),
        }
    }

    /// Encode a whole color array into tightly packed bytes
    pub fn encode_all(&self, colors: &[Color]) -> Vec<u8> {
        let bpp = self.bytes_per_pixel() as usize;
        let mut data = vec![0u8; colors.len() * bpp];
        for (color, out) in colors.iter().zip(data.chunks_exact_mut(bpp)) {
            self.encode(*color, out);
        }
        data
    }

    /// Decode tightly packed bytes into colors (trailing partial texels are ignored)
    pub fn decode_all(&self, data: &[u8]) -> Vec<Color> {
        data.chunks_exact(self.bytes_per_pixel() as usize)
            .map(|texel| self.decode(texel))
            .collect()
    }
}

fn unorm8(value: f32) -> u8 {
    // NaN clamps to 0 through the saturating cast
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn from_unorm8(value: u8) -> f32 {
    value as f32 / 255.0
}
