/// RendererTexture trait and texture shape types

use bitflags::bitflags;
use std::fmt;
use crate::error::Result;
use crate::pixel::PixelFormat;

// ===== TEXTURE KIND =====

/// Texture kind
///
/// Face count and the axes a kind requires are pure functions of the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Tex1D,
    Tex2D,
    Tex3D,
    /// Six square faces
    Cube,
    /// 2D texture array
    Array { layers: u32 },
    /// Array of cubes (6 faces per cube)
    CubeArray { cubes: u32 },
}

impl TextureKind {
    /// Number of faces (2D images per mip level)
    pub fn face_count(&self) -> u32 {
        match self {
            TextureKind::Tex1D | TextureKind::Tex2D | TextureKind::Tex3D => 1,
            TextureKind::Cube => 6,
            TextureKind::Array { layers } => *layers,
            TextureKind::CubeArray { cubes } => cubes.saturating_mul(6),
        }
    }

    /// Whether the height axis carries data
    pub fn uses_height(&self) -> bool {
        !matches!(self, TextureKind::Tex1D)
    }

    /// Whether the depth axis carries data
    pub fn uses_depth(&self) -> bool {
        matches!(self, TextureKind::Tex3D)
    }

    /// Cube kinds require square faces
    pub fn is_cube(&self) -> bool {
        matches!(self, TextureKind::Cube | TextureKind::CubeArray { .. })
    }

    /// Kinds that may be multisampled
    pub fn supports_multisampling(&self) -> bool {
        matches!(self, TextureKind::Tex2D | TextureKind::Array { .. })
    }
}

// ===== TEXTURE USAGE =====

bitflags! {
    /// Texture usage flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Can be sampled in shaders
        const SAMPLED = 1 << 0;
        /// Updated frequently from the CPU
        const DYNAMIC = 1 << 1;
        /// Can be bound as a color render target
        const RENDER_TARGET = 1 << 2;
        /// Can be bound as a depth/stencil attachment
        const DEPTH_STENCIL = 1 << 3;
        /// Can be bound for random-access load/store
        const LOAD_STORE = 1 << 4;
        /// A system-memory copy of every surface is kept for synchronous reads
        const CPU_CACHED = 1 << 5;
    }
}

impl Default for TextureUsage {
    fn default() -> Self {
        TextureUsage::SAMPLED
    }
}

// ===== SUBRESOURCE =====

/// One (face, mip level) slot of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Subresource {
    pub face: u32,
    pub mip: u32,
}

impl Subresource {
    pub fn new(face: u32, mip: u32) -> Self {
        Self { face, mip }
    }
}

impl fmt::Display for Subresource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "face {} mip {}", self.face, self.mip)
    }
}

// ===== TEXTURE DESC =====

/// Immutable shape of a texture, fixed at creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDesc {
    /// Pixel format
    pub format: PixelFormat,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels (1 for 1D)
    pub height: u32,
    /// Depth in pixels (1 unless 3D)
    pub depth: u32,
    /// Texture kind
    pub kind: TextureKind,
    /// Usage flags
    pub usage: TextureUsage,
    /// Samples per pixel (1 = not multisampled)
    pub sample_count: u32,
    /// Total number of mip levels, including the top level
    pub mip_levels: u32,
    /// Whether texel values are stored in gamma (sRGB) space
    pub gamma_corrected: bool,
}

impl TextureDesc {
    /// Single-level, single-sample 2D texture
    pub fn new_2d(format: PixelFormat, width: u32, height: u32, usage: TextureUsage) -> Self {
        Self {
            format,
            width,
            height,
            depth: 1,
            kind: TextureKind::Tex2D,
            usage,
            sample_count: 1,
            mip_levels: 1,
            gamma_corrected: false,
        }
    }

    pub fn face_count(&self) -> u32 {
        self.kind.face_count()
    }

    pub fn is_multisampled(&self) -> bool {
        self.sample_count > 1
    }

    /// Largest valid mip level count for the base dimensions
    pub fn max_mip_levels(&self) -> u32 {
        let largest = self.width.max(self.height).max(self.depth);
        if largest == 0 {
            return 0;
        }
        32 - largest.leading_zeros()
    }

    /// Extent of a mip level: each axis halved per level, floor 1
    pub fn mip_extent(&self, mip: u32) -> (u32, u32, u32) {
        let shrink = |base: u32| base.checked_shr(mip).unwrap_or(0).max(1);
        (shrink(self.width), shrink(self.height), shrink(self.depth))
    }

    /// Number of (face, mip) slots, saturating at `u32::MAX`
    pub fn subresource_count(&self) -> u32 {
        self.face_count().saturating_mul(self.mip_levels)
    }

    /// Flat index of a slot (`face * mip_levels + mip`), or None if out of range
    pub fn subresource_index(&self, subresource: Subresource) -> Option<u32> {
        if subresource.face >= self.face_count() || subresource.mip >= self.mip_levels {
            return None;
        }
        subresource.face
            .checked_mul(self.mip_levels)?
            .checked_add(subresource.mip)
    }

    /// Inverse of `subresource_index`
    pub fn subresource_at(&self, index: u32) -> Option<Subresource> {
        if self.mip_levels == 0 || index >= self.subresource_count() {
            return None;
        }
        Some(Subresource::new(index / self.mip_levels, index % self.mip_levels))
    }

    fn checked_surface_size(&self, mip: u32) -> Option<u64> {
        let (w, h, d) = self.mip_extent(mip);
        (w as u64)
            .checked_mul(h as u64)?
            .checked_mul(d as u64)?
            .checked_mul(self.format.bytes_per_pixel() as u64)
    }

    /// Bytes of one surface at the given mip level, saturating at `u64::MAX`
    pub fn surface_size(&self, mip: u32) -> u64 {
        self.checked_surface_size(mip).unwrap_or(u64::MAX)
    }

    /// Bytes of every surface of the texture, or None if the size overflows u64
    pub fn total_size(&self) -> Option<u64> {
        let per_face = (0..self.mip_levels)
            .try_fold(0u64, |sum, mip| sum.checked_add(self.checked_surface_size(mip)?))?;
        per_face.checked_mul(self.face_count() as u64)
    }
}

// ===== RENDERER TEXTURE TRAIT =====

/// GPU-side texture storage
///
/// Implemented by backend-specific texture types (e.g., SoftwareTexture).
/// The `*_subresource` methods run on the GPU timeline: callers go through
/// the `Renderer` queue so transfers stay ordered. Storage is freed by
/// `release()` or when dropped.
pub trait RendererTexture: Send + Sync {
    /// Shape the texture was created with
    fn desc(&self) -> &TextureDesc;

    /// Overwrite one surface with tightly packed bytes
    fn write_subresource(&self, subresource: Subresource, data: &[u8]) -> Result<()>;

    /// Copy one surface out to CPU-visible memory
    fn read_subresource(&self, subresource: Subresource) -> Result<Vec<u8>>;

    /// Free the storage. Returns true only for the call that actually released it.
    fn release(&self) -> bool;

    fn is_released(&self) -> bool;
}

#[cfg(test)]
#[path = "renderer_texture_tests.rs"]
mod tests;
