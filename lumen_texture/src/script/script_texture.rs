/// Scripting proxy for a texture
///
/// A `ScriptTexture` is what the scripting layer holds: a registry reference
/// plus an opaque handle. It never owns or caches pixel data or shape; every
/// call resolves the handle and forwards to the resource or the pixel transfer
/// protocol, so a destroyed texture always reports `InvalidHandle`.
///
/// Each proxy owns one registry reference: cloning retains, dropping releases,
/// and the texture is destroyed with the last proxy (or by `destroy`).

use std::sync::Arc;

use crate::engine::Engine;
use crate::error::Result;
use crate::pixel::{Color, PixelFormat, Surface};
use crate::renderer::{TextureDesc, TextureKind, TextureUsage};
use crate::resource::{Texture, TextureHandle, TextureRegistry};
use crate::script::AsyncOp;
use crate::transfer;

pub struct ScriptTexture {
    registry: Arc<TextureRegistry>,
    handle: TextureHandle,
}

impl ScriptTexture {
    /// Create a texture in the engine's texture registry
    ///
    /// # Errors
    ///
    /// `InitializationFailed` if the engine has no texture registry, otherwise
    /// as `TextureRegistry::create`.
    pub fn create(desc: TextureDesc) -> Result<Self> {
        Self::create_in(Engine::texture_registry()?, desc)
    }

    /// Create a texture in a specific registry
    pub fn create_in(registry: Arc<TextureRegistry>, desc: TextureDesc) -> Result<Self> {
        let handle = registry.create(desc)?;
        Ok(Self { registry, handle })
    }

    /// Attach a new proxy to an existing texture given its raw handle.
    ///
    /// The proxy takes its own reference on the texture.
    pub fn from_raw_handle(registry: Arc<TextureRegistry>, raw: u64) -> Result<Self> {
        let handle = TextureHandle::from_raw(raw);
        registry.retain(handle)?;
        Ok(Self { registry, handle })
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    /// Integer handle passed across the scripting boundary
    pub fn raw_handle(&self) -> u64 {
        self.handle.to_raw()
    }

    /// Whether the texture behind this proxy is still alive
    pub fn is_valid(&self) -> bool {
        self.registry.contains(self.handle)
    }

    /// Destroy the texture now, invalidating this proxy and every clone of it
    pub fn destroy(&self) -> Result<()> {
        self.registry.destroy(self.handle)
    }

    fn resolve(&self) -> Result<Arc<Texture>> {
        self.registry.resolve(self.handle)
    }

    // ===== SHAPE QUERIES =====

    pub fn pixel_format(&self) -> Result<PixelFormat> {
        Ok(self.resolve()?.format())
    }

    pub fn usage(&self) -> Result<TextureUsage> {
        Ok(self.resolve()?.usage())
    }

    pub fn kind(&self) -> Result<TextureKind> {
        Ok(self.resolve()?.kind())
    }

    pub fn width(&self) -> Result<u32> {
        Ok(self.resolve()?.width())
    }

    pub fn height(&self) -> Result<u32> {
        Ok(self.resolve()?.height())
    }

    pub fn depth(&self) -> Result<u32> {
        Ok(self.resolve()?.depth())
    }

    pub fn gamma_correction(&self) -> Result<bool> {
        Ok(self.resolve()?.gamma_corrected())
    }

    pub fn sample_count(&self) -> Result<u32> {
        Ok(self.resolve()?.sample_count())
    }

    /// Number of mip maps, not counting the top level
    pub fn mip_map_count(&self) -> Result<u32> {
        Ok(self.resolve()?.mip_levels() - 1)
    }

    // ===== PIXEL ACCESS =====

    /// Cached pixels of a surface (CPU_CACHED textures only).
    ///
    /// Pass `DEFAULT_FACE` / `DEFAULT_MIP_LEVEL` for the top-level surface.
    pub fn get_pixels(&self, face: u32, mip_level: u32) -> Result<Surface> {
        transfer::get_pixels(&*self.resolve()?, face, mip_level)
    }

    /// Start a GPU readback of a surface; does not block
    pub fn get_gpu_pixels(&self, face: u32, mip_level: u32) -> Result<AsyncOp> {
        transfer::get_gpu_pixels(&*self.resolve()?, face, mip_level).map(AsyncOp::new)
    }

    pub fn set_pixels(&self, surface: &Surface, face: u32, mip_level: u32) -> Result<()> {
        transfer::set_pixels(&*self.resolve()?, surface, face, mip_level)
    }

    /// Write a flat colour array (width x height x depth of the mip level)
    pub fn set_pixel_colors(&self, colors: &[Color], face: u32, mip_level: u32) -> Result<()> {
        transfer::set_pixel_colors(&*self.resolve()?, colors, face, mip_level)
    }
}

impl Clone for ScriptTexture {
    fn clone(&self) -> Self {
        // A clone of a dead proxy is just another dead proxy
        if let Err(e) = self.registry.retain(self.handle) {
            crate::engine_warn!("lumen::ScriptTexture", "Cloned proxy of dead texture: {}", e);
        }
        Self {
            registry: self.registry.clone(),
            handle: self.handle,
        }
    }
}

impl Drop for ScriptTexture {
    fn drop(&mut self) {
        if self.registry.contains(self.handle) {
            if let Err(e) = self.registry.release(self.handle) {
                crate::engine_warn!("lumen::ScriptTexture", "Failed to release texture: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for ScriptTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptTexture")
            .field("handle", &format_args!("{:#x}", self.raw_handle()))
            .field("valid", &self.is_valid())
            .finish()
    }
}

#[cfg(test)]
#[path = "script_texture_tests.rs"]
mod tests;
