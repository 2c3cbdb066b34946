/// Native texture resource
///
/// A `Texture` pairs the backend's GPU storage with the resource-level state
/// the engine keeps around it: the immutable shape, the optional system-memory
/// cache for CPU-cached textures, and the terminal "destroyed" flag.
/// Textures are created and destroyed through `TextureRegistry`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::error::Result;
use crate::pixel::Surface;
use crate::renderer::{
    Renderer, RendererCaps, RendererTexture, Subresource, TextureDesc, TextureKind, TextureUsage,
};
use crate::pixel::PixelFormat;
use crate::{engine_bail, engine_err};

// ===== VALIDATION =====

/// Check a descriptor against the texture rules and backend limits.
///
/// # Errors
///
/// `InvalidConfiguration` describing the first rule the descriptor breaks.
pub fn validate_desc(desc: &TextureDesc, caps: &RendererCaps) -> Result<()> {
    const SOURCE: &str = "lumen::Texture";
    let kind = desc.kind;

    // Axes
    if desc.width == 0 {
        engine_bail!(SOURCE, InvalidConfiguration, "{:?} texture needs a non-zero width", kind);
    }
    if kind.uses_height() && desc.height == 0 {
        engine_bail!(SOURCE, InvalidConfiguration, "{:?} texture needs a non-zero height", kind);
    }
    if !kind.uses_height() && desc.height != 1 {
        engine_bail!(SOURCE, InvalidConfiguration, "{:?} texture must have height 1, got {}", kind, desc.height);
    }
    if kind.uses_depth() && desc.depth == 0 {
        engine_bail!(SOURCE, InvalidConfiguration, "{:?} texture needs a non-zero depth", kind);
    }
    if !kind.uses_depth() && desc.depth != 1 {
        engine_bail!(SOURCE, InvalidConfiguration, "{:?} texture must have depth 1, got {}", kind, desc.depth);
    }
    if kind.is_cube() && desc.width != desc.height {
        engine_bail!(SOURCE, InvalidConfiguration,
            "cube faces must be square, got {}x{}", desc.width, desc.height);
    }
    if kind.face_count() == 0 {
        engine_bail!(SOURCE, InvalidConfiguration, "{:?} texture needs at least one layer", kind);
    }
    if kind.face_count() > caps.max_array_layers {
        engine_bail!(SOURCE, InvalidConfiguration,
            "{:?} needs {} faces, backend limit is {}", kind, kind.face_count(), caps.max_array_layers);
    }
    let largest = desc.width.max(desc.height).max(desc.depth);
    if largest > caps.max_texture_dimension {
        engine_bail!(SOURCE, InvalidConfiguration,
            "dimension {} exceeds backend limit {}", largest, caps.max_texture_dimension);
    }

    // Mips
    if desc.mip_levels == 0 {
        engine_bail!(SOURCE, InvalidConfiguration, "mip level count must include the top level");
    }
    if desc.mip_levels > desc.max_mip_levels() {
        engine_bail!(SOURCE, InvalidConfiguration,
            "{} mip levels requested, {}x{}x{} allows at most {}",
            desc.mip_levels, desc.width, desc.height, desc.depth, desc.max_mip_levels());
    }
    if desc.total_size().is_none() {
        engine_bail!(SOURCE, InvalidConfiguration, "{:?} texture byte size overflows", kind);
    }

    // Usage and format
    let usage = desc.usage;
    if usage.contains(TextureUsage::RENDER_TARGET | TextureUsage::DEPTH_STENCIL) {
        engine_bail!(SOURCE, InvalidConfiguration,
            "RENDER_TARGET and DEPTH_STENCIL usage are mutually exclusive");
    }
    if desc.format.is_depth() != usage.contains(TextureUsage::DEPTH_STENCIL) {
        engine_bail!(SOURCE, InvalidConfiguration,
            "{:?} format is incompatible with usage {:?}", desc.format, usage);
    }

    // Samples
    if desc.sample_count == 0 || !desc.sample_count.is_power_of_two() {
        engine_bail!(SOURCE, InvalidConfiguration,
            "sample count must be a power of two, got {}", desc.sample_count);
    }
    if desc.sample_count > caps.max_sample_count {
        engine_bail!(SOURCE, InvalidConfiguration,
            "sample count {} exceeds backend limit {}", desc.sample_count, caps.max_sample_count);
    }
    if desc.is_multisampled() {
        if !kind.supports_multisampling() {
            engine_bail!(SOURCE, InvalidConfiguration, "{:?} textures cannot be multisampled", kind);
        }
        if desc.mip_levels != 1 {
            engine_bail!(SOURCE, InvalidConfiguration, "multisampled textures cannot have mip maps");
        }
        if !usage.intersects(TextureUsage::RENDER_TARGET | TextureUsage::DEPTH_STENCIL) {
            engine_bail!(SOURCE, InvalidConfiguration,
                "multisampling requires RENDER_TARGET or DEPTH_STENCIL usage");
        }
        if usage.contains(TextureUsage::CPU_CACHED) && !caps.allow_multisampled_cpu_cached {
            engine_bail!(SOURCE, InvalidConfiguration,
                "backend does not allow CPU_CACHED multisampled textures");
        }
    }

    Ok(())
}

// ===== TEXTURE =====

/// A live texture resource
pub struct Texture {
    desc: TextureDesc,
    renderer: Arc<Mutex<dyn Renderer>>,
    gpu_texture: Arc<dyn RendererTexture>,
    /// System-memory copy of every surface, indexed by subresource (CPU_CACHED only)
    cpu_cache: Option<Vec<RwLock<Surface>>>,
    destroyed: AtomicBool,
}

impl Texture {
    /// Validate `desc` and allocate GPU storage (and the CPU cache if requested)
    pub(crate) fn create(renderer: Arc<Mutex<dyn Renderer>>, desc: TextureDesc) -> Result<Self> {
        let gpu_texture = {
            let mut guard = renderer.lock()
                .map_err(|_| engine_err!("lumen::Texture", "Renderer lock poisoned"))?;
            validate_desc(&desc, &guard.caps())?;
            guard.create_texture(&desc)?
        };

        let cpu_cache = desc.usage.contains(TextureUsage::CPU_CACHED).then(|| {
            (0..desc.subresource_count())
                .filter_map(|index| desc.subresource_at(index))
                .map(|sub| {
                    let (w, h, d) = desc.mip_extent(sub.mip);
                    RwLock::new(Surface::new_zeroed(w, h, d, desc.format))
                })
                .collect()
        });

        Ok(Self {
            desc,
            renderer,
            gpu_texture,
            cpu_cache,
            destroyed: AtomicBool::new(false),
        })
    }

    // ----- Shape queries -----

    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    pub fn format(&self) -> PixelFormat {
        self.desc.format
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    pub fn depth(&self) -> u32 {
        self.desc.depth
    }

    pub fn kind(&self) -> TextureKind {
        self.desc.kind
    }

    pub fn usage(&self) -> TextureUsage {
        self.desc.usage
    }

    pub fn sample_count(&self) -> u32 {
        self.desc.sample_count
    }

    /// Total mip levels including the top level
    pub fn mip_levels(&self) -> u32 {
        self.desc.mip_levels
    }

    pub fn gamma_corrected(&self) -> bool {
        self.desc.gamma_corrected
    }

    pub fn face_count(&self) -> u32 {
        self.desc.face_count()
    }

    pub fn is_cpu_cached(&self) -> bool {
        self.cpu_cache.is_some()
    }

    pub fn is_multisampled(&self) -> bool {
        self.desc.is_multisampled()
    }

    /// Total byte size of every surface
    pub fn size_bytes(&self) -> u64 {
        // Checked by validate_desc at creation
        self.desc.total_size().unwrap_or(u64::MAX)
    }

    // ----- Subresources -----

    /// Validate a (face, mip) pair against this texture
    ///
    /// # Errors
    ///
    /// `RangeError` if `face >= face_count()` or `mip >= mip_levels()`.
    pub fn subresource(&self, face: u32, mip: u32) -> Result<Subresource> {
        let subresource = Subresource::new(face, mip);
        if self.desc.subresource_index(subresource).is_none() {
            engine_bail!("lumen::Texture", RangeError,
                "{} outside {} faces x {} mips", subresource, self.face_count(), self.mip_levels());
        }
        Ok(subresource)
    }

    /// Extent of a mip level
    pub fn mip_extent(&self, mip: u32) -> Result<(u32, u32, u32)> {
        let subresource = self.subresource(0, mip)?;
        Ok(self.desc.mip_extent(subresource.mip))
    }

    /// A zeroed surface shaped exactly for the given slot
    pub fn allocate_surface(&self, face: u32, mip: u32) -> Result<Surface> {
        let subresource = self.subresource(face, mip)?;
        let (w, h, d) = self.desc.mip_extent(subresource.mip);
        Ok(Surface::new_zeroed(w, h, d, self.desc.format))
    }

    // ----- Backend access -----

    /// GPU storage backing this texture
    pub fn gpu_texture(&self) -> &Arc<dyn RendererTexture> {
        &self.gpu_texture
    }

    /// Renderer that owns the GPU storage
    pub fn renderer(&self) -> &Arc<Mutex<dyn Renderer>> {
        &self.renderer
    }

    // ----- Lifecycle -----

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Fail with `InvalidHandle` once the texture has been destroyed
    pub fn ensure_alive(&self) -> Result<()> {
        if self.is_destroyed() {
            engine_bail!("lumen::Texture", InvalidHandle, "texture has been destroyed");
        }
        Ok(())
    }

    /// Enter the destroyed state and release GPU storage.
    ///
    /// Returns true only for the call that performed the transition.
    pub(crate) fn destroy(&self) -> bool {
        if self.destroyed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.gpu_texture.release();
        true
    }

    // ----- CPU cache -----

    fn cache_slot(&self, subresource: Subresource) -> Result<&RwLock<Surface>> {
        let cache = self.cpu_cache.as_ref()
            .ok_or_else(|| engine_err!("lumen::Texture", UsageError,
                "texture was not created with CPU_CACHED usage"))?;
        let index = self.desc.subresource_index(subresource)
            .ok_or_else(|| engine_err!("lumen::Texture", RangeError,
                "{} outside {} faces x {} mips", subresource, self.face_count(), self.mip_levels()))?;
        Ok(&cache[index as usize])
    }

    /// Copy of the cached surface for a slot
    pub(crate) fn cached_surface(&self, subresource: Subresource) -> Result<Surface> {
        let slot = self.cache_slot(subresource)?;
        let guard = slot.read()
            .map_err(|_| engine_err!("lumen::Texture", "CPU cache lock poisoned"))?;
        Ok(guard.clone())
    }

    /// Replace the cached surface for a slot (shape already validated)
    pub(crate) fn store_cached(&self, subresource: Subresource, surface: Surface) -> Result<()> {
        let slot = self.cache_slot(subresource)?;
        let mut guard = slot.write()
            .map_err(|_| engine_err!("lumen::Texture", "CPU cache lock poisoned"))?;
        *guard = surface;
        Ok(())
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("desc", &self.desc)
            .field("cpu_cached", &self.is_cpu_cached())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
