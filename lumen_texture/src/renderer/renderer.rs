/// Renderer trait - texture factory and GPU transfer queue

use std::sync::Arc;

use crate::error::Result;
use crate::renderer::{RendererTexture, Subresource, TextureDesc};
use crate::transfer::PendingReadback;

// ============================================================================
// Configuration
// ============================================================================

/// Renderer configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Largest allowed size of any texture axis
    pub max_texture_dimension: u32,
    /// Largest allowed number of faces (array layers, or 6 per cube)
    pub max_array_layers: u32,
    /// Largest allowed sample count (power of two)
    pub max_sample_count: u32,
    /// Whether multisampled textures may also be CPU cached
    pub allow_multisampled_cpu_cached: bool,
    /// GPU memory budget; allocations beyond it fail with OutOfMemory
    pub memory_budget_bytes: Option<u64>,
    /// Name of the GPU queue worker thread
    pub worker_thread_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_texture_dimension: 16384,
            max_array_layers: 2048,
            max_sample_count: 8,
            allow_multisampled_cpu_cached: false,
            memory_budget_bytes: None,
            worker_thread_name: "lumen-gpu-queue".to_string(),
        }
    }
}

impl Config {
    /// Capabilities this configuration advertises
    pub fn caps(&self) -> RendererCaps {
        RendererCaps {
            max_texture_dimension: self.max_texture_dimension,
            max_array_layers: self.max_array_layers,
            max_sample_count: self.max_sample_count,
            allow_multisampled_cpu_cached: self.allow_multisampled_cpu_cached,
        }
    }
}

/// Backend limits consulted when a texture is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererCaps {
    pub max_texture_dimension: u32,
    pub max_array_layers: u32,
    pub max_sample_count: u32,
    pub allow_multisampled_cpu_cached: bool,
}

impl Default for RendererCaps {
    fn default() -> Self {
        Config::default().caps()
    }
}

/// Renderer statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererStats {
    /// Textures whose storage has not been released
    pub live_textures: u64,
    /// GPU memory used by live textures (bytes)
    pub gpu_memory_used: u64,
    /// Commands submitted to the GPU queue
    pub submitted_commands: u64,
    /// Readbacks that delivered a surface
    pub readbacks_completed: u64,
    /// Readbacks that ended in SynchronizationFailure
    pub readbacks_failed: u64,
}

// ============================================================================
// Renderer trait
// ============================================================================

/// Main renderer trait
///
/// Allocates GPU texture storage and executes (face, mip)-indexed transfers.
/// Transfers are queued and execute in submission order on the GPU timeline,
/// so a readback observes every write to the same surface submitted before it.
pub trait Renderer: Send + Sync {
    /// Limits used to validate texture descriptors
    fn caps(&self) -> RendererCaps;

    /// Allocate storage for a texture (all surfaces zero-initialized)
    ///
    /// The descriptor has already been validated against `caps()`.
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<Arc<dyn RendererTexture>>;

    /// Queue an upload of one surface
    fn write_surface(
        &mut self,
        texture: &Arc<dyn RendererTexture>,
        subresource: Subresource,
        data: Vec<u8>,
    ) -> Result<()>;

    /// Queue a GPU-side surface copy
    fn copy_surface(
        &mut self,
        src: &Arc<dyn RendererTexture>,
        src_subresource: Subresource,
        dst: &Arc<dyn RendererTexture>,
        dst_subresource: Subresource,
    ) -> Result<()>;

    /// Queue a copy to CPU-visible memory. Returns immediately.
    fn read_surface(
        &mut self,
        texture: &Arc<dyn RendererTexture>,
        subresource: Subresource,
    ) -> Result<PendingReadback>;

    /// Block until every queued command has executed
    fn wait_idle(&mut self) -> Result<()>;

    fn stats(&self) -> RendererStats;
}
