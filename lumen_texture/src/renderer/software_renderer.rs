/// Software renderer - CPU-emulated GPU backend
///
/// Texture storage lives in system memory and every transfer runs on a
/// dedicated GPU queue worker thread fed through a channel. Commands execute
/// strictly in submission order, which is what gives readbacks their
/// "observe all earlier writes" guarantee.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::error::{Error, Result};
use crate::pixel::Surface;
use crate::renderer::{
    Config, Renderer, RendererCaps, RendererStats, RendererTexture, Subresource, TextureDesc,
};
use crate::transfer::{PendingReadback, ReadbackSender};
use crate::{engine_bail, engine_err};

// ============================================================================
// Device state
// ============================================================================

/// Counters and flags shared between a renderer, its textures and its queue
#[derive(Debug, Default)]
pub(crate) struct DeviceState {
    device_lost: AtomicBool,
    memory_used: AtomicU64,
    live_textures: AtomicU64,
    submitted_commands: AtomicU64,
    readbacks_completed: AtomicU64,
    readbacks_failed: AtomicU64,
}

impl DeviceState {
    pub(crate) fn is_lost(&self) -> bool {
        self.device_lost.load(Ordering::Acquire)
    }

    pub(crate) fn set_lost(&self, lost: bool) {
        self.device_lost.store(lost, Ordering::Release);
    }

    pub(crate) fn memory_used(&self) -> u64 {
        self.memory_used.load(Ordering::Acquire)
    }

    pub(crate) fn record_submit(&self) {
        self.submitted_commands.fetch_add(1, Ordering::Relaxed);
    }

    fn allocate(&self, size: u64) {
        self.memory_used.fetch_add(size, Ordering::AcqRel);
        self.live_textures.fetch_add(1, Ordering::AcqRel);
    }

    fn free(&self, size: u64) {
        self.memory_used.fetch_sub(size, Ordering::AcqRel);
        self.live_textures.fetch_sub(1, Ordering::AcqRel);
    }

    pub(crate) fn stats(&self) -> RendererStats {
        RendererStats {
            live_textures: self.live_textures.load(Ordering::Acquire),
            gpu_memory_used: self.memory_used(),
            submitted_commands: self.submitted_commands.load(Ordering::Acquire),
            readbacks_completed: self.readbacks_completed.load(Ordering::Acquire),
            readbacks_failed: self.readbacks_failed.load(Ordering::Acquire),
        }
    }

    /// Reserve GPU memory for a new texture, honoring the budget
    pub(crate) fn reserve(&self, desc: &TextureDesc, budget: Option<u64>) -> Result<u64> {
        let size = desc.total_size()
            .and_then(|size| size.checked_mul(desc.sample_count as u64))
            .ok_or_else(|| engine_err!("lumen::SoftwareRenderer", InvalidConfiguration,
                "{:?} texture byte size overflows", desc.kind))?;
        if let Some(budget) = budget {
            let used = self.memory_used();
            if used.checked_add(size).map_or(true, |total| total > budget) {
                crate::engine_error!("lumen::SoftwareRenderer",
                    "Texture of {} bytes exceeds memory budget ({} of {} bytes used)",
                    size, used, budget);
                return Err(Error::OutOfMemory);
            }
        }
        Ok(size)
    }
}

// ============================================================================
// Software texture
// ============================================================================

fn zeroed_storage(size: u64) -> Result<Vec<u8>> {
    let len = usize::try_from(size).map_err(|_| Error::OutOfMemory)?;
    let mut storage = Vec::new();
    if storage.try_reserve_exact(len).is_err() {
        crate::engine_error!("lumen::SoftwareRenderer",
            "Cannot allocate {} bytes of texture storage", size);
        return Err(Error::OutOfMemory);
    }
    storage.resize(len, 0);
    Ok(storage)
}

/// Texture storage in system memory, one byte vector per subresource
pub struct SoftwareTexture {
    desc: TextureDesc,
    /// None once released
    surfaces: Mutex<Option<Vec<Vec<u8>>>>,
    allocation_size: u64,
    device: Arc<DeviceState>,
}

impl SoftwareTexture {
    /// Allocate zero-filled storage; `allocation_size` is charged to `device`
    ///
    /// # Errors
    ///
    /// `OutOfMemory` if system memory cannot hold the surfaces.
    pub(crate) fn new(desc: &TextureDesc, allocation_size: u64, device: Arc<DeviceState>) -> Result<Self> {
        let surfaces = (0..desc.subresource_count())
            .filter_map(|index| desc.subresource_at(index))
            .map(|sub| zeroed_storage(desc.surface_size(sub.mip)))
            .collect::<Result<Vec<_>>>()?;
        device.allocate(allocation_size);
        Ok(Self {
            desc: desc.clone(),
            surfaces: Mutex::new(Some(surfaces)),
            allocation_size,
            device,
        })
    }

    fn index(&self, subresource: Subresource) -> Result<usize> {
        self.desc
            .subresource_index(subresource)
            .map(|index| index as usize)
            .ok_or_else(|| engine_err!("lumen::SoftwareTexture", RangeError,
                "{} outside {} faces x {} mips",
                subresource, self.desc.face_count(), self.desc.mip_levels))
    }
}

impl RendererTexture for SoftwareTexture {
    fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    fn write_subresource(&self, subresource: Subresource, data: &[u8]) -> Result<()> {
        let index = self.index(subresource)?;
        let mut guard = self.surfaces.lock()
            .map_err(|_| engine_err!("lumen::SoftwareTexture", "Texture storage lock poisoned"))?;
        let surfaces = guard.as_mut()
            .ok_or_else(|| engine_err!("lumen::SoftwareTexture", InvalidHandle,
                "write to {} of released texture", subresource))?;
        let target = &mut surfaces[index];
        if target.len() != data.len() {
            engine_bail!("lumen::SoftwareTexture", ShapeMismatch,
                "{} holds {} bytes, got {}", subresource, target.len(), data.len());
        }
        target.copy_from_slice(data);
        Ok(())
    }

    fn read_subresource(&self, subresource: Subresource) -> Result<Vec<u8>> {
        let index = self.index(subresource)?;
        let guard = self.surfaces.lock()
            .map_err(|_| engine_err!("lumen::SoftwareTexture", "Texture storage lock poisoned"))?;
        let surfaces = guard.as_ref()
            .ok_or_else(|| engine_err!("lumen::SoftwareTexture", InvalidHandle,
                "read of {} from released texture", subresource))?;
        Ok(surfaces[index].clone())
    }

    fn release(&self) -> bool {
        let released = match self.surfaces.lock() {
            Ok(mut guard) => guard.take().is_some(),
            Err(poisoned) => poisoned.into_inner().take().is_some(),
        };
        if released {
            self.device.free(self.allocation_size);
        }
        released
    }

    fn is_released(&self) -> bool {
        match self.surfaces.lock() {
            Ok(guard) => guard.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }
}

impl Drop for SoftwareTexture {
    fn drop(&mut self) {
        self.release();
    }
}

// ============================================================================
// GPU commands
// ============================================================================

/// One unit of work on the GPU timeline
pub(crate) enum GpuCommand {
    Write {
        texture: Arc<dyn RendererTexture>,
        subresource: Subresource,
        data: Vec<u8>,
    },
    Copy {
        src: Arc<dyn RendererTexture>,
        src_subresource: Subresource,
        dst: Arc<dyn RendererTexture>,
        dst_subresource: Subresource,
    },
    Readback {
        texture: Arc<dyn RendererTexture>,
        subresource: Subresource,
        sender: ReadbackSender,
    },
    Fence(Sender<()>),
}

/// Execute one command against texture storage
pub(crate) fn execute(command: GpuCommand, device: &DeviceState) {
    match command {
        GpuCommand::Write { texture, subresource, data } => {
            if let Err(error) = texture.write_subresource(subresource, &data) {
                crate::engine_warn!("lumen::GpuQueue", "Dropped write to {}: {}", subresource, error);
            }
        }
        GpuCommand::Copy { src, src_subresource, dst, dst_subresource } => {
            let copied = src.read_subresource(src_subresource)
                .and_then(|data| dst.write_subresource(dst_subresource, &data));
            if let Err(error) = copied {
                crate::engine_warn!("lumen::GpuQueue",
                    "Dropped copy {} -> {}: {}", src_subresource, dst_subresource, error);
            }
        }
        GpuCommand::Readback { texture, subresource, sender } => {
            match read_back(texture.as_ref(), subresource, device) {
                Ok(surface) => {
                    device.readbacks_completed.fetch_add(1, Ordering::Relaxed);
                    crate::engine_trace!("lumen::GpuQueue", "Readback of {} completed", subresource);
                    sender.complete(surface);
                }
                Err(error) => {
                    device.readbacks_failed.fetch_add(1, Ordering::Relaxed);
                    sender.fail(error);
                }
            }
        }
        GpuCommand::Fence(reply) => {
            // The waiter may have given up; nothing to do then
            let _ = reply.send(());
        }
    }
}

fn read_back(texture: &dyn RendererTexture, subresource: Subresource, device: &DeviceState) -> Result<Surface> {
    if device.is_lost() {
        engine_bail!("lumen::GpuQueue", SynchronizationFailure,
            "device lost before readback of {} completed", subresource);
    }
    if texture.is_released() {
        engine_bail!("lumen::GpuQueue", SynchronizationFailure,
            "texture destroyed before readback of {} completed", subresource);
    }
    let desc = texture.desc();
    let (width, height, depth) = desc.mip_extent(subresource.mip);
    texture.read_subresource(subresource)
        .and_then(|data| Surface::from_bytes(width, height, depth, desc.format, data))
        .map_err(|error| engine_err!("lumen::GpuQueue", SynchronizationFailure,
            "readback of {} failed: {}", subresource, error))
}

// ============================================================================
// Software renderer
// ============================================================================

/// CPU-emulated renderer with an ordered GPU queue worker thread
pub struct SoftwareRenderer {
    config: Config,
    device: Arc<DeviceState>,
    queue: Option<Sender<GpuCommand>>,
    worker: Option<JoinHandle<()>>,
}

impl SoftwareRenderer {
    /// Create the renderer and start its queue worker
    ///
    /// # Errors
    ///
    /// `InitializationFailed` if the configuration is unusable or the worker
    /// thread cannot be spawned.
    pub fn new(config: Config) -> Result<Self> {
        if config.max_texture_dimension == 0 {
            engine_bail!("lumen::SoftwareRenderer", InitializationFailed,
                "max_texture_dimension must be non-zero");
        }
        if config.max_array_layers == 0 {
            engine_bail!("lumen::SoftwareRenderer", InitializationFailed,
                "max_array_layers must be non-zero");
        }
        if !config.max_sample_count.is_power_of_two() {
            engine_bail!("lumen::SoftwareRenderer", InitializationFailed,
                "max_sample_count must be a power of two, got {}", config.max_sample_count);
        }

        let device = Arc::new(DeviceState::default());
        let (sender, receiver) = crossbeam_channel::unbounded();
        let worker_device = device.clone();
        let worker = std::thread::Builder::new()
            .name(config.worker_thread_name.clone())
            .spawn(move || run_queue(receiver, worker_device))
            .map_err(|e| engine_err!("lumen::SoftwareRenderer", InitializationFailed,
                "Failed to spawn GPU queue worker: {}", e))?;

        crate::engine_info!("lumen::SoftwareRenderer",
            "Started GPU queue worker '{}'", config.worker_thread_name);

        Ok(Self {
            config,
            device,
            queue: Some(sender),
            worker: Some(worker),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mark the device as lost: every readback executed afterwards fails
    pub fn simulate_device_lost(&self) {
        crate::engine_warn!("lumen::SoftwareRenderer", "Device lost");
        self.device.set_lost(true);
    }

    pub fn is_device_lost(&self) -> bool {
        self.device.is_lost()
    }

    fn submit(&self, command: GpuCommand) -> Result<()> {
        let queue = self.queue.as_ref()
            .ok_or_else(|| engine_err!("lumen::SoftwareRenderer", "GPU queue is shut down"))?;
        queue.send(command)
            .map_err(|_| engine_err!("lumen::SoftwareRenderer", "GPU queue worker has stopped"))?;
        self.device.record_submit();
        Ok(())
    }
}

fn run_queue(receiver: Receiver<GpuCommand>, device: Arc<DeviceState>) {
    // Drains everything still queued once the renderer drops its sender
    for command in receiver.iter() {
        execute(command, &device);
    }
}

impl Renderer for SoftwareRenderer {
    fn caps(&self) -> RendererCaps {
        self.config.caps()
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<Arc<dyn RendererTexture>> {
        let size = self.device.reserve(desc, self.config.memory_budget_bytes)?;
        crate::engine_debug!("lumen::SoftwareRenderer",
            "Allocated {:?} {}x{}x{} texture ({} bytes)",
            desc.kind, desc.width, desc.height, desc.depth, size);
        Ok(Arc::new(SoftwareTexture::new(desc, size, self.device.clone())?))
    }

    fn write_surface(
        &mut self,
        texture: &Arc<dyn RendererTexture>,
        subresource: Subresource,
        data: Vec<u8>,
    ) -> Result<()> {
        let expected = texture.desc().surface_size(subresource.mip);
        if data.len() as u64 != expected {
            engine_bail!("lumen::SoftwareRenderer", ShapeMismatch,
                "{} upload needs {} bytes, got {}", subresource, expected, data.len());
        }
        self.submit(GpuCommand::Write {
            texture: texture.clone(),
            subresource,
            data,
        })
    }

    fn copy_surface(
        &mut self,
        src: &Arc<dyn RendererTexture>,
        src_subresource: Subresource,
        dst: &Arc<dyn RendererTexture>,
        dst_subresource: Subresource,
    ) -> Result<()> {
        self.submit(GpuCommand::Copy {
            src: src.clone(),
            src_subresource,
            dst: dst.clone(),
            dst_subresource,
        })
    }

    fn read_surface(
        &mut self,
        texture: &Arc<dyn RendererTexture>,
        subresource: Subresource,
    ) -> Result<PendingReadback> {
        let (sender, pending) = PendingReadback::channel();
        self.submit(GpuCommand::Readback {
            texture: texture.clone(),
            subresource,
            sender,
        })?;
        Ok(pending)
    }

    fn wait_idle(&mut self) -> Result<()> {
        let (reply, done) = crossbeam_channel::bounded(1);
        self.submit(GpuCommand::Fence(reply))?;
        done.recv()
            .map_err(|_| engine_err!("lumen::SoftwareRenderer", "GPU queue worker stopped before fence"))
    }

    fn stats(&self) -> RendererStats {
        self.device.stats()
    }
}

impl Drop for SoftwareRenderer {
    fn drop(&mut self) {
        self.queue = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                crate::engine_error!("lumen::SoftwareRenderer", "GPU queue worker panicked");
            }
        }
    }
}

#[cfg(test)]
#[path = "software_renderer_tests.rs"]
mod tests;
