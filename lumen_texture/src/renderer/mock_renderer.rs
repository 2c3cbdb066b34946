/// Mock Renderer for unit tests
///
/// Queues GPU commands until `flush()` is called, so tests can observe a
/// readback while it is still pending and control exactly when the GPU
/// timeline advances. Storage uses `SoftwareTexture`.

use std::sync::Arc;

use crate::error::Result;
use crate::renderer::software_renderer::{execute, DeviceState, GpuCommand, SoftwareTexture};
use crate::renderer::{
    Renderer, RendererCaps, RendererStats, RendererTexture, Subresource, TextureDesc,
};
use crate::transfer::PendingReadback;

pub struct MockRenderer {
    caps: RendererCaps,
    device: Arc<DeviceState>,
    queued: Vec<GpuCommand>,
    /// Every descriptor passed to create_texture, in order
    pub created: Vec<TextureDesc>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::with_caps(RendererCaps::default())
    }

    pub fn with_caps(caps: RendererCaps) -> Self {
        Self {
            caps,
            device: Arc::new(DeviceState::default()),
            queued: Vec::new(),
            created: Vec::new(),
        }
    }

    /// Execute every queued command in submission order, returns how many ran
    pub fn flush(&mut self) -> usize {
        let commands: Vec<GpuCommand> = self.queued.drain(..).collect();
        let count = commands.len();
        for command in commands {
            execute(command, &self.device);
        }
        count
    }

    pub fn pending_commands(&self) -> usize {
        self.queued.len()
    }

    pub fn set_device_lost(&self, lost: bool) {
        self.device.set_lost(lost);
    }

    fn submit(&mut self, command: GpuCommand) {
        self.device.record_submit();
        self.queued.push(command);
    }
}

impl Renderer for MockRenderer {
    fn caps(&self) -> RendererCaps {
        self.caps
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<Arc<dyn RendererTexture>> {
        let size = self.device.reserve(desc, None)?;
        self.created.push(desc.clone());
        Ok(Arc::new(SoftwareTexture::new(desc, size, self.device.clone())?))
    }

    fn write_surface(
        &mut self,
        texture: &Arc<dyn RendererTexture>,
        subresource: Subresource,
        data: Vec<u8>,
    ) -> Result<()> {
        self.submit(GpuCommand::Write { texture: texture.clone(), subresource, data });
        Ok(())
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
        });
        Ok(())
    }

    fn read_surface(
        &mut self,
        texture: &Arc<dyn RendererTexture>,
        subresource: Subresource,
    ) -> Result<PendingReadback> {
        let (sender, pending) = PendingReadback::channel();
        self.submit(GpuCommand::Readback { texture: texture.clone(), subresource, sender });
        Ok(pending)
    }

    fn wait_idle(&mut self) -> Result<()> {
        self.flush();
        Ok(())
    }

    fn stats(&self) -> RendererStats {
        self.device.stats()
    }
}

#[cfg(test)]
#[path = "mock_renderer_tests.rs"]
mod tests;
