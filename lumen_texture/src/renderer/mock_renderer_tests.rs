/// Unit tests for MockRenderer.
///
/// Checks that commands stay queued until flush and then execute in order.

use crate::renderer::mock_renderer::*;
use crate::renderer::{
    Renderer, RendererCaps, RendererTexture, Subresource, TextureDesc, TextureUsage,
};
use crate::pixel::PixelFormat;
use crate::transfer::ReadbackState;

fn rgba_desc(width: u32, height: u32) -> TextureDesc {
    TextureDesc::new_2d(PixelFormat::R8G8B8A8_UNORM, width, height, TextureUsage::SAMPLED)
}

// ============================================================================
// Creation
// ============================================================================

#[test]
fn test_mock_renderer_records_created_descs() {
    let mut renderer = MockRenderer::new();
    let first = renderer.create_texture(&rgba_desc(4, 4)).unwrap();
    let second = renderer.create_texture(&rgba_desc(8, 2)).unwrap();

    assert_eq!(renderer.created.len(), 2);
    assert_eq!(renderer.created[1].width, 8);
    assert_eq!(renderer.stats().live_textures, 2);
    assert_eq!(renderer.stats().gpu_memory_used, 4 * 4 * 4 + 8 * 2 * 4);

    // Dropping the storage frees it
    drop(first);
    drop(second);
    assert_eq!(renderer.stats().live_textures, 0);
    assert_eq!(renderer.stats().gpu_memory_used, 0);
    assert_eq!(renderer.created.len(), 2);
}

#[test]
fn test_mock_renderer_custom_caps() {
    let caps = RendererCaps {
        max_texture_dimension: 64,
        max_array_layers: 16,
        max_sample_count: 1,
        allow_multisampled_cpu_cached: true,
    };
    let renderer = MockRenderer::with_caps(caps);
    assert_eq!(renderer.caps(), caps);
}

#[test]
fn test_mock_renderer_release_frees_memory() {
    let mut renderer = MockRenderer::new();
    let texture = renderer.create_texture(&rgba_desc(4, 4)).unwrap();

    assert!(texture.release());
    assert!(!texture.release());
    assert_eq!(renderer.stats().live_textures, 0);
    assert_eq!(renderer.stats().gpu_memory_used, 0);
}

// ============================================================================
// Command queue
// ============================================================================

#[test]
fn test_mock_renderer_queues_until_flush() {
    let mut renderer = MockRenderer::new();
    let texture = renderer.create_texture(&rgba_desc(1, 1)).unwrap();
    let sub = Subresource::new(0, 0);

    renderer.write_surface(&texture, sub, vec![1, 2, 3, 4]).unwrap();
    let mut readback = renderer.read_surface(&texture, sub).unwrap();

    assert_eq!(renderer.pending_commands(), 2);
    assert_eq!(readback.poll_state(), ReadbackState::Pending);

    assert_eq!(renderer.flush(), 2);
    assert_eq!(renderer.pending_commands(), 0);

    let surface = readback.wait().unwrap();
    assert_eq!(surface.data(), &[1, 2, 3, 4]);
}

#[test]
fn test_mock_renderer_wait_idle_flushes() {
    let mut renderer = MockRenderer::new();
    let texture = renderer.create_texture(&rgba_desc(1, 1)).unwrap();
    let mut readback = renderer.read_surface(&texture, Subresource::new(0, 0)).unwrap();

    renderer.wait_idle().unwrap();

    assert_eq!(readback.poll_state(), ReadbackState::Completed);
    assert_eq!(renderer.stats().readbacks_completed, 1);
    assert_eq!(renderer.stats().submitted_commands, 1);
}

#[test]
fn test_mock_renderer_copy_executes_in_order() {
    let mut renderer = MockRenderer::new();
    let src = renderer.create_texture(&rgba_desc(1, 1)).unwrap();
    let dst = renderer.create_texture(&rgba_desc(1, 1)).unwrap();
    let sub = Subresource::new(0, 0);

    renderer.write_surface(&src, sub, vec![9, 8, 7, 6]).unwrap();
    renderer.copy_surface(&src, sub, &dst, sub).unwrap();
    let mut readback = renderer.read_surface(&dst, sub).unwrap();
    renderer.flush();

    assert_eq!(readback.wait().unwrap().data(), &[9, 8, 7, 6]);
}

#[test]
fn test_mock_renderer_device_lost_fails_readback() {
    let mut renderer = MockRenderer::new();
    let texture = renderer.create_texture(&rgba_desc(2, 2)).unwrap();
    let mut readback = renderer.read_surface(&texture, Subresource::new(0, 0)).unwrap();

    renderer.set_device_lost(true);
    renderer.flush();

    assert_eq!(readback.poll_state(), ReadbackState::Failed);
    assert_eq!(renderer.stats().readbacks_failed, 1);
}
