/// Unit tests for SoftwareRenderer and SoftwareTexture.

use super::*;
use crate::error::Error;
use crate::pixel::PixelFormat;
use crate::renderer::TextureUsage;
use crate::transfer::ReadbackState;

fn rgba_desc(width: u32, height: u32) -> TextureDesc {
    TextureDesc::new_2d(PixelFormat::R8G8B8A8_UNORM, width, height, TextureUsage::SAMPLED)
}

fn renderer() -> SoftwareRenderer {
    SoftwareRenderer::new(Config::default()).unwrap()
}

// ============================================================================
// Creation
// ============================================================================

#[test]
fn test_new_with_default_config() {
    let renderer = renderer();
    assert_eq!(renderer.config().worker_thread_name, "lumen-gpu-queue");
    assert_eq!(renderer.caps().max_texture_dimension, 16384);
    assert!(!renderer.is_device_lost());
}

#[test]
fn test_new_rejects_zero_dimension_limit() {
    let config = Config { max_texture_dimension: 0, ..Config::default() };
    let result = SoftwareRenderer::new(config);
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

#[test]
fn test_new_rejects_non_power_of_two_samples() {
    let config = Config { max_sample_count: 6, ..Config::default() };
    let result = SoftwareRenderer::new(config);
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

#[test]
fn test_create_texture_is_zeroed() {
    let mut renderer = renderer();
    let texture = renderer.create_texture(&rgba_desc(2, 2)).unwrap();
    let data = texture.read_subresource(Subresource::new(0, 0)).unwrap();
    assert_eq!(data, vec![0u8; 16]);
}

#[test]
fn test_memory_budget_out_of_memory() {
    let config = Config { memory_budget_bytes: Some(100), ..Config::default() };
    let mut renderer = SoftwareRenderer::new(config).unwrap();

    // 4x4 RGBA8 = 64 bytes
    let first = renderer.create_texture(&rgba_desc(4, 4)).unwrap();
    let second = renderer.create_texture(&rgba_desc(4, 4));
    assert!(matches!(second, Err(Error::OutOfMemory)));

    first.release();
    assert!(renderer.create_texture(&rgba_desc(4, 4)).is_ok());
}

#[test]
fn test_create_texture_size_overflow() {
    let mut renderer = renderer();
    let desc = TextureDesc {
        format: PixelFormat::R32G32B32A32_SFLOAT,
        kind: crate::renderer::TextureKind::Array { layers: u32::MAX },
        mip_levels: 15,
        ..TextureDesc::new_2d(PixelFormat::R32G32B32A32_SFLOAT, 16384, 16384, TextureUsage::SAMPLED)
    };

    assert!(matches!(renderer.create_texture(&desc), Err(Error::InvalidConfiguration(_))));
    assert_eq!(renderer.stats().live_textures, 0);
    assert!(renderer.create_texture(&rgba_desc(4, 4)).is_ok());
}

#[test]
fn test_memory_budget_rejects_overflowing_total() {
    let config = Config { memory_budget_bytes: Some(u64::MAX), ..Config::default() };
    let mut renderer = SoftwareRenderer::new(config).unwrap();
    let _first = renderer.create_texture(&rgba_desc(4, 4)).unwrap();

    // used + size wraps past u64::MAX
    let device = renderer.device.clone();
    device.memory_used.fetch_add(u64::MAX - 96, Ordering::AcqRel);
    assert!(matches!(renderer.create_texture(&rgba_desc(4, 4)), Err(Error::OutOfMemory)));
    device.memory_used.fetch_sub(u64::MAX - 96, Ordering::AcqRel);
}

#[test]
fn test_new_rejects_zero_layer_limit() {
    let config = Config { max_array_layers: 0, ..Config::default() };
    assert!(matches!(SoftwareRenderer::new(config), Err(Error::InitializationFailed(_))));
}

#[test]
fn test_stats_track_live_textures() {
    let mut renderer = renderer();
    let a = renderer.create_texture(&rgba_desc(4, 4)).unwrap();
    let _b = renderer.create_texture(&rgba_desc(2, 2)).unwrap();
    assert_eq!(renderer.stats().live_textures, 2);
    assert_eq!(renderer.stats().gpu_memory_used, 64 + 16);

    drop(a);
    assert_eq!(renderer.stats().live_textures, 1);
    assert_eq!(renderer.stats().gpu_memory_used, 16);
}

// ============================================================================
// SoftwareTexture
// ============================================================================

#[test]
fn test_texture_write_read_subresource() {
    let mut renderer = renderer();
    let texture = renderer.create_texture(&rgba_desc(1, 1)).unwrap();
    let sub = Subresource::new(0, 0);

    texture.write_subresource(sub, &[1, 2, 3, 4]).unwrap();
    assert_eq!(texture.read_subresource(sub).unwrap(), vec![1, 2, 3, 4]);
}

#[test]
fn test_texture_write_wrong_length() {
    let mut renderer = renderer();
    let texture = renderer.create_texture(&rgba_desc(1, 1)).unwrap();
    let result = texture.write_subresource(Subresource::new(0, 0), &[1, 2]);
    assert!(matches!(result, Err(Error::ShapeMismatch(_))));
}

#[test]
fn test_texture_out_of_range_subresource() {
    let mut renderer = renderer();
    let texture = renderer.create_texture(&rgba_desc(1, 1)).unwrap();
    let result = texture.read_subresource(Subresource::new(0, 1));
    assert!(matches!(result, Err(Error::RangeError(_))));
}

#[test]
fn test_texture_released_storage() {
    let mut renderer = renderer();
    let texture = renderer.create_texture(&rgba_desc(1, 1)).unwrap();

    assert!(!texture.is_released());
    assert!(texture.release());
    assert!(texture.is_released());
    assert!(!texture.release());

    let result = texture.read_subresource(Subresource::new(0, 0));
    assert!(matches!(result, Err(Error::InvalidHandle(_))));
}

// ============================================================================
// GPU queue
// ============================================================================

#[test]
fn test_write_surface_rejects_wrong_length() {
    let mut renderer = renderer();
    let texture = renderer.create_texture(&rgba_desc(2, 2)).unwrap();
    let result = renderer.write_surface(&texture, Subresource::new(0, 0), vec![0; 3]);
    assert!(matches!(result, Err(Error::ShapeMismatch(_))));
}

#[test]
fn test_readback_observes_earlier_writes() {
    let mut renderer = renderer();
    let texture = renderer.create_texture(&rgba_desc(1, 1)).unwrap();
    let sub = Subresource::new(0, 0);

    renderer.write_surface(&texture, sub, vec![10, 20, 30, 40]).unwrap();
    renderer.write_surface(&texture, sub, vec![50, 60, 70, 80]).unwrap();
    let mut readback = renderer.read_surface(&texture, sub).unwrap();

    let surface = readback.wait().unwrap();
    assert_eq!(surface.data(), &[50, 60, 70, 80]);
    assert_eq!(surface.extent(), (1, 1, 1));
    assert_eq!(readback.poll_state(), ReadbackState::Completed);
}

#[test]
fn test_readback_mip_extent() {
    let mut renderer = renderer();
    let mut desc = rgba_desc(8, 4);
    desc.mip_levels = 3;
    let texture = renderer.create_texture(&desc).unwrap();

    let surface = renderer.read_surface(&texture, Subresource::new(0, 2)).unwrap().wait().unwrap();
    assert_eq!(surface.extent(), (2, 1, 1));
}

#[test]
fn test_wait_idle_drains_queue() {
    let mut renderer = renderer();
    let texture = renderer.create_texture(&rgba_desc(1, 1)).unwrap();
    let mut readback = renderer.read_surface(&texture, Subresource::new(0, 0)).unwrap();

    renderer.wait_idle().unwrap();

    assert_eq!(readback.poll_state(), ReadbackState::Completed);
    assert_eq!(renderer.stats().readbacks_completed, 1);
}

#[test]
fn test_device_lost_fails_readback() {
    let mut renderer = renderer();
    let texture = renderer.create_texture(&rgba_desc(1, 1)).unwrap();

    renderer.simulate_device_lost();
    assert!(renderer.is_device_lost());

    let result = renderer.read_surface(&texture, Subresource::new(0, 0)).unwrap().wait();
    assert!(matches!(result, Err(Error::SynchronizationFailure(_))));
    assert_eq!(renderer.stats().readbacks_failed, 1);
}

#[test]
fn test_released_texture_fails_readback() {
    let mut renderer = renderer();
    let texture = renderer.create_texture(&rgba_desc(1, 1)).unwrap();
    texture.release();

    let result = renderer.read_surface(&texture, Subresource::new(0, 0)).unwrap().wait();
    assert!(matches!(result, Err(Error::SynchronizationFailure(_))));
}

#[test]
fn test_drop_drains_pending_readbacks() {
    let mut renderer = renderer();
    let texture = renderer.create_texture(&rgba_desc(1, 1)).unwrap();
    let mut readback = renderer.read_surface(&texture, Subresource::new(0, 0)).unwrap();

    drop(renderer);

    assert!(readback.wait().is_ok());
}
