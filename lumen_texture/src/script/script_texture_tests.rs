/// Tests for ScriptTexture
///
/// The proxy is exercised against a MockRenderer-backed registry; the one
/// test going through the Engine singleton is serialized.

use super::*;
use crate::error::Error;
use crate::renderer::mock_renderer::MockRenderer;
use crate::renderer::Renderer;
use crate::script::{DEFAULT_FACE, DEFAULT_MIP_LEVEL};
use glam::Vec4;
use serial_test::serial;
use std::sync::Mutex;

const RED: Color = Vec4::new(1.0, 0.0, 0.0, 1.0);

// ============================================================================
// Helper Functions
// ============================================================================

fn create_registry() -> (Arc<Mutex<MockRenderer>>, Arc<TextureRegistry>) {
    let mock = Arc::new(Mutex::new(MockRenderer::new()));
    let renderer: Arc<Mutex<dyn Renderer>> = mock.clone();
    (mock, Arc::new(TextureRegistry::new(renderer)))
}

fn rgba_4x4() -> TextureDesc {
    TextureDesc::new_2d(PixelFormat::R8G8B8A8_UNORM, 4, 4, TextureUsage::CPU_CACHED)
}

// ============================================================================
// Shape queries
// ============================================================================

#[test]
fn test_shape_queries_forward_to_resource() {
    let (_mock, registry) = create_registry();
    let desc = TextureDesc {
        format: PixelFormat::R32_SFLOAT,
        width: 16,
        height: 8,
        depth: 1,
        kind: TextureKind::Array { layers: 2 },
        usage: TextureUsage::SAMPLED | TextureUsage::CPU_CACHED,
        sample_count: 1,
        mip_levels: 4,
        gamma_corrected: true,
    };
    let texture = ScriptTexture::create_in(registry, desc).unwrap();

    assert_eq!(texture.pixel_format().unwrap(), PixelFormat::R32_SFLOAT);
    assert_eq!(texture.usage().unwrap(), TextureUsage::SAMPLED | TextureUsage::CPU_CACHED);
    assert_eq!(texture.kind().unwrap(), TextureKind::Array { layers: 2 });
    assert_eq!(texture.width().unwrap(), 16);
    assert_eq!(texture.height().unwrap(), 8);
    assert_eq!(texture.depth().unwrap(), 1);
    assert!(texture.gamma_correction().unwrap());
    assert_eq!(texture.sample_count().unwrap(), 1);
    assert_eq!(texture.mip_map_count().unwrap(), 3);
}

#[test]
fn test_single_level_texture_has_no_mip_maps() {
    let (_mock, registry) = create_registry();
    let texture = ScriptTexture::create_in(registry, rgba_4x4()).unwrap();

    assert_eq!(texture.mip_map_count().unwrap(), 0);
    assert_eq!(texture.width().unwrap(), 4);
    assert_eq!(texture.height().unwrap(), 4);
}

#[test]
fn test_create_invalid_configuration() {
    let (_mock, registry) = create_registry();
    let mut desc = rgba_4x4();
    desc.width = 0;

    let result = ScriptTexture::create_in(registry.clone(), desc);
    assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    assert_eq!(registry.texture_count(), 0);
}

// ============================================================================
// Pixel access
// ============================================================================

#[test]
fn test_set_colors_then_get_pixels() {
    let (_mock, registry) = create_registry();
    let texture = ScriptTexture::create_in(registry, rgba_4x4()).unwrap();

    texture.set_pixel_colors(&[RED; 16], DEFAULT_FACE, DEFAULT_MIP_LEVEL).unwrap();

    let surface = texture.get_pixels(DEFAULT_FACE, DEFAULT_MIP_LEVEL).unwrap();
    assert!(surface.colors().iter().all(|c| *c == RED));
}

#[test]
fn test_set_pixels_surface() {
    let (_mock, registry) = create_registry();
    let texture = ScriptTexture::create_in(registry, rgba_4x4()).unwrap();
    let mut surface = Surface::new_zeroed(4, 4, 1, PixelFormat::R8G8B8A8_UNORM);
    surface.set_color_at(3, 3, 0, RED).unwrap();

    texture.set_pixels(&surface, 0, 0).unwrap();
    assert_eq!(texture.get_pixels(0, 0).unwrap(), surface);
}

#[test]
fn test_get_gpu_pixels_returns_async_op() {
    let (mock, registry) = create_registry();
    let texture = ScriptTexture::create_in(registry, rgba_4x4()).unwrap();

    let op = texture.get_gpu_pixels(DEFAULT_FACE, DEFAULT_MIP_LEVEL).unwrap();
    assert!(!op.is_complete());

    mock.lock().unwrap().flush();
    assert!(op.is_complete());
    assert_eq!(op.return_value().unwrap().extent(), (4, 4, 1));
}

#[test]
fn test_errors_propagate_from_transfer() {
    let (_mock, registry) = create_registry();
    let texture = ScriptTexture::create_in(registry, rgba_4x4()).unwrap();

    assert!(matches!(texture.get_pixels(0, 1), Err(Error::RangeError(_))));
    assert!(matches!(texture.set_pixel_colors(&[RED; 3], 0, 0), Err(Error::ShapeMismatch(_))));
}

// ============================================================================
// Handle lifetime
// ============================================================================

#[test]
fn test_destroy_invalidates_every_operation() {
    let (_mock, registry) = create_registry();
    let texture = ScriptTexture::create_in(registry, rgba_4x4()).unwrap();
    let twin = texture.clone();

    texture.destroy().unwrap();

    assert!(!texture.is_valid());
    assert!(!twin.is_valid());
    assert!(matches!(texture.width(), Err(Error::InvalidHandle(_))));
    assert!(matches!(texture.pixel_format(), Err(Error::InvalidHandle(_))));
    assert!(matches!(texture.mip_map_count(), Err(Error::InvalidHandle(_))));
    assert!(matches!(twin.get_pixels(0, 0), Err(Error::InvalidHandle(_))));
    assert!(matches!(twin.get_gpu_pixels(0, 0), Err(Error::InvalidHandle(_))));
    assert!(matches!(twin.set_pixel_colors(&[RED; 16], 0, 0), Err(Error::InvalidHandle(_))));
    assert!(matches!(texture.destroy(), Err(Error::InvalidHandle(_))));
}

#[test]
fn test_clone_retains_and_drop_releases() {
    let (_mock, registry) = create_registry();
    let texture = ScriptTexture::create_in(registry.clone(), rgba_4x4()).unwrap();
    let handle = texture.handle();

    let twin = texture.clone();
    assert_eq!(registry.ref_count(handle).unwrap(), 2);

    drop(texture);
    assert_eq!(registry.ref_count(handle).unwrap(), 1);
    assert!(twin.is_valid());

    drop(twin);
    assert!(!registry.contains(handle));
}

#[test]
fn test_last_drop_frees_gpu_memory() {
    let (mock, registry) = create_registry();
    let texture = ScriptTexture::create_in(registry, rgba_4x4()).unwrap();
    assert_eq!(mock.lock().unwrap().stats().live_textures, 1);

    drop(texture);
    assert_eq!(mock.lock().unwrap().stats().live_textures, 0);
}

#[test]
fn test_from_raw_handle() {
    let (_mock, registry) = create_registry();
    let texture = ScriptTexture::create_in(registry.clone(), rgba_4x4()).unwrap();

    let attached = ScriptTexture::from_raw_handle(registry.clone(), texture.raw_handle()).unwrap();
    assert_eq!(attached.handle(), texture.handle());
    assert_eq!(registry.ref_count(texture.handle()).unwrap(), 2);

    let unknown = ScriptTexture::from_raw_handle(registry, 0);
    assert!(matches!(unknown, Err(Error::InvalidHandle(_))));
}

// ============================================================================
// Engine singleton
// ============================================================================

#[test]
#[serial]
fn test_create_through_engine() {
    Engine::reset_for_testing();
    Engine::initialize().unwrap();
    assert!(matches!(ScriptTexture::create(rgba_4x4()), Err(Error::InitializationFailed(_))));

    Engine::create_renderer(MockRenderer::new()).unwrap();
    Engine::create_texture_registry().unwrap();

    let texture = ScriptTexture::create(rgba_4x4()).unwrap();
    assert!(Engine::texture_registry().unwrap().contains(texture.handle()));

    Engine::shutdown();
    assert!(!texture.is_valid());
    assert!(matches!(texture.width(), Err(Error::InvalidHandle(_))));
}
