/// Pixel transfer protocol
///
/// Synchronous access goes through the texture's CPU cache (CPU_CACHED
/// textures only). Asynchronous access queues a GPU readback and returns a
/// `PendingReadback` without blocking. Uploads go to the GPU queue and, when
/// the texture is cached, replace the cached surface as well.

use std::sync::MutexGuard;

use crate::error::Result;
use crate::pixel::{Color, Surface};
use crate::renderer::{Renderer, Subresource};
use crate::resource::Texture;
use crate::transfer::PendingReadback;
use crate::{engine_bail, engine_err};

const SOURCE: &str = "lumen::PixelTransfer";

fn lock_renderer(texture: &Texture) -> Result<MutexGuard<'_, dyn Renderer + 'static>> {
    texture.renderer().lock()
        .map_err(|_| engine_err!(SOURCE, "Renderer lock poisoned"))
}

/// Cached system-memory copy of one surface.
///
/// Does not reflect GPU writes made since the cache was last refreshed.
///
/// # Errors
///
/// * `InvalidHandle` - texture destroyed
/// * `UsageError` - texture not created with CPU_CACHED usage
/// * `RangeError` - face or mip out of bounds
pub fn get_pixels(texture: &Texture, face: u32, mip: u32) -> Result<Surface> {
    texture.ensure_alive()?;
    if !texture.is_cpu_cached() {
        engine_bail!(SOURCE, UsageError,
            "get_pixels needs CPU_CACHED usage, texture has {:?}", texture.usage());
    }
    let subresource = texture.subresource(face, mip)?;
    texture.cached_surface(subresource)
}

/// Write a surface into one (face, mip) slot.
///
/// The surface is converted to the texture's format if needed. On error the
/// slot keeps its previous contents.
///
/// # Errors
///
/// * `InvalidHandle` - texture destroyed
/// * `RangeError` - face or mip out of bounds
/// * `UsageError` - texture is multisampled
/// * `ShapeMismatch` - surface extent differs from the mip level's extent
pub fn set_pixels(texture: &Texture, surface: &Surface, face: u32, mip: u32) -> Result<()> {
    texture.ensure_alive()?;
    let subresource = texture.subresource(face, mip)?;
    if texture.is_multisampled() {
        engine_bail!(SOURCE, UsageError,
            "cannot upload to multisampled texture ({} samples)", texture.sample_count());
    }
    let expected = texture.desc().mip_extent(mip);
    if surface.extent() != expected {
        engine_bail!(SOURCE, ShapeMismatch,
            "{} expects {:?}, got {:?}", subresource, expected, surface.extent());
    }

    let surface = if surface.format() == texture.format() {
        surface.clone()
    } else {
        surface.convert(texture.format())
    };
    upload(texture, subresource, surface)
}

/// Write a flat colour array into one (face, mip) slot, converting to the
/// texture's pixel format.
///
/// # Errors
///
/// As `set_pixels`; `ShapeMismatch` if `colors.len()` is not
/// width x height x depth of the mip level.
pub fn set_pixel_colors(texture: &Texture, colors: &[Color], face: u32, mip: u32) -> Result<()> {
    texture.ensure_alive()?;
    let subresource = texture.subresource(face, mip)?;
    if texture.is_multisampled() {
        engine_bail!(SOURCE, UsageError,
            "cannot upload to multisampled texture ({} samples)", texture.sample_count());
    }
    let (width, height, depth) = texture.desc().mip_extent(mip);
    let surface = Surface::from_colors(width, height, depth, texture.format(), colors)?;
    upload(texture, subresource, surface)
}

fn upload(texture: &Texture, subresource: Subresource, surface: Surface) -> Result<()> {
    lock_renderer(texture)?
        .write_surface(texture.gpu_texture(), subresource, surface.data().to_vec())?;
    if texture.is_cpu_cached() {
        texture.store_cached(subresource, surface)?;
    }
    crate::engine_trace!(SOURCE, "Uploaded {}", subresource);
    Ok(())
}

/// Queue a GPU readback of one (face, mip) slot. Never blocks.
///
/// The readback observes every write to the same surface issued before it.
/// Failures that happen on the GPU timeline (device loss, texture destroyed
/// while queued) surface through the returned `PendingReadback`.
///
/// # Errors
///
/// * `InvalidHandle` - texture destroyed
/// * `RangeError` - face or mip out of bounds
/// * `UsageError` - texture is multisampled
pub fn get_gpu_pixels(texture: &Texture, face: u32, mip: u32) -> Result<PendingReadback> {
    texture.ensure_alive()?;
    let subresource = texture.subresource(face, mip)?;
    if texture.is_multisampled() {
        engine_bail!(SOURCE, UsageError,
            "cannot read back multisampled texture ({} samples)", texture.sample_count());
    }
    let pending = lock_renderer(texture)?
        .read_surface(texture.gpu_texture(), subresource)?;
    crate::engine_trace!(SOURCE, "Queued readback of {}", subresource);
    Ok(pending)
}

/// Copy one surface to another on the GPU timeline.
///
/// Both textures must belong to the same renderer and the two slots must have
/// the same extent and format. A CPU-cached destination is refreshed from the
/// source's cache when the source is cached too.
pub fn copy_surface(
    src: &Texture,
    src_face: u32,
    src_mip: u32,
    dst: &Texture,
    dst_face: u32,
    dst_mip: u32,
) -> Result<()> {
    src.ensure_alive()?;
    dst.ensure_alive()?;
    let src_sub = src.subresource(src_face, src_mip)?;
    let dst_sub = dst.subresource(dst_face, dst_mip)?;

    if !std::sync::Arc::ptr_eq(src.renderer(), dst.renderer()) {
        engine_bail!(SOURCE, UsageError, "cannot copy between textures of different renderers");
    }
    if dst.is_multisampled() {
        engine_bail!(SOURCE, UsageError, "cannot copy into multisampled texture");
    }
    if src.format() != dst.format() {
        engine_bail!(SOURCE, ShapeMismatch,
            "format {:?} does not match {:?}", src.format(), dst.format());
    }
    let src_extent = src.desc().mip_extent(src_mip);
    let dst_extent = dst.desc().mip_extent(dst_mip);
    if src_extent != dst_extent {
        engine_bail!(SOURCE, ShapeMismatch,
            "source {} is {:?}, destination {} is {:?}", src_sub, src_extent, dst_sub, dst_extent);
    }

    lock_renderer(src)?.copy_surface(src.gpu_texture(), src_sub, dst.gpu_texture(), dst_sub)?;

    if dst.is_cpu_cached() {
        if src.is_cpu_cached() {
            dst.store_cached(dst_sub, src.cached_surface(src_sub)?)?;
        } else {
            crate::engine_warn!(SOURCE,
                "Destination cache for {} not refreshed: source is not CPU cached", dst_sub);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "pixel_transfer_tests.rs"]
mod tests;
