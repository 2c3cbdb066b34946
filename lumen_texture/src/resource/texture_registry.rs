/// Texture registry - maps opaque handles to live textures
///
/// Every texture operation goes through `resolve`, which turns a handle into
/// an `Arc<Texture>` under a short read lock. Handles are slotmap keys, so a
/// handle whose texture was destroyed never resolves again, even after the
/// slot is reused.
///
/// Entries are reference counted: `create` starts at 1, `retain`/`release`
/// adjust the count and the texture is destroyed when it reaches zero.
/// `destroy` ends the texture immediately regardless of the count.

use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use slotmap::{new_key_type, Key, KeyData, SlotMap};

use crate::error::Result;
use crate::renderer::{Renderer, TextureDesc};
use crate::resource::Texture;
use crate::{engine_bail, engine_err};

new_key_type! {
    /// Opaque texture handle, unique for the lifetime of its texture
    pub struct TextureHandle;
}

impl TextureHandle {
    /// Integer form passed across the scripting boundary
    pub fn to_raw(self) -> u64 {
        self.data().as_ffi()
    }

    /// Rebuild a handle from `to_raw` output. Unknown values simply fail to resolve.
    pub fn from_raw(raw: u64) -> Self {
        KeyData::from_ffi(raw).into()
    }
}

struct TextureEntry {
    texture: Arc<Texture>,
    ref_count: u32,
}

/// Handle registry for textures of one renderer
pub struct TextureRegistry {
    renderer: Arc<Mutex<dyn Renderer>>,
    entries: RwLock<SlotMap<TextureHandle, TextureEntry>>,
}

impl TextureRegistry {
    /// Create an empty registry allocating through `renderer`
    pub fn new(renderer: Arc<Mutex<dyn Renderer>>) -> Self {
        Self {
            renderer,
            entries: RwLock::new(SlotMap::with_key()),
        }
    }

    pub fn renderer(&self) -> &Arc<Mutex<dyn Renderer>> {
        &self.renderer
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, SlotMap<TextureHandle, TextureEntry>>> {
        self.entries.read()
            .map_err(|_| engine_err!("lumen::TextureRegistry", "Registry lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, SlotMap<TextureHandle, TextureEntry>>> {
        self.entries.write()
            .map_err(|_| engine_err!("lumen::TextureRegistry", "Registry lock poisoned"))
    }

    fn unknown(handle: TextureHandle) -> crate::error::Error {
        engine_err!("lumen::TextureRegistry", InvalidHandle,
            "unknown or destroyed texture handle {:#x}", handle.to_raw())
    }

    // ===== CREATION =====

    /// Create a texture and register it with a reference count of 1
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if the descriptor is invalid for the renderer,
    /// or a backend error (e.g. `OutOfMemory`) from allocation.
    pub fn create(&self, desc: TextureDesc) -> Result<TextureHandle> {
        // Allocate outside the registry lock
        let texture = Arc::new(Texture::create(self.renderer.clone(), desc)?);
        let handle = self.write()?.insert(TextureEntry { texture, ref_count: 1 });
        crate::engine_debug!("lumen::TextureRegistry",
            "Created texture {:#x}", handle.to_raw());
        Ok(handle)
    }

    // ===== LOOKUP =====

    /// Resolve a handle to its live texture
    ///
    /// # Errors
    ///
    /// `InvalidHandle` if the handle was never issued or its texture is destroyed.
    pub fn resolve(&self, handle: TextureHandle) -> Result<Arc<Texture>> {
        let texture = self.read()?
            .get(handle)
            .map(|entry| entry.texture.clone())
            .ok_or_else(|| Self::unknown(handle))?;
        texture.ensure_alive()?;
        Ok(texture)
    }

    pub fn contains(&self, handle: TextureHandle) -> bool {
        self.read()
            .map(|entries| entries.contains_key(handle))
            .unwrap_or(false)
    }

    pub fn ref_count(&self, handle: TextureHandle) -> Result<u32> {
        self.read()?
            .get(handle)
            .map(|entry| entry.ref_count)
            .ok_or_else(|| Self::unknown(handle))
    }

    pub fn texture_count(&self) -> usize {
        self.read().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Handles of every live texture
    pub fn handles(&self) -> Vec<TextureHandle> {
        self.read()
            .map(|entries| entries.keys().collect())
            .unwrap_or_default()
    }

    // ===== REFERENCE COUNTING =====

    /// Add a reference, returns the new count
    pub fn retain(&self, handle: TextureHandle) -> Result<u32> {
        let mut entries = self.write()?;
        let entry = entries.get_mut(handle).ok_or_else(|| Self::unknown(handle))?;
        entry.ref_count += 1;
        Ok(entry.ref_count)
    }

    /// Drop a reference, destroying the texture when none remain.
    /// Returns the remaining count.
    pub fn release(&self, handle: TextureHandle) -> Result<u32> {
        let removed = {
            let mut entries = self.write()?;
            let entry = entries.get_mut(handle).ok_or_else(|| Self::unknown(handle))?;
            entry.ref_count -= 1;
            if entry.ref_count > 0 {
                return Ok(entry.ref_count);
            }
            entries.remove(handle)
        };
        if let Some(entry) = removed {
            entry.texture.destroy();
            crate::engine_debug!("lumen::TextureRegistry",
                "Last reference released, destroyed texture {:#x}", handle.to_raw());
        }
        Ok(0)
    }

    // ===== DESTRUCTION =====

    /// Destroy a texture now, whatever its reference count.
    ///
    /// The handle stops resolving and queued readbacks of the texture fail.
    pub fn destroy(&self, handle: TextureHandle) -> Result<()> {
        let entry = self.write()?.remove(handle);
        let Some(entry) = entry else {
            engine_bail!("lumen::TextureRegistry", InvalidHandle,
                "cannot destroy unknown texture handle {:#x}", handle.to_raw());
        };
        entry.texture.destroy();
        crate::engine_debug!("lumen::TextureRegistry",
            "Destroyed texture {:#x} ({} references dropped)", handle.to_raw(), entry.ref_count);
        Ok(())
    }

    /// Destroy every texture
    pub fn clear(&self) -> Result<()> {
        let drained: Vec<TextureEntry> = self.write()?.drain().map(|(_, entry)| entry).collect();
        if !drained.is_empty() {
            crate::engine_info!("lumen::TextureRegistry", "Destroying {} textures", drained.len());
        }
        for entry in drained {
            entry.texture.destroy();
        }
        Ok(())
    }
}

impl Drop for TextureRegistry {
    fn drop(&mut self) {
        let entries = match self.entries.get_mut() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        for (_, entry) in entries.drain() {
            entry.texture.destroy();
        }
    }
}

#[cfg(test)]
#[path = "texture_registry_tests.rs"]
mod tests;
