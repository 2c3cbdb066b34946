/*!
# Lumen Texture

Handle-based GPU texture resources for a scripting layer.

A texture is created through a registry and referred to by an opaque handle.
Pixel data is read either synchronously from a CPU-side cache or
asynchronously through a GPU readback that returns a pollable future.

## Architecture

- **Renderer**: Backend trait that allocates texture storage and runs transfers
  on an ordered GPU queue (`SoftwareRenderer` is the CPU-emulated backend)
- **Texture**: Immutable shape, GPU storage and optional CPU cache
- **TextureRegistry**: Handle to texture indirection with reference counting
- **transfer**: Synchronous get/set and asynchronous readback
- **ScriptTexture**: Proxy holding only a handle, forwarding every call
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod pixel;
pub mod renderer;
pub mod resource;
pub mod transfer;
pub mod script;

// Main lumen namespace module
pub mod lumen {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Renderer factory trait
    pub use crate::renderer::Renderer;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, format_entry};
    }

    // Pixel formats and surfaces
    pub mod pixel {
        pub use crate::pixel::*;
    }

    // Render sub-module with backend traits and shape types
    pub mod render {
        pub use crate::renderer::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Pixel transfer sub-module
    pub mod transfer {
        pub use crate::transfer::*;
    }

    // Scripting proxy sub-module
    pub mod script {
        pub use crate::script::*;
    }
}

// Re-export math library at crate root
pub use glam;
