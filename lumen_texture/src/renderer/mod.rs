/// Renderer module - backend traits, texture shape types and the software backend

// Module declarations
pub mod renderer;
pub mod renderer_texture;
pub mod software_renderer;

#[cfg(test)]
pub mod mock_renderer;

// Re-export everything from renderer.rs
pub use renderer::*;

// Re-export from other modules
pub use renderer_texture::*;
pub use software_renderer::{SoftwareRenderer, SoftwareTexture};
