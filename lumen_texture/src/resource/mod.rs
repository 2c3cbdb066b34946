//! Resource module
//!
//! Native texture resources and the handle registry that owns them.

pub mod texture;
pub mod texture_registry;

pub use texture::{validate_desc, Texture};
pub use texture_registry::{TextureHandle, TextureRegistry};
