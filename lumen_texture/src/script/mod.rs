//! Scripting proxy module
//!
//! Thin handle-holding wrappers the scripting layer binds to. Face and mip
//! arguments are always explicit; bindings pass `DEFAULT_FACE` and
//! `DEFAULT_MIP_LEVEL` when the script omits them.

pub mod async_op;
pub mod script_texture;

pub use async_op::AsyncOp;
pub use script_texture::ScriptTexture;

/// Face used when a script does not name one
pub const DEFAULT_FACE: u32 = 0;

/// Mip level used when a script does not name one
pub const DEFAULT_MIP_LEVEL: u32 = 0;
