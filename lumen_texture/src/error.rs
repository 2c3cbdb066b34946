//! Error types for the Lumen texture core
//!
//! Every failure a texture operation can report is one variant of [`Error`].
//! All variants except `SynchronizationFailure` are reported synchronously by
//! the call that violates the contract; `SynchronizationFailure` surfaces
//! through a pending readback.

use std::fmt;

/// Result type for Lumen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Lumen texture errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Bad creation parameters (the resource was not created)
    InvalidConfiguration(String),

    /// Operation on a destroyed or unknown resource
    InvalidHandle(String),

    /// Mip level, face or texel index out of bounds
    RangeError(String),

    /// Supplied pixel data does not match the target slot
    ShapeMismatch(String),

    /// Operation requires a usage capability the resource lacks
    UsageError(String),

    /// Asynchronous readback could not complete (device lost, resource destroyed)
    SynchronizationFailure(String),

    /// Backend-specific error (poisoned locks, closed command queue, ...)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Initialization failed (engine, renderer, registry)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::InvalidHandle(msg) => write!(f, "Invalid handle: {}", msg),
            Error::RangeError(msg) => write!(f, "Range error: {}", msg),
            Error::ShapeMismatch(msg) => write!(f, "Shape mismatch: {}", msg),
            Error::UsageError(msg) => write!(f, "Usage error: {}", msg),
            Error::SynchronizationFailure(msg) => write!(f, "Synchronization failure: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Short name of the variant, used in log lines and by script bindings
    pub fn kind_name(&self) -> &'static str {
        match self {
            Error::InvalidConfiguration(_) => "InvalidConfiguration",
            Error::InvalidHandle(_) => "InvalidHandle",
            Error::RangeError(_) => "RangeError",
            Error::ShapeMismatch(_) => "ShapeMismatch",
            Error::UsageError(_) => "UsageError",
            Error::SynchronizationFailure(_) => "SynchronizationFailure",
            Error::BackendError(_) => "BackendError",
            Error::OutOfMemory => "OutOfMemory",
            Error::InitializationFailed(_) => "InitializationFailed",
        }
    }
}

// ===== ERROR MACROS =====

/// Build an [`Error`], logging it at ERROR severity first.
///
/// The variant defaults to `BackendError`; pass a variant name to pick another.
///
/// ```ignore
/// let err = engine_err!("lumen::Texture", RangeError, "mip {} out of range", mip);
/// let err = engine_err!("lumen::Texture", "queue closed");
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $kind:ident, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::lumen::Error::$kind(message)
    }};
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::lumen::Error::BackendError(message)
    }};
}

/// Log an error and return it from the enclosing function.
///
/// Same forms as [`engine_err!`].
#[macro_export]
macro_rules! engine_bail {
    ($($arg:tt)*) => {
        return Err($crate::engine_err!($($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
