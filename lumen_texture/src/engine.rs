/// Lumen Engine - Singleton manager for the texture subsystems
///
/// Holds the global renderer, the global texture registry and the logger in
/// thread-safe static storage. The scripting proxy resolves its registry
/// through here when it is not given one explicitly.

use std::sync::{OnceLock, RwLock, Arc, Mutex};
use std::time::SystemTime;
use crate::renderer::Renderer;
use crate::resource::TextureRegistry;
use crate::error::{Result, Error};
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

// ===== INTERNAL STATE =====

/// Global engine state storage
static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Internal state structure holding all engine singletons
struct EngineState {
    /// Renderer singleton (wrapped in Mutex for thread-safe mutable access)
    renderer: RwLock<Option<Arc<Mutex<dyn Renderer>>>>,
    /// Texture registry singleton (internally synchronized)
    texture_registry: RwLock<Option<Arc<TextureRegistry>>>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            renderer: RwLock::new(None),
            texture_registry: RwLock::new(None),
        }
    }
}

// ===== PUBLIC API =====

/// Main engine singleton manager
///
/// # Example
///
/// ```no_run
/// use lumen_texture::lumen::Engine;
/// use lumen_texture::lumen::render::{Config, SoftwareRenderer};
///
/// Engine::initialize()?;
/// Engine::create_renderer(SoftwareRenderer::new(Config::default())?)?;
/// Engine::create_texture_registry()?;
///
/// let registry = Engine::texture_registry()?;
/// // Create textures through the registry or ScriptTexture::create...
///
/// Engine::shutdown();
/// # Ok::<(), lumen_texture::lumen::Error>(())
/// ```
pub struct Engine;

impl Engine {
    /// Helper to log errors before returning them (internal use)
    fn log_and_return_error(error: Error) -> Error {
        match &error {
            Error::InitializationFailed(msg) => {
                crate::engine_error!("lumen::Engine", "Initialization failed: {}", msg);
            }
            Error::BackendError(msg) => {
                crate::engine_error!("lumen::Engine", "Backend error: {}", msg);
            }
            _ => {
                crate::engine_error!("lumen::Engine", "Engine error: {}", error);
            }
        }
        error
    }

    fn state() -> Result<&'static EngineState> {
        ENGINE_STATE.get()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InitializationFailed("Engine not initialized. Call Engine::initialize() first.".to_string())
            ))
    }

    /// Initialize the engine
    ///
    /// Must be called once before creating any subsystem. Calling it again is a no-op.
    pub fn initialize() -> Result<()> {
        ENGINE_STATE.get_or_init(EngineState::new);
        Ok(())
    }

    /// Shutdown the engine and destroy all singletons
    ///
    /// Every registered texture is destroyed before the renderer is dropped;
    /// proxies still holding handles will get `InvalidHandle` from then on.
    pub fn shutdown() {
        if let Some(state) = ENGINE_STATE.get() {
            // Registry BEFORE renderer (textures reference GPU storage)
            if let Ok(mut registry) = state.texture_registry.write() {
                if let Some(registry) = registry.take() {
                    if let Err(e) = registry.clear() {
                        crate::engine_warn!("lumen::Engine", "Texture registry cleanup failed: {}", e);
                    }
                }
            }
            if let Ok(mut renderer) = state.renderer.write() {
                *renderer = None;
            }
        }
    }

    // ===== RENDERER API =====

    /// Create and register the renderer singleton
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The engine is not initialized
    /// - A renderer already exists
    /// - The renderer lock is poisoned
    pub fn create_renderer<R: Renderer + 'static>(renderer: R) -> Result<()> {
        let arc_renderer: Arc<Mutex<dyn Renderer>> = Arc::new(Mutex::new(renderer));
        Self::register_renderer(arc_renderer)?;
        crate::engine_info!("lumen::Engine", "Renderer singleton created successfully");
        Ok(())
    }

    /// Register an already shared renderer as the singleton
    pub(crate) fn register_renderer(renderer: Arc<Mutex<dyn Renderer>>) -> Result<()> {
        let state = Self::state()?;
        let mut lock = state.renderer.write()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("Renderer lock poisoned".to_string())
            ))?;

        if lock.is_some() {
            return Err(Self::log_and_return_error(
                Error::InitializationFailed("Renderer already exists. Call Engine::destroy_renderer() first.".to_string())
            ));
        }

        *lock = Some(renderer);
        Ok(())
    }

    /// Get the renderer singleton
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is not initialized or no renderer exists.
    pub fn renderer() -> Result<Arc<Mutex<dyn Renderer>>> {
        let state = Self::state()?;
        let lock = state.renderer.read()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("Renderer lock poisoned".to_string())
            ))?;

        lock.clone()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InitializationFailed("Renderer not created. Call Engine::create_renderer() first.".to_string())
            ))
    }

    /// Destroy the renderer singleton
    ///
    /// Existing references (held by textures and registries) stay valid until dropped.
    pub fn destroy_renderer() -> Result<()> {
        let state = Self::state()?;
        let mut lock = state.renderer.write()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("Renderer lock poisoned".to_string())
            ))?;

        *lock = None;
        crate::engine_info!("lumen::Engine", "Renderer singleton destroyed");
        Ok(())
    }

    // ===== TEXTURE REGISTRY API =====

    /// Create the texture registry singleton on top of the renderer singleton
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The engine is not initialized
    /// - No renderer exists
    /// - A texture registry already exists
    pub fn create_texture_registry() -> Result<()> {
        let renderer = Self::renderer()?;
        let state = Self::state()?;
        let mut lock = state.texture_registry.write()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("TextureRegistry lock poisoned".to_string())
            ))?;

        if lock.is_some() {
            return Err(Self::log_and_return_error(
                Error::InitializationFailed("TextureRegistry already exists. Call Engine::destroy_texture_registry() first.".to_string())
            ));
        }

        *lock = Some(Arc::new(TextureRegistry::new(renderer)));
        crate::engine_info!("lumen::Engine", "TextureRegistry singleton created successfully");
        Ok(())
    }

    /// Get the texture registry singleton
    pub fn texture_registry() -> Result<Arc<TextureRegistry>> {
        let state = Self::state()?;
        let lock = state.texture_registry.read()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("TextureRegistry lock poisoned".to_string())
            ))?;

        lock.clone()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InitializationFailed("TextureRegistry not created. Call Engine::create_texture_registry() first.".to_string())
            ))
    }

    /// Destroy the texture registry singleton and every texture in it
    pub fn destroy_texture_registry() -> Result<()> {
        let state = Self::state()?;
        let registry = state.texture_registry.write()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("TextureRegistry lock poisoned".to_string())
            ))?
            .take();

        if let Some(registry) = registry {
            registry.clear()?;
        }
        crate::engine_info!("lumen::Engine", "TextureRegistry singleton destroyed");
        Ok(())
    }

    /// Reset all singletons for testing (only available in test builds)
    #[cfg(test)]
    pub fn reset_for_testing() {
        Self::shutdown();
    }

    // ===== LOGGING API =====

    /// Replace the default logger with a custom implementation
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Internal logging method with file:line information (for ERROR logs)
    ///
    /// Used by engine_error! macro to include source location.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
