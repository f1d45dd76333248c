/// Plugin-wide singleton registry
///
/// Holds the subsystems shared by every scene of the plug-in: the logger and
/// the render manager (which owns the render-manager lock). Uses thread-safe
/// static storage with RwLock for safe concurrent access.

use std::sync::{Arc, OnceLock, RwLock};
use std::time::SystemTime;
use crate::error::{Error, Result};
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use crate::scene::RenderManager;

// ===== INTERNAL STATE =====

/// Global plug-in state storage
static PLUGIN_STATE: OnceLock<PluginState> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Internal state structure holding all plug-in singletons
struct PluginState {
    render_manager: RwLock<Option<Arc<RenderManager>>>,
}

impl PluginState {
    fn new() -> Self {
        Self {
            render_manager: RwLock::new(None),
        }
    }
}

// ===== PUBLIC API =====

/// Plug-in singleton manager
///
/// # Example
///
/// ```no_run
/// use chargen_scene::chargen::{Plugin, scene::RenderManager};
///
/// Plugin::initialize()?;
/// Plugin::create_render_manager(RenderManager::new())?;
///
/// let manager = Plugin::render_manager()?;
/// // Pass `&manager` to NifScene::setup / NifScene::release ...
///
/// Plugin::shutdown();
/// # Ok::<(), chargen_scene::chargen::Error>(())
/// ```
pub struct Plugin;

impl Plugin {
    /// Log errors before returning them
    fn log_and_return_error(error: Error) -> Error {
        crate::scene_error!("chargen::Plugin", "{}", error);
        error
    }

    /// Initialize the plug-in state
    ///
    /// Idempotent. Must be called before creating any subsystem.
    pub fn initialize() -> Result<()> {
        PLUGIN_STATE.get_or_init(PluginState::new);
        Ok(())
    }

    /// Destroy all singletons
    ///
    /// Scenes still holding an `Arc<RenderManager>` keep it alive until they drop it.
    pub fn shutdown() {
        if let Some(state) = PLUGIN_STATE.get() {
            if let Ok(mut manager) = state.render_manager.write() {
                *manager = None;
            }
        }
    }

    // ===== RENDER MANAGER API =====

    /// Register the render manager singleton
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The plug-in is not initialized
    /// - A render manager already exists
    /// - The render manager slot is poisoned
    pub fn create_render_manager(manager: RenderManager) -> Result<Arc<RenderManager>> {
        let state = PLUGIN_STATE.get()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InvalidState("Plugin not initialized. Call Plugin::initialize() first.".to_string())
            ))?;

        let mut lock = state.render_manager.write()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("RenderManager slot poisoned".to_string())
            ))?;

        if lock.is_some() {
            return Err(Self::log_and_return_error(
                Error::InvalidState("RenderManager already exists. Call Plugin::destroy_render_manager() first.".to_string())
            ));
        }

        let manager = Arc::new(manager);
        *lock = Some(Arc::clone(&manager));

        crate::scene_info!("chargen::Plugin", "RenderManager singleton created");

        Ok(manager)
    }

    /// Get the render manager singleton
    ///
    /// # Errors
    ///
    /// Returns an error if the plug-in is not initialized or no render
    /// manager has been created.
    pub fn render_manager() -> Result<Arc<RenderManager>> {
        let state = PLUGIN_STATE.get()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InvalidState("Plugin not initialized. Call Plugin::initialize() first.".to_string())
            ))?;

        let lock = state.render_manager.read()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("RenderManager slot poisoned".to_string())
            ))?;

        lock.clone()
            .ok_or_else(|| Self::log_and_return_error(
                Error::CollaboratorUnavailable("RenderManager not created. Call Plugin::create_render_manager() first.".to_string())
            ))
    }

    /// Destroy the render manager singleton
    pub fn destroy_render_manager() -> Result<()> {
        let state = PLUGIN_STATE.get()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InvalidState("Plugin not initialized".to_string())
            ))?;

        let mut lock = state.render_manager.write()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("RenderManager slot poisoned".to_string())
            ))?;

        *lock = None;

        crate::scene_info!("chargen::Plugin", "RenderManager singleton destroyed");

        Ok(())
    }

    /// Reset all singletons for testing
    #[cfg(test)]
    pub fn reset_for_testing() {
        if let Some(state) = PLUGIN_STATE.get() {
            if let Ok(mut manager) = state.render_manager.write() {
                *manager = None;
            }
        }
    }

    // ===== LOGGING API =====

    /// Replace the logger
    ///
    /// ```no_run
    /// use chargen_scene::chargen::{Plugin, log::{Logger, LogEntry}};
    ///
    /// struct GameLogLogger;
    /// impl Logger for GameLogLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         // Forward to the host log file...
    ///     }
    /// }
    ///
    /// Plugin::set_logger(GameLogLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to DefaultLogger
    pub fn reset_logger() {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Log without file:line (used by scene_trace! .. scene_warn!)
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

    /// Log with file:line (used by scene_error!)
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
#[path = "plugin_tests.rs"]
mod tests;
