/// Render manager: shared context for scene lifecycle operations.
///
/// Owns the process-wide render-manager lock plus the collaborators every
/// scene needs at setup time (image loader, resource file system). GPU
/// object creation and destruction happen under this lock; per-frame
/// rendering does not take it.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use crate::error::{Error, Result};
use super::image_loader::ImageLoader;
use super::resource_stream::ResourceFileSystem;

/// Render manager shared by every scene of the plug-in
pub struct RenderManager {
    lock: Mutex<()>,
    image_loader: Option<Arc<dyn ImageLoader>>,
    file_system: Option<Arc<dyn ResourceFileSystem>>,
}

impl RenderManager {
    /// Render manager with no collaborators attached
    pub fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            image_loader: None,
            file_system: None,
        }
    }

    /// Attach the UI image loader
    pub fn with_image_loader(mut self, loader: Arc<dyn ImageLoader>) -> Self {
        self.image_loader = Some(loader);
        self
    }

    /// Attach the resource file system
    pub fn with_file_system(mut self, file_system: Arc<dyn ResourceFileSystem>) -> Self {
        self.file_system = Some(file_system);
        self
    }

    pub fn image_loader(&self) -> Option<&Arc<dyn ImageLoader>> {
        self.image_loader.as_ref()
    }

    pub fn file_system(&self) -> Option<&Arc<dyn ResourceFileSystem>> {
        self.file_system.as_ref()
    }

    /// Acquire the render-manager lock for the guard's lifetime
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if a previous holder panicked.
    pub fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock.lock().map_err(|_| {
            let error = Error::BackendError("Render manager lock poisoned".to_string());
            crate::scene_error!("chargen::RenderManager", "{}", error);
            error
        })
    }

    /// Acquire the lock even if poisoned (teardown paths must always run)
    pub(crate) fn lock_for_teardown(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True if some thread currently holds the lock
    pub fn is_locked(&self) -> bool {
        matches!(self.lock.try_lock(), Err(TryLockError::WouldBlock))
    }
}

impl Default for RenderManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RenderManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderManager")
            .field("locked", &self.is_locked())
            .field("image_loader", &self.image_loader.is_some())
            .field("file_system", &self.file_system.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "render_manager_tests.rs"]
mod tests;
