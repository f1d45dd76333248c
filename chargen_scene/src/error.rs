//! Error types for the CharGen scene subsystem
//!
//! Every failure is terminal to the current call. Errors are logged where
//! they are raised and surfaced to the caller as a `Result`.

use std::fmt;

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, Error>;

/// Scene subsystem errors
#[derive(Debug, Clone)]
pub enum Error {
    /// A collaborator (device, device context, image loader, file system) is missing
    CollaboratorUnavailable(String),

    /// A GPU object creation call failed
    GpuObjectCreation {
        /// Name of the failing creation call
        stage: &'static str,
        /// Backend diagnostic
        message: String,
    },

    /// A resource file could not be read
    ResourceRead {
        /// Virtual path of the file
        path: String,
        /// Underlying diagnostic
        message: String,
    },

    /// Operation not valid in the scene's current state
    InvalidState(String),

    /// Caller supplied an invalid argument
    InvalidArgument(String),

    /// Backend-specific error (poisoned lock, driver failure, ...)
    BackendError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CollaboratorUnavailable(what) => write!(f, "Collaborator unavailable: {}", what),
            Error::GpuObjectCreation { stage, message } => {
                write!(f, "GPU object creation failed at {}: {}", stage, message)
            }
            Error::ResourceRead { path, message } => {
                write!(f, "Failed to read {}: {}", path, message)
            }
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Name of the failing creation call, if this is a creation failure
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            Error::GpuObjectCreation { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
