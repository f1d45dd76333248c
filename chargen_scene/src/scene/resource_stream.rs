/// Resource file system collaborator
///
/// Reads files from the host's virtual Data folder. The scene uses it for
/// the brush shader source, which must be readable before any GPU object is
/// created.

use std::path::{Component, Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};

/// Read-only access to the host's resource files
pub trait ResourceFileSystem: Send + Sync {
    /// Read the whole file at `path` (forward or back slashes accepted)
    fn read_all(&self, path: &str) -> Result<Vec<u8>>;
}

fn read_error(path: &str, message: impl Into<String>) -> Error {
    Error::ResourceRead {
        path: path.to_string(),
        message: message.into(),
    }
}

/// Files below a root directory on disk
#[derive(Debug, Clone)]
pub struct DirectoryFileSystem {
    root: PathBuf,
}

impl DirectoryFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a virtual path to a path below the root; escapes are rejected
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = PathBuf::from(path.replace('\\', "/"));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative.as_os_str().is_empty() {
            return Err(read_error(path, "path must be relative to the resource root"));
        }
        Ok(self.root.join(relative))
    }
}

impl ResourceFileSystem for DirectoryFileSystem {
    fn read_all(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path)?;
        let data = std::fs::read(&full).map_err(|e| read_error(path, e.to_string()))?;
        if data.is_empty() {
            return Err(read_error(path, "file is empty"));
        }
        Ok(data)
    }
}

/// In-memory files, keyed by normalized virtual path
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RwLock<FxHashMap<String, Vec<u8>>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(path: &str) -> String {
        path.replace('\\', "/").to_ascii_lowercase()
    }

    /// Add or replace a file
    pub fn insert(&self, path: &str, data: impl Into<Vec<u8>>) {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(Self::normalize(path), data.into());
    }
}

impl ResourceFileSystem for MemoryFileSystem {
    fn read_all(&self, path: &str) -> Result<Vec<u8>> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        match files.get(&Self::normalize(path)) {
            Some(data) if !data.is_empty() => Ok(data.clone()),
            Some(_) => Err(read_error(path, "file is empty")),
            None => Err(read_error(path, "file not found")),
        }
    }
}

/// Shader source loaded into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderFileData {
    /// File name used in compiler diagnostics (e.g. "brush.hlsl")
    pub source_name: String,
    pub data: Vec<u8>,
}

impl ShaderFileData {
    /// Read `path` through `fs`
    pub fn load(fs: &dyn ResourceFileSystem, path: &str) -> Result<Self> {
        let data = fs.read_all(path)?;
        let source_name = path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(path)
            .to_string();
        Ok(Self { source_name, data })
    }

    /// Source as text, if valid UTF-8
    pub fn source_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
#[path = "resource_stream_tests.rs"]
mod tests;
