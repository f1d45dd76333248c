/// Image-loader collaborator
///
/// The UI layer renders arbitrary GPU textures by name through "virtual
/// images". A `SourceTexture` wraps the colour target and its shader view;
/// once registered, the loader shares ownership of the wrapper until it is
/// unregistered.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::FxHashMap;
use crate::device::{ShaderResourceView, Texture2D};

/// GPU data backing a source texture
#[derive(Debug, Default)]
pub struct RendererData {
    pub width: u32,
    pub height: u32,
    pub texture: Option<Texture2D>,
    pub resource_view: Option<ShaderResourceView>,
}

/// Named texture wrapper consumed by the UI as a virtual image
#[derive(Debug)]
pub struct SourceTexture {
    name: String,
    renderer_data: RwLock<RendererData>,
}

impl SourceTexture {
    /// Empty wrapper; the texture and view are attached as they are created
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            renderer_data: RwLock::new(RendererData {
                width,
                height,
                ..RendererData::default()
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.data().width
    }

    pub fn height(&self) -> u32 {
        self.data().height
    }

    /// New reference to the colour texture, if created
    pub fn texture(&self) -> Option<Texture2D> {
        self.data().texture.clone()
    }

    /// New reference to the shader-resource view, if created
    pub fn resource_view(&self) -> Option<ShaderResourceView> {
        self.data().resource_view.clone()
    }

    pub(crate) fn attach_texture(&self, texture: Texture2D) {
        self.data_mut().texture = Some(texture);
    }

    pub(crate) fn attach_resource_view(&self, view: ShaderResourceView) {
        self.data_mut().resource_view = Some(view);
    }

    fn data(&self) -> RwLockReadGuard<'_, RendererData> {
        self.renderer_data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn data_mut(&self) -> RwLockWriteGuard<'_, RendererData> {
        self.renderer_data.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// UI image-loader collaborator
pub trait ImageLoader: Send + Sync {
    /// Register `texture` as a virtual image under its name
    fn add_virtual_image(&self, texture: &Arc<SourceTexture>);

    /// Unregister `texture`; false if it was not registered
    fn release_virtual_image(&self, texture: &Arc<SourceTexture>) -> bool;

    /// Number of registered virtual images
    fn virtual_image_count(&self) -> usize;

    /// True if a virtual image named `name` is registered
    fn has_virtual_image(&self, name: &str) -> bool;
}

/// In-process virtual image table keyed by name
///
/// Registering a second texture under an existing name replaces the first.
#[derive(Debug, Default)]
pub struct VirtualImageRegistry {
    images: RwLock<FxHashMap<String, Arc<SourceTexture>>>,
}

impl VirtualImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered texture named `name`
    pub fn get(&self, name: &str) -> Option<Arc<SourceTexture>> {
        self.images
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Registered names (unordered)
    pub fn names(&self) -> Vec<String> {
        self.images
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl ImageLoader for VirtualImageRegistry {
    fn add_virtual_image(&self, texture: &Arc<SourceTexture>) {
        let previous = self.images
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(texture.name().to_string(), Arc::clone(texture));
        if previous.is_some() {
            crate::scene_warn!("chargen::VirtualImageRegistry",
                "Virtual image '{}' replaced", texture.name());
        }
    }

    fn release_virtual_image(&self, texture: &Arc<SourceTexture>) -> bool {
        let mut images = self.images.write().unwrap_or_else(PoisonError::into_inner);
        match images.get(texture.name()) {
            Some(registered) if Arc::ptr_eq(registered, texture) => {
                images.remove(texture.name());
                true
            }
            _ => false,
        }
    }

    fn virtual_image_count(&self) -> usize {
        self.images.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn has_virtual_image(&self, name: &str) -> bool {
        self.images.read().unwrap_or_else(PoisonError::into_inner).contains_key(name)
    }
}

#[cfg(test)]
#[path = "image_loader_tests.rs"]
mod tests;
