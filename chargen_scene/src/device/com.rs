/// Reference-counted GPU interface handles
///
/// Every GPU object handed out by the device collaborator carries a
/// COM-style reference count. `Com<K>` owns exactly one of those references:
/// cloning acquires a new one (`add_ref`), dropping releases it (`release`).
/// Creation calls and pipeline "get" queries both return a freshly acquired
/// reference, so whoever receives a `Com<K>` is responsible for letting it go.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Backend-side reference-counted object
///
/// Implemented by the device backend (a D3D11 wrapper, or the mock device
/// in tests).
pub trait GpuObject: Send + Sync {
    /// Acquire one reference, returning the new count
    fn add_ref(&self) -> u32;

    /// Release one reference, returning the new count
    fn release(&self) -> u32;

    /// Current reference count (diagnostics only)
    fn ref_count(&self) -> u32;

    /// Human-readable name for logs
    fn debug_name(&self) -> &str;

    /// Downcast hook for backends that need their concrete object back
    fn as_any(&self) -> &dyn Any;
}

/// Interface kind marker (one per GPU object type)
pub trait Interface: 'static {
    /// Interface name, e.g. "RenderTargetView"
    const NAME: &'static str;
}

macro_rules! interfaces {
    ($($(#[$meta:meta])* $kind:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug)]
            pub enum $kind {}

            impl Interface for $kind {
                const NAME: &'static str = stringify!($kind);
            }
        )*
    };
}

/// Interface kind markers
pub mod kind {
    use super::Interface;

    interfaces! {
        /// 2D texture resource
        Texture2D,
        /// Render-target view over a texture
        RenderTargetView,
        /// Shader-resource view over a texture
        ShaderResourceView,
        /// Depth-stencil view over a texture
        DepthStencilView,
        /// Depth/stencil test configuration
        DepthStencilState,
        /// Rasterizer configuration
        RasterizerState,
        /// Output-merger blend configuration
        BlendState,
        /// Texture sampler configuration
        SamplerState,
        /// Pixel shader object
        PixelShader,
        /// Vertex shader object
        VertexShader,
        /// Shader class instance (dynamic linkage)
        ClassInstance,
        /// Vertex, index or constant buffer
        Buffer,
        /// Input-assembler vertex layout
        InputLayout,
    }
}

/// Owning handle to one reference of a GPU object of kind `K`
pub struct Com<K: Interface> {
    object: Arc<dyn GpuObject>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: Interface> Com<K> {
    /// Adopt a reference that has already been counted by the backend
    ///
    /// Backends call this with the reference produced by a creation call or
    /// a pipeline query; no `add_ref` happens here.
    pub fn from_raw(object: Arc<dyn GpuObject>) -> Self {
        Self {
            object,
            _kind: PhantomData,
        }
    }

    /// Underlying backend object
    pub fn object(&self) -> &Arc<dyn GpuObject> {
        &self.object
    }

    /// True when both handles reference the same GPU object
    pub fn same_object(&self, other: &Com<K>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.object), Arc::as_ptr(&other.object))
    }

    /// Current reference count of the underlying object
    pub fn ref_count(&self) -> u32 {
        self.object.ref_count()
    }

    /// Backend name of the underlying object
    pub fn debug_name(&self) -> &str {
        self.object.debug_name()
    }
}

impl<K: Interface> Clone for Com<K> {
    fn clone(&self) -> Self {
        self.object.add_ref();
        Self {
            object: Arc::clone(&self.object),
            _kind: PhantomData,
        }
    }
}

impl<K: Interface> Drop for Com<K> {
    fn drop(&mut self) {
        self.object.release();
    }
}

impl<K: Interface> fmt::Debug for Com<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, refs={})", K::NAME, self.object.debug_name(), self.object.ref_count())
    }
}

/// Release the reference held in `slot`, if any, and clear the slot
///
/// Returns true when a reference was released. An empty slot is a no-op.
pub fn safe_release<K: Interface>(slot: &mut Option<Com<K>>) -> bool {
    slot.take().is_some()
}

/// Release every reference held in `slots`
///
/// Returns the number of references released.
pub fn safe_release_all<K: Interface>(slots: &mut [Option<Com<K>>]) -> usize {
    slots.iter_mut().map(safe_release).filter(|released| *released).count()
}

pub type Texture2D = Com<kind::Texture2D>;
pub type RenderTargetView = Com<kind::RenderTargetView>;
pub type ShaderResourceView = Com<kind::ShaderResourceView>;
pub type DepthStencilView = Com<kind::DepthStencilView>;
pub type DepthStencilState = Com<kind::DepthStencilState>;
pub type RasterizerState = Com<kind::RasterizerState>;
pub type BlendState = Com<kind::BlendState>;
pub type SamplerState = Com<kind::SamplerState>;
pub type PixelShader = Com<kind::PixelShader>;
pub type VertexShader = Com<kind::VertexShader>;
pub type ClassInstance = Com<kind::ClassInstance>;
pub type Buffer = Com<kind::Buffer>;
pub type InputLayout = Com<kind::InputLayout>;

#[cfg(test)]
#[path = "com_tests.rs"]
mod tests;
