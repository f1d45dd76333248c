//! Scene module
//!
//! The off-screen head preview scene (`NifScene`), the pipeline state
//! snapshot taken around its draw passes, and the collaborators it is set
//! up with (render manager, image loader, resource file system).

mod brush;
mod config;
mod image_loader;
mod nif_scene;
mod render_manager;
mod render_state;
mod resource_stream;

pub use brush::BrushType;
pub use config::{
    BackgroundColor, SceneConfig, SceneInitParams, BRUSH_SHADER_PATH, HEAD_MESH_IMAGE_NAME,
};
pub use image_loader::{ImageLoader, RendererData, SourceTexture, VirtualImageRegistry};
pub use nif_scene::{ActorHandle, ImportedNode, NifScene};
pub use render_manager::RenderManager;
pub use render_state::PipelineStateSnapshot;
pub use resource_stream::{DirectoryFileSystem, MemoryFileSystem, ResourceFileSystem, ShaderFileData};
