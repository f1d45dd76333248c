/// NifScene - off-screen head preview scene
///
/// Owns the colour render target (shared with the UI as the "headMesh"
/// virtual image), the depth-stencil surface and its state object, and
/// brackets its draw passes with a full pipeline backup/restore so the host
/// frame is left exactly as it was found.
///
/// Setup and Release run under the render-manager lock. Begin/End run on
/// the rendering thread and never take it.

use std::fmt;
use std::sync::Arc;
use crate::camera::Camera;
use crate::device::{
    safe_release, BindFlags, ClearFlags, ComparisonFunc, DepthStencilDesc, DepthStencilState,
    DepthStencilView, DepthStencilViewDesc, DepthWriteMask, Format, GraphicsDevice, RenderDevice,
    RenderTargetView, RenderTargetViewDesc, ShaderResourceViewDesc, StencilOp, StencilOpDesc,
    Texture2D, Texture2dDesc,
};
use crate::error::{Error, Result};
use super::brush::BrushType;
use super::config::{BackgroundColor, SceneConfig, SceneInitParams};
use super::image_loader::SourceTexture;
use super::render_manager::RenderManager;
use super::render_state::PipelineStateSnapshot;
use super::resource_stream::ShaderFileData;

const LOG_SOURCE: &str = "chargen::NifScene";

/// Imported scene graph shown in the preview (shared with other holders)
pub trait ImportedNode: Send + Sync {
    fn name(&self) -> &str;
}

/// Reference to the game actor the preview is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorHandle(pub u32);

/// GPU objects owned by a set-up scene
#[derive(Debug, Default)]
struct SurfaceSet {
    /// Wrapper owning the colour texture and its shader-resource view
    render_texture: Option<Arc<SourceTexture>>,
    render_target_view: Option<RenderTargetView>,
    depth_stencil_buffer: Option<Texture2D>,
    depth_stencil_state: Option<DepthStencilState>,
    depth_stencil_view: Option<DepthStencilView>,
}

impl SurfaceSet {
    fn is_complete(&self) -> bool {
        self.render_texture
            .as_ref()
            .is_some_and(|t| t.texture().is_some() && t.resource_view().is_some())
            && self.render_target_view.is_some()
            && self.depth_stencil_buffer.is_some()
            && self.depth_stencil_state.is_some()
            && self.depth_stencil_view.is_some()
    }

    fn is_empty(&self) -> bool {
        self.render_texture.is_none()
            && self.render_target_view.is_none()
            && self.depth_stencil_buffer.is_none()
            && self.depth_stencil_state.is_none()
            && self.depth_stencil_view.is_none()
    }
}

/// Depth test less-than with full writes; stencil counts front faces up and
/// back faces down where the depth test fails.
fn depth_stencil_desc() -> DepthStencilDesc {
    DepthStencilDesc {
        depth_enable: true,
        depth_write_mask: DepthWriteMask::All,
        depth_func: ComparisonFunc::Less,
        stencil_enable: true,
        stencil_read_mask: 0xFF,
        stencil_write_mask: 0xFF,
        front_face: StencilOpDesc {
            stencil_fail_op: StencilOp::Keep,
            stencil_depth_fail_op: StencilOp::Incr,
            stencil_pass_op: StencilOp::Keep,
            stencil_func: ComparisonFunc::Always,
        },
        back_face: StencilOpDesc {
            stencil_fail_op: StencilOp::Keep,
            stencil_depth_fail_op: StencilOp::Decr,
            stencil_pass_op: StencilOp::Keep,
            stencil_func: ComparisonFunc::Always,
        },
    }
}

fn unavailable(what: &str) -> Error {
    let error = Error::CollaboratorUnavailable(what.to_string());
    crate::scene_error!(LOG_SOURCE, "{}", error);
    error
}

fn creation_failed(stage: &'static str, source: Error) -> Error {
    let error = Error::GpuObjectCreation {
        stage,
        message: source.to_string(),
    };
    crate::scene_error!(LOG_SOURCE, "{}", error);
    error
}

fn invalid_state(message: &str) -> Error {
    let error = Error::InvalidState(message.to_string());
    crate::scene_error!(LOG_SOURCE, "{}", error);
    error
}

/// Character preview scene rendering into its own off-screen target
pub struct NifScene {
    config: SceneConfig,
    surfaces: SurfaceSet,
    virtual_image_registered: bool,
    width: u32,
    height: u32,
    /// Host pipeline captured by `begin`, present while rendering
    backup: Option<Box<PipelineStateSnapshot>>,
    brush_shader: Option<ShaderFileData>,
    import_root: Option<Arc<dyn ImportedNode>>,
    actor: Option<ActorHandle>,
    current_brush: BrushType,
    brushes: Vec<BrushType>,
}

impl NifScene {
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            surfaces: SurfaceSet::default(),
            virtual_image_registered: false,
            width: 0,
            height: 0,
            backup: None,
            brush_shader: None,
            import_root: None,
            actor: None,
            current_brush: BrushType::default(),
            brushes: BrushType::ALL.to_vec(),
        }
    }

    // ===== LIFECYCLE =====

    /// Allocate the scene's GPU surfaces at the viewport size in `params`
    ///
    /// Runs under the render-manager lock. A scene that already owns
    /// surfaces is released first. On a creation failure the objects made
    /// so far stay owned by the scene; `release` is the only valid next
    /// call.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` for a zero width or height
    /// * `CollaboratorUnavailable` if the device, context, file system or
    ///   image loader is missing
    /// * `ResourceRead` if the brush shader cannot be read (no GPU object
    ///   is created in that case)
    /// * `GpuObjectCreation` naming the failing creation call
    pub fn setup(
        &mut self,
        manager: &RenderManager,
        device: &mut dyn RenderDevice,
        params: &SceneInitParams,
    ) -> Result<()> {
        let _guard = manager.lock()?;

        if !self.surfaces.is_empty() || self.virtual_image_registered {
            crate::scene_debug!(LOG_SOURCE, "Releasing previous surfaces before setup");
            self.release_locked(manager);
        }

        if params.viewport_width == 0 || params.viewport_height == 0 {
            let error = Error::InvalidArgument(format!(
                "Viewport size {}x{} must be non-zero",
                params.viewport_width, params.viewport_height
            ));
            crate::scene_error!(LOG_SOURCE, "{}", error);
            return Err(error);
        }

        if device.device().is_none() {
            return Err(unavailable("graphics device"));
        }
        if device.context().is_none() {
            return Err(unavailable("device context"));
        }

        let file_system = manager
            .file_system()
            .ok_or_else(|| unavailable("resource file system"))?;
        let shader = ShaderFileData::load(&**file_system, &self.config.shader_path)
            .map_err(|error| {
                crate::scene_error!(LOG_SOURCE, "{}", error);
                error
            })?;
        crate::scene_debug!(LOG_SOURCE, "Loaded {} ({} bytes)", shader.source_name, shader.len());
        self.brush_shader = Some(shader);

        let graphics = device.device().ok_or_else(|| unavailable("graphics device"))?;
        self.create_render_target(manager, graphics, params.viewport_width, params.viewport_height)
    }

    /// Create the colour target, register it as a virtual image, then
    /// create the depth-stencil surface
    ///
    /// Each created object is stored as soon as it exists.
    pub fn create_render_target(
        &mut self,
        manager: &RenderManager,
        device: &dyn GraphicsDevice,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let loader = manager
            .image_loader()
            .cloned()
            .ok_or_else(|| unavailable("image loader"))?;

        let render_texture = Arc::new(SourceTexture::new(
            self.config.virtual_image_name.clone(),
            width,
            height,
        ));
        self.surfaces.render_texture = Some(Arc::clone(&render_texture));
        self.width = width;
        self.height = height;

        // Colour target
        let color_desc = Texture2dDesc::new(
            width,
            height,
            Format::R8G8B8A8_UNORM,
            BindFlags::RENDER_TARGET | BindFlags::SHADER_RESOURCE,
        );
        let color = device
            .create_texture_2d(&color_desc)
            .map_err(|e| creation_failed("CreateTexture2D(render)", e))?;
        render_texture.attach_texture(color.clone());

        let rtv_desc = RenderTargetViewDesc {
            format: color_desc.format,
            mip_slice: 0,
        };
        self.surfaces.render_target_view = Some(
            device
                .create_render_target_view(&color, &rtv_desc)
                .map_err(|e| creation_failed("CreateRenderTargetView", e))?,
        );

        let srv_desc = ShaderResourceViewDesc {
            format: color_desc.format,
            most_detailed_mip: 0,
            mip_levels: 1,
        };
        let resource_view = device
            .create_shader_resource_view(&color, &srv_desc)
            .map_err(|e| creation_failed("CreateShaderResourceView", e))?;
        render_texture.attach_resource_view(resource_view);

        loader.add_virtual_image(&render_texture);
        self.virtual_image_registered = true;

        // Depth-stencil surface
        let depth_desc = Texture2dDesc::new(
            width,
            height,
            Format::D24_UNORM_S8_UINT,
            BindFlags::DEPTH_STENCIL,
        );
        let depth_buffer = self.surfaces.depth_stencil_buffer.insert(
            device
                .create_texture_2d(&depth_desc)
                .map_err(|e| creation_failed("CreateTexture2D(depth)", e))?,
        );
        let depth_buffer = depth_buffer.clone();

        self.surfaces.depth_stencil_state = Some(
            device
                .create_depth_stencil_state(&depth_stencil_desc())
                .map_err(|e| creation_failed("CreateDepthStencilState", e))?,
        );

        let dsv_desc = DepthStencilViewDesc {
            format: depth_desc.format,
            mip_slice: 0,
        };
        self.surfaces.depth_stencil_view = Some(
            device
                .create_depth_stencil_view(&depth_buffer, &dsv_desc)
                .map_err(|e| creation_failed("CreateDepthStencilView", e))?,
        );

        crate::scene_info!(LOG_SOURCE, "Render target created ({}x{}, image '{}')",
            width, height, render_texture.name());
        Ok(())
    }

    /// Release every owned surface and unregister the virtual image
    ///
    /// Runs under the render-manager lock. Safe on a scene that was never
    /// set up, partially set up, or already released.
    pub fn release(&mut self, manager: &RenderManager) {
        let _guard = manager.lock_for_teardown();
        self.release_locked(manager);
    }

    fn release_locked(&mut self, manager: &RenderManager) {
        if self.backup.take().is_some() {
            crate::scene_warn!(LOG_SOURCE, "Released while rendering; captured pipeline state dropped");
        }

        if let Some(render_texture) = self.surfaces.render_texture.take() {
            if self.virtual_image_registered {
                match manager.image_loader() {
                    Some(loader) => {
                        if !loader.release_virtual_image(&render_texture) {
                            crate::scene_warn!(LOG_SOURCE,
                                "Virtual image '{}' was not registered", render_texture.name());
                        }
                    }
                    None => crate::scene_warn!(LOG_SOURCE,
                        "No image loader to unregister '{}'", render_texture.name()),
                }
            }
        }
        self.virtual_image_registered = false;

        safe_release(&mut self.surfaces.render_target_view);
        self.release_import();
        self.actor = None;
        safe_release(&mut self.surfaces.depth_stencil_buffer);
        safe_release(&mut self.surfaces.depth_stencil_state);
        safe_release(&mut self.surfaces.depth_stencil_view);

        self.brush_shader = None;
        self.width = 0;
        self.height = 0;
        crate::scene_trace!(LOG_SOURCE, "Surfaces released");
    }

    /// Drop this scene's reference to the imported scene graph
    pub fn release_import(&mut self) {
        if let Some(root) = self.import_root.take() {
            crate::scene_trace!(LOG_SOURCE, "Released import '{}'", root.name());
        }
    }

    // ===== RENDER BRACKET =====

    /// Redirect the pipeline to this scene's target
    ///
    /// Captures the host pipeline, binds the camera viewport, this scene's
    /// render target and depth-stencil view and state (stencil ref 1), and
    /// clears colour to `background` (clamped to [0, 1]) and depth to 1.0.
    ///
    /// # Errors
    ///
    /// `InvalidState` if already rendering or not set up (the pipeline is
    /// left untouched), `CollaboratorUnavailable` if there is no context.
    pub fn begin(
        &mut self,
        camera: &Camera,
        device: &mut dyn RenderDevice,
        background: BackgroundColor,
    ) -> Result<()> {
        if self.backup.is_some() {
            return Err(invalid_state("begin called while already rendering"));
        }
        if !self.surfaces.is_complete() {
            return Err(invalid_state("begin called on a scene that is not set up"));
        }
        let (Some(rtv), Some(dsv)) = (
            self.surfaces.render_target_view.as_ref(),
            self.surfaces.depth_stencil_view.as_ref(),
        ) else {
            return Err(invalid_state("begin called on a scene that is not set up"));
        };
        let ctx = device.context().ok_or_else(|| unavailable("device context"))?;

        let snapshot = PipelineStateSnapshot::capture(&*ctx);

        ctx.rs_set_viewports(&[camera.viewport()]);
        ctx.om_set_render_targets(std::slice::from_ref(&self.surfaces.render_target_view), Some(dsv));
        ctx.om_set_depth_stencil_state(self.surfaces.depth_stencil_state.as_ref(), 1);
        ctx.clear_render_target_view(rtv, &background.clamped().to_array());
        ctx.clear_depth_stencil_view(dsv, ClearFlags::DEPTH, 1.0, 0);

        self.backup = Some(snapshot);
        Ok(())
    }

    /// Restore the pipeline captured by `begin`
    ///
    /// # Errors
    ///
    /// `InvalidState` if not rendering, `CollaboratorUnavailable` if there
    /// is no context (the capture is kept so `end` can be retried).
    pub fn end(&mut self, _camera: &Camera, device: &mut dyn RenderDevice) -> Result<()> {
        if self.backup.is_none() {
            return Err(invalid_state("end called without a matching begin"));
        }
        let ctx = device.context().ok_or_else(|| unavailable("device context"))?;
        if let Some(snapshot) = self.backup.take() {
            snapshot.restore(ctx);
        }
        Ok(())
    }

    // ===== QUERIES =====

    /// All surfaces present
    pub fn is_set_up(&self) -> bool {
        self.surfaces.is_complete()
    }

    /// Between `begin` and `end`
    pub fn is_rendering(&self) -> bool {
        self.backup.is_some()
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn virtual_image_registered(&self) -> bool {
        self.virtual_image_registered
    }

    pub fn render_texture(&self) -> Option<&Arc<SourceTexture>> {
        self.surfaces.render_texture.as_ref()
    }

    pub fn render_target_view(&self) -> Option<&RenderTargetView> {
        self.surfaces.render_target_view.as_ref()
    }

    pub fn depth_stencil_buffer(&self) -> Option<&Texture2D> {
        self.surfaces.depth_stencil_buffer.as_ref()
    }

    pub fn depth_stencil_state(&self) -> Option<&DepthStencilState> {
        self.surfaces.depth_stencil_state.as_ref()
    }

    pub fn depth_stencil_view(&self) -> Option<&DepthStencilView> {
        self.surfaces.depth_stencil_view.as_ref()
    }

    /// Brush shader source loaded at setup
    pub fn brush_shader(&self) -> Option<&ShaderFileData> {
        self.brush_shader.as_ref()
    }

    // ===== IMPORT / ACTOR / BRUSHES =====

    /// Replace the imported scene graph (the previous one is released)
    pub fn set_import_root(&mut self, root: Arc<dyn ImportedNode>) {
        self.release_import();
        self.import_root = Some(root);
    }

    pub fn import_root(&self) -> Option<&Arc<dyn ImportedNode>> {
        self.import_root.as_ref()
    }

    pub fn set_actor(&mut self, actor: Option<ActorHandle>) {
        self.actor = actor;
    }

    pub fn actor(&self) -> Option<ActorHandle> {
        self.actor
    }

    pub fn set_current_brush(&mut self, brush: BrushType) {
        self.current_brush = brush;
    }

    pub fn current_brush(&self) -> BrushType {
        self.current_brush
    }

    pub fn brushes(&self) -> &[BrushType] {
        &self.brushes
    }
}

impl Default for NifScene {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}

impl fmt::Debug for NifScene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NifScene")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("set_up", &self.is_set_up())
            .field("rendering", &self.is_rendering())
            .field("virtual_image_registered", &self.virtual_image_registered)
            .field("current_brush", &self.current_brush)
            .finish()
    }
}

impl Drop for NifScene {
    fn drop(&mut self) {
        if self.virtual_image_registered {
            crate::scene_warn!(LOG_SOURCE,
                "Scene dropped without release; virtual image '{}' is still registered",
                self.config.virtual_image_name);
        }
    }
}

#[cfg(test)]
#[path = "nif_scene_tests.rs"]
mod tests;
