/// Device collaborator traits
///
/// `GraphicsDevice` creates GPU objects, `DeviceContext` binds and queries
/// pipeline state. Both follow Direct3D 11 reference semantics:
/// - creation and `*_get_*` calls return newly acquired references,
/// - `*_set_*` calls retain their own references to whatever they bind.

use crate::error::Result;
use super::com::{
    Texture2D, RenderTargetView, ShaderResourceView, DepthStencilView, DepthStencilState,
    RasterizerState, BlendState, SamplerState, PixelShader, VertexShader, ClassInstance,
    Buffer, InputLayout,
};
use super::types::{
    Texture2dDesc, RenderTargetViewDesc, ShaderResourceViewDesc, DepthStencilViewDesc,
    DepthStencilDesc, Viewport, Rect, Format, PrimitiveTopology, ClearFlags,
};

/// Logical graphics device (object creation)
pub trait GraphicsDevice {
    /// Create a 2D texture
    fn create_texture_2d(&self, desc: &Texture2dDesc) -> Result<Texture2D>;

    /// Create a render-target view over `resource`
    fn create_render_target_view(
        &self,
        resource: &Texture2D,
        desc: &RenderTargetViewDesc,
    ) -> Result<RenderTargetView>;

    /// Create a shader-resource view over `resource`
    fn create_shader_resource_view(
        &self,
        resource: &Texture2D,
        desc: &ShaderResourceViewDesc,
    ) -> Result<ShaderResourceView>;

    /// Create a depth-stencil state object
    fn create_depth_stencil_state(&self, desc: &DepthStencilDesc) -> Result<DepthStencilState>;

    /// Create a depth-stencil view over `resource`
    fn create_depth_stencil_view(
        &self,
        resource: &Texture2D,
        desc: &DepthStencilViewDesc,
    ) -> Result<DepthStencilView>;
}

/// Immediate device context (pipeline binding and queries)
///
/// Array queries fill the caller's fixed-capacity slice; slots beyond what is
/// bound come back as `None`.
pub trait DeviceContext {
    // ===== OUTPUT MERGER =====

    /// Fill `views` with the bound render targets, return the bound depth-stencil view
    fn om_get_render_targets(&self, views: &mut [Option<RenderTargetView>]) -> Option<DepthStencilView>;

    /// Bind `views` (slot 0..len) and `depth_stencil`, unbinding every other slot
    fn om_set_render_targets(&mut self, views: &[Option<RenderTargetView>], depth_stencil: Option<&DepthStencilView>);

    /// Blend state, blend factor and sample mask
    fn om_get_blend_state(&self) -> (Option<BlendState>, [f32; 4], u32);

    fn om_set_blend_state(&mut self, state: Option<&BlendState>, blend_factor: &[f32; 4], sample_mask: u32);

    /// Depth-stencil state and stencil reference
    fn om_get_depth_stencil_state(&self) -> (Option<DepthStencilState>, u32);

    fn om_set_depth_stencil_state(&mut self, state: Option<&DepthStencilState>, stencil_ref: u32);

    // ===== RASTERIZER =====

    /// Copy the bound scissor rects into `rects`, returning how many were written
    fn rs_get_scissor_rects(&self, rects: &mut [Rect]) -> usize;

    fn rs_set_scissor_rects(&mut self, rects: &[Rect]);

    /// Copy the bound viewports into `viewports`, returning how many were written
    fn rs_get_viewports(&self, viewports: &mut [Viewport]) -> usize;

    fn rs_set_viewports(&mut self, viewports: &[Viewport]);

    fn rs_get_state(&self) -> Option<RasterizerState>;

    fn rs_set_state(&mut self, state: Option<&RasterizerState>);

    // ===== PIXEL SHADER STAGE =====

    fn ps_get_shader_resources(&self, start_slot: u32, views: &mut [Option<ShaderResourceView>]);

    fn ps_set_shader_resources(&mut self, start_slot: u32, views: &[Option<ShaderResourceView>]);

    fn ps_get_samplers(&self, start_slot: u32, samplers: &mut [Option<SamplerState>]);

    fn ps_set_samplers(&mut self, start_slot: u32, samplers: &[Option<SamplerState>]);

    /// Bound pixel shader; its class instances are written to `instances`,
    /// the returned count is how many were written
    fn ps_get_shader(&self, instances: &mut [Option<ClassInstance>]) -> (Option<PixelShader>, usize);

    fn ps_set_shader(&mut self, shader: Option<&PixelShader>, instances: &[Option<ClassInstance>]);

    // ===== VERTEX SHADER STAGE =====

    /// Bound vertex shader, same contract as `ps_get_shader`
    fn vs_get_shader(&self, instances: &mut [Option<ClassInstance>]) -> (Option<VertexShader>, usize);

    fn vs_set_shader(&mut self, shader: Option<&VertexShader>, instances: &[Option<ClassInstance>]);

    fn vs_get_constant_buffers(&self, start_slot: u32, buffers: &mut [Option<Buffer>]);

    fn vs_set_constant_buffers(&mut self, start_slot: u32, buffers: &[Option<Buffer>]);

    // ===== INPUT ASSEMBLER =====

    fn ia_get_primitive_topology(&self) -> PrimitiveTopology;

    fn ia_set_primitive_topology(&mut self, topology: PrimitiveTopology);

    /// Index buffer, its format and byte offset
    fn ia_get_index_buffer(&self) -> (Option<Buffer>, Format, u32);

    fn ia_set_index_buffer(&mut self, buffer: Option<&Buffer>, format: Format, offset: u32);

    /// Vertex buffers with their strides and byte offsets
    fn ia_get_vertex_buffers(
        &self,
        start_slot: u32,
        buffers: &mut [Option<Buffer>],
        strides: &mut [u32],
        offsets: &mut [u32],
    );

    fn ia_set_vertex_buffers(
        &mut self,
        start_slot: u32,
        buffers: &[Option<Buffer>],
        strides: &[u32],
        offsets: &[u32],
    );

    fn ia_get_input_layout(&self) -> Option<InputLayout>;

    fn ia_set_input_layout(&mut self, layout: Option<&InputLayout>);

    // ===== CLEARS =====

    fn clear_render_target_view(&mut self, view: &RenderTargetView, color: &[f32; 4]);

    fn clear_depth_stencil_view(&mut self, view: &DepthStencilView, flags: ClearFlags, depth: f32, stencil: u8);
}

/// Host device wrapper exposing the logical device and its immediate context
///
/// Either part may be unavailable (e.g. during device loss); callers treat
/// `None` as a collaborator-unavailable failure.
pub trait RenderDevice {
    fn device(&self) -> Option<&dyn GraphicsDevice>;

    fn context(&mut self) -> Option<&mut dyn DeviceContext>;
}
