/// Pipeline state backup and restore
///
/// A `PipelineStateSnapshot` records every piece of pipeline state the
/// preview pass overwrites, so the host's frame continues exactly as it was.
/// Capturing acquires one reference per bound object (the context's get
/// queries hand out new references); restoring rebinds each value and then
/// releases the captured reference, since the set call retains its own.
///
/// Capture and restore walk the state in the same fixed order:
/// render targets + depth-stencil view, scissor rects, viewports, rasterizer
/// state, blend state, depth-stencil state, PS shader resource slot 0, PS
/// sampler slot 0, pixel shader (+ class instances), vertex shader
/// (+ class instances), VS constant buffer slot 0, primitive topology, index
/// buffer, vertex buffer slot 0, input layout.

use bytemuck::Zeroable;
use crate::device::{
    safe_release, safe_release_all, DeviceContext, Format, PrimitiveTopology, Rect, Viewport,
    RenderTargetView, DepthStencilView, RasterizerState, BlendState, DepthStencilState,
    ShaderResourceView, SamplerState, PixelShader, VertexShader, ClassInstance, Buffer, InputLayout,
    SIMULTANEOUS_RENDER_TARGET_COUNT, VIEWPORT_AND_SCISSORRECT_OBJECT_COUNT_PER_PIPELINE,
    MAX_CLASS_INSTANCES,
};

const LOG_SOURCE: &str = "chargen::PipelineStateSnapshot";

/// Captured pipeline state of one device context
pub struct PipelineStateSnapshot {
    render_target_views: [Option<RenderTargetView>; SIMULTANEOUS_RENDER_TARGET_COUNT],
    depth_stencil_view: Option<DepthStencilView>,
    scissor_rects_count: usize,
    scissor_rects: [Rect; VIEWPORT_AND_SCISSORRECT_OBJECT_COUNT_PER_PIPELINE],
    viewports_count: usize,
    viewports: [Viewport; VIEWPORT_AND_SCISSORRECT_OBJECT_COUNT_PER_PIPELINE],
    rasterizer_state: Option<RasterizerState>,
    blend_state: Option<BlendState>,
    blend_factor: [f32; 4],
    sample_mask: u32,
    depth_stencil_state: Option<DepthStencilState>,
    stencil_ref: u32,
    ps_shader_resource: [Option<ShaderResourceView>; 1],
    ps_sampler: [Option<SamplerState>; 1],
    pixel_shader: Option<PixelShader>,
    ps_instances: [Option<ClassInstance>; MAX_CLASS_INSTANCES],
    ps_instances_count: usize,
    vertex_shader: Option<VertexShader>,
    vs_instances: [Option<ClassInstance>; MAX_CLASS_INSTANCES],
    vs_instances_count: usize,
    vs_constant_buffer: [Option<Buffer>; 1],
    primitive_topology: PrimitiveTopology,
    index_buffer: Option<Buffer>,
    index_buffer_format: Format,
    index_buffer_offset: u32,
    vertex_buffer: [Option<Buffer>; 1],
    vertex_buffer_stride: [u32; 1],
    vertex_buffer_offset: [u32; 1],
    input_layout: Option<InputLayout>,
}

impl PipelineStateSnapshot {
    /// All slots empty, counts zero
    fn empty() -> Box<Self> {
        Box::new(Self {
            render_target_views: Default::default(),
            depth_stencil_view: None,
            scissor_rects_count: 0,
            scissor_rects: [Rect::zeroed(); VIEWPORT_AND_SCISSORRECT_OBJECT_COUNT_PER_PIPELINE],
            viewports_count: 0,
            viewports: [Viewport::zeroed(); VIEWPORT_AND_SCISSORRECT_OBJECT_COUNT_PER_PIPELINE],
            rasterizer_state: None,
            blend_state: None,
            blend_factor: [0.0; 4],
            sample_mask: 0,
            depth_stencil_state: None,
            stencil_ref: 0,
            ps_shader_resource: [None],
            ps_sampler: [None],
            pixel_shader: None,
            ps_instances: std::array::from_fn(|_| None),
            ps_instances_count: 0,
            vertex_shader: None,
            vs_instances: std::array::from_fn(|_| None),
            vs_instances_count: 0,
            vs_constant_buffer: [None],
            primitive_topology: PrimitiveTopology::Undefined,
            index_buffer: None,
            index_buffer_format: Format::UNKNOWN,
            index_buffer_offset: 0,
            vertex_buffer: [None],
            vertex_buffer_stride: [0],
            vertex_buffer_offset: [0],
            input_layout: None,
        })
    }

    /// Capture the current pipeline state of `ctx`
    ///
    /// Every returned handle is a new reference owned by the snapshot.
    pub fn capture(ctx: &dyn DeviceContext) -> Box<Self> {
        let mut s = Self::empty();

        s.depth_stencil_view = ctx.om_get_render_targets(&mut s.render_target_views);
        s.scissor_rects_count = ctx.rs_get_scissor_rects(&mut s.scissor_rects);
        s.viewports_count = ctx.rs_get_viewports(&mut s.viewports);
        s.rasterizer_state = ctx.rs_get_state();
        (s.blend_state, s.blend_factor, s.sample_mask) = ctx.om_get_blend_state();
        (s.depth_stencil_state, s.stencil_ref) = ctx.om_get_depth_stencil_state();
        ctx.ps_get_shader_resources(0, &mut s.ps_shader_resource);
        ctx.ps_get_samplers(0, &mut s.ps_sampler);
        (s.pixel_shader, s.ps_instances_count) = ctx.ps_get_shader(&mut s.ps_instances);
        (s.vertex_shader, s.vs_instances_count) = ctx.vs_get_shader(&mut s.vs_instances);
        ctx.vs_get_constant_buffers(0, &mut s.vs_constant_buffer);
        s.primitive_topology = ctx.ia_get_primitive_topology();
        (s.index_buffer, s.index_buffer_format, s.index_buffer_offset) = ctx.ia_get_index_buffer();
        ctx.ia_get_vertex_buffers(
            0,
            &mut s.vertex_buffer,
            &mut s.vertex_buffer_stride,
            &mut s.vertex_buffer_offset,
        );
        s.input_layout = ctx.ia_get_input_layout();

        crate::scene_trace!(LOG_SOURCE, "Captured pipeline state ({} references held)",
            s.held_references());
        s
    }

    /// Rebind the captured state on `ctx` and release every captured reference
    ///
    /// Consumes the snapshot; afterwards it holds no references.
    pub fn restore(mut self: Box<Self>, ctx: &mut dyn DeviceContext) {
        let s = &mut *self;
        let held = s.held_references();

        ctx.om_set_render_targets(&s.render_target_views, s.depth_stencil_view.as_ref());
        safe_release_all(&mut s.render_target_views);
        safe_release(&mut s.depth_stencil_view);

        ctx.rs_set_scissor_rects(&s.scissor_rects[..s.scissor_rects_count]);
        ctx.rs_set_viewports(&s.viewports[..s.viewports_count]);
        ctx.rs_set_state(s.rasterizer_state.as_ref());
        safe_release(&mut s.rasterizer_state);
        ctx.om_set_blend_state(s.blend_state.as_ref(), &s.blend_factor, s.sample_mask);
        safe_release(&mut s.blend_state);
        ctx.om_set_depth_stencil_state(s.depth_stencil_state.as_ref(), s.stencil_ref);
        safe_release(&mut s.depth_stencil_state);
        ctx.ps_set_shader_resources(0, &s.ps_shader_resource);
        safe_release_all(&mut s.ps_shader_resource);
        ctx.ps_set_samplers(0, &s.ps_sampler);
        safe_release_all(&mut s.ps_sampler);
        ctx.ps_set_shader(s.pixel_shader.as_ref(), &s.ps_instances[..s.ps_instances_count]);
        safe_release(&mut s.pixel_shader);
        safe_release_all(&mut s.ps_instances[..s.ps_instances_count]);
        ctx.vs_set_shader(s.vertex_shader.as_ref(), &s.vs_instances[..s.vs_instances_count]);
        safe_release(&mut s.vertex_shader);
        ctx.vs_set_constant_buffers(0, &s.vs_constant_buffer);
        safe_release_all(&mut s.vs_constant_buffer);
        // VS class instances go after the constant buffer rebind
        safe_release_all(&mut s.vs_instances[..s.vs_instances_count]);
        ctx.ia_set_primitive_topology(s.primitive_topology);
        ctx.ia_set_index_buffer(s.index_buffer.as_ref(), s.index_buffer_format, s.index_buffer_offset);
        safe_release(&mut s.index_buffer);
        ctx.ia_set_vertex_buffers(
            0,
            &s.vertex_buffer,
            &s.vertex_buffer_stride,
            &s.vertex_buffer_offset,
        );
        safe_release_all(&mut s.vertex_buffer);
        ctx.ia_set_input_layout(s.input_layout.as_ref());
        safe_release(&mut s.input_layout);

        crate::scene_trace!(LOG_SOURCE, "Restored pipeline state ({} references released)", held);
    }

    /// Number of object references currently owned by the snapshot
    pub fn held_references(&self) -> usize {
        fn count<T>(slots: &[Option<T>]) -> usize {
            slots.iter().filter(|s| s.is_some()).count()
        }

        count(&self.render_target_views)
            + usize::from(self.depth_stencil_view.is_some())
            + usize::from(self.rasterizer_state.is_some())
            + usize::from(self.blend_state.is_some())
            + usize::from(self.depth_stencil_state.is_some())
            + count(&self.ps_shader_resource)
            + count(&self.ps_sampler)
            + usize::from(self.pixel_shader.is_some())
            + count(&self.ps_instances)
            + usize::from(self.vertex_shader.is_some())
            + count(&self.vs_instances)
            + count(&self.vs_constant_buffer)
            + usize::from(self.index_buffer.is_some())
            + count(&self.vertex_buffer)
            + usize::from(self.input_layout.is_some())
    }

    /// Non-empty render target slots at capture time
    pub fn render_target_count(&self) -> usize {
        self.render_target_views.iter().filter(|v| v.is_some()).count()
    }

    pub fn render_target_views(&self) -> &[Option<RenderTargetView>] {
        &self.render_target_views
    }

    pub fn depth_stencil_view(&self) -> Option<&DepthStencilView> {
        self.depth_stencil_view.as_ref()
    }

    pub fn viewports(&self) -> &[Viewport] {
        &self.viewports[..self.viewports_count]
    }

    pub fn scissor_rects(&self) -> &[Rect] {
        &self.scissor_rects[..self.scissor_rects_count]
    }

    pub fn ps_instances_count(&self) -> usize {
        self.ps_instances_count
    }

    pub fn vs_instances_count(&self) -> usize {
        self.vs_instances_count
    }
}

#[cfg(test)]
#[path = "render_state_tests.rs"]
mod tests;
