/// Mock device for unit tests (no GPU required)
///
/// Every created object carries a real reference count so tests can check
/// that each acquisition is matched by exactly one release.

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use super::com::{
    Com, GpuObject, Interface, Texture2D, RenderTargetView, ShaderResourceView, DepthStencilView,
    DepthStencilState, RasterizerState, BlendState, SamplerState, PixelShader, VertexShader,
    ClassInstance, Buffer, InputLayout,
};
use super::graphics_device::{DeviceContext, GraphicsDevice, RenderDevice};
use super::types::{
    Texture2dDesc, RenderTargetViewDesc, ShaderResourceViewDesc, DepthStencilViewDesc,
    DepthStencilDesc, Viewport, Rect, Format, PrimitiveTopology, ClearFlags,
    SIMULTANEOUS_RENDER_TARGET_COUNT,
};

/// Number of slots modeled per shader-stage array
pub const MOCK_SLOT_COUNT: usize = 16;

// ============================================================================
// Mock Object
// ============================================================================

#[derive(Debug)]
pub struct MockObject {
    name: String,
    refs: AtomicU32,
    over_released: AtomicBool,
}

impl MockObject {
    pub fn new(name: String) -> Self {
        Self {
            name,
            refs: AtomicU32::new(1),
            over_released: AtomicBool::new(false),
        }
    }

    /// True if `release` was ever called with a zero count
    pub fn over_released(&self) -> bool {
        self.over_released.load(Ordering::SeqCst)
    }
}

impl GpuObject for MockObject {
    fn add_ref(&self) -> u32 {
        self.refs.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn release(&self) -> u32 {
        match self.refs.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)) {
            Ok(previous) => previous - 1,
            Err(_) => {
                self.over_released.store(true, Ordering::SeqCst);
                0
            }
        }
    }

    fn ref_count(&self) -> u32 {
        self.refs.load(Ordering::SeqCst)
    }

    fn debug_name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Device
// ============================================================================

/// Mock device that tracks every object it hands out
#[derive(Debug, Default)]
pub struct MockDevice {
    objects: Mutex<Vec<Arc<MockObject>>>,
    calls: Mutex<FxHashMap<&'static str, usize>>,
    failures: Mutex<Vec<(&'static str, usize)>>,
    /// Descriptors passed to create_texture_2d, in call order
    pub texture_descs: Mutex<Vec<Texture2dDesc>>,
    /// Descriptors passed to create_depth_stencil_state, in call order
    pub depth_stencil_descs: Mutex<Vec<DepthStencilDesc>>,
    /// (call, format) of every view created, in call order
    pub view_formats: Mutex<Vec<(&'static str, Format)>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `occurrence`-th (0-based) creation of interface `kind` fail
    pub fn fail_call(&self, kind: &'static str, occurrence: usize) {
        self.failures.lock().unwrap().push((kind, occurrence));
    }

    /// Create an object outside of the GraphicsDevice API (host-owned state)
    pub fn create_object<K: Interface>(&self, label: &str) -> Com<K> {
        let mut objects = self.objects.lock().unwrap();
        let object = Arc::new(MockObject::new(format!("{}#{}:{}", K::NAME, objects.len(), label)));
        objects.push(Arc::clone(&object));
        Com::from_raw(object)
    }

    fn create_counted<K: Interface>(&self) -> Result<Com<K>> {
        let occurrence = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(K::NAME).or_insert(0);
            *count += 1;
            *count - 1
        };
        if self.failures.lock().unwrap().contains(&(K::NAME, occurrence)) {
            return Err(Error::BackendError(format!("{} creation failed (E_OUTOFMEMORY)", K::NAME)));
        }
        Ok(self.create_object::<K>("device"))
    }

    /// Number of creation calls made for interface `kind`
    pub fn call_count(&self, kind: &str) -> usize {
        self.calls.lock().unwrap().get(kind).copied().unwrap_or(0)
    }

    /// Every object ever created, in creation order
    pub fn objects(&self) -> Vec<Arc<MockObject>> {
        self.objects.lock().unwrap().clone()
    }

    /// Current reference count of every object, in creation order
    pub fn ref_counts(&self) -> Vec<u32> {
        self.objects().iter().map(|o| o.ref_count()).collect()
    }

    /// Objects still holding at least one reference
    pub fn live_object_count(&self) -> usize {
        self.objects().iter().filter(|o| o.ref_count() > 0).count()
    }

    /// Sum of all outstanding references
    pub fn total_references(&self) -> u32 {
        self.ref_counts().iter().sum()
    }

    pub fn any_over_released(&self) -> bool {
        self.objects().iter().any(|o| o.over_released())
    }
}

impl GraphicsDevice for MockDevice {
    fn create_texture_2d(&self, desc: &Texture2dDesc) -> Result<Texture2D> {
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::BackendError("CreateTexture2D: E_INVALIDARG".to_string()));
        }
        self.texture_descs.lock().unwrap().push(desc.clone());
        self.create_counted()
    }

    fn create_render_target_view(
        &self,
        _resource: &Texture2D,
        desc: &RenderTargetViewDesc,
    ) -> Result<RenderTargetView> {
        self.view_formats.lock().unwrap().push(("CreateRenderTargetView", desc.format));
        self.create_counted()
    }

    fn create_shader_resource_view(
        &self,
        _resource: &Texture2D,
        desc: &ShaderResourceViewDesc,
    ) -> Result<ShaderResourceView> {
        self.view_formats.lock().unwrap().push(("CreateShaderResourceView", desc.format));
        self.create_counted()
    }

    fn create_depth_stencil_state(&self, desc: &DepthStencilDesc) -> Result<DepthStencilState> {
        self.depth_stencil_descs.lock().unwrap().push(*desc);
        self.create_counted()
    }

    fn create_depth_stencil_view(
        &self,
        _resource: &Texture2D,
        desc: &DepthStencilViewDesc,
    ) -> Result<DepthStencilView> {
        self.view_formats.lock().unwrap().push(("CreateDepthStencilView", desc.format));
        self.create_counted()
    }
}

// ============================================================================
// Mock Context
// ============================================================================

fn copy_slots<T: Clone>(bound: &[Option<T>], start_slot: u32, out: &mut [Option<T>]) {
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = bound.get(start_slot as usize + i).cloned().flatten();
    }
}

fn bind_slots<T: Clone>(bound: &mut [Option<T>], start_slot: u32, values: &[Option<T>]) {
    for (i, value) in values.iter().enumerate() {
        if let Some(slot) = bound.get_mut(start_slot as usize + i) {
            *slot = value.clone();
        }
    }
}

/// Mock immediate context holding the bound pipeline state
#[derive(Debug)]
pub struct MockContext {
    pub render_targets: [Option<RenderTargetView>; SIMULTANEOUS_RENDER_TARGET_COUNT],
    pub depth_stencil_view: Option<DepthStencilView>,
    pub blend_state: Option<BlendState>,
    pub blend_factor: [f32; 4],
    pub sample_mask: u32,
    pub depth_stencil_state: Option<DepthStencilState>,
    pub stencil_ref: u32,
    pub scissor_rects: Vec<Rect>,
    pub viewports: Vec<Viewport>,
    pub rasterizer_state: Option<RasterizerState>,
    pub ps_shader_resources: Vec<Option<ShaderResourceView>>,
    pub ps_samplers: Vec<Option<SamplerState>>,
    pub pixel_shader: Option<PixelShader>,
    pub ps_instances: Vec<Option<ClassInstance>>,
    pub vertex_shader: Option<VertexShader>,
    pub vs_instances: Vec<Option<ClassInstance>>,
    pub vs_constant_buffers: Vec<Option<Buffer>>,
    pub topology: PrimitiveTopology,
    pub index_buffer: Option<Buffer>,
    pub index_format: Format,
    pub index_offset: u32,
    pub vertex_buffers: Vec<Option<Buffer>>,
    pub vertex_strides: Vec<u32>,
    pub vertex_offsets: Vec<u32>,
    pub input_layout: Option<InputLayout>,
    /// Names of set/clear calls, in call order
    pub calls: Vec<&'static str>,
    /// Colors passed to clear_render_target_view
    pub color_clears: Vec<[f32; 4]>,
    /// (flags, depth, stencil) passed to clear_depth_stencil_view
    pub depth_clears: Vec<(ClearFlags, f32, u8)>,
}

impl MockContext {
    /// Context in the API's default state (nothing bound)
    pub fn new() -> Self {
        Self {
            render_targets: Default::default(),
            depth_stencil_view: None,
            blend_state: None,
            blend_factor: [1.0; 4],
            sample_mask: u32::MAX,
            depth_stencil_state: None,
            stencil_ref: 0,
            scissor_rects: Vec::new(),
            viewports: Vec::new(),
            rasterizer_state: None,
            ps_shader_resources: vec![None; MOCK_SLOT_COUNT],
            ps_samplers: vec![None; MOCK_SLOT_COUNT],
            pixel_shader: None,
            ps_instances: Vec::new(),
            vertex_shader: None,
            vs_instances: Vec::new(),
            vs_constant_buffers: vec![None; MOCK_SLOT_COUNT],
            topology: PrimitiveTopology::Undefined,
            index_buffer: None,
            index_format: Format::UNKNOWN,
            index_offset: 0,
            vertex_buffers: vec![None; MOCK_SLOT_COUNT],
            vertex_strides: vec![0; MOCK_SLOT_COUNT],
            vertex_offsets: vec![0; MOCK_SLOT_COUNT],
            input_layout: None,
            calls: Vec::new(),
            color_clears: Vec::new(),
            depth_clears: Vec::new(),
        }
    }

    /// Bind a representative host pipeline (objects created on `device`)
    ///
    /// Afterwards every host object is referenced only by this context.
    pub fn bind_host_state(&mut self, device: &MockDevice) {
        let targets: [Option<RenderTargetView>; 2] = [
            Some(device.create_object("host_color")),
            Some(device.create_object("host_normals")),
        ];
        let dsv: DepthStencilView = device.create_object("host_depth");
        self.om_set_render_targets(&targets, Some(&dsv));

        self.rs_set_scissor_rects(&[Rect { left: 0, top: 0, right: 1920, bottom: 1080 }]);
        self.rs_set_viewports(&[
            Viewport { top_left_x: 0.0, top_left_y: 0.0, width: 1920.0, height: 1080.0, min_depth: 0.0, max_depth: 1.0 },
            Viewport { top_left_x: 16.0, top_left_y: 16.0, width: 256.0, height: 256.0, min_depth: 0.0, max_depth: 0.5 },
        ]);
        self.rs_set_state(Some(&device.create_object("host_rasterizer")));
        self.om_set_blend_state(Some(&device.create_object("host_blend")), &[0.25, 0.5, 0.75, 1.0], 0x00FF_00FF);
        self.om_set_depth_stencil_state(Some(&device.create_object("host_depth_state")), 3);
        self.ps_set_shader_resources(0, &[Some(device.create_object("host_srv"))]);
        self.ps_set_samplers(0, &[Some(device.create_object("host_sampler"))]);
        self.ps_set_shader(
            Some(&device.create_object("host_ps")),
            &[Some(device.create_object("host_ps_instance0")), Some(device.create_object("host_ps_instance1"))],
        );
        self.vs_set_shader(
            Some(&device.create_object("host_vs")),
            &[Some(device.create_object("host_vs_instance0"))],
        );
        self.vs_set_constant_buffers(0, &[Some(device.create_object("host_vs_cb"))]);
        self.ia_set_primitive_topology(PrimitiveTopology::TriangleStrip);
        self.ia_set_index_buffer(Some(&device.create_object("host_ib")), Format::R16_UINT, 4);
        self.ia_set_vertex_buffers(0, &[Some(device.create_object("host_vb"))], &[32], &[8]);
        self.ia_set_input_layout(Some(&device.create_object("host_layout")));

        self.calls.clear();
    }

    /// Number of non-empty render target slots
    pub fn bound_render_target_count(&self) -> usize {
        self.render_targets.iter().filter(|v| v.is_some()).count()
    }
}

impl DeviceContext for MockContext {
    fn om_get_render_targets(&self, views: &mut [Option<RenderTargetView>]) -> Option<DepthStencilView> {
        copy_slots(&self.render_targets, 0, views);
        self.depth_stencil_view.clone()
    }

    fn om_set_render_targets(&mut self, views: &[Option<RenderTargetView>], depth_stencil: Option<&DepthStencilView>) {
        self.calls.push("om_set_render_targets");
        for (i, slot) in self.render_targets.iter_mut().enumerate() {
            *slot = views.get(i).cloned().flatten();
        }
        self.depth_stencil_view = depth_stencil.cloned();
    }

    fn om_get_blend_state(&self) -> (Option<BlendState>, [f32; 4], u32) {
        (self.blend_state.clone(), self.blend_factor, self.sample_mask)
    }

    fn om_set_blend_state(&mut self, state: Option<&BlendState>, blend_factor: &[f32; 4], sample_mask: u32) {
        self.calls.push("om_set_blend_state");
        self.blend_state = state.cloned();
        self.blend_factor = *blend_factor;
        self.sample_mask = sample_mask;
    }

    fn om_get_depth_stencil_state(&self) -> (Option<DepthStencilState>, u32) {
        (self.depth_stencil_state.clone(), self.stencil_ref)
    }

    fn om_set_depth_stencil_state(&mut self, state: Option<&DepthStencilState>, stencil_ref: u32) {
        self.calls.push("om_set_depth_stencil_state");
        self.depth_stencil_state = state.cloned();
        self.stencil_ref = stencil_ref;
    }

    fn rs_get_scissor_rects(&self, rects: &mut [Rect]) -> usize {
        let count = self.scissor_rects.len().min(rects.len());
        rects[..count].copy_from_slice(&self.scissor_rects[..count]);
        count
    }

    fn rs_set_scissor_rects(&mut self, rects: &[Rect]) {
        self.calls.push("rs_set_scissor_rects");
        self.scissor_rects = rects.to_vec();
    }

    fn rs_get_viewports(&self, viewports: &mut [Viewport]) -> usize {
        let count = self.viewports.len().min(viewports.len());
        viewports[..count].copy_from_slice(&self.viewports[..count]);
        count
    }

    fn rs_set_viewports(&mut self, viewports: &[Viewport]) {
        self.calls.push("rs_set_viewports");
        self.viewports = viewports.to_vec();
    }

    fn rs_get_state(&self) -> Option<RasterizerState> {
        self.rasterizer_state.clone()
    }

    fn rs_set_state(&mut self, state: Option<&RasterizerState>) {
        self.calls.push("rs_set_state");
        self.rasterizer_state = state.cloned();
    }

    fn ps_get_shader_resources(&self, start_slot: u32, views: &mut [Option<ShaderResourceView>]) {
        copy_slots(&self.ps_shader_resources, start_slot, views);
    }

    fn ps_set_shader_resources(&mut self, start_slot: u32, views: &[Option<ShaderResourceView>]) {
        self.calls.push("ps_set_shader_resources");
        bind_slots(&mut self.ps_shader_resources, start_slot, views);
    }

    fn ps_get_samplers(&self, start_slot: u32, samplers: &mut [Option<SamplerState>]) {
        copy_slots(&self.ps_samplers, start_slot, samplers);
    }

    fn ps_set_samplers(&mut self, start_slot: u32, samplers: &[Option<SamplerState>]) {
        self.calls.push("ps_set_samplers");
        bind_slots(&mut self.ps_samplers, start_slot, samplers);
    }

    fn ps_get_shader(&self, instances: &mut [Option<ClassInstance>]) -> (Option<PixelShader>, usize) {
        copy_slots(&self.ps_instances, 0, instances);
        (self.pixel_shader.clone(), self.ps_instances.len().min(instances.len()))
    }

    fn ps_set_shader(&mut self, shader: Option<&PixelShader>, instances: &[Option<ClassInstance>]) {
        self.calls.push("ps_set_shader");
        self.pixel_shader = shader.cloned();
        self.ps_instances = instances.to_vec();
    }

    fn vs_get_shader(&self, instances: &mut [Option<ClassInstance>]) -> (Option<VertexShader>, usize) {
        copy_slots(&self.vs_instances, 0, instances);
        (self.vertex_shader.clone(), self.vs_instances.len().min(instances.len()))
    }

    fn vs_set_shader(&mut self, shader: Option<&VertexShader>, instances: &[Option<ClassInstance>]) {
        self.calls.push("vs_set_shader");
        self.vertex_shader = shader.cloned();
        self.vs_instances = instances.to_vec();
    }

    fn vs_get_constant_buffers(&self, start_slot: u32, buffers: &mut [Option<Buffer>]) {
        copy_slots(&self.vs_constant_buffers, start_slot, buffers);
    }

    fn vs_set_constant_buffers(&mut self, start_slot: u32, buffers: &[Option<Buffer>]) {
        self.calls.push("vs_set_constant_buffers");
        bind_slots(&mut self.vs_constant_buffers, start_slot, buffers);
    }

    fn ia_get_primitive_topology(&self) -> PrimitiveTopology {
        self.topology
    }

    fn ia_set_primitive_topology(&mut self, topology: PrimitiveTopology) {
        self.calls.push("ia_set_primitive_topology");
        self.topology = topology;
    }

    fn ia_get_index_buffer(&self) -> (Option<Buffer>, Format, u32) {
        (self.index_buffer.clone(), self.index_format, self.index_offset)
    }

    fn ia_set_index_buffer(&mut self, buffer: Option<&Buffer>, format: Format, offset: u32) {
        self.calls.push("ia_set_index_buffer");
        self.index_buffer = buffer.cloned();
        self.index_format = format;
        self.index_offset = offset;
    }

    fn ia_get_vertex_buffers(
        &self,
        start_slot: u32,
        buffers: &mut [Option<Buffer>],
        strides: &mut [u32],
        offsets: &mut [u32],
    ) {
        copy_slots(&self.vertex_buffers, start_slot, buffers);
        for (i, (stride, offset)) in strides.iter_mut().zip(offsets.iter_mut()).enumerate() {
            let slot = start_slot as usize + i;
            *stride = self.vertex_strides.get(slot).copied().unwrap_or(0);
            *offset = self.vertex_offsets.get(slot).copied().unwrap_or(0);
        }
    }

    fn ia_set_vertex_buffers(
        &mut self,
        start_slot: u32,
        buffers: &[Option<Buffer>],
        strides: &[u32],
        offsets: &[u32],
    ) {
        self.calls.push("ia_set_vertex_buffers");
        bind_slots(&mut self.vertex_buffers, start_slot, buffers);
        for (i, (stride, offset)) in strides.iter().zip(offsets.iter()).enumerate() {
            let slot = start_slot as usize + i;
            if slot < MOCK_SLOT_COUNT {
                self.vertex_strides[slot] = *stride;
                self.vertex_offsets[slot] = *offset;
            }
        }
    }

    fn ia_get_input_layout(&self) -> Option<InputLayout> {
        self.input_layout.clone()
    }

    fn ia_set_input_layout(&mut self, layout: Option<&InputLayout>) {
        self.calls.push("ia_set_input_layout");
        self.input_layout = layout.cloned();
    }

    fn clear_render_target_view(&mut self, _view: &RenderTargetView, color: &[f32; 4]) {
        self.calls.push("clear_render_target_view");
        self.color_clears.push(*color);
    }

    fn clear_depth_stencil_view(&mut self, _view: &DepthStencilView, flags: ClearFlags, depth: f32, stencil: u8) {
        self.calls.push("clear_depth_stencil_view");
        self.depth_clears.push((flags, depth, stencil));
    }
}

// ============================================================================
// Mock RenderDevice
// ============================================================================

/// Mock host device wrapper; either half can be removed to simulate absence
#[derive(Debug)]
pub struct MockRenderDevice {
    pub device: Option<Arc<MockDevice>>,
    pub context: Option<MockContext>,
}

impl MockRenderDevice {
    pub fn new() -> Self {
        Self {
            device: Some(Arc::new(MockDevice::new())),
            context: Some(MockContext::new()),
        }
    }

    pub fn without_device() -> Self {
        Self { device: None, ..Self::new() }
    }

    pub fn without_context() -> Self {
        Self { context: None, ..Self::new() }
    }

    pub fn mock_device(&self) -> Arc<MockDevice> {
        Arc::clone(self.device.as_ref().unwrap())
    }

    pub fn mock_context(&self) -> &MockContext {
        self.context.as_ref().unwrap()
    }

    pub fn mock_context_mut(&mut self) -> &mut MockContext {
        self.context.as_mut().unwrap()
    }

    /// Bind the representative host pipeline on the context
    pub fn bind_host_state(&mut self) {
        let device = self.mock_device();
        self.mock_context_mut().bind_host_state(&device);
    }
}

impl RenderDevice for MockRenderDevice {
    fn device(&self) -> Option<&dyn GraphicsDevice> {
        self.device.as_deref().map(|d| d as &dyn GraphicsDevice)
    }

    fn context(&mut self) -> Option<&mut dyn DeviceContext> {
        self.context.as_mut().map(|c| c as &mut dyn DeviceContext)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "mock_device_tests.rs"]
mod tests;
