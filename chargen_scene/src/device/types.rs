/// Descriptor and value types of the device collaborator
///
/// Mirrors the subset of the Direct3D 11 vocabulary the scene uses.

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

/// Maximum number of simultaneously bound render targets
pub const SIMULTANEOUS_RENDER_TARGET_COUNT: usize = 8;

/// Maximum number of viewports / scissor rects per pipeline
pub const VIEWPORT_AND_SCISSORRECT_OBJECT_COUNT_PER_PIPELINE: usize = 16;

/// Maximum number of class instances bound to one shader stage
pub const MAX_CLASS_INSTANCES: usize = 256;

/// Resource and view format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(non_camel_case_types)]
pub enum Format {
    #[default]
    UNKNOWN,
    R8G8B8A8_UNORM,
    D24_UNORM_S8_UINT,
    R16_UINT,
    R32_UINT,
}

/// Input-assembler primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveTopology {
    #[default]
    Undefined,
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
}

/// Rasterizer viewport
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Viewport {
    pub top_left_x: f32,
    pub top_left_y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

/// Scissor rectangle
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Resource usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Usage {
    #[default]
    Default,
    Immutable,
    Dynamic,
    Staging,
}

bitflags! {
    /// Pipeline bind points a resource can be attached to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BindFlags: u32 {
        const VERTEX_BUFFER   = 0x1;
        const INDEX_BUFFER    = 0x2;
        const CONSTANT_BUFFER = 0x4;
        const SHADER_RESOURCE = 0x8;
        const RENDER_TARGET   = 0x20;
        const DEPTH_STENCIL   = 0x40;
    }
}

bitflags! {
    /// Planes cleared by `clear_depth_stencil_view`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ClearFlags: u32 {
        const DEPTH   = 0x1;
        const STENCIL = 0x2;
    }
}

/// 2D texture descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct Texture2dDesc {
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub array_size: u32,
    pub format: Format,
    pub sample_count: u32,
    pub sample_quality: u32,
    pub usage: Usage,
    pub bind_flags: BindFlags,
    pub cpu_access_flags: u32,
    pub misc_flags: u32,
}

impl Texture2dDesc {
    /// Single-mip, single-sample texture with default usage
    pub fn new(width: u32, height: u32, format: Format, bind_flags: BindFlags) -> Self {
        Self {
            width,
            height,
            mip_levels: 1,
            array_size: 1,
            format,
            sample_count: 1,
            sample_quality: 0,
            usage: Usage::Default,
            bind_flags,
            cpu_access_flags: 0,
            misc_flags: 0,
        }
    }
}

/// Render-target view over mip `mip_slice` of a 2D texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTargetViewDesc {
    pub format: Format,
    pub mip_slice: u32,
}

/// Shader-resource view over a mip range of a 2D texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderResourceViewDesc {
    pub format: Format,
    pub most_detailed_mip: u32,
    pub mip_levels: u32,
}

/// Depth-stencil view over mip `mip_slice` of a 2D texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilViewDesc {
    pub format: Format,
    pub mip_slice: u32,
}

/// Comparison used by depth and stencil tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Depth write mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthWriteMask {
    Zero,
    All,
}

/// Stencil buffer operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrSat,
    DecrSat,
    Invert,
    Incr,
    Decr,
}

/// Stencil operations for one face orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilOpDesc {
    pub stencil_fail_op: StencilOp,
    pub stencil_depth_fail_op: StencilOp,
    pub stencil_pass_op: StencilOp,
    pub stencil_func: ComparisonFunc,
}

/// Depth-stencil state descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilDesc {
    pub depth_enable: bool,
    pub depth_write_mask: DepthWriteMask,
    pub depth_func: ComparisonFunc,
    pub stencil_enable: bool,
    pub stencil_read_mask: u8,
    pub stencil_write_mask: u8,
    pub front_face: StencilOpDesc,
    pub back_face: StencilOpDesc,
}
