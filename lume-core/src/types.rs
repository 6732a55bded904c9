//! Shared descriptor and enum vocabulary (§3, §6).
//!
//! Usage bit-fields are `bitflags` sets rather than the teacher's hand-rolled
//! `BitOr` impls, following `wgpu-hal`'s own `bitflags` dependency (present
//! in this same example pack). Every bitmask reserves bit 0 for `NONE = 0`,
//! as §6 requires.

use crate::format::TextureFormat;
use crate::ids::{BindGroupLayoutId, BufferId, RenderPassId, SamplerId, ShaderId, TextureViewId};
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const NONE      = 0;
        const VERTEX    = 1 << 0;
        const INDEX     = 1 << 1;
        const UNIFORM   = 1 << 2;
        const STORAGE   = 1 << 3;
        const INDIRECT  = 1 << 4;
        const COPY_SRC  = 1 << 5;
        const COPY_DST  = 1 << 6;
        const MAP_READ  = 1 << 7;
        const MAP_WRITE = 1 << 8;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        const NONE                = 0;
        const COPY_SRC            = 1 << 0;
        const COPY_DST            = 1 << 1;
        const TEXTURE_BINDING     = 1 << 2;
        const STORAGE_BINDING     = 1 << 3;
        const COLOR_ATTACHMENT    = 1 << 4;
        const DEPTH_STENCIL_ATTACHMENT = 1 << 5;
        const TRANSIENT_ATTACHMENT = 1 << 6;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStage: u32 {
        const NONE    = 0;
        const VERTEX  = 1 << 0;
        const FRAGMENT = 1 << 1;
        const COMPUTE = 1 << 2;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorWriteMask: u32 {
        const NONE  = 0;
        const RED   = 1 << 0;
        const GREEN = 1 << 1;
        const BLUE  = 1 << 2;
        const ALPHA = 1 << 3;
        const ALL   = Self::RED.bits() | Self::GREEN.bits() | Self::BLUE.bits() | Self::ALPHA.bits();
    }
}

bitflags! {
    /// Pipeline stage mask used by the explicit backend's barrier API
    /// (§4.2.1); the implicit backend never constructs one of these but the
    /// trait signature must still accept it uniformly.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PipelineStage: u32 {
        const NONE             = 0;
        const TOP_OF_PIPE      = 1 << 0;
        const DRAW_INDIRECT    = 1 << 1;
        const VERTEX_INPUT     = 1 << 2;
        const VERTEX_SHADER    = 1 << 3;
        const FRAGMENT_SHADER  = 1 << 4;
        const EARLY_FRAGMENT_TESTS = 1 << 5;
        const LATE_FRAGMENT_TESTS  = 1 << 6;
        const COLOR_ATTACHMENT_OUTPUT = 1 << 7;
        const COMPUTE_SHADER   = 1 << 8;
        const TRANSFER         = 1 << 9;
        const BOTTOM_OF_PIPE   = 1 << 10;
        const HOST             = 1 << 11;
    }
}

bitflags! {
    /// Canonical access set for a layout, produced by the helper table in
    /// §4.2.1 (`lume_vulkan::conv::access_flags_for_layout`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u32 {
        const NONE                     = 0;
        const INDIRECT_COMMAND_READ    = 1 << 0;
        const INDEX_READ               = 1 << 1;
        const VERTEX_ATTRIBUTE_READ    = 1 << 2;
        const UNIFORM_READ             = 1 << 3;
        const SHADER_READ              = 1 << 4;
        const SHADER_WRITE             = 1 << 5;
        const COLOR_ATTACHMENT_READ    = 1 << 6;
        const COLOR_ATTACHMENT_WRITE   = 1 << 7;
        const DEPTH_STENCIL_ATTACHMENT_READ  = 1 << 8;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 1 << 9;
        const TRANSFER_READ            = 1 << 10;
        const TRANSFER_WRITE           = 1 << 11;
        const HOST_READ                = 1 << 12;
        const HOST_WRITE               = 1 << 13;
    }
}

/// Logical texture layout, tracked uniformly on both backends per I6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureLayout {
    Undefined,
    General,
    ColorAttachment,
    DepthStencilAttachment,
    DepthStencilReadOnly,
    ShaderReadOnly,
    CopySrc,
    CopyDst,
    PresentSrc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    D1,
    D2,
    D3,
    Cube,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureViewType {
    D1,
    D2,
    D2Array,
    D3,
    Cube,
    CubeArray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent3d {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

#[derive(Debug, Clone)]
pub struct BufferDescriptor {
    pub size: u64,
    pub usage: BufferUsage,
    pub mapped_at_creation: bool,
}

#[derive(Debug, Clone)]
pub struct BufferInfo {
    pub size: u64,
    pub usage: BufferUsage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMode {
    Read,
    Write,
}

#[derive(Debug, Clone)]
pub struct TextureDescriptor {
    pub texture_type: TextureType,
    pub extent: Extent3d,
    pub array_layer_count: u32,
    pub mip_level_count: u32,
    pub sample_count: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
}

#[derive(Debug, Clone)]
pub struct TextureViewDescriptor {
    pub view_type: TextureViewType,
    pub format: TextureFormat,
    pub base_mip_level: u32,
    pub mip_level_count: u32,
    pub base_array_layer: u32,
    pub array_layer_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    ClampToEdge,
    Repeat,
    MirrorRepeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareFunction {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

#[derive(Debug, Clone)]
pub struct SamplerDescriptor {
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub mipmap_filter: FilterMode,
    pub address_mode_u: AddressMode,
    pub address_mode_v: AddressMode,
    pub address_mode_w: AddressMode,
    pub lod_min_clamp: f32,
    pub lod_max_clamp: f32,
    pub compare: Option<CompareFunction>,
    pub max_anisotropy: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderSourceType {
    Wgsl,
    Spirv,
}

#[derive(Debug, Clone)]
pub struct ShaderDescriptor {
    pub source_type: ShaderSourceType,
    pub bytes: std::sync::Arc<[u8]>,
    pub entry_point: String,
    pub stage: ShaderStage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferBindingLayout {
    Buffer {
        has_dynamic_offset: bool,
        min_binding_size: u64,
    },
    Sampler {
        comparison: bool,
    },
    Texture {
        multisampled: bool,
        view_dimension: TextureViewType,
    },
    StorageTexture {
        format: TextureFormat,
        write_only: bool,
        view_dimension: TextureViewType,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct BindGroupLayoutEntry {
    pub binding: u32,
    pub visibility: ShaderStage,
    pub resource: BufferBindingLayout,
}

#[derive(Debug, Clone)]
pub struct BindGroupLayoutDescriptor {
    pub entries: Vec<BindGroupLayoutEntry>,
}

#[derive(Debug, Clone)]
pub enum BindGroupResource {
    Buffer {
        buffer: BufferId,
        offset: u64,
        size: u64,
    },
    TextureView(TextureViewId),
    Sampler(SamplerId),
}

#[derive(Debug, Clone)]
pub struct BindGroupEntry {
    pub binding: u32,
    pub resource: BindGroupResource,
}

#[derive(Debug, Clone)]
pub struct BindGroupDescriptor {
    pub layout: BindGroupLayoutId,
    pub entries: Vec<BindGroupEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    Load,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Store,
    Discard,
}

#[derive(Debug, Clone, Copy)]
pub struct ColorAttachmentDescriptor {
    pub format: TextureFormat,
    pub sample_count: u32,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub final_layout: TextureLayout,
    pub resolve: Option<ResolveAttachmentDescriptor>,
}

#[derive(Debug, Clone, Copy)]
pub struct ResolveAttachmentDescriptor {
    pub format: TextureFormat,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub final_layout: TextureLayout,
}

#[derive(Debug, Clone, Copy)]
pub struct DepthStencilAttachmentDescriptor {
    pub format: TextureFormat,
    pub sample_count: u32,
    pub depth_load_op: LoadOp,
    pub depth_store_op: StoreOp,
    pub stencil_load_op: LoadOp,
    pub stencil_store_op: StoreOp,
    pub final_layout: TextureLayout,
}

#[derive(Debug, Clone)]
pub struct RenderPassDescriptor {
    pub color_attachments: Vec<ColorAttachmentDescriptor>,
    pub depth_stencil_attachment: Option<DepthStencilAttachmentDescriptor>,
}

#[derive(Debug, Clone, Copy)]
pub struct ClearColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

#[derive(Debug, Clone)]
pub struct RenderPassBeginDescriptor {
    pub render_pass: RenderPassId,
    pub framebuffer: crate::ids::FramebufferId,
    pub clear_colors: Vec<ClearColor>,
    pub clear_depth: f32,
    pub clear_stencil: u32,
    pub render_extent: Extent3d,
}

#[derive(Debug, Clone)]
pub struct FramebufferDescriptor {
    pub render_pass: RenderPassId,
    pub attachments: Vec<TextureViewId>,
    pub resolve_attachments: Vec<Option<TextureViewId>>,
    pub extent: Extent3d,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontFace {
    Ccw,
    Cw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonMode {
    Fill,
    Line,
    Point,
}

#[derive(Debug, Clone, Copy)]
pub struct PrimitiveState {
    pub topology: PrimitiveTopology,
    pub front_face: FrontFace,
    pub cull_mode: CullMode,
    pub polygon_mode: PolygonMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexFormat {
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
    Uint32,
    Sint32,
}

#[derive(Debug, Clone, Copy)]
pub struct VertexAttribute {
    pub format: VertexFormat,
    pub offset: u64,
    pub shader_location: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexStepMode {
    Vertex,
    Instance,
}

#[derive(Debug, Clone)]
pub struct VertexBufferLayout {
    pub stride: u64,
    pub step_mode: VertexStepMode,
    pub attributes: Vec<VertexAttribute>,
}

#[derive(Debug, Clone)]
pub struct VertexState {
    pub shader: ShaderId,
    pub entry_point: String,
    pub buffers: Vec<VertexBufferLayout>,
}

#[derive(Debug, Clone, Copy)]
pub struct ColorTargetState {
    pub format: TextureFormat,
    pub write_mask: ColorWriteMask,
    pub blend_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct FragmentState {
    pub shader: ShaderId,
    pub entry_point: String,
    pub targets: Vec<ColorTargetState>,
}

#[derive(Debug, Clone, Copy)]
pub struct DepthStencilState {
    pub format: TextureFormat,
    pub depth_write_enabled: bool,
    pub depth_compare: CompareFunction,
}

#[derive(Debug, Clone)]
pub struct RenderPipelineDescriptor {
    pub vertex: VertexState,
    pub fragment: Option<FragmentState>,
    pub primitive: PrimitiveState,
    pub depth_stencil: Option<DepthStencilState>,
    pub sample_count: u32,
    pub render_pass: RenderPassId,
    pub bind_group_layouts: Vec<BindGroupLayoutId>,
}

#[derive(Debug, Clone)]
pub struct ComputePipelineDescriptor {
    pub shader: ShaderId,
    pub entry_point: String,
    pub bind_group_layouts: Vec<BindGroupLayoutId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Occlusion,
    Timestamp,
}

#[derive(Debug, Clone, Copy)]
pub struct QuerySetDescriptor {
    pub query_type: QueryType,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemaphoreType {
    Binary,
    Timeline,
}

#[derive(Debug, Clone, Copy)]
pub struct SemaphoreDescriptor {
    pub semaphore_type: SemaphoreType,
    pub initial_value: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct FenceDescriptor {
    pub signaled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterType {
    Discrete,
    Integrated,
    Cpu,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct AdapterInfo {
    pub vendor_id: u32,
    pub device_id: u32,
    pub name: String,
    pub adapter_type: AdapterType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerPreference {
    HighPerformance,
    LowPower,
    NoPreference,
}

#[derive(Debug, Clone)]
pub struct DeviceLimits {
    pub min_uniform_buffer_offset_alignment: u64,
    pub max_bind_groups: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentMode {
    Immediate,
    Fifo,
    FifoRelaxed,
    Mailbox,
}

#[derive(Debug, Clone)]
pub struct SwapchainRequest {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
    pub present_mode: PresentMode,
    pub min_image_count: u32,
}

#[derive(Debug, Clone)]
pub struct SwapchainInfo {
    pub format: TextureFormat,
    pub extent: Extent3d,
    pub present_mode: PresentMode,
    pub image_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    Verbose,
    Info,
    Warning,
    Error,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DebugMessageType: u32 {
        const NONE = 0;
        const GENERAL     = 1 << 0;
        const VALIDATION  = 1 << 1;
        const PERFORMANCE = 1 << 2;
    }
}

/// Opaque, platform-tagged window handle (§4.3). Variants mirror the
/// platform families the original `PlatformWindowHandle` union names.
#[derive(Debug, Clone, Copy)]
pub enum PlatformWindowHandle {
    Win32 {
        hwnd: *mut std::ffi::c_void,
        hinstance: *mut std::ffi::c_void,
    },
    Xlib {
        window: u64,
        display: *mut std::ffi::c_void,
    },
    Wayland {
        surface: *mut std::ffi::c_void,
        display: *mut std::ffi::c_void,
    },
    Metal {
        layer: *mut std::ffi::c_void,
    },
    Web {
        canvas_selector: String,
    },
}

/// Safety: the raw pointers are opaque platform handles passed straight
/// through to the windowing backend; the library never dereferences them
/// itself, only the backend-native surface constructor does, under the same
/// thread-confinement rules as the rest of the Device.
unsafe impl Send for PlatformWindowHandle {}
unsafe impl Sync for PlatformWindowHandle {}
