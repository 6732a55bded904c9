//! Conversions between the backend-agnostic vocabulary and `wgpu` types.
//! The implicit backend's counterpart to `lume_vulkan::conv`.

use lume_core::format::TextureFormat;
use lume_core::types::{
    AddressMode, CompareFunction, FilterMode, FrontFace, LoadOp, PresentMode, PrimitiveTopology,
    StoreOp, TextureViewType, VertexFormat,
};

pub(crate) fn texture_format(fmt: TextureFormat) -> wgpu::TextureFormat {
    use TextureFormat::*;
    match fmt {
        R8Unorm => wgpu::TextureFormat::R8Unorm,
        R8G8Unorm => wgpu::TextureFormat::Rg8Unorm,
        R8G8B8A8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        R8G8B8A8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        B8G8R8A8Unorm => wgpu::TextureFormat::Bgra8Unorm,
        B8G8R8A8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
        R16Float => wgpu::TextureFormat::R16Float,
        Rg16Float => wgpu::TextureFormat::Rg16Float,
        Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        R32Float => wgpu::TextureFormat::R32Float,
        Rg32Float => wgpu::TextureFormat::Rg32Float,
        Rgba32Float => wgpu::TextureFormat::Rgba32Float,
        Depth16Unorm => wgpu::TextureFormat::Depth16Unorm,
        Depth24Plus => wgpu::TextureFormat::Depth24Plus,
        Depth32Float => wgpu::TextureFormat::Depth32Float,
        Depth24PlusStencil8 => wgpu::TextureFormat::Depth24PlusStencil8,
        Depth32FloatStencil8 => wgpu::TextureFormat::Depth32FloatStencil8,
        Stencil8 => wgpu::TextureFormat::Stencil8,
    }
}

pub(crate) fn texture_format_from_wgpu(fmt: wgpu::TextureFormat) -> TextureFormat {
    match fmt {
        wgpu::TextureFormat::R8Unorm => TextureFormat::R8Unorm,
        wgpu::TextureFormat::Rg8Unorm => TextureFormat::R8G8Unorm,
        wgpu::TextureFormat::Rgba8Unorm => TextureFormat::R8G8B8A8Unorm,
        wgpu::TextureFormat::Rgba8UnormSrgb => TextureFormat::R8G8B8A8UnormSrgb,
        wgpu::TextureFormat::Bgra8UnormSrgb => TextureFormat::B8G8R8A8UnormSrgb,
        _ => TextureFormat::B8G8R8A8Unorm,
    }
}

pub(crate) fn filter(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

pub(crate) fn address_mode(mode: AddressMode) -> wgpu::AddressMode {
    match mode {
        AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        AddressMode::Repeat => wgpu::AddressMode::Repeat,
        AddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

pub(crate) fn compare_function(func: CompareFunction) -> wgpu::CompareFunction {
    match func {
        CompareFunction::Never => wgpu::CompareFunction::Never,
        CompareFunction::Less => wgpu::CompareFunction::Less,
        CompareFunction::Equal => wgpu::CompareFunction::Equal,
        CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunction::Greater => wgpu::CompareFunction::Greater,
        CompareFunction::NotEqual => wgpu::CompareFunction::NotEqual,
        CompareFunction::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        CompareFunction::Always => wgpu::CompareFunction::Always,
    }
}

pub(crate) fn primitive_topology(topology: PrimitiveTopology) -> wgpu::PrimitiveTopology {
    match topology {
        PrimitiveTopology::PointList => wgpu::PrimitiveTopology::PointList,
        PrimitiveTopology::LineList => wgpu::PrimitiveTopology::LineList,
        PrimitiveTopology::LineStrip => wgpu::PrimitiveTopology::LineStrip,
        PrimitiveTopology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
        PrimitiveTopology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

pub(crate) fn front_face(face: FrontFace) -> wgpu::FrontFace {
    match face {
        FrontFace::Ccw => wgpu::FrontFace::Ccw,
        FrontFace::Cw => wgpu::FrontFace::Cw,
    }
}

pub(crate) fn vertex_format(format: VertexFormat) -> wgpu::VertexFormat {
    match format {
        VertexFormat::Float32 => wgpu::VertexFormat::Float32,
        VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
        VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
        VertexFormat::Uint32 => wgpu::VertexFormat::Uint32,
        VertexFormat::Sint32 => wgpu::VertexFormat::Sint32,
    }
}

pub(crate) fn load_op<T: Copy>(op: LoadOp, clear: T) -> wgpu::LoadOp<T> {
    match op {
        LoadOp::Load => wgpu::LoadOp::Load,
        LoadOp::Clear => wgpu::LoadOp::Clear(clear),
    }
}

pub(crate) fn store_op(op: StoreOp) -> wgpu::StoreOp {
    match op {
        StoreOp::Store => wgpu::StoreOp::Store,
        StoreOp::Discard => wgpu::StoreOp::Discard,
    }
}

pub(crate) fn present_mode(mode: PresentMode) -> wgpu::PresentMode {
    match mode {
        PresentMode::Immediate => wgpu::PresentMode::Immediate,
        PresentMode::Fifo => wgpu::PresentMode::Fifo,
        PresentMode::FifoRelaxed => wgpu::PresentMode::FifoRelaxed,
        PresentMode::Mailbox => wgpu::PresentMode::Mailbox,
    }
}

pub(crate) fn present_mode_from_wgpu(mode: wgpu::PresentMode) -> PresentMode {
    match mode {
        wgpu::PresentMode::Immediate => PresentMode::Immediate,
        wgpu::PresentMode::Mailbox => PresentMode::Mailbox,
        wgpu::PresentMode::FifoRelaxed => PresentMode::FifoRelaxed,
        _ => PresentMode::Fifo,
    }
}

pub(crate) fn texture_view_dimension(view_type: TextureViewType) -> wgpu::TextureViewDimension {
    match view_type {
        TextureViewType::D1 => wgpu::TextureViewDimension::D1,
        TextureViewType::D2 => wgpu::TextureViewDimension::D2,
        TextureViewType::D2Array => wgpu::TextureViewDimension::D2Array,
        TextureViewType::D3 => wgpu::TextureViewDimension::D3,
        TextureViewType::Cube => wgpu::TextureViewDimension::Cube,
        TextureViewType::CubeArray => wgpu::TextureViewDimension::CubeArray,
    }
}

/// Rounds `offset` up to the next multiple of `alignment`, used to validate
/// dynamic uniform offsets the way the explicit backend's driver would
/// reject a misaligned `vkCmdBindDescriptorSets` offset implicitly.
pub(crate) fn align_up(offset: u32, alignment: u32) -> u32 {
    if alignment == 0 {
        return offset;
    }
    (offset + alignment - 1) / alignment * alignment
}
