//! Conversions between the backend-agnostic vocabulary and Vulkan types,
//! plus the §4.2.1 access-flags helper table.

use ash::vk;
use lume_core::format::TextureFormat;
use lume_core::types::{
    AccessFlags, AddressMode, CompareFunction, FilterMode, FrontFace, PipelineStage,
    PresentMode, PrimitiveTopology, TextureLayout, TextureUsage, VertexFormat,
};

pub(crate) fn texture_format(fmt: TextureFormat) -> vk::Format {
    use TextureFormat::*;
    match fmt {
        R8Unorm => vk::Format::R8_UNORM,
        R8G8Unorm => vk::Format::R8G8_UNORM,
        R8G8B8A8Unorm => vk::Format::R8G8B8A8_UNORM,
        R8G8B8A8UnormSrgb => vk::Format::R8G8B8A8_SRGB,
        B8G8R8A8Unorm => vk::Format::B8G8R8A8_UNORM,
        B8G8R8A8UnormSrgb => vk::Format::B8G8R8A8_SRGB,
        R16Float => vk::Format::R16_SFLOAT,
        Rg16Float => vk::Format::R16G16_SFLOAT,
        Rgba16Float => vk::Format::R16G16B16A16_SFLOAT,
        R32Float => vk::Format::R32_SFLOAT,
        Rg32Float => vk::Format::R32G32_SFLOAT,
        Rgba32Float => vk::Format::R32G32B32A32_SFLOAT,
        Depth16Unorm => vk::Format::D16_UNORM,
        Depth24Plus => vk::Format::X8_D24_UNORM_PACK32,
        Depth32Float => vk::Format::D32_SFLOAT,
        Depth24PlusStencil8 => vk::Format::D24_UNORM_S8_UINT,
        Depth32FloatStencil8 => vk::Format::D32_SFLOAT_S8_UINT,
        Stencil8 => vk::Format::S8_UINT,
    }
}

pub(crate) fn image_layout(layout: TextureLayout) -> vk::ImageLayout {
    match layout {
        TextureLayout::Undefined => vk::ImageLayout::UNDEFINED,
        TextureLayout::General => vk::ImageLayout::GENERAL,
        TextureLayout::ColorAttachment => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        TextureLayout::DepthStencilAttachment => vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        TextureLayout::DepthStencilReadOnly => vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
        TextureLayout::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        TextureLayout::CopySrc => vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        TextureLayout::CopyDst => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        TextureLayout::PresentSrc => vk::ImageLayout::PRESENT_SRC_KHR,
    }
}

pub(crate) fn image_usage(usage: TextureUsage) -> vk::ImageUsageFlags {
    let mut flags = vk::ImageUsageFlags::empty();
    if usage.contains(TextureUsage::COPY_SRC) {
        flags |= vk::ImageUsageFlags::TRANSFER_SRC;
    }
    if usage.contains(TextureUsage::COPY_DST) {
        flags |= vk::ImageUsageFlags::TRANSFER_DST;
    }
    if usage.contains(TextureUsage::TEXTURE_BINDING) {
        flags |= vk::ImageUsageFlags::SAMPLED;
    }
    if usage.contains(TextureUsage::STORAGE_BINDING) {
        flags |= vk::ImageUsageFlags::STORAGE;
    }
    if usage.contains(TextureUsage::COLOR_ATTACHMENT) {
        flags |= vk::ImageUsageFlags::COLOR_ATTACHMENT;
    }
    if usage.contains(TextureUsage::DEPTH_STENCIL_ATTACHMENT) {
        flags |= vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT;
    }
    if usage.contains(TextureUsage::TRANSIENT_ATTACHMENT) {
        flags |= vk::ImageUsageFlags::TRANSIENT_ATTACHMENT;
    }
    flags
}

pub(crate) fn pipeline_stage(stage: PipelineStage) -> vk::PipelineStageFlags {
    let mut flags = vk::PipelineStageFlags::empty();
    if stage.contains(PipelineStage::TOP_OF_PIPE) {
        flags |= vk::PipelineStageFlags::TOP_OF_PIPE;
    }
    if stage.contains(PipelineStage::DRAW_INDIRECT) {
        flags |= vk::PipelineStageFlags::DRAW_INDIRECT;
    }
    if stage.contains(PipelineStage::VERTEX_INPUT) {
        flags |= vk::PipelineStageFlags::VERTEX_INPUT;
    }
    if stage.contains(PipelineStage::VERTEX_SHADER) {
        flags |= vk::PipelineStageFlags::VERTEX_SHADER;
    }
    if stage.contains(PipelineStage::FRAGMENT_SHADER) {
        flags |= vk::PipelineStageFlags::FRAGMENT_SHADER;
    }
    if stage.contains(PipelineStage::EARLY_FRAGMENT_TESTS) {
        flags |= vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS;
    }
    if stage.contains(PipelineStage::LATE_FRAGMENT_TESTS) {
        flags |= vk::PipelineStageFlags::LATE_FRAGMENT_TESTS;
    }
    if stage.contains(PipelineStage::COLOR_ATTACHMENT_OUTPUT) {
        flags |= vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT;
    }
    if stage.contains(PipelineStage::COMPUTE_SHADER) {
        flags |= vk::PipelineStageFlags::COMPUTE_SHADER;
    }
    if stage.contains(PipelineStage::TRANSFER) {
        flags |= vk::PipelineStageFlags::TRANSFER;
    }
    if stage.contains(PipelineStage::BOTTOM_OF_PIPE) {
        flags |= vk::PipelineStageFlags::BOTTOM_OF_PIPE;
    }
    if stage.contains(PipelineStage::HOST) {
        flags |= vk::PipelineStageFlags::HOST;
    }
    flags
}

/// The §4.2.1 helper table: every supported layout's canonical access set.
pub(crate) fn access_flags_for_layout(layout: TextureLayout) -> AccessFlags {
    match layout {
        TextureLayout::Undefined => AccessFlags::NONE,
        TextureLayout::General => AccessFlags::SHADER_READ | AccessFlags::SHADER_WRITE,
        TextureLayout::ColorAttachment => AccessFlags::COLOR_ATTACHMENT_WRITE,
        TextureLayout::DepthStencilAttachment => AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        TextureLayout::DepthStencilReadOnly => AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ,
        TextureLayout::ShaderReadOnly => AccessFlags::SHADER_READ,
        TextureLayout::CopySrc => AccessFlags::TRANSFER_READ,
        TextureLayout::CopyDst => AccessFlags::TRANSFER_WRITE,
        TextureLayout::PresentSrc => AccessFlags::NONE,
    }
}

pub(crate) fn access_flags(access: AccessFlags) -> vk::AccessFlags {
    let mut flags = vk::AccessFlags::empty();
    if access.contains(AccessFlags::INDIRECT_COMMAND_READ) {
        flags |= vk::AccessFlags::INDIRECT_COMMAND_READ;
    }
    if access.contains(AccessFlags::INDEX_READ) {
        flags |= vk::AccessFlags::INDEX_READ;
    }
    if access.contains(AccessFlags::VERTEX_ATTRIBUTE_READ) {
        flags |= vk::AccessFlags::VERTEX_ATTRIBUTE_READ;
    }
    if access.contains(AccessFlags::UNIFORM_READ) {
        flags |= vk::AccessFlags::UNIFORM_READ;
    }
    if access.contains(AccessFlags::SHADER_READ) {
        flags |= vk::AccessFlags::SHADER_READ;
    }
    if access.contains(AccessFlags::SHADER_WRITE) {
        flags |= vk::AccessFlags::SHADER_WRITE;
    }
    if access.contains(AccessFlags::COLOR_ATTACHMENT_READ) {
        flags |= vk::AccessFlags::COLOR_ATTACHMENT_READ;
    }
    if access.contains(AccessFlags::COLOR_ATTACHMENT_WRITE) {
        flags |= vk::AccessFlags::COLOR_ATTACHMENT_WRITE;
    }
    if access.contains(AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ) {
        flags |= vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ;
    }
    if access.contains(AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE) {
        flags |= vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE;
    }
    if access.contains(AccessFlags::TRANSFER_READ) {
        flags |= vk::AccessFlags::TRANSFER_READ;
    }
    if access.contains(AccessFlags::TRANSFER_WRITE) {
        flags |= vk::AccessFlags::TRANSFER_WRITE;
    }
    if access.contains(AccessFlags::HOST_READ) {
        flags |= vk::AccessFlags::HOST_READ;
    }
    if access.contains(AccessFlags::HOST_WRITE) {
        flags |= vk::AccessFlags::HOST_WRITE;
    }
    flags
}

pub(crate) fn filter(mode: FilterMode) -> vk::Filter {
    match mode {
        FilterMode::Nearest => vk::Filter::NEAREST,
        FilterMode::Linear => vk::Filter::LINEAR,
    }
}

pub(crate) fn address_mode(mode: AddressMode) -> vk::SamplerAddressMode {
    match mode {
        AddressMode::ClampToEdge => vk::SamplerAddressMode::CLAMP_TO_EDGE,
        AddressMode::Repeat => vk::SamplerAddressMode::REPEAT,
        AddressMode::MirrorRepeat => vk::SamplerAddressMode::MIRRORED_REPEAT,
    }
}

pub(crate) fn compare_op(func: CompareFunction) -> vk::CompareOp {
    match func {
        CompareFunction::Never => vk::CompareOp::NEVER,
        CompareFunction::Less => vk::CompareOp::LESS,
        CompareFunction::Equal => vk::CompareOp::EQUAL,
        CompareFunction::LessEqual => vk::CompareOp::LESS_OR_EQUAL,
        CompareFunction::Greater => vk::CompareOp::GREATER,
        CompareFunction::NotEqual => vk::CompareOp::NOT_EQUAL,
        CompareFunction::GreaterEqual => vk::CompareOp::GREATER_OR_EQUAL,
        CompareFunction::Always => vk::CompareOp::ALWAYS,
    }
}

pub(crate) fn primitive_topology(topology: PrimitiveTopology) -> vk::PrimitiveTopology {
    match topology {
        PrimitiveTopology::PointList => vk::PrimitiveTopology::POINT_LIST,
        PrimitiveTopology::LineList => vk::PrimitiveTopology::LINE_LIST,
        PrimitiveTopology::LineStrip => vk::PrimitiveTopology::LINE_STRIP,
        PrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
        PrimitiveTopology::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
    }
}

pub(crate) fn front_face(face: FrontFace) -> vk::FrontFace {
    match face {
        FrontFace::Ccw => vk::FrontFace::COUNTER_CLOCKWISE,
        FrontFace::Cw => vk::FrontFace::CLOCKWISE,
    }
}

pub(crate) fn vertex_format(format: VertexFormat) -> vk::Format {
    match format {
        VertexFormat::Float32 => vk::Format::R32_SFLOAT,
        VertexFormat::Float32x2 => vk::Format::R32G32_SFLOAT,
        VertexFormat::Float32x3 => vk::Format::R32G32B32_SFLOAT,
        VertexFormat::Float32x4 => vk::Format::R32G32B32A32_SFLOAT,
        VertexFormat::Uint32 => vk::Format::R32_UINT,
        VertexFormat::Sint32 => vk::Format::R32_SINT,
    }
}

pub(crate) fn present_mode(mode: PresentMode) -> vk::PresentModeKHR {
    match mode {
        PresentMode::Immediate => vk::PresentModeKHR::IMMEDIATE,
        PresentMode::Fifo => vk::PresentModeKHR::FIFO,
        PresentMode::FifoRelaxed => vk::PresentModeKHR::FIFO_RELAXED,
        PresentMode::Mailbox => vk::PresentModeKHR::MAILBOX,
    }
}

pub(crate) fn present_mode_from_vk(mode: vk::PresentModeKHR) -> PresentMode {
    match mode {
        vk::PresentModeKHR::IMMEDIATE => PresentMode::Immediate,
        vk::PresentModeKHR::MAILBOX => PresentMode::Mailbox,
        vk::PresentModeKHR::FIFO_RELAXED => PresentMode::FifoRelaxed,
        _ => PresentMode::Fifo,
    }
}
