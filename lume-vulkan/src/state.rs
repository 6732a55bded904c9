//! Native-object pools for the explicit backend.
//!
//! One `RwLock<HashMap<Id<T>, State>>` per entity kind, the same shape as
//! `wgpu-core`'s per-backend `Storage<T, Id>` hub
//! (`other_examples/…wgpu-core-src-core_table.rs.rs`), but addressed by
//! `lume_core::Id<T>` directly instead of a macro-generated table. The
//! per-device `Arc<Inner>` + `Mutex`-guarded allocator comes straight from
//! the teacher's `VulkanDeviceInner`/`VulkanFrameSyncManager`
//! (`lume-vulkan/src/device/mod.rs`).

use ash::vk;
use gpu_allocator::vulkan::Allocation;
use lume_core::ids::*;
use lume_core::types::*;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) struct InstanceState {
    pub entry: ash::Entry,
    pub instance: ash::Instance,
    pub debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    pub debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
    /// Kept alive for as long as `debug_messenger` exists; its address is
    /// handed to Vulkan as the messenger's `pUserData`.
    pub debug_user_data: Option<Box<crate::instance::DebugUserData>>,
    pub surface_loader: ash::khr::surface::Instance,
}

pub(crate) struct AdapterState {
    pub instance: InstanceId,
    pub physical_device: vk::PhysicalDevice,
    pub properties: vk::PhysicalDeviceProperties,
    pub queue_family_index: u32,
}

pub(crate) struct DeviceState {
    pub adapter: AdapterId,
    pub device: ash::Device,
    pub allocator: Mutex<gpu_allocator::vulkan::Allocator>,
    pub queue: vk::Queue,
    pub queue_family_index: u32,
    pub command_pool: vk::CommandPool,
    pub descriptor_pool: vk::DescriptorPool,
    pub min_uniform_buffer_offset_alignment: u64,
}

pub(crate) struct QueueState {
    pub device: DeviceId,
}

pub(crate) struct BufferState {
    pub device: DeviceId,
    pub buffer: vk::Buffer,
    pub allocation: Option<Allocation>,
    pub size: u64,
    pub usage: BufferUsage,
}

pub(crate) struct TextureState {
    pub device: DeviceId,
    pub image: vk::Image,
    pub allocation: Option<Allocation>,
    pub format: TextureFormat,
    pub extent: Extent3d,
    pub mip_level_count: u32,
    pub array_layer_count: u32,
    pub current_layout: Mutex<TextureLayout>,
    /// `true` for swapchain images, whose `vk::Image` is owned by the
    /// swapchain and must not be destroyed here.
    pub borrowed: bool,
}

pub(crate) struct TextureViewState {
    pub texture: TextureId,
    pub device: DeviceId,
    pub view: vk::ImageView,
}

pub(crate) struct SamplerState {
    pub device: DeviceId,
    pub sampler: vk::Sampler,
}

pub(crate) struct ShaderState {
    pub device: DeviceId,
    pub module: vk::ShaderModule,
    pub stage: ShaderStage,
    pub entry_point: String,
}

pub(crate) struct BindGroupLayoutState {
    pub device: DeviceId,
    pub layout: vk::DescriptorSetLayout,
    pub entries: Vec<BindGroupLayoutEntry>,
}

pub(crate) struct BindGroupState {
    pub device: DeviceId,
    pub set: vk::DescriptorSet,
    pub layout: BindGroupLayoutId,
}

pub(crate) struct RenderPassState {
    pub device: DeviceId,
    pub render_pass: vk::RenderPass,
    pub desc: RenderPassDescriptor,
}

pub(crate) struct FramebufferState {
    pub device: DeviceId,
    pub framebuffer: vk::Framebuffer,
    pub render_pass: RenderPassId,
    pub extent: Extent3d,
}

pub(crate) struct PipelineState {
    pub device: DeviceId,
    pub pipeline: vk::Pipeline,
    pub layout: vk::PipelineLayout,
    pub bind_point: vk::PipelineBindPoint,
}

pub(crate) struct CommandEncoderState {
    pub device: DeviceId,
    pub command_buffer: vk::CommandBuffer,
}

pub(crate) struct FenceState {
    pub device: DeviceId,
    pub fence: vk::Fence,
}

pub(crate) struct SemaphoreState {
    pub device: DeviceId,
    pub semaphore: vk::Semaphore,
    pub semaphore_type: SemaphoreType,
}

pub(crate) struct QuerySetState {
    pub device: DeviceId,
    pub pool: vk::QueryPool,
    pub query_type: QueryType,
}

pub(crate) struct SurfaceState {
    pub instance: InstanceId,
    pub surface: vk::SurfaceKHR,
}

pub(crate) struct SwapchainState {
    pub device: DeviceId,
    pub surface: SurfaceId,
    pub loader: ash::khr::swapchain::Device,
    pub swapchain: vk::SwapchainKHR,
    pub views: Vec<TextureViewId>,
    pub textures: Vec<TextureId>,
    pub info: SwapchainInfo,
    pub current_image_index: Mutex<Option<u32>>,
}

/// One slot per entity kind; every method on `Backend` locks exactly one
/// (sometimes two, for a destroy-plus-lookup) of these maps.
#[derive(Default)]
pub(crate) struct Pools {
    pub instances: RwLock<HashMap<InstanceId, InstanceState>>,
    pub adapters: RwLock<HashMap<AdapterId, AdapterState>>,
    pub devices: RwLock<HashMap<DeviceId, Arc<DeviceState>>>,
    pub queues: RwLock<HashMap<QueueId, QueueState>>,
    pub buffers: RwLock<HashMap<BufferId, BufferState>>,
    pub textures: RwLock<HashMap<TextureId, TextureState>>,
    pub texture_views: RwLock<HashMap<TextureViewId, TextureViewState>>,
    pub samplers: RwLock<HashMap<SamplerId, SamplerState>>,
    pub shaders: RwLock<HashMap<ShaderId, ShaderState>>,
    pub bind_group_layouts: RwLock<HashMap<BindGroupLayoutId, BindGroupLayoutState>>,
    pub bind_groups: RwLock<HashMap<BindGroupId, BindGroupState>>,
    pub render_passes: RwLock<HashMap<RenderPassId, RenderPassState>>,
    pub framebuffers: RwLock<HashMap<FramebufferId, FramebufferState>>,
    pub render_pipelines: RwLock<HashMap<RenderPipelineId, PipelineState>>,
    pub compute_pipelines: RwLock<HashMap<ComputePipelineId, PipelineState>>,
    pub command_encoders: RwLock<HashMap<CommandEncoderId, CommandEncoderState>>,
    pub fences: RwLock<HashMap<FenceId, FenceState>>,
    pub semaphores: RwLock<HashMap<SemaphoreId, SemaphoreState>>,
    pub query_sets: RwLock<HashMap<QuerySetId, QuerySetState>>,
    pub surfaces: RwLock<HashMap<SurfaceId, SurfaceState>>,
    pub swapchains: RwLock<HashMap<SwapchainId, SwapchainState>>,
}

pub struct VulkanBackend {
    pub(crate) pools: Pools,
}

impl VulkanBackend {
    pub(crate) fn new() -> Self {
        VulkanBackend {
            pools: Pools::default(),
        }
    }
}
