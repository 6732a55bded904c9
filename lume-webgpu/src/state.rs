//! Native-object pools for the implicit backend.
//!
//! Same `RwLock<HashMap<Id<T>, State>>`-per-entity-kind shape as
//! `lume_vulkan::state`, with `wgpu` native handles in place of `vk::*`
//! ones. Render passes and framebuffers have no native `wgpu` object —
//! `wgpu` folds both into the `RenderPassDescriptor` built at
//! `BeginRenderPass` time (§4.2.2) — so their pool entries are plain
//! descriptor data, reified just enough to be looked up by handle.

use crate::blit::Blitter;
use lume_core::ids::*;
use lume_core::types::*;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) struct InstanceState {
    pub instance: wgpu::Instance,
}

pub(crate) struct AdapterState {
    pub instance: InstanceId,
    pub adapter: wgpu::Adapter,
}

pub(crate) struct DeviceState {
    pub adapter: AdapterId,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub limits: wgpu::Limits,
}

pub(crate) struct QueueState {
    pub device: DeviceId,
}

pub(crate) struct BufferState {
    pub device: DeviceId,
    pub buffer: wgpu::Buffer,
    pub size: u64,
    pub usage: BufferUsage,
    /// Host-side shadow for an in-progress `buffer_map_async`/`buffer_unmap`
    /// pair. `wgpu`'s mapped range borrows the buffer for a lifetime the
    /// `*mut u8` contract here can't express, so a map copies into this
    /// owned scratch and unmap writes it back (for `MapMode::Write`).
    pub mapped: Mutex<Option<(MapMode, u64, Vec<u8>)>>,
}

pub(crate) struct TextureState {
    pub device: DeviceId,
    pub texture: wgpu::Texture,
    pub format: TextureFormat,
    pub extent: Extent3d,
    pub mip_level_count: u32,
    pub array_layer_count: u32,
    pub current_layout: Mutex<TextureLayout>,
    /// `true` for the swapchain's current surface texture, whose presentation
    /// is driven by `Swapchain::present` rather than a native destroy here.
    pub borrowed: bool,
}

pub(crate) struct TextureViewState {
    pub texture: TextureId,
    pub device: DeviceId,
    pub view: wgpu::TextureView,
}

pub(crate) struct SamplerState {
    pub device: DeviceId,
    pub sampler: wgpu::Sampler,
}

pub(crate) struct ShaderState {
    pub device: DeviceId,
    pub module: wgpu::ShaderModule,
    pub stage: ShaderStage,
    pub entry_point: String,
}

pub(crate) struct BindGroupLayoutState {
    pub device: DeviceId,
    pub layout: wgpu::BindGroupLayout,
    pub entries: Vec<BindGroupLayoutEntry>,
}

pub(crate) struct BindGroupState {
    pub device: DeviceId,
    pub bind_group: wgpu::BindGroup,
    pub layout: BindGroupLayoutId,
}

/// No native `wgpu` object; kept only so `RenderPassId` can be looked up
/// when a pipeline or `BeginRenderPass` command references it.
pub(crate) struct RenderPassState {
    pub device: DeviceId,
    pub desc: RenderPassDescriptor,
}

/// Likewise reified: `wgpu` has no framebuffer object, the view list is
/// merged directly into a `wgpu::RenderPassDescriptor` at begin time.
pub(crate) struct FramebufferState {
    pub device: DeviceId,
    pub render_pass: RenderPassId,
    pub attachments: Vec<TextureViewId>,
    pub resolve_attachments: Vec<Option<TextureViewId>>,
    pub extent: Extent3d,
}

pub(crate) enum PipelineState {
    Render {
        pipeline: wgpu::RenderPipeline,
        device: DeviceId,
    },
    Compute {
        pipeline: wgpu::ComputePipeline,
        device: DeviceId,
    },
}

pub(crate) struct CommandEncoderState {
    pub device: DeviceId,
    pub encoder: Mutex<Option<wgpu::CommandEncoder>>,
    pub finished: Mutex<Option<wgpu::CommandBuffer>>,
}

pub(crate) struct FenceState {
    pub device: DeviceId,
    pub signaled: Mutex<bool>,
    pub submission: Mutex<Option<wgpu::SubmissionIndex>>,
}

pub(crate) struct SemaphoreState {
    pub device: DeviceId,
    pub semaphore_type: SemaphoreType,
    pub value: Mutex<u64>,
    pub condvar: parking_lot::Condvar,
}

pub(crate) struct QuerySetState {
    pub device: DeviceId,
    pub query_set: wgpu::QuerySet,
    pub query_type: QueryType,
    pub count: u32,
}

pub(crate) struct SurfaceState {
    pub instance: InstanceId,
    pub surface: wgpu::Surface<'static>,
}

pub(crate) struct SwapchainState {
    pub device: DeviceId,
    pub surface: SurfaceId,
    pub config: wgpu::SurfaceConfiguration,
    pub info: SwapchainInfo,
    /// The texture acquired by the most recent `swapchain_acquire_next`,
    /// held until `swapchain_present` consumes it. `wgpu::Surface` hands out
    /// one texture at a time rather than an indexed image array, so every
    /// acquire reuses image index 0 and replaces this slot.
    pub current: Mutex<Option<(wgpu::SurfaceTexture, TextureId, TextureViewId)>>,
}

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
    pub blitters: RwLock<HashMap<DeviceId, Arc<Blitter>>>,
}

pub struct WebGpuBackend {
    pub(crate) pools: Pools,
}

impl WebGpuBackend {
    pub(crate) fn new() -> Self {
        WebGpuBackend {
            pools: Pools::default(),
        }
    }
}
