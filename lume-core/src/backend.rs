//! The one polymorphic operation table (§4.1).
//!
//! `Backend` is the trait every driver family implements in full; the
//! front-end wrapper types in this crate never touch a backend SDK
//! directly, they resolve a handle through [`crate::registry::Registry`]
//! and call through this trait object. The method roster mirrors
//! `original_source/gfx/src/GfxBackend.h`'s `GfxBackendAPI` function table
//! one-for-one: that header is the ground truth for which operations must
//! exist and in what grouping.
//!
//! No method may silently no-op where the public API promises behavior;
//! the implicit backend's documented no-ops (binary semaphores, layout
//! barriers) still validate their arguments and return `Ok(())`/a real
//! handle, they just skip emitting backend-native work.

use crate::error::{LumeError, LumeResult};
use crate::ids::*;
use crate::types::*;

/// Command recorded into a `CommandEncoder` before submission. Kept as a
/// backend-agnostic enum here so front-end recording methods can push onto
/// a plain `Vec<Command>` and hand the whole stream to the backend at
/// `encoder_end` / `queue_submit` time; each backend's translator walks the
/// stream once and lowers it to its native recorder (§4.2).
#[derive(Debug, Clone)]
pub enum Command {
    TextureBarrier {
        texture: TextureId,
        old_layout: TextureLayout,
        new_layout: TextureLayout,
        src_stage: PipelineStage,
        dst_stage: PipelineStage,
        base_mip_level: u32,
        mip_level_count: u32,
        base_array_layer: u32,
        array_layer_count: u32,
    },
    BeginRenderPass(RenderPassBeginDescriptor),
    EndRenderPass,
    BindRenderPipeline(RenderPipelineId),
    BindComputePipeline(ComputePipelineId),
    SetBindGroup {
        index: u32,
        bind_group: BindGroupId,
        dynamic_offsets: Vec<u32>,
    },
    SetVertexBuffer {
        slot: u32,
        buffer: BufferId,
        offset: u64,
    },
    SetIndexBuffer {
        buffer: BufferId,
        offset: u64,
        is_u32: bool,
    },
    SetViewport {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        min_depth: f32,
        max_depth: f32,
    },
    SetScissor {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    Draw {
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    DrawIndexed {
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        base_vertex: i32,
        first_instance: u32,
    },
    Dispatch {
        x: u32,
        y: u32,
        z: u32,
    },
    CopyBufferToBuffer {
        src: BufferId,
        src_offset: u64,
        dst: BufferId,
        dst_offset: u64,
        size: u64,
    },
    CopyBufferToTexture {
        src: BufferId,
        src_offset: u64,
        bytes_per_row: u32,
        dst: TextureId,
        dst_mip_level: u32,
        dst_origin: (u32, u32, u32),
        extent: Extent3d,
    },
    CopyTextureToBuffer {
        src: TextureId,
        src_mip_level: u32,
        src_origin: (u32, u32, u32),
        dst: BufferId,
        dst_offset: u64,
        bytes_per_row: u32,
        extent: Extent3d,
    },
    CopyTextureToTexture {
        src: TextureId,
        src_mip_level: u32,
        src_origin: (u32, u32, u32),
        dst: TextureId,
        dst_mip_level: u32,
        dst_origin: (u32, u32, u32),
        extent: Extent3d,
    },
    BlitTexture {
        src: TextureId,
        src_region: (u32, u32, u32, u32, u32, u32),
        dst: TextureId,
        dst_region: (u32, u32, u32, u32, u32, u32),
        filter: FilterMode,
    },
    GenerateMipmaps {
        texture: TextureId,
        filter: FilterMode,
    },
    ResetQuerySet {
        query_set: QuerySetId,
        first: u32,
        count: u32,
    },
    WriteTimestamp {
        query_set: QuerySetId,
        index: u32,
    },
    BeginComputePass,
    EndComputePass,
}

/// The state every `CommandEncoder` walks through (§3, §4.2.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    Reset,
    Recording,
    Finished,
}

/// A single submission's worth of work (§4.2.4).
pub struct SubmitInfo {
    pub encoders: Vec<CommandEncoderId>,
    pub wait_semaphores: Vec<SemaphoreId>,
    pub signal_semaphores: Vec<SemaphoreId>,
    pub signal_fence: Option<FenceId>,
}

/// The one abstract interface every backend implements in full. Object-safe
/// by construction: no generic methods, no associated types, every
/// parameter and return type is a concrete handle, descriptor, or
/// `LumeResult`.
pub trait Backend: Send + Sync {
    /// A stable human-readable name for logging (`"vulkan"`, `"webgpu"`).
    fn name(&self) -> &'static str;

    // ---- instance / adapter ----------------------------------------
    fn create_instance(&self, desc: &InstanceDescriptor) -> LumeResult<InstanceId>;
    fn destroy_instance(&self, instance: InstanceId);
    fn enumerate_adapters(&self, instance: InstanceId) -> LumeResult<Vec<AdapterId>>;
    fn request_adapter(
        &self,
        instance: InstanceId,
        power_preference: PowerPreference,
    ) -> LumeResult<AdapterId>;
    fn adapter_info(&self, adapter: AdapterId) -> LumeResult<AdapterInfo>;

    // ---- device / queue ---------------------------------------------
    fn request_device(&self, adapter: AdapterId) -> LumeResult<(DeviceId, QueueId)>;
    fn destroy_device(&self, device: DeviceId);
    fn device_limits(&self, device: DeviceId) -> LumeResult<DeviceLimits>;
    fn device_wait_idle(&self, device: DeviceId) -> LumeResult<()>;
    fn queue_wait_idle(&self, queue: QueueId) -> LumeResult<()>;
    fn queue_write_buffer(
        &self,
        queue: QueueId,
        buffer: BufferId,
        offset: u64,
        bytes: &[u8],
    ) -> LumeResult<()>;
    fn queue_write_texture(
        &self,
        queue: QueueId,
        texture: TextureId,
        mip_level: u32,
        origin: (u32, u32, u32),
        bytes: &[u8],
        bytes_per_row: u32,
        extent: Extent3d,
    ) -> LumeResult<()>;
    fn queue_submit(&self, queue: QueueId, submit: SubmitInfo) -> LumeResult<()>;

    // ---- resources ----------------------------------------------------
    fn create_buffer(&self, device: DeviceId, desc: &BufferDescriptor) -> LumeResult<BufferId>;
    fn destroy_buffer(&self, buffer: BufferId);
    fn buffer_info(&self, buffer: BufferId) -> LumeResult<BufferInfo>;
    fn buffer_map_async(
        &self,
        buffer: BufferId,
        mode: MapMode,
        offset: u64,
        size: u64,
    ) -> LumeResult<*mut u8>;
    fn buffer_unmap(&self, buffer: BufferId) -> LumeResult<()>;

    fn create_texture(&self, device: DeviceId, desc: &TextureDescriptor) -> LumeResult<TextureId>;
    fn destroy_texture(&self, texture: TextureId);
    fn texture_layout(&self, texture: TextureId) -> LumeResult<TextureLayout>;
    fn create_texture_view(
        &self,
        texture: TextureId,
        desc: &TextureViewDescriptor,
    ) -> LumeResult<TextureViewId>;
    fn destroy_texture_view(&self, view: TextureViewId);

    fn create_sampler(&self, device: DeviceId, desc: &SamplerDescriptor) -> LumeResult<SamplerId>;
    fn destroy_sampler(&self, sampler: SamplerId);

    fn create_shader(&self, device: DeviceId, desc: &ShaderDescriptor) -> LumeResult<ShaderId>;
    fn destroy_shader(&self, shader: ShaderId);

    fn create_bind_group_layout(
        &self,
        device: DeviceId,
        desc: &BindGroupLayoutDescriptor,
    ) -> LumeResult<BindGroupLayoutId>;
    fn destroy_bind_group_layout(&self, layout: BindGroupLayoutId);
    fn create_bind_group(
        &self,
        device: DeviceId,
        desc: &BindGroupDescriptor,
    ) -> LumeResult<BindGroupId>;
    fn destroy_bind_group(&self, bind_group: BindGroupId);

    fn create_render_pass(
        &self,
        device: DeviceId,
        desc: &RenderPassDescriptor,
    ) -> LumeResult<RenderPassId>;
    fn destroy_render_pass(&self, render_pass: RenderPassId);
    fn create_framebuffer(
        &self,
        device: DeviceId,
        desc: &FramebufferDescriptor,
    ) -> LumeResult<FramebufferId>;
    fn destroy_framebuffer(&self, framebuffer: FramebufferId);

    fn create_render_pipeline(
        &self,
        device: DeviceId,
        desc: &RenderPipelineDescriptor,
    ) -> LumeResult<RenderPipelineId>;
    fn destroy_render_pipeline(&self, pipeline: RenderPipelineId);
    fn create_compute_pipeline(
        &self,
        device: DeviceId,
        desc: &ComputePipelineDescriptor,
    ) -> LumeResult<ComputePipelineId>;
    fn destroy_compute_pipeline(&self, pipeline: ComputePipelineId);

    fn create_query_set(
        &self,
        device: DeviceId,
        desc: &QuerySetDescriptor,
    ) -> LumeResult<QuerySetId>;
    fn destroy_query_set(&self, query_set: QuerySetId);

    // ---- command recording ---------------------------------------------
    fn create_command_encoder(&self, device: DeviceId) -> LumeResult<CommandEncoderId>;
    fn destroy_command_encoder(&self, encoder: CommandEncoderId);
    fn encoder_state(&self, encoder: CommandEncoderId) -> LumeResult<EncoderState>;
    fn encoder_begin(&self, encoder: CommandEncoderId) -> LumeResult<()>;
    fn encoder_end(&self, encoder: CommandEncoderId) -> LumeResult<()>;
    fn encoder_record(&self, encoder: CommandEncoderId, commands: &[Command]) -> LumeResult<()>;

    // ---- synchronization -------------------------------------------------
    fn create_fence(&self, device: DeviceId, desc: &FenceDescriptor) -> LumeResult<FenceId>;
    fn destroy_fence(&self, fence: FenceId);
    fn fence_wait(&self, fence: FenceId, timeout_ns: u64) -> LumeResult<crate::error::Status>;
    fn fence_reset(&self, fence: FenceId) -> LumeResult<()>;
    fn fence_get_status(&self, fence: FenceId) -> LumeResult<bool>;

    fn create_semaphore(
        &self,
        device: DeviceId,
        desc: &SemaphoreDescriptor,
    ) -> LumeResult<SemaphoreId>;
    fn destroy_semaphore(&self, semaphore: SemaphoreId);
    fn semaphore_signal(&self, semaphore: SemaphoreId, value: u64) -> LumeResult<()>;
    fn semaphore_wait(
        &self,
        semaphore: SemaphoreId,
        value: u64,
        timeout_ns: u64,
    ) -> LumeResult<crate::error::Status>;

    // ---- presentation ----------------------------------------------------
    fn create_surface(
        &self,
        instance: InstanceId,
        window: &PlatformWindowHandle,
    ) -> LumeResult<SurfaceId>;
    fn destroy_surface(&self, surface: SurfaceId);
    fn create_swapchain(
        &self,
        device: DeviceId,
        surface: SurfaceId,
        request: &SwapchainRequest,
    ) -> LumeResult<(SwapchainId, SwapchainInfo)>;
    fn destroy_swapchain(&self, swapchain: SwapchainId);
    fn swapchain_view(&self, swapchain: SwapchainId, image_index: u32) -> LumeResult<TextureViewId>;
    fn swapchain_acquire_next(
        &self,
        swapchain: SwapchainId,
        timeout_ns: u64,
        signal_semaphore: Option<SemaphoreId>,
        signal_fence: Option<FenceId>,
    ) -> LumeResult<u32>;
    fn swapchain_present(
        &self,
        swapchain: SwapchainId,
        wait_semaphores: &[SemaphoreId],
    ) -> LumeResult<()>;

    // ---- explicit-backend-only helper ------------------------------------
    /// The access-flags helper table of §4.2.1. The implicit backend has no
    /// use for it but must still answer rather than panic, since the trait
    /// promises every method either succeeds or returns a well-defined
    /// error — here, `FeatureNotSupported`.
    fn access_flags_for_layout(&self, _layout: TextureLayout) -> LumeResult<AccessFlags> {
        Err(LumeError::FeatureNotSupported(
            "access_flags_for_layout is explicit-backend only".into(),
        ))
    }
}

/// Parameters for [`Backend::create_instance`]. Lives here rather than in
/// `types.rs` since it is the one descriptor the bootstrap path (before any
/// registry entry exists) constructs directly.
#[derive(Debug, Clone)]
pub struct InstanceDescriptor {
    pub application_name: String,
    pub enable_surface_extension: bool,
    pub enable_debug_extension: bool,
    pub debug_callback: Option<std::sync::Arc<DebugCallback>>,
}

pub type DebugCallback = dyn Fn(DebugSeverity, DebugMessageType, &str) + Send + Sync;

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;

    /// Minimal `Backend` stub used only by `registry`'s unit tests; every
    /// method that would need real backend state panics if actually
    /// invoked, since those tests only exercise load/unload bookkeeping.
    pub struct NullBackend;

    macro_rules! unimplemented_methods {
        ($($name:ident($($arg:ident: $ty:ty),*) -> $ret:ty;)*) => {
            $(fn $name(&self, $($arg: $ty),*) -> $ret { unimplemented!("stub backend method: {}", stringify!($name)) })*
        };
    }
    pub(crate) use unimplemented_methods;

    impl Backend for NullBackend {
        fn name(&self) -> &'static str {
            "null"
        }
        unimplemented_methods! {
            create_instance(desc: &InstanceDescriptor) -> LumeResult<InstanceId>;
            enumerate_adapters(instance: InstanceId) -> LumeResult<Vec<AdapterId>>;
            request_adapter(instance: InstanceId, power_preference: PowerPreference) -> LumeResult<AdapterId>;
            adapter_info(adapter: AdapterId) -> LumeResult<AdapterInfo>;
            request_device(adapter: AdapterId) -> LumeResult<(DeviceId, QueueId)>;
            device_limits(device: DeviceId) -> LumeResult<DeviceLimits>;
            device_wait_idle(device: DeviceId) -> LumeResult<()>;
            queue_wait_idle(queue: QueueId) -> LumeResult<()>;
            create_buffer(device: DeviceId, desc: &BufferDescriptor) -> LumeResult<BufferId>;
            buffer_info(buffer: BufferId) -> LumeResult<BufferInfo>;
            buffer_unmap(buffer: BufferId) -> LumeResult<()>;
            create_texture(device: DeviceId, desc: &TextureDescriptor) -> LumeResult<TextureId>;
            texture_layout(texture: TextureId) -> LumeResult<TextureLayout>;
            create_texture_view(texture: TextureId, desc: &TextureViewDescriptor) -> LumeResult<TextureViewId>;
            create_sampler(device: DeviceId, desc: &SamplerDescriptor) -> LumeResult<SamplerId>;
            create_shader(device: DeviceId, desc: &ShaderDescriptor) -> LumeResult<ShaderId>;
            create_bind_group_layout(device: DeviceId, desc: &BindGroupLayoutDescriptor) -> LumeResult<BindGroupLayoutId>;
            create_bind_group(device: DeviceId, desc: &BindGroupDescriptor) -> LumeResult<BindGroupId>;
            create_render_pass(device: DeviceId, desc: &RenderPassDescriptor) -> LumeResult<RenderPassId>;
            create_framebuffer(device: DeviceId, desc: &FramebufferDescriptor) -> LumeResult<FramebufferId>;
            create_render_pipeline(device: DeviceId, desc: &RenderPipelineDescriptor) -> LumeResult<RenderPipelineId>;
            create_compute_pipeline(device: DeviceId, desc: &ComputePipelineDescriptor) -> LumeResult<ComputePipelineId>;
            create_query_set(device: DeviceId, desc: &QuerySetDescriptor) -> LumeResult<QuerySetId>;
            create_command_encoder(device: DeviceId) -> LumeResult<CommandEncoderId>;
            encoder_state(encoder: CommandEncoderId) -> LumeResult<EncoderState>;
            encoder_begin(encoder: CommandEncoderId) -> LumeResult<()>;
            encoder_end(encoder: CommandEncoderId) -> LumeResult<()>;
            create_fence(device: DeviceId, desc: &FenceDescriptor) -> LumeResult<FenceId>;
            fence_wait(fence: FenceId, timeout_ns: u64) -> LumeResult<crate::error::Status>;
            fence_reset(fence: FenceId) -> LumeResult<()>;
            fence_get_status(fence: FenceId) -> LumeResult<bool>;
            create_semaphore(device: DeviceId, desc: &SemaphoreDescriptor) -> LumeResult<SemaphoreId>;
            semaphore_signal(semaphore: SemaphoreId, value: u64) -> LumeResult<()>;
            semaphore_wait(semaphore: SemaphoreId, value: u64, timeout_ns: u64) -> LumeResult<crate::error::Status>;
            create_surface(instance: InstanceId, window: &PlatformWindowHandle) -> LumeResult<SurfaceId>;
            create_swapchain(device: DeviceId, surface: SurfaceId, request: &SwapchainRequest) -> LumeResult<(SwapchainId, SwapchainInfo)>;
            swapchain_view(swapchain: SwapchainId, image_index: u32) -> LumeResult<TextureViewId>;
            swapchain_acquire_next(swapchain: SwapchainId, timeout_ns: u64, signal_semaphore: Option<SemaphoreId>, signal_fence: Option<FenceId>) -> LumeResult<u32>;
            swapchain_present(swapchain: SwapchainId, wait_semaphores: &[SemaphoreId]) -> LumeResult<()>;
            queue_write_buffer(queue: QueueId, buffer: BufferId, offset: u64, bytes: &[u8]) -> LumeResult<()>;
            queue_submit(queue: QueueId, submit: SubmitInfo) -> LumeResult<()>;
            encoder_record(encoder: CommandEncoderId, commands: &[Command]) -> LumeResult<()>;
            buffer_map_async(buffer: BufferId, mode: MapMode, offset: u64, size: u64) -> LumeResult<*mut u8>;
            queue_write_texture(queue: QueueId, texture: TextureId, mip_level: u32, origin: (u32, u32, u32), bytes: &[u8], bytes_per_row: u32, extent: Extent3d) -> LumeResult<()>;
        }

        fn destroy_instance(&self, _instance: InstanceId) {}
        fn destroy_device(&self, _device: DeviceId) {}
        fn destroy_buffer(&self, _buffer: BufferId) {}
        fn destroy_texture(&self, _texture: TextureId) {}
        fn destroy_texture_view(&self, _view: TextureViewId) {}
        fn destroy_sampler(&self, _sampler: SamplerId) {}
        fn destroy_shader(&self, _shader: ShaderId) {}
        fn destroy_bind_group_layout(&self, _layout: BindGroupLayoutId) {}
        fn destroy_bind_group(&self, _bind_group: BindGroupId) {}
        fn destroy_render_pass(&self, _render_pass: RenderPassId) {}
        fn destroy_framebuffer(&self, _framebuffer: FramebufferId) {}
        fn destroy_render_pipeline(&self, _pipeline: RenderPipelineId) {}
        fn destroy_compute_pipeline(&self, _pipeline: ComputePipelineId) {}
        fn destroy_query_set(&self, _query_set: QuerySetId) {}
        fn destroy_command_encoder(&self, _encoder: CommandEncoderId) {}
        fn destroy_fence(&self, _fence: FenceId) {}
        fn destroy_semaphore(&self, _semaphore: SemaphoreId) {}
        fn destroy_surface(&self, _surface: SurfaceId) {}
        fn destroy_swapchain(&self, _swapchain: SwapchainId) {}
    }
}
