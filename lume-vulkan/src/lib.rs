//! The explicit/Vulkan-class backend: one `Backend` implementation built on
//! `ash` + `gpu-allocator`, addressed entirely through `lume_core`'s opaque
//! handles. See `state.rs` for the per-entity-kind pools that back every
//! native Vulkan object.

mod command;
mod conv;
mod instance;
mod pass;
mod resource;
mod state;
mod surface;
mod swapchain;
mod sync;

pub(crate) use state::VulkanBackend;

use lume_core::backend::{Backend, Command, EncoderState, SubmitInfo};
use lume_core::error::{LumeError, LumeResult, Status};
use lume_core::ids::*;
use lume_core::types::*;
use std::sync::Arc;

/// Entry point used by `Instance::new` to load this backend, mirroring
/// `lume_webgpu::backend()`'s shape on the implicit side.
pub fn backend() -> Arc<dyn Backend> {
    Arc::new(VulkanBackend::new())
}

impl Backend for VulkanBackend {
    fn name(&self) -> &'static str {
        "vulkan"
    }

    fn create_instance(&self, desc: &lume_core::backend::InstanceDescriptor) -> LumeResult<InstanceId> {
        self.create_instance_impl(desc)
    }

    fn destroy_instance(&self, instance: InstanceId) {
        self.destroy_instance_impl(instance)
    }

    fn enumerate_adapters(&self, instance: InstanceId) -> LumeResult<Vec<AdapterId>> {
        self.enumerate_adapters_impl(instance)
    }

    fn request_adapter(&self, instance: InstanceId, power_preference: PowerPreference) -> LumeResult<AdapterId> {
        self.request_adapter_impl(instance, power_preference)
    }

    fn adapter_info(&self, adapter: AdapterId) -> LumeResult<AdapterInfo> {
        self.adapter_info_impl(adapter)
    }

    fn request_device(&self, adapter: AdapterId) -> LumeResult<(DeviceId, QueueId)> {
        self.request_device_impl(adapter)
    }

    fn destroy_device(&self, device: DeviceId) {
        self.destroy_device_impl(device)
    }

    fn device_limits(&self, device: DeviceId) -> LumeResult<DeviceLimits> {
        self.device_limits_impl(device)
    }

    fn device_wait_idle(&self, device: DeviceId) -> LumeResult<()> {
        self.device_wait_idle_impl(device)
    }

    fn queue_wait_idle(&self, queue: QueueId) -> LumeResult<()> {
        self.queue_wait_idle_impl(queue)
    }

    fn queue_write_buffer(&self, queue: QueueId, buffer: BufferId, offset: u64, bytes: &[u8]) -> LumeResult<()> {
        self.queue_write_buffer_impl(queue, buffer, offset, bytes)
    }

    fn queue_write_texture(
        &self,
        queue: QueueId,
        texture: TextureId,
        mip_level: u32,
        origin: (u32, u32, u32),
        bytes: &[u8],
        bytes_per_row: u32,
        extent: Extent3d,
    ) -> LumeResult<()> {
        self.queue_write_texture_impl(queue, texture, mip_level, origin, bytes, bytes_per_row, extent)
    }

    fn queue_submit(&self, queue: QueueId, submit: SubmitInfo) -> LumeResult<()> {
        self.queue_submit_impl(queue, submit)
    }

    fn create_buffer(&self, device: DeviceId, desc: &BufferDescriptor) -> LumeResult<BufferId> {
        self.create_buffer_impl(device, desc)
    }

    fn destroy_buffer(&self, buffer: BufferId) {
        self.destroy_buffer_impl(buffer)
    }

    fn buffer_info(&self, buffer: BufferId) -> LumeResult<BufferInfo> {
        self.buffer_info_impl(buffer)
    }

    fn buffer_map_async(&self, buffer: BufferId, mode: MapMode, offset: u64, size: u64) -> LumeResult<*mut u8> {
        self.buffer_map_async_impl(buffer, mode, offset, size)
    }

    fn buffer_unmap(&self, buffer: BufferId) -> LumeResult<()> {
        self.buffer_unmap_impl(buffer)
    }

    fn create_texture(&self, device: DeviceId, desc: &TextureDescriptor) -> LumeResult<TextureId> {
        self.create_texture_impl(device, desc)
    }

    fn destroy_texture(&self, texture: TextureId) {
        self.destroy_texture_impl(texture)
    }

    fn texture_layout(&self, texture: TextureId) -> LumeResult<TextureLayout> {
        self.texture_layout_impl(texture)
    }

    fn create_texture_view(&self, texture: TextureId, desc: &TextureViewDescriptor) -> LumeResult<TextureViewId> {
        self.create_texture_view_impl(texture, desc)
    }

    fn destroy_texture_view(&self, view: TextureViewId) {
        self.destroy_texture_view_impl(view)
    }

    fn create_sampler(&self, device: DeviceId, desc: &SamplerDescriptor) -> LumeResult<SamplerId> {
        self.create_sampler_impl(device, desc)
    }

    fn destroy_sampler(&self, sampler: SamplerId) {
        self.destroy_sampler_impl(sampler)
    }

    fn create_shader(&self, device: DeviceId, desc: &ShaderDescriptor) -> LumeResult<ShaderId> {
        self.create_shader_impl(device, desc)
    }

    fn destroy_shader(&self, shader: ShaderId) {
        self.destroy_shader_impl(shader)
    }

    fn create_bind_group_layout(
        &self,
        device: DeviceId,
        desc: &BindGroupLayoutDescriptor,
    ) -> LumeResult<BindGroupLayoutId> {
        self.create_bind_group_layout_impl(device, desc)
    }

    fn destroy_bind_group_layout(&self, layout: BindGroupLayoutId) {
        self.destroy_bind_group_layout_impl(layout)
    }

    fn create_bind_group(&self, device: DeviceId, desc: &BindGroupDescriptor) -> LumeResult<BindGroupId> {
        self.create_bind_group_impl(device, desc)
    }

    fn destroy_bind_group(&self, bind_group: BindGroupId) {
        self.destroy_bind_group_impl(bind_group)
    }

    fn create_render_pass(&self, device: DeviceId, desc: &RenderPassDescriptor) -> LumeResult<RenderPassId> {
        self.create_render_pass_impl(device, desc)
    }

    fn destroy_render_pass(&self, render_pass: RenderPassId) {
        self.destroy_render_pass_impl(render_pass)
    }

    fn create_framebuffer(&self, device: DeviceId, desc: &FramebufferDescriptor) -> LumeResult<FramebufferId> {
        self.create_framebuffer_impl(device, desc)
    }

    fn destroy_framebuffer(&self, framebuffer: FramebufferId) {
        self.destroy_framebuffer_impl(framebuffer)
    }

    fn create_render_pipeline(
        &self,
        device: DeviceId,
        desc: &RenderPipelineDescriptor,
    ) -> LumeResult<RenderPipelineId> {
        self.create_render_pipeline_impl(device, desc)
    }

    fn destroy_render_pipeline(&self, pipeline: RenderPipelineId) {
        self.destroy_render_pipeline_impl(pipeline)
    }

    fn create_compute_pipeline(
        &self,
        device: DeviceId,
        desc: &ComputePipelineDescriptor,
    ) -> LumeResult<ComputePipelineId> {
        self.create_compute_pipeline_impl(device, desc)
    }

    fn destroy_compute_pipeline(&self, pipeline: ComputePipelineId) {
        self.destroy_compute_pipeline_impl(pipeline)
    }

    fn create_query_set(&self, device: DeviceId, desc: &QuerySetDescriptor) -> LumeResult<QuerySetId> {
        self.create_query_set_impl(device, desc)
    }

    fn destroy_query_set(&self, query_set: QuerySetId) {
        self.destroy_query_set_impl(query_set)
    }

    fn create_command_encoder(&self, device: DeviceId) -> LumeResult<CommandEncoderId> {
        self.create_command_encoder_impl(device)
    }

    fn destroy_command_encoder(&self, encoder: CommandEncoderId) {
        self.destroy_command_encoder_impl(encoder)
    }

    fn encoder_state(&self, encoder: CommandEncoderId) -> LumeResult<EncoderState> {
        self.encoder_state_impl(encoder)
    }

    fn encoder_begin(&self, encoder: CommandEncoderId) -> LumeResult<()> {
        self.encoder_begin_impl(encoder)
    }

    fn encoder_end(&self, encoder: CommandEncoderId) -> LumeResult<()> {
        self.encoder_end_impl(encoder)
    }

    fn encoder_record(&self, encoder: CommandEncoderId, commands: &[Command]) -> LumeResult<()> {
        self.encoder_record_impl(encoder, commands)
    }

    fn create_fence(&self, device: DeviceId, desc: &FenceDescriptor) -> LumeResult<FenceId> {
        self.create_fence_impl(device, desc)
    }

    fn destroy_fence(&self, fence: FenceId) {
        self.destroy_fence_impl(fence)
    }

    fn fence_wait(&self, fence: FenceId, timeout_ns: u64) -> LumeResult<Status> {
        self.fence_wait_impl(fence, timeout_ns)
    }

    fn fence_reset(&self, fence: FenceId) -> LumeResult<()> {
        self.fence_reset_impl(fence)
    }

    fn fence_get_status(&self, fence: FenceId) -> LumeResult<bool> {
        self.fence_get_status_impl(fence)
    }

    fn create_semaphore(&self, device: DeviceId, desc: &SemaphoreDescriptor) -> LumeResult<SemaphoreId> {
        self.create_semaphore_impl(device, desc)
    }

    fn destroy_semaphore(&self, semaphore: SemaphoreId) {
        self.destroy_semaphore_impl(semaphore)
    }

    fn semaphore_signal(&self, semaphore: SemaphoreId, value: u64) -> LumeResult<()> {
        self.semaphore_signal_impl(semaphore, value)
    }

    fn semaphore_wait(&self, semaphore: SemaphoreId, value: u64, timeout_ns: u64) -> LumeResult<Status> {
        self.semaphore_wait_impl(semaphore, value, timeout_ns)
    }

    fn create_surface(&self, instance: InstanceId, window: &PlatformWindowHandle) -> LumeResult<SurfaceId> {
        self.create_surface_impl(instance, window)
    }

    fn destroy_surface(&self, surface: SurfaceId) {
        self.destroy_surface_impl(surface)
    }

    fn create_swapchain(
        &self,
        device: DeviceId,
        surface: SurfaceId,
        request: &SwapchainRequest,
    ) -> LumeResult<(SwapchainId, SwapchainInfo)> {
        self.create_swapchain_impl(device, surface, request)
    }

    fn destroy_swapchain(&self, swapchain: SwapchainId) {
        self.destroy_swapchain_impl(swapchain)
    }

    fn swapchain_view(&self, swapchain: SwapchainId, image_index: u32) -> LumeResult<TextureViewId> {
        self.swapchain_view_impl(swapchain, image_index)
    }

    fn swapchain_acquire_next(
        &self,
        swapchain: SwapchainId,
        timeout_ns: u64,
        signal_semaphore: Option<SemaphoreId>,
        signal_fence: Option<FenceId>,
    ) -> LumeResult<u32> {
        self.swapchain_acquire_next_impl(swapchain, timeout_ns, signal_semaphore, signal_fence)
    }

    fn swapchain_present(&self, swapchain: SwapchainId, wait_semaphores: &[SemaphoreId]) -> LumeResult<()> {
        self.swapchain_present_impl(swapchain, wait_semaphores)
    }

    fn access_flags_for_layout(&self, layout: TextureLayout) -> LumeResult<AccessFlags> {
        Ok(conv::access_flags_for_layout(layout))
    }
}
