//! CommandEncoder and its scoped pass encoders (§3, §4.2.5).
//!
//! Commands are buffered client-side between `begin()` and `end()` and
//! handed to the backend as one slice at `end()` time; this lets both
//! backends translate the whole recorded stream in one pass (§4.2) instead
//! of crossing the trait-object boundary once per draw call.

use crate::backend::{Command, EncoderState};
use crate::error::{LumeError, LumeResult};
use crate::ids::{
    BindGroupId, BufferId, CommandEncoderId, ComputePipelineId, QuerySetId, RenderPipelineId,
    TextureId,
};
use crate::registry::Registry;
use crate::types::{Extent3d, FilterMode, PipelineStage, RenderPassBeginDescriptor, TextureLayout};

pub struct CommandEncoder {
    id: CommandEncoderId,
    state: EncoderState,
    buffered: Vec<Command>,
}

impl CommandEncoder {
    pub(crate) fn new(id: CommandEncoderId) -> Self {
        CommandEncoder {
            id,
            state: EncoderState::Reset,
            buffered: Vec::new(),
        }
    }

    pub fn id(&self) -> CommandEncoderId {
        self.id
    }

    pub fn state(&self) -> EncoderState {
        self.state
    }

    /// Must be in `Reset`. Recreates or resets the backend-native recorder
    /// depending on backend (§4.2.5).
    pub fn begin(&mut self) -> LumeResult<()> {
        if self.state != EncoderState::Reset {
            return Err(LumeError::invalid("encoder.begin() requires Reset state"));
        }
        Registry::global().lookup(self.id)?.encoder_begin(self.id)?;
        self.buffered.clear();
        self.state = EncoderState::Recording;
        Ok(())
    }

    /// Must be in `Recording`. Hands the buffered command stream to the
    /// backend and transitions to `Finished`.
    pub fn end(&mut self) -> LumeResult<()> {
        if self.state != EncoderState::Recording {
            return Err(LumeError::invalid("encoder.end() requires Recording state"));
        }
        let backend = Registry::global().lookup(self.id)?;
        backend.encoder_record(self.id, &self.buffered)?;
        backend.encoder_end(self.id)?;
        self.state = EncoderState::Finished;
        Ok(())
    }

    fn push(&mut self, command: Command) -> LumeResult<()> {
        if self.state != EncoderState::Recording {
            return Err(LumeError::invalid("encoder is not in Recording state"));
        }
        self.buffered.push(command);
        Ok(())
    }

    /// §4.2.1: explicit backend records a real barrier; implicit backend
    /// validates `old_layout` against the tracked current layout and emits
    /// nothing.
    #[allow(clippy::too_many_arguments)]
    pub fn texture_barrier(
        &mut self,
        texture: TextureId,
        old_layout: TextureLayout,
        new_layout: TextureLayout,
        src_stage: PipelineStage,
        dst_stage: PipelineStage,
        base_mip_level: u32,
        mip_level_count: u32,
        base_array_layer: u32,
        array_layer_count: u32,
    ) -> LumeResult<()> {
        self.push(Command::TextureBarrier {
            texture,
            old_layout,
            new_layout,
            src_stage,
            dst_stage,
            base_mip_level,
            mip_level_count,
            base_array_layer,
            array_layer_count,
        })
    }

    pub fn copy_buffer_to_buffer(
        &mut self,
        src: BufferId,
        src_offset: u64,
        dst: BufferId,
        dst_offset: u64,
        size: u64,
    ) -> LumeResult<()> {
        self.push(Command::CopyBufferToBuffer {
            src,
            src_offset,
            dst,
            dst_offset,
            size,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn copy_buffer_to_texture(
        &mut self,
        src: BufferId,
        src_offset: u64,
        bytes_per_row: u32,
        dst: TextureId,
        dst_mip_level: u32,
        dst_origin: (u32, u32, u32),
        extent: Extent3d,
    ) -> LumeResult<()> {
        self.push(Command::CopyBufferToTexture {
            src,
            src_offset,
            bytes_per_row,
            dst,
            dst_mip_level,
            dst_origin,
            extent,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn copy_texture_to_buffer(
        &mut self,
        src: TextureId,
        src_mip_level: u32,
        src_origin: (u32, u32, u32),
        dst: BufferId,
        dst_offset: u64,
        bytes_per_row: u32,
        extent: Extent3d,
    ) -> LumeResult<()> {
        self.push(Command::CopyTextureToBuffer {
            src,
            src_mip_level,
            src_origin,
            dst,
            dst_offset,
            bytes_per_row,
            extent,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn copy_texture_to_texture(
        &mut self,
        src: TextureId,
        src_mip_level: u32,
        src_origin: (u32, u32, u32),
        dst: TextureId,
        dst_mip_level: u32,
        dst_origin: (u32, u32, u32),
        extent: Extent3d,
    ) -> LumeResult<()> {
        self.push(Command::CopyTextureToTexture {
            src,
            src_mip_level,
            src_origin,
            dst,
            dst_mip_level,
            dst_origin,
            extent,
        })
    }

    pub fn blit_texture(
        &mut self,
        src: TextureId,
        src_region: (u32, u32, u32, u32, u32, u32),
        dst: TextureId,
        dst_region: (u32, u32, u32, u32, u32, u32),
        filter: FilterMode,
    ) -> LumeResult<()> {
        self.push(Command::BlitTexture {
            src,
            src_region,
            dst,
            dst_region,
            filter,
        })
    }

    /// Iterates mip pairs and issues a blit between each (§4.2.6).
    pub fn generate_mipmaps(&mut self, texture: TextureId, filter: FilterMode) -> LumeResult<()> {
        self.push(Command::GenerateMipmaps { texture, filter })
    }

    pub fn reset_query_set(
        &mut self,
        query_set: QuerySetId,
        first: u32,
        count: u32,
    ) -> LumeResult<()> {
        self.push(Command::ResetQuerySet {
            query_set,
            first,
            count,
        })
    }

    pub fn write_timestamp(&mut self, query_set: QuerySetId, index: u32) -> LumeResult<()> {
        self.push(Command::WriteTimestamp { query_set, index })
    }

    /// Scoped: released on `RenderPassEncoder::end` or, failing that, on
    /// drop (I4).
    pub fn begin_render_pass(
        &mut self,
        desc: RenderPassBeginDescriptor,
    ) -> LumeResult<RenderPassEncoder<'_>> {
        self.push(Command::BeginRenderPass(desc))?;
        Ok(RenderPassEncoder {
            encoder: self,
            ended: false,
        })
    }

    pub fn begin_compute_pass(&mut self) -> LumeResult<ComputePassEncoder<'_>> {
        self.push(Command::BeginComputePass)?;
        Ok(ComputePassEncoder {
            encoder: self,
            ended: false,
        })
    }
}

impl Drop for CommandEncoder {
    fn drop(&mut self) {
        let registry = Registry::global();
        if let Ok(backend) = registry.lookup(self.id) {
            backend.destroy_command_encoder(self.id);
        }
        registry.unwrap(self.id);
    }
}

/// Scoped sub-recorder bound to a matched Begin/End pair (I4). Ends the
/// pass on drop if `end()` was never called, so a `?` early-return or panic
/// mid-recording can never leak an open pass.
pub struct RenderPassEncoder<'a> {
    encoder: &'a mut CommandEncoder,
    ended: bool,
}

impl<'a> RenderPassEncoder<'a> {
    pub fn bind_pipeline(&mut self, pipeline: RenderPipelineId) -> LumeResult<()> {
        self.encoder.push(Command::BindRenderPipeline(pipeline))
    }

    pub fn set_bind_group(
        &mut self,
        index: u32,
        bind_group: BindGroupId,
        dynamic_offsets: Vec<u32>,
    ) -> LumeResult<()> {
        self.encoder.push(Command::SetBindGroup {
            index,
            bind_group,
            dynamic_offsets,
        })
    }

    pub fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64) -> LumeResult<()> {
        self.encoder
            .push(Command::SetVertexBuffer { slot, buffer, offset })
    }

    pub fn set_index_buffer(&mut self, buffer: BufferId, offset: u64, is_u32: bool) -> LumeResult<()> {
        self.encoder.push(Command::SetIndexBuffer {
            buffer,
            offset,
            is_u32,
        })
    }

    pub fn set_viewport(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        min_depth: f32,
        max_depth: f32,
    ) -> LumeResult<()> {
        self.encoder.push(Command::SetViewport {
            x,
            y,
            width,
            height,
            min_depth,
            max_depth,
        })
    }

    pub fn set_scissor(&mut self, x: i32, y: i32, width: u32, height: u32) -> LumeResult<()> {
        self.encoder
            .push(Command::SetScissor { x, y, width, height })
    }

    pub fn draw(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) -> LumeResult<()> {
        self.encoder.push(Command::Draw {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        })
    }

    pub fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        base_vertex: i32,
        first_instance: u32,
    ) -> LumeResult<()> {
        self.encoder.push(Command::DrawIndexed {
            index_count,
            instance_count,
            first_index,
            base_vertex,
            first_instance,
        })
    }

    pub fn end(mut self) -> LumeResult<()> {
        self.encoder.push(Command::EndRenderPass)?;
        self.ended = true;
        Ok(())
    }
}

impl<'a> Drop for RenderPassEncoder<'a> {
    fn drop(&mut self) {
        if !self.ended {
            let _ = self.encoder.push(Command::EndRenderPass);
        }
    }
}

pub struct ComputePassEncoder<'a> {
    encoder: &'a mut CommandEncoder,
    ended: bool,
}

impl<'a> ComputePassEncoder<'a> {
    pub fn bind_pipeline(&mut self, pipeline: ComputePipelineId) -> LumeResult<()> {
        self.encoder.push(Command::BindComputePipeline(pipeline))
    }

    pub fn set_bind_group(
        &mut self,
        index: u32,
        bind_group: BindGroupId,
        dynamic_offsets: Vec<u32>,
    ) -> LumeResult<()> {
        self.encoder.push(Command::SetBindGroup {
            index,
            bind_group,
            dynamic_offsets,
        })
    }

    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) -> LumeResult<()> {
        self.encoder.push(Command::Dispatch { x, y, z })
    }

    pub fn end(mut self) -> LumeResult<()> {
        self.encoder.push(Command::EndComputePass)?;
        self.ended = true;
        Ok(())
    }
}

impl<'a> Drop for ComputePassEncoder<'a> {
    fn drop(&mut self) {
        if !self.ended {
            let _ = self.encoder.push(Command::EndComputePass);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::tests_support::unimplemented_methods;
    use crate::backend::{Backend, InstanceDescriptor};
    use crate::error::Status;
    use crate::ids::*;
    use crate::registry::Registry;
    use crate::types::*;
    use std::sync::Arc;

    /// Stub backend that makes the encoder lifecycle (§4.2.5) actually
    /// runnable without a real driver: `encoder_begin`/`end`/`record` are
    /// real no-ops, every other method is unreachable from these tests.
    struct RecordingStub;

    impl Backend for RecordingStub {
        fn name(&self) -> &'static str {
            "recording-stub"
        }
        fn encoder_begin(&self, _encoder: CommandEncoderId) -> LumeResult<()> {
            Ok(())
        }
        fn encoder_end(&self, _encoder: CommandEncoderId) -> LumeResult<()> {
            Ok(())
        }
        fn encoder_record(&self, _encoder: CommandEncoderId, _commands: &[Command]) -> LumeResult<()> {
            Ok(())
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
            create_fence(device: DeviceId, desc: &FenceDescriptor) -> LumeResult<FenceId>;
            fence_wait(fence: FenceId, timeout_ns: u64) -> LumeResult<Status>;
            fence_reset(fence: FenceId) -> LumeResult<()>;
            fence_get_status(fence: FenceId) -> LumeResult<bool>;
            create_semaphore(device: DeviceId, desc: &SemaphoreDescriptor) -> LumeResult<SemaphoreId>;
            semaphore_signal(semaphore: SemaphoreId, value: u64) -> LumeResult<()>;
            semaphore_wait(semaphore: SemaphoreId, value: u64, timeout_ns: u64) -> LumeResult<Status>;
            create_surface(instance: InstanceId, window: &PlatformWindowHandle) -> LumeResult<SurfaceId>;
            create_swapchain(device: DeviceId, surface: SurfaceId, request: &SwapchainRequest) -> LumeResult<(SwapchainId, SwapchainInfo)>;
            swapchain_view(swapchain: SwapchainId, image_index: u32) -> LumeResult<TextureViewId>;
            swapchain_acquire_next(swapchain: SwapchainId, timeout_ns: u64, signal_semaphore: Option<SemaphoreId>, signal_fence: Option<FenceId>) -> LumeResult<u32>;
            swapchain_present(swapchain: SwapchainId, wait_semaphores: &[SemaphoreId]) -> LumeResult<()>;
            queue_write_buffer(queue: QueueId, buffer: BufferId, offset: u64, bytes: &[u8]) -> LumeResult<()>;
            queue_submit(queue: QueueId, submit: crate::backend::SubmitInfo) -> LumeResult<()>;
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

    fn encoder_with_stub_backend() -> CommandEncoder {
        let registry = Registry::global();
        let backend_id = registry.reserve_backend_id();
        registry.load_backend(backend_id, Arc::new(RecordingStub) as Arc<dyn Backend>);
        let id = CommandEncoderId::alloc();
        registry.wrap(id, backend_id);
        CommandEncoder::new(id)
    }

    #[test]
    fn starts_in_reset_state() {
        let encoder = encoder_with_stub_backend();
        assert_eq!(encoder.state(), EncoderState::Reset);
    }

    #[test]
    fn begin_then_end_walks_reset_recording_finished() {
        let mut encoder = encoder_with_stub_backend();
        encoder.begin().unwrap();
        assert_eq!(encoder.state(), EncoderState::Recording);
        encoder.end().unwrap();
        assert_eq!(encoder.state(), EncoderState::Finished);
    }

    #[test]
    fn begin_twice_without_reset_is_invalid_argument() {
        let mut encoder = encoder_with_stub_backend();
        encoder.begin().unwrap();
        let err = encoder.begin().unwrap_err();
        assert!(matches!(err, LumeError::InvalidArgument(_)));
    }

    #[test]
    fn end_without_begin_is_invalid_argument() {
        let mut encoder = encoder_with_stub_backend();
        let err = encoder.end().unwrap_err();
        assert!(matches!(err, LumeError::InvalidArgument(_)));
    }

    #[test]
    fn end_twice_is_invalid_argument() {
        let mut encoder = encoder_with_stub_backend();
        encoder.begin().unwrap();
        encoder.end().unwrap();
        let err = encoder.end().unwrap_err();
        assert!(matches!(err, LumeError::InvalidArgument(_)));
    }

    #[test]
    fn recording_requires_recording_state() {
        let mut encoder = encoder_with_stub_backend();
        let texture: TextureId = TextureId::alloc();
        // Not yet begun: still Reset.
        let err = encoder
            .texture_barrier(
                texture,
                TextureLayout::Undefined,
                TextureLayout::ColorAttachment,
                PipelineStage::TOP_OF_PIPE,
                PipelineStage::COLOR_ATTACHMENT_OUTPUT,
                0,
                1,
                0,
                1,
            )
            .unwrap_err();
        assert!(matches!(err, LumeError::InvalidArgument(_)));

        encoder.begin().unwrap();
        encoder
            .texture_barrier(
                texture,
                TextureLayout::Undefined,
                TextureLayout::ColorAttachment,
                PipelineStage::TOP_OF_PIPE,
                PipelineStage::COLOR_ATTACHMENT_OUTPUT,
                0,
                1,
                0,
                1,
            )
            .unwrap();
        encoder.end().unwrap();

        // Finished: recording again must fail until begin() is called again.
        let err = encoder
            .texture_barrier(
                texture,
                TextureLayout::Undefined,
                TextureLayout::ColorAttachment,
                PipelineStage::TOP_OF_PIPE,
                PipelineStage::COLOR_ATTACHMENT_OUTPUT,
                0,
                1,
                0,
                1,
            )
            .unwrap_err();
        assert!(matches!(err, LumeError::InvalidArgument(_)));
    }

    #[test]
    fn render_pass_encoder_auto_ends_on_drop() {
        let mut encoder = encoder_with_stub_backend();
        encoder.begin().unwrap();
        {
            let _pass = encoder
                .begin_render_pass(RenderPassBeginDescriptor {
                    render_pass: RenderPassId::alloc(),
                    framebuffer: FramebufferId::alloc(),
                    clear_colors: vec![],
                    clear_depth: 1.0,
                    clear_stencil: 0,
                    render_extent: Extent3d {
                        width: 1,
                        height: 1,
                        depth: 1,
                    },
                })
                .unwrap();
            // Dropped without calling `end()`.
        }
        // The dropped pass pushed its own EndRenderPass; end() must still see
        // a well-formed stream and succeed.
        encoder.end().unwrap();
    }
}
