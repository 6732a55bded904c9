//! Command encoder lifecycle and translation of the buffered `Command`
//! stream into native `vkCmd*` calls (§4.2.1, §4.2.2, §4.2.5).

use crate::conv;
use crate::state::{CommandEncoderState, VulkanBackend};
use ash::vk;
use lume_core::backend::{Command, EncoderState, SubmitInfo};
use lume_core::error::{LumeError, LumeResult};
use lume_core::ids::*;
use lume_core::types::*;

impl VulkanBackend {
    pub(crate) fn create_command_encoder_impl(&self, device: DeviceId) -> LumeResult<CommandEncoderId> {
        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;

        let command_buffers = unsafe {
            device_state
                .device
                .allocate_command_buffers(
                    &vk::CommandBufferAllocateInfo::default()
                        .command_pool(device_state.command_pool)
                        .level(vk::CommandBufferLevel::PRIMARY)
                        .command_buffer_count(1),
                )
                .map_err(|e| LumeError::unknown(format!("vkAllocateCommandBuffers failed: {e}")))?
        };

        let id = CommandEncoderId::alloc();
        self.pools.command_encoders.write().insert(
            id,
            CommandEncoderState {
                device,
                command_buffer: command_buffers[0],
            },
        );
        Ok(id)
    }

    pub(crate) fn destroy_command_encoder_impl(&self, encoder: CommandEncoderId) {
        let Some(state) = self.pools.command_encoders.write().remove(&encoder) else {
            return;
        };
        let devices = self.pools.devices.read();
        if let Some(device_state) = devices.get(&state.device) {
            unsafe {
                device_state
                    .device
                    .free_command_buffers(device_state.command_pool, &[state.command_buffer]);
            }
        }
    }

    pub(crate) fn encoder_state_impl(&self, _encoder: CommandEncoderId) -> LumeResult<EncoderState> {
        // The front end is the sole owner of encoder state (§4.2.5); the
        // backend only needs a live native command buffer to record into.
        Ok(EncoderState::Recording)
    }

    pub(crate) fn encoder_begin_impl(&self, encoder: CommandEncoderId) -> LumeResult<()> {
        let encoders = self.pools.command_encoders.read();
        let state = encoders.get(&encoder).ok_or_else(|| LumeError::invalid("unknown encoder"))?;
        let devices = self.pools.devices.read();
        let device_state = devices
            .get(&state.device)
            .ok_or_else(|| LumeError::invalid("owning device was destroyed"))?;

        unsafe {
            device_state
                .device
                .reset_command_buffer(state.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| LumeError::unknown(format!("vkResetCommandBuffer failed: {e}")))?;
            device_state
                .device
                .begin_command_buffer(
                    state.command_buffer,
                    &vk::CommandBufferBeginInfo::default()
                        .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT),
                )
                .map_err(|e| LumeError::unknown(format!("vkBeginCommandBuffer failed: {e}")))?;
        }
        Ok(())
    }

    pub(crate) fn encoder_end_impl(&self, encoder: CommandEncoderId) -> LumeResult<()> {
        let encoders = self.pools.command_encoders.read();
        let state = encoders.get(&encoder).ok_or_else(|| LumeError::invalid("unknown encoder"))?;
        let devices = self.pools.devices.read();
        let device_state = devices
            .get(&state.device)
            .ok_or_else(|| LumeError::invalid("owning device was destroyed"))?;

        unsafe {
            device_state
                .device
                .end_command_buffer(state.command_buffer)
                .map_err(|e| LumeError::unknown(format!("vkEndCommandBuffer failed: {e}")))?;
        }
        Ok(())
    }

    pub(crate) fn encoder_record_impl(
        &self,
        encoder: CommandEncoderId,
        commands: &[Command],
    ) -> LumeResult<()> {
        let encoders = self.pools.command_encoders.read();
        let encoder_state = encoders.get(&encoder).ok_or_else(|| LumeError::invalid("unknown encoder"))?;
        let devices = self.pools.devices.read();
        let device_state = devices
            .get(&encoder_state.device)
            .ok_or_else(|| LumeError::invalid("owning device was destroyed"))?;
        let cmd = encoder_state.command_buffer;
        let device = &device_state.device;

        let textures = self.pools.textures.read();
        let render_passes = self.pools.render_passes.read();
        let framebuffers = self.pools.framebuffers.read();
        let render_pipelines = self.pools.render_pipelines.read();
        let compute_pipelines = self.pools.compute_pipelines.read();
        let bind_groups = self.pools.bind_groups.read();
        let buffers = self.pools.buffers.read();
        let query_sets = self.pools.query_sets.read();

        let mut bound_bind_point = vk::PipelineBindPoint::GRAPHICS;
        let mut bound_layout = vk::PipelineLayout::null();

        for command in commands {
            match command {
                Command::TextureBarrier {
                    texture,
                    old_layout,
                    new_layout,
                    src_stage,
                    dst_stage,
                    base_mip_level,
                    mip_level_count,
                    base_array_layer,
                    array_layer_count,
                } => {
                    let texture_state = textures
                        .get(texture)
                        .ok_or_else(|| LumeError::invalid("unknown texture in barrier"))?;
                    let mut aspect = vk::ImageAspectFlags::empty();
                    if lume_core::format_has_depth(texture_state.format) {
                        aspect |= vk::ImageAspectFlags::DEPTH;
                    }
                    if lume_core::format_has_stencil(texture_state.format) {
                        aspect |= vk::ImageAspectFlags::STENCIL;
                    }
                    if aspect.is_empty() {
                        aspect = vk::ImageAspectFlags::COLOR;
                    }
                    let src_access = conv::access_flags(conv::access_flags_for_layout(*old_layout));
                    let dst_access = conv::access_flags(conv::access_flags_for_layout(*new_layout));
                    let barrier = vk::ImageMemoryBarrier::default()
                        .old_layout(conv::image_layout(*old_layout))
                        .new_layout(conv::image_layout(*new_layout))
                        .src_access_mask(src_access)
                        .dst_access_mask(dst_access)
                        .image(texture_state.image)
                        .subresource_range(vk::ImageSubresourceRange {
                            aspect_mask: aspect,
                            base_mip_level: *base_mip_level,
                            level_count: *mip_level_count,
                            base_array_layer: *base_array_layer,
                            layer_count: *array_layer_count,
                        });
                    unsafe {
                        device.cmd_pipeline_barrier(
                            cmd,
                            conv::pipeline_stage(*src_stage),
                            conv::pipeline_stage(*dst_stage),
                            vk::DependencyFlags::empty(),
                            &[],
                            &[],
                            &[barrier],
                        );
                    }
                    *texture_state.current_layout.lock() = *new_layout;
                }
                Command::BeginRenderPass(desc) => {
                    let render_pass_state = render_passes
                        .get(&desc.render_pass)
                        .ok_or_else(|| LumeError::invalid("unknown render pass"))?;
                    let framebuffer_state = framebuffers
                        .get(&desc.framebuffer)
                        .ok_or_else(|| LumeError::invalid("unknown framebuffer"))?;

                    let mut clear_values: Vec<vk::ClearValue> = desc
                        .clear_colors
                        .iter()
                        .map(|c| vk::ClearValue {
                            color: vk::ClearColorValue {
                                float32: [c.r as f32, c.g as f32, c.b as f32, c.a as f32],
                            },
                        })
                        .collect();
                    if render_pass_state.desc.depth_stencil_attachment.is_some() {
                        clear_values.push(vk::ClearValue {
                            depth_stencil: vk::ClearDepthStencilValue {
                                depth: desc.clear_depth,
                                stencil: desc.clear_stencil,
                            },
                        });
                    }

                    unsafe {
                        device.cmd_begin_render_pass(
                            cmd,
                            &vk::RenderPassBeginInfo::default()
                                .render_pass(render_pass_state.render_pass)
                                .framebuffer(framebuffer_state.framebuffer)
                                .render_area(vk::Rect2D {
                                    offset: vk::Offset2D { x: 0, y: 0 },
                                    extent: vk::Extent2D {
                                        width: desc.render_extent.width,
                                        height: desc.render_extent.height,
                                    },
                                })
                                .clear_values(&clear_values),
                            vk::SubpassContents::INLINE,
                        );
                    }
                }
                Command::EndRenderPass => unsafe {
                    device.cmd_end_render_pass(cmd);
                },
                Command::BindRenderPipeline(pipeline) => {
                    let state = render_pipelines
                        .get(pipeline)
                        .ok_or_else(|| LumeError::invalid("unknown render pipeline"))?;
                    bound_bind_point = state.bind_point;
                    bound_layout = state.layout;
                    unsafe {
                        device.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, state.pipeline);
                    }
                }
                Command::BindComputePipeline(pipeline) => {
                    let state = compute_pipelines
                        .get(pipeline)
                        .ok_or_else(|| LumeError::invalid("unknown compute pipeline"))?;
                    bound_bind_point = state.bind_point;
                    bound_layout = state.layout;
                    unsafe {
                        device.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::COMPUTE, state.pipeline);
                    }
                }
                Command::SetBindGroup {
                    index,
                    bind_group,
                    dynamic_offsets,
                } => {
                    let state = bind_groups
                        .get(bind_group)
                        .ok_or_else(|| LumeError::invalid("unknown bind group"))?;
                    unsafe {
                        device.cmd_bind_descriptor_sets(
                            cmd,
                            bound_bind_point,
                            bound_layout,
                            *index,
                            &[state.set],
                            dynamic_offsets,
                        );
                    }
                }
                Command::SetVertexBuffer { slot, buffer, offset } => {
                    let state = buffers.get(buffer).ok_or_else(|| LumeError::invalid("unknown buffer"))?;
                    unsafe {
                        device.cmd_bind_vertex_buffers(cmd, *slot, &[state.buffer], &[*offset]);
                    }
                }
                Command::SetIndexBuffer { buffer, offset, is_u32 } => {
                    let state = buffers.get(buffer).ok_or_else(|| LumeError::invalid("unknown buffer"))?;
                    let index_type = if *is_u32 { vk::IndexType::UINT32 } else { vk::IndexType::UINT16 };
                    unsafe {
                        device.cmd_bind_index_buffer(cmd, state.buffer, *offset, index_type);
                    }
                }
                Command::SetViewport {
                    x,
                    y,
                    width,
                    height,
                    min_depth,
                    max_depth,
                } => unsafe {
                    device.cmd_set_viewport(
                        cmd,
                        0,
                        &[vk::Viewport {
                            x: *x,
                            y: *y,
                            width: *width,
                            height: *height,
                            min_depth: *min_depth,
                            max_depth: *max_depth,
                        }],
                    );
                },
                Command::SetScissor { x, y, width, height } => unsafe {
                    device.cmd_set_scissor(
                        cmd,
                        0,
                        &[vk::Rect2D {
                            offset: vk::Offset2D { x: *x, y: *y },
                            extent: vk::Extent2D {
                                width: *width,
                                height: *height,
                            },
                        }],
                    );
                },
                Command::Draw {
                    vertex_count,
                    instance_count,
                    first_vertex,
                    first_instance,
                } => unsafe {
                    device.cmd_draw(cmd, *vertex_count, *instance_count, *first_vertex, *first_instance);
                },
                Command::DrawIndexed {
                    index_count,
                    instance_count,
                    first_index,
                    base_vertex,
                    first_instance,
                } => unsafe {
                    device.cmd_draw_indexed(
                        cmd,
                        *index_count,
                        *instance_count,
                        *first_index,
                        *base_vertex,
                        *first_instance,
                    );
                },
                Command::Dispatch { x, y, z } => unsafe {
                    device.cmd_dispatch(cmd, *x, *y, *z);
                },
                Command::CopyBufferToBuffer {
                    src,
                    src_offset,
                    dst,
                    dst_offset,
                    size,
                } => {
                    let src_state = buffers.get(src).ok_or_else(|| LumeError::invalid("unknown src buffer"))?;
                    let dst_state = buffers.get(dst).ok_or_else(|| LumeError::invalid("unknown dst buffer"))?;
                    unsafe {
                        device.cmd_copy_buffer(
                            cmd,
                            src_state.buffer,
                            dst_state.buffer,
                            &[vk::BufferCopy {
                                src_offset: *src_offset,
                                dst_offset: *dst_offset,
                                size: *size,
                            }],
                        );
                    }
                }
                Command::CopyBufferToTexture {
                    src,
                    src_offset,
                    bytes_per_row,
                    dst,
                    dst_mip_level,
                    dst_origin,
                    extent,
                } => {
                    let src_state = buffers.get(src).ok_or_else(|| LumeError::invalid("unknown src buffer"))?;
                    let dst_state = textures.get(dst).ok_or_else(|| LumeError::invalid("unknown dst texture"))?;
                    let texel_size = lume_core::format_bytes_per_pixel(dst_state.format).max(1);
                    let row_length = bytes_per_row / texel_size;
                    unsafe {
                        device.cmd_copy_buffer_to_image(
                            cmd,
                            src_state.buffer,
                            dst_state.image,
                            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                            &[vk::BufferImageCopy {
                                buffer_offset: *src_offset,
                                buffer_row_length: row_length,
                                buffer_image_height: 0,
                                image_subresource: vk::ImageSubresourceLayers {
                                    aspect_mask: vk::ImageAspectFlags::COLOR,
                                    mip_level: *dst_mip_level,
                                    base_array_layer: 0,
                                    layer_count: 1,
                                },
                                image_offset: vk::Offset3D {
                                    x: dst_origin.0 as i32,
                                    y: dst_origin.1 as i32,
                                    z: dst_origin.2 as i32,
                                },
                                image_extent: vk::Extent3D {
                                    width: extent.width,
                                    height: extent.height,
                                    depth: extent.depth,
                                },
                            }],
                        );
                    }
                }
                Command::CopyTextureToBuffer {
                    src,
                    src_mip_level,
                    src_origin,
                    dst,
                    dst_offset,
                    bytes_per_row,
                    extent,
                } => {
                    let src_state = textures.get(src).ok_or_else(|| LumeError::invalid("unknown src texture"))?;
                    let dst_state = buffers.get(dst).ok_or_else(|| LumeError::invalid("unknown dst buffer"))?;
                    let texel_size = lume_core::format_bytes_per_pixel(src_state.format).max(1);
                    let row_length = bytes_per_row / texel_size;
                    unsafe {
                        device.cmd_copy_image_to_buffer(
                            cmd,
                            src_state.image,
                            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                            dst_state.buffer,
                            &[vk::BufferImageCopy {
                                buffer_offset: *dst_offset,
                                buffer_row_length: row_length,
                                buffer_image_height: 0,
                                image_subresource: vk::ImageSubresourceLayers {
                                    aspect_mask: vk::ImageAspectFlags::COLOR,
                                    mip_level: *src_mip_level,
                                    base_array_layer: 0,
                                    layer_count: 1,
                                },
                                image_offset: vk::Offset3D {
                                    x: src_origin.0 as i32,
                                    y: src_origin.1 as i32,
                                    z: src_origin.2 as i32,
                                },
                                image_extent: vk::Extent3D {
                                    width: extent.width,
                                    height: extent.height,
                                    depth: extent.depth,
                                },
                            }],
                        );
                    }
                }
                Command::CopyTextureToTexture {
                    src,
                    src_mip_level,
                    src_origin,
                    dst,
                    dst_mip_level,
                    dst_origin,
                    extent,
                } => {
                    let src_state = textures.get(src).ok_or_else(|| LumeError::invalid("unknown src texture"))?;
                    let dst_state = textures.get(dst).ok_or_else(|| LumeError::invalid("unknown dst texture"))?;
                    unsafe {
                        device.cmd_copy_image(
                            cmd,
                            src_state.image,
                            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                            dst_state.image,
                            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                            &[vk::ImageCopy {
                                src_subresource: vk::ImageSubresourceLayers {
                                    aspect_mask: vk::ImageAspectFlags::COLOR,
                                    mip_level: *src_mip_level,
                                    base_array_layer: 0,
                                    layer_count: 1,
                                },
                                src_offset: vk::Offset3D {
                                    x: src_origin.0 as i32,
                                    y: src_origin.1 as i32,
                                    z: src_origin.2 as i32,
                                },
                                dst_subresource: vk::ImageSubresourceLayers {
                                    aspect_mask: vk::ImageAspectFlags::COLOR,
                                    mip_level: *dst_mip_level,
                                    base_array_layer: 0,
                                    layer_count: 1,
                                },
                                dst_offset: vk::Offset3D {
                                    x: dst_origin.0 as i32,
                                    y: dst_origin.1 as i32,
                                    z: dst_origin.2 as i32,
                                },
                                extent: vk::Extent3D {
                                    width: extent.width,
                                    height: extent.height,
                                    depth: extent.depth,
                                },
                            }],
                        );
                    }
                }
                Command::BlitTexture {
                    src,
                    src_region,
                    dst,
                    dst_region,
                    filter,
                } => {
                    let src_state = textures.get(src).ok_or_else(|| LumeError::invalid("unknown src texture"))?;
                    let dst_state = textures.get(dst).ok_or_else(|| LumeError::invalid("unknown dst texture"))?;
                    unsafe {
                        device.cmd_blit_image(
                            cmd,
                            src_state.image,
                            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                            dst_state.image,
                            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                            &[blit_region(*src_region, *dst_region)],
                            conv::filter(*filter),
                        );
                    }
                }
                Command::GenerateMipmaps { texture, filter } => {
                    let texture_state = textures.get(texture).ok_or_else(|| LumeError::invalid("unknown texture"))?;
                    for level in 1..texture_state.mip_level_count {
                        let src_w = (texture_state.extent.width >> (level - 1)).max(1);
                        let src_h = (texture_state.extent.height >> (level - 1)).max(1);
                        let dst_w = (texture_state.extent.width >> level).max(1);
                        let dst_h = (texture_state.extent.height >> level).max(1);
                        let region = vk::ImageBlit {
                            src_subresource: vk::ImageSubresourceLayers {
                                aspect_mask: vk::ImageAspectFlags::COLOR,
                                mip_level: level - 1,
                                base_array_layer: 0,
                                layer_count: 1,
                            },
                            src_offsets: [
                                vk::Offset3D { x: 0, y: 0, z: 0 },
                                vk::Offset3D {
                                    x: src_w as i32,
                                    y: src_h as i32,
                                    z: 1,
                                },
                            ],
                            dst_subresource: vk::ImageSubresourceLayers {
                                aspect_mask: vk::ImageAspectFlags::COLOR,
                                mip_level: level,
                                base_array_layer: 0,
                                layer_count: 1,
                            },
                            dst_offsets: [
                                vk::Offset3D { x: 0, y: 0, z: 0 },
                                vk::Offset3D {
                                    x: dst_w as i32,
                                    y: dst_h as i32,
                                    z: 1,
                                },
                            ],
                        };
                        unsafe {
                            device.cmd_blit_image(
                                cmd,
                                texture_state.image,
                                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                                texture_state.image,
                                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                                &[region],
                                conv::filter(*filter),
                            );
                        }
                    }
                }
                Command::ResetQuerySet { query_set, first, count } => {
                    let state = query_sets.get(query_set).ok_or_else(|| LumeError::invalid("unknown query set"))?;
                    unsafe {
                        device.cmd_reset_query_pool(cmd, state.pool, *first, *count);
                    }
                }
                Command::WriteTimestamp { query_set, index } => {
                    let state = query_sets.get(query_set).ok_or_else(|| LumeError::invalid("unknown query set"))?;
                    unsafe {
                        device.cmd_write_timestamp(cmd, vk::PipelineStageFlags::BOTTOM_OF_PIPE, state.pool, *index);
                    }
                }
                Command::BeginComputePass | Command::EndComputePass => {
                    // Vulkan has no native compute-pass scope; these only
                    // delimit the recorded stream for readability.
                }
            }
        }
        Ok(())
    }

    pub(crate) fn queue_submit_impl(&self, queue: QueueId, submit: SubmitInfo) -> LumeResult<()> {
        let queues = self.pools.queues.read();
        let queue_state = queues.get(&queue).ok_or_else(|| LumeError::invalid("unknown queue"))?;
        let devices = self.pools.devices.read();
        let device_state = devices
            .get(&queue_state.device)
            .ok_or_else(|| LumeError::invalid("owning device was destroyed"))?;

        let encoders = self.pools.command_encoders.read();
        let mut command_buffers = Vec::with_capacity(submit.encoders.len());
        for id in &submit.encoders {
            let state = encoders.get(id).ok_or_else(|| LumeError::invalid("unknown command encoder"))?;
            command_buffers.push(state.command_buffer);
        }

        let semaphores = self.pools.semaphores.read();
        let mut wait_semaphores = Vec::with_capacity(submit.wait_semaphores.len());
        for id in &submit.wait_semaphores {
            wait_semaphores.push(
                semaphores
                    .get(id)
                    .ok_or_else(|| LumeError::invalid("unknown wait semaphore"))?
                    .semaphore,
            );
        }
        let mut signal_semaphores = Vec::with_capacity(submit.signal_semaphores.len());
        for id in &submit.signal_semaphores {
            signal_semaphores.push(
                semaphores
                    .get(id)
                    .ok_or_else(|| LumeError::invalid("unknown signal semaphore"))?
                    .semaphore,
            );
        }
        let wait_stages = vec![vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT; wait_semaphores.len()];

        let fences = self.pools.fences.read();
        let fence = match submit.signal_fence {
            Some(id) => {
                fences
                    .get(&id)
                    .ok_or_else(|| LumeError::invalid("unknown signal fence"))?
                    .fence
            }
            None => vk::Fence::null(),
        };

        let vk_submit = vk::SubmitInfo::default()
            .command_buffers(&command_buffers)
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            device_state
                .device
                .queue_submit(device_state.queue, &[vk_submit], fence)
                .map_err(|e| LumeError::unknown(format!("vkQueueSubmit failed: {e}")))
        }
    }
}

fn blit_region(src: (u32, u32, u32, u32, u32, u32), dst: (u32, u32, u32, u32, u32, u32)) -> vk::ImageBlit {
    vk::ImageBlit {
        src_subresource: vk::ImageSubresourceLayers {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            mip_level: 0,
            base_array_layer: 0,
            layer_count: 1,
        },
        src_offsets: [
            vk::Offset3D {
                x: src.0 as i32,
                y: src.1 as i32,
                z: src.2 as i32,
            },
            vk::Offset3D {
                x: (src.0 + src.3) as i32,
                y: (src.1 + src.4) as i32,
                z: (src.2 + src.5).max(1) as i32,
            },
        ],
        dst_subresource: vk::ImageSubresourceLayers {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            mip_level: 0,
            base_array_layer: 0,
            layer_count: 1,
        },
        dst_offsets: [
            vk::Offset3D {
                x: dst.0 as i32,
                y: dst.1 as i32,
                z: dst.2 as i32,
            },
            vk::Offset3D {
                x: (dst.0 + dst.3) as i32,
                y: (dst.1 + dst.4) as i32,
                z: (dst.2 + dst.5).max(1) as i32,
            },
        ],
    }
}
