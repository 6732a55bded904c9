//! Command encoder lifecycle and `Command` stream translation (§4.2, §4.2.5),
//! the implicit-backend counterpart of `lume_vulkan::command`.
//!
//! `wgpu::RenderPass`/`wgpu::ComputePass` borrow the encoder for a lifetime,
//! which doesn't fit a command-at-a-time `match`. `encoder_record_impl`
//! instead scans the stream for `Begin*`/`End*` pairs and processes each
//! sub-slice inside one local scope holding the borrowed pass, so the pass
//! never needs to outlive a single call.

use crate::blit::Blitter;
use crate::conv;
use crate::state::{CommandEncoderState, WebGpuBackend};
use lume_core::backend::{Command, EncoderState, SubmitInfo};
use lume_core::error::{LumeError, LumeResult};
use lume_core::ids::*;
use lume_core::types::*;
use parking_lot::Mutex;
use std::sync::Arc;

impl WebGpuBackend {
    pub(crate) fn create_command_encoder_impl(&self, device: DeviceId) -> LumeResult<CommandEncoderId> {
        self.pools
            .devices
            .read()
            .get(&device)
            .ok_or_else(|| LumeError::invalid("unknown device"))?;

        let id = CommandEncoderId::alloc();
        self.pools.command_encoders.write().insert(
            id,
            CommandEncoderState {
                device,
                encoder: Mutex::new(None),
                finished: Mutex::new(None),
            },
        );
        Ok(id)
    }

    pub(crate) fn destroy_command_encoder_impl(&self, encoder: CommandEncoderId) {
        self.pools.command_encoders.write().remove(&encoder);
    }

    pub(crate) fn encoder_state_impl(&self, encoder: CommandEncoderId) -> LumeResult<EncoderState> {
        let encoders = self.pools.command_encoders.read();
        let state = encoders
            .get(&encoder)
            .ok_or_else(|| LumeError::invalid("unknown command encoder"))?;
        if state.finished.lock().is_some() {
            Ok(EncoderState::Finished)
        } else if state.encoder.lock().is_some() {
            Ok(EncoderState::Recording)
        } else {
            Ok(EncoderState::Reset)
        }
    }

    pub(crate) fn encoder_begin_impl(&self, encoder: CommandEncoderId) -> LumeResult<()> {
        let encoders = self.pools.command_encoders.read();
        let state = encoders
            .get(&encoder)
            .ok_or_else(|| LumeError::invalid("unknown command encoder"))?;
        let devices = self.pools.devices.read();
        let device_state = devices
            .get(&state.device)
            .ok_or_else(|| LumeError::invalid("owning device was destroyed"))?;

        let native = device_state
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        *state.encoder.lock() = Some(native);
        *state.finished.lock() = None;
        Ok(())
    }

    pub(crate) fn encoder_end_impl(&self, encoder: CommandEncoderId) -> LumeResult<()> {
        let encoders = self.pools.command_encoders.read();
        let state = encoders
            .get(&encoder)
            .ok_or_else(|| LumeError::invalid("unknown command encoder"))?;
        let native = state
            .encoder
            .lock()
            .take()
            .ok_or_else(|| LumeError::invalid("encoder has not been begun"))?;
        *state.finished.lock() = Some(native.finish());
        Ok(())
    }

    fn blitter_for(&self, device: DeviceId) -> LumeResult<Arc<Blitter>> {
        if let Some(existing) = self.pools.blitters.read().get(&device) {
            return Ok(existing.clone());
        }
        let devices = self.pools.devices.read();
        let device_state = devices
            .get(&device)
            .ok_or_else(|| LumeError::invalid("owning device was destroyed"))?;
        let blitter = Arc::new(Blitter::new(&device_state.device));
        self.pools.blitters.write().insert(device, blitter.clone());
        Ok(blitter)
    }

    pub(crate) fn encoder_record_impl(&self, encoder: CommandEncoderId, commands: &[Command]) -> LumeResult<()> {
        let encoders = self.pools.command_encoders.read();
        let enc_state = encoders
            .get(&encoder)
            .ok_or_else(|| LumeError::invalid("unknown command encoder"))?;
        let devices = self.pools.devices.read();
        let device_state = devices
            .get(&enc_state.device)
            .ok_or_else(|| LumeError::invalid("owning device was destroyed"))?;

        let mut guard = enc_state.encoder.lock();
        let native = guard
            .as_mut()
            .ok_or_else(|| LumeError::invalid("encoder has not been begun"))?;

        let textures = self.pools.textures.read();
        let texture_views = self.pools.texture_views.read();
        let buffers = self.pools.buffers.read();
        let render_passes = self.pools.render_passes.read();
        let framebuffers = self.pools.framebuffers.read();
        let render_pipelines = self.pools.render_pipelines.read();
        let compute_pipelines = self.pools.compute_pipelines.read();
        let bind_groups = self.pools.bind_groups.read();
        let query_sets = self.pools.query_sets.read();

        let mut i = 0;
        while i < commands.len() {
            match &commands[i] {
                Command::TextureBarrier {
                    texture,
                    old_layout,
                    new_layout,
                    ..
                } => {
                    let state = textures.get(texture).ok_or_else(|| LumeError::invalid("unknown texture"))?;
                    let mut current = state.current_layout.lock();
                    if *current != *old_layout {
                        return Err(LumeError::invalid(
                            "texture_barrier old_layout does not match tracked current layout",
                        ));
                    }
                    *current = *new_layout;
                }

                Command::BeginRenderPass(begin) => {
                    let end = find_end(commands, i + 1, is_end_render_pass)
                        .ok_or_else(|| LumeError::invalid("BeginRenderPass without matching EndRenderPass"))?;

                    let render_pass_state = render_passes
                        .get(&begin.render_pass)
                        .ok_or_else(|| LumeError::invalid("unknown render pass"))?;
                    let framebuffer_state = framebuffers
                        .get(&begin.framebuffer)
                        .ok_or_else(|| LumeError::invalid("unknown framebuffer"))?;

                    let color_count = render_pass_state.desc.color_attachments.len();
                    let has_depth = render_pass_state.desc.depth_stencil_attachment.is_some();
                    if framebuffer_state.attachments.len() != color_count + usize::from(has_depth) {
                        return Err(LumeError::invalid(
                            "framebuffer attachment count does not match render pass layout",
                        ));
                    }

                    let mut color_attachments = Vec::with_capacity(color_count);
                    for (index, color) in render_pass_state.desc.color_attachments.iter().enumerate() {
                        let view_state = texture_views
                            .get(&framebuffer_state.attachments[index])
                            .ok_or_else(|| LumeError::invalid("unknown color attachment view"))?;
                        let resolve_target = framebuffer_state
                            .resolve_attachments
                            .get(index)
                            .and_then(|r| *r)
                            .map(|id| {
                                texture_views
                                    .get(&id)
                                    .map(|v| &v.view)
                                    .ok_or_else(|| LumeError::invalid("unknown resolve attachment view"))
                            })
                            .transpose()?;
                        let clear = begin.clear_colors.get(index).copied().unwrap_or(ClearColor {
                            r: 0.0,
                            g: 0.0,
                            b: 0.0,
                            a: 0.0,
                        });
                        color_attachments.push(Some(wgpu::RenderPassColorAttachment {
                            view: &view_state.view,
                            resolve_target,
                            ops: wgpu::Operations {
                                load: conv::load_op(
                                    color.load_op,
                                    wgpu::Color {
                                        r: clear.r,
                                        g: clear.g,
                                        b: clear.b,
                                        a: clear.a,
                                    },
                                ),
                                store: conv::store_op(color.store_op),
                            },
                        }));
                    }

                    let depth_stencil_attachment = if let Some(ds) = &render_pass_state.desc.depth_stencil_attachment {
                        let view_state = texture_views
                            .get(&framebuffer_state.attachments[color_count])
                            .ok_or_else(|| LumeError::invalid("unknown depth attachment view"))?;
                        let depth_ops = Some(wgpu::Operations {
                            load: conv::load_op(ds.depth_load_op, begin.clear_depth),
                            store: conv::store_op(ds.depth_store_op),
                        });
                        let stencil_ops = lume_core::format_has_stencil(ds.format).then_some(wgpu::Operations {
                            load: conv::load_op(ds.stencil_load_op, begin.clear_stencil),
                            store: conv::store_op(ds.stencil_store_op),
                        });
                        Some(wgpu::RenderPassDepthStencilAttachment {
                            view: &view_state.view,
                            depth_ops,
                            stencil_ops,
                        })
                    } else {
                        None
                    };

                    {
                        let mut pass = native.begin_render_pass(&wgpu::RenderPassDescriptor {
                            label: None,
                            color_attachments: &color_attachments,
                            depth_stencil_attachment,
                            timestamp_writes: None,
                            occlusion_query_set: None,
                        });
                        pass.set_viewport(
                            0.0,
                            0.0,
                            begin.render_extent.width as f32,
                            begin.render_extent.height as f32,
                            0.0,
                            1.0,
                        );
                        pass.set_scissor_rect(0, 0, begin.render_extent.width, begin.render_extent.height);
                        record_render_pass(
                            &mut pass,
                            &commands[i + 1..end],
                            &render_pipelines,
                            &bind_groups,
                            &buffers,
                        )?;
                    }
                    i = end;
                }
                Command::EndRenderPass => {
                    return Err(LumeError::invalid("EndRenderPass without a matching BeginRenderPass"));
                }

                Command::BeginComputePass => {
                    let end = find_end(commands, i + 1, |c| matches!(c, Command::EndComputePass))
                        .ok_or_else(|| LumeError::invalid("BeginComputePass without matching EndComputePass"))?;
                    {
                        let mut pass = native.begin_compute_pass(&wgpu::ComputePassDescriptor {
                            label: None,
                            timestamp_writes: None,
                        });
                        record_compute_pass(&mut pass, &commands[i + 1..end], &compute_pipelines, &bind_groups)?;
                    }
                    i = end;
                }
                Command::EndComputePass => {
                    return Err(LumeError::invalid("EndComputePass without a matching BeginComputePass"));
                }

                Command::CopyBufferToBuffer {
                    src,
                    src_offset,
                    dst,
                    dst_offset,
                    size,
                } => {
                    let src_state = buffers.get(src).ok_or_else(|| LumeError::invalid("unknown src buffer"))?;
                    let dst_state = buffers.get(dst).ok_or_else(|| LumeError::invalid("unknown dst buffer"))?;
                    native.copy_buffer_to_buffer(&src_state.buffer, *src_offset, &dst_state.buffer, *dst_offset, *size);
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
                    native.copy_buffer_to_texture(
                        wgpu::ImageCopyBuffer {
                            buffer: &src_state.buffer,
                            layout: wgpu::ImageDataLayout {
                                offset: *src_offset,
                                bytes_per_row: Some(*bytes_per_row),
                                rows_per_image: Some(extent.height),
                            },
                        },
                        wgpu::ImageCopyTexture {
                            texture: &dst_state.texture,
                            mip_level: *dst_mip_level,
                            origin: origin3d(*dst_origin),
                            aspect: wgpu::TextureAspect::All,
                        },
                        extent3d(*extent),
                    );
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
                    native.copy_texture_to_buffer(
                        wgpu::ImageCopyTexture {
                            texture: &src_state.texture,
                            mip_level: *src_mip_level,
                            origin: origin3d(*src_origin),
                            aspect: wgpu::TextureAspect::All,
                        },
                        wgpu::ImageCopyBuffer {
                            buffer: &dst_state.buffer,
                            layout: wgpu::ImageDataLayout {
                                offset: *dst_offset,
                                bytes_per_row: Some(*bytes_per_row),
                                rows_per_image: Some(extent.height),
                            },
                        },
                        extent3d(*extent),
                    );
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
                    native.copy_texture_to_texture(
                        wgpu::ImageCopyTexture {
                            texture: &src_state.texture,
                            mip_level: *src_mip_level,
                            origin: origin3d(*src_origin),
                            aspect: wgpu::TextureAspect::All,
                        },
                        wgpu::ImageCopyTexture {
                            texture: &dst_state.texture,
                            mip_level: *dst_mip_level,
                            origin: origin3d(*dst_origin),
                            aspect: wgpu::TextureAspect::All,
                        },
                        extent3d(*extent),
                    );
                }

                Command::BlitTexture {
                    src,
                    dst,
                    dst_region,
                    filter,
                    ..
                } => {
                    let src_state = textures.get(src).ok_or_else(|| LumeError::invalid("unknown src texture"))?;
                    let dst_state = textures.get(dst).ok_or_else(|| LumeError::invalid("unknown dst texture"))?;
                    let src_view = src_state.texture.create_view(&wgpu::TextureViewDescriptor::default());
                    let dst_view = dst_state.texture.create_view(&wgpu::TextureViewDescriptor::default());
                    let blitter = self.blitter_for(enc_state.device)?;
                    blitter.blit(
                        &device_state.device,
                        native,
                        &src_view,
                        &dst_view,
                        conv::texture_format(dst_state.format),
                        conv::filter(*filter),
                        (dst_region.0, dst_region.1, dst_region.3, dst_region.4),
                    );
                }
                Command::GenerateMipmaps { texture, filter } => {
                    let texture_state = textures.get(texture).ok_or_else(|| LumeError::invalid("unknown texture"))?;
                    let blitter = self.blitter_for(enc_state.device)?;
                    let format = conv::texture_format(texture_state.format);
                    for level in 1..texture_state.mip_level_count {
                        let src_view = texture_state.texture.create_view(&wgpu::TextureViewDescriptor {
                            base_mip_level: level - 1,
                            mip_level_count: Some(1),
                            ..Default::default()
                        });
                        let dst_view = texture_state.texture.create_view(&wgpu::TextureViewDescriptor {
                            base_mip_level: level,
                            mip_level_count: Some(1),
                            ..Default::default()
                        });
                        let width = (texture_state.extent.width >> level).max(1);
                        let height = (texture_state.extent.height >> level).max(1);
                        blitter.blit(
                            &device_state.device,
                            native,
                            &src_view,
                            &dst_view,
                            format,
                            conv::filter(*filter),
                            (0, 0, width, height),
                        );
                    }
                }

                Command::ResetQuerySet { query_set, .. } => {
                    query_sets
                        .get(query_set)
                        .ok_or_else(|| LumeError::invalid("unknown query set"))?;
                    // wgpu query sets need no explicit reset between uses.
                }
                Command::WriteTimestamp { query_set, index } => {
                    let state = query_sets
                        .get(query_set)
                        .ok_or_else(|| LumeError::invalid("unknown query set"))?;
                    native.write_timestamp(&state.query_set, *index);
                }

                Command::BindRenderPipeline(_)
                | Command::BindComputePipeline(_)
                | Command::SetBindGroup { .. }
                | Command::SetVertexBuffer { .. }
                | Command::SetIndexBuffer { .. }
                | Command::SetViewport { .. }
                | Command::SetScissor { .. }
                | Command::Draw { .. }
                | Command::DrawIndexed { .. }
                | Command::Dispatch { .. } => {
                    return Err(LumeError::invalid(
                        "draw/dispatch commands must occur between BeginRenderPass/BeginComputePass and their matching End",
                    ));
                }
            }
            i += 1;
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

        for semaphore in &submit.wait_semaphores {
            self.wait_for_semaphore_submission(*semaphore)?;
        }

        let encoders = self.pools.command_encoders.read();
        let mut buffers = Vec::with_capacity(submit.encoders.len());
        for id in &submit.encoders {
            let state = encoders
                .get(id)
                .ok_or_else(|| LumeError::invalid("unknown command encoder"))?;
            let buffer = state
                .finished
                .lock()
                .take()
                .ok_or_else(|| LumeError::invalid("command encoder has not been ended"))?;
            buffers.push(buffer);
        }

        let index = device_state.queue.submit(buffers);

        if let Some(fence) = submit.signal_fence {
            let fences = self.pools.fences.read();
            let fence_state = fences.get(&fence).ok_or_else(|| LumeError::invalid("unknown fence"))?;
            *fence_state.submission.lock() = Some(index);
            *fence_state.signaled.lock() = false;
        }
        for semaphore in &submit.signal_semaphores {
            self.signal_semaphore_impl(*semaphore, 1)?;
        }
        Ok(())
    }
}

fn is_end_render_pass(command: &Command) -> bool {
    matches!(command, Command::EndRenderPass)
}

fn find_end(commands: &[Command], from: usize, matches_end: impl Fn(&Command) -> bool) -> Option<usize> {
    commands[from..].iter().position(matches_end).map(|offset| from + offset)
}

fn origin3d(origin: (u32, u32, u32)) -> wgpu::Origin3d {
    wgpu::Origin3d {
        x: origin.0,
        y: origin.1,
        z: origin.2,
    }
}

fn extent3d(extent: Extent3d) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: extent.width,
        height: extent.height,
        depth_or_array_layers: extent.depth,
    }
}

fn record_render_pass<'a>(
    pass: &mut wgpu::RenderPass<'a>,
    commands: &'a [Command],
    render_pipelines: &'a std::collections::HashMap<RenderPipelineId, crate::state::PipelineState>,
    bind_groups: &'a std::collections::HashMap<BindGroupId, crate::state::BindGroupState>,
    buffers: &'a std::collections::HashMap<BufferId, crate::state::BufferState>,
) -> LumeResult<()> {
    for command in commands {
        match command {
            Command::BindRenderPipeline(id) => {
                let state = render_pipelines
                    .get(id)
                    .ok_or_else(|| LumeError::invalid("unknown render pipeline"))?;
                let crate::state::PipelineState::Render { pipeline, .. } = state else {
                    return Err(LumeError::invalid("handle does not refer to a render pipeline"));
                };
                pass.set_pipeline(pipeline);
            }
            Command::SetBindGroup {
                index,
                bind_group,
                dynamic_offsets,
            } => {
                let state = bind_groups
                    .get(bind_group)
                    .ok_or_else(|| LumeError::invalid("unknown bind group"))?;
                pass.set_bind_group(*index, &state.bind_group, dynamic_offsets);
            }
            Command::SetVertexBuffer { slot, buffer, offset } => {
                let state = buffers.get(buffer).ok_or_else(|| LumeError::invalid("unknown buffer"))?;
                pass.set_vertex_buffer(*slot, state.buffer.slice(*offset..));
            }
            Command::SetIndexBuffer { buffer, offset, is_u32 } => {
                let state = buffers.get(buffer).ok_or_else(|| LumeError::invalid("unknown buffer"))?;
                let format = if *is_u32 {
                    wgpu::IndexFormat::Uint32
                } else {
                    wgpu::IndexFormat::Uint16
                };
                pass.set_index_buffer(state.buffer.slice(*offset..), format);
            }
            Command::SetViewport {
                x,
                y,
                width,
                height,
                min_depth,
                max_depth,
            } => {
                pass.set_viewport(*x, *y, *width, *height, *min_depth, *max_depth);
            }
            Command::SetScissor { x, y, width, height } => {
                pass.set_scissor_rect((*x).max(0) as u32, (*y).max(0) as u32, *width, *height);
            }
            Command::Draw {
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            } => {
                pass.draw(
                    *first_vertex..(*first_vertex + *vertex_count),
                    *first_instance..(*first_instance + *instance_count),
                );
            }
            Command::DrawIndexed {
                index_count,
                instance_count,
                first_index,
                base_vertex,
                first_instance,
            } => {
                pass.draw_indexed(
                    *first_index..(*first_index + *index_count),
                    *base_vertex,
                    *first_instance..(*first_instance + *instance_count),
                );
            }
            other => {
                return Err(LumeError::invalid(format!(
                    "{other:?} is not valid inside a render pass"
                )));
            }
        }
    }
    Ok(())
}

fn record_compute_pass<'a>(
    pass: &mut wgpu::ComputePass<'a>,
    commands: &'a [Command],
    compute_pipelines: &'a std::collections::HashMap<ComputePipelineId, crate::state::PipelineState>,
    bind_groups: &'a std::collections::HashMap<BindGroupId, crate::state::BindGroupState>,
) -> LumeResult<()> {
    for command in commands {
        match command {
            Command::BindComputePipeline(id) => {
                let state = compute_pipelines
                    .get(id)
                    .ok_or_else(|| LumeError::invalid("unknown compute pipeline"))?;
                let crate::state::PipelineState::Compute { pipeline, .. } = state else {
                    return Err(LumeError::invalid("handle does not refer to a compute pipeline"));
                };
                pass.set_pipeline(pipeline);
            }
            Command::SetBindGroup {
                index,
                bind_group,
                dynamic_offsets,
            } => {
                let state = bind_groups
                    .get(bind_group)
                    .ok_or_else(|| LumeError::invalid("unknown bind group"))?;
                pass.set_bind_group(*index, &state.bind_group, dynamic_offsets);
            }
            Command::Dispatch { x, y, z } => {
                pass.dispatch_workgroups(*x, *y, *z);
            }
            other => {
                return Err(LumeError::invalid(format!(
                    "{other:?} is not valid inside a compute pass"
                )));
            }
        }
    }
    Ok(())
}
