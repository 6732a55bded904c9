//! Render passes, framebuffers and graphics/compute pipelines (§4.2.2).

use crate::conv;
use crate::state::{FramebufferState, PipelineState, RenderPassState, VulkanBackend};
use ash::vk;
use lume_core::error::{LumeError, LumeResult};
use lume_core::ids::*;
use lume_core::types::*;

fn vk_load_op(op: LoadOp) -> vk::AttachmentLoadOp {
    match op {
        LoadOp::Load => vk::AttachmentLoadOp::LOAD,
        LoadOp::Clear => vk::AttachmentLoadOp::CLEAR,
    }
}

fn vk_store_op(op: StoreOp) -> vk::AttachmentStoreOp {
    match op {
        StoreOp::Store => vk::AttachmentStoreOp::STORE,
        StoreOp::Discard => vk::AttachmentStoreOp::DONT_CARE,
    }
}

impl VulkanBackend {
    pub(crate) fn create_render_pass_impl(
        &self,
        device: DeviceId,
        desc: &RenderPassDescriptor,
    ) -> LumeResult<RenderPassId> {
        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;

        let mut attachments = Vec::new();
        let mut color_refs = Vec::new();
        let mut resolve_refs = Vec::new();
        let mut has_resolve = false;

        for color in &desc.color_attachments {
            let index = attachments.len() as u32;
            attachments.push(
                vk::AttachmentDescription::default()
                    .format(conv::texture_format(color.format))
                    .samples(sample_count_flags(color.sample_count))
                    .load_op(vk_load_op(color.load_op))
                    .store_op(vk_store_op(color.store_op))
                    .initial_layout(vk::ImageLayout::UNDEFINED)
                    .final_layout(conv::image_layout(color.final_layout)),
            );
            color_refs.push(vk::AttachmentReference {
                attachment: index,
                layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            });

            if let Some(resolve) = &color.resolve {
                has_resolve = true;
                let resolve_index = attachments.len() as u32;
                attachments.push(
                    vk::AttachmentDescription::default()
                        .format(conv::texture_format(resolve.format))
                        .samples(vk::SampleCountFlags::TYPE_1)
                        .load_op(vk_load_op(resolve.load_op))
                        .store_op(vk_store_op(resolve.store_op))
                        .initial_layout(vk::ImageLayout::UNDEFINED)
                        .final_layout(conv::image_layout(resolve.final_layout)),
                );
                resolve_refs.push(vk::AttachmentReference {
                    attachment: resolve_index,
                    layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
                });
            } else {
                resolve_refs.push(vk::AttachmentReference {
                    attachment: vk::ATTACHMENT_UNUSED,
                    layout: vk::ImageLayout::UNDEFINED,
                });
            }
        }

        let depth_ref = if let Some(ds) = &desc.depth_stencil_attachment {
            let index = attachments.len() as u32;
            let (stencil_load_op, stencil_store_op) = if lume_core::format_has_stencil(ds.format) {
                (vk_load_op(ds.stencil_load_op), vk_store_op(ds.stencil_store_op))
            } else {
                (vk::AttachmentLoadOp::DONT_CARE, vk::AttachmentStoreOp::DONT_CARE)
            };
            attachments.push(
                vk::AttachmentDescription::default()
                    .format(conv::texture_format(ds.format))
                    .samples(sample_count_flags(ds.sample_count))
                    .load_op(vk_load_op(ds.depth_load_op))
                    .store_op(vk_store_op(ds.depth_store_op))
                    .stencil_load_op(stencil_load_op)
                    .stencil_store_op(stencil_store_op)
                    .initial_layout(vk::ImageLayout::UNDEFINED)
                    .final_layout(conv::image_layout(ds.final_layout)),
            );
            Some(vk::AttachmentReference {
                attachment: index,
                layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            })
        } else {
            None
        };

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs);
        if has_resolve {
            subpass = subpass.resolve_attachments(&resolve_refs);
        }
        if let Some(depth_ref) = &depth_ref {
            subpass = subpass.depth_stencil_attachment(depth_ref);
        }
        let subpasses = [subpass];

        let render_pass = unsafe {
            device_state
                .device
                .create_render_pass(
                    &vk::RenderPassCreateInfo::default()
                        .attachments(&attachments)
                        .subpasses(&subpasses),
                    None,
                )
                .map_err(|e| LumeError::unknown(format!("vkCreateRenderPass failed: {e}")))?
        };

        let id = RenderPassId::alloc();
        self.pools.render_passes.write().insert(
            id,
            RenderPassState {
                device,
                render_pass,
                desc: desc.clone(),
            },
        );
        Ok(id)
    }

    pub(crate) fn destroy_render_pass_impl(&self, render_pass: RenderPassId) {
        let Some(state) = self.pools.render_passes.write().remove(&render_pass) else {
            return;
        };
        let devices = self.pools.devices.read();
        if let Some(device_state) = devices.get(&state.device) {
            unsafe {
                device_state.device.destroy_render_pass(state.render_pass, None);
            }
        }
    }

    pub(crate) fn create_framebuffer_impl(
        &self,
        device: DeviceId,
        desc: &FramebufferDescriptor,
    ) -> LumeResult<FramebufferId> {
        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;
        let render_passes = self.pools.render_passes.read();
        let render_pass_state = render_passes
            .get(&desc.render_pass)
            .ok_or_else(|| LumeError::invalid("unknown render pass"))?;

        let views = self.pools.texture_views.read();
        let mut attachments = Vec::with_capacity(desc.attachments.len());
        for view_id in &desc.attachments {
            let view_state = views.get(view_id).ok_or_else(|| LumeError::invalid("unknown texture view"))?;
            attachments.push(view_state.view);
        }
        for resolve in desc.resolve_attachments.iter().flatten() {
            let view_state = views.get(resolve).ok_or_else(|| LumeError::invalid("unknown resolve view"))?;
            attachments.push(view_state.view);
        }

        let framebuffer = unsafe {
            device_state
                .device
                .create_framebuffer(
                    &vk::FramebufferCreateInfo::default()
                        .render_pass(render_pass_state.render_pass)
                        .attachments(&attachments)
                        .width(desc.extent.width)
                        .height(desc.extent.height)
                        .layers(desc.extent.depth.max(1)),
                    None,
                )
                .map_err(|e| LumeError::unknown(format!("vkCreateFramebuffer failed: {e}")))?
        };

        let id = FramebufferId::alloc();
        self.pools.framebuffers.write().insert(
            id,
            FramebufferState {
                device,
                framebuffer,
                render_pass: desc.render_pass,
                extent: desc.extent,
            },
        );
        Ok(id)
    }

    pub(crate) fn destroy_framebuffer_impl(&self, framebuffer: FramebufferId) {
        let Some(state) = self.pools.framebuffers.write().remove(&framebuffer) else {
            return;
        };
        let devices = self.pools.devices.read();
        if let Some(device_state) = devices.get(&state.device) {
            unsafe {
                device_state.device.destroy_framebuffer(state.framebuffer, None);
            }
        }
    }

    pub(crate) fn create_render_pipeline_impl(
        &self,
        device: DeviceId,
        desc: &RenderPipelineDescriptor,
    ) -> LumeResult<RenderPipelineId> {
        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;
        let render_passes = self.pools.render_passes.read();
        let render_pass_state = render_passes
            .get(&desc.render_pass)
            .ok_or_else(|| LumeError::invalid("unknown render pass"))?;
        let layouts_pool = self.pools.bind_group_layouts.read();
        let shaders = self.pools.shaders.read();

        let mut set_layouts = Vec::with_capacity(desc.bind_group_layouts.len());
        for id in &desc.bind_group_layouts {
            set_layouts.push(
                layouts_pool
                    .get(id)
                    .ok_or_else(|| LumeError::invalid("unknown bind group layout"))?
                    .layout,
            );
        }
        let pipeline_layout = unsafe {
            device_state
                .device
                .create_pipeline_layout(
                    &vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts),
                    None,
                )
                .map_err(|e| LumeError::unknown(format!("vkCreatePipelineLayout failed: {e}")))?
        };

        let vertex_shader = shaders
            .get(&desc.vertex.shader)
            .ok_or_else(|| LumeError::invalid("unknown vertex shader"))?;
        let vertex_entry = std::ffi::CString::new(desc.vertex.entry_point.clone()).unwrap();
        let mut stages = vec![vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::VERTEX)
            .module(vertex_shader.module)
            .name(&vertex_entry)];

        let fragment_entry;
        if let Some(fragment) = &desc.fragment {
            let fragment_shader = shaders
                .get(&fragment.shader)
                .ok_or_else(|| LumeError::invalid("unknown fragment shader"))?;
            fragment_entry = std::ffi::CString::new(fragment.entry_point.clone()).unwrap();
            stages.push(
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(vk::ShaderStageFlags::FRAGMENT)
                    .module(fragment_shader.module)
                    .name(&fragment_entry),
            );
        }

        let mut bindings = Vec::new();
        let mut attributes = Vec::new();
        for (slot, buffer) in desc.vertex.buffers.iter().enumerate() {
            bindings.push(vk::VertexInputBindingDescription {
                binding: slot as u32,
                stride: buffer.stride as u32,
                input_rate: match buffer.step_mode {
                    VertexStepMode::Vertex => vk::VertexInputRate::VERTEX,
                    VertexStepMode::Instance => vk::VertexInputRate::INSTANCE,
                },
            });
            for attr in &buffer.attributes {
                attributes.push(vk::VertexInputAttributeDescription {
                    location: attr.shader_location,
                    binding: slot as u32,
                    format: conv::vertex_format(attr.format),
                    offset: attr.offset as u32,
                });
            }
        }
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&bindings)
            .vertex_attribute_descriptions(&attributes);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(conv::primitive_topology(desc.primitive.topology));

        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
            .polygon_mode(match desc.primitive.polygon_mode {
                PolygonMode::Fill => vk::PolygonMode::FILL,
                PolygonMode::Line => vk::PolygonMode::LINE,
                PolygonMode::Point => vk::PolygonMode::POINT,
            })
            .cull_mode(match desc.primitive.cull_mode {
                CullMode::None => vk::CullModeFlags::NONE,
                CullMode::Front => vk::CullModeFlags::FRONT,
                CullMode::Back => vk::CullModeFlags::BACK,
            })
            .front_face(conv::front_face(desc.primitive.front_face))
            .line_width(1.0);

        let multisample =
            vk::PipelineMultisampleStateCreateInfo::default().rasterization_samples(sample_count_flags(desc.sample_count));

        let mut depth_stencil = vk::PipelineDepthStencilStateCreateInfo::default();
        if let Some(ds) = &desc.depth_stencil {
            depth_stencil = depth_stencil
                .depth_test_enable(true)
                .depth_write_enable(ds.depth_write_enabled)
                .depth_compare_op(conv::compare_op(ds.depth_compare));
        }

        let attachments: Vec<vk::PipelineColorBlendAttachmentState> = desc
            .fragment
            .as_ref()
            .map(|f| {
                f.targets
                    .iter()
                    .map(|target| {
                        let mut mask = vk::ColorComponentFlags::empty();
                        if target.write_mask.contains(ColorWriteMask::RED) {
                            mask |= vk::ColorComponentFlags::R;
                        }
                        if target.write_mask.contains(ColorWriteMask::GREEN) {
                            mask |= vk::ColorComponentFlags::G;
                        }
                        if target.write_mask.contains(ColorWriteMask::BLUE) {
                            mask |= vk::ColorComponentFlags::B;
                        }
                        if target.write_mask.contains(ColorWriteMask::ALPHA) {
                            mask |= vk::ColorComponentFlags::A;
                        }
                        vk::PipelineColorBlendAttachmentState::default()
                            .color_write_mask(mask)
                            .blend_enable(target.blend_enabled)
                            .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
                            .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                            .color_blend_op(vk::BlendOp::ADD)
                            .src_alpha_blend_factor(vk::BlendFactor::ONE)
                            .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
                            .alpha_blend_op(vk::BlendOp::ADD)
                    })
                    .collect()
            })
            .unwrap_or_default();
        let color_blend = vk::PipelineColorBlendStateCreateInfo::default().attachments(&attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        let create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blend)
            .dynamic_state(&dynamic_state)
            .layout(pipeline_layout)
            .render_pass(render_pass_state.render_pass)
            .subpass(0);

        let pipelines = unsafe {
            device_state
                .device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
                .map_err(|(_, e)| LumeError::unknown(format!("vkCreateGraphicsPipelines failed: {e}")))?
        };

        let id = RenderPipelineId::alloc();
        self.pools.render_pipelines.write().insert(
            id,
            PipelineState {
                device,
                pipeline: pipelines[0],
                layout: pipeline_layout,
                bind_point: vk::PipelineBindPoint::GRAPHICS,
            },
        );
        Ok(id)
    }

    pub(crate) fn destroy_render_pipeline_impl(&self, pipeline: RenderPipelineId) {
        let Some(state) = self.pools.render_pipelines.write().remove(&pipeline) else {
            return;
        };
        let devices = self.pools.devices.read();
        if let Some(device_state) = devices.get(&state.device) {
            unsafe {
                device_state.device.destroy_pipeline(state.pipeline, None);
                device_state.device.destroy_pipeline_layout(state.layout, None);
            }
        }
    }

    pub(crate) fn create_compute_pipeline_impl(
        &self,
        device: DeviceId,
        desc: &ComputePipelineDescriptor,
    ) -> LumeResult<ComputePipelineId> {
        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;
        let layouts_pool = self.pools.bind_group_layouts.read();
        let shaders = self.pools.shaders.read();

        let mut set_layouts = Vec::with_capacity(desc.bind_group_layouts.len());
        for id in &desc.bind_group_layouts {
            set_layouts.push(
                layouts_pool
                    .get(id)
                    .ok_or_else(|| LumeError::invalid("unknown bind group layout"))?
                    .layout,
            );
        }
        let pipeline_layout = unsafe {
            device_state
                .device
                .create_pipeline_layout(
                    &vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts),
                    None,
                )
                .map_err(|e| LumeError::unknown(format!("vkCreatePipelineLayout failed: {e}")))?
        };

        let shader = shaders.get(&desc.shader).ok_or_else(|| LumeError::invalid("unknown shader"))?;
        let entry = std::ffi::CString::new(desc.entry_point.clone()).unwrap();
        let stage = vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::COMPUTE)
            .module(shader.module)
            .name(&entry);

        let create_info = vk::ComputePipelineCreateInfo::default()
            .stage(stage)
            .layout(pipeline_layout);

        let pipelines = unsafe {
            device_state
                .device
                .create_compute_pipelines(vk::PipelineCache::null(), &[create_info], None)
                .map_err(|(_, e)| LumeError::unknown(format!("vkCreateComputePipelines failed: {e}")))?
        };

        let id = ComputePipelineId::alloc();
        self.pools.compute_pipelines.write().insert(
            id,
            PipelineState {
                device,
                pipeline: pipelines[0],
                layout: pipeline_layout,
                bind_point: vk::PipelineBindPoint::COMPUTE,
            },
        );
        Ok(id)
    }

    pub(crate) fn destroy_compute_pipeline_impl(&self, pipeline: ComputePipelineId) {
        let Some(state) = self.pools.compute_pipelines.write().remove(&pipeline) else {
            return;
        };
        let devices = self.pools.devices.read();
        if let Some(device_state) = devices.get(&state.device) {
            unsafe {
                device_state.device.destroy_pipeline(state.pipeline, None);
                device_state.device.destroy_pipeline_layout(state.layout, None);
            }
        }
    }
}

fn sample_count_flags(count: u32) -> vk::SampleCountFlags {
    match count {
        1 => vk::SampleCountFlags::TYPE_1,
        2 => vk::SampleCountFlags::TYPE_2,
        4 => vk::SampleCountFlags::TYPE_4,
        8 => vk::SampleCountFlags::TYPE_8,
        16 => vk::SampleCountFlags::TYPE_16,
        _ => vk::SampleCountFlags::TYPE_1,
    }
}
