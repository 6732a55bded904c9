//! Render passes, framebuffers and graphics/compute pipelines (§4.2.2), the
//! implicit-backend counterpart of `lume_vulkan::pass`.
//!
//! `wgpu` has no native render-pass or framebuffer object: both collapse
//! into the `wgpu::RenderPassDescriptor` built fresh at `BeginRenderPass`
//! translation time (see `command.rs`). Their pool entries here are plain
//! descriptor data, kept only so handles stay valid and lookupable.

use crate::conv;
use crate::state::{BindGroupLayoutState, FramebufferState, PipelineState, RenderPassState, WebGpuBackend};
use lume_core::error::{LumeError, LumeResult};
use lume_core::ids::*;
use lume_core::types::*;

impl WebGpuBackend {
    pub(crate) fn create_render_pass_impl(
        &self,
        device: DeviceId,
        desc: &RenderPassDescriptor,
    ) -> LumeResult<RenderPassId> {
        self.pools.devices.read().get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;

        let id = RenderPassId::alloc();
        self.pools.render_passes.write().insert(
            id,
            RenderPassState {
                device,
                desc: desc.clone(),
            },
        );
        Ok(id)
    }

    pub(crate) fn destroy_render_pass_impl(&self, render_pass: RenderPassId) {
        self.pools.render_passes.write().remove(&render_pass);
    }

    pub(crate) fn create_framebuffer_impl(
        &self,
        device: DeviceId,
        desc: &FramebufferDescriptor,
    ) -> LumeResult<FramebufferId> {
        self.pools.devices.read().get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;
        self.pools
            .render_passes
            .read()
            .get(&desc.render_pass)
            .ok_or_else(|| LumeError::invalid("unknown render pass"))?;

        let views = self.pools.texture_views.read();
        for view_id in &desc.attachments {
            views.get(view_id).ok_or_else(|| LumeError::invalid("unknown texture view"))?;
        }
        for resolve in desc.resolve_attachments.iter().flatten() {
            views.get(resolve).ok_or_else(|| LumeError::invalid("unknown resolve view"))?;
        }

        let id = FramebufferId::alloc();
        self.pools.framebuffers.write().insert(
            id,
            FramebufferState {
                device,
                render_pass: desc.render_pass,
                attachments: desc.attachments.clone(),
                resolve_attachments: desc.resolve_attachments.clone(),
                extent: desc.extent,
            },
        );
        Ok(id)
    }

    pub(crate) fn destroy_framebuffer_impl(&self, framebuffer: FramebufferId) {
        self.pools.framebuffers.write().remove(&framebuffer);
    }

    pub(crate) fn create_render_pipeline_impl(
        &self,
        device: DeviceId,
        desc: &RenderPipelineDescriptor,
    ) -> LumeResult<RenderPipelineId> {
        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;
        self.pools
            .render_passes
            .read()
            .get(&desc.render_pass)
            .ok_or_else(|| LumeError::invalid("unknown render pass"))?;

        let layouts_pool = self.pools.bind_group_layouts.read();
        let layout_refs = bind_group_layout_refs(&layouts_pool, &desc.bind_group_layouts)?;
        let pipeline_layout = device_state
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: None,
                bind_group_layouts: &layout_refs,
                push_constant_ranges: &[],
            });

        let shaders = self.pools.shaders.read();
        let vertex_shader = shaders
            .get(&desc.vertex.shader)
            .ok_or_else(|| LumeError::invalid("unknown vertex shader"))?;

        let mut buffer_layouts = Vec::with_capacity(desc.vertex.buffers.len());
        let mut attribute_storage: Vec<Vec<wgpu::VertexAttribute>> = Vec::with_capacity(desc.vertex.buffers.len());
        for buffer in &desc.vertex.buffers {
            attribute_storage.push(
                buffer
                    .attributes
                    .iter()
                    .map(|attr| wgpu::VertexAttribute {
                        format: conv::vertex_format(attr.format),
                        offset: attr.offset,
                        shader_location: attr.shader_location,
                    })
                    .collect(),
            );
        }
        for (buffer, attrs) in desc.vertex.buffers.iter().zip(&attribute_storage) {
            buffer_layouts.push(wgpu::VertexBufferLayout {
                array_stride: buffer.stride,
                step_mode: match buffer.step_mode {
                    VertexStepMode::Vertex => wgpu::VertexStepMode::Vertex,
                    VertexStepMode::Instance => wgpu::VertexStepMode::Instance,
                },
                attributes: attrs,
            });
        }

        let fragment_shader = desc
            .fragment
            .as_ref()
            .map(|fragment| {
                shaders
                    .get(&fragment.shader)
                    .ok_or_else(|| LumeError::invalid("unknown fragment shader"))
            })
            .transpose()?;
        let targets: Vec<Option<wgpu::ColorTargetState>> = desc
            .fragment
            .as_ref()
            .map(|fragment| {
                fragment
                    .targets
                    .iter()
                    .map(|target| {
                        let mut mask = wgpu::ColorWrites::empty();
                        if target.write_mask.contains(ColorWriteMask::RED) {
                            mask |= wgpu::ColorWrites::RED;
                        }
                        if target.write_mask.contains(ColorWriteMask::GREEN) {
                            mask |= wgpu::ColorWrites::GREEN;
                        }
                        if target.write_mask.contains(ColorWriteMask::BLUE) {
                            mask |= wgpu::ColorWrites::BLUE;
                        }
                        if target.write_mask.contains(ColorWriteMask::ALPHA) {
                            mask |= wgpu::ColorWrites::ALPHA;
                        }
                        Some(wgpu::ColorTargetState {
                            format: conv::texture_format(target.format),
                            blend: target.blend_enabled.then_some(wgpu::BlendState::ALPHA_BLENDING),
                            write_mask: mask,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let depth_stencil = desc.depth_stencil.map(|ds| wgpu::DepthStencilState {
            format: conv::texture_format(ds.format),
            depth_write_enabled: ds.depth_write_enabled,
            depth_compare: conv::compare_function(ds.depth_compare),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });

        let pipeline = device_state.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: None,
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_shader.module,
                entry_point: &desc.vertex.entry_point,
                buffers: &buffer_layouts,
            },
            primitive: wgpu::PrimitiveState {
                topology: conv::primitive_topology(desc.primitive.topology),
                strip_index_format: None,
                front_face: conv::front_face(desc.primitive.front_face),
                cull_mode: match desc.primitive.cull_mode {
                    CullMode::None => None,
                    CullMode::Front => Some(wgpu::Face::Front),
                    CullMode::Back => Some(wgpu::Face::Back),
                },
                unclipped_depth: false,
                polygon_mode: match desc.primitive.polygon_mode {
                    PolygonMode::Fill => wgpu::PolygonMode::Fill,
                    PolygonMode::Line => wgpu::PolygonMode::Line,
                    PolygonMode::Point => wgpu::PolygonMode::Point,
                },
                conservative: false,
            },
            depth_stencil,
            multisample: wgpu::MultisampleState {
                count: desc.sample_count.max(1),
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: fragment_shader.map(|shader| wgpu::FragmentState {
                module: &shader.module,
                entry_point: desc.fragment.as_ref().unwrap().entry_point.as_str(),
                targets: &targets,
            }),
            multiview: None,
        });

        let id = RenderPipelineId::alloc();
        self.pools
            .render_pipelines
            .write()
            .insert(id, PipelineState::Render { pipeline, device });
        Ok(id)
    }

    pub(crate) fn destroy_render_pipeline_impl(&self, pipeline: RenderPipelineId) {
        self.pools.render_pipelines.write().remove(&pipeline);
    }

    pub(crate) fn create_compute_pipeline_impl(
        &self,
        device: DeviceId,
        desc: &ComputePipelineDescriptor,
    ) -> LumeResult<ComputePipelineId> {
        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;
        let layouts_pool = self.pools.bind_group_layouts.read();
        let layout_refs = bind_group_layout_refs(&layouts_pool, &desc.bind_group_layouts)?;
        let pipeline_layout = device_state
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: None,
                bind_group_layouts: &layout_refs,
                push_constant_ranges: &[],
            });

        let shaders = self.pools.shaders.read();
        let shader = shaders.get(&desc.shader).ok_or_else(|| LumeError::invalid("unknown shader"))?;

        let pipeline = device_state.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: None,
            layout: Some(&pipeline_layout),
            module: &shader.module,
            entry_point: &desc.entry_point,
        });

        let id = ComputePipelineId::alloc();
        self.pools
            .compute_pipelines
            .write()
            .insert(id, PipelineState::Compute { pipeline, device });
        Ok(id)
    }

    pub(crate) fn destroy_compute_pipeline_impl(&self, pipeline: ComputePipelineId) {
        self.pools.compute_pipelines.write().remove(&pipeline);
    }
}

fn bind_group_layout_refs<'a>(
    pool: &'a std::collections::HashMap<BindGroupLayoutId, BindGroupLayoutState>,
    ids: &[BindGroupLayoutId],
) -> LumeResult<Vec<&'a wgpu::BindGroupLayout>> {
    let mut refs = Vec::with_capacity(ids.len());
    for id in ids {
        refs.push(
            &pool
                .get(id)
                .ok_or_else(|| LumeError::invalid("unknown bind group layout"))?
                .layout,
        );
    }
    Ok(refs)
}
