//! Buffers, textures, samplers, shaders, bind groups and query sets
//! (§4.2.3), the implicit-backend counterpart of `lume_vulkan::resource`.
//! `wgpu` owns allocation itself, so there is no `gpu_allocator` layer here.

use crate::conv;
use crate::state::{
    BindGroupLayoutState, BindGroupState, BufferState, QuerySetState, SamplerState, ShaderState,
    TextureState, TextureViewState, WebGpuBackend,
};
use lume_core::error::{LumeError, LumeResult};
use lume_core::ids::*;
use lume_core::types::*;
use parking_lot::Mutex;
use std::num::NonZeroU64;
use std::sync::mpsc;

impl WebGpuBackend {
    pub(crate) fn create_buffer_impl(&self, device: DeviceId, desc: &BufferDescriptor) -> LumeResult<BufferId> {
        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;

        let mut usage = wgpu::BufferUsages::empty();
        if desc.usage.contains(BufferUsage::VERTEX) {
            usage |= wgpu::BufferUsages::VERTEX;
        }
        if desc.usage.contains(BufferUsage::INDEX) {
            usage |= wgpu::BufferUsages::INDEX;
        }
        if desc.usage.contains(BufferUsage::UNIFORM) {
            usage |= wgpu::BufferUsages::UNIFORM;
        }
        if desc.usage.contains(BufferUsage::STORAGE) {
            usage |= wgpu::BufferUsages::STORAGE;
        }
        if desc.usage.contains(BufferUsage::INDIRECT) {
            usage |= wgpu::BufferUsages::INDIRECT;
        }
        if desc.usage.contains(BufferUsage::COPY_SRC) {
            usage |= wgpu::BufferUsages::COPY_SRC;
        }
        if desc.usage.contains(BufferUsage::COPY_DST) {
            usage |= wgpu::BufferUsages::COPY_DST;
        }
        if desc.usage.contains(BufferUsage::MAP_READ) {
            usage |= wgpu::BufferUsages::MAP_READ;
        }
        if desc.usage.contains(BufferUsage::MAP_WRITE) {
            usage |= wgpu::BufferUsages::MAP_WRITE;
        }

        let buffer = device_state.device.create_buffer(&wgpu::BufferDescriptor {
            label: None,
            size: desc.size.max(1),
            usage,
            mapped_at_creation: desc.mapped_at_creation,
        });

        let id = BufferId::alloc();
        self.pools.buffers.write().insert(
            id,
            BufferState {
                device,
                buffer,
                size: desc.size,
                usage: desc.usage,
                mapped: Mutex::new(None),
            },
        );
        Ok(id)
    }

    pub(crate) fn destroy_buffer_impl(&self, buffer: BufferId) {
        let Some(state) = self.pools.buffers.write().remove(&buffer) else {
            return;
        };
        state.buffer.destroy();
    }

    pub(crate) fn buffer_info_impl(&self, buffer: BufferId) -> LumeResult<BufferInfo> {
        let buffers = self.pools.buffers.read();
        let state = buffers.get(&buffer).ok_or_else(|| LumeError::invalid("unknown buffer"))?;
        Ok(BufferInfo {
            size: state.size,
            usage: state.usage,
        })
    }

    pub(crate) fn buffer_map_async_impl(
        &self,
        buffer: BufferId,
        mode: MapMode,
        offset: u64,
        size: u64,
    ) -> LumeResult<*mut u8> {
        let buffers = self.pools.buffers.read();
        let state = buffers.get(&buffer).ok_or_else(|| LumeError::invalid("unknown buffer"))?;

        let mut shadow = vec![0u8; size as usize];
        if mode == MapMode::Read {
            let devices = self.pools.devices.read();
            let device_state = devices
                .get(&state.device)
                .ok_or_else(|| LumeError::invalid("owning device was destroyed"))?;

            let slice = state.buffer.slice(offset..offset + size);
            let (tx, rx) = mpsc::channel();
            slice.map_async(wgpu::MapMode::Read, move |result| {
                let _ = tx.send(result);
            });
            loop {
                device_state.device.poll(wgpu::Maintain::Wait);
                if let Ok(result) = rx.try_recv() {
                    result.map_err(|e| LumeError::unknown(format!("buffer map failed: {e}")))?;
                    break;
                }
            }
            shadow.copy_from_slice(&slice.get_mapped_range());
            state.buffer.unmap();
        }

        let ptr = shadow.as_mut_ptr();
        *state.mapped.lock() = Some((mode, offset, shadow));
        Ok(ptr)
    }

    pub(crate) fn buffer_unmap_impl(&self, buffer: BufferId) -> LumeResult<()> {
        let buffers = self.pools.buffers.read();
        let state = buffers.get(&buffer).ok_or_else(|| LumeError::invalid("unknown buffer"))?;
        let Some((mode, offset, shadow)) = state.mapped.lock().take() else {
            return Ok(());
        };
        if mode == MapMode::Write {
            let devices = self.pools.devices.read();
            let device_state = devices
                .get(&state.device)
                .ok_or_else(|| LumeError::invalid("owning device was destroyed"))?;
            device_state.queue.write_buffer(&state.buffer, offset, &shadow);
        }
        Ok(())
    }

    pub(crate) fn create_texture_impl(&self, device: DeviceId, desc: &TextureDescriptor) -> LumeResult<TextureId> {
        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;

        let dimension = match desc.texture_type {
            TextureType::D1 => wgpu::TextureDimension::D1,
            TextureType::D2 | TextureType::Cube => wgpu::TextureDimension::D2,
            TextureType::D3 => wgpu::TextureDimension::D3,
        };
        let depth_or_array_layers = if desc.texture_type == TextureType::D3 {
            desc.extent.depth
        } else {
            desc.array_layer_count
        };

        let mut usage = wgpu::TextureUsages::empty();
        if desc.usage.contains(TextureUsage::COPY_SRC) {
            usage |= wgpu::TextureUsages::COPY_SRC;
        }
        if desc.usage.contains(TextureUsage::COPY_DST) {
            usage |= wgpu::TextureUsages::COPY_DST;
        }
        if desc.usage.contains(TextureUsage::TEXTURE_BINDING) {
            usage |= wgpu::TextureUsages::TEXTURE_BINDING;
        }
        if desc.usage.contains(TextureUsage::STORAGE_BINDING) {
            usage |= wgpu::TextureUsages::STORAGE_BINDING;
        }
        if desc.usage.contains(TextureUsage::COLOR_ATTACHMENT)
            || desc.usage.contains(TextureUsage::DEPTH_STENCIL_ATTACHMENT)
        {
            usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }

        let texture = device_state.device.create_texture(&wgpu::TextureDescriptor {
            label: None,
            size: wgpu::Extent3d {
                width: desc.extent.width,
                height: desc.extent.height,
                depth_or_array_layers,
            },
            mip_level_count: desc.mip_level_count,
            sample_count: desc.sample_count,
            dimension,
            format: conv::texture_format(desc.format),
            usage,
            view_formats: &[],
        });

        let id = TextureId::alloc();
        self.pools.textures.write().insert(
            id,
            TextureState {
                device,
                texture,
                format: desc.format,
                extent: desc.extent,
                mip_level_count: desc.mip_level_count,
                array_layer_count: desc.array_layer_count,
                current_layout: Mutex::new(TextureLayout::Undefined),
                borrowed: false,
            },
        );
        Ok(id)
    }

    pub(crate) fn destroy_texture_impl(&self, texture: TextureId) {
        let Some(state) = self.pools.textures.write().remove(&texture) else {
            return;
        };
        if state.borrowed {
            return;
        }
        state.texture.destroy();
    }

    pub(crate) fn texture_layout_impl(&self, texture: TextureId) -> LumeResult<TextureLayout> {
        let textures = self.pools.textures.read();
        let state = textures.get(&texture).ok_or_else(|| LumeError::invalid("unknown texture"))?;
        Ok(*state.current_layout.lock())
    }

    pub(crate) fn create_texture_view_impl(
        &self,
        texture: TextureId,
        desc: &TextureViewDescriptor,
    ) -> LumeResult<TextureViewId> {
        let textures = self.pools.textures.read();
        let texture_state = textures.get(&texture).ok_or_else(|| LumeError::invalid("unknown texture"))?;

        if desc.base_mip_level + desc.mip_level_count > texture_state.mip_level_count {
            return Err(LumeError::invalid(
                "texture view mip range exceeds the texture's mip level count",
            ));
        }
        if desc.base_array_layer + desc.array_layer_count > texture_state.array_layer_count {
            return Err(LumeError::invalid(
                "texture view array layer range exceeds the texture's array layer count",
            ));
        }

        let view = texture_state.texture.create_view(&wgpu::TextureViewDescriptor {
            label: None,
            format: Some(conv::texture_format(desc.format)),
            dimension: Some(conv::texture_view_dimension(desc.view_type)),
            aspect: wgpu::TextureAspect::All,
            base_mip_level: desc.base_mip_level,
            mip_level_count: Some(desc.mip_level_count),
            base_array_layer: desc.base_array_layer,
            array_layer_count: Some(desc.array_layer_count),
        });

        let id = TextureViewId::alloc();
        self.pools.texture_views.write().insert(
            id,
            TextureViewState {
                texture,
                device: texture_state.device,
                view,
            },
        );
        Ok(id)
    }

    pub(crate) fn destroy_texture_view_impl(&self, view: TextureViewId) {
        self.pools.texture_views.write().remove(&view);
    }

    pub(crate) fn create_sampler_impl(&self, device: DeviceId, desc: &SamplerDescriptor) -> LumeResult<SamplerId> {
        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;

        let sampler = device_state.device.create_sampler(&wgpu::SamplerDescriptor {
            label: None,
            address_mode_u: conv::address_mode(desc.address_mode_u),
            address_mode_v: conv::address_mode(desc.address_mode_v),
            address_mode_w: conv::address_mode(desc.address_mode_w),
            mag_filter: conv::filter(desc.mag_filter),
            min_filter: conv::filter(desc.min_filter),
            mipmap_filter: conv::filter(desc.mipmap_filter),
            lod_min_clamp: desc.lod_min_clamp,
            lod_max_clamp: desc.lod_max_clamp,
            compare: desc.compare.map(conv::compare_function),
            anisotropy_clamp: desc.max_anisotropy.max(1),
            border_color: None,
        });

        let id = SamplerId::alloc();
        self.pools.samplers.write().insert(id, SamplerState { device, sampler });
        Ok(id)
    }

    pub(crate) fn destroy_sampler_impl(&self, sampler: SamplerId) {
        self.pools.samplers.write().remove(&sampler);
    }

    pub(crate) fn create_shader_impl(&self, device: DeviceId, desc: &ShaderDescriptor) -> LumeResult<ShaderId> {
        if desc.source_type != ShaderSourceType::Wgsl {
            return Err(LumeError::FeatureNotSupported(
                "the implicit backend consumes WGSL source only".into(),
            ));
        }

        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;

        let source = std::str::from_utf8(&desc.bytes)
            .map_err(|_| LumeError::invalid("WGSL shader source is not valid UTF-8"))?;

        let module = device_state.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: None,
            source: wgpu::ShaderSource::Wgsl(source.to_string().into()),
        });

        let id = ShaderId::alloc();
        self.pools.shaders.write().insert(
            id,
            ShaderState {
                device,
                module,
                stage: desc.stage,
                entry_point: desc.entry_point.clone(),
            },
        );
        Ok(id)
    }

    pub(crate) fn destroy_shader_impl(&self, shader: ShaderId) {
        self.pools.shaders.write().remove(&shader);
    }

    pub(crate) fn create_bind_group_layout_impl(
        &self,
        device: DeviceId,
        desc: &BindGroupLayoutDescriptor,
    ) -> LumeResult<BindGroupLayoutId> {
        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;

        let entries: Vec<wgpu::BindGroupLayoutEntry> = desc
            .entries
            .iter()
            .map(|entry| {
                let mut visibility = wgpu::ShaderStages::empty();
                if entry.visibility.contains(ShaderStage::VERTEX) {
                    visibility |= wgpu::ShaderStages::VERTEX;
                }
                if entry.visibility.contains(ShaderStage::FRAGMENT) {
                    visibility |= wgpu::ShaderStages::FRAGMENT;
                }
                if entry.visibility.contains(ShaderStage::COMPUTE) {
                    visibility |= wgpu::ShaderStages::COMPUTE;
                }
                let ty = match entry.resource {
                    BufferBindingLayout::Buffer {
                        has_dynamic_offset,
                        min_binding_size,
                    } => wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset,
                        min_binding_size: NonZeroU64::new(min_binding_size),
                    },
                    BufferBindingLayout::Sampler { comparison } => wgpu::BindingType::Sampler(if comparison {
                        wgpu::SamplerBindingType::Comparison
                    } else {
                        wgpu::SamplerBindingType::Filtering
                    }),
                    BufferBindingLayout::Texture {
                        multisampled,
                        view_dimension,
                    } => wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: conv::texture_view_dimension(view_dimension),
                        multisampled,
                    },
                    BufferBindingLayout::StorageTexture {
                        format,
                        write_only,
                        view_dimension,
                    } => wgpu::BindingType::StorageTexture {
                        access: if write_only {
                            wgpu::StorageTextureAccess::WriteOnly
                        } else {
                            wgpu::StorageTextureAccess::ReadWrite
                        },
                        format: conv::texture_format(format),
                        view_dimension: conv::texture_view_dimension(view_dimension),
                    },
                };
                wgpu::BindGroupLayoutEntry {
                    binding: entry.binding,
                    visibility,
                    ty,
                    count: None,
                }
            })
            .collect();

        let layout = device_state
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor { label: None, entries: &entries });

        let id = BindGroupLayoutId::alloc();
        self.pools.bind_group_layouts.write().insert(
            id,
            BindGroupLayoutState {
                device,
                layout,
                entries: desc.entries.clone(),
            },
        );
        Ok(id)
    }

    pub(crate) fn destroy_bind_group_layout_impl(&self, layout: BindGroupLayoutId) {
        self.pools.bind_group_layouts.write().remove(&layout);
    }

    pub(crate) fn create_bind_group_impl(
        &self,
        device: DeviceId,
        desc: &BindGroupDescriptor,
    ) -> LumeResult<BindGroupId> {
        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;
        let layouts = self.pools.bind_group_layouts.read();
        let layout_state = layouts
            .get(&desc.layout)
            .ok_or_else(|| LumeError::invalid("unknown bind group layout"))?;

        let buffers = self.pools.buffers.read();
        let views = self.pools.texture_views.read();
        let samplers = self.pools.samplers.read();

        let mut entries = Vec::with_capacity(desc.entries.len());
        for entry in &desc.entries {
            let resource = match &entry.resource {
                BindGroupResource::Buffer { buffer, offset, size } => {
                    let buf = buffers.get(buffer).ok_or_else(|| LumeError::invalid("unknown buffer"))?;
                    wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &buf.buffer,
                        offset: *offset,
                        size: NonZeroU64::new(*size),
                    })
                }
                BindGroupResource::TextureView(view) => {
                    let view_state = views.get(view).ok_or_else(|| LumeError::invalid("unknown texture view"))?;
                    wgpu::BindingResource::TextureView(&view_state.view)
                }
                BindGroupResource::Sampler(sampler) => {
                    let sampler_state = samplers
                        .get(sampler)
                        .ok_or_else(|| LumeError::invalid("unknown sampler"))?;
                    wgpu::BindingResource::Sampler(&sampler_state.sampler)
                }
            };
            entries.push(wgpu::BindGroupEntry {
                binding: entry.binding,
                resource,
            });
        }

        let bind_group = device_state.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: &layout_state.layout,
            entries: &entries,
        });

        let id = BindGroupId::alloc();
        self.pools.bind_groups.write().insert(
            id,
            BindGroupState {
                device,
                bind_group,
                layout: desc.layout,
            },
        );
        Ok(id)
    }

    pub(crate) fn destroy_bind_group_impl(&self, bind_group: BindGroupId) {
        self.pools.bind_groups.write().remove(&bind_group);
    }

    pub(crate) fn create_query_set_impl(&self, device: DeviceId, desc: &QuerySetDescriptor) -> LumeResult<QuerySetId> {
        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;

        let ty = match desc.query_type {
            QueryType::Occlusion => wgpu::QueryType::Occlusion,
            QueryType::Timestamp => wgpu::QueryType::Timestamp,
        };
        let query_set = device_state.device.create_query_set(&wgpu::QuerySetDescriptor {
            label: None,
            ty,
            count: desc.count,
        });

        let id = QuerySetId::alloc();
        self.pools.query_sets.write().insert(
            id,
            QuerySetState {
                device,
                query_set,
                query_type: desc.query_type,
                count: desc.count,
            },
        );
        Ok(id)
    }

    pub(crate) fn destroy_query_set_impl(&self, query_set: QuerySetId) {
        self.pools.query_sets.write().remove(&query_set);
    }

    pub(crate) fn queue_write_buffer_impl(
        &self,
        queue: QueueId,
        buffer: BufferId,
        offset: u64,
        bytes: &[u8],
    ) -> LumeResult<()> {
        let queues = self.pools.queues.read();
        let queue_state = queues.get(&queue).ok_or_else(|| LumeError::invalid("unknown queue"))?;
        let buffers = self.pools.buffers.read();
        let state = buffers.get(&buffer).ok_or_else(|| LumeError::invalid("unknown buffer"))?;
        let devices = self.pools.devices.read();
        let device_state = devices
            .get(&queue_state.device)
            .ok_or_else(|| LumeError::invalid("owning device was destroyed"))?;
        device_state.queue.write_buffer(&state.buffer, offset, bytes);
        Ok(())
    }

    pub(crate) fn queue_write_texture_impl(
        &self,
        queue: QueueId,
        texture: TextureId,
        mip_level: u32,
        origin: (u32, u32, u32),
        bytes: &[u8],
        bytes_per_row: u32,
        extent: Extent3d,
    ) -> LumeResult<()> {
        let queues = self.pools.queues.read();
        let queue_state = queues.get(&queue).ok_or_else(|| LumeError::invalid("unknown queue"))?;
        let textures = self.pools.textures.read();
        let texture_state = textures.get(&texture).ok_or_else(|| LumeError::invalid("unknown texture"))?;
        let devices = self.pools.devices.read();
        let device_state = devices
            .get(&queue_state.device)
            .ok_or_else(|| LumeError::invalid("owning device was destroyed"))?;

        device_state.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture_state.texture,
                mip_level,
                origin: wgpu::Origin3d {
                    x: origin.0,
                    y: origin.1,
                    z: origin.2,
                },
                aspect: wgpu::TextureAspect::All,
            },
            bytes,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(extent.height),
            },
            wgpu::Extent3d {
                width: extent.width,
                height: extent.height,
                depth_or_array_layers: extent.depth,
            },
        );
        Ok(())
    }
}
