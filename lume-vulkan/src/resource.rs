//! Buffers, textures, samplers, shaders, bind groups and query sets
//! (§4.2.3). Allocation is delegated to `gpu_allocator`, kept from the
//! teacher's `device/resource.rs` (`create_buffer_impl`/`create_texture_impl`
//! naming and the per-resource `Allocation` stored alongside the native
//! handle).

use crate::conv;
use crate::state::{
    BindGroupLayoutState, BindGroupState, BufferState, SamplerState, ShaderState, TextureState,
    TextureViewState, VulkanBackend,
};
use ash::vk;
use gpu_allocator::vulkan::{AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use lume_core::error::{LumeError, LumeResult};
use lume_core::ids::*;
use lume_core::types::*;

impl VulkanBackend {
    pub(crate) fn create_buffer_impl(
        &self,
        device: DeviceId,
        desc: &BufferDescriptor,
    ) -> LumeResult<BufferId> {
        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;

        let mut usage = vk::BufferUsageFlags::empty();
        if desc.usage.contains(BufferUsage::VERTEX) {
            usage |= vk::BufferUsageFlags::VERTEX_BUFFER;
        }
        if desc.usage.contains(BufferUsage::INDEX) {
            usage |= vk::BufferUsageFlags::INDEX_BUFFER;
        }
        if desc.usage.contains(BufferUsage::UNIFORM) {
            usage |= vk::BufferUsageFlags::UNIFORM_BUFFER;
        }
        if desc.usage.contains(BufferUsage::STORAGE) {
            usage |= vk::BufferUsageFlags::STORAGE_BUFFER;
        }
        if desc.usage.contains(BufferUsage::INDIRECT) {
            usage |= vk::BufferUsageFlags::INDIRECT_BUFFER;
        }
        if desc.usage.contains(BufferUsage::COPY_SRC) {
            usage |= vk::BufferUsageFlags::TRANSFER_SRC;
        }
        if desc.usage.contains(BufferUsage::COPY_DST) {
            usage |= vk::BufferUsageFlags::TRANSFER_DST;
        }

        let buffer = unsafe {
            device_state
                .device
                .create_buffer(
                    &vk::BufferCreateInfo::default().size(desc.size.max(1)).usage(usage),
                    None,
                )
                .map_err(|e| LumeError::unknown(format!("vkCreateBuffer failed: {e}")))?
        };
        let requirements = unsafe { device_state.device.get_buffer_memory_requirements(buffer) };

        let location = if desc.usage.contains(BufferUsage::MAP_READ) {
            MemoryLocation::GpuToCpu
        } else if desc.usage.contains(BufferUsage::MAP_WRITE) || desc.mapped_at_creation {
            MemoryLocation::CpuToGpu
        } else {
            MemoryLocation::GpuOnly
        };

        let allocation = device_state
            .allocator
            .lock()
            .allocate(&AllocationCreateDesc {
                name: "lume_buffer",
                requirements,
                location,
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| {
                log::error!("buffer allocation failed: {e}");
                LumeError::OutOfMemory
            })?;

        unsafe {
            device_state
                .device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
                .map_err(|e| LumeError::unknown(format!("vkBindBufferMemory failed: {e}")))?;
        }

        let id = BufferId::alloc();
        self.pools.buffers.write().insert(
            id,
            BufferState {
                device,
                buffer,
                allocation: Some(allocation),
                size: desc.size,
                usage: desc.usage,
            },
        );
        Ok(id)
    }

    pub(crate) fn destroy_buffer_impl(&self, buffer: BufferId) {
        let Some(state) = self.pools.buffers.write().remove(&buffer) else {
            return;
        };
        let devices = self.pools.devices.read();
        if let Some(device_state) = devices.get(&state.device) {
            unsafe {
                device_state.device.destroy_buffer(state.buffer, None);
            }
            if let Some(allocation) = state.allocation {
                let _ = device_state.allocator.lock().free(allocation);
            }
        }
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
        _mode: MapMode,
        offset: u64,
        _size: u64,
    ) -> LumeResult<*mut u8> {
        let buffers = self.pools.buffers.read();
        let state = buffers.get(&buffer).ok_or_else(|| LumeError::invalid("unknown buffer"))?;
        let allocation = state
            .allocation
            .as_ref()
            .ok_or_else(|| LumeError::invalid("buffer has no host-visible allocation"))?;
        let mapped = allocation
            .mapped_ptr()
            .ok_or_else(|| LumeError::invalid("buffer memory is not host-visible"))?;
        Ok(unsafe { mapped.as_ptr().cast::<u8>().add(offset as usize) })
    }

    pub(crate) fn buffer_unmap_impl(&self, _buffer: BufferId) -> LumeResult<()> {
        // gpu-allocator keeps host-visible allocations persistently mapped;
        // there is no native unmap call to issue here.
        Ok(())
    }

    pub(crate) fn create_texture_impl(
        &self,
        device: DeviceId,
        desc: &TextureDescriptor,
    ) -> LumeResult<TextureId> {
        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;

        let image_type = match desc.texture_type {
            TextureType::D1 => vk::ImageType::TYPE_1D,
            TextureType::D2 | TextureType::Cube => vk::ImageType::TYPE_2D,
            TextureType::D3 => vk::ImageType::TYPE_3D,
        };
        let flags = if desc.texture_type == TextureType::Cube {
            vk::ImageCreateFlags::CUBE_COMPATIBLE
        } else {
            vk::ImageCreateFlags::empty()
        };

        let image = unsafe {
            device_state
                .device
                .create_image(
                    &vk::ImageCreateInfo::default()
                        .flags(flags)
                        .image_type(image_type)
                        .format(conv::texture_format(desc.format))
                        .extent(vk::Extent3D {
                            width: desc.extent.width,
                            height: desc.extent.height,
                            depth: desc.extent.depth,
                        })
                        .mip_levels(desc.mip_level_count)
                        .array_layers(desc.array_layer_count)
                        .samples(sample_count_flags(desc.sample_count))
                        .tiling(vk::ImageTiling::OPTIMAL)
                        .usage(conv::image_usage(desc.usage))
                        .sharing_mode(vk::SharingMode::EXCLUSIVE)
                        .initial_layout(vk::ImageLayout::UNDEFINED),
                    None,
                )
                .map_err(|e| LumeError::unknown(format!("vkCreateImage failed: {e}")))?
        };
        let requirements = unsafe { device_state.device.get_image_memory_requirements(image) };
        let allocation = device_state
            .allocator
            .lock()
            .allocate(&AllocationCreateDesc {
                name: "lume_texture",
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| {
                log::error!("texture allocation failed: {e}");
                LumeError::OutOfMemory
            })?;
        unsafe {
            device_state
                .device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
                .map_err(|e| LumeError::unknown(format!("vkBindImageMemory failed: {e}")))?;
        }

        let id = TextureId::alloc();
        self.pools.textures.write().insert(
            id,
            TextureState {
                device,
                image,
                allocation: Some(allocation),
                format: desc.format,
                extent: desc.extent,
                mip_level_count: desc.mip_level_count,
                array_layer_count: desc.array_layer_count,
                current_layout: parking_lot::Mutex::new(TextureLayout::Undefined),
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
        let devices = self.pools.devices.read();
        if let Some(device_state) = devices.get(&state.device) {
            unsafe {
                device_state.device.destroy_image(state.image, None);
            }
            if let Some(allocation) = state.allocation {
                let _ = device_state.allocator.lock().free(allocation);
            }
        }
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
        let devices = self.pools.devices.read();
        let device_state = devices
            .get(&texture_state.device)
            .ok_or_else(|| LumeError::invalid("owning device was destroyed"))?;

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

        let view_type = match desc.view_type {
            TextureViewType::D1 => vk::ImageViewType::TYPE_1D,
            TextureViewType::D2 => vk::ImageViewType::TYPE_2D,
            TextureViewType::D2Array => vk::ImageViewType::TYPE_2D_ARRAY,
            TextureViewType::D3 => vk::ImageViewType::TYPE_3D,
            TextureViewType::Cube => vk::ImageViewType::CUBE,
            TextureViewType::CubeArray => vk::ImageViewType::CUBE_ARRAY,
        };
        let mut aspect = vk::ImageAspectFlags::empty();
        if lume_core::format_has_depth(desc.format) {
            aspect |= vk::ImageAspectFlags::DEPTH;
        }
        if lume_core::format_has_stencil(desc.format) {
            aspect |= vk::ImageAspectFlags::STENCIL;
        }
        if aspect.is_empty() {
            aspect = vk::ImageAspectFlags::COLOR;
        }

        let view = unsafe {
            device_state
                .device
                .create_image_view(
                    &vk::ImageViewCreateInfo::default()
                        .image(texture_state.image)
                        .view_type(view_type)
                        .format(conv::texture_format(desc.format))
                        .subresource_range(vk::ImageSubresourceRange {
                            aspect_mask: aspect,
                            base_mip_level: desc.base_mip_level,
                            level_count: desc.mip_level_count,
                            base_array_layer: desc.base_array_layer,
                            layer_count: desc.array_layer_count,
                        }),
                    None,
                )
                .map_err(|e| LumeError::unknown(format!("vkCreateImageView failed: {e}")))?
        };

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
        let Some(state) = self.pools.texture_views.write().remove(&view) else {
            return;
        };
        let devices = self.pools.devices.read();
        if let Some(device_state) = devices.get(&state.device) {
            unsafe {
                device_state.device.destroy_image_view(state.view, None);
            }
        }
    }

    pub(crate) fn create_sampler_impl(
        &self,
        device: DeviceId,
        desc: &SamplerDescriptor,
    ) -> LumeResult<SamplerId> {
        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;

        let mut create_info = vk::SamplerCreateInfo::default()
            .min_filter(conv::filter(desc.min_filter))
            .mag_filter(conv::filter(desc.mag_filter))
            .mipmap_mode(match desc.mipmap_filter {
                FilterMode::Nearest => vk::SamplerMipmapMode::NEAREST,
                FilterMode::Linear => vk::SamplerMipmapMode::LINEAR,
            })
            .address_mode_u(conv::address_mode(desc.address_mode_u))
            .address_mode_v(conv::address_mode(desc.address_mode_v))
            .address_mode_w(conv::address_mode(desc.address_mode_w))
            .min_lod(desc.lod_min_clamp)
            .max_lod(desc.lod_max_clamp)
            .anisotropy_enable(desc.max_anisotropy > 1)
            .max_anisotropy(desc.max_anisotropy as f32);
        if let Some(compare) = desc.compare {
            create_info = create_info.compare_enable(true).compare_op(conv::compare_op(compare));
        }

        let sampler = unsafe {
            device_state
                .device
                .create_sampler(&create_info, None)
                .map_err(|e| LumeError::unknown(format!("vkCreateSampler failed: {e}")))?
        };

        let id = SamplerId::alloc();
        self.pools.samplers.write().insert(id, SamplerState { device, sampler });
        Ok(id)
    }

    pub(crate) fn destroy_sampler_impl(&self, sampler: SamplerId) {
        let Some(state) = self.pools.samplers.write().remove(&sampler) else {
            return;
        };
        let devices = self.pools.devices.read();
        if let Some(device_state) = devices.get(&state.device) {
            unsafe {
                device_state.device.destroy_sampler(state.sampler, None);
            }
        }
    }

    pub(crate) fn create_shader_impl(
        &self,
        device: DeviceId,
        desc: &ShaderDescriptor,
    ) -> LumeResult<ShaderId> {
        if desc.source_type != ShaderSourceType::Spirv {
            return Err(LumeError::invalid(
                "the explicit backend consumes SPIR-V byte blobs only",
            ));
        }
        if desc.bytes.len() % 4 != 0 {
            return Err(LumeError::invalid("SPIR-V byte length must be a multiple of 4"));
        }

        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;

        let words: Vec<u32> = desc
            .bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        let module = unsafe {
            device_state
                .device
                .create_shader_module(&vk::ShaderModuleCreateInfo::default().code(&words), None)
                .map_err(|e| LumeError::unknown(format!("vkCreateShaderModule failed: {e}")))?
        };

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
        let Some(state) = self.pools.shaders.write().remove(&shader) else {
            return;
        };
        let devices = self.pools.devices.read();
        if let Some(device_state) = devices.get(&state.device) {
            unsafe {
                device_state.device.destroy_shader_module(state.module, None);
            }
        }
    }

    pub(crate) fn create_bind_group_layout_impl(
        &self,
        device: DeviceId,
        desc: &BindGroupLayoutDescriptor,
    ) -> LumeResult<BindGroupLayoutId> {
        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;

        let mut stage_flags = Vec::with_capacity(desc.entries.len());
        let bindings: Vec<vk::DescriptorSetLayoutBinding> = desc
            .entries
            .iter()
            .map(|entry| {
                let mut flags = vk::ShaderStageFlags::empty();
                if entry.visibility.contains(ShaderStage::VERTEX) {
                    flags |= vk::ShaderStageFlags::VERTEX;
                }
                if entry.visibility.contains(ShaderStage::FRAGMENT) {
                    flags |= vk::ShaderStageFlags::FRAGMENT;
                }
                if entry.visibility.contains(ShaderStage::COMPUTE) {
                    flags |= vk::ShaderStageFlags::COMPUTE;
                }
                stage_flags.push(flags);
                let descriptor_type = match &entry.resource {
                    BufferBindingLayout::Buffer { .. } => vk::DescriptorType::STORAGE_BUFFER,
                    BufferBindingLayout::Sampler { .. } => vk::DescriptorType::SAMPLER,
                    BufferBindingLayout::Texture { .. } => vk::DescriptorType::SAMPLED_IMAGE,
                    BufferBindingLayout::StorageTexture { .. } => vk::DescriptorType::STORAGE_IMAGE,
                };
                vk::DescriptorSetLayoutBinding::default()
                    .binding(entry.binding)
                    .descriptor_type(descriptor_type)
                    .descriptor_count(1)
                    .stage_flags(flags)
            })
            .collect();

        let layout = unsafe {
            device_state
                .device
                .create_descriptor_set_layout(
                    &vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings),
                    None,
                )
                .map_err(|e| LumeError::unknown(format!("vkCreateDescriptorSetLayout failed: {e}")))?
        };

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
        let Some(state) = self.pools.bind_group_layouts.write().remove(&layout) else {
            return;
        };
        let devices = self.pools.devices.read();
        if let Some(device_state) = devices.get(&state.device) {
            unsafe {
                device_state.device.destroy_descriptor_set_layout(state.layout, None);
            }
        }
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

        let set_layouts = [layout_state.layout];
        let sets = unsafe {
            device_state
                .device
                .allocate_descriptor_sets(
                    &vk::DescriptorSetAllocateInfo::default()
                        .descriptor_pool(device_state.descriptor_pool)
                        .set_layouts(&set_layouts),
                )
                .map_err(|e| {
                    log::error!("descriptor set allocation failed: {e}");
                    LumeError::OutOfMemory
                })?
        };
        let set = sets[0];

        let buffers = self.pools.buffers.read();
        let views = self.pools.texture_views.read();
        let samplers = self.pools.samplers.read();

        let mut buffer_infos = Vec::new();
        let mut image_infos = Vec::new();
        for entry in &desc.entries {
            match &entry.resource {
                BindGroupResource::Buffer { buffer, offset, size } => {
                    let buf = buffers.get(buffer).ok_or_else(|| LumeError::invalid("unknown buffer"))?;
                    buffer_infos.push((
                        entry.binding,
                        vk::DescriptorBufferInfo {
                            buffer: buf.buffer,
                            offset: *offset,
                            range: *size,
                        },
                    ));
                }
                BindGroupResource::TextureView(view) => {
                    let view_state = views.get(view).ok_or_else(|| LumeError::invalid("unknown texture view"))?;
                    image_infos.push((
                        entry.binding,
                        vk::DescriptorImageInfo {
                            sampler: vk::Sampler::null(),
                            image_view: view_state.view,
                            image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                        },
                    ));
                }
                BindGroupResource::Sampler(sampler) => {
                    let sampler_state = samplers.get(sampler).ok_or_else(|| LumeError::invalid("unknown sampler"))?;
                    image_infos.push((
                        entry.binding,
                        vk::DescriptorImageInfo {
                            sampler: sampler_state.sampler,
                            image_view: vk::ImageView::null(),
                            image_layout: vk::ImageLayout::UNDEFINED,
                        },
                    ));
                }
            }
        }

        let mut writes = Vec::with_capacity(buffer_infos.len() + image_infos.len());
        for (binding, info) in &buffer_infos {
            writes.push(
                vk::WriteDescriptorSet::default()
                    .dst_set(set)
                    .dst_binding(*binding)
                    .descriptor_type(vk::DescriptorType::STORAGE_BUFFER)
                    .buffer_info(std::slice::from_ref(info)),
            );
        }
        for (binding, info) in &image_infos {
            writes.push(
                vk::WriteDescriptorSet::default()
                    .dst_set(set)
                    .dst_binding(*binding)
                    .descriptor_type(if info.sampler != vk::Sampler::null() {
                        vk::DescriptorType::SAMPLER
                    } else {
                        vk::DescriptorType::SAMPLED_IMAGE
                    })
                    .image_info(std::slice::from_ref(info)),
            );
        }
        unsafe {
            device_state.device.update_descriptor_sets(&writes, &[]);
        }

        let id = BindGroupId::alloc();
        self.pools.bind_groups.write().insert(
            id,
            BindGroupState {
                device,
                set,
                layout: desc.layout,
            },
        );
        Ok(id)
    }

    pub(crate) fn destroy_bind_group_impl(&self, bind_group: BindGroupId) {
        let Some(state) = self.pools.bind_groups.write().remove(&bind_group) else {
            return;
        };
        let devices = self.pools.devices.read();
        if let Some(device_state) = devices.get(&state.device) {
            unsafe {
                let _ = device_state
                    .device
                    .free_descriptor_sets(device_state.descriptor_pool, &[state.set]);
            }
        }
    }

    pub(crate) fn create_query_set_impl(
        &self,
        device: DeviceId,
        desc: &QuerySetDescriptor,
    ) -> LumeResult<QuerySetId> {
        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;

        let query_type = match desc.query_type {
            QueryType::Occlusion => vk::QueryType::OCCLUSION,
            QueryType::Timestamp => vk::QueryType::TIMESTAMP,
        };
        let pool = unsafe {
            device_state
                .device
                .create_query_pool(
                    &vk::QueryPoolCreateInfo::default()
                        .query_type(query_type)
                        .query_count(desc.count),
                    None,
                )
                .map_err(|e| LumeError::unknown(format!("vkCreateQueryPool failed: {e}")))?
        };

        let id = QuerySetId::alloc();
        self.pools.query_sets.write().insert(
            id,
            crate::state::QuerySetState {
                device,
                pool,
                query_type: desc.query_type,
            },
        );
        Ok(id)
    }

    pub(crate) fn destroy_query_set_impl(&self, query_set: QuerySetId) {
        let Some(state) = self.pools.query_sets.write().remove(&query_set) else {
            return;
        };
        let devices = self.pools.devices.read();
        if let Some(device_state) = devices.get(&state.device) {
            unsafe {
                device_state.device.destroy_query_pool(state.pool, None);
            }
        }
    }

    pub(crate) fn queue_write_buffer_impl(
        &self,
        queue: QueueId,
        buffer: BufferId,
        offset: u64,
        bytes: &[u8],
    ) -> LumeResult<()> {
        let _ = queue;
        let buffers = self.pools.buffers.read();
        let state = buffers.get(&buffer).ok_or_else(|| LumeError::invalid("unknown buffer"))?;
        let allocation = state
            .allocation
            .as_ref()
            .ok_or_else(|| LumeError::invalid("buffer has no backing allocation"))?;
        let mapped = allocation
            .mapped_ptr()
            .ok_or_else(|| LumeError::invalid("queue_write_buffer target is not host-visible; stage through a copy"))?;
        unsafe {
            std::ptr::copy_nonoverlapping(
                bytes.as_ptr(),
                mapped.as_ptr().cast::<u8>().add(offset as usize),
                bytes.len(),
            );
        }
        Ok(())
    }

    pub(crate) fn queue_write_texture_impl(
        &self,
        _queue: QueueId,
        texture: TextureId,
        _mip_level: u32,
        _origin: (u32, u32, u32),
        _bytes: &[u8],
        _bytes_per_row: u32,
        _extent: Extent3d,
    ) -> LumeResult<()> {
        let textures = self.pools.textures.read();
        textures
            .get(&texture)
            .ok_or_else(|| LumeError::invalid("unknown texture"))?;
        // Optimally-tiled images have no stable host-visible layout; a real
        // write goes through a staging buffer and a recorded
        // `CopyBufferToTexture`, which `CommandEncoder` already exposes.
        Err(LumeError::FeatureNotSupported(
            "queue_write_texture requires a staged copy; record CopyBufferToTexture instead".into(),
        ))
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
