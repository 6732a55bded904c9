//! Swapchain creation and the acquire/present cycle (§4.3).
//!
//! Each swapchain image is registered in the ordinary texture/texture-view
//! pools with `TextureState::borrowed = true` so `RenderPassEncoder`/
//! `Framebuffer` code paths treat a swapchain view exactly like any other
//! `TextureViewId` — the only special case is that `destroy_texture_impl`
//! skips the native destroy for borrowed images (§4.3, I6).

use crate::state::{SwapchainState, TextureState, TextureViewState, VulkanBackend};
use ash::vk;
use lume_core::error::{LumeError, LumeResult};
use lume_core::ids::*;
use lume_core::types::*;
use parking_lot::Mutex;

fn texture_format_from_vk(fmt: vk::Format) -> TextureFormat {
    match fmt {
        vk::Format::B8G8R8A8_SRGB => TextureFormat::B8G8R8A8UnormSrgb,
        vk::Format::R8G8B8A8_UNORM => TextureFormat::R8G8B8A8Unorm,
        vk::Format::R8G8B8A8_SRGB => TextureFormat::R8G8B8A8UnormSrgb,
        _ => TextureFormat::B8G8R8A8Unorm,
    }
}

impl VulkanBackend {
    pub(crate) fn create_swapchain_impl(
        &self,
        device: DeviceId,
        surface: SurfaceId,
        request: &SwapchainRequest,
    ) -> LumeResult<(SwapchainId, SwapchainInfo)> {
        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;
        let adapters = self.pools.adapters.read();
        let adapter_state = adapters
            .get(&device_state.adapter)
            .ok_or_else(|| LumeError::invalid("owning adapter was destroyed"))?;
        let instances = self.pools.instances.read();
        let instance_state = instances
            .get(&adapter_state.instance)
            .ok_or_else(|| LumeError::invalid("owning instance was destroyed"))?;
        let surfaces = self.pools.surfaces.read();
        let surface_state = surfaces.get(&surface).ok_or_else(|| LumeError::invalid("unknown surface"))?;

        let capabilities = unsafe {
            instance_state
                .surface_loader
                .get_physical_device_surface_capabilities(adapter_state.physical_device, surface_state.surface)
                .map_err(|e| LumeError::unknown(format!("vkGetPhysicalDeviceSurfaceCapabilitiesKHR failed: {e}")))?
        };
        let formats = unsafe {
            instance_state
                .surface_loader
                .get_physical_device_surface_formats(adapter_state.physical_device, surface_state.surface)
                .map_err(|e| LumeError::unknown(format!("vkGetPhysicalDeviceSurfaceFormatsKHR failed: {e}")))?
        };
        let present_modes = unsafe {
            instance_state
                .surface_loader
                .get_physical_device_surface_present_modes(adapter_state.physical_device, surface_state.surface)
                .map_err(|e| LumeError::unknown(format!("vkGetPhysicalDeviceSurfacePresentModesKHR failed: {e}")))?
        };

        let requested_format = crate::conv::texture_format(request.format);
        let surface_format = formats
            .iter()
            .find(|f| f.format == requested_format)
            .copied()
            .unwrap_or(formats[0]);

        let requested_present_mode = crate::conv::present_mode(request.present_mode);
        let present_mode = present_modes
            .iter()
            .copied()
            .find(|&m| m == requested_present_mode)
            .unwrap_or(vk::PresentModeKHR::FIFO);

        let extent = if capabilities.current_extent.width != u32::MAX {
            capabilities.current_extent
        } else {
            vk::Extent2D {
                width: request
                    .width
                    .clamp(capabilities.min_image_extent.width, capabilities.max_image_extent.width),
                height: request
                    .height
                    .clamp(capabilities.min_image_extent.height, capabilities.max_image_extent.height),
            }
        };

        let mut image_count = request.min_image_count.max(capabilities.min_image_count);
        if capabilities.max_image_count > 0 {
            image_count = image_count.min(capabilities.max_image_count);
        }

        let mut usage = vk::ImageUsageFlags::COLOR_ATTACHMENT;
        if request.usage.contains(TextureUsage::COPY_DST) {
            usage |= vk::ImageUsageFlags::TRANSFER_DST;
        }
        if request.usage.contains(TextureUsage::COPY_SRC) {
            usage |= vk::ImageUsageFlags::TRANSFER_SRC;
        }

        let loader = ash::khr::swapchain::Device::new(&instance_state.instance, &device_state.device);
        let swapchain = unsafe {
            loader
                .create_swapchain(
                    &vk::SwapchainCreateInfoKHR::default()
                        .surface(surface_state.surface)
                        .min_image_count(image_count)
                        .image_format(surface_format.format)
                        .image_color_space(surface_format.color_space)
                        .image_extent(extent)
                        .image_array_layers(1)
                        .image_usage(usage)
                        .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                        .pre_transform(capabilities.current_transform)
                        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                        .present_mode(present_mode)
                        .clipped(true),
                    None,
                )
                .map_err(|e| LumeError::unknown(format!("vkCreateSwapchainKHR failed: {e}")))?
        };

        let images = unsafe {
            loader
                .get_swapchain_images(swapchain)
                .map_err(|e| LumeError::unknown(format!("vkGetSwapchainImagesKHR failed: {e}")))?
        };

        let info = SwapchainInfo {
            format: texture_format_from_vk(surface_format.format),
            extent: Extent3d {
                width: extent.width,
                height: extent.height,
                depth: 1,
            },
            present_mode: crate::conv::present_mode_from_vk(present_mode),
            image_count: images.len() as u32,
        };

        drop(surfaces);
        drop(adapters);
        drop(instances);

        let mut textures = Vec::with_capacity(images.len());
        let mut views = Vec::with_capacity(images.len());
        for image in images {
            let texture_id = TextureId::alloc();
            self.pools.textures.write().insert(
                texture_id,
                TextureState {
                    device,
                    image,
                    allocation: None,
                    format: info.format,
                    extent: info.extent,
                    mip_level_count: 1,
                    array_layer_count: 1,
                    current_layout: Mutex::new(TextureLayout::Undefined),
                    borrowed: true,
                },
            );

            let view = unsafe {
                device_state
                    .device
                    .create_image_view(
                        &vk::ImageViewCreateInfo::default()
                            .image(image)
                            .view_type(vk::ImageViewType::TYPE_2D)
                            .format(surface_format.format)
                            .subresource_range(vk::ImageSubresourceRange {
                                aspect_mask: vk::ImageAspectFlags::COLOR,
                                base_mip_level: 0,
                                level_count: 1,
                                base_array_layer: 0,
                                layer_count: 1,
                            }),
                        None,
                    )
                    .map_err(|e| LumeError::unknown(format!("vkCreateImageView (swapchain) failed: {e}")))?
            };
            let view_id = TextureViewId::alloc();
            self.pools.texture_views.write().insert(
                view_id,
                TextureViewState {
                    texture: texture_id,
                    device,
                    view,
                },
            );

            textures.push(texture_id);
            views.push(view_id);
        }

        let id = SwapchainId::alloc();
        self.pools.swapchains.write().insert(
            id,
            SwapchainState {
                device,
                surface,
                loader,
                swapchain,
                views,
                textures,
                info: info.clone(),
                current_image_index: Mutex::new(None),
            },
        );

        Ok((id, info))
    }

    pub(crate) fn destroy_swapchain_impl(&self, swapchain: SwapchainId) {
        let Some(state) = self.pools.swapchains.write().remove(&swapchain) else {
            return;
        };
        for view in &state.views {
            self.destroy_texture_view_impl(*view);
        }
        for texture in &state.textures {
            self.pools.textures.write().remove(texture);
        }
        unsafe {
            state.loader.destroy_swapchain(state.swapchain, None);
        }
    }

    pub(crate) fn swapchain_view_impl(&self, swapchain: SwapchainId, image_index: u32) -> LumeResult<TextureViewId> {
        let swapchains = self.pools.swapchains.read();
        let state = swapchains.get(&swapchain).ok_or_else(|| LumeError::invalid("unknown swapchain"))?;
        state
            .views
            .get(image_index as usize)
            .copied()
            .ok_or_else(|| LumeError::invalid("image index out of range"))
    }

    pub(crate) fn swapchain_acquire_next_impl(
        &self,
        swapchain: SwapchainId,
        timeout_ns: u64,
        signal_semaphore: Option<SemaphoreId>,
        signal_fence: Option<FenceId>,
    ) -> LumeResult<u32> {
        let swapchains = self.pools.swapchains.read();
        let state = swapchains.get(&swapchain).ok_or_else(|| LumeError::invalid("unknown swapchain"))?;

        let semaphores = self.pools.semaphores.read();
        let semaphore = match signal_semaphore {
            Some(id) => semaphores.get(&id).ok_or_else(|| LumeError::invalid("unknown semaphore"))?.semaphore,
            None => vk::Semaphore::null(),
        };
        let fences = self.pools.fences.read();
        let fence = match signal_fence {
            Some(id) => fences.get(&id).ok_or_else(|| LumeError::invalid("unknown fence"))?.fence,
            None => vk::Fence::null(),
        };

        let (index, _suboptimal) = unsafe {
            state
                .loader
                .acquire_next_image(state.swapchain, timeout_ns, semaphore, fence)
                .map_err(|e| match e {
                    vk::Result::ERROR_OUT_OF_DATE_KHR => LumeError::OutOfDate,
                    vk::Result::ERROR_SURFACE_LOST_KHR => LumeError::SurfaceLost,
                    _ => LumeError::unknown(format!("vkAcquireNextImageKHR failed: {e}")),
                })?
        };
        *state.current_image_index.lock() = Some(index);
        Ok(index)
    }

    pub(crate) fn swapchain_present_impl(&self, swapchain: SwapchainId, wait_semaphores: &[SemaphoreId]) -> LumeResult<()> {
        let swapchains = self.pools.swapchains.read();
        let state = swapchains.get(&swapchain).ok_or_else(|| LumeError::invalid("unknown swapchain"))?;
        let image_index = state
            .current_image_index
            .lock()
            .ok_or_else(|| LumeError::invalid("present() called before acquire_next()"))?;

        let devices = self.pools.devices.read();
        let device_state = devices
            .get(&state.device)
            .ok_or_else(|| LumeError::invalid("owning device was destroyed"))?;

        let semaphores = self.pools.semaphores.read();
        let mut wait = Vec::with_capacity(wait_semaphores.len());
        for id in wait_semaphores {
            wait.push(semaphores.get(id).ok_or_else(|| LumeError::invalid("unknown wait semaphore"))?.semaphore);
        }

        let swapchains_arr = [state.swapchain];
        let indices = [image_index];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait)
            .swapchains(&swapchains_arr)
            .image_indices(&indices);

        match unsafe { state.loader.queue_present(device_state.queue, &present_info) } {
            Ok(_suboptimal) => {
                *state.current_image_index.lock() = None;
                Ok(())
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Err(LumeError::OutOfDate),
            Err(vk::Result::ERROR_SURFACE_LOST_KHR) => Err(LumeError::SurfaceLost),
            Err(e) => Err(LumeError::unknown(format!("vkQueuePresentKHR failed: {e}"))),
        }
    }
}
