//! Swapchain creation and the acquire/present cycle (§4.3), the
//! implicit-backend counterpart of `lume_vulkan::swapchain`.
//!
//! `wgpu::Surface` hands out one `SurfaceTexture` per `get_current_texture`
//! call rather than an indexed array of images the backend owns up front,
//! so unlike the explicit backend's swapchain this one registers exactly
//! one texture/view pair per acquire and always reports image index 0.

use crate::state::{SwapchainState, TextureState, TextureViewState, WebGpuBackend};
use lume_core::error::{LumeError, LumeResult};
use lume_core::ids::*;
use lume_core::types::*;
use parking_lot::Mutex;

impl WebGpuBackend {
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
        let surfaces = self.pools.surfaces.read();
        let surface_state = surfaces.get(&surface).ok_or_else(|| LumeError::invalid("unknown surface"))?;

        let capabilities = surface_state.surface.get_capabilities(&adapter_state.adapter);
        if capabilities.formats.is_empty() {
            return Err(LumeError::invalid("surface is not compatible with this adapter"));
        }

        let requested_format = crate::conv::texture_format(request.format);
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|f| *f == requested_format)
            .unwrap_or(capabilities.formats[0]);

        let requested_present_mode = crate::conv::present_mode(request.present_mode);
        let present_mode = capabilities
            .present_modes
            .iter()
            .copied()
            .find(|&m| m == requested_present_mode)
            .unwrap_or(wgpu::PresentMode::Fifo);

        let alpha_mode = capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Opaque);

        let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
        if request.usage.contains(TextureUsage::COPY_DST) {
            usage |= wgpu::TextureUsages::COPY_DST;
        }
        if request.usage.contains(TextureUsage::COPY_SRC) {
            usage |= wgpu::TextureUsages::COPY_SRC;
        }

        let config = wgpu::SurfaceConfiguration {
            usage,
            format,
            width: request.width.max(1),
            height: request.height.max(1),
            present_mode,
            desired_maximum_frame_latency: request.min_image_count.max(1),
            alpha_mode,
            view_formats: vec![],
        };
        surface_state.surface.configure(&device_state.device, &config);

        let info = SwapchainInfo {
            format: crate::conv::texture_format_from_wgpu(format),
            extent: Extent3d {
                width: config.width,
                height: config.height,
                depth: 1,
            },
            present_mode: crate::conv::present_mode_from_wgpu(present_mode),
            image_count: 1,
        };

        drop(surfaces);
        drop(adapters);
        drop(devices);

        let id = SwapchainId::alloc();
        self.pools.swapchains.write().insert(
            id,
            SwapchainState {
                device,
                surface,
                config,
                info: info.clone(),
                current: Mutex::new(None),
            },
        );
        Ok((id, info))
    }

    pub(crate) fn destroy_swapchain_impl(&self, swapchain: SwapchainId) {
        let Some(state) = self.pools.swapchains.write().remove(&swapchain) else {
            return;
        };
        if let Some((_, texture, view)) = state.current.lock().take() {
            self.pools.texture_views.write().remove(&view);
            self.pools.textures.write().remove(&texture);
        }
    }

    pub(crate) fn swapchain_view_impl(&self, swapchain: SwapchainId, image_index: u32) -> LumeResult<TextureViewId> {
        if image_index != 0 {
            return Err(LumeError::invalid("image index out of range"));
        }
        let swapchains = self.pools.swapchains.read();
        let state = swapchains.get(&swapchain).ok_or_else(|| LumeError::invalid("unknown swapchain"))?;
        state
            .current
            .lock()
            .as_ref()
            .map(|(_, _, view)| *view)
            .ok_or_else(|| LumeError::invalid("swapchain_view() called before acquire_next()"))
    }

    pub(crate) fn swapchain_acquire_next_impl(
        &self,
        swapchain: SwapchainId,
        _timeout_ns: u64,
        signal_semaphore: Option<SemaphoreId>,
        signal_fence: Option<FenceId>,
    ) -> LumeResult<u32> {
        let swapchains = self.pools.swapchains.read();
        let state = swapchains.get(&swapchain).ok_or_else(|| LumeError::invalid("unknown swapchain"))?;
        let surfaces = self.pools.surfaces.read();
        let surface_state = surfaces.get(&state.surface).ok_or_else(|| LumeError::invalid("owning surface was destroyed"))?;
        let devices = self.pools.devices.read();
        let device_state = devices
            .get(&state.device)
            .ok_or_else(|| LumeError::invalid("owning device was destroyed"))?;

        let acquired = surface_state.surface.get_current_texture().map_err(|e| match e {
            wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost => LumeError::OutOfDate,
            _ => LumeError::unknown(format!("get_current_texture failed: {e}")),
        })?;

        let view = acquired.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let texture_id = TextureId::alloc();
        self.pools.textures.write().insert(
            texture_id,
            TextureState {
                device: state.device,
                // Cloned `wgpu::Texture` handle so `TextureId` lookups
                // (layout queries, barrier bookkeeping) resolve like any
                // other texture; the `SurfaceTexture` itself stays in
                // `current` until `swapchain_present` consumes it.
                texture: acquired.texture.clone(),
                format: crate::conv::texture_format_from_wgpu(state.config.format),
                extent: Extent3d {
                    width: state.config.width,
                    height: state.config.height,
                    depth: 1,
                },
                mip_level_count: 1,
                array_layer_count: 1,
                current_layout: Mutex::new(TextureLayout::Undefined),
                borrowed: true,
            },
        );
        let view_id = TextureViewId::alloc();
        self.pools.texture_views.write().insert(
            view_id,
            TextureViewState {
                texture: texture_id,
                device: state.device,
                view,
            },
        );

        if let Some(previous) = state.current.lock().replace((acquired, texture_id, view_id)) {
            self.pools.texture_views.write().remove(&previous.2);
            self.pools.textures.write().remove(&previous.1);
        }

        if let Some(semaphore) = signal_semaphore {
            self.signal_semaphore_impl(semaphore, 1)?;
        }
        if let Some(fence) = signal_fence {
            let fences = self.pools.fences.read();
            if let Some(fence_state) = fences.get(&fence) {
                *fence_state.signaled.lock() = true;
            }
        }
        device_state.device.poll(wgpu::Maintain::Poll);
        Ok(0)
    }

    pub(crate) fn swapchain_present_impl(&self, swapchain: SwapchainId, wait_semaphores: &[SemaphoreId]) -> LumeResult<()> {
        for semaphore in wait_semaphores {
            self.wait_for_semaphore_submission(*semaphore)?;
        }

        let swapchains = self.pools.swapchains.read();
        let state = swapchains.get(&swapchain).ok_or_else(|| LumeError::invalid("unknown swapchain"))?;
        let (acquired, texture_id, view_id) = state
            .current
            .lock()
            .take()
            .ok_or_else(|| LumeError::invalid("present() called before acquire_next()"))?;

        self.pools.texture_views.write().remove(&view_id);
        self.pools.textures.write().remove(&texture_id);
        acquired.present();
        Ok(())
    }
}
