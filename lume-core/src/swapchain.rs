//! Swapchain acquire/present cycle and resize (§3, §4.3).

use crate::error::LumeResult;
use crate::ids::{FenceId, SemaphoreId, SwapchainId};
use crate::registry::Registry;
use crate::types::SwapchainInfo;

/// `N = MAX_FRAMES_IN_FLIGHT`, chosen from the surface's reported min image
/// count and clamped to `[2, 4]` (§4.3).
pub fn frames_in_flight(info: &SwapchainInfo) -> u32 {
    info.image_count.clamp(2, 4)
}

pub struct Swapchain {
    pub(crate) id: SwapchainId,
    info: SwapchainInfo,
}

impl Swapchain {
    pub(crate) fn new(id: SwapchainId, info: SwapchainInfo) -> Self {
        Swapchain { id, info }
    }

    pub fn id(&self) -> SwapchainId {
        self.id
    }

    /// The backend's actual (format, extent, present mode, image count);
    /// may differ from the request. Callers must consult this, not the
    /// original request, for MSAA buffers/framebuffers/pipelines (§4.3).
    pub fn info(&self) -> &SwapchainInfo {
        &self.info
    }

    pub fn frames_in_flight(&self) -> u32 {
        frames_in_flight(&self.info)
    }

    pub fn view(&self, image_index: u32) -> LumeResult<super::resource::TextureView> {
        let (backend_id, backend) = Registry::global().lookup_with_id(self.id)?;
        let id = backend.swapchain_view(self.id, image_index)?;
        Registry::global().wrap(id, backend_id);
        Ok(super::resource::TextureView { id })
    }

    /// One of the three blocking operations (§5). Returns `ErrorOutOfDate`
    /// on surface-extent drift; the caller treats this identically to a
    /// resize event.
    pub fn acquire_next(
        &self,
        timeout_ns: u64,
        signal_semaphore: Option<SemaphoreId>,
        signal_fence: Option<FenceId>,
    ) -> LumeResult<u32> {
        Registry::global().lookup(self.id)?.swapchain_acquire_next(
            self.id,
            timeout_ns,
            signal_semaphore,
            signal_fence,
        )
    }

    pub fn present(&self, wait_semaphores: &[SemaphoreId]) -> LumeResult<()> {
        Registry::global()
            .lookup(self.id)?
            .swapchain_present(self.id, wait_semaphores)
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        let registry = Registry::global();
        if let Ok(backend) = registry.lookup(self.id) {
            backend.destroy_swapchain(self.id);
        }
        registry.unwrap(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::TextureFormat;
    use crate::types::{Extent3d, PresentMode};

    fn info(image_count: u32) -> SwapchainInfo {
        SwapchainInfo {
            format: TextureFormat::B8G8R8A8Unorm,
            extent: Extent3d {
                width: 800,
                height: 600,
                depth: 1,
            },
            present_mode: PresentMode::Fifo,
            image_count,
        }
    }

    #[test]
    fn frames_in_flight_clamps_to_two_and_four() {
        assert_eq!(frames_in_flight(&info(1)), 2);
        assert_eq!(frames_in_flight(&info(2)), 2);
        assert_eq!(frames_in_flight(&info(3)), 3);
        assert_eq!(frames_in_flight(&info(10)), 4);
    }
}
