//! Native surface creation via `ash-window` (§4.3 presentation pipeline).
//!
//! `PlatformWindowHandle`'s Win32/Xlib/Wayland variants map onto Vulkan's
//! corresponding `VK_KHR_*_surface` extensions; Metal and Web have no
//! Vulkan-native surface type on this backend and route to the implicit
//! backend instead.

use crate::state::{SurfaceState, VulkanBackend};
use lume_core::error::{LumeError, LumeResult};
use lume_core::ids::{InstanceId, SurfaceId};
use lume_core::types::PlatformWindowHandle;
use raw_window_handle::{
    RawDisplayHandle, RawWindowHandle, WaylandDisplayHandle, WaylandWindowHandle, Win32WindowHandle,
    WindowsDisplayHandle, XlibDisplayHandle, XlibWindowHandle,
};
use std::num::NonZeroIsize;
use std::ptr::NonNull;

fn raw_handles(window: &PlatformWindowHandle) -> LumeResult<(RawDisplayHandle, RawWindowHandle)> {
    match *window {
        PlatformWindowHandle::Win32 { hwnd, hinstance } => {
            let hwnd = NonZeroIsize::new(hwnd as isize).ok_or_else(|| LumeError::invalid("null HWND"))?;
            let mut handle = Win32WindowHandle::new(hwnd);
            handle.hinstance = NonZeroIsize::new(hinstance as isize);
            Ok((
                RawDisplayHandle::Windows(WindowsDisplayHandle::new()),
                RawWindowHandle::Win32(handle),
            ))
        }
        PlatformWindowHandle::Xlib { window, display } => {
            let display_handle = XlibDisplayHandle::new(NonNull::new(display), 0);
            let window_handle = XlibWindowHandle::new(window);
            Ok((
                RawDisplayHandle::Xlib(display_handle),
                RawWindowHandle::Xlib(window_handle),
            ))
        }
        PlatformWindowHandle::Wayland { surface, display } => {
            let surface = NonNull::new(surface).ok_or_else(|| LumeError::invalid("null wl_surface"))?;
            let display = NonNull::new(display).ok_or_else(|| LumeError::invalid("null wl_display"))?;
            Ok((
                RawDisplayHandle::Wayland(WaylandDisplayHandle::new(display)),
                RawWindowHandle::Wayland(WaylandWindowHandle::new(surface)),
            ))
        }
        PlatformWindowHandle::Metal { .. } | PlatformWindowHandle::Web { .. } => Err(LumeError::FeatureNotSupported(
            "the explicit backend's surface creation supports Win32/Xlib/Wayland windows; Metal and Web targets belong to the implicit backend".into(),
        )),
    }
}

impl VulkanBackend {
    pub(crate) fn create_surface_impl(
        &self,
        instance: InstanceId,
        window: &PlatformWindowHandle,
    ) -> LumeResult<SurfaceId> {
        let instances = self.pools.instances.read();
        let instance_state = instances
            .get(&instance)
            .ok_or_else(|| LumeError::invalid("unknown instance"))?;

        let (display_handle, window_handle) = raw_handles(window)?;
        let surface = unsafe {
            ash_window::create_surface(
                &instance_state.entry,
                &instance_state.instance,
                display_handle,
                window_handle,
                None,
            )
            .map_err(|e| LumeError::unknown(format!("surface creation failed: {e}")))?
        };

        let id = SurfaceId::alloc();
        self.pools.surfaces.write().insert(id, SurfaceState { instance, surface });
        Ok(id)
    }

    pub(crate) fn destroy_surface_impl(&self, surface: SurfaceId) {
        let Some(state) = self.pools.surfaces.write().remove(&surface) else {
            return;
        };
        let instances = self.pools.instances.read();
        if let Some(instance_state) = instances.get(&state.instance) {
            unsafe {
                instance_state.surface_loader.destroy_surface(state.surface, None);
            }
        }
    }
}
