//! Native surface creation via `raw-window-handle` (§4.3 presentation
//! pipeline), the implicit-backend counterpart of `lume_vulkan::surface`.
//!
//! Unlike the explicit backend, every `PlatformWindowHandle` variant is in
//! scope here: Metal and Web windows have no Vulkan-native surface type and
//! were routed to this backend instead (`lume_vulkan::surface`'s doc
//! comment). Web is accepted at the type level but surfaced as
//! `FeatureNotSupported`, since a canvas selector only becomes a real
//! surface target through `wasm-bindgen`/`web-sys`, outside a native build
//! of this crate.

use crate::state::{SurfaceState, WebGpuBackend};
use lume_core::error::{LumeError, LumeResult};
use lume_core::ids::{InstanceId, SurfaceId};
use lume_core::types::PlatformWindowHandle;
use raw_window_handle::{
    AppKitDisplayHandle, AppKitWindowHandle, RawDisplayHandle, RawWindowHandle, WaylandDisplayHandle,
    WaylandWindowHandle, Win32WindowHandle, WindowsDisplayHandle, XlibDisplayHandle, XlibWindowHandle,
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
        PlatformWindowHandle::Metal { layer } => {
            let ns_view = NonNull::new(layer).ok_or_else(|| LumeError::invalid("null CAMetalLayer"))?;
            Ok((
                RawDisplayHandle::AppKit(AppKitDisplayHandle::new()),
                RawWindowHandle::AppKit(AppKitWindowHandle::new(ns_view)),
            ))
        }
        PlatformWindowHandle::Web { .. } => Err(LumeError::FeatureNotSupported(
            "web canvas surfaces require a wasm32 build using web-sys; this build targets native platforms".into(),
        )),
    }
}

impl WebGpuBackend {
    pub(crate) fn create_surface_impl(
        &self,
        instance: InstanceId,
        window: &PlatformWindowHandle,
    ) -> LumeResult<SurfaceId> {
        self.pools
            .instances
            .read()
            .get(&instance)
            .ok_or_else(|| LumeError::invalid("unknown instance"))?;

        let (raw_display_handle, raw_window_handle) = raw_handles(window)?;
        let surface = {
            let instances = self.pools.instances.read();
            let instance_state = instances.get(&instance).unwrap();
            unsafe {
                instance_state
                    .instance
                    .create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                        raw_display_handle,
                        raw_window_handle,
                    })
                    .map_err(|e| LumeError::unknown(format!("surface creation failed: {e}")))?
            }
        };

        let id = SurfaceId::alloc();
        self.pools.surfaces.write().insert(id, SurfaceState { instance, surface });
        Ok(id)
    }

    pub(crate) fn destroy_surface_impl(&self, surface: SurfaceId) {
        self.pools.surfaces.write().remove(&surface);
    }
}
