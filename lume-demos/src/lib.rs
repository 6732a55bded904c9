//! Glue shared by the demo binaries: turning a `winit` window into the
//! `PlatformWindowHandle` `lume_core::Instance::create_surface` expects.

use lume_core::types::PlatformWindowHandle;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};

pub fn platform_window_handle(window: &winit::window::Window) -> PlatformWindowHandle {
    let window_handle = window.window_handle().expect("window has no window handle").as_raw();
    let display_handle = window.display_handle().expect("window has no display handle").as_raw();

    match (window_handle, display_handle) {
        (RawWindowHandle::Win32(w), _) => PlatformWindowHandle::Win32 {
            hwnd: isize::from(w.hwnd) as *mut std::ffi::c_void,
            hinstance: w.hinstance.map(isize::from).unwrap_or(0) as *mut std::ffi::c_void,
        },
        (RawWindowHandle::Xlib(w), RawDisplayHandle::Xlib(d)) => PlatformWindowHandle::Xlib {
            window: w.window,
            display: d.display.map(|p| p.as_ptr()).unwrap_or(std::ptr::null_mut()),
        },
        (RawWindowHandle::Wayland(w), RawDisplayHandle::Wayland(d)) => PlatformWindowHandle::Wayland {
            surface: w.surface.as_ptr(),
            display: d.display.as_ptr(),
        },
        (RawWindowHandle::AppKit(w), _) => PlatformWindowHandle::Metal { layer: w.ns_view.as_ptr() },
        _ => panic!("unsupported windowing system: no Win32/Xlib/Wayland/AppKit handle available"),
    }
}

/// Picks the backend named by `LUME_BACKEND` (`vulkan`|`webgpu`), defaulting
/// to `vulkan` to match the explicit backend's feature completeness.
pub fn select_backend() -> std::sync::Arc<dyn lume_core::Backend> {
    match std::env::var("LUME_BACKEND").as_deref() {
        Ok("webgpu") => lume_webgpu::backend(),
        _ => lume_vulkan::backend(),
    }
}
