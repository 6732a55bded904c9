//! Opens a window, drives the presentation pipeline (§4.3) every frame, and
//! clears the swapchain image to a solid color. No geometry, no pipelines:
//! this is the acquire/submit/present cycle on its own.

use lume_core::types::{
    ClearColor, ColorAttachmentDescriptor, FenceDescriptor, FramebufferDescriptor, LoadOp,
    PowerPreference, PresentMode, RenderPassBeginDescriptor, RenderPassDescriptor,
    SemaphoreDescriptor, SemaphoreType, StoreOp, SwapchainRequest, TextureLayout, TextureUsage,
};
use lume_core::backend::SubmitInfo;
use lume_core::{Device, Instance, InstanceDescriptor, Queue, Surface, Swapchain};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

struct Renderer {
    device: Device,
    queue: Queue,
    _surface: Surface,
    swapchain: Swapchain,
    render_pass: lume_core::RenderPass,
    image_available: lume_core::Semaphore,
    render_finished: lume_core::Semaphore,
    frame_fence: lume_core::Fence,
}

impl Renderer {
    fn new(window: &Window) -> Self {
        let instance = Instance::new(
            lume_demos::select_backend(),
            InstanceDescriptor {
                application_name: "Hello Window".into(),
                enable_surface_extension: true,
                enable_debug_extension: cfg!(debug_assertions),
                debug_callback: None,
            },
        )
        .expect("create instance");

        let surface = instance
            .create_surface(&lume_demos::platform_window_handle(window))
            .expect("create surface");
        let adapter = instance
            .request_adapter(PowerPreference::HighPerformance)
            .expect("request adapter");
        log::info!("using adapter: {}", adapter.name().unwrap_or_default());
        let (device, queue) = adapter.request_device().expect("request device");

        let size = window.inner_size();
        let swapchain = device
            .create_swapchain(
                &surface,
                &SwapchainRequest {
                    width: size.width,
                    height: size.height,
                    format: lume_core::TextureFormat::B8G8R8A8Unorm,
                    usage: TextureUsage::COLOR_ATTACHMENT,
                    present_mode: PresentMode::Fifo,
                    min_image_count: 2,
                },
            )
            .expect("create swapchain");

        let render_pass = device
            .create_render_pass(&RenderPassDescriptor {
                color_attachments: vec![ColorAttachmentDescriptor {
                    format: swapchain.info().format,
                    sample_count: 1,
                    load_op: LoadOp::Clear,
                    store_op: StoreOp::Store,
                    final_layout: TextureLayout::PresentSrc,
                    resolve: None,
                }],
                depth_stencil_attachment: None,
            })
            .expect("create render pass");

        let image_available = device
            .create_semaphore(&SemaphoreDescriptor {
                semaphore_type: SemaphoreType::Binary,
                initial_value: 0,
            })
            .expect("create semaphore");
        let render_finished = device
            .create_semaphore(&SemaphoreDescriptor {
                semaphore_type: SemaphoreType::Binary,
                initial_value: 0,
            })
            .expect("create semaphore");
        let frame_fence = device
            .create_fence(&FenceDescriptor { signaled: true })
            .expect("create fence");

        Renderer {
            device,
            queue,
            _surface: surface,
            swapchain,
            render_pass,
            image_available,
            render_finished,
            frame_fence,
        }
    }

    fn draw(&mut self) {
        self.frame_fence.wait(u64::MAX).expect("wait fence");
        self.frame_fence.reset().expect("reset fence");

        let image_index = self
            .swapchain
            .acquire_next(u64::MAX, Some(self.image_available.id()), None)
            .expect("acquire next image");
        let view = self.swapchain.view(image_index).expect("swapchain view");
        let extent = self.swapchain.info().extent;

        let framebuffer = self
            .device
            .create_framebuffer(&FramebufferDescriptor {
                render_pass: self.render_pass.id(),
                attachments: vec![view.id()],
                resolve_attachments: vec![None],
                extent,
            })
            .expect("create framebuffer");

        let mut encoder = self.device.create_command_encoder().expect("create encoder");
        encoder.begin().expect("begin encoder");
        {
            let pass = encoder
                .begin_render_pass(RenderPassBeginDescriptor {
                    render_pass: self.render_pass.id(),
                    framebuffer: framebuffer.id(),
                    clear_colors: vec![ClearColor {
                        r: 0.05,
                        g: 0.07,
                        b: 0.12,
                        a: 1.0,
                    }],
                    clear_depth: 1.0,
                    clear_stencil: 0,
                    render_extent: extent,
                })
                .expect("begin render pass");
            pass.end().expect("end render pass");
        }
        encoder.end().expect("end encoder");

        self.queue
            .submit(SubmitInfo {
                encoders: vec![encoder.id()],
                wait_semaphores: vec![self.image_available.id()],
                signal_semaphores: vec![self.render_finished.id()],
                signal_fence: Some(self.frame_fence.id()),
            })
            .expect("submit");

        self.swapchain
            .present(&[self.render_finished.id()])
            .expect("present");
    }
}

#[derive(Default)]
struct App {
    window: Option<std::sync::Arc<Window>>,
    renderer: Option<Renderer>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = Window::default_attributes()
            .with_title("lume hello_window")
            .with_inner_size(winit::dpi::LogicalSize::new(800.0, 600.0));
        let window = std::sync::Arc::new(event_loop.create_window(attrs).unwrap());
        self.renderer = Some(Renderer::new(&window));
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(renderer) = &self.renderer {
                    let _ = renderer.device.wait_idle();
                }
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.draw();
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn main() {
    env_logger::init();
    let event_loop = EventLoop::new().unwrap();
    let mut app = App::default();
    event_loop.run_app(&mut app).unwrap();
}
