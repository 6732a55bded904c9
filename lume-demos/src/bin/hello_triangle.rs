//! Spins a single triangle through a uniform-buffer MVP matrix every frame.
//! Exercises the render pipeline, bind group, and vertex buffer on top of
//! the acquire/submit/present cycle `hello_window` already covers.
//!
//! Forces the implicit backend directly (see `hello_compute`'s note on why
//! WGSL-only shaders can't go through `lume_demos::select_backend`).

use glam::Mat4;
use lume_core::types::{
    BindGroupDescriptor, BindGroupEntry, BindGroupLayoutDescriptor, BindGroupLayoutEntry,
    BindGroupResource, BufferBindingLayout, BufferDescriptor, BufferUsage, ClearColor,
    ColorAttachmentDescriptor, ColorTargetState, ColorWriteMask, CullMode, FenceDescriptor,
    FragmentState, FramebufferDescriptor, FrontFace, LoadOp, PolygonMode, PowerPreference,
    PresentMode, PrimitiveState, PrimitiveTopology, RenderPassBeginDescriptor,
    RenderPassDescriptor, RenderPipelineDescriptor, SemaphoreDescriptor, SemaphoreType,
    ShaderDescriptor, ShaderSourceType, ShaderStage, StoreOp, SwapchainRequest, TextureLayout,
    TextureUsage, VertexAttribute, VertexBufferLayout, VertexFormat, VertexState, VertexStepMode,
};
use lume_core::backend::SubmitInfo;
use lume_core::{Device, Instance, InstanceDescriptor, Queue, Surface, Swapchain};
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

#[rustfmt::skip]
const VERTICES: [f32; 18] = [
    // position          color
     0.0,  0.5, 0.0,     1.0, 0.0, 0.0,
    -0.5, -0.5, 0.0,     0.0, 1.0, 0.0,
     0.5, -0.5, 0.0,     0.0, 0.0, 1.0,
];

struct Renderer {
    device: Device,
    queue: Queue,
    _surface: Surface,
    swapchain: Swapchain,
    render_pass: lume_core::RenderPass,
    pipeline: lume_core::RenderPipeline,
    _bind_group_layout: lume_core::BindGroupLayout,
    bind_group: lume_core::BindGroup,
    vertex_buffer: lume_core::Buffer,
    uniform_buffer: lume_core::Buffer,
    _shaders: Vec<lume_core::Shader>,
    image_available: lume_core::Semaphore,
    render_finished: lume_core::Semaphore,
    frame_fence: lume_core::Fence,
    start: Instant,
}

impl Renderer {
    fn new(window: &Window) -> Self {
        let instance = Instance::new(
            lume_webgpu::backend(),
            InstanceDescriptor {
                application_name: "Hello Triangle".into(),
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

        let shader_source = include_str!("../../shaders/triangle.wgsl");
        let shader_bytes: std::sync::Arc<[u8]> = std::sync::Arc::from(shader_source.as_bytes());
        let vertex_shader = device
            .create_shader(&ShaderDescriptor {
                source_type: ShaderSourceType::Wgsl,
                bytes: shader_bytes.clone(),
                entry_point: "vs_main".into(),
                stage: ShaderStage::VERTEX,
            })
            .expect("create vertex shader");
        let fragment_shader = device
            .create_shader(&ShaderDescriptor {
                source_type: ShaderSourceType::Wgsl,
                bytes: shader_bytes,
                entry_point: "fs_main".into(),
                stage: ShaderStage::FRAGMENT,
            })
            .expect("create fragment shader");

        let bind_group_layout = device
            .create_bind_group_layout(&BindGroupLayoutDescriptor {
                entries: vec![BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStage::VERTEX,
                    resource: BufferBindingLayout::Buffer {
                        has_dynamic_offset: false,
                        min_binding_size: 64,
                    },
                }],
            })
            .expect("create bind group layout");

        let pipeline = device
            .create_render_pipeline(&RenderPipelineDescriptor {
                vertex: VertexState {
                    shader: vertex_shader.id(),
                    entry_point: "vs_main".into(),
                    buffers: vec![VertexBufferLayout {
                        stride: 24,
                        step_mode: VertexStepMode::Vertex,
                        attributes: vec![
                            VertexAttribute {
                                format: VertexFormat::Float32x3,
                                offset: 0,
                                shader_location: 0,
                            },
                            VertexAttribute {
                                format: VertexFormat::Float32x3,
                                offset: 12,
                                shader_location: 1,
                            },
                        ],
                    }],
                },
                fragment: Some(FragmentState {
                    shader: fragment_shader.id(),
                    entry_point: "fs_main".into(),
                    targets: vec![ColorTargetState {
                        format: swapchain.info().format,
                        write_mask: ColorWriteMask::ALL,
                        blend_enabled: false,
                    }],
                }),
                primitive: PrimitiveState {
                    topology: PrimitiveTopology::TriangleList,
                    front_face: FrontFace::Ccw,
                    cull_mode: CullMode::None,
                    polygon_mode: PolygonMode::Fill,
                },
                depth_stencil: None,
                sample_count: 1,
                render_pass: render_pass.id(),
                bind_group_layouts: vec![bind_group_layout.id()],
            })
            .expect("create render pipeline");

        let vertex_buffer = device
            .create_buffer(&BufferDescriptor {
                size: (VERTICES.len() * std::mem::size_of::<f32>()) as u64,
                usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
                mapped_at_creation: false,
            })
            .expect("create vertex buffer");
        queue
            .write_buffer(&vertex_buffer, 0, bytemuck::cast_slice(&VERTICES))
            .expect("write vertex buffer");

        let uniform_buffer = device
            .create_buffer(&BufferDescriptor {
                size: 64,
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
                mapped_at_creation: false,
            })
            .expect("create uniform buffer");

        let bind_group = device
            .create_bind_group(&BindGroupDescriptor {
                layout: bind_group_layout.id(),
                entries: vec![BindGroupEntry {
                    binding: 0,
                    resource: BindGroupResource::Buffer {
                        buffer: uniform_buffer.id(),
                        offset: 0,
                        size: 64,
                    },
                }],
            })
            .expect("create bind group");

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
            pipeline,
            _bind_group_layout: bind_group_layout,
            bind_group,
            vertex_buffer,
            uniform_buffer,
            _shaders: vec![vertex_shader, fragment_shader],
            image_available,
            render_finished,
            frame_fence,
            start: Instant::now(),
        }
    }

    fn draw(&mut self) {
        self.frame_fence.wait(u64::MAX).expect("wait fence");
        self.frame_fence.reset().expect("reset fence");

        let t = self.start.elapsed().as_secs_f32();
        let mvp = Mat4::from_rotation_z(t);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&mvp.to_cols_array()))
            .expect("update uniform buffer");

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
            let mut pass = encoder
                .begin_render_pass(RenderPassBeginDescriptor {
                    render_pass: self.render_pass.id(),
                    framebuffer: framebuffer.id(),
                    clear_colors: vec![ClearColor {
                        r: 0.02,
                        g: 0.02,
                        b: 0.05,
                        a: 1.0,
                    }],
                    clear_depth: 1.0,
                    clear_stencil: 0,
                    render_extent: extent,
                })
                .expect("begin render pass");
            pass.bind_pipeline(self.pipeline.id()).expect("bind pipeline");
            pass.set_bind_group(0, self.bind_group.id(), vec![]).expect("set bind group");
            pass.set_vertex_buffer(0, self.vertex_buffer.id(), 0).expect("set vertex buffer");
            pass.set_viewport(0.0, 0.0, extent.width as f32, extent.height as f32, 0.0, 1.0)
                .expect("set viewport");
            pass.set_scissor(0, 0, extent.width, extent.height).expect("set scissor");
            pass.draw(3, 1, 0, 0).expect("draw");
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
            .with_title("lume hello_triangle")
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
