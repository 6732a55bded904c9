//! Dispatches a compute shader that doubles every element of a storage
//! buffer, reads the result back through a staging buffer, and checks it.
//!
//! WGSL shaders only run on the implicit backend (`lume-vulkan` expects
//! pre-compiled SPIR-V, which this crate has no compiler to produce), so
//! this demo loads `lume_webgpu::backend()` directly rather than going
//! through `lume_demos::select_backend`.

use lume_core::types::{
    BindGroupDescriptor, BindGroupEntry, BindGroupLayoutDescriptor, BindGroupLayoutEntry,
    BindGroupResource, BufferBindingLayout, BufferDescriptor, BufferUsage, ComputePipelineDescriptor,
    FenceDescriptor, MapMode, PowerPreference, ShaderDescriptor, ShaderSourceType, ShaderStage,
};
use lume_core::backend::SubmitInfo;
use lume_core::{Instance, InstanceDescriptor};

const ELEMENT_COUNT: usize = 64;
const BUFFER_SIZE: u64 = (ELEMENT_COUNT * std::mem::size_of::<f32>()) as u64;

fn main() {
    env_logger::init();

    let instance = Instance::new(
        lume_webgpu::backend(),
        InstanceDescriptor {
            application_name: "Hello Compute".into(),
            enable_surface_extension: false,
            enable_debug_extension: cfg!(debug_assertions),
            debug_callback: None,
        },
    )
    .expect("create instance");
    let adapter = instance
        .request_adapter(PowerPreference::HighPerformance)
        .expect("request adapter");
    log::info!("using adapter: {}", adapter.name().unwrap_or_default());
    let (device, queue) = adapter.request_device().expect("request device");

    let initial: Vec<f32> = (0..ELEMENT_COUNT).map(|i| i as f32).collect();
    let initial_bytes = bytemuck::cast_slice(&initial);

    let storage_buffer = device
        .create_buffer(&BufferDescriptor {
            size: BUFFER_SIZE,
            usage: BufferUsage::STORAGE | BufferUsage::COPY_SRC | BufferUsage::COPY_DST,
            mapped_at_creation: false,
        })
        .expect("create storage buffer");
    queue
        .write_buffer(&storage_buffer, 0, initial_bytes)
        .expect("write storage buffer");

    let staging_buffer = device
        .create_buffer(&BufferDescriptor {
            size: BUFFER_SIZE,
            usage: BufferUsage::COPY_DST | BufferUsage::MAP_READ,
            mapped_at_creation: false,
        })
        .expect("create staging buffer");

    let shader_source = include_str!("../../shaders/double.wgsl");
    let shader = device
        .create_shader(&ShaderDescriptor {
            source_type: ShaderSourceType::Wgsl,
            bytes: std::sync::Arc::from(shader_source.as_bytes()),
            entry_point: "main".into(),
            stage: ShaderStage::COMPUTE,
        })
        .expect("create shader");

    let bind_group_layout = device
        .create_bind_group_layout(&BindGroupLayoutDescriptor {
            entries: vec![BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStage::COMPUTE,
                resource: BufferBindingLayout::Buffer {
                    has_dynamic_offset: false,
                    min_binding_size: BUFFER_SIZE,
                },
            }],
        })
        .expect("create bind group layout");

    let bind_group = device
        .create_bind_group(&BindGroupDescriptor {
            layout: bind_group_layout.id(),
            entries: vec![BindGroupEntry {
                binding: 0,
                resource: BindGroupResource::Buffer {
                    buffer: storage_buffer.id(),
                    offset: 0,
                    size: BUFFER_SIZE,
                },
            }],
        })
        .expect("create bind group");

    let pipeline = device
        .create_compute_pipeline(&ComputePipelineDescriptor {
            shader: shader.id(),
            entry_point: "main".into(),
            bind_group_layouts: vec![bind_group_layout.id()],
        })
        .expect("create compute pipeline");

    let mut encoder = device.create_command_encoder().expect("create encoder");
    encoder.begin().expect("begin encoder");
    {
        let mut pass = encoder.begin_compute_pass().expect("begin compute pass");
        pass.bind_pipeline(pipeline.id()).expect("bind pipeline");
        pass.set_bind_group(0, bind_group.id(), vec![]).expect("set bind group");
        let workgroups = ((ELEMENT_COUNT as u32) + 63) / 64;
        pass.dispatch(workgroups, 1, 1).expect("dispatch");
        pass.end().expect("end compute pass");
    }
    encoder
        .copy_buffer_to_buffer(storage_buffer.id(), 0, staging_buffer.id(), 0, BUFFER_SIZE)
        .expect("copy to staging buffer");
    encoder.end().expect("end encoder");

    let fence = device
        .create_fence(&FenceDescriptor { signaled: false })
        .expect("create fence");
    queue
        .submit(SubmitInfo {
            encoders: vec![encoder.id()],
            wait_semaphores: vec![],
            signal_semaphores: vec![],
            signal_fence: Some(fence.id()),
        })
        .expect("submit");
    fence.wait(u64::MAX).expect("wait for compute to finish");

    let ptr = staging_buffer
        .map_async(MapMode::Read, 0, BUFFER_SIZE)
        .expect("map staging buffer");
    let result: Vec<f32> = unsafe { std::slice::from_raw_parts(ptr as *const f32, ELEMENT_COUNT) }.to_vec();
    staging_buffer.unmap().expect("unmap staging buffer");

    println!("first 10 results:");
    for i in 0..10 {
        println!("  [{i}] {} -> {}", initial[i], result[i]);
    }
    assert_eq!(result[10], 20.0, "expected element 10 to be doubled to 20.0");
    println!("compute dispatch verified: every element was doubled");
}
