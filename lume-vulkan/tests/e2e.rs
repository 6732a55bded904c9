//! End-to-end scenarios and properties from spec.md §8 against a live
//! Vulkan adapter. Every test skips (logs a warning and returns) rather than
//! failing when no adapter is present, since CI and developer machines alike
//! may run headless.

use lume_core::backend::SubmitInfo;
use lume_core::types::*;
use lume_core::{Adapter, Instance, InstanceDescriptor};

fn instance() -> Option<Instance> {
    match Instance::new(
        lume_vulkan::backend(),
        InstanceDescriptor {
            application_name: "lume-vulkan e2e".into(),
            enable_surface_extension: false,
            enable_debug_extension: false,
            debug_callback: None,
        },
    ) {
        Ok(instance) => Some(instance),
        Err(err) => {
            log::warn!("skipping: could not create vulkan instance: {err}");
            None
        }
    }
}

/// Creates an instance and requests a high-performance adapter, skipping the
/// calling test if either step fails or no adapter is available.
fn adapter() -> Option<(Instance, Adapter)> {
    let instance = instance()?;
    match instance.request_adapter(PowerPreference::HighPerformance) {
        Ok(adapter) => Some((instance, adapter)),
        Err(err) => {
            log::warn!("skipping: no vulkan adapter available: {err}");
            None
        }
    }
}

#[test]
fn scenario_1_instance_adapter_smoke() {
    let Some((_instance, adapter)) = adapter() else {
        return;
    };
    let info = adapter.info().expect("adapter info");
    assert!(info.device_id > 0);
    assert!(matches!(
        info.adapter_type,
        AdapterType::Discrete | AdapterType::Integrated | AdapterType::Cpu
    ));
}

#[test]
fn scenario_2_buffer_create_info() {
    let Some((_instance, adapter)) = adapter() else {
        return;
    };
    let (device, _queue) = adapter.request_device().expect("request device");

    let buffer = device
        .create_buffer(&BufferDescriptor {
            size: 1024,
            usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
            mapped_at_creation: false,
        })
        .expect("create buffer");

    let info = buffer.info().expect("buffer info");
    assert_eq!(info.size, 1024);
    assert_eq!(info.usage, BufferUsage::VERTEX | BufferUsage::COPY_DST);
}

#[test]
fn scenario_3_texture_view_ranges() {
    let Some((_instance, adapter)) = adapter() else {
        return;
    };
    let (device, _queue) = adapter.request_device().expect("request device");

    let texture = device
        .create_texture(&TextureDescriptor {
            texture_type: TextureType::D2,
            extent: Extent3d {
                width: 512,
                height: 512,
                depth: 1,
            },
            array_layer_count: 1,
            mip_level_count: 9,
            sample_count: 1,
            format: TextureFormat::R8G8B8A8Unorm,
            usage: TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
        })
        .expect("create texture");

    texture
        .create_view(&TextureViewDescriptor {
            view_type: TextureViewType::D2,
            format: TextureFormat::R8G8B8A8Unorm,
            base_mip_level: 2,
            mip_level_count: 4,
            base_array_layer: 0,
            array_layer_count: 1,
        })
        .expect("view within mip range");

    let err = texture
        .create_view(&TextureViewDescriptor {
            view_type: TextureViewType::D2,
            format: TextureFormat::R8G8B8A8Unorm,
            base_mip_level: 2,
            mip_level_count: 10,
            base_array_layer: 0,
            array_layer_count: 1,
        })
        .unwrap_err();
    assert!(matches!(err, lume_core::LumeError::InvalidArgument(_)));
}

#[test]
fn scenario_4_fence_wait_on_presigned() {
    let Some((_instance, adapter)) = adapter() else {
        return;
    };
    let (device, _queue) = adapter.request_device().expect("request device");

    let fence = device
        .create_fence(&FenceDescriptor { signaled: true })
        .expect("create fence");

    assert_eq!(fence.wait(0).expect("wait"), lume_core::Status::Success);
    assert!(fence.is_signaled().expect("status"));
    fence.reset().expect("reset");
    assert!(!fence.is_signaled().expect("status"));
}

#[test]
fn scenario_6_multi_frame_in_flight() {
    const MAX_FRAMES_IN_FLIGHT: usize = 3;

    let Some((_instance, adapter)) = adapter() else {
        return;
    };
    let (device, queue) = adapter.request_device().expect("request device");

    let encoders: Vec<_> = (0..MAX_FRAMES_IN_FLIGHT)
        .map(|_| device.create_command_encoder().expect("create encoder"))
        .collect();
    let fences: Vec<_> = (0..MAX_FRAMES_IN_FLIGHT)
        .map(|_| {
            device
                .create_fence(&FenceDescriptor { signaled: false })
                .expect("create fence")
        })
        .collect();

    for (encoder, fence) in encoders.iter().zip(&fences) {
        queue
            .submit(SubmitInfo {
                encoders: vec![encoder.id()],
                wait_semaphores: vec![],
                signal_semaphores: vec![],
                signal_fence: Some(fence.id()),
            })
            .expect("submit");
    }

    for fence in &fences {
        assert_eq!(fence.wait(u64::MAX).expect("wait"), lume_core::Status::Success);
    }

    // Frame 0's encoder must be reusable once its fence has signaled.
    let mut reused = encoders.into_iter().next().unwrap();
    reused.begin().expect("begin reused encoder");
    reused.end().expect("end reused encoder");
}

#[test]
fn property_p6_fence_signal_round_trip() {
    let Some((_instance, adapter)) = adapter() else {
        return;
    };
    let (device, queue) = adapter.request_device().expect("request device");

    let encoder = device.create_command_encoder().expect("create encoder");
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

    assert_eq!(fence.wait(u64::MAX).expect("wait"), lume_core::Status::Success);
    assert!(fence.is_signaled().expect("status"));
    fence.reset().expect("reset");
    assert!(!fence.is_signaled().expect("status"));
}

#[test]
fn property_p7_buffer_copy_round_trip() {
    let Some((_instance, adapter)) = adapter() else {
        return;
    };
    let (device, queue) = adapter.request_device().expect("request device");

    let pattern: [u8; 16] = [
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
        0x10,
    ];

    let src = device
        .create_buffer(&BufferDescriptor {
            size: pattern.len() as u64,
            usage: BufferUsage::COPY_SRC | BufferUsage::COPY_DST,
            mapped_at_creation: false,
        })
        .expect("create src buffer");
    let dst = device
        .create_buffer(&BufferDescriptor {
            size: pattern.len() as u64,
            usage: BufferUsage::COPY_SRC | BufferUsage::COPY_DST | BufferUsage::MAP_READ,
            mapped_at_creation: false,
        })
        .expect("create dst buffer");

    queue.write_buffer(&src, 0, &pattern).expect("write buffer");

    let mut encoder = device.create_command_encoder().expect("create encoder");
    encoder.begin().expect("begin");
    encoder
        .copy_buffer_to_buffer(src.id(), 0, dst.id(), 0, pattern.len() as u64)
        .expect("copy buffer to buffer");
    encoder.end().expect("end");

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
    fence.wait(u64::MAX).expect("wait");

    let ptr = dst
        .map_async(MapMode::Read, 0, pattern.len() as u64)
        .expect("map dst buffer");
    let read_back = unsafe { std::slice::from_raw_parts(ptr, pattern.len()) };
    assert_eq!(read_back, &pattern);
    dst.unmap().expect("unmap");
}
