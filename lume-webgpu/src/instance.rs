//! Instance, adapter and device lifecycle (§4.1 bootstrap, §4.2.3), the
//! implicit-backend counterpart of `lume_vulkan::instance`. `wgpu`'s
//! adapter/device request calls are async; every call here blocks on them
//! with `pollster::block_on` since `Backend` is a synchronous trait.

use crate::state::{AdapterState, DeviceState, InstanceState, QueueState, WebGpuBackend};
use lume_core::backend::InstanceDescriptor;
use lume_core::error::{LumeError, LumeResult};
use lume_core::ids::{AdapterId, DeviceId, InstanceId, QueueId};
use lume_core::types::{AdapterInfo, AdapterType, DeviceLimits, PowerPreference};
use std::sync::Arc;

impl WebGpuBackend {
    pub(crate) fn create_instance_impl(&self, desc: &InstanceDescriptor) -> LumeResult<InstanceId> {
        log::info!("creating wgpu instance for application '{}'", desc.application_name);

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: if desc.enable_debug_extension {
                wgpu::InstanceFlags::VALIDATION | wgpu::InstanceFlags::DEBUG
            } else {
                wgpu::InstanceFlags::empty()
            },
            ..Default::default()
        });

        let id = InstanceId::alloc();
        self.pools.instances.write().insert(id, InstanceState { instance });
        Ok(id)
    }

    pub(crate) fn destroy_instance_impl(&self, instance: InstanceId) {
        self.pools.instances.write().remove(&instance);
    }

    pub(crate) fn enumerate_adapters_impl(&self, instance: InstanceId) -> LumeResult<Vec<AdapterId>> {
        let instances = self.pools.instances.read();
        let state = instances.get(&instance).ok_or_else(|| LumeError::invalid("unknown instance"))?;

        let adapters = state.instance.enumerate_adapters(wgpu::Backends::all());
        let mut ids = Vec::with_capacity(adapters.len());
        for adapter in adapters {
            let id = AdapterId::alloc();
            self.pools.adapters.write().insert(id, AdapterState { instance, adapter });
            ids.push(id);
        }
        Ok(ids)
    }

    pub(crate) fn request_adapter_impl(
        &self,
        instance: InstanceId,
        power_preference: PowerPreference,
    ) -> LumeResult<AdapterId> {
        let instances = self.pools.instances.read();
        let state = instances.get(&instance).ok_or_else(|| LumeError::invalid("unknown instance"))?;

        let preference = match power_preference {
            PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
            PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
            PowerPreference::NoPreference => wgpu::PowerPreference::None,
        };

        let adapter = pollster::block_on(state.instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: preference,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(LumeError::NotFound)?;

        let id = AdapterId::alloc();
        self.pools.adapters.write().insert(id, AdapterState { instance, adapter });
        Ok(id)
    }

    pub(crate) fn adapter_info_impl(&self, adapter: AdapterId) -> LumeResult<AdapterInfo> {
        let adapters = self.pools.adapters.read();
        let state = adapters.get(&adapter).ok_or_else(|| LumeError::invalid("unknown adapter"))?;
        let info = state.adapter.get_info();
        Ok(AdapterInfo {
            vendor_id: info.vendor,
            device_id: info.device,
            name: info.name,
            adapter_type: match info.device_type {
                wgpu::DeviceType::DiscreteGpu => AdapterType::Discrete,
                wgpu::DeviceType::IntegratedGpu => AdapterType::Integrated,
                wgpu::DeviceType::Cpu => AdapterType::Cpu,
                _ => AdapterType::Unknown,
            },
        })
    }

    pub(crate) fn request_device_impl(&self, adapter: AdapterId) -> LumeResult<(DeviceId, QueueId)> {
        let adapters = self.pools.adapters.read();
        let adapter_state = adapters.get(&adapter).ok_or_else(|| LumeError::invalid("unknown adapter"))?;

        let limits = wgpu::Limits::default();
        let (device, queue) = pollster::block_on(adapter_state.adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("lume device"),
                required_features: wgpu::Features::empty(),
                required_limits: limits.clone(),
            },
            None,
        ))
        .map_err(|e| LumeError::unknown(format!("wgpu device request failed: {e}")))?;

        let device_id = DeviceId::alloc();
        let queue_id = QueueId::alloc();
        self.pools.devices.write().insert(
            device_id,
            Arc::new(DeviceState {
                adapter,
                device,
                queue,
                limits,
            }),
        );
        self.pools.queues.write().insert(queue_id, QueueState { device: device_id });
        Ok((device_id, queue_id))
    }

    pub(crate) fn destroy_device_impl(&self, device: DeviceId) {
        self.pools.devices.write().remove(&device);
        self.pools.queues.write().retain(|_, q| q.device != device);
    }

    pub(crate) fn device_limits_impl(&self, device: DeviceId) -> LumeResult<DeviceLimits> {
        let devices = self.pools.devices.read();
        let state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;
        Ok(DeviceLimits {
            min_uniform_buffer_offset_alignment: state.limits.min_uniform_buffer_offset_alignment as u64,
            max_bind_groups: state.limits.max_bind_groups,
        })
    }

    pub(crate) fn device_wait_idle_impl(&self, device: DeviceId) -> LumeResult<()> {
        let devices = self.pools.devices.read();
        let state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;
        state.device.poll(wgpu::Maintain::Wait);
        Ok(())
    }

    pub(crate) fn queue_wait_idle_impl(&self, queue: QueueId) -> LumeResult<()> {
        let queues = self.pools.queues.read();
        let queue_state = queues.get(&queue).ok_or_else(|| LumeError::invalid("unknown queue"))?;
        let devices = self.pools.devices.read();
        let device_state = devices
            .get(&queue_state.device)
            .ok_or_else(|| LumeError::invalid("owning device was destroyed"))?;
        device_state.device.poll(wgpu::Maintain::Wait);
        Ok(())
    }
}
