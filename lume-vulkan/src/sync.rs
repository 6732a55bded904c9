//! Fences and semaphores (§4.2.4, §5).
//!
//! Timeline semaphores back `SemaphoreType::Timeline`; binary semaphores
//! back `SemaphoreType::Binary`, matching the distinction the teacher's
//! frame-sync manager drew between per-frame image-available semaphores
//! (binary) and any cross-queue ordering primitive.

use crate::state::{FenceState, SemaphoreState, VulkanBackend};
use ash::vk;
use lume_core::error::{LumeError, LumeResult, Status};
use lume_core::ids::*;
use lume_core::types::*;

impl VulkanBackend {
    pub(crate) fn create_fence_impl(&self, device: DeviceId, desc: &FenceDescriptor) -> LumeResult<FenceId> {
        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;

        let flags = if desc.signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let fence = unsafe {
            device_state
                .device
                .create_fence(&vk::FenceCreateInfo::default().flags(flags), None)
                .map_err(|e| LumeError::unknown(format!("vkCreateFence failed: {e}")))?
        };

        let id = FenceId::alloc();
        self.pools.fences.write().insert(id, FenceState { device, fence });
        Ok(id)
    }

    pub(crate) fn destroy_fence_impl(&self, fence: FenceId) {
        let Some(state) = self.pools.fences.write().remove(&fence) else {
            return;
        };
        let devices = self.pools.devices.read();
        if let Some(device_state) = devices.get(&state.device) {
            unsafe {
                device_state.device.destroy_fence(state.fence, None);
            }
        }
    }

    pub(crate) fn fence_wait_impl(&self, fence: FenceId, timeout_ns: u64) -> LumeResult<Status> {
        let fences = self.pools.fences.read();
        let state = fences.get(&fence).ok_or_else(|| LumeError::invalid("unknown fence"))?;
        let devices = self.pools.devices.read();
        let device_state = devices
            .get(&state.device)
            .ok_or_else(|| LumeError::invalid("owning device was destroyed"))?;

        match unsafe { device_state.device.wait_for_fences(&[state.fence], true, timeout_ns) } {
            Ok(()) => Ok(Status::Success),
            Err(vk::Result::TIMEOUT) => Ok(Status::Timeout),
            Err(e) => Err(LumeError::unknown(format!("vkWaitForFences failed: {e}"))),
        }
    }

    pub(crate) fn fence_reset_impl(&self, fence: FenceId) -> LumeResult<()> {
        let fences = self.pools.fences.read();
        let state = fences.get(&fence).ok_or_else(|| LumeError::invalid("unknown fence"))?;
        let devices = self.pools.devices.read();
        let device_state = devices
            .get(&state.device)
            .ok_or_else(|| LumeError::invalid("owning device was destroyed"))?;
        unsafe { device_state.device.reset_fences(&[state.fence]) }
            .map_err(|e| LumeError::unknown(format!("vkResetFences failed: {e}")))
    }

    pub(crate) fn fence_get_status_impl(&self, fence: FenceId) -> LumeResult<bool> {
        let fences = self.pools.fences.read();
        let state = fences.get(&fence).ok_or_else(|| LumeError::invalid("unknown fence"))?;
        let devices = self.pools.devices.read();
        let device_state = devices
            .get(&state.device)
            .ok_or_else(|| LumeError::invalid("owning device was destroyed"))?;
        unsafe { device_state.device.get_fence_status(state.fence) }
            .map_err(|e| LumeError::unknown(format!("vkGetFenceStatus failed: {e}")))
    }

    pub(crate) fn create_semaphore_impl(
        &self,
        device: DeviceId,
        desc: &SemaphoreDescriptor,
    ) -> LumeResult<SemaphoreId> {
        let devices = self.pools.devices.read();
        let device_state = devices.get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;

        let semaphore = match desc.semaphore_type {
            SemaphoreType::Binary => unsafe {
                device_state
                    .device
                    .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                    .map_err(|e| LumeError::unknown(format!("vkCreateSemaphore failed: {e}")))?
            },
            SemaphoreType::Timeline => {
                let mut type_create_info = vk::SemaphoreTypeCreateInfo::default()
                    .semaphore_type(vk::SemaphoreType::TIMELINE)
                    .initial_value(desc.initial_value);
                let create_info = vk::SemaphoreCreateInfo::default().push_next(&mut type_create_info);
                unsafe {
                    device_state
                        .device
                        .create_semaphore(&create_info, None)
                        .map_err(|e| LumeError::unknown(format!("vkCreateSemaphore (timeline) failed: {e}")))?
                }
            }
        };

        let id = SemaphoreId::alloc();
        self.pools.semaphores.write().insert(
            id,
            SemaphoreState {
                device,
                semaphore,
                semaphore_type: desc.semaphore_type,
            },
        );
        Ok(id)
    }

    pub(crate) fn destroy_semaphore_impl(&self, semaphore: SemaphoreId) {
        let Some(state) = self.pools.semaphores.write().remove(&semaphore) else {
            return;
        };
        let devices = self.pools.devices.read();
        if let Some(device_state) = devices.get(&state.device) {
            unsafe {
                device_state.device.destroy_semaphore(state.semaphore, None);
            }
        }
    }

    pub(crate) fn semaphore_signal_impl(&self, semaphore: SemaphoreId, value: u64) -> LumeResult<()> {
        let semaphores = self.pools.semaphores.read();
        let state = semaphores.get(&semaphore).ok_or_else(|| LumeError::invalid("unknown semaphore"))?;
        if state.semaphore_type != SemaphoreType::Timeline {
            return Err(LumeError::invalid("signal() requires a timeline semaphore"));
        }
        let devices = self.pools.devices.read();
        let device_state = devices
            .get(&state.device)
            .ok_or_else(|| LumeError::invalid("owning device was destroyed"))?;
        unsafe {
            device_state
                .device
                .signal_semaphore(&vk::SemaphoreSignalInfo::default().semaphore(state.semaphore).value(value))
                .map_err(|e| LumeError::unknown(format!("vkSignalSemaphore failed: {e}")))
        }
    }

    pub(crate) fn semaphore_wait_impl(
        &self,
        semaphore: SemaphoreId,
        value: u64,
        timeout_ns: u64,
    ) -> LumeResult<Status> {
        let semaphores = self.pools.semaphores.read();
        let state = semaphores.get(&semaphore).ok_or_else(|| LumeError::invalid("unknown semaphore"))?;
        if state.semaphore_type != SemaphoreType::Timeline {
            return Err(LumeError::invalid("wait() requires a timeline semaphore"));
        }
        let devices = self.pools.devices.read();
        let device_state = devices
            .get(&state.device)
            .ok_or_else(|| LumeError::invalid("owning device was destroyed"))?;

        let semaphores_arr = [state.semaphore];
        let values = [value];
        let wait_info = vk::SemaphoreWaitInfo::default()
            .semaphores(&semaphores_arr)
            .values(&values);
        match unsafe { device_state.device.wait_semaphores(&wait_info, timeout_ns) } {
            Ok(()) => Ok(Status::Success),
            Err(vk::Result::TIMEOUT) => Ok(Status::Timeout),
            Err(e) => Err(LumeError::unknown(format!("vkWaitSemaphores failed: {e}"))),
        }
    }
}
