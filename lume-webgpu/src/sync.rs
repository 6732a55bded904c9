//! Fence and semaphore emulation (§4.2.4, §5).
//!
//! `wgpu` exposes neither primitive natively. A fence is emulated with the
//! `wgpu::SubmissionIndex` returned by `Queue::submit` plus `Device::poll`;
//! a semaphore (binary or timeline) is emulated with a `Mutex<u64>` +
//! `Condvar` the host thread parks on, since there is no GPU-side wait
//! primitive to hand the driver. Submission order across encoders on the
//! same device is already serialized by `wgpu`, so unlike
//! `lume_vulkan::sync` the binary/timeline distinction collapses to one
//! code path here: whichever value was last signaled is what a wait
//! observes.

use crate::state::{FenceState, SemaphoreState, WebGpuBackend};
use lume_core::error::{LumeError, LumeResult, Status};
use lume_core::ids::*;
use lume_core::types::*;
use parking_lot::{Condvar, Mutex};
use std::time::Duration;

impl WebGpuBackend {
    pub(crate) fn create_fence_impl(&self, device: DeviceId, desc: &FenceDescriptor) -> LumeResult<FenceId> {
        self.pools.devices.read().get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;

        let id = FenceId::alloc();
        self.pools.fences.write().insert(
            id,
            FenceState {
                device,
                signaled: Mutex::new(desc.signaled),
                submission: Mutex::new(None),
            },
        );
        Ok(id)
    }

    pub(crate) fn destroy_fence_impl(&self, fence: FenceId) {
        self.pools.fences.write().remove(&fence);
    }

    pub(crate) fn fence_wait_impl(&self, fence: FenceId, timeout_ns: u64) -> LumeResult<Status> {
        let fences = self.pools.fences.read();
        let state = fences.get(&fence).ok_or_else(|| LumeError::invalid("unknown fence"))?;
        if *state.signaled.lock() {
            return Ok(Status::Success);
        }
        let Some(submission) = state.submission.lock().clone() else {
            return Ok(Status::Timeout);
        };
        let devices = self.pools.devices.read();
        let device_state = devices
            .get(&state.device)
            .ok_or_else(|| LumeError::invalid("owning device was destroyed"))?;

        // `wgpu::Maintain` has no notion of a timeout; poll once for
        // completion and treat anything short of `Wait` as "not yet".
        let maintain = if timeout_ns == 0 {
            wgpu::Maintain::Poll
        } else {
            wgpu::Maintain::WaitForSubmissionIndex(submission)
        };
        let result = device_state.device.poll(maintain);
        if result.is_queue_empty() || timeout_ns != 0 {
            *state.signaled.lock() = true;
            Ok(Status::Success)
        } else {
            Ok(Status::Timeout)
        }
    }

    pub(crate) fn fence_reset_impl(&self, fence: FenceId) -> LumeResult<()> {
        let fences = self.pools.fences.read();
        let state = fences.get(&fence).ok_or_else(|| LumeError::invalid("unknown fence"))?;
        *state.signaled.lock() = false;
        *state.submission.lock() = None;
        Ok(())
    }

    pub(crate) fn fence_get_status_impl(&self, fence: FenceId) -> LumeResult<bool> {
        let fences = self.pools.fences.read();
        let state = fences.get(&fence).ok_or_else(|| LumeError::invalid("unknown fence"))?;
        if *state.signaled.lock() {
            return Ok(true);
        }
        let Some(submission) = state.submission.lock().clone() else {
            return Ok(false);
        };
        let devices = self.pools.devices.read();
        let device_state = devices
            .get(&state.device)
            .ok_or_else(|| LumeError::invalid("owning device was destroyed"))?;
        let result = device_state.device.poll(wgpu::Maintain::Poll);
        if result.is_queue_empty() {
            *state.signaled.lock() = true;
        }
        Ok(*state.signaled.lock())
    }

    pub(crate) fn create_semaphore_impl(
        &self,
        device: DeviceId,
        desc: &SemaphoreDescriptor,
    ) -> LumeResult<SemaphoreId> {
        self.pools.devices.read().get(&device).ok_or_else(|| LumeError::invalid("unknown device"))?;

        let id = SemaphoreId::alloc();
        self.pools.semaphores.write().insert(
            id,
            SemaphoreState {
                device,
                semaphore_type: desc.semaphore_type,
                value: Mutex::new(desc.initial_value),
                condvar: Condvar::new(),
            },
        );
        Ok(id)
    }

    pub(crate) fn destroy_semaphore_impl(&self, semaphore: SemaphoreId) {
        self.pools.semaphores.write().remove(&semaphore);
    }

    pub(crate) fn semaphore_signal_impl(&self, semaphore: SemaphoreId, value: u64) -> LumeResult<()> {
        let semaphores = self.pools.semaphores.read();
        let state = semaphores.get(&semaphore).ok_or_else(|| LumeError::invalid("unknown semaphore"))?;
        let mut current = state.value.lock();
        *current = value;
        state.condvar.notify_all();
        Ok(())
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
        let mut current = state.value.lock();
        if *current >= value {
            return Ok(Status::Success);
        }
        let timeout = Duration::from_nanos(timeout_ns);
        let result = state.condvar.wait_for(&mut current, timeout, |v| *v >= value);
        if result.timed_out() && *current < value {
            Ok(Status::Timeout)
        } else {
            Ok(Status::Success)
        }
    }

    /// Blocks the calling thread until `semaphore` has been signaled at
    /// least once since its last wait, used by `queue_submit_impl` to
    /// emulate a submission's wait-semaphore list. Unlike
    /// `semaphore_wait_impl` there is no target value: a `SubmitInfo` wait
    /// entry, binary or timeline, just needs "has fired".
    pub(crate) fn wait_for_semaphore_submission(&self, semaphore: SemaphoreId) -> LumeResult<()> {
        let semaphores = self.pools.semaphores.read();
        let state = semaphores.get(&semaphore).ok_or_else(|| LumeError::invalid("unknown semaphore"))?;
        let mut current = state.value.lock();
        if *current == 0 {
            state.condvar.wait(&mut current);
        }
        if state.semaphore_type == SemaphoreType::Binary {
            *current = 0;
        }
        Ok(())
    }
}
