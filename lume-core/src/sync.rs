//! Fence and Semaphore (§3, §4.2.4).

use crate::error::{LumeResult, Status};
use crate::ids::{FenceId, SemaphoreId};
use crate::registry::Registry;

/// CPU <-> GPU synchronization. Native on the explicit backend; emulated on
/// the implicit backend via a queue-work-done future recorded at submit
/// time (§4.2.4).
pub struct Fence {
    pub(crate) id: FenceId,
}

impl Fence {
    pub fn id(&self) -> FenceId {
        self.id
    }

    /// One of the three operations allowed to block (§5). Returns
    /// `Status::Timeout` (not an error) if `timeout_ns` elapses first.
    pub fn wait(&self, timeout_ns: u64) -> LumeResult<Status> {
        Registry::global().lookup(self.id)?.fence_wait(self.id, timeout_ns)
    }

    pub fn reset(&self) -> LumeResult<()> {
        Registry::global().lookup(self.id)?.fence_reset(self.id)
    }

    pub fn is_signaled(&self) -> LumeResult<bool> {
        Registry::global().lookup(self.id)?.fence_get_status(self.id)
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        let registry = Registry::global();
        if let Ok(backend) = registry.lookup(self.id) {
            backend.destroy_fence(self.id);
        }
        registry.unwrap(self.id);
    }
}

/// GPU <-> GPU (and, for timeline semaphores, CPU <-> GPU) synchronization.
/// Binary semaphores are a documented no-op on the implicit backend
/// (§4.2.4); timeline semaphores are emulated there via the same
/// queue-work-done future mechanism as `Fence`.
pub struct Semaphore {
    pub(crate) id: SemaphoreId,
}

impl Semaphore {
    pub fn id(&self) -> SemaphoreId {
        self.id
    }

    pub fn signal(&self, value: u64) -> LumeResult<()> {
        Registry::global().lookup(self.id)?.semaphore_signal(self.id, value)
    }

    pub fn wait(&self, value: u64, timeout_ns: u64) -> LumeResult<Status> {
        Registry::global()
            .lookup(self.id)?
            .semaphore_wait(self.id, value, timeout_ns)
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        let registry = Registry::global();
        if let Ok(backend) = registry.lookup(self.id) {
            backend.destroy_semaphore(self.id);
        }
        registry.unwrap(self.id);
    }
}
