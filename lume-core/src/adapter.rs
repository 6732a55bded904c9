//! Physical device handle (§3 `Adapter` row).

use crate::error::LumeResult;
use crate::ids::AdapterId;
use crate::registry::Registry;
use crate::types::AdapterInfo;

pub struct Adapter {
    pub(crate) id: AdapterId,
}

impl Adapter {
    pub fn id(&self) -> AdapterId {
        self.id
    }

    pub fn info(&self) -> LumeResult<AdapterInfo> {
        Registry::global().lookup(self.id)?.adapter_info(self.id)
    }

    pub fn name(&self) -> LumeResult<String> {
        self.info().map(|info| info.name)
    }

    pub fn backend(&self) -> LumeResult<&'static str> {
        Ok(Registry::global().lookup(self.id)?.name())
    }

    /// Spawn a logical `Device` and its default `Queue` from this adapter.
    /// Multiple devices may spawn from one adapter (§3).
    pub fn request_device(&self) -> LumeResult<(super::device::Device, super::queue::Queue)> {
        let (backend_id, backend) = Registry::global().lookup_with_id(self.id)?;
        let (device_id, queue_id) = backend.request_device(self.id)?;
        Registry::global().wrap(device_id, backend_id);
        Registry::global().wrap(queue_id, backend_id);
        Ok((
            super::device::Device { id: device_id },
            super::queue::Queue { id: queue_id },
        ))
    }
}
