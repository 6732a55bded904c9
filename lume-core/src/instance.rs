//! Root lifetime object (§3 `Instance` row).
//!
//! Bootstrapping is the one place the handle registry cannot yet help: no
//! handle exists to dispatch through until an `Instance` has been created,
//! so callers hand in an already-constructed `Arc<dyn Backend>` (obtained
//! from e.g. `lume_vulkan::backend()` or `lume_webgpu::backend()`) and
//! `Instance::new` registers it with the registry itself, exactly the way
//! `Manager.cpp`'s `loadBackend` is invoked once up front in the original.

use crate::backend::Backend;
use crate::error::LumeResult;
use crate::ids::InstanceId;
use crate::registry::{BackendId, Registry};
use crate::types::PowerPreference;
use std::sync::Arc;

pub use crate::backend::InstanceDescriptor as Descriptor;

/// Root handle owning one backend's load reference. Dropping the last
/// `Instance` for a given backend id unloads it (refcounted, §4.1).
pub struct Instance {
    pub(crate) id: InstanceId,
    pub(crate) backend_id: BackendId,
}

impl Instance {
    /// Load `backend`, create an instance through it, and register the
    /// instance handle. `desc.application_name` and the debug callback are
    /// forwarded verbatim to the backend.
    pub fn new(backend: Arc<dyn Backend>, desc: Descriptor) -> LumeResult<Self> {
        let registry = Registry::global();
        let backend_id = registry.reserve_backend_id();
        registry.load_backend(backend_id, backend.clone());
        log::info!(
            "loading backend \"{}\" for instance \"{}\"",
            backend.name(),
            desc.application_name
        );
        let id = match backend.create_instance(&desc) {
            Ok(id) => id,
            Err(err) => {
                registry.unload_backend(backend_id);
                return Err(err);
            }
        };
        registry.wrap(id, backend_id);
        Ok(Instance { id, backend_id })
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Every adapter the backend can currently see (supplements
    /// `request_adapter`, useful on multi-GPU machines).
    pub fn enumerate_adapters(&self) -> LumeResult<Vec<super::adapter::Adapter>> {
        let backend = Registry::global().lookup(self.id)?;
        let adapter_ids = backend.enumerate_adapters(self.id)?;
        for adapter_id in &adapter_ids {
            Registry::global().wrap(*adapter_id, self.backend_id);
        }
        Ok(adapter_ids
            .into_iter()
            .map(|id| super::adapter::Adapter { id })
            .collect())
    }

    pub fn request_adapter(
        &self,
        power_preference: PowerPreference,
    ) -> LumeResult<super::adapter::Adapter> {
        let backend = Registry::global().lookup(self.id)?;
        let id = backend.request_adapter(self.id, power_preference)?;
        Registry::global().wrap(id, self.backend_id);
        Ok(super::adapter::Adapter { id })
    }

    /// Turn a platform window handle into a drawable surface (§4.3).
    pub fn create_surface(
        &self,
        window: &crate::types::PlatformWindowHandle,
    ) -> LumeResult<super::surface::Surface> {
        let backend = Registry::global().lookup(self.id)?;
        let id = backend.create_surface(self.id, window)?;
        Registry::global().wrap(id, self.backend_id);
        Ok(super::surface::Surface { id })
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        let registry = Registry::global();
        if let Ok(backend) = registry.lookup(self.id) {
            backend.destroy_instance(self.id);
        }
        registry.unwrap(self.id);
        registry.unload_backend(self.backend_id);
    }
}
