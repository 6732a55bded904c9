//! BindGroupLayout and BindGroup (§3).

use crate::error::LumeResult;
use crate::ids::{BindGroupId, BindGroupLayoutId};
use crate::registry::Registry;

/// Stateless after creation; per §5's shared-resource policy it may be
/// referenced from any thread as long as the owning Device is alive.
pub struct BindGroupLayout {
    pub(crate) id: BindGroupLayoutId,
}

impl BindGroupLayout {
    pub fn id(&self) -> BindGroupLayoutId {
        self.id
    }
}

impl Drop for BindGroupLayout {
    fn drop(&mut self) {
        let registry = Registry::global();
        if let Ok(backend) = registry.lookup(self.id) {
            backend.destroy_bind_group_layout(self.id);
        }
        registry.unwrap(self.id);
    }
}

/// Keeps every resource it references alive (§3): drop order between a
/// `BindGroup` and the buffers/views/samplers it names is not enforced by
/// this wrapper, matching I3 being the caller's responsibility to uphold
/// through ordinary Rust ownership (the bind group borrows nothing; it only
/// stores handles).
pub struct BindGroup {
    pub(crate) id: BindGroupId,
}

impl BindGroup {
    pub fn id(&self) -> BindGroupId {
        self.id
    }
}

impl Drop for BindGroup {
    fn drop(&mut self) {
        let registry = Registry::global();
        if let Ok(backend) = registry.lookup(self.id) {
            backend.destroy_bind_group(self.id);
        }
        registry.unwrap(self.id);
    }
}
