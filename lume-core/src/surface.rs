//! Platform window surface (§3, §4.3).

use crate::ids::SurfaceId;
use crate::registry::Registry;

pub struct Surface {
    pub(crate) id: SurfaceId,
}

impl Surface {
    pub fn id(&self) -> SurfaceId {
        self.id
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        let registry = Registry::global();
        if let Ok(backend) = registry.lookup(self.id) {
            backend.destroy_surface(self.id);
        }
        registry.unwrap(self.id);
    }
}
