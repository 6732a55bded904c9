//! RenderPass and Framebuffer (§3, §4.2.2).

use crate::ids::{FramebufferId, RenderPassId};
use crate::registry::Registry;

/// Reusable across frames. On the implicit backend this is an empty
/// reified handle (§4.2.2): no native render-pass object exists, but the
/// handle still satisfies I4's scoping requirements uniformly.
pub struct RenderPass {
    pub(crate) id: RenderPassId,
}

impl RenderPass {
    pub fn id(&self) -> RenderPassId {
        self.id
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        let registry = Registry::global();
        if let Ok(backend) = registry.lookup(self.id) {
            backend.destroy_render_pass(self.id);
        }
        registry.unwrap(self.id);
    }
}

/// Lifetime must be `<=` every attached view's lifetime (I3); this wrapper
/// does not borrow the views, so upholding that ordering is the caller's
/// responsibility, same as `BindGroup`.
pub struct Framebuffer {
    pub(crate) id: FramebufferId,
}

impl Framebuffer {
    pub fn id(&self) -> FramebufferId {
        self.id
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        let registry = Registry::global();
        if let Ok(backend) = registry.lookup(self.id) {
            backend.destroy_framebuffer(self.id);
        }
        registry.unwrap(self.id);
    }
}
