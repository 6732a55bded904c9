//! RenderPipeline and ComputePipeline (§3).

use crate::ids::{ComputePipelineId, RenderPipelineId};
use crate::registry::Registry;

pub struct RenderPipeline {
    pub(crate) id: RenderPipelineId,
}

impl RenderPipeline {
    pub fn id(&self) -> RenderPipelineId {
        self.id
    }
}

impl Drop for RenderPipeline {
    fn drop(&mut self) {
        let registry = Registry::global();
        if let Ok(backend) = registry.lookup(self.id) {
            backend.destroy_render_pipeline(self.id);
        }
        registry.unwrap(self.id);
    }
}

pub struct ComputePipeline {
    pub(crate) id: ComputePipelineId,
}

impl ComputePipeline {
    pub fn id(&self) -> ComputePipelineId {
        self.id
    }
}

impl Drop for ComputePipeline {
    fn drop(&mut self) {
        let registry = Registry::global();
        if let Ok(backend) = registry.lookup(self.id) {
            backend.destroy_compute_pipeline(self.id);
        }
        registry.unwrap(self.id);
    }
}
