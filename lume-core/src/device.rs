//! Logical device: root of resource ownership (§3 `Device` row).

use crate::error::LumeResult;
use crate::ids::DeviceId;
use crate::registry::Registry;
use crate::types::{
    BindGroupDescriptor, BindGroupLayoutDescriptor, BufferDescriptor, ComputePipelineDescriptor,
    DeviceLimits, FenceDescriptor, FramebufferDescriptor, QuerySetDescriptor,
    RenderPassDescriptor, RenderPipelineDescriptor, SamplerDescriptor, SemaphoreDescriptor,
    ShaderDescriptor, SwapchainRequest, TextureDescriptor,
};

pub struct Device {
    pub(crate) id: DeviceId,
}

impl Device {
    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn limits(&self) -> LumeResult<DeviceLimits> {
        Registry::global().lookup(self.id)?.device_limits(self.id)
    }

    /// Blocks until every prior submission to every queue of this device has
    /// drained (§5, one of the three suspension points).
    pub fn wait_idle(&self) -> LumeResult<()> {
        Registry::global().lookup(self.id)?.device_wait_idle(self.id)
    }

    pub fn create_buffer(&self, desc: &BufferDescriptor) -> LumeResult<super::resource::Buffer> {
        let (backend_id, backend) = Registry::global().lookup_with_id(self.id)?;
        let id = backend.create_buffer(self.id, desc)?;
        Registry::global().wrap(id, backend_id);
        Ok(super::resource::Buffer { id })
    }

    pub fn create_texture(
        &self,
        desc: &TextureDescriptor,
    ) -> LumeResult<super::resource::Texture> {
        let (backend_id, backend) = Registry::global().lookup_with_id(self.id)?;
        let id = backend.create_texture(self.id, desc)?;
        Registry::global().wrap(id, backend_id);
        Ok(super::resource::Texture { id })
    }

    pub fn create_sampler(
        &self,
        desc: &SamplerDescriptor,
    ) -> LumeResult<super::resource::Sampler> {
        let (backend_id, backend) = Registry::global().lookup_with_id(self.id)?;
        let id = backend.create_sampler(self.id, desc)?;
        Registry::global().wrap(id, backend_id);
        Ok(super::resource::Sampler { id })
    }

    pub fn create_shader(&self, desc: &ShaderDescriptor) -> LumeResult<super::resource::Shader> {
        let (backend_id, backend) = Registry::global().lookup_with_id(self.id)?;
        let id = backend.create_shader(self.id, desc)?;
        Registry::global().wrap(id, backend_id);
        Ok(super::resource::Shader { id })
    }

    pub fn create_query_set(
        &self,
        desc: &QuerySetDescriptor,
    ) -> LumeResult<super::resource::QuerySet> {
        let (backend_id, backend) = Registry::global().lookup_with_id(self.id)?;
        let id = backend.create_query_set(self.id, desc)?;
        Registry::global().wrap(id, backend_id);
        Ok(super::resource::QuerySet { id })
    }

    pub fn create_bind_group_layout(
        &self,
        desc: &BindGroupLayoutDescriptor,
    ) -> LumeResult<super::bind::BindGroupLayout> {
        let (backend_id, backend) = Registry::global().lookup_with_id(self.id)?;
        let id = backend.create_bind_group_layout(self.id, desc)?;
        Registry::global().wrap(id, backend_id);
        Ok(super::bind::BindGroupLayout { id })
    }

    pub fn create_bind_group(
        &self,
        desc: &BindGroupDescriptor,
    ) -> LumeResult<super::bind::BindGroup> {
        let (backend_id, backend) = Registry::global().lookup_with_id(self.id)?;
        let id = backend.create_bind_group(self.id, desc)?;
        Registry::global().wrap(id, backend_id);
        Ok(super::bind::BindGroup { id })
    }

    pub fn create_render_pass(
        &self,
        desc: &RenderPassDescriptor,
    ) -> LumeResult<super::pass::RenderPass> {
        let (backend_id, backend) = Registry::global().lookup_with_id(self.id)?;
        let id = backend.create_render_pass(self.id, desc)?;
        Registry::global().wrap(id, backend_id);
        Ok(super::pass::RenderPass { id })
    }

    pub fn create_framebuffer(
        &self,
        desc: &FramebufferDescriptor,
    ) -> LumeResult<super::pass::Framebuffer> {
        let (backend_id, backend) = Registry::global().lookup_with_id(self.id)?;
        let id = backend.create_framebuffer(self.id, desc)?;
        Registry::global().wrap(id, backend_id);
        Ok(super::pass::Framebuffer { id })
    }

    pub fn create_render_pipeline(
        &self,
        desc: &RenderPipelineDescriptor,
    ) -> LumeResult<super::pipeline::RenderPipeline> {
        let (backend_id, backend) = Registry::global().lookup_with_id(self.id)?;
        let id = backend.create_render_pipeline(self.id, desc)?;
        Registry::global().wrap(id, backend_id);
        Ok(super::pipeline::RenderPipeline { id })
    }

    pub fn create_compute_pipeline(
        &self,
        desc: &ComputePipelineDescriptor,
    ) -> LumeResult<super::pipeline::ComputePipeline> {
        let (backend_id, backend) = Registry::global().lookup_with_id(self.id)?;
        let id = backend.create_compute_pipeline(self.id, desc)?;
        Registry::global().wrap(id, backend_id);
        Ok(super::pipeline::ComputePipeline { id })
    }

    pub fn create_command_encoder(&self) -> LumeResult<super::command::CommandEncoder> {
        let (backend_id, backend) = Registry::global().lookup_with_id(self.id)?;
        let id = backend.create_command_encoder(self.id)?;
        Registry::global().wrap(id, backend_id);
        Ok(super::command::CommandEncoder::new(id))
    }

    pub fn create_fence(&self, desc: &FenceDescriptor) -> LumeResult<super::sync::Fence> {
        let (backend_id, backend) = Registry::global().lookup_with_id(self.id)?;
        let id = backend.create_fence(self.id, desc)?;
        Registry::global().wrap(id, backend_id);
        Ok(super::sync::Fence { id })
    }

    pub fn create_semaphore(
        &self,
        desc: &SemaphoreDescriptor,
    ) -> LumeResult<super::sync::Semaphore> {
        let (backend_id, backend) = Registry::global().lookup_with_id(self.id)?;
        let id = backend.create_semaphore(self.id, desc)?;
        Registry::global().wrap(id, backend_id);
        Ok(super::sync::Semaphore { id })
    }

    pub fn create_swapchain(
        &self,
        surface: &super::surface::Surface,
        request: &SwapchainRequest,
    ) -> LumeResult<super::swapchain::Swapchain> {
        let (backend_id, backend) = Registry::global().lookup_with_id(self.id)?;
        let (id, info) = backend.create_swapchain(self.id, surface.id, request)?;
        Registry::global().wrap(id, backend_id);
        Ok(super::swapchain::Swapchain::new(id, info))
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        let registry = Registry::global();
        if let Ok(backend) = registry.lookup(self.id) {
            backend.destroy_device(self.id);
        }
        registry.unwrap(self.id);
    }
}
