//! Buffer, Texture, TextureView, Sampler, Shader, QuerySet (§3).

use crate::error::LumeResult;
use crate::ids::{BufferId, QuerySetId, SamplerId, ShaderId, TextureId, TextureViewId};
use crate::registry::Registry;
use crate::types::{BufferInfo, MapMode, TextureLayout, TextureViewDescriptor};

pub struct Buffer {
    pub(crate) id: BufferId,
}

impl Buffer {
    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn info(&self) -> LumeResult<BufferInfo> {
        Registry::global().lookup(self.id)?.buffer_info(self.id)
    }

    /// Map `[offset, offset + size)` for CPU access. Caller owns the
    /// returned pointer exclusively until `unmap` (§5 shared-resource
    /// policy).
    pub fn map_async(&self, mode: MapMode, offset: u64, size: u64) -> LumeResult<*mut u8> {
        Registry::global()
            .lookup(self.id)?
            .buffer_map_async(self.id, mode, offset, size)
    }

    pub fn unmap(&self) -> LumeResult<()> {
        Registry::global().lookup(self.id)?.buffer_unmap(self.id)
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        let registry = Registry::global();
        if let Ok(backend) = registry.lookup(self.id) {
            backend.destroy_buffer(self.id);
        }
        registry.unwrap(self.id);
    }
}

pub struct Texture {
    pub(crate) id: TextureId,
}

impl Texture {
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Logical layout tracked uniformly across both backends (I6).
    pub fn layout(&self) -> LumeResult<TextureLayout> {
        Registry::global().lookup(self.id)?.texture_layout(self.id)
    }

    /// P3: succeeds iff the requested mip/layer ranges fit within the
    /// texture's own counts; otherwise `InvalidArgument`.
    pub fn create_view(&self, desc: &TextureViewDescriptor) -> LumeResult<TextureView> {
        let (backend_id, backend) = Registry::global().lookup_with_id(self.id)?;
        let id = backend.create_texture_view(self.id, desc)?;
        Registry::global().wrap(id, backend_id);
        Ok(TextureView { id })
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        let registry = Registry::global();
        if let Ok(backend) = registry.lookup(self.id) {
            backend.destroy_texture(self.id);
        }
        registry.unwrap(self.id);
    }
}

pub struct TextureView {
    pub(crate) id: TextureViewId,
}

impl TextureView {
    pub fn id(&self) -> TextureViewId {
        self.id
    }
}

impl Drop for TextureView {
    fn drop(&mut self) {
        let registry = Registry::global();
        if let Ok(backend) = registry.lookup(self.id) {
            backend.destroy_texture_view(self.id);
        }
        registry.unwrap(self.id);
    }
}

pub struct Sampler {
    pub(crate) id: SamplerId,
}

impl Sampler {
    pub fn id(&self) -> SamplerId {
        self.id
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        let registry = Registry::global();
        if let Ok(backend) = registry.lookup(self.id) {
            backend.destroy_sampler(self.id);
        }
        registry.unwrap(self.id);
    }
}

pub struct Shader {
    pub(crate) id: ShaderId,
}

impl Shader {
    pub fn id(&self) -> ShaderId {
        self.id
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        let registry = Registry::global();
        if let Ok(backend) = registry.lookup(self.id) {
            backend.destroy_shader(self.id);
        }
        registry.unwrap(self.id);
    }
}

pub struct QuerySet {
    pub(crate) id: QuerySetId,
}

impl QuerySet {
    pub fn id(&self) -> QuerySetId {
        self.id
    }
}

impl Drop for QuerySet {
    fn drop(&mut self) {
        let registry = Registry::global();
        if let Ok(backend) = registry.lookup(self.id) {
            backend.destroy_query_set(self.id);
        }
        registry.unwrap(self.id);
    }
}
