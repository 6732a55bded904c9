//! Submission point (§3 `Queue` row, §4.2.4's submit translation).

use crate::backend::SubmitInfo;
use crate::error::LumeResult;
use crate::ids::QueueId;
use crate::registry::Registry;
use crate::types::Extent3d;

pub struct Queue {
    pub(crate) id: QueueId,
}

impl Queue {
    pub fn id(&self) -> QueueId {
        self.id
    }

    pub fn wait_idle(&self) -> LumeResult<()> {
        Registry::global().lookup(self.id)?.queue_wait_idle(self.id)
    }

    pub fn write_buffer(
        &self,
        buffer: &super::resource::Buffer,
        offset: u64,
        bytes: &[u8],
    ) -> LumeResult<()> {
        Registry::global()
            .lookup(self.id)?
            .queue_write_buffer(self.id, buffer.id, offset, bytes)
    }

    pub fn write_texture(
        &self,
        texture: &super::resource::Texture,
        mip_level: u32,
        origin: (u32, u32, u32),
        bytes: &[u8],
        bytes_per_row: u32,
        extent: Extent3d,
    ) -> LumeResult<()> {
        Registry::global().lookup(self.id)?.queue_write_texture(
            self.id,
            texture.id,
            mip_level,
            origin,
            bytes,
            bytes_per_row,
            extent,
        )
    }

    /// The focal translation of §4.2.4: submits every encoder in `submit`,
    /// in array order, optionally signaling a fence once all of them have
    /// completed.
    pub fn submit(&self, submit: SubmitInfo) -> LumeResult<()> {
        Registry::global().lookup(self.id)?.queue_submit(self.id, submit)
    }
}
