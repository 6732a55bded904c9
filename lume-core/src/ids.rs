//! Marker types and handle aliases for every public entity in §3.
//!
//! Each marker is an uninhabited zero-sized type used only as `Id<T>`'s type
//! parameter; it never appears in a value position. Keeping markers in one
//! module makes the full entity roster easy to audit against the data model.

use crate::handle::Id;

pub struct InstanceMarker;
pub struct AdapterMarker;
pub struct DeviceMarker;
pub struct QueueMarker;
pub struct BufferMarker;
pub struct TextureMarker;
pub struct TextureViewMarker;
pub struct SamplerMarker;
pub struct ShaderMarker;
pub struct BindGroupLayoutMarker;
pub struct BindGroupMarker;
pub struct RenderPassMarker;
pub struct FramebufferMarker;
pub struct RenderPipelineMarker;
pub struct ComputePipelineMarker;
pub struct CommandEncoderMarker;
pub struct FenceMarker;
pub struct SemaphoreMarker;
pub struct QuerySetMarker;
pub struct SurfaceMarker;
pub struct SwapchainMarker;

pub type InstanceId = Id<InstanceMarker>;
pub type AdapterId = Id<AdapterMarker>;
pub type DeviceId = Id<DeviceMarker>;
pub type QueueId = Id<QueueMarker>;
pub type BufferId = Id<BufferMarker>;
pub type TextureId = Id<TextureMarker>;
pub type TextureViewId = Id<TextureViewMarker>;
pub type SamplerId = Id<SamplerMarker>;
pub type ShaderId = Id<ShaderMarker>;
pub type BindGroupLayoutId = Id<BindGroupLayoutMarker>;
pub type BindGroupId = Id<BindGroupMarker>;
pub type RenderPassId = Id<RenderPassMarker>;
pub type FramebufferId = Id<FramebufferMarker>;
pub type RenderPipelineId = Id<RenderPipelineMarker>;
pub type ComputePipelineId = Id<ComputePipelineMarker>;
pub type CommandEncoderId = Id<CommandEncoderMarker>;
pub type FenceId = Id<FenceMarker>;
pub type SemaphoreId = Id<SemaphoreMarker>;
pub type QuerySetId = Id<QuerySetMarker>;
pub type SurfaceId = Id<SurfaceMarker>;
pub type SwapchainId = Id<SwapchainMarker>;
