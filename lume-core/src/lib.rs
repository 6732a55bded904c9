//! Backend-agnostic front end: the Handle & Ownership Plane (§4.1), the
//! shared descriptor vocabulary (§3, §6), and the wrapper types
//! applications actually call. Pulls in no backend SDK; `lume-vulkan` and
//! `lume-webgpu` each implement [`backend::Backend`] against this crate.

pub mod adapter;
pub mod backend;
pub mod bind;
pub mod command;
pub mod device;
pub mod error;
pub mod format;
pub mod handle;
pub mod ids;
pub mod instance;
pub mod pass;
pub mod pipeline;
pub mod queue;
pub mod registry;
pub mod resource;
pub mod sync;
pub mod surface;
pub mod swapchain;
pub mod types;
pub mod util;

pub use adapter::Adapter;
pub use backend::{Backend, Command, EncoderState, InstanceDescriptor, SubmitInfo};
pub use bind::{BindGroup, BindGroupLayout};
pub use command::{CommandEncoder, ComputePassEncoder, RenderPassEncoder};
pub use device::Device;
pub use error::{LumeError, LumeResult, Status};
pub use format::{format_bytes_per_pixel, format_has_depth, format_has_stencil, TextureFormat};
pub use handle::Id;
pub use instance::Instance;
pub use pass::{Framebuffer, RenderPass};
pub use pipeline::{ComputePipeline, RenderPipeline};
pub use queue::Queue;
pub use registry::{BackendId, Registry};
pub use resource::{Buffer, QuerySet, Sampler, Shader, Texture, TextureView};
pub use surface::Surface;
pub use swapchain::{frames_in_flight, Swapchain};
pub use sync::{Fence, Semaphore};
pub use util::{align_down, align_up};
