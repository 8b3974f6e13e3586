//! Vulkan abstraction layer (Render Hardware Interface).
//!
//! Safe wrappers over `ash` for everything the viewer touches:
//! - Instance, validation messenger and device selection
//! - Swapchain negotiation and the resize protocol
//! - Command pools, buffers and one-shot submissions
//! - Buffers, images, textures and samplers
//! - Render pass, pipeline and descriptor sets
//! - Semaphores and fences

mod error;

pub mod buffer;
pub mod command;
pub mod descriptor;
pub mod device;
pub mod image;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod render_pass;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod texture;
pub mod vertex;

pub use error::{RhiError, RhiResult};

// Re-export ash types that users might need
pub use ash::vk;
