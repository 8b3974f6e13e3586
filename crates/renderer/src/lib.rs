//! Frame orchestration for the viewer.
//!
//! This crate ties the RHI pieces into a running frame loop:
//! - The per-frame sequencing, independent of the GPU
//! - Frame slots and their fence/semaphore protocol
//! - Per-slot uniform buffers
//! - Descriptor sets binding uniforms and material textures
//! - The [`Renderer`] that acquires, records, submits and presents

pub mod assets;
pub mod descriptors;
mod error;
pub mod frame_loop;
pub mod frame_manager;
pub mod per_frame;
pub mod renderer;
pub mod uniforms;

pub use error::{RendererError, RendererResult};
pub use frame_loop::{FrameBackend, FrameCursor, FrameLoop, FrameOutcome};
pub use frame_manager::FrameManager;
pub use per_frame::PerFrame;
pub use renderer::Renderer;
pub use uniforms::UniformBufferObject;
