//! Platform layer for the viewer.
//!
//! - Window creation via winit
//! - Vulkan surface creation via ash-window
//! - Framebuffer size queries for the swapchain resize protocol

mod window;

pub use window::{Surface, Window};

// Re-export winit types that users might need
pub use winit::event::WindowEvent;
pub use winit::event_loop::{ActiveEventLoop, EventLoop};
