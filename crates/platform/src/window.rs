//! Window management using winit.
//!
//! Creates the viewer window, the Vulkan surface for it, and answers the
//! swapchain's size queries during the resize protocol.

use std::ffi::{CStr, c_char};
use std::sync::Arc;
use std::time::Duration;

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window as WinitWindow, WindowAttributes};

use vkpbr_core::{Error, Result, ViewerConfig};
use vkpbr_rhi::instance::Instance;
use vkpbr_rhi::swapchain::SurfaceExtentSource;
use vkpbr_rhi::{RhiError, RhiResult};

/// Sleep between size polls while the window has zero area.
const MINIMIZED_POLL_INTERVAL: Duration = Duration::from_millis(16);

/// RAII wrapper for a Vulkan surface.
///
/// The instance that created it must outlive it.
pub struct Surface {
    handle: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,
}

impl Surface {
    #[inline]
    pub fn handle(&self) -> vk::SurfaceKHR {
        self.handle
    }

    #[inline]
    pub fn loader(&self) -> &ash::khr::surface::Instance {
        &self.surface_loader
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        // SAFETY: created by ash_window::create_surface on the loader's instance,
        // and destroyed only here.
        unsafe {
            self.surface_loader.destroy_surface(self.handle, None);
        }
        tracing::debug!("Vulkan surface destroyed");
    }
}

/// The viewer window.
pub struct Window {
    window: Arc<WinitWindow>,
}

impl Window {
    /// Creates the window described by `config`.
    pub fn new(event_loop: &ActiveEventLoop, config: &ViewerConfig) -> Result<Self> {
        let attrs = WindowAttributes::default()
            .with_title(config.title.as_str())
            .with_inner_size(PhysicalSize::new(config.width, config.height))
            .with_resizable(config.resizable);

        let window = event_loop
            .create_window(attrs)
            .map_err(|e| Error::Window(e.to_string()))?;

        tracing::info!(
            "Window created: {}x{} \"{}\"",
            config.width,
            config.height,
            config.title
        );

        Ok(Self {
            window: Arc::new(window),
        })
    }

    /// Current drawable size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    /// Zero-area windows (minimized) are not rendered.
    pub fn is_minimized(&self) -> bool {
        let (width, height) = self.size();
        width == 0 || height == 0
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    /// Instance extensions needed to create a surface for this window.
    pub fn required_extensions(&self) -> RhiResult<Vec<*const c_char>> {
        let display_handle = self
            .window
            .display_handle()
            .map_err(|e| RhiError::Surface(format!("Failed to get display handle: {}", e)))?;

        let extensions = ash_window::enumerate_required_extensions(display_handle.as_raw())?;

        tracing::debug!(
            "Required Vulkan extensions for surface: {:?}",
            extensions
                .iter()
                // SAFETY: ash_window returns pointers to static, null-terminated names
                .map(|&ext| unsafe { CStr::from_ptr(ext) })
                .collect::<Vec<_>>()
        );

        Ok(extensions.to_vec())
    }

    /// Creates a Vulkan surface for this window.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::Surface`] if the window handles are unavailable or
    /// the platform surface call fails.
    pub fn create_surface(&self, instance: &Instance) -> RhiResult<Surface> {
        let display_handle = self
            .window
            .display_handle()
            .map_err(|e| RhiError::Surface(format!("Failed to get display handle: {}", e)))?;

        let window_handle = self
            .window
            .window_handle()
            .map_err(|e| RhiError::Surface(format!("Failed to get window handle: {}", e)))?;

        // SAFETY: entry and instance are alive; the handles come from a live
        // winit window. Surface::drop destroys the result.
        let handle = unsafe {
            ash_window::create_surface(
                instance.entry(),
                instance.handle(),
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| RhiError::Surface(format!("Failed to create Vulkan surface: {}", e)))?
        };

        let surface_loader = ash::khr::surface::Instance::new(instance.entry(), instance.handle());

        tracing::info!("Vulkan surface created");

        Ok(Surface {
            handle,
            surface_loader,
        })
    }
}

/// Size polling for the resize protocol.
///
/// `wait_events` only sleeps; it cannot pump the winit event loop from
/// inside a handler. On backends that update `inner_size` solely from
/// dispatched events (Wayland), a zero size never changes while the wait
/// loop runs. Callers must therefore not draw while [`Window::is_minimized`]
/// is true, so the swapchain is only recreated for a non-zero size.
impl SurfaceExtentSource for Window {
    fn framebuffer_size(&self) -> (u32, u32) {
        self.size()
    }

    fn wait_events(&self) {
        std::thread::sleep(MINIMIZED_POLL_INTERVAL);
    }
}
