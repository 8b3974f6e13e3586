//! Swapchain management.
//!
//! The [`Swapchain`] owns everything derived from the presentable images:
//! the swapchain handle, one color view per image, the depth image shared
//! by all framebuffers, and one framebuffer per image. These are built in
//! four steps and torn down together by [`Swapchain::cleanup`]:
//!
//! 1. [`Swapchain::create`]: negotiate format, present mode, extent and
//!    image count, then create the handle and fetch its images.
//! 2. [`Swapchain::create_image_views`]
//! 3. [`Swapchain::create_depth_resources`]
//! 4. [`Swapchain::create_framebuffers`]
//!
//! # Resize
//!
//! When acquire or present report a stale swapchain, or the window was
//! resized, call [`Swapchain::recreate`]. It waits for the device to go
//! idle, cleans up, polls the [`SurfaceExtentSource`] until the window has a
//! non-zero size (a minimized window reports 0x0), and repeats steps 1-4.

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info, warn};

use crate::command::CommandPool;
use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::image::{Image, ImageDesc};
use crate::instance::Instance;
use crate::physical_device::QueueFamilies;
use crate::render_pass::RenderPass;

/// Depth formats tried in priority order.
pub const DEPTH_FORMAT_CANDIDATES: [vk::Format; 3] = [
    vk::Format::D32_SFLOAT,
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D24_UNORM_S8_UINT,
];

/// Window-side collaborator of the resize protocol.
pub trait SurfaceExtentSource {
    /// Current drawable size in physical pixels.
    fn framebuffer_size(&self) -> (u32, u32);

    /// Blocks until the window system may have a new size to report.
    fn wait_events(&self);
}

/// Polls `source` until it reports a non-zero area.
pub fn wait_for_nonzero_extent<S: SurfaceExtentSource + ?Sized>(source: &S) -> vk::Extent2D {
    let (mut width, mut height) = source.framebuffer_size();
    if width == 0 || height == 0 {
        debug!("Surface has zero area, waiting for it to be restored");
    }
    while width == 0 || height == 0 {
        source.wait_events();
        (width, height) = source.framebuffer_size();
    }
    vk::Extent2D { width, height }
}

/// Swapchain surface support details.
#[derive(Debug, Clone)]
pub struct SwapchainSupportDetails {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupportDetails {
    pub fn query(
        surface_loader: &ash::khr::surface::Instance,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> RhiResult<Self> {
        let capabilities = unsafe {
            surface_loader.get_physical_device_surface_capabilities(physical_device, surface)?
        };

        let formats = unsafe {
            surface_loader.get_physical_device_surface_formats(physical_device, surface)?
        };

        let present_modes = unsafe {
            surface_loader.get_physical_device_surface_present_modes(physical_device, surface)?
        };

        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }

    /// At least one format and one present mode.
    #[inline]
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// Outcome of the surface negotiation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapchainConfig {
    pub surface_format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub image_count: u32,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
}

impl SwapchainConfig {
    /// Picks swapchain parameters from `support` and the window's current
    /// framebuffer size.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::UnsupportedFormat`] if the surface reports no
    /// formats or present modes.
    pub fn negotiate(
        support: &SwapchainSupportDetails,
        framebuffer_size: vk::Extent2D,
    ) -> RhiResult<Self> {
        if !support.is_adequate() {
            return Err(RhiError::UnsupportedFormat(
                "surface reports no formats or present modes".to_string(),
            ));
        }

        Ok(Self {
            surface_format: choose_surface_format(&support.formats),
            present_mode: choose_present_mode(&support.present_modes),
            extent: choose_extent(&support.capabilities, framebuffer_size),
            image_count: determine_image_count(&support.capabilities),
            pre_transform: support.capabilities.current_transform,
        })
    }
}

/// Result of [`Swapchain::acquire_next_image`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The image can be rendered to. `suboptimal` asks for a recreate after
    /// this frame is presented.
    Ready { image_index: u32, suboptimal: bool },
    /// The swapchain no longer matches the surface and must be recreated
    /// before anything is rendered.
    OutOfDate,
}

/// Result of [`Swapchain::present`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentOutcome {
    Presented,
    /// Out of date or suboptimal.
    NeedsRecreate,
}

/// Swapchain and every resource sized to it.
pub struct Swapchain {
    device: Arc<Device>,
    surface_loader: ash::khr::surface::Instance,
    swapchain_loader: ash::khr::swapchain::Device,
    surface: vk::SurfaceKHR,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    depth: Option<Image>,
    framebuffers: Vec<vk::Framebuffer>,
    config: SwapchainConfig,
}

impl Swapchain {
    /// Negotiates surface parameters and creates the swapchain handle.
    ///
    /// Image views, depth resources and framebuffers are created by the
    /// following steps.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::Creation`] if `vkCreateSwapchainKHR` fails.
    pub fn create(
        instance: &Instance,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        framebuffer_size: vk::Extent2D,
    ) -> RhiResult<Self> {
        let surface_loader = ash::khr::surface::Instance::new(instance.entry(), instance.handle());
        let swapchain_loader = ash::khr::swapchain::Device::new(instance.handle(), device.handle());

        let mut this = Self {
            device,
            surface_loader,
            swapchain_loader,
            surface,
            swapchain: vk::SwapchainKHR::null(),
            images: Vec::new(),
            image_views: Vec::new(),
            depth: None,
            framebuffers: Vec::new(),
            config: SwapchainConfig {
                surface_format: vk::SurfaceFormatKHR::default(),
                present_mode: vk::PresentModeKHR::FIFO,
                extent: framebuffer_size,
                image_count: 0,
                pre_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
            },
        };
        this.create_swapchain(framebuffer_size)?;
        Ok(this)
    }

    fn create_swapchain(&mut self, framebuffer_size: vk::Extent2D) -> RhiResult<()> {
        let support = SwapchainSupportDetails::query(
            &self.surface_loader,
            self.device.physical_device(),
            self.surface,
        )?;
        let config = SwapchainConfig::negotiate(&support, framebuffer_size)?;

        info!(
            "Creating swapchain: {}x{}, format {:?}, color space {:?}, present mode {:?}, {} images",
            config.extent.width,
            config.extent.height,
            config.surface_format.format,
            config.surface_format.color_space,
            config.present_mode,
            config.image_count
        );

        let (sharing_mode, family_indices) = sharing_for(self.device.queue_families());

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(self.surface)
            .min_image_count(config.image_count)
            .image_format(config.surface_format.format)
            .image_color_space(config.surface_format.color_space)
            .image_extent(config.extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(&family_indices)
            .pre_transform(config.pre_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(config.present_mode)
            .clipped(true)
            .old_swapchain(vk::SwapchainKHR::null());

        self.swapchain = unsafe {
            self.swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(RhiError::creation("swapchain"))?
        };
        self.images = unsafe { self.swapchain_loader.get_swapchain_images(self.swapchain)? };
        self.config = config;

        info!("Swapchain created with {} images", self.images.len());
        Ok(())
    }

    /// One 2D color view per swapchain image.
    pub fn create_image_views(&mut self) -> RhiResult<()> {
        self.image_views.reserve(self.images.len());

        for &image in &self.images {
            let create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(self.config.surface_format.format)
                .components(vk::ComponentMapping::default())
                .subresource_range(crate::image::subresource_range(
                    vk::ImageAspectFlags::COLOR,
                ));

            let view = unsafe {
                self.device
                    .handle()
                    .create_image_view(&create_info, None)
                    .map_err(RhiError::creation("swapchain image view"))?
            };
            self.image_views.push(view);
        }

        debug!("Created {} image views", self.image_views.len());
        Ok(())
    }

    /// Allocates the depth image shared by every framebuffer and moves it to
    /// `DEPTH_STENCIL_ATTACHMENT_OPTIMAL` once.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::UnsupportedFormat`] if no candidate depth format
    /// is usable as an optimal-tiling depth attachment.
    pub fn create_depth_resources(&mut self, commands: &CommandPool) -> RhiResult<()> {
        let format = find_depth_format(&self.device)?;

        let depth = Image::new(
            self.device.clone(),
            &ImageDesc {
                name: "depth",
                extent: self.config.extent,
                format,
                usage: vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
                aspect: vk::ImageAspectFlags::DEPTH,
            },
        )?;

        commands.one_time_submit(|cmd| {
            depth.record_transition(
                cmd,
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            )
        })?;

        self.depth = Some(depth);
        Ok(())
    }

    /// One framebuffer per color view, attaching `[color, depth]`.
    pub fn create_framebuffers(&mut self, render_pass: &RenderPass) -> RhiResult<()> {
        let Some(depth_view) = self.depth.as_ref().map(Image::view) else {
            return Err(RhiError::creation("framebuffer")(
                vk::Result::ERROR_INITIALIZATION_FAILED,
            ));
        };

        self.framebuffers.reserve(self.image_views.len());

        for &color_view in &self.image_views {
            let attachments = [color_view, depth_view];
            let create_info = vk::FramebufferCreateInfo::default()
                .render_pass(render_pass.handle())
                .attachments(&attachments)
                .width(self.config.extent.width)
                .height(self.config.extent.height)
                .layers(1);

            let framebuffer = unsafe {
                self.device
                    .handle()
                    .create_framebuffer(&create_info, None)
                    .map_err(RhiError::creation("framebuffer"))?
            };
            self.framebuffers.push(framebuffer);
        }

        debug!("Created {} framebuffers", self.framebuffers.len());
        Ok(())
    }

    /// Destroys framebuffers, depth resources, image views and the
    /// swapchain handle, in that order.
    ///
    /// The caller must make sure the GPU no longer uses any of them.
    pub fn cleanup(&mut self) {
        let device = self.device.handle();

        for framebuffer in self.framebuffers.drain(..) {
            unsafe { device.destroy_framebuffer(framebuffer, None) };
        }

        self.depth = None;

        for view in self.image_views.drain(..) {
            unsafe { device.destroy_image_view(view, None) };
        }

        if self.swapchain != vk::SwapchainKHR::null() {
            unsafe {
                self.swapchain_loader
                    .destroy_swapchain(self.swapchain, None);
            }
            self.swapchain = vk::SwapchainKHR::null();
            info!(
                "Swapchain destroyed (was {}x{}, {} images)",
                self.config.extent.width,
                self.config.extent.height,
                self.images.len()
            );
        }
        self.images.clear();
    }

    /// Runs the resize protocol.
    ///
    /// Blocks while `source` reports a zero-area surface.
    pub fn recreate<S: SurfaceExtentSource + ?Sized>(
        &mut self,
        source: &S,
        render_pass: &RenderPass,
        commands: &CommandPool,
    ) -> RhiResult<()> {
        self.device.wait_idle()?;
        self.cleanup();

        let framebuffer_size = wait_for_nonzero_extent(source);
        info!(
            "Recreating swapchain for {}x{}",
            framebuffer_size.width, framebuffer_size.height
        );

        self.create_swapchain(framebuffer_size)?;
        self.create_image_views()?;
        self.create_depth_resources(commands)?;
        self.create_framebuffers(render_pass)
    }

    /// Acquires the next image, signalling `semaphore` when it is ready.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::Acquire`] for failures other than a stale
    /// swapchain.
    pub fn acquire_next_image(&self, semaphore: vk::Semaphore) -> RhiResult<AcquireOutcome> {
        let result = unsafe {
            self.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                semaphore,
                vk::Fence::null(),
            )
        };
        classify_acquire(result)
    }

    /// Queues `image_index` for presentation after `wait_semaphore`.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::Present`] for failures other than a stale or
    /// suboptimal swapchain.
    pub fn present(
        &self,
        queue: vk::Queue,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> RhiResult<PresentOutcome> {
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [wait_semaphore];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let result = unsafe { self.swapchain_loader.queue_present(queue, &present_info) };
        classify_present(result)
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.config.surface_format.format
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.config.extent
    }

    #[inline]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Format of the current depth image, if created.
    pub fn depth_format(&self) -> Option<vk::Format> {
        self.depth.as_ref().map(Image::format)
    }

    /// Framebuffer for the acquired image `index`.
    pub fn framebuffer(&self, index: usize) -> RhiResult<vk::Framebuffer> {
        RhiError::check_bounds("framebuffer", index, self.framebuffers.len())?;
        Ok(self.framebuffers[index])
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Exclusive ownership when one family does both, concurrent otherwise.
fn sharing_for(families: QueueFamilies) -> (vk::SharingMode, Vec<u32>) {
    if families.is_split() {
        debug!(
            "Using CONCURRENT sharing mode between graphics ({}) and present ({}) queues",
            families.graphics, families.present
        );
        (vk::SharingMode::CONCURRENT, families.unique())
    } else {
        (vk::SharingMode::EXCLUSIVE, Vec::new())
    }
}

fn classify_acquire(result: Result<(u32, bool), vk::Result>) -> RhiResult<AcquireOutcome> {
    match result {
        Ok((image_index, suboptimal)) => Ok(AcquireOutcome::Ready {
            image_index,
            suboptimal,
        }),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireOutcome::OutOfDate),
        Err(e) => Err(RhiError::Acquire(e)),
    }
}

fn classify_present(result: Result<bool, vk::Result>) -> RhiResult<PresentOutcome> {
    match result {
        Ok(false) => Ok(PresentOutcome::Presented),
        Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentOutcome::NeedsRecreate),
        Err(e) => Err(RhiError::Present(e)),
    }
}

/// First candidate whose `tiling` features include all of `features`.
///
/// `properties` supplies the device's format report.
///
/// # Errors
///
/// Returns [`RhiError::UnsupportedFormat`] when no candidate matches.
pub fn find_supported_format<F>(
    candidates: &[vk::Format],
    tiling: vk::ImageTiling,
    features: vk::FormatFeatureFlags,
    properties: F,
) -> RhiResult<vk::Format>
where
    F: Fn(vk::Format) -> vk::FormatProperties,
{
    candidates
        .iter()
        .copied()
        .find(|&format| {
            let props = properties(format);
            let supported = match tiling {
                vk::ImageTiling::LINEAR => props.linear_tiling_features,
                vk::ImageTiling::OPTIMAL => props.optimal_tiling_features,
                _ => vk::FormatFeatureFlags::empty(),
            };
            supported.contains(features)
        })
        .ok_or_else(|| {
            RhiError::UnsupportedFormat(format!(
                "none of {:?} supports {:?} with {:?} tiling",
                candidates, features, tiling
            ))
        })
}

/// Depth attachment format for `device`.
pub fn find_depth_format(device: &Device) -> RhiResult<vk::Format> {
    find_supported_format(
        &DEPTH_FORMAT_CANDIDATES,
        vk::ImageTiling::OPTIMAL,
        vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
        |format| device.format_properties(format),
    )
}

/// Prefers B8G8R8A8_SRGB with SRGB_NONLINEAR, otherwise the first format.
fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    let preferred = formats.iter().find(|f| {
        f.format == vk::Format::B8G8R8A8_SRGB && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
    });

    match preferred {
        Some(&format) => format,
        None => {
            warn!(
                "Using first available surface format: {:?}",
                formats[0].format
            );
            formats[0]
        }
    }
}

/// Prefers MAILBOX; FIFO is always available.
fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if present_modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// The surface's fixed extent, or the framebuffer size clamped to the
/// surface limits when the surface leaves it to the swapchain.
fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    framebuffer_size: vk::Extent2D,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    vk::Extent2D {
        width: framebuffer_size.width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: framebuffer_size.height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// One more than the minimum, capped at the maximum (0 means unbounded).
fn determine_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let preferred = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        preferred.min(capabilities.max_image_count)
    } else {
        preferred
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    use super::*;

    fn extent(width: u32, height: u32) -> vk::Extent2D {
        vk::Extent2D { width, height }
    }

    fn support(min: u32, max: u32, modes: &[vk::PresentModeKHR]) -> SwapchainSupportDetails {
        SwapchainSupportDetails {
            capabilities: vk::SurfaceCapabilitiesKHR {
                min_image_count: min,
                max_image_count: max,
                current_extent: extent(800, 600),
                min_image_extent: extent(1, 1),
                max_image_extent: extent(4096, 4096),
                current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
                ..Default::default()
            },
            formats: vec![
                vk::SurfaceFormatKHR {
                    format: vk::Format::R8G8B8A8_UNORM,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
                vk::SurfaceFormatKHR {
                    format: vk::Format::B8G8R8A8_SRGB,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
            ],
            present_modes: modes.to_vec(),
        }
    }

    fn optimal(features: vk::FormatFeatureFlags) -> vk::FormatProperties {
        vk::FormatProperties {
            optimal_tiling_features: features,
            ..Default::default()
        }
    }

    /// Reports queued sizes and counts how often it was asked to wait.
    struct ScriptedSurface {
        sizes: RefCell<VecDeque<(u32, u32)>>,
        waits: Cell<usize>,
    }

    impl ScriptedSurface {
        fn new(sizes: &[(u32, u32)]) -> Self {
            Self {
                sizes: RefCell::new(sizes.iter().copied().collect()),
                waits: Cell::new(0),
            }
        }
    }

    impl SurfaceExtentSource for ScriptedSurface {
        fn framebuffer_size(&self) -> (u32, u32) {
            let mut sizes = self.sizes.borrow_mut();
            if sizes.len() > 1 {
                sizes.pop_front().unwrap()
            } else {
                sizes[0]
            }
        }

        fn wait_events(&self) {
            self.waits.set(self.waits.get() + 1);
        }
    }

    #[test]
    fn test_negotiate_prefers_mailbox() {
        let support = support(
            2,
            3,
            &[vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX],
        );
        let config = SwapchainConfig::negotiate(&support, extent(800, 600)).unwrap();

        assert_eq!(config.present_mode, vk::PresentModeKHR::MAILBOX);
        assert_eq!(config.image_count, 3);
        assert_eq!(config.extent, extent(800, 600));
        assert_eq!(config.surface_format.format, vk::Format::B8G8R8A8_SRGB);
    }

    #[test]
    fn test_negotiate_image_count_clamped() {
        let support = support(3, 3, &[vk::PresentModeKHR::FIFO]);
        let config = SwapchainConfig::negotiate(&support, extent(800, 600)).unwrap();
        assert_eq!(config.image_count, 3);
        assert_eq!(config.present_mode, vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_negotiate_is_repeatable() {
        let support = support(2, 0, &[vk::PresentModeKHR::FIFO]);
        let first = SwapchainConfig::negotiate(&support, extent(800, 600)).unwrap();
        let second = SwapchainConfig::negotiate(&support, extent(800, 600)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_negotiate_rejects_inadequate_surface() {
        let mut support = support(2, 3, &[]);
        assert!(matches!(
            SwapchainConfig::negotiate(&support, extent(800, 600)),
            Err(RhiError::UnsupportedFormat(_))
        ));
        support.present_modes.push(vk::PresentModeKHR::FIFO);
        support.formats.clear();
        assert!(!support.is_adequate());
    }

    #[test]
    fn test_choose_surface_format_fallback() {
        let formats = [vk::SurfaceFormatKHR {
            format: vk::Format::R8G8B8A8_UNORM,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }];
        assert_eq!(
            choose_surface_format(&formats).format,
            vk::Format::R8G8B8A8_UNORM
        );
    }

    #[test]
    fn test_choose_extent_clamps_when_undefined() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: extent(u32::MAX, u32::MAX),
            min_image_extent: extent(100, 100),
            max_image_extent: extent(2000, 2000),
            ..Default::default()
        };

        assert_eq!(choose_extent(&capabilities, extent(3000, 50)), extent(2000, 100));
        assert_eq!(choose_extent(&capabilities, extent(800, 600)), extent(800, 600));
    }

    #[test]
    fn test_image_count_unbounded() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&capabilities), 3);
    }

    #[test]
    fn test_sharing_mode() {
        let shared = QueueFamilies {
            graphics: 0,
            present: 0,
        };
        assert_eq!(sharing_for(shared), (vk::SharingMode::EXCLUSIVE, vec![]));

        let split = QueueFamilies {
            graphics: 0,
            present: 2,
        };
        assert_eq!(sharing_for(split), (vk::SharingMode::CONCURRENT, vec![0, 2]));
    }

    #[test]
    fn test_depth_format_picks_first_supported() {
        let format = find_supported_format(
            &DEPTH_FORMAT_CANDIDATES,
            vk::ImageTiling::OPTIMAL,
            vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
            |format| {
                if format == vk::Format::D24_UNORM_S8_UINT {
                    optimal(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
                } else {
                    optimal(vk::FormatFeatureFlags::SAMPLED_IMAGE)
                }
            },
        )
        .unwrap();
        assert_eq!(format, vk::Format::D24_UNORM_S8_UINT);
    }

    #[test]
    fn test_depth_format_is_deterministic() {
        let report = |_| optimal(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT);
        let pick = || {
            find_supported_format(
                &DEPTH_FORMAT_CANDIDATES,
                vk::ImageTiling::OPTIMAL,
                vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
                report,
            )
            .unwrap()
        };
        assert_eq!(pick(), vk::Format::D32_SFLOAT);
        assert_eq!(pick(), pick());
    }

    #[test]
    fn test_linear_tiling_uses_linear_features() {
        let result = find_supported_format(
            &DEPTH_FORMAT_CANDIDATES,
            vk::ImageTiling::LINEAR,
            vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
            |_| optimal(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT),
        );
        assert!(matches!(result, Err(RhiError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_no_depth_format() {
        let result = find_supported_format(
            &DEPTH_FORMAT_CANDIDATES,
            vk::ImageTiling::OPTIMAL,
            vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
            |_| vk::FormatProperties::default(),
        );
        assert!(matches!(result, Err(RhiError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_wait_for_nonzero_extent_polls_while_minimized() {
        let surface = ScriptedSurface::new(&[(0, 0), (0, 0), (1024, 768)]);
        assert_eq!(wait_for_nonzero_extent(&surface), extent(1024, 768));
        assert_eq!(surface.waits.get(), 2);
    }

    #[test]
    fn test_wait_for_nonzero_extent_zero_height() {
        let surface = ScriptedSurface::new(&[(800, 0), (800, 600)]);
        assert_eq!(wait_for_nonzero_extent(&surface), extent(800, 600));
        assert_eq!(surface.waits.get(), 1);
    }

    #[test]
    fn test_wait_for_nonzero_extent_no_wait() {
        let surface = ScriptedSurface::new(&[(800, 600)]);
        assert_eq!(wait_for_nonzero_extent(&surface), extent(800, 600));
        assert_eq!(surface.waits.get(), 0);
    }

    #[test]
    fn test_classify_acquire() {
        assert_eq!(
            classify_acquire(Ok((1, false))).unwrap(),
            AcquireOutcome::Ready {
                image_index: 1,
                suboptimal: false
            }
        );
        assert_eq!(
            classify_acquire(Ok((0, true))).unwrap(),
            AcquireOutcome::Ready {
                image_index: 0,
                suboptimal: true
            }
        );
        assert_eq!(
            classify_acquire(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)).unwrap(),
            AcquireOutcome::OutOfDate
        );
        assert!(matches!(
            classify_acquire(Err(vk::Result::ERROR_DEVICE_LOST)),
            Err(RhiError::Acquire(vk::Result::ERROR_DEVICE_LOST))
        ));
    }

    #[test]
    fn test_classify_present() {
        assert_eq!(
            classify_present(Ok(false)).unwrap(),
            PresentOutcome::Presented
        );
        assert_eq!(
            classify_present(Ok(true)).unwrap(),
            PresentOutcome::NeedsRecreate
        );
        assert_eq!(
            classify_present(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)).unwrap(),
            PresentOutcome::NeedsRecreate
        );
        assert!(matches!(
            classify_present(Err(vk::Result::ERROR_SURFACE_LOST_KHR)),
            Err(RhiError::Present(_))
        ));
    }
}
