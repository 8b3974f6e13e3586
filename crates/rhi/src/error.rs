//! RHI-specific error types.

use ash::vk;
use thiserror::Error;

/// RHI-specific error type.
///
/// A stale swapchain is not represented here. Acquire and present report it
/// through [`crate::swapchain::AcquireOutcome`] and
/// [`crate::swapchain::PresentOutcome`] so callers can run the resize path
/// without matching on error codes.
#[derive(Error, Debug)]
pub enum RhiError {
    /// Uncategorised Vulkan API error
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] vk::Result),

    /// Failed to load the Vulkan library
    #[error("Failed to load Vulkan: {0}")]
    Loading(#[from] ash::LoadingError),

    /// GPU allocator error
    #[error("Allocator error: {0}")]
    Allocator(#[from] gpu_allocator::AllocationError),

    /// Setup of a long-lived object failed
    #[error("Failed to create {what}: {source}")]
    Creation {
        what: &'static str,
        #[source]
        source: vk::Result,
    },

    /// Descriptor set allocation failed, usually because the pool is exhausted
    #[error("Descriptor pool error: {0}")]
    DescriptorPool(vk::Result),

    /// Swapchain image acquisition failed for a reason other than staleness
    #[error("Failed to acquire swapchain image: {0}")]
    Acquire(vk::Result),

    /// Queue submission failed
    #[error("Failed to submit draw command buffer: {0}")]
    Submit(vk::Result),

    /// Presentation failed for a reason other than a stale swapchain
    #[error("Failed to present swapchain image: {0}")]
    Present(vk::Result),

    /// No candidate format satisfied the requested features
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Image layout transition with no known access/stage masks
    #[error("Unsupported layout transition: {from:?} -> {to:?}")]
    UnsupportedTransition {
        from: vk::ImageLayout,
        to: vk::ImageLayout,
    },

    /// Index past the end of a per-frame resource array
    #[error("{what} index {index} out of range (len {len})")]
    ResourceBounds {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// No suitable GPU found
    #[error("No suitable GPU found")]
    NoSuitableGpu,

    /// Shader loading error
    #[error("Shader error: {0}")]
    Shader(String),

    /// Surface creation or query error
    #[error("Surface error: {0}")]
    Surface(String),

    /// Incomplete pipeline description
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Write outside the bounds of a buffer
    #[error("Buffer write out of bounds: offset {offset} + len {len} > size {size}")]
    BufferOverflow { offset: u64, len: u64, size: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RhiError {
    /// Returns a closure mapping a raw `vk::Result` into [`RhiError::Creation`].
    pub(crate) fn creation(what: &'static str) -> impl FnOnce(vk::Result) -> Self {
        move |source| Self::Creation { what, source }
    }

    /// Checks `index` against `len`.
    pub fn check_bounds(what: &'static str, index: usize, len: usize) -> RhiResult<()> {
        if index < len {
            Ok(())
        } else {
            Err(Self::ResourceBounds { what, index, len })
        }
    }
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_bounds() {
        assert!(RhiError::check_bounds("frame slot", 1, 2).is_ok());
        let err = RhiError::check_bounds("frame slot", 2, 2).unwrap_err();
        assert!(matches!(
            err,
            RhiError::ResourceBounds {
                index: 2,
                len: 2,
                ..
            }
        ));
        assert_eq!(err.to_string(), "frame slot index 2 out of range (len 2)");
    }

    #[test]
    fn test_creation_error_message() {
        let err = RhiError::creation("render pass")(vk::Result::ERROR_OUT_OF_HOST_MEMORY);
        assert!(err.to_string().starts_with("Failed to create render pass"));
    }
}
