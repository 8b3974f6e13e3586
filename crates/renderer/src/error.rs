//! Renderer error type.

use thiserror::Error;
use vkpbr_resources::ResourceError;
use vkpbr_rhi::RhiError;

#[derive(Error, Debug)]
pub enum RendererError {
    #[error(transparent)]
    Rhi(#[from] RhiError),

    #[error("Asset loading failed: {0}")]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Core(#[from] vkpbr_core::Error),
}

pub type RendererResult<T> = std::result::Result<T, RendererError>;

#[cfg(test)]
mod tests {
    use vkpbr_core::ViewerConfig;

    use super::*;

    #[test]
    fn test_invalid_config_surfaces_as_core_error() {
        let config = ViewerConfig {
            frames_in_flight: 0,
            ..ViewerConfig::default()
        };

        let err: RendererError = config.validate().unwrap_err().into();

        assert!(matches!(err, RendererError::Core(vkpbr_core::Error::Config(_))));
        assert!(err.to_string().contains("frames_in_flight"));
    }

    #[test]
    fn test_rhi_error_is_transparent() {
        let rhi = RhiError::check_bounds("frame slot", 2, 2).unwrap_err();
        let message = rhi.to_string();

        let err: RendererError = rhi.into();
        assert_eq!(err.to_string(), message);
    }
}
