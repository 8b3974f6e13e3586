//! Viewer configuration.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Window, frame pacing and asset settings for one viewer run.
///
/// Asset paths are relative to `asset_root`; see [`ViewerConfig::asset_path`].
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    /// Number of frame slots in the ring
    pub frames_in_flight: usize,
    pub enable_validation: bool,
    pub asset_root: PathBuf,
    pub model: PathBuf,
    /// Bound in order to combined image samplers 1..=N
    pub textures: Vec<PathBuf>,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Vulkan App".to_string(),
            width: 800,
            height: 600,
            resizable: true,
            frames_in_flight: 2,
            enable_validation: cfg!(debug_assertions),
            asset_root: PathBuf::from("./assets"),
            model: PathBuf::from("models/Barrel.obj"),
            textures: [
                "textures/barrel_BaseColor.png",
                "textures/barrel_Metallic.png",
                "textures/barrel_Normal.png",
                "textures/barrel_Roughness.png",
            ]
            .into_iter()
            .map(PathBuf::from)
            .collect(),
            vertex_shader: PathBuf::from("shaders/vert.spv"),
            fragment_shader: PathBuf::from("shaders/frag.spv"),
        }
    }
}

impl ViewerConfig {
    /// Defaults with overrides from `VKPBR_ASSET_ROOT`,
    /// `VKPBR_FRAMES_IN_FLIGHT` and `VKPBR_VALIDATION`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ViewerConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(root) = lookup("VKPBR_ASSET_ROOT") {
            config.asset_root = PathBuf::from(root);
        }

        if let Some(frames) = lookup("VKPBR_FRAMES_IN_FLIGHT") {
            config.frames_in_flight = frames.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "VKPBR_FRAMES_IN_FLIGHT must be a positive integer, got {:?}",
                    frames
                ))
            })?;
        }

        if let Some(validation) = lookup("VKPBR_VALIDATION") {
            config.enable_validation = match validation.trim() {
                "1" => true,
                "0" => false,
                other => {
                    return Err(Error::Config(format!(
                        "VKPBR_VALIDATION must be 0 or 1, got {:?}",
                        other
                    )));
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.frames_in_flight == 0 {
            return Err(Error::Config(
                "frames_in_flight must be at least 1".to_string(),
            ));
        }
        if self.width == 0 || self.height == 0 {
            return Err(Error::Config(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.textures.is_empty() {
            return Err(Error::Config("at least one texture is required".to_string()));
        }
        Ok(())
    }

    /// Resolves `relative` against the asset root.
    pub fn asset_path(&self, relative: impl AsRef<std::path::Path>) -> PathBuf {
        self.asset_root.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.title, "Vulkan App");
        assert_eq!((config.width, config.height), (800, 600));
        assert!(config.resizable);
        assert_eq!(config.frames_in_flight, 2);
        assert_eq!(config.textures.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_asset_path() {
        let config = ViewerConfig::default();
        assert_eq!(
            config.asset_path(&config.model),
            PathBuf::from("./assets/models/Barrel.obj")
        );
    }

    #[test]
    fn test_from_lookup_without_overrides() {
        let config = ViewerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ViewerConfig::from_lookup(lookup_from(&[
            ("VKPBR_ASSET_ROOT", "/data/assets"),
            ("VKPBR_FRAMES_IN_FLIGHT", "3"),
            ("VKPBR_VALIDATION", "0"),
        ]))
        .unwrap();
        assert_eq!(config.asset_root, PathBuf::from("/data/assets"));
        assert_eq!(config.frames_in_flight, 3);
        assert!(!config.enable_validation);
    }

    #[test]
    fn test_zero_frames_rejected() {
        let err = ViewerConfig::from_lookup(lookup_from(&[("VKPBR_FRAMES_IN_FLIGHT", "0")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_bad_values_rejected() {
        assert!(
            ViewerConfig::from_lookup(lookup_from(&[("VKPBR_FRAMES_IN_FLIGHT", "two")])).is_err()
        );
        assert!(ViewerConfig::from_lookup(lookup_from(&[("VKPBR_VALIDATION", "yes")])).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_size_and_no_textures() {
        let mut config = ViewerConfig {
            width: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.width = 800;
        config.textures.clear();
        assert!(config.validate().is_err());
    }
}
