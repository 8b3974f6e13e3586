//! Error types for asset loading.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for mesh and image loading.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The OBJ parser rejected the file.
    #[error("OBJ error: {0}")]
    Obj(#[from] tobj::LoadError),

    /// Image decoding error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// The OBJ file contains no geometry.
    #[error("Model '{0}' contains no meshes")]
    NoMeshes(PathBuf),

    /// Merged vertex count does not fit a 32-bit index.
    #[error("Model has more vertices than a u32 index can address")]
    IndexOverflow,

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

/// Result type alias for resource operations.
pub type ResourceResult<T> = Result<T, ResourceError>;
