//! CPU-side asset loading.
//!
//! - OBJ meshes via `tobj`, merged into one indexed vertex stream with
//!   computed tangents
//! - PNG textures via `image`, expanded to tightly packed RGBA8

mod error;
pub mod mesh;
pub mod texture;

pub use error::{ResourceError, ResourceResult};
pub use mesh::MeshData;
pub use texture::ImageData;
