//! GPU copies of the model and its material textures.

use std::path::Path;
use std::sync::Arc;

use ash::vk;
use tracing::info;

use vkpbr_core::ViewerConfig;
use vkpbr_resources::{ImageData, MeshData};
use vkpbr_rhi::buffer::{Buffer, BufferUsage};
use vkpbr_rhi::command::{CommandBuffer, CommandPool};
use vkpbr_rhi::device::Device;
use vkpbr_rhi::texture::Texture;

use crate::error::RendererResult;

/// Device-local vertex and index buffers of one merged mesh.
pub struct GpuMesh {
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: Arc<Device>, commands: &CommandPool, mesh: &MeshData) -> RendererResult<Self> {
        let vertex_buffer = Buffer::upload(
            device.clone(),
            commands,
            BufferUsage::Vertex,
            bytemuck::cast_slice(&mesh.vertices),
        )?;
        let index_buffer = Buffer::upload(
            device,
            commands,
            BufferUsage::Index,
            bytemuck::cast_slice(&mesh.indices),
        )?;

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        })
    }

    /// Loads the OBJ at `path` and uploads it.
    pub fn load(device: Arc<Device>, commands: &CommandPool, path: &Path) -> RendererResult<Self> {
        let mesh = MeshData::load_obj(path)?;
        Self::upload(device, commands, &mesh)
    }

    /// Binds the buffers and draws every index once.
    pub fn record_draw(&self, cmd: &CommandBuffer) {
        cmd.bind_vertex_buffers(0, &[self.vertex_buffer.handle()], &[0]);
        cmd.bind_index_buffer(self.index_buffer.handle(), 0, vk::IndexType::UINT32);
        cmd.draw_indexed(self.index_count, 1, 0, 0, 0);
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

/// Loads and uploads each texture of `config`, in binding order.
pub fn load_material(
    device: &Arc<Device>,
    commands: &CommandPool,
    config: &ViewerConfig,
) -> RendererResult<Vec<Texture>> {
    let mut textures = Vec::with_capacity(config.textures.len());

    for relative in &config.textures {
        let image = ImageData::load_rgba8(&config.asset_path(relative))?;
        textures.push(Texture::from_rgba8(
            device.clone(),
            commands,
            "material texture",
            image.width,
            image.height,
            &image.pixels,
        )?);
    }

    info!("Uploaded {} material texture(s)", textures.len());

    Ok(textures)
}
