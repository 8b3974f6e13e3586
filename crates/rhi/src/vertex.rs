//! Mesh vertex layout and its vertex input description.

use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Interleaved vertex consumed by the mesh pipeline.
///
/// | location | attribute | format            | offset |
/// |----------|-----------|-------------------|--------|
/// | 0        | position  | `R32G32B32_SFLOAT`| 0      |
/// | 1        | normal    | `R32G32B32_SFLOAT`| 12     |
/// | 2        | tex_coord | `R32G32_SFLOAT`   | 24     |
/// | 3        | tangent   | `R32G32B32_SFLOAT`| 32     |
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coord: Vec2,
    pub tangent: Vec3,
}

impl Vertex {
    #[inline]
    pub const fn new(position: Vec3, normal: Vec3, tex_coord: Vec2, tangent: Vec3) -> Self {
        Self {
            position,
            normal,
            tex_coord,
            tangent,
        }
    }

    #[inline]
    pub const fn size() -> usize {
        std::mem::size_of::<Self>()
    }

    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: Self::size() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 4] {
        [
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: std::mem::offset_of!(Vertex, position) as u32,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: std::mem::offset_of!(Vertex, normal) as u32,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 2,
                format: vk::Format::R32G32_SFLOAT,
                offset: std::mem::offset_of!(Vertex, tex_coord) as u32,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 3,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: std::mem::offset_of!(Vertex, tangent) as u32,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_size() {
        // 3 + 3 + 2 + 3 floats
        assert_eq!(std::mem::size_of::<Vertex>(), 44);
        assert_eq!(Vertex::size(), 44);
    }

    #[test]
    fn test_vertex_binding_description() {
        let binding = Vertex::binding_description();
        assert_eq!(binding.binding, 0);
        assert_eq!(binding.stride, 44);
        assert_eq!(binding.input_rate, vk::VertexInputRate::VERTEX);
    }

    #[test]
    fn test_vertex_attribute_descriptions() {
        let attrs = Vertex::attribute_descriptions();

        let expected = [
            (0, vk::Format::R32G32B32_SFLOAT, 0),
            (1, vk::Format::R32G32B32_SFLOAT, 12),
            (2, vk::Format::R32G32_SFLOAT, 24),
            (3, vk::Format::R32G32B32_SFLOAT, 32),
        ];
        for (attr, (location, format, offset)) in attrs.iter().zip(expected) {
            assert_eq!(attr.binding, 0);
            assert_eq!(attr.location, location);
            assert_eq!(attr.format, format);
            assert_eq!(attr.offset, offset);
        }
    }

    #[test]
    fn test_vertex_default_is_zeroed() {
        let vertex = Vertex::default();
        assert_eq!(bytemuck::bytes_of(&vertex), &[0u8; 44][..]);
    }

    #[test]
    fn test_vertex_slice_cast() {
        let vertices = [
            Vertex::new(Vec3::X, Vec3::Y, Vec2::ONE, Vec3::Z),
            Vertex::default(),
        ];
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), 88);
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
    }
}
