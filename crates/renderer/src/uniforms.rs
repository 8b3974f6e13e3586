//! Per-slot uniform data.
//!
//! Each frame slot owns one host-visible uniform buffer holding a
//! [`UniformBufferObject`]. A slot's buffer is only written after the slot's
//! fence wait, so the GPU is never reading it at the time.

use std::sync::Arc;

use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use tracing::debug;

use vkpbr_rhi::buffer::{Buffer, BufferUsage};
use vkpbr_rhi::device::Device;
use vkpbr_rhi::RhiResult;

use crate::per_frame::PerFrame;

/// Degrees of model rotation per second.
const ROTATION_DEGREES_PER_SEC: f32 = 20.0;

const EYE: Vec3 = Vec3::new(0.0, 1.0, -3.0);
const TARGET: Vec3 = Vec3::new(0.0, -2.0, 10.0);

const FOV_Y_DEGREES: f32 = 45.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 10.0;

/// Transform bundle read by the vertex shader at binding 0.
///
/// # Memory Layout
///
/// - Offset 0: model matrix (64 bytes)
/// - Offset 64: view matrix (64 bytes)
/// - Offset 128: projection matrix (64 bytes)
/// - Total size: 192 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct UniformBufferObject {
    pub model: Mat4,
    pub view: Mat4,
    pub proj: Mat4,
}

impl UniformBufferObject {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Transforms for `elapsed` seconds into the animation at the given
    /// framebuffer extent.
    ///
    /// The projection's Y axis is flipped for Vulkan's downward clip-space Y.
    pub fn compute(elapsed: f32, extent: vk::Extent2D) -> Self {
        let axis = Vec3::ONE.normalize();
        let model = Mat4::from_axis_angle(axis, (elapsed * ROTATION_DEGREES_PER_SEC).to_radians());

        let view = Mat4::look_at_rh(EYE, TARGET, Vec3::Y);

        let aspect = if extent.height == 0 {
            1.0
        } else {
            extent.width as f32 / extent.height as f32
        };
        let mut proj = Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), aspect, Z_NEAR, Z_FAR);
        proj.y_axis.y *= -1.0;

        Self { model, view, proj }
    }
}

/// One uniform buffer per frame slot.
pub struct UniformBuffers {
    buffers: PerFrame<Buffer>,
}

impl UniformBuffers {
    pub fn new(device: Arc<Device>, count: usize) -> RhiResult<Self> {
        let buffers = (0..count)
            .map(|_| {
                Buffer::new(
                    device.clone(),
                    BufferUsage::Uniform,
                    UniformBufferObject::SIZE as vk::DeviceSize,
                )
            })
            .collect::<RhiResult<Vec<_>>>()?;

        debug!("Created {} uniform buffers", buffers.len());

        Ok(Self {
            buffers: PerFrame::new("uniform buffer", buffers),
        })
    }

    /// Writes `ubo` into slot `index`'s buffer.
    ///
    /// The caller must have waited on the slot's fence.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::ResourceBounds`](vkpbr_rhi::RhiError::ResourceBounds)
    /// when `index` is not a slot.
    pub fn update(&self, index: usize, ubo: &UniformBufferObject) -> RhiResult<()> {
        self.buffers.get(index)?.write_pod(ubo)
    }

    pub(crate) fn len(&self) -> usize {
        self.buffers.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Buffer> {
        self.buffers.iter()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec4;

    use super::*;

    const EXTENT: vk::Extent2D = vk::Extent2D {
        width: 800,
        height: 600,
    };

    #[test]
    fn test_ubo_layout() {
        assert_eq!(UniformBufferObject::SIZE, 192);
        assert_eq!(std::mem::offset_of!(UniformBufferObject, view), 64);
        assert_eq!(std::mem::offset_of!(UniformBufferObject, proj), 128);
    }

    #[test]
    fn test_model_is_identity_at_start() {
        let ubo = UniformBufferObject::compute(0.0, EXTENT);
        assert!(ubo.model.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn test_model_rotates_around_diagonal() {
        let ubo = UniformBufferObject::compute(4.5, EXTENT);
        let axis = Vec3::ONE.normalize();

        // The rotation axis is fixed, everything else moves.
        assert!(ubo.model.transform_vector3(axis).abs_diff_eq(axis, 1e-5));
        assert!(!ubo.model.transform_vector3(Vec3::X).abs_diff_eq(Vec3::X, 1e-3));

        // 20 degrees per second, so 18 seconds is a full turn.
        let full_turn = UniformBufferObject::compute(18.0, EXTENT);
        assert!(full_turn.model.abs_diff_eq(Mat4::IDENTITY, 1e-4));
    }

    #[test]
    fn test_projection_y_is_flipped() {
        let ubo = UniformBufferObject::compute(0.0, EXTENT);
        let unflipped =
            Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), 800.0 / 600.0, Z_NEAR, Z_FAR);

        assert!(ubo.proj.y_axis.y < 0.0);
        assert_eq!(ubo.proj.y_axis.y, -unflipped.y_axis.y);
        assert_eq!(ubo.proj.x_axis, unflipped.x_axis);
    }

    #[test]
    fn test_projection_tracks_aspect() {
        let wide = UniformBufferObject::compute(
            0.0,
            vk::Extent2D {
                width: 1600,
                height: 600,
            },
        );
        let narrow = UniformBufferObject::compute(0.0, EXTENT);
        assert!(wide.proj.x_axis.x < narrow.proj.x_axis.x);
    }

    #[test]
    fn test_zero_height_does_not_produce_nan() {
        let ubo = UniformBufferObject::compute(
            1.0,
            vk::Extent2D {
                width: 800,
                height: 0,
            },
        );
        assert!(!ubo.proj.is_nan());
    }

    #[test]
    fn test_view_looks_from_eye_to_target() {
        let ubo = UniformBufferObject::compute(0.0, EXTENT);

        let eye_in_view = ubo.view * EYE.extend(1.0);
        assert!(eye_in_view.abs_diff_eq(Vec4::new(0.0, 0.0, 0.0, 1.0), 1e-5));

        // Right-handed view space looks down -Z.
        let target_in_view = ubo.view.transform_point3(TARGET);
        assert!(target_in_view.z < 0.0);
        assert!(target_in_view.x.abs() < 1e-4 && target_in_view.y.abs() < 1e-4);
    }
}
