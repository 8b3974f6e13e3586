//! Sampled 2D textures.
//!
//! A [`Texture`] is an `R8G8B8A8_SRGB` image uploaded through a staging
//! buffer plus the [`Sampler`] the fragment shader reads it with.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::buffer::{Buffer, BufferUsage};
use crate::command::CommandPool;
use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::image::{Image, ImageDesc};

/// Format every texture is uploaded in.
pub const TEXTURE_FORMAT: vk::Format = vk::Format::R8G8B8A8_SRGB;

/// Linear, repeating sampler with maximum anisotropy.
pub struct Sampler {
    device: Arc<Device>,
    sampler: vk::Sampler,
}

impl Sampler {
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let create_info = sampler_create_info(device.properties().limits.max_sampler_anisotropy);

        let sampler = unsafe {
            device
                .handle()
                .create_sampler(&create_info, None)
                .map_err(RhiError::creation("texture sampler"))?
        };

        Ok(Self { device, sampler })
    }

    #[inline]
    pub fn handle(&self) -> vk::Sampler {
        self.sampler
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_sampler(self.sampler, None);
        }
    }
}

fn sampler_create_info<'a>(max_anisotropy: f32) -> vk::SamplerCreateInfo<'a> {
    vk::SamplerCreateInfo::default()
        .mag_filter(vk::Filter::LINEAR)
        .min_filter(vk::Filter::LINEAR)
        .address_mode_u(vk::SamplerAddressMode::REPEAT)
        .address_mode_v(vk::SamplerAddressMode::REPEAT)
        .address_mode_w(vk::SamplerAddressMode::REPEAT)
        .anisotropy_enable(true)
        .max_anisotropy(max_anisotropy)
        .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
        .unnormalized_coordinates(false)
        .compare_enable(false)
        .compare_op(vk::CompareOp::ALWAYS)
        .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
        .mip_lod_bias(0.0)
        .min_lod(0.0)
        .max_lod(0.0)
}

/// Uploaded, shader-readable texture.
pub struct Texture {
    // Sampler first so it is released before the image
    sampler: Sampler,
    image: Image,
}

impl Texture {
    /// Uploads tightly packed RGBA8 `pixels` of `width` x `height`.
    ///
    /// The image ends in `SHADER_READ_ONLY_OPTIMAL`.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::BufferOverflow`] if `pixels` is not exactly
    /// `width * height * 4` bytes, and propagates creation and submit errors.
    pub fn from_rgba8(
        device: Arc<Device>,
        commands: &CommandPool,
        name: &'static str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> RhiResult<Self> {
        let expected = u64::from(width) * u64::from(height) * 4;
        if pixels.len() as u64 != expected {
            return Err(RhiError::BufferOverflow {
                offset: 0,
                len: pixels.len() as u64,
                size: expected,
            });
        }

        let staging = Buffer::new(device.clone(), BufferUsage::Staging, expected)?;
        staging.write_data(0, pixels)?;

        let extent = vk::Extent2D { width, height };
        let image = Image::new(
            device.clone(),
            &ImageDesc {
                name,
                extent,
                format: TEXTURE_FORMAT,
                usage: vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED,
                aspect: vk::ImageAspectFlags::COLOR,
            },
        )?;

        commands.one_time_submit(|cmd| {
            image.record_transition(
                cmd,
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            )?;

            let region = vk::BufferImageCopy::default()
                .image_subresource(
                    vk::ImageSubresourceLayers::default()
                        .aspect_mask(vk::ImageAspectFlags::COLOR)
                        .mip_level(0)
                        .base_array_layer(0)
                        .layer_count(1),
                )
                .image_extent(vk::Extent3D {
                    width,
                    height,
                    depth: 1,
                });
            cmd.copy_buffer_to_image(
                staging.handle(),
                image.handle(),
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );

            image.record_transition(
                cmd,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            )
        })?;

        let sampler = Sampler::new(device)?;

        debug!("Texture '{}' uploaded ({}x{})", name, width, height);

        Ok(Self { sampler, image })
    }

    #[inline]
    pub fn view(&self) -> vk::ImageView {
        self.image.view()
    }

    #[inline]
    pub fn sampler(&self) -> vk::Sampler {
        self.sampler.handle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampler_settings() {
        let info = sampler_create_info(16.0);
        assert_eq!(info.mag_filter, vk::Filter::LINEAR);
        assert_eq!(info.min_filter, vk::Filter::LINEAR);
        assert_eq!(info.address_mode_u, vk::SamplerAddressMode::REPEAT);
        assert_eq!(info.anisotropy_enable, vk::TRUE);
        assert_eq!(info.max_anisotropy, 16.0);
        assert_eq!(info.border_color, vk::BorderColor::INT_OPAQUE_BLACK);
        assert_eq!(info.compare_op, vk::CompareOp::ALWAYS);
        assert_eq!(info.max_lod, 0.0);
    }

    #[test]
    fn test_texture_format_is_srgb() {
        assert_eq!(TEXTURE_FORMAT, vk::Format::R8G8B8A8_SRGB);
    }
}
