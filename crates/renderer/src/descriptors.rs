//! Descriptor binder: one descriptor set per frame slot.
//!
//! Binding 0 is the slot's uniform buffer. Bindings `1..=K` are the shared
//! material textures, in the order they were given. Sets are written once
//! at setup; per frame only the uniform memory they reference changes.

use std::sync::Arc;

use ash::vk;
use tracing::info;

use vkpbr_rhi::descriptor::{
    DescriptorBindingBuilder, DescriptorPool, DescriptorSetLayout, buffer_info, image_info,
    update_descriptor_sets,
};
use vkpbr_rhi::device::Device;
use vkpbr_rhi::texture::Texture;
use vkpbr_rhi::RhiResult;

use crate::per_frame::PerFrame;

use crate::uniforms::{UniformBufferObject, UniformBuffers};

pub const UNIFORM_BINDING: u32 = 0;
pub const FIRST_TEXTURE_BINDING: u32 = 1;

/// Layout bindings for one uniform buffer and `texture_count` samplers.
pub fn layout_bindings(texture_count: usize) -> Vec<vk::DescriptorSetLayoutBinding<'static>> {
    let mut bindings = Vec::with_capacity(texture_count + 1);
    bindings.push(DescriptorBindingBuilder::uniform_buffer(
        UNIFORM_BINDING,
        vk::ShaderStageFlags::VERTEX,
    ));
    bindings.extend((0..texture_count as u32).map(|i| {
        DescriptorBindingBuilder::combined_image_sampler(
            FIRST_TEXTURE_BINDING + i,
            vk::ShaderStageFlags::FRAGMENT,
        )
    }));
    bindings
}

/// Pool sizes for exactly `set_count` sets of one uniform buffer and
/// `texture_count` combined image samplers each.
pub fn pool_sizes(set_count: usize, texture_count: usize) -> [vk::DescriptorPoolSize; 2] {
    [
        vk::DescriptorPoolSize::default()
            .ty(vk::DescriptorType::UNIFORM_BUFFER)
            .descriptor_count(set_count as u32),
        vk::DescriptorPoolSize::default()
            .ty(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .descriptor_count((set_count * texture_count) as u32),
    ]
}

pub struct DescriptorBinder {
    // Field order is drop order: sets go with the pool, before the layout.
    _pool: DescriptorPool,
    layout: DescriptorSetLayout,
    sets: PerFrame<vk::DescriptorSet>,
}

impl DescriptorBinder {
    /// Creates the set layout and one written set per uniform buffer.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::DescriptorPool`](vkpbr_rhi::RhiError::DescriptorPool)
    /// if allocation fails.
    pub fn new(
        device: Arc<Device>,
        uniforms: &UniformBuffers,
        textures: &[Texture],
    ) -> RhiResult<Self> {
        let layout = DescriptorSetLayout::new(device.clone(), &layout_bindings(textures.len()))?;
        let set_count = uniforms.len();
        let pool = DescriptorPool::new(
            device.clone(),
            set_count as u32,
            &pool_sizes(set_count, textures.len()),
        )?;

        let layouts = vec![layout.handle(); set_count];
        let sets = pool.allocate(&layouts)?;

        let image_infos: Vec<[vk::DescriptorImageInfo; 1]> = textures
            .iter()
            .map(|texture| {
                [image_info(
                    texture.sampler(),
                    texture.view(),
                    vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                )]
            })
            .collect();

        for (&set, uniform) in sets.iter().zip(uniforms.iter()) {
            let buffer_infos = [buffer_info(
                uniform.handle(),
                0,
                UniformBufferObject::SIZE as vk::DeviceSize,
            )];

            let mut writes = Vec::with_capacity(textures.len() + 1);
            writes.push(
                vk::WriteDescriptorSet::default()
                    .dst_set(set)
                    .dst_binding(UNIFORM_BINDING)
                    .dst_array_element(0)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .buffer_info(&buffer_infos),
            );
            for (i, info) in image_infos.iter().enumerate() {
                writes.push(
                    vk::WriteDescriptorSet::default()
                        .dst_set(set)
                        .dst_binding(FIRST_TEXTURE_BINDING + i as u32)
                        .dst_array_element(0)
                        .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                        .image_info(info),
                );
            }

            update_descriptor_sets(&device, &writes);
        }

        info!(
            "Descriptor sets ready: {} set(s), {} texture binding(s)",
            sets.len(),
            textures.len()
        );

        Ok(Self {
            _pool: pool,
            layout,
            sets: PerFrame::new("descriptor set", sets),
        })
    }

    /// Set layout shared by every slot's set, for the pipeline layout.
    #[inline]
    pub fn layout(&self) -> &DescriptorSetLayout {
        &self.layout
    }

    /// Descriptor set of slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::ResourceBounds`](vkpbr_rhi::RhiError::ResourceBounds)
    /// when `index` is not a slot.
    pub fn set(&self, index: usize) -> RhiResult<vk::DescriptorSet> {
        self.sets.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_sizes_for_two_slots_four_textures() {
        let [ubo, samplers] = pool_sizes(2, 4);
        assert_eq!(ubo.ty, vk::DescriptorType::UNIFORM_BUFFER);
        assert_eq!(ubo.descriptor_count, 2);
        assert_eq!(samplers.ty, vk::DescriptorType::COMBINED_IMAGE_SAMPLER);
        assert_eq!(samplers.descriptor_count, 8);
    }

    #[test]
    fn test_pool_sizes_scale_with_slots() {
        let [ubo, samplers] = pool_sizes(3, 4);
        assert_eq!(ubo.descriptor_count, 3);
        assert_eq!(samplers.descriptor_count, 12);
    }

    #[test]
    fn test_layout_bindings() {
        let bindings = layout_bindings(4);
        assert_eq!(bindings.len(), 5);

        assert_eq!(bindings[0].binding, 0);
        assert_eq!(bindings[0].descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
        assert_eq!(bindings[0].stage_flags, vk::ShaderStageFlags::VERTEX);

        for (i, binding) in bindings[1..].iter().enumerate() {
            assert_eq!(binding.binding, 1 + i as u32);
            assert_eq!(
                binding.descriptor_type,
                vk::DescriptorType::COMBINED_IMAGE_SAMPLER
            );
            assert_eq!(binding.stage_flags, vk::ShaderStageFlags::FRAGMENT);
            assert_eq!(binding.descriptor_count, 1);
        }
    }

    #[test]
    fn test_layout_without_textures() {
        let bindings = layout_bindings(0);
        assert_eq!(bindings.len(), 1);
        let [_, samplers] = pool_sizes(2, 0);
        assert_eq!(samplers.descriptor_count, 0);
    }
}
