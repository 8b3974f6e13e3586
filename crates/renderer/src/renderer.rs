//! Main renderer orchestration.
//!
//! [`Renderer`] owns every Vulkan object of the viewer. Each
//! [`Renderer::draw_frame`] call runs one iteration of
//! [`FrameLoop`] with the renderer as its [`FrameBackend`].
//!
//! # Resource Destruction Order
//!
//! Vulkan objects must be destroyed dependents first:
//! 1. Wait for all GPU work to complete
//! 2. Frame slots, uniform buffers, descriptor sets
//! 3. Pipeline, pipeline layout, mesh and textures
//! 4. Swapchain (framebuffers, depth, views), then render pass
//! 5. Command pool
//! 6. Surface, device, instance
//!
//! ManuallyDrop is used to ensure correct destruction order.

use std::mem::ManuallyDrop;
use std::sync::Arc;

use ash::vk;
use tracing::{debug, error, info};

use vkpbr_core::ViewerConfig;
use vkpbr_platform::{Surface, Window};
use vkpbr_rhi::command::{CommandBuffer, CommandPool};
use vkpbr_rhi::device::Device;
use vkpbr_rhi::instance::Instance;
use vkpbr_rhi::physical_device::select_physical_device;
use vkpbr_rhi::pipeline::{
    CompareOp, CullMode, FrontFace, GraphicsPipelineBuilder, Pipeline, PipelineLayout,
};
use vkpbr_rhi::render_pass::RenderPass;
use vkpbr_rhi::shader::{Shader, ShaderStage};
use vkpbr_rhi::swapchain::{AcquireOutcome, PresentOutcome, Swapchain, wait_for_nonzero_extent};
use vkpbr_rhi::texture::Texture;
use vkpbr_rhi::vertex::Vertex;
use vkpbr_rhi::{RhiError, RhiResult};

use crate::assets::{GpuMesh, load_material};
use crate::descriptors::DescriptorBinder;
use crate::error::{RendererError, RendererResult};
use crate::frame_loop::{FrameBackend, FrameLoop};
use crate::frame_manager::FrameManager;
use crate::uniforms::{UniformBufferObject, UniformBuffers};

pub const CLEAR_COLOR: [f32; 4] = [0.012, 0.018, 0.02, 1.0];
pub const CLEAR_DEPTH: f32 = 1.0;
pub const CLEAR_STENCIL: u32 = 0;

/// Render pass clear values: color, then depth/stencil.
pub fn clear_values() -> [vk::ClearValue; 2] {
    [
        vk::ClearValue {
            color: vk::ClearColorValue {
                float32: CLEAR_COLOR,
            },
        },
        vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue {
                depth: CLEAR_DEPTH,
                stencil: CLEAR_STENCIL,
            },
        },
    ]
}

/// Viewport and scissor covering the whole `extent`.
pub fn full_viewport(extent: vk::Extent2D) -> (vk::Viewport, vk::Rect2D) {
    let viewport = vk::Viewport {
        x: 0.0,
        y: 0.0,
        width: extent.width as f32,
        height: extent.height as f32,
        min_depth: 0.0,
        max_depth: 1.0,
    };
    let scissor = vk::Rect2D {
        offset: vk::Offset2D { x: 0, y: 0 },
        extent,
    };
    (viewport, scissor)
}

/// Frame orchestrator owning all GPU state of the viewer.
pub struct Renderer {
    // Core Vulkan resources (in reverse destruction order)
    instance: ManuallyDrop<Instance>,
    device: ManuallyDrop<Arc<Device>>,
    surface: ManuallyDrop<Surface>,
    command_pool: ManuallyDrop<CommandPool>,
    render_pass: ManuallyDrop<RenderPass>,
    swapchain: ManuallyDrop<Swapchain>,

    // Scene
    textures: ManuallyDrop<Vec<Texture>>,
    mesh: ManuallyDrop<GpuMesh>,
    pipeline_layout: ManuallyDrop<PipelineLayout>,
    pipeline: ManuallyDrop<Pipeline>,

    // Per-frame resources
    descriptors: ManuallyDrop<DescriptorBinder>,
    uniforms: ManuallyDrop<UniformBuffers>,
    frames: ManuallyDrop<FrameManager>,

    /// Current slot and pending resize request.
    frame_loop: FrameLoop,
}

impl Renderer {
    /// Creates every GPU resource for `window` and uploads the assets named
    /// by `config`.
    ///
    /// # Errors
    ///
    /// Any creation or asset loading failure is fatal and returned as is.
    pub fn new(window: &Window, config: &ViewerConfig) -> RendererResult<Self> {
        config.validate()?;

        let (width, height) = window.size();
        info!("Initializing Vulkan renderer ({}x{})", width, height);

        let instance = Instance::new(config.enable_validation, &window.required_extensions()?)?;
        let surface = window.create_surface(&instance)?;

        let physical_device_info =
            select_physical_device(instance.handle(), surface.handle(), surface.loader())?;
        let device = Device::new(&instance, &physical_device_info)?;

        let command_pool = CommandPool::new(device.clone(), device.queue_families().graphics)?;

        let mut swapchain = Swapchain::create(
            &instance,
            device.clone(),
            surface.handle(),
            wait_for_nonzero_extent(window),
        )?;
        swapchain.create_image_views()?;
        swapchain.create_depth_resources(&command_pool)?;
        let depth_format = swapchain
            .depth_format()
            .ok_or_else(|| RhiError::UnsupportedFormat("depth attachment".to_string()))?;
        let render_pass = RenderPass::new(device.clone(), swapchain.format(), depth_format)?;
        swapchain.create_framebuffers(&render_pass)?;

        let mesh = GpuMesh::load(device.clone(), &command_pool, &config.asset_path(&config.model))?;
        let textures = load_material(&device, &command_pool, config)?;

        let uniforms = UniformBuffers::new(device.clone(), config.frames_in_flight)?;
        let descriptors = DescriptorBinder::new(device.clone(), &uniforms, &textures)?;

        let pipeline_layout =
            PipelineLayout::new(device.clone(), &[descriptors.layout().handle()])?;
        let pipeline =
            Self::create_pipeline(device.clone(), config, &pipeline_layout, &render_pass)?;

        let frames = FrameManager::new(device.clone(), &command_pool, config.frames_in_flight)?;

        info!(
            "Renderer initialized: {} swapchain images, {} frames in flight, {} indices",
            swapchain.image_count(),
            frames.frames_in_flight(),
            mesh.index_count()
        );

        Ok(Self {
            instance: ManuallyDrop::new(instance),
            device: ManuallyDrop::new(device),
            surface: ManuallyDrop::new(surface),
            command_pool: ManuallyDrop::new(command_pool),
            render_pass: ManuallyDrop::new(render_pass),
            swapchain: ManuallyDrop::new(swapchain),
            textures: ManuallyDrop::new(textures),
            mesh: ManuallyDrop::new(mesh),
            pipeline_layout: ManuallyDrop::new(pipeline_layout),
            pipeline: ManuallyDrop::new(pipeline),
            descriptors: ManuallyDrop::new(descriptors),
            uniforms: ManuallyDrop::new(uniforms),
            frames: ManuallyDrop::new(frames),
            frame_loop: FrameLoop::new(config.frames_in_flight),
        })
    }

    fn create_pipeline(
        device: Arc<Device>,
        config: &ViewerConfig,
        layout: &PipelineLayout,
        render_pass: &RenderPass,
    ) -> RhiResult<Pipeline> {
        let vertex_shader = Shader::from_spirv_file(
            device.clone(),
            &config.asset_path(&config.vertex_shader),
            ShaderStage::Vertex,
        )?;
        let fragment_shader = Shader::from_spirv_file(
            device.clone(),
            &config.asset_path(&config.fragment_shader),
            ShaderStage::Fragment,
        )?;

        // Shader modules are only needed until the pipeline exists.
        GraphicsPipelineBuilder::new()
            .vertex_shader(&vertex_shader)
            .fragment_shader(&fragment_shader)
            .vertex_binding(Vertex::binding_description())
            .vertex_attributes(&Vertex::attribute_descriptions())
            .cull_mode(CullMode::Back)
            .front_face(FrontFace::CounterClockwise)
            .depth_test_enable(true)
            .depth_write_enable(true)
            .depth_compare_op(CompareOp::Less)
            .render_pass(render_pass, 0)
            .build(device, layout)
    }

    /// Marks the swapchain for recreation after the next present.
    pub fn request_resize(&mut self) {
        self.frame_loop.request_resize();
    }

    /// Renders one frame, `elapsed` seconds into the animation.
    ///
    /// # Errors
    ///
    /// Submit and present failures other than a stale swapchain are fatal.
    pub fn draw_frame(&mut self, window: &Window, elapsed: f32) -> RendererResult<()> {
        let mut frame_loop = self.frame_loop;
        let result = frame_loop.run_frame(&mut FrameContext {
            renderer: self,
            window,
            elapsed,
        });
        self.frame_loop = frame_loop;
        result.map(|_| ())
    }

    /// Records the render pass for `image_index` using slot `slot`'s set.
    fn record_commands(&self, cmd: &CommandBuffer, slot: usize, image_index: u32) -> RhiResult<()> {
        let extent = self.swapchain.extent();
        let clear_values = clear_values();

        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(self.render_pass.handle())
            .framebuffer(self.swapchain.framebuffer(image_index as usize)?)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            })
            .clear_values(&clear_values);

        cmd.begin_render_pass(&begin_info);

        cmd.bind_pipeline(self.pipeline.bind_point(), self.pipeline.handle());

        let (viewport, scissor) = full_viewport(extent);
        cmd.set_viewport(&viewport);
        cmd.set_scissor(&scissor);

        cmd.bind_descriptor_sets(
            self.pipeline.bind_point(),
            self.pipeline_layout.handle(),
            0,
            &[self.descriptors.set(slot)?],
        );

        self.mesh.record_draw(cmd);

        cmd.end_render_pass();
        Ok(())
    }

    /// Blocks until the GPU has finished all submitted work.
    pub fn wait_idle(&self) -> RhiResult<()> {
        self.device.wait_idle()
    }
}

/// One `draw_frame` call's view of the renderer.
struct FrameContext<'a> {
    renderer: &'a mut Renderer,
    window: &'a Window,
    elapsed: f32,
}

impl FrameBackend for FrameContext<'_> {
    type Error = RendererError;

    fn wait_for_slot(&mut self, slot: usize) -> RendererResult<()> {
        Ok(self.renderer.frames.wait(slot)?)
    }

    fn acquire(&mut self, slot: usize) -> RendererResult<AcquireOutcome> {
        Ok(self.renderer.frames.acquire(slot, &self.renderer.swapchain)?)
    }

    fn update_uniforms(&mut self, slot: usize) -> RendererResult<()> {
        let ubo = UniformBufferObject::compute(self.elapsed, self.renderer.swapchain.extent());
        Ok(self.renderer.uniforms.update(slot, &ubo)?)
    }

    fn begin(&mut self, slot: usize) -> RendererResult<()> {
        Ok(self.renderer.frames.begin(slot)?)
    }

    fn record(&mut self, slot: usize, image_index: u32) -> RendererResult<()> {
        let renderer = &*self.renderer;
        let cmd = renderer.frames.command_buffer(slot)?;
        renderer.record_commands(cmd, slot, image_index)?;
        Ok(renderer.frames.end(slot)?)
    }

    fn submit(&mut self, slot: usize) -> RendererResult<()> {
        Ok(self.renderer.frames.submit(slot)?)
    }

    fn present(&mut self, slot: usize, image_index: u32) -> RendererResult<PresentOutcome> {
        Ok(self
            .renderer
            .frames
            .present(slot, &self.renderer.swapchain, image_index)?)
    }

    fn recreate_swapchain(&mut self) -> RendererResult<()> {
        let renderer = &mut *self.renderer;
        renderer
            .swapchain
            .recreate(self.window, &renderer.render_pass, &renderer.command_pool)?;

        let extent = renderer.swapchain.extent();
        debug!("Swapchain recreated at {}x{}", extent.width, extent.height);
        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Wait for all GPU work to complete before destroying resources
        if let Err(e) = self.device.wait_idle() {
            error!("Failed to wait for device idle during renderer drop: {}", e);
        }

        // SAFETY: each field is dropped exactly once, here, and never used
        // afterwards.
        unsafe {
            ManuallyDrop::drop(&mut self.frames);
            ManuallyDrop::drop(&mut self.uniforms);
            ManuallyDrop::drop(&mut self.descriptors);
            ManuallyDrop::drop(&mut self.pipeline);
            ManuallyDrop::drop(&mut self.pipeline_layout);
            ManuallyDrop::drop(&mut self.mesh);
            ManuallyDrop::drop(&mut self.textures);
            ManuallyDrop::drop(&mut self.swapchain);
            ManuallyDrop::drop(&mut self.render_pass);
            ManuallyDrop::drop(&mut self.command_pool);
            ManuallyDrop::drop(&mut self.surface);
            ManuallyDrop::drop(&mut self.device);
            ManuallyDrop::drop(&mut self.instance);
        }

        info!("Renderer destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_values() {
        let [color, depth] = clear_values();
        unsafe {
            assert_eq!(color.color.float32, [0.012, 0.018, 0.02, 1.0]);
            assert_eq!(depth.depth_stencil.depth, 1.0);
            assert_eq!(depth.depth_stencil.stencil, 0);
        }
    }

    #[test]
    fn test_full_viewport() {
        let extent = vk::Extent2D {
            width: 1024,
            height: 768,
        };
        let (viewport, scissor) = full_viewport(extent);
        assert_eq!((viewport.x, viewport.y), (0.0, 0.0));
        assert_eq!((viewport.width, viewport.height), (1024.0, 768.0));
        assert_eq!((viewport.min_depth, viewport.max_depth), (0.0, 1.0));
        assert_eq!(scissor.extent, extent);
        assert_eq!((scissor.offset.x, scissor.offset.y), (0, 0));
    }
}
