//! Frame slots and the GPU side of the per-frame protocol.
//!
//! The [`FrameManager`] owns N slots. Each slot has its own command buffer,
//! "image available" and "render finished" semaphores, and an in-flight
//! fence. Every operation takes the slot index explicitly; which slot runs
//! next is decided by [`FrameLoop`](crate::frame_loop::FrameLoop).
//!
//! The fence is reset in [`begin`](FrameManager::begin), once a submission
//! is certain. If acquire reports a stale swapchain the iteration ends with
//! the fence still signaled.

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use vkpbr_rhi::RhiResult;
use vkpbr_rhi::command::{CommandBuffer, CommandPool};
use vkpbr_rhi::device::Device;
use vkpbr_rhi::swapchain::{AcquireOutcome, PresentOutcome, Swapchain};
use vkpbr_rhi::sync::FrameSync;

use crate::per_frame::PerFrame;

/// Resources exclusively owned by one frame in flight.
struct FrameSlot {
    command_buffer: CommandBuffer,
    sync: FrameSync,
}

pub struct FrameManager {
    device: Arc<Device>,
    slots: PerFrame<FrameSlot>,
}

impl FrameManager {
    /// Creates `frames_in_flight` slots with command buffers from
    /// `command_pool`.
    pub fn new(
        device: Arc<Device>,
        command_pool: &CommandPool,
        frames_in_flight: usize,
    ) -> RhiResult<Self> {
        let count = frames_in_flight.max(1);
        let command_buffers = command_pool.allocate_command_buffers(count as u32)?;

        let mut slots = Vec::with_capacity(count);
        for (i, command_buffer) in command_buffers.into_iter().enumerate() {
            let sync = FrameSync::new(device.clone())?;
            debug!("Created frame slot {}", i);
            slots.push(FrameSlot {
                command_buffer,
                sync,
            });
        }

        info!("Frame manager created with {} frames in flight", count);

        Ok(Self {
            device,
            slots: PerFrame::new("frame slot", slots),
        })
    }

    #[inline]
    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }

    /// Command buffer of `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::ResourceBounds`](vkpbr_rhi::RhiError::ResourceBounds)
    /// when `slot >= frames_in_flight`.
    pub fn command_buffer(&self, slot: usize) -> RhiResult<&CommandBuffer> {
        Ok(&self.slots.get(slot)?.command_buffer)
    }

    /// Blocks until the GPU has retired `slot`'s last submission.
    pub fn wait(&self, slot: usize) -> RhiResult<()> {
        self.slots.get(slot)?.sync.in_flight().wait(u64::MAX)
    }

    /// Acquires the next swapchain image, signalling `slot`'s
    /// "image available" semaphore.
    pub fn acquire(&self, slot: usize, swapchain: &Swapchain) -> RhiResult<AcquireOutcome> {
        let semaphore = self.slots.get(slot)?.sync.image_available().handle();
        swapchain.acquire_next_image(semaphore)
    }

    /// Resets `slot`'s fence and command buffer and begins recording.
    pub fn begin(&self, slot: usize) -> RhiResult<()> {
        let slot = self.slots.get(slot)?;
        slot.sync.in_flight().reset()?;
        slot.command_buffer.reset()?;
        slot.command_buffer.begin()
    }

    pub fn end(&self, slot: usize) -> RhiResult<()> {
        self.slots.get(slot)?.command_buffer.end()
    }

    /// Submits `slot`'s command buffer to the graphics queue.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::Submit`](vkpbr_rhi::RhiError::Submit) on driver
    /// failure; not retried.
    pub fn submit(&self, slot: usize) -> RhiResult<()> {
        let slot = self.slots.get(slot)?;

        let wait_semaphores = [slot.sync.image_available().handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [slot.sync.render_finished().handle()];
        let command_buffers = [slot.command_buffer.handle()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        // SAFETY: the buffer was ended by end() and the fence was reset by
        // begin() after its previous submission retired.
        unsafe {
            self.device
                .submit_graphics(&[submit_info], slot.sync.in_flight().handle())
        }
    }

    /// Presents `image_index` once `slot`'s rendering finishes.
    pub fn present(
        &self,
        slot: usize,
        swapchain: &Swapchain,
        image_index: u32,
    ) -> RhiResult<PresentOutcome> {
        let semaphore = self.slots.get(slot)?.sync.render_finished().handle();
        let outcome = swapchain.present(self.device.present_queue(), image_index, semaphore)?;

        if outcome == PresentOutcome::NeedsRecreate {
            debug!("Swapchain out of date or suboptimal during present");
        }

        Ok(outcome)
    }
}
