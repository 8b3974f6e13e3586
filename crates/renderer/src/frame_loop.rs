//! Sequencing of one frame, independent of the GPU.
//!
//! [`FrameLoop::run_frame`] drives a [`FrameBackend`] through one iteration
//! for the current slot:
//!
//! ```text
//! wait -> acquire -+- stale -------------------------------> recreate (slot kept)
//!                  +- ready -> update -> begin -> record -> submit -> present
//!                                     -> [recreate if stale/suboptimal/resized] -> advance
//! ```
//!
//! `begin` is where the slot's fence is reset, so a skipped iteration leaves
//! the fence signaled and the next wait on the same slot returns at once.

use tracing::debug;

use vkpbr_rhi::swapchain::{AcquireOutcome, PresentOutcome};

/// Round-robin index over `count` frame slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameCursor {
    current: usize,
    count: usize,
}

impl FrameCursor {
    /// Cursor at slot 0. `count` must be at least 1.
    pub fn new(count: usize) -> Self {
        Self {
            current: 0,
            count: count.max(1),
        }
    }

    #[inline]
    pub fn current(&self) -> usize {
        self.current
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Moves to the next slot and returns its index.
    pub fn advance(&mut self) -> usize {
        self.current = (self.current + 1) % self.count;
        self.current
    }
}

/// What to do with the image returned by acquire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStep {
    /// The swapchain is stale: recreate it and skip this iteration.
    Recreate,
    /// Render into `image_index`.
    Render { image_index: u32, suboptimal: bool },
}

impl FrameStep {
    pub fn after_acquire(outcome: AcquireOutcome) -> Self {
        match outcome {
            AcquireOutcome::OutOfDate => FrameStep::Recreate,
            AcquireOutcome::Ready {
                image_index,
                suboptimal,
            } => FrameStep::Render {
                image_index,
                suboptimal,
            },
        }
    }
}

/// Whether the swapchain must be rebuilt once a frame has been presented.
pub fn recreate_after_present(
    outcome: PresentOutcome,
    acquired_suboptimal: bool,
    resize_requested: bool,
) -> bool {
    outcome == PresentOutcome::NeedsRecreate || acquired_suboptimal || resize_requested
}

/// The GPU operations one frame is made of, addressed by slot.
pub trait FrameBackend {
    type Error;

    /// Blocks until the slot's fence is signaled.
    fn wait_for_slot(&mut self, slot: usize) -> Result<(), Self::Error>;

    /// Acquires an image, signalling the slot's "image available" semaphore.
    fn acquire(&mut self, slot: usize) -> Result<AcquireOutcome, Self::Error>;

    /// Writes the slot's uniform buffer.
    fn update_uniforms(&mut self, slot: usize) -> Result<(), Self::Error>;

    /// Resets the slot's fence and command buffer and begins recording.
    fn begin(&mut self, slot: usize) -> Result<(), Self::Error>;

    /// Records the frame for `image_index` and ends the command buffer.
    fn record(&mut self, slot: usize, image_index: u32) -> Result<(), Self::Error>;

    /// Submits the slot's commands, signalling its fence on completion.
    fn submit(&mut self, slot: usize) -> Result<(), Self::Error>;

    fn present(&mut self, slot: usize, image_index: u32) -> Result<PresentOutcome, Self::Error>;

    /// Runs the resize protocol.
    fn recreate_swapchain(&mut self) -> Result<(), Self::Error>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The swapchain was stale at acquire; nothing was submitted.
    Skipped,
    Presented { recreated: bool },
}

/// Slot cursor and pending resize request.
#[derive(Clone, Copy, Debug)]
pub struct FrameLoop {
    cursor: FrameCursor,
    resize_requested: bool,
}

impl FrameLoop {
    pub fn new(frames_in_flight: usize) -> Self {
        Self {
            cursor: FrameCursor::new(frames_in_flight),
            resize_requested: false,
        }
    }

    /// Recreates the swapchain after the next present.
    pub fn request_resize(&mut self) {
        self.resize_requested = true;
    }

    #[inline]
    pub fn current_slot(&self) -> usize {
        self.cursor.current()
    }

    /// Runs one iteration for the current slot.
    ///
    /// # Errors
    ///
    /// Backend errors end the iteration immediately; the slot is not
    /// advanced.
    pub fn run_frame<B: FrameBackend>(&mut self, backend: &mut B) -> Result<FrameOutcome, B::Error> {
        let slot = self.cursor.current();

        backend.wait_for_slot(slot)?;

        let (image_index, suboptimal) = match FrameStep::after_acquire(backend.acquire(slot)?) {
            FrameStep::Recreate => {
                debug!("Swapchain out of date at acquire, skipping slot {}", slot);
                backend.recreate_swapchain()?;
                self.resize_requested = false;
                return Ok(FrameOutcome::Skipped);
            }
            FrameStep::Render {
                image_index,
                suboptimal,
            } => (image_index, suboptimal),
        };

        backend.update_uniforms(slot)?;
        backend.begin(slot)?;
        backend.record(slot, image_index)?;
        backend.submit(slot)?;

        let presented = backend.present(slot, image_index)?;
        let recreated = recreate_after_present(presented, suboptimal, self.resize_requested);
        if recreated {
            backend.recreate_swapchain()?;
            self.resize_requested = false;
        }

        self.cursor.advance();
        Ok(FrameOutcome::Presented { recreated })
    }
}
