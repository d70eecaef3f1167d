//! Frame Scheduler
//!
//! Drives one frame per tick with up to `MAX_FRAMES_IN_FLIGHT` frames queued on the GPU.
//! Each slot owns a command buffer, an image-available semaphore, a render-finished
//! semaphore and an in-flight fence created signaled.
//!
//! Per tick, on slot `f`:
//!
//! 1. wait for `in_flight[f]`
//! 2. acquire an image signaling `image_available[f]`, aborting on out-of-date
//! 3. reset `in_flight[f]`, re-record the command buffer for the acquired image
//! 4. submit waiting `image_available[f]`, signaling `render_finished[f]` and `in_flight[f]`
//! 5. present waiting `render_finished[f]`
//! 6. advance `f` modulo `MAX_FRAMES_IN_FLIGHT`

use crate::error::{Error, Result};
use crate::graphics_device::{
    AcquireResult, CommandBufferHandle, DrawBuffers, FenceHandle, FramebufferHandle,
    GraphicsDevice, PipelineHandle, PresentResult, Rect2D, RenderPassHandle, SemaphoreHandle,
    Submission, Viewport,
};
use crate::swapchain_manager::Swapchain;
use crate::window::ResizeSignal;
use crate::{engine_debug, engine_error, engine_trace};

/// Number of frames the CPU may record ahead of the GPU
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// Why a swapchain rebuild was requested after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildReason {
    /// Acquire or present reported the swapchain out of date
    OutOfDate,
    /// Present (or acquire) succeeded but the swapchain no longer matches the surface
    Suboptimal,
    /// The window reported a framebuffer resize
    Resized,
}

/// What happened to one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Work was submitted and the image handed to the presentation engine
    Presented { frame_slot: usize, image_index: u32 },
    /// Acquire reported out-of-date; nothing was submitted
    Skipped { frame_slot: usize },
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOutcome {
    pub status: FrameStatus,
    /// Set when the swapchain must be rebuilt before the next tick
    pub rebuild: Option<RebuildReason>,
}

impl FrameOutcome {
    pub fn presented(&self) -> bool {
        matches!(self.status, FrameStatus::Presented { .. })
    }
}

/// Synchronization objects and command buffer of one frame slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSlot {
    pub command_buffer: CommandBufferHandle,
    pub image_available: SemaphoreHandle,
    pub render_finished: SemaphoreHandle,
    pub in_flight: FenceHandle,
}

impl FrameSlot {
    fn create<D: GraphicsDevice + ?Sized>(device: &mut D) -> Result<Self> {
        let command_buffer = device.allocate_command_buffer()?;

        let image_available = match device.create_semaphore() {
            Ok(semaphore) => semaphore,
            Err(e) => {
                device.free_command_buffer(command_buffer);
                return Err(e);
            }
        };

        let render_finished = match device.create_semaphore() {
            Ok(semaphore) => semaphore,
            Err(e) => {
                device.destroy_semaphore(image_available);
                device.free_command_buffer(command_buffer);
                return Err(e);
            }
        };

        // Signaled so the first wait on this slot returns immediately
        let in_flight = match device.create_fence(true) {
            Ok(fence) => fence,
            Err(e) => {
                device.destroy_semaphore(render_finished);
                device.destroy_semaphore(image_available);
                device.free_command_buffer(command_buffer);
                return Err(e);
            }
        };

        Ok(Self { command_buffer, image_available, render_finished, in_flight })
    }

    fn destroy<D: GraphicsDevice + ?Sized>(self, device: &mut D) {
        device.destroy_fence(self.in_flight);
        device.destroy_semaphore(self.render_finished);
        device.destroy_semaphore(self.image_available);
        device.free_command_buffer(self.command_buffer);
    }
}

/// Everything a tick draws into
#[derive(Debug, Clone, Copy)]
pub struct FrameTarget<'a> {
    pub swapchain: &'a Swapchain,
    pub render_pass: RenderPassHandle,
    pub pipeline: PipelineHandle,
    pub draw: DrawBuffers,
    pub clear_color: [f32; 4],
}

/// Rotates through the frame slots
pub struct FrameScheduler {
    slots: Vec<FrameSlot>,
    current_frame: usize,
}

impl FrameScheduler {
    /// Create `MAX_FRAMES_IN_FLIGHT` slots
    pub fn new<D: GraphicsDevice + ?Sized>(device: &mut D) -> Result<Self> {
        let mut slots = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        for index in 0..MAX_FRAMES_IN_FLIGHT {
            match FrameSlot::create(device) {
                Ok(slot) => slots.push(slot),
                Err(e) => {
                    engine_error!("quad::FrameScheduler", "Failed to create frame slot {}: {}", index, e);
                    for slot in slots.into_iter().rev() {
                        slot.destroy(device);
                    }
                    return Err(e);
                }
            }
        }
        engine_debug!("quad::FrameScheduler", "Created {} frame slots", MAX_FRAMES_IN_FLIGHT);
        Ok(Self { slots, current_frame: 0 })
    }

    /// Slot the next tick will use
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn slot(&self, index: usize) -> Option<&FrameSlot> {
        self.slots.get(index)
    }

    /// Run one tick
    ///
    /// Returns `Skipped` without touching the fence when the acquire reports the
    /// swapchain out of date; the slot is reused on the next tick. Any other device
    /// error is returned as is. The resize signal is consumed once per present.
    pub fn draw_frame<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        target: &FrameTarget<'_>,
        resize: &ResizeSignal,
    ) -> Result<FrameOutcome> {
        let frame_slot = self.current_frame;
        let slot = self.slots.get(frame_slot).copied().ok_or_else(|| {
            engine_error!("quad::FrameScheduler", "No frame slot {} (scheduler destroyed?)", frame_slot);
            Error::InvalidResource(format!("frame slot {} does not exist", frame_slot))
        })?;
        let swapchain = target.swapchain.handle();

        device.wait_for_fence(slot.in_flight)?;

        let (image_index, acquire_suboptimal) =
            match device.acquire_next_image(swapchain, slot.image_available)? {
                AcquireResult::Acquired { image_index, suboptimal } => (image_index, suboptimal),
                AcquireResult::OutOfDate => {
                    engine_debug!("quad::FrameScheduler", "Acquire on slot {} reported out of date", frame_slot);
                    return Ok(FrameOutcome {
                        status: FrameStatus::Skipped { frame_slot },
                        rebuild: Some(RebuildReason::OutOfDate),
                    });
                }
            };

        let framebuffer = target.swapchain.framebuffer(image_index).ok_or_else(|| {
            engine_error!("quad::FrameScheduler",
                "Acquired image {} but the swapchain has {} images", image_index, target.swapchain.image_count());
            Error::InvalidResource(format!("acquired image index {} out of range", image_index))
        })?;

        // Only reset once work is certain to be submitted with this fence
        device.reset_fence(slot.in_flight)?;

        record_frame(device, slot.command_buffer, framebuffer, target)?;

        device.submit(&Submission {
            command_buffer: slot.command_buffer,
            wait_semaphore: slot.image_available,
            signal_semaphore: slot.render_finished,
            fence: slot.in_flight,
        })?;

        let present = device.present(swapchain, image_index, slot.render_finished)?;
        let resized = resize.take();

        let rebuild = match present {
            PresentResult::OutOfDate => Some(RebuildReason::OutOfDate),
            PresentResult::Suboptimal => Some(RebuildReason::Suboptimal),
            PresentResult::Presented if resized => Some(RebuildReason::Resized),
            PresentResult::Presented if acquire_suboptimal => Some(RebuildReason::Suboptimal),
            PresentResult::Presented => None,
        };

        engine_trace!("quad::FrameScheduler",
            "Frame slot {} presented image {} ({:?})", frame_slot, image_index, present);

        self.current_frame = (self.current_frame + 1) % MAX_FRAMES_IN_FLIGHT;

        Ok(FrameOutcome {
            status: FrameStatus::Presented { frame_slot, image_index },
            rebuild,
        })
    }

    /// Destroy every slot
    ///
    /// The caller guarantees the device is idle.
    pub fn destroy<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D) {
        for slot in self.slots.drain(..).rev() {
            slot.destroy(device);
        }
        self.current_frame = 0;
    }
}

/// Re-record `command_buffer` to clear and draw into `framebuffer`
fn record_frame<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    command_buffer: CommandBufferHandle,
    framebuffer: FramebufferHandle,
    target: &FrameTarget<'_>,
) -> Result<()> {
    let extent = target.swapchain.extent();

    device.begin_command_buffer(command_buffer)?;
    device.cmd_begin_render_pass(command_buffer, target.render_pass, framebuffer, extent, target.clear_color);
    device.cmd_bind_pipeline(command_buffer, target.pipeline);
    device.cmd_bind_vertex_buffer(command_buffer, target.draw.vertex_buffer);
    device.cmd_bind_index_buffer(command_buffer, target.draw.index_buffer, target.draw.index_type);
    device.cmd_set_viewport(command_buffer, Viewport::covering(extent));
    device.cmd_set_scissor(command_buffer, Rect2D::covering(extent));
    device.cmd_draw_indexed(command_buffer, target.draw.index_count);
    device.cmd_end_render_pass(command_buffer);
    device.end_command_buffer(command_buffer)
}

#[cfg(test)]
#[path = "frame_scheduler_tests.rs"]
mod tests;
