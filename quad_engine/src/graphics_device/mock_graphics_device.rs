/// Mock graphics device for unit tests (no GPU required)
///
/// Models just enough of a real device to check the frame protocol: object lifetimes,
/// fence states, binary semaphore states and command buffers in flight. Every call is
/// appended to an ordered ledger that tests inspect.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::engine_bail;
use crate::error::{Error, Result};
use crate::graphics_device::{
    AcquireResult, BufferHandle, BufferUsage, ColorSpace, CommandBufferHandle, Extent2D,
    FenceHandle, Format, FramebufferHandle, GraphicsDevice, ImageHandle, ImageViewHandle,
    IndexType, PipelineDesc, PipelineHandle, PresentMode, PresentResult, QueueFamilies, Rect2D,
    RenderPassHandle, SemaphoreHandle, SharingMode, Submission, SurfaceCapabilities,
    SurfaceFormat, SurfaceTransform, SwapchainDesc, SwapchainHandle, Viewport,
};

// ============================================================================
// Ledger types
// ============================================================================

/// Kind of GPU object tracked by the mock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Swapchain,
    ImageView,
    Framebuffer,
    RenderPass,
    Pipeline,
    Buffer,
    Semaphore,
    Fence,
    CommandBuffer,
}

/// Operation that can be scripted to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    SurfaceCapabilities,
    CreateSwapchain,
    CreateImageView,
    CreateFramebuffer,
    CreateRenderPass,
    CreatePipeline,
    CreateBuffer,
    AcquireNextImage,
    Submit,
    Present,
    WaitIdle,
}

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    CreateSwapchain { swapchain: SwapchainHandle, desc: SwapchainDesc },
    DestroySwapchain(SwapchainHandle),
    CreateImageView(ImageViewHandle),
    DestroyImageView(ImageViewHandle),
    CreateFramebuffer { framebuffer: FramebufferHandle, view: ImageViewHandle, extent: Extent2D },
    DestroyFramebuffer(FramebufferHandle),
    CreateRenderPass(RenderPassHandle),
    DestroyRenderPass(RenderPassHandle),
    CreatePipeline(PipelineHandle),
    DestroyPipeline(PipelineHandle),
    CreateBuffer { buffer: BufferHandle, usage: BufferUsage, size: usize },
    DestroyBuffer(BufferHandle),
    WaitForFence { fence: FenceHandle, observed_submission: Option<u64> },
    ResetFence(FenceHandle),
    AcquireNextImage { swapchain: SwapchainHandle, result: AcquireResult },
    BeginCommandBuffer(CommandBufferHandle),
    Record { command_buffer: CommandBufferHandle, command: RecordedCommand },
    EndCommandBuffer(CommandBufferHandle),
    Submit { serial: u64, submission: Submission },
    Present { image_index: u32, result: PresentResult },
    WaitIdle,
}

/// Command recorded into a command buffer
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    BeginRenderPass { framebuffer: FramebufferHandle, extent: Extent2D },
    BindPipeline(PipelineHandle),
    BindVertexBuffer(BufferHandle),
    BindIndexBuffer(BufferHandle, IndexType),
    SetViewport(Viewport),
    SetScissor(Rect2D),
    DrawIndexed(u32),
    EndRenderPass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FenceState {
    /// Signaled at creation (`None`) or by the completion of a submission
    Signaled(Option<u64>),
    Unsignaled,
    /// Submitted, completes on the next wait
    Pending(u64),
}

struct MockSwapchain {
    images: Vec<ImageHandle>,
    next_image: u32,
}

struct ScriptedFailure {
    remaining_successes: u32,
    error: Error,
}

// ============================================================================
// Mock device
// ============================================================================

/// In-memory `GraphicsDevice`
pub struct MockGraphicsDevice {
    /// Ordered ledger of every call
    pub calls: Vec<MockCall>,
    /// Snapshot returned by `surface_capabilities`
    pub capabilities: SurfaceCapabilities,
    /// Families returned by `queue_families`
    pub queue_families: QueueFamilies,
    /// Destroy calls on handles that were not live
    pub invalid_destroys: Vec<(ResourceKind, u64)>,
    /// Largest number of command buffers pending at once
    pub max_in_flight: usize,

    next_id: u64,
    next_serial: u64,
    live: FxHashSet<(ResourceKind, u64)>,
    created: FxHashMap<ResourceKind, u32>,
    destroyed: FxHashMap<ResourceKind, u32>,
    swapchains: FxHashMap<SwapchainHandle, MockSwapchain>,
    fences: FxHashMap<FenceHandle, FenceState>,
    semaphores: FxHashMap<SemaphoreHandle, bool>,
    /// fence -> command buffer of the submission it guards
    in_flight: FxHashMap<FenceHandle, CommandBufferHandle>,
    acquire_script: VecDeque<AcquireResult>,
    present_script: VecDeque<PresentResult>,
    surface_extent_script: VecDeque<Extent2D>,
    failures: FxHashMap<MockOp, ScriptedFailure>,
}

impl MockGraphicsDevice {
    /// Device with a typical desktop surface of `width` x `height`
    ///
    /// min 2 / max 8 images, BGRA8 sRGB + RGBA8 unorm formats, FIFO + MAILBOX,
    /// graphics and present on the same family.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_capabilities(SurfaceCapabilities {
            min_image_count: 2,
            max_image_count: 8,
            current_extent: Extent2D::new(width, height),
            min_image_extent: Extent2D::new(1, 1),
            max_image_extent: Extent2D::new(4096, 4096),
            current_transform: SurfaceTransform::IDENTITY,
            formats: vec![
                SurfaceFormat::new(Format::R8G8B8A8_UNORM, ColorSpace::SrgbNonlinear),
                SurfaceFormat::new(Format::B8G8R8A8_SRGB, ColorSpace::SrgbNonlinear),
            ],
            present_modes: vec![PresentMode::Fifo, PresentMode::Mailbox],
        })
    }

    /// Device reporting exactly `capabilities`
    pub fn with_capabilities(capabilities: SurfaceCapabilities) -> Self {
        Self {
            calls: Vec::new(),
            capabilities,
            queue_families: QueueFamilies { graphics: 0, present: 0 },
            invalid_destroys: Vec::new(),
            max_in_flight: 0,
            next_id: 1,
            next_serial: 0,
            live: FxHashSet::default(),
            created: FxHashMap::default(),
            destroyed: FxHashMap::default(),
            swapchains: FxHashMap::default(),
            fences: FxHashMap::default(),
            semaphores: FxHashMap::default(),
            in_flight: FxHashMap::default(),
            acquire_script: VecDeque::new(),
            present_script: VecDeque::new(),
            surface_extent_script: VecDeque::new(),
            failures: FxHashMap::default(),
        }
    }

    // ===== SCRIPTING =====

    /// Simulate a window resize: the surface now reports `extent`
    pub fn set_surface_extent(&mut self, extent: Extent2D) {
        self.capabilities.current_extent = extent;
    }

    /// Queue current extents reported by the next capability queries
    ///
    /// Each query applies the next queued extent; once the queue is empty the last one sticks.
    pub fn script_surface_extents(&mut self, extents: impl IntoIterator<Item = Extent2D>) {
        self.surface_extent_script.extend(extents);
    }

    /// Queue outcomes for the next acquires (default: next image round-robin)
    pub fn script_acquire(&mut self, results: impl IntoIterator<Item = AcquireResult>) {
        self.acquire_script.extend(results);
    }

    /// Queue outcomes for the next presents (default: `Presented`)
    pub fn script_present(&mut self, results: impl IntoIterator<Item = PresentResult>) {
        self.present_script.extend(results);
    }

    /// Let `op` succeed `after` more times, then fail once with `error`
    pub fn fail_after(&mut self, op: MockOp, after: u32, error: Error) {
        self.failures.insert(op, ScriptedFailure { remaining_successes: after, error });
    }

    // ===== INSPECTION =====

    pub fn created_count(&self, kind: ResourceKind) -> u32 {
        self.created.get(&kind).copied().unwrap_or(0)
    }

    pub fn destroyed_count(&self, kind: ResourceKind) -> u32 {
        self.destroyed.get(&kind).copied().unwrap_or(0)
    }

    pub fn live_count(&self, kind: ResourceKind) -> usize {
        self.live.iter().filter(|(k, _)| *k == kind).count()
    }

    /// Total number of live objects of every kind
    pub fn total_live(&self) -> usize {
        self.live.len()
    }

    /// Command buffers submitted and not yet observed complete
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Commands recorded into `command_buffer` since its last begin
    pub fn recorded_commands(&self, command_buffer: CommandBufferHandle) -> Vec<RecordedCommand> {
        let begin = self
            .calls
            .iter()
            .rposition(|c| *c == MockCall::BeginCommandBuffer(command_buffer))
            .unwrap_or(0);
        self.calls[begin..]
            .iter()
            .filter_map(|c| match c {
                MockCall::Record { command_buffer: cb, command } if *cb == command_buffer => {
                    Some(command.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Every `Submit` in call order
    pub fn submissions(&self) -> Vec<(u64, Submission)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                MockCall::Submit { serial, submission } => Some((*serial, *submission)),
                _ => None,
            })
            .collect()
    }

    /// Every `WaitForFence` in call order
    pub fn fence_waits(&self) -> Vec<(FenceHandle, Option<u64>)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                MockCall::WaitForFence { fence, observed_submission } => {
                    Some((*fence, *observed_submission))
                }
                _ => None,
            })
            .collect()
    }

    pub fn count_calls(&self, predicate: impl Fn(&MockCall) -> bool) -> usize {
        self.calls.iter().filter(|c| predicate(c)).count()
    }

    // ===== INTERNALS =====

    fn check_failure(&mut self, op: MockOp) -> Result<()> {
        if let Some(failure) = self.failures.get_mut(&op) {
            if failure.remaining_successes == 0 {
                let error = failure.error.clone();
                self.failures.remove(&op);
                return Err(error);
            }
            failure.remaining_successes -= 1;
        }
        Ok(())
    }

    fn allocate(&mut self, kind: ResourceKind) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert((kind, id));
        *self.created.entry(kind).or_insert(0) += 1;
        id
    }

    fn release(&mut self, kind: ResourceKind, id: u64) {
        if self.live.remove(&(kind, id)) {
            *self.destroyed.entry(kind).or_insert(0) += 1;
        } else {
            self.invalid_destroys.push((kind, id));
        }
    }

    fn record(&mut self, command_buffer: CommandBufferHandle, command: RecordedCommand) {
        self.calls.push(MockCall::Record { command_buffer, command });
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn queue_families(&self) -> QueueFamilies {
        self.queue_families
    }

    fn surface_capabilities(&mut self) -> Result<SurfaceCapabilities> {
        self.check_failure(MockOp::SurfaceCapabilities)?;
        if let Some(extent) = self.surface_extent_script.pop_front() {
            self.capabilities.current_extent = extent;
        }
        Ok(self.capabilities.clone())
    }

    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<SwapchainHandle> {
        self.check_failure(MockOp::CreateSwapchain)?;
        if desc.extent.has_zero_area() {
            engine_bail!("quad::MockGraphicsDevice", "Swapchain extent {:?} has zero area", desc.extent);
        }
        let handle = SwapchainHandle::from_raw(self.allocate(ResourceKind::Swapchain));
        let images = (0..desc.image_count)
            .map(|_| {
                let id = self.next_id;
                self.next_id += 1;
                ImageHandle::from_raw(id)
            })
            .collect();
        self.swapchains.insert(handle, MockSwapchain { images, next_image: 0 });
        self.calls.push(MockCall::CreateSwapchain { swapchain: handle, desc: desc.clone() });
        Ok(handle)
    }

    fn swapchain_images(&mut self, swapchain: SwapchainHandle) -> Result<Vec<ImageHandle>> {
        match self.swapchains.get(&swapchain) {
            Some(chain) => Ok(chain.images.clone()),
            None => Err(Error::InvalidResource(format!("unknown swapchain {:?}", swapchain))),
        }
    }

    fn destroy_swapchain(&mut self, swapchain: SwapchainHandle) {
        self.swapchains.remove(&swapchain);
        self.release(ResourceKind::Swapchain, swapchain.as_raw());
        self.calls.push(MockCall::DestroySwapchain(swapchain));
    }

    fn create_image_view(&mut self, _image: ImageHandle, _format: Format) -> Result<ImageViewHandle> {
        self.check_failure(MockOp::CreateImageView)?;
        let view = ImageViewHandle::from_raw(self.allocate(ResourceKind::ImageView));
        self.calls.push(MockCall::CreateImageView(view));
        Ok(view)
    }

    fn destroy_image_view(&mut self, view: ImageViewHandle) {
        self.release(ResourceKind::ImageView, view.as_raw());
        self.calls.push(MockCall::DestroyImageView(view));
    }

    fn create_framebuffer(
        &mut self,
        _render_pass: RenderPassHandle,
        view: ImageViewHandle,
        extent: Extent2D,
    ) -> Result<FramebufferHandle> {
        self.check_failure(MockOp::CreateFramebuffer)?;
        if !self.live.contains(&(ResourceKind::ImageView, view.as_raw())) {
            engine_bail!("quad::MockGraphicsDevice", "Framebuffer references dead view {:?}", view);
        }
        let framebuffer = FramebufferHandle::from_raw(self.allocate(ResourceKind::Framebuffer));
        self.calls.push(MockCall::CreateFramebuffer { framebuffer, view, extent });
        Ok(framebuffer)
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        self.release(ResourceKind::Framebuffer, framebuffer.as_raw());
        self.calls.push(MockCall::DestroyFramebuffer(framebuffer));
    }

    fn create_render_pass(&mut self, _color_format: Format) -> Result<RenderPassHandle> {
        self.check_failure(MockOp::CreateRenderPass)?;
        let render_pass = RenderPassHandle::from_raw(self.allocate(ResourceKind::RenderPass));
        self.calls.push(MockCall::CreateRenderPass(render_pass));
        Ok(render_pass)
    }

    fn destroy_render_pass(&mut self, render_pass: RenderPassHandle) {
        self.release(ResourceKind::RenderPass, render_pass.as_raw());
        self.calls.push(MockCall::DestroyRenderPass(render_pass));
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc<'_>) -> Result<PipelineHandle> {
        self.check_failure(MockOp::CreatePipeline)?;
        if desc.vertex_shader.is_empty() || desc.fragment_shader.is_empty() {
            engine_bail!("quad::MockGraphicsDevice", "Pipeline created with empty shader code");
        }
        let pipeline = PipelineHandle::from_raw(self.allocate(ResourceKind::Pipeline));
        self.calls.push(MockCall::CreatePipeline(pipeline));
        Ok(pipeline)
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle) {
        self.release(ResourceKind::Pipeline, pipeline.as_raw());
        self.calls.push(MockCall::DestroyPipeline(pipeline));
    }

    fn create_buffer(&mut self, usage: BufferUsage, data: &[u8]) -> Result<BufferHandle> {
        self.check_failure(MockOp::CreateBuffer)?;
        let buffer = BufferHandle::from_raw(self.allocate(ResourceKind::Buffer));
        self.calls.push(MockCall::CreateBuffer { buffer, usage, size: data.len() });
        Ok(buffer)
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        self.release(ResourceKind::Buffer, buffer.as_raw());
        self.calls.push(MockCall::DestroyBuffer(buffer));
    }

    fn create_semaphore(&mut self) -> Result<SemaphoreHandle> {
        let semaphore = SemaphoreHandle::from_raw(self.allocate(ResourceKind::Semaphore));
        self.semaphores.insert(semaphore, false);
        Ok(semaphore)
    }

    fn destroy_semaphore(&mut self, semaphore: SemaphoreHandle) {
        self.semaphores.remove(&semaphore);
        self.release(ResourceKind::Semaphore, semaphore.as_raw());
    }

    fn create_fence(&mut self, signaled: bool) -> Result<FenceHandle> {
        let fence = FenceHandle::from_raw(self.allocate(ResourceKind::Fence));
        let state = if signaled { FenceState::Signaled(None) } else { FenceState::Unsignaled };
        self.fences.insert(fence, state);
        Ok(fence)
    }

    fn destroy_fence(&mut self, fence: FenceHandle) {
        self.fences.remove(&fence);
        self.release(ResourceKind::Fence, fence.as_raw());
    }

    fn wait_for_fence(&mut self, fence: FenceHandle) -> Result<()> {
        let observed = match self.fences.get(&fence).copied() {
            Some(FenceState::Signaled(by)) => by,
            Some(FenceState::Pending(serial)) => {
                self.in_flight.remove(&fence);
                self.fences.insert(fence, FenceState::Signaled(Some(serial)));
                Some(serial)
            }
            Some(FenceState::Unsignaled) => {
                engine_bail!("quad::MockGraphicsDevice",
                    "Wait on fence {:?} that is unsignaled with no pending work (would never return)", fence);
            }
            None => return Err(Error::InvalidResource(format!("unknown fence {:?}", fence))),
        };
        self.calls.push(MockCall::WaitForFence { fence, observed_submission: observed });
        Ok(())
    }

    fn reset_fence(&mut self, fence: FenceHandle) -> Result<()> {
        match self.fences.get(&fence).copied() {
            Some(FenceState::Pending(_)) => {
                engine_bail!("quad::MockGraphicsDevice", "Reset of fence {:?} still in use", fence);
            }
            Some(_) => {
                self.fences.insert(fence, FenceState::Unsignaled);
                self.calls.push(MockCall::ResetFence(fence));
                Ok(())
            }
            None => Err(Error::InvalidResource(format!("unknown fence {:?}", fence))),
        }
    }

    fn allocate_command_buffer(&mut self) -> Result<CommandBufferHandle> {
        Ok(CommandBufferHandle::from_raw(self.allocate(ResourceKind::CommandBuffer)))
    }

    fn free_command_buffer(&mut self, command_buffer: CommandBufferHandle) {
        self.release(ResourceKind::CommandBuffer, command_buffer.as_raw());
    }

    fn begin_command_buffer(&mut self, command_buffer: CommandBufferHandle) -> Result<()> {
        if self.in_flight.values().any(|cb| *cb == command_buffer) {
            engine_bail!("quad::MockGraphicsDevice",
                "Command buffer {:?} re-recorded while still in flight", command_buffer);
        }
        self.calls.push(MockCall::BeginCommandBuffer(command_buffer));
        Ok(())
    }

    fn end_command_buffer(&mut self, command_buffer: CommandBufferHandle) -> Result<()> {
        self.calls.push(MockCall::EndCommandBuffer(command_buffer));
        Ok(())
    }

    fn cmd_begin_render_pass(
        &mut self,
        command_buffer: CommandBufferHandle,
        _render_pass: RenderPassHandle,
        framebuffer: FramebufferHandle,
        extent: Extent2D,
        _clear_color: [f32; 4],
    ) {
        self.record(command_buffer, RecordedCommand::BeginRenderPass { framebuffer, extent });
    }

    fn cmd_bind_pipeline(&mut self, command_buffer: CommandBufferHandle, pipeline: PipelineHandle) {
        self.record(command_buffer, RecordedCommand::BindPipeline(pipeline));
    }

    fn cmd_bind_vertex_buffer(&mut self, command_buffer: CommandBufferHandle, buffer: BufferHandle) {
        self.record(command_buffer, RecordedCommand::BindVertexBuffer(buffer));
    }

    fn cmd_bind_index_buffer(
        &mut self,
        command_buffer: CommandBufferHandle,
        buffer: BufferHandle,
        index_type: IndexType,
    ) {
        self.record(command_buffer, RecordedCommand::BindIndexBuffer(buffer, index_type));
    }

    fn cmd_set_viewport(&mut self, command_buffer: CommandBufferHandle, viewport: Viewport) {
        self.record(command_buffer, RecordedCommand::SetViewport(viewport));
    }

    fn cmd_set_scissor(&mut self, command_buffer: CommandBufferHandle, scissor: Rect2D) {
        self.record(command_buffer, RecordedCommand::SetScissor(scissor));
    }

    fn cmd_draw_indexed(&mut self, command_buffer: CommandBufferHandle, index_count: u32) {
        self.record(command_buffer, RecordedCommand::DrawIndexed(index_count));
    }

    fn cmd_end_render_pass(&mut self, command_buffer: CommandBufferHandle) {
        self.record(command_buffer, RecordedCommand::EndRenderPass);
    }

    fn acquire_next_image(
        &mut self,
        swapchain: SwapchainHandle,
        signal_semaphore: SemaphoreHandle,
    ) -> Result<AcquireResult> {
        self.check_failure(MockOp::AcquireNextImage)?;
        if self.semaphores.get(&signal_semaphore).copied().unwrap_or(false) {
            engine_bail!("quad::MockGraphicsDevice",
                "Acquire signals semaphore {:?} that is already signaled", signal_semaphore);
        }
        let result = match self.acquire_script.pop_front() {
            Some(scripted) => scripted,
            None => {
                let chain = self.swapchains.get_mut(&swapchain).ok_or_else(|| {
                    Error::InvalidResource(format!("unknown swapchain {:?}", swapchain))
                })?;
                let image_index = chain.next_image;
                chain.next_image = (chain.next_image + 1) % chain.images.len().max(1) as u32;
                AcquireResult::Acquired { image_index, suboptimal: false }
            }
        };
        if let AcquireResult::Acquired { .. } = result {
            self.semaphores.insert(signal_semaphore, true);
        }
        self.calls.push(MockCall::AcquireNextImage { swapchain, result });
        Ok(result)
    }

    fn submit(&mut self, submission: &Submission) -> Result<()> {
        self.check_failure(MockOp::Submit)?;
        if !self.semaphores.get(&submission.wait_semaphore).copied().unwrap_or(false) {
            engine_bail!("quad::MockGraphicsDevice",
                "Submit waits on semaphore {:?} that nothing signaled", submission.wait_semaphore);
        }
        if self.fences.get(&submission.fence) != Some(&FenceState::Unsignaled) {
            engine_bail!("quad::MockGraphicsDevice",
                "Submit with fence {:?} that was not reset", submission.fence);
        }
        let serial = self.next_serial;
        self.next_serial += 1;
        self.semaphores.insert(submission.wait_semaphore, false);
        self.semaphores.insert(submission.signal_semaphore, true);
        self.fences.insert(submission.fence, FenceState::Pending(serial));
        self.in_flight.insert(submission.fence, submission.command_buffer);
        self.max_in_flight = self.max_in_flight.max(self.in_flight.len());
        self.calls.push(MockCall::Submit { serial, submission: *submission });
        Ok(())
    }

    fn present(
        &mut self,
        _swapchain: SwapchainHandle,
        image_index: u32,
        wait_semaphore: SemaphoreHandle,
    ) -> Result<PresentResult> {
        self.check_failure(MockOp::Present)?;
        if !self.semaphores.get(&wait_semaphore).copied().unwrap_or(false) {
            engine_bail!("quad::MockGraphicsDevice",
                "Present waits on semaphore {:?} that nothing signaled", wait_semaphore);
        }
        self.semaphores.insert(wait_semaphore, false);
        let result = self.present_script.pop_front().unwrap_or(PresentResult::Presented);
        self.calls.push(MockCall::Present { image_index, result });
        Ok(result)
    }

    fn wait_idle(&mut self) -> Result<()> {
        self.check_failure(MockOp::WaitIdle)?;
        for (fence, _) in self.in_flight.drain() {
            if let Some(FenceState::Pending(serial)) = self.fences.get(&fence).copied() {
                self.fences.insert(fence, FenceState::Signaled(Some(serial)));
            }
        }
        self.calls.push(MockCall::WaitIdle);
        Ok(())
    }
}

/// Shorthand for tests: a surface format
pub fn surface_format(format: Format) -> SurfaceFormat {
    SurfaceFormat::new(format, ColorSpace::SrgbNonlinear)
}

/// Sharing mode recorded for the most recent swapchain
pub fn last_sharing_mode(device: &MockGraphicsDevice) -> Option<SharingMode> {
    device.calls.iter().rev().find_map(|c| match c {
        MockCall::CreateSwapchain { desc, .. } => Some(desc.sharing_mode),
        _ => None,
    })
}

/// Window whose framebuffer size is scripted
///
/// Each `wait_events` pops the next queued size; once the queue is empty the last
/// size sticks. With `close_after_waits` set, the window reports closing once that
/// many event waits have happened.
pub struct MockWindow {
    pub size: Extent2D,
    pub pending_sizes: VecDeque<Extent2D>,
    pub wait_count: u32,
    pub close_after_waits: Option<u32>,
}

impl MockWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Extent2D::new(width, height),
            pending_sizes: VecDeque::new(),
            wait_count: 0,
            close_after_waits: None,
        }
    }

    /// Starts at `first`, then reports each of `then` after successive event waits
    pub fn scripted(first: Extent2D, then: impl IntoIterator<Item = Extent2D>) -> Self {
        Self {
            size: first,
            pending_sizes: then.into_iter().collect(),
            wait_count: 0,
            close_after_waits: None,
        }
    }
}

impl crate::window::WindowSurface for MockWindow {
    fn framebuffer_size(&self) -> Extent2D {
        self.size
    }

    fn wait_events(&mut self) {
        self.wait_count += 1;
        if let Some(next) = self.pending_sizes.pop_front() {
            self.size = next;
        }
    }

    fn is_closing(&self) -> bool {
        self.close_after_waits.is_some_and(|waits| self.wait_count >= waits)
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
