/// GraphicsDevice trait - every GPU call the swapchain and frame protocol make

use crate::error::Result;
use crate::graphics_device::{
    AcquireResult, BufferHandle, BufferUsage, CommandBufferHandle, Extent2D, FenceHandle, Format,
    FramebufferHandle, ImageHandle, ImageViewHandle, IndexType, PipelineDesc, PipelineHandle,
    PresentResult, QueueFamilies, Rect2D, RenderPassHandle, SemaphoreHandle, Submission,
    SurfaceCapabilities, SwapchainDesc, SwapchainHandle, Viewport,
};

/// Device bound to one presentation surface
///
/// Implemented by the Vulkan backend and by the test mock. All waits are unbounded.
/// Destroy calls never fail; the caller must guarantee the GPU no longer uses the object.
pub trait GraphicsDevice {
    // ===== SURFACE =====

    /// Queue families the device was opened with
    fn queue_families(&self) -> QueueFamilies;

    /// Fresh capability snapshot of the presentation surface
    fn surface_capabilities(&mut self) -> Result<SurfaceCapabilities>;

    // ===== SWAPCHAIN CHAIN =====

    /// Create a swapchain
    ///
    /// # Arguments
    ///
    /// * `desc` - Negotiated image count, format, extent, present mode and sharing mode
    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<SwapchainHandle>;

    /// Images owned by `swapchain`, in presentation index order
    fn swapchain_images(&mut self, swapchain: SwapchainHandle) -> Result<Vec<ImageHandle>>;

    fn destroy_swapchain(&mut self, swapchain: SwapchainHandle);

    /// Create a 2D color view (identity swizzle, one mip level, one layer)
    fn create_image_view(&mut self, image: ImageHandle, format: Format) -> Result<ImageViewHandle>;

    fn destroy_image_view(&mut self, view: ImageViewHandle);

    /// Create a framebuffer binding `view` as the only color attachment of `render_pass`
    fn create_framebuffer(
        &mut self,
        render_pass: RenderPassHandle,
        view: ImageViewHandle,
        extent: Extent2D,
    ) -> Result<FramebufferHandle>;

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle);

    // ===== STATIC RESOURCES =====

    /// Create a single-subpass render pass whose color attachment ends in present layout
    fn create_render_pass(&mut self, color_format: Format) -> Result<RenderPassHandle>;

    fn destroy_render_pass(&mut self, render_pass: RenderPassHandle);

    fn create_pipeline(&mut self, desc: &PipelineDesc<'_>) -> Result<PipelineHandle>;

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle);

    /// Create a device-local buffer holding `data`
    fn create_buffer(&mut self, usage: BufferUsage, data: &[u8]) -> Result<BufferHandle>;

    fn destroy_buffer(&mut self, buffer: BufferHandle);

    // ===== SYNCHRONIZATION =====

    fn create_semaphore(&mut self) -> Result<SemaphoreHandle>;

    fn destroy_semaphore(&mut self, semaphore: SemaphoreHandle);

    /// Create a fence, optionally already signaled
    fn create_fence(&mut self, signaled: bool) -> Result<FenceHandle>;

    fn destroy_fence(&mut self, fence: FenceHandle);

    /// Block until `fence` is signaled
    fn wait_for_fence(&mut self, fence: FenceHandle) -> Result<()>;

    fn reset_fence(&mut self, fence: FenceHandle) -> Result<()>;

    // ===== COMMAND RECORDING =====

    fn allocate_command_buffer(&mut self) -> Result<CommandBufferHandle>;

    fn free_command_buffer(&mut self, command_buffer: CommandBufferHandle);

    /// Reset and begin recording
    fn begin_command_buffer(&mut self, command_buffer: CommandBufferHandle) -> Result<()>;

    fn end_command_buffer(&mut self, command_buffer: CommandBufferHandle) -> Result<()>;

    fn cmd_begin_render_pass(
        &mut self,
        command_buffer: CommandBufferHandle,
        render_pass: RenderPassHandle,
        framebuffer: FramebufferHandle,
        extent: Extent2D,
        clear_color: [f32; 4],
    );

    fn cmd_bind_pipeline(&mut self, command_buffer: CommandBufferHandle, pipeline: PipelineHandle);

    fn cmd_bind_vertex_buffer(&mut self, command_buffer: CommandBufferHandle, buffer: BufferHandle);

    fn cmd_bind_index_buffer(
        &mut self,
        command_buffer: CommandBufferHandle,
        buffer: BufferHandle,
        index_type: IndexType,
    );

    fn cmd_set_viewport(&mut self, command_buffer: CommandBufferHandle, viewport: Viewport);

    fn cmd_set_scissor(&mut self, command_buffer: CommandBufferHandle, scissor: Rect2D);

    fn cmd_draw_indexed(&mut self, command_buffer: CommandBufferHandle, index_count: u32);

    fn cmd_end_render_pass(&mut self, command_buffer: CommandBufferHandle);

    // ===== QUEUE OPERATIONS =====

    /// Acquire the next presentable image, signaling `signal_semaphore` when it is ready
    fn acquire_next_image(
        &mut self,
        swapchain: SwapchainHandle,
        signal_semaphore: SemaphoreHandle,
    ) -> Result<AcquireResult>;

    /// Submit one command buffer to the graphics queue
    fn submit(&mut self, submission: &Submission) -> Result<()>;

    /// Queue `image_index` for presentation once `wait_semaphore` is signaled
    fn present(
        &mut self,
        swapchain: SwapchainHandle,
        image_index: u32,
        wait_semaphore: SemaphoreHandle,
    ) -> Result<PresentResult>;

    /// Block until every queue of the device is idle
    fn wait_idle(&mut self) -> Result<()>;
}
