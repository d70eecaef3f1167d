/// VulkanGraphicsDevice - Vulkan implementation of the GraphicsDevice trait

use ash::vk;
use ash::vk::Handle;
use quad_engine::quad::{Config, Error, Result};
use quad_engine::quad::render::{
    AcquireResult, BufferHandle, BufferUsage, CommandBufferHandle, Extent2D, FenceHandle, Format,
    FramebufferHandle, GraphicsDevice, ImageHandle, ImageViewHandle, IndexType, PipelineDesc,
    PipelineHandle, PresentResult, QueueFamilies, Rect2D, RenderPassHandle, SemaphoreHandle,
    Submission, SurfaceCapabilities, SwapchainDesc, SwapchainHandle, Viewport,
};
use quad_engine::{engine_info, engine_trace, engine_warn};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use rustc_hash::FxHashMap;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{check, extent_to_vk, format_to_vk, index_type_to_vk};
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_render_pass::{create_framebuffer, create_render_pass};
use crate::vulkan_swapchain;

/// Vulkan graphics device bound to one window surface
///
/// Engine handles carry the raw Vulkan handle. Buffers and pipelines own more than
/// one Vulkan object (memory, layout), so those live in side tables keyed by the
/// raw handle.
pub struct VulkanGraphicsDevice {
    buffers: FxHashMap<u64, Buffer>,
    pipelines: FxHashMap<u64, Pipeline>,
    /// Dropped last: destroys device, surface and instance
    ctx: GpuContext,
}

impl VulkanGraphicsDevice {
    /// Open a Vulkan device presenting to `window`
    ///
    /// # Arguments
    ///
    /// * `window` - Window for surface creation
    /// * `config` - Application name and validation options
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: &Config) -> Result<Self> {
        let ctx = GpuContext::new(window, config)?;
        Ok(Self {
            buffers: FxHashMap::default(),
            pipelines: FxHashMap::default(),
            ctx,
        })
    }

    /// Name of the selected physical device
    pub fn device_name(&self) -> &str {
        &self.ctx.device_name
    }

    /// True when the validation layer and debug messenger are active
    pub fn validation_enabled(&self) -> bool {
        self.ctx.validation_enabled()
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    // ===== SURFACE =====

    fn queue_families(&self) -> QueueFamilies {
        self.ctx.queue_families
    }

    fn surface_capabilities(&mut self) -> Result<SurfaceCapabilities> {
        unsafe { vulkan_swapchain::query_surface_capabilities(&self.ctx) }
    }

    // ===== SWAPCHAIN CHAIN =====

    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<SwapchainHandle> {
        let swapchain = unsafe { vulkan_swapchain::create_swapchain(&self.ctx, desc)? };
        Ok(SwapchainHandle::from_raw(swapchain.as_raw()))
    }

    fn swapchain_images(&mut self, swapchain: SwapchainHandle) -> Result<Vec<ImageHandle>> {
        let images = unsafe {
            check(
                "get swapchain images",
                self.ctx.swapchain_loader.get_swapchain_images(vk::SwapchainKHR::from_raw(swapchain.as_raw())),
            )?
        };
        Ok(images.into_iter().map(|image| ImageHandle::from_raw(image.as_raw())).collect())
    }

    fn destroy_swapchain(&mut self, swapchain: SwapchainHandle) {
        unsafe {
            self.ctx
                .swapchain_loader
                .destroy_swapchain(vk::SwapchainKHR::from_raw(swapchain.as_raw()), None);
        }
    }

    fn create_image_view(&mut self, image: ImageHandle, format: Format) -> Result<ImageViewHandle> {
        let view = unsafe {
            vulkan_swapchain::create_image_view(
                &self.ctx.device,
                vk::Image::from_raw(image.as_raw()),
                format_to_vk(format),
            )?
        };
        Ok(ImageViewHandle::from_raw(view.as_raw()))
    }

    fn destroy_image_view(&mut self, view: ImageViewHandle) {
        unsafe {
            self.ctx.device.destroy_image_view(vk::ImageView::from_raw(view.as_raw()), None);
        }
    }

    fn create_framebuffer(
        &mut self,
        render_pass: RenderPassHandle,
        view: ImageViewHandle,
        extent: Extent2D,
    ) -> Result<FramebufferHandle> {
        let framebuffer = unsafe {
            create_framebuffer(
                &self.ctx.device,
                vk::RenderPass::from_raw(render_pass.as_raw()),
                vk::ImageView::from_raw(view.as_raw()),
                extent_to_vk(extent),
            )?
        };
        Ok(FramebufferHandle::from_raw(framebuffer.as_raw()))
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        unsafe {
            self.ctx.device.destroy_framebuffer(vk::Framebuffer::from_raw(framebuffer.as_raw()), None);
        }
    }

    // ===== STATIC RESOURCES =====

    fn create_render_pass(&mut self, color_format: Format) -> Result<RenderPassHandle> {
        let render_pass = unsafe { create_render_pass(&self.ctx.device, format_to_vk(color_format))? };
        Ok(RenderPassHandle::from_raw(render_pass.as_raw()))
    }

    fn destroy_render_pass(&mut self, render_pass: RenderPassHandle) {
        unsafe {
            self.ctx.device.destroy_render_pass(vk::RenderPass::from_raw(render_pass.as_raw()), None);
        }
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc<'_>) -> Result<PipelineHandle> {
        let pipeline = unsafe {
            Pipeline::create(&self.ctx.device, desc, vk::RenderPass::from_raw(desc.render_pass.as_raw()))?
        };
        let raw = pipeline.pipeline.as_raw();
        self.pipelines.insert(raw, pipeline);
        engine_info!("quad::vulkan", "Graphics pipeline created");
        Ok(PipelineHandle::from_raw(raw))
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle) {
        match self.pipelines.remove(&pipeline.as_raw()) {
            Some(pipeline) => unsafe { pipeline.destroy(&self.ctx.device) },
            None => engine_warn!("quad::vulkan", "destroy_pipeline: unknown pipeline {:?}", pipeline),
        }
    }

    fn create_buffer(&mut self, usage: BufferUsage, data: &[u8]) -> Result<BufferHandle> {
        let buffer = unsafe { Buffer::create_device_local(&mut self.ctx, usage, data)? };
        let raw = buffer.buffer.as_raw();
        self.buffers.insert(raw, buffer);
        Ok(BufferHandle::from_raw(raw))
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        match self.buffers.remove(&buffer.as_raw()) {
            Some(buffer) => unsafe { buffer.destroy(&self.ctx.device, &mut self.ctx.allocator) },
            None => engine_warn!("quad::vulkan", "destroy_buffer: unknown buffer {:?}", buffer),
        }
    }

    // ===== SYNCHRONIZATION =====

    fn create_semaphore(&mut self) -> Result<SemaphoreHandle> {
        let semaphore_create_info = vk::SemaphoreCreateInfo::default();
        let semaphore = unsafe {
            check("create semaphore", self.ctx.device.create_semaphore(&semaphore_create_info, None))?
        };
        Ok(SemaphoreHandle::from_raw(semaphore.as_raw()))
    }

    fn destroy_semaphore(&mut self, semaphore: SemaphoreHandle) {
        unsafe {
            self.ctx.device.destroy_semaphore(vk::Semaphore::from_raw(semaphore.as_raw()), None);
        }
    }

    fn create_fence(&mut self, signaled: bool) -> Result<FenceHandle> {
        let flags = if signaled { vk::FenceCreateFlags::SIGNALED } else { vk::FenceCreateFlags::empty() };
        let fence_create_info = vk::FenceCreateInfo::default().flags(flags);
        let fence = unsafe { check("create fence", self.ctx.device.create_fence(&fence_create_info, None))? };
        Ok(FenceHandle::from_raw(fence.as_raw()))
    }

    fn destroy_fence(&mut self, fence: FenceHandle) {
        unsafe {
            self.ctx.device.destroy_fence(vk::Fence::from_raw(fence.as_raw()), None);
        }
    }

    fn wait_for_fence(&mut self, fence: FenceHandle) -> Result<()> {
        let fences = [vk::Fence::from_raw(fence.as_raw())];
        unsafe { check("wait for fence", self.ctx.device.wait_for_fences(&fences, true, u64::MAX)) }
    }

    fn reset_fence(&mut self, fence: FenceHandle) -> Result<()> {
        let fences = [vk::Fence::from_raw(fence.as_raw())];
        unsafe { check("reset fence", self.ctx.device.reset_fences(&fences)) }
    }

    // ===== COMMAND RECORDING =====

    fn allocate_command_buffer(&mut self) -> Result<CommandBufferHandle> {
        let command_buffer_allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.ctx.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let command_buffers = unsafe {
            check(
                "allocate command buffer",
                self.ctx.device.allocate_command_buffers(&command_buffer_allocate_info),
            )?
        };
        match command_buffers.first() {
            Some(command_buffer) => Ok(CommandBufferHandle::from_raw(command_buffer.as_raw())),
            None => Err(Error::BackendError("driver returned no command buffer".to_string())),
        }
    }

    fn free_command_buffer(&mut self, command_buffer: CommandBufferHandle) {
        let command_buffers = [vk::CommandBuffer::from_raw(command_buffer.as_raw())];
        unsafe {
            self.ctx.device.free_command_buffers(self.ctx.command_pool, &command_buffers);
        }
    }

    fn begin_command_buffer(&mut self, command_buffer: CommandBufferHandle) -> Result<()> {
        let command_buffer = vk::CommandBuffer::from_raw(command_buffer.as_raw());
        unsafe {
            check(
                "reset command buffer",
                self.ctx.device.reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty()),
            )?;
            let begin_info = vk::CommandBufferBeginInfo::default();
            check("begin command buffer", self.ctx.device.begin_command_buffer(command_buffer, &begin_info))
        }
    }

    fn end_command_buffer(&mut self, command_buffer: CommandBufferHandle) -> Result<()> {
        let command_buffer = vk::CommandBuffer::from_raw(command_buffer.as_raw());
        unsafe { check("end command buffer", self.ctx.device.end_command_buffer(command_buffer)) }
    }

    fn cmd_begin_render_pass(
        &mut self,
        command_buffer: CommandBufferHandle,
        render_pass: RenderPassHandle,
        framebuffer: FramebufferHandle,
        extent: Extent2D,
        clear_color: [f32; 4],
    ) {
        let clear_values = [vk::ClearValue {
            color: vk::ClearColorValue { float32: clear_color },
        }];

        let render_pass_begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(vk::RenderPass::from_raw(render_pass.as_raw()))
            .framebuffer(vk::Framebuffer::from_raw(framebuffer.as_raw()))
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: extent_to_vk(extent),
            })
            .clear_values(&clear_values);

        unsafe {
            self.ctx.device.cmd_begin_render_pass(
                vk::CommandBuffer::from_raw(command_buffer.as_raw()),
                &render_pass_begin_info,
                vk::SubpassContents::INLINE,
            );
        }
    }

    fn cmd_bind_pipeline(&mut self, command_buffer: CommandBufferHandle, pipeline: PipelineHandle) {
        unsafe {
            self.ctx.device.cmd_bind_pipeline(
                vk::CommandBuffer::from_raw(command_buffer.as_raw()),
                vk::PipelineBindPoint::GRAPHICS,
                vk::Pipeline::from_raw(pipeline.as_raw()),
            );
        }
    }

    fn cmd_bind_vertex_buffer(&mut self, command_buffer: CommandBufferHandle, buffer: BufferHandle) {
        let buffers = [vk::Buffer::from_raw(buffer.as_raw())];
        let offsets = [0u64];
        unsafe {
            self.ctx.device.cmd_bind_vertex_buffers(
                vk::CommandBuffer::from_raw(command_buffer.as_raw()),
                0,
                &buffers,
                &offsets,
            );
        }
    }

    fn cmd_bind_index_buffer(
        &mut self,
        command_buffer: CommandBufferHandle,
        buffer: BufferHandle,
        index_type: IndexType,
    ) {
        unsafe {
            self.ctx.device.cmd_bind_index_buffer(
                vk::CommandBuffer::from_raw(command_buffer.as_raw()),
                vk::Buffer::from_raw(buffer.as_raw()),
                0,
                index_type_to_vk(index_type),
            );
        }
    }

    fn cmd_set_viewport(&mut self, command_buffer: CommandBufferHandle, viewport: Viewport) {
        let viewports = [vk::Viewport {
            x: viewport.x,
            y: viewport.y,
            width: viewport.width,
            height: viewport.height,
            min_depth: viewport.min_depth,
            max_depth: viewport.max_depth,
        }];
        unsafe {
            self.ctx.device.cmd_set_viewport(vk::CommandBuffer::from_raw(command_buffer.as_raw()), 0, &viewports);
        }
    }

    fn cmd_set_scissor(&mut self, command_buffer: CommandBufferHandle, scissor: Rect2D) {
        let scissors = [vk::Rect2D {
            offset: vk::Offset2D { x: scissor.x, y: scissor.y },
            extent: vk::Extent2D { width: scissor.width, height: scissor.height },
        }];
        unsafe {
            self.ctx.device.cmd_set_scissor(vk::CommandBuffer::from_raw(command_buffer.as_raw()), 0, &scissors);
        }
    }

    fn cmd_draw_indexed(&mut self, command_buffer: CommandBufferHandle, index_count: u32) {
        unsafe {
            self.ctx.device.cmd_draw_indexed(
                vk::CommandBuffer::from_raw(command_buffer.as_raw()),
                index_count,
                1,
                0,
                0,
                0,
            );
        }
    }

    fn cmd_end_render_pass(&mut self, command_buffer: CommandBufferHandle) {
        unsafe {
            self.ctx.device.cmd_end_render_pass(vk::CommandBuffer::from_raw(command_buffer.as_raw()));
        }
    }

    // ===== QUEUE OPERATIONS =====

    fn acquire_next_image(
        &mut self,
        swapchain: SwapchainHandle,
        signal_semaphore: SemaphoreHandle,
    ) -> Result<AcquireResult> {
        unsafe {
            vulkan_swapchain::acquire_next_image(
                &self.ctx,
                vk::SwapchainKHR::from_raw(swapchain.as_raw()),
                vk::Semaphore::from_raw(signal_semaphore.as_raw()),
            )
        }
    }

    fn submit(&mut self, submission: &Submission) -> Result<()> {
        let wait_semaphores = [vk::Semaphore::from_raw(submission.wait_semaphore.as_raw())];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [vk::CommandBuffer::from_raw(submission.command_buffer.as_raw())];
        let signal_semaphores = [vk::Semaphore::from_raw(submission.signal_semaphore.as_raw())];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        engine_trace!("quad::vulkan", "Submitting command buffer {:?}", submission.command_buffer);

        unsafe {
            check(
                "submit draw command buffer",
                self.ctx.device.queue_submit(
                    self.ctx.graphics_queue,
                    &[submit_info],
                    vk::Fence::from_raw(submission.fence.as_raw()),
                ),
            )
        }
    }

    fn present(
        &mut self,
        swapchain: SwapchainHandle,
        image_index: u32,
        wait_semaphore: SemaphoreHandle,
    ) -> Result<PresentResult> {
        unsafe {
            vulkan_swapchain::present(
                &self.ctx,
                vk::SwapchainKHR::from_raw(swapchain.as_raw()),
                image_index,
                vk::Semaphore::from_raw(wait_semaphore.as_raw()),
            )
        }
    }

    fn wait_idle(&mut self) -> Result<()> {
        unsafe { check("wait idle", self.ctx.device.device_wait_idle()) }
    }
}

impl Drop for VulkanGraphicsDevice {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();

            if !self.buffers.is_empty() || !self.pipelines.is_empty() {
                engine_warn!(
                    "quad::vulkan",
                    "Device dropped with {} buffer(s) and {} pipeline(s) still alive",
                    self.buffers.len(), self.pipelines.len()
                );
            }

            for (_, buffer) in self.buffers.drain() {
                buffer.destroy(&self.ctx.device, &mut self.ctx.allocator);
            }
            for (_, pipeline) in self.pipelines.drain() {
                pipeline.destroy(&self.ctx.device);
            }
        }
        // self.ctx drops next: allocator, command pool, device, surface, messenger, instance
    }
}

