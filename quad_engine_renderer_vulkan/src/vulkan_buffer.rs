/// Buffer - device-local Vulkan buffer filled through a staging copy

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator};
use gpu_allocator::MemoryLocation;
use quad_engine::quad::{Error, Result};
use quad_engine::quad::render::BufferUsage;
use quad_engine::{engine_debug, engine_error, engine_warn};

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{buffer_usage_to_vk, check};

/// Vulkan buffer with its memory
pub struct Buffer {
    pub(crate) buffer: vk::Buffer,
    pub(crate) allocation: Option<Allocation>,
    pub(crate) size: u64,
}

impl Buffer {
    /// Create a device-local buffer holding `data`
    ///
    /// The bytes go through a host-visible staging buffer and a one-shot copy on
    /// the graphics queue; the call returns once the copy has completed.
    pub(crate) unsafe fn create_device_local(ctx: &mut GpuContext, usage: BufferUsage, data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::InvalidResource("buffer data is empty".to_string()));
        }
        let size = data.len() as u64;

        let staging = Self::create(
            &ctx.device,
            &mut ctx.allocator,
            size,
            vk::BufferUsageFlags::TRANSFER_SRC,
            MemoryLocation::CpuToGpu,
            "staging buffer",
        )?;

        let result = Self::upload_from_staging(ctx, &staging, usage, data);

        staging.destroy(&ctx.device, &mut ctx.allocator);

        if let Ok(buffer) = &result {
            engine_debug!("quad::vulkan", "Uploaded {} bytes to {:?} buffer {:?}", buffer.size, usage, buffer.buffer);
        }
        result
    }

    unsafe fn upload_from_staging(
        ctx: &mut GpuContext,
        staging: &Buffer,
        usage: BufferUsage,
        data: &[u8],
    ) -> Result<Self> {
        Self::fill_staging(staging, data)?;

        let target = Self::create(
            &ctx.device,
            &mut ctx.allocator,
            staging.size,
            buffer_usage_to_vk(usage) | vk::BufferUsageFlags::TRANSFER_DST,
            MemoryLocation::GpuOnly,
            "device buffer",
        )?;

        match copy_buffer(ctx, staging.buffer, target.buffer, staging.size) {
            Ok(()) => Ok(target),
            Err(e) => {
                target.destroy(&ctx.device, &mut ctx.allocator);
                Err(e)
            }
        }
    }

    unsafe fn create(
        device: &ash::Device,
        allocator: &mut Allocator,
        size: u64,
        usage: vk::BufferUsageFlags,
        location: MemoryLocation,
        name: &str,
    ) -> Result<Self> {
        let buffer_create_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = check("create buffer", device.create_buffer(&buffer_create_info, None))?;
        let requirements = device.get_buffer_memory_requirements(buffer);

        let allocation = match allocator.allocate(&AllocationCreateDesc {
            name,
            requirements,
            location,
            linear: true,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        }) {
            Ok(allocation) => allocation,
            Err(gpu_allocator::AllocationError::NoCompatibleMemoryTypeFound) => {
                device.destroy_buffer(buffer, None);
                engine_error!("quad::vulkan", "No compatible memory type for {} ({:?})", name, location);
                return Err(Error::NoCompatibleMemoryType(name.to_string()));
            }
            Err(_e) => {
                device.destroy_buffer(buffer, None);
                let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                engine_error!("quad::vulkan", "Out of GPU memory for {} (required: {:.2} MB)", name, size_mb);
                return Err(Error::OutOfMemory);
            }
        };

        if let Err(e) = device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) {
            device.destroy_buffer(buffer, None);
            allocator.free(allocation).ok();
            return Err(crate::vulkan_format::vk_error("bind buffer memory", e));
        }

        Ok(Self { buffer, allocation: Some(allocation), size })
    }

    unsafe fn fill_staging(staging: &Buffer, data: &[u8]) -> Result<()> {
        let mapped_ptr = staging
            .allocation
            .as_ref()
            .and_then(|allocation| allocation.mapped_ptr())
            .ok_or_else(|| Error::BackendError("Staging buffer is not CPU-accessible".to_string()))?
            .as_ptr() as *mut u8;

        std::ptr::copy_nonoverlapping(data.as_ptr(), mapped_ptr, data.len());
        Ok(())
    }

    /// Free the memory then destroy the buffer
    pub(crate) unsafe fn destroy(mut self, device: &ash::Device, allocator: &mut Allocator) {
        if let Some(allocation) = self.allocation.take() {
            if let Err(e) = allocator.free(allocation) {
                engine_warn!("quad::vulkan", "Failed to free buffer allocation: {:?}", e);
            }
        }
        device.destroy_buffer(self.buffer, None);
    }
}

/// Record, submit and wait for a single buffer-to-buffer copy
unsafe fn copy_buffer(ctx: &GpuContext, src: vk::Buffer, dst: vk::Buffer, size: u64) -> Result<()> {
    let device = &ctx.device;

    let command_buffer_allocate_info = vk::CommandBufferAllocateInfo::default()
        .command_pool(ctx.command_pool)
        .level(vk::CommandBufferLevel::PRIMARY)
        .command_buffer_count(1);

    let command_buffers = check(
        "allocate upload command buffer",
        device.allocate_command_buffers(&command_buffer_allocate_info),
    )?;

    let result = record_and_submit_copy(ctx, &command_buffers, src, dst, size);

    device.free_command_buffers(ctx.command_pool, &command_buffers);
    result
}

unsafe fn record_and_submit_copy(
    ctx: &GpuContext,
    command_buffers: &[vk::CommandBuffer],
    src: vk::Buffer,
    dst: vk::Buffer,
    size: u64,
) -> Result<()> {
    let device = &ctx.device;
    let command_buffer = command_buffers[0];

    let begin_info = vk::CommandBufferBeginInfo::default()
        .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
    check("begin upload command buffer", device.begin_command_buffer(command_buffer, &begin_info))?;

    let region = vk::BufferCopy { src_offset: 0, dst_offset: 0, size };
    device.cmd_copy_buffer(command_buffer, src, dst, &[region]);

    check("end upload command buffer", device.end_command_buffer(command_buffer))?;

    let submit_info = vk::SubmitInfo::default().command_buffers(command_buffers);
    check(
        "submit buffer upload",
        device.queue_submit(ctx.graphics_queue, &[submit_info], vk::Fence::null()),
    )?;
    check("wait for buffer upload", device.queue_wait_idle(ctx.graphics_queue))
}
