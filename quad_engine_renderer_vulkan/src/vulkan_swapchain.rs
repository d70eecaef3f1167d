/// Swapchain - Vulkan calls behind the engine's swapchain manager
///
/// Negotiation (format, present mode, extent, image count, sharing) happens in the
/// engine; this module only translates a negotiated `SwapchainDesc` into Vulkan
/// objects and reports the surface state back.

use ash::vk;
use quad_engine::quad::Result;
use quad_engine::quad::render::{AcquireResult, PresentResult, SurfaceCapabilities, SwapchainDesc};
use quad_engine::engine_debug;

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{
    check, color_space_to_vk, extent_from_vk, extent_to_vk, format_to_vk, present_mode_from_vk,
    present_mode_to_vk, sharing_mode_to_vk, surface_format_from_vk, transform_from_vk,
    transform_to_vk, vk_error,
};

/// Fresh snapshot of what the surface supports
pub(crate) unsafe fn query_surface_capabilities(ctx: &GpuContext) -> Result<SurfaceCapabilities> {
    let capabilities = check(
        "get surface capabilities",
        ctx.surface_loader.get_physical_device_surface_capabilities(ctx.physical_device, ctx.surface),
    )?;
    let formats = check(
        "get surface formats",
        ctx.surface_loader.get_physical_device_surface_formats(ctx.physical_device, ctx.surface),
    )?;
    let present_modes = check(
        "get surface present modes",
        ctx.surface_loader.get_physical_device_surface_present_modes(ctx.physical_device, ctx.surface),
    )?;

    Ok(SurfaceCapabilities {
        min_image_count: capabilities.min_image_count,
        max_image_count: capabilities.max_image_count,
        current_extent: extent_from_vk(capabilities.current_extent),
        min_image_extent: extent_from_vk(capabilities.min_image_extent),
        max_image_extent: extent_from_vk(capabilities.max_image_extent),
        current_transform: transform_from_vk(capabilities.current_transform),
        formats: formats.iter().map(surface_format_from_vk).collect(),
        present_modes: present_modes.into_iter().map(present_mode_from_vk).collect(),
    })
}

/// Create a swapchain from a negotiated descriptor
///
/// Opaque alpha, clipped, no old swapchain: the previous chain is always
/// destroyed before a rebuild creates the next one.
pub(crate) unsafe fn create_swapchain(ctx: &GpuContext, desc: &SwapchainDesc) -> Result<vk::SwapchainKHR> {
    let mut create_info = vk::SwapchainCreateInfoKHR::default()
        .surface(ctx.surface)
        .min_image_count(desc.image_count)
        .image_format(format_to_vk(desc.surface_format.format))
        .image_color_space(color_space_to_vk(desc.surface_format.color_space))
        .image_extent(extent_to_vk(desc.extent))
        .image_array_layers(1)
        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
        .image_sharing_mode(sharing_mode_to_vk(desc.sharing_mode))
        .pre_transform(transform_to_vk(desc.pre_transform))
        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
        .present_mode(present_mode_to_vk(desc.present_mode))
        .clipped(true);

    if !desc.queue_family_indices.is_empty() {
        create_info = create_info.queue_family_indices(&desc.queue_family_indices);
    }

    let swapchain = check("create swapchain", ctx.swapchain_loader.create_swapchain(&create_info, None))?;
    engine_debug!(
        "quad::vulkan",
        "Created swapchain {:?}: {}x{}, {} image(s) requested",
        swapchain, desc.extent.width, desc.extent.height, desc.image_count
    );
    Ok(swapchain)
}

/// 2D color view with identity swizzle over mip 0, layer 0
pub(crate) unsafe fn create_image_view(device: &ash::Device, image: vk::Image, format: vk::Format) -> Result<vk::ImageView> {
    let create_info = vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        });

    check("create image view", device.create_image_view(&create_info, None))
}

/// Acquire with an unbounded timeout
pub(crate) unsafe fn acquire_next_image(
    ctx: &GpuContext,
    swapchain: vk::SwapchainKHR,
    semaphore: vk::Semaphore,
) -> Result<AcquireResult> {
    match ctx.swapchain_loader.acquire_next_image(swapchain, u64::MAX, semaphore, vk::Fence::null()) {
        Ok((image_index, suboptimal)) => Ok(AcquireResult::Acquired { image_index, suboptimal }),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireResult::OutOfDate),
        Err(e) => Err(vk_error("acquire next swapchain image", e)),
    }
}

/// Queue one image for presentation on the present queue
pub(crate) unsafe fn present(
    ctx: &GpuContext,
    swapchain: vk::SwapchainKHR,
    image_index: u32,
    wait_semaphore: vk::Semaphore,
) -> Result<PresentResult> {
    let swapchains = [swapchain];
    let image_indices = [image_index];
    let wait_semaphores = [wait_semaphore];

    let present_info = vk::PresentInfoKHR::default()
        .wait_semaphores(&wait_semaphores)
        .swapchains(&swapchains)
        .image_indices(&image_indices);

    match ctx.swapchain_loader.queue_present(ctx.present_queue, &present_info) {
        Ok(false) => Ok(PresentResult::Presented),
        Ok(true) | Err(vk::Result::SUBOPTIMAL_KHR) => Ok(PresentResult::Suboptimal),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentResult::OutOfDate),
        Err(e) => Err(vk_error("present swapchain image", e)),
    }
}
