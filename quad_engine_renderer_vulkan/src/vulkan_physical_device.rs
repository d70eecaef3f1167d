/// Physical device discovery - gathers per-device facts and applies the engine's rating rules

use ash::vk;
use quad_engine::quad::{Error, Result};
use quad_engine::quad::capabilities::{
    pick_best_device, rate_device, DeviceCandidate, QueueFamilyIndices,
};
use quad_engine::{engine_debug, engine_error, engine_info};
use std::ffi::CStr;

use crate::vulkan_format::{check, device_type_from_vk};

/// Physical device chosen for the surface, with its resolved queue families
pub(crate) struct SelectedDevice {
    pub physical_device: vk::PhysicalDevice,
    pub name: String,
    pub graphics_family: u32,
    pub present_family: u32,
}

/// Rate every physical device against `surface` and pick the best one
pub(crate) unsafe fn select_physical_device(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
) -> Result<SelectedDevice> {
    let physical_devices = check("enumerate physical devices", instance.enumerate_physical_devices())?;
    if physical_devices.is_empty() {
        engine_error!("quad::vulkan", "No Vulkan-capable GPU found");
        return Err(Error::InitializationFailed("failed to find GPUs with Vulkan support".to_string()));
    }

    let mut candidates = Vec::with_capacity(physical_devices.len());
    for &physical_device in &physical_devices {
        let candidate = describe_device(instance, surface_loader, surface, physical_device)?;
        engine_debug!(
            "quad::vulkan",
            "GPU candidate '{}' ({:?}) scored {}",
            candidate.name, candidate.device_type, rate_device(&candidate)
        );
        candidates.push(candidate);
    }

    let best = pick_best_device(&candidates)?;
    let candidate = &candidates[best];

    // pick_best_device only returns candidates with both families resolved
    let (graphics_family, present_family) = match (candidate.queue_families.graphics, candidate.queue_families.present) {
        (Some(graphics), Some(present)) => (graphics, present),
        _ => return Err(Error::InitializationFailed("no suitable device".to_string())),
    };

    engine_info!(
        "quad::vulkan",
        "Selected GPU '{}' (graphics family {}, present family {})",
        candidate.name, graphics_family, present_family
    );

    Ok(SelectedDevice {
        physical_device: physical_devices[best],
        name: candidate.name.clone(),
        graphics_family,
        present_family,
    })
}

/// Collect everything `rate_device` looks at for one physical device
unsafe fn describe_device(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
    physical_device: vk::PhysicalDevice,
) -> Result<DeviceCandidate> {
    let properties = instance.get_physical_device_properties(physical_device);
    let features = instance.get_physical_device_features(physical_device);

    let name = CStr::from_ptr(properties.device_name.as_ptr())
        .to_string_lossy()
        .into_owned();

    let queue_families = find_queue_families(instance, surface_loader, surface, physical_device)?;

    let extensions: Vec<String> = check(
        "enumerate device extensions",
        instance.enumerate_device_extension_properties(physical_device),
    )?
    .iter()
    .map(|ext| CStr::from_ptr(ext.extension_name.as_ptr()).to_string_lossy().into_owned())
    .collect();

    // Surface support is only meaningful once the swapchain extension is known to exist
    let has_swapchain = extensions
        .iter()
        .any(|e| e.as_bytes() == ash::khr::swapchain::NAME.to_bytes());
    let (surface_format_count, present_mode_count) = if has_swapchain {
        let formats = check(
            "query surface formats",
            surface_loader.get_physical_device_surface_formats(physical_device, surface),
        )?;
        let present_modes = check(
            "query surface present modes",
            surface_loader.get_physical_device_surface_present_modes(physical_device, surface),
        )?;
        (formats.len(), present_modes.len())
    } else {
        (0, 0)
    };

    Ok(DeviceCandidate {
        name,
        device_type: device_type_from_vk(properties.device_type),
        max_image_dimension_2d: properties.limits.max_image_dimension2_d,
        geometry_shader: features.geometry_shader == vk::TRUE,
        queue_families,
        extensions,
        surface_format_count,
        present_mode_count,
    })
}

/// Resolve graphics and present queue families, visiting each family once
unsafe fn find_queue_families(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
    physical_device: vk::PhysicalDevice,
) -> Result<QueueFamilyIndices> {
    let properties = instance.get_physical_device_queue_family_properties(physical_device);

    let mut facts = Vec::with_capacity(properties.len());
    for (index, family) in properties.iter().enumerate() {
        let graphics = family.queue_flags.contains(vk::QueueFlags::GRAPHICS);
        let present = check(
            "query surface support",
            surface_loader.get_physical_device_surface_support(physical_device, index as u32, surface),
        )?;
        facts.push((graphics, present));
    }

    Ok(QueueFamilyIndices::find(facts))
}
