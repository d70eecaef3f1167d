/// GpuContext - Vulkan objects that live as long as the device
///
/// Contains everything opened once at startup:
/// - Instance, optional debug messenger and the window surface
/// - Physical and logical device with graphics and present queues
/// - Command pool for per-frame command buffers and one-shot uploads
/// - Allocator for buffer memory

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use quad_engine::quad::{Config, Error, Result};
use quad_engine::quad::capabilities::{missing_names, QueueFamilyIndices, VALIDATION_LAYER_NAME};
use quad_engine::quad::render::QueueFamilies;
use quad_engine::{engine_error, engine_info, engine_warn};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::{c_char, CStr, CString};
use std::mem::ManuallyDrop;

use crate::vulkan_physical_device::select_physical_device;

/// Device-lifetime Vulkan state
///
/// Destruction runs in reverse creation order in `Drop`: allocator, command pool,
/// device, surface, debug messenger, instance. Objects created from the device
/// (swapchains, buffers, ...) must already be destroyed by then.
pub struct GpuContext {
    /// Loaded Vulkan library, kept alive for the instance
    _entry: ash::Entry,
    pub instance: ash::Instance,

    /// Debug utils loader and messenger (validation enabled only)
    debug_utils: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,

    pub surface_loader: ash::khr::surface::Instance,
    pub surface: vk::SurfaceKHR,

    pub physical_device: vk::PhysicalDevice,
    pub device_name: String,
    pub device: ash::Device,

    pub graphics_queue: vk::Queue,
    pub present_queue: vk::Queue,
    pub queue_families: QueueFamilies,

    pub swapchain_loader: ash::khr::swapchain::Device,

    /// Pool for frame command buffers (RESET_COMMAND_BUFFER)
    pub command_pool: vk::CommandPool,

    /// Wrapped in ManuallyDrop so it is dropped BEFORE the device is destroyed
    pub allocator: ManuallyDrop<Allocator>,
}

impl GpuContext {
    /// Open the Vulkan device for `window`
    ///
    /// A failure part way destroys everything created before it.
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: &Config) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| {
                    engine_error!("quad::vulkan", "Failed to load Vulkan library: {:?}", e);
                    Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
                })?;

            let enable_validation = validation_requested(config);
            if enable_validation {
                check_validation_layer(&entry)?;
            }

            let display_handle = window.display_handle()
                .map_err(|e| {
                    engine_error!("quad::vulkan", "Failed to get display handle: {}", e);
                    Error::InitializationFailed(format!("Failed to get display handle: {}", e))
                })?;
            let window_handle = window.window_handle()
                .map_err(|e| {
                    engine_error!("quad::vulkan", "Failed to get window handle: {}", e);
                    Error::InitializationFailed(format!("Failed to get window handle: {}", e))
                })?;

            let window_extensions = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| {
                    engine_error!("quad::vulkan", "Failed to get required extensions: {}", e);
                    Error::InitializationFailed(format!("Failed to get required extensions: {}", e))
                })?;

            let instance = create_instance(&entry, config, window_extensions, enable_validation)?;
            report_missing_instance_extensions(&entry, window_extensions);

            let debug_utils = if enable_validation {
                match create_debug_messenger(&entry, &instance, config) {
                    Ok(debug_utils) => Some(debug_utils),
                    Err(e) => {
                        instance.destroy_instance(None);
                        return Err(e);
                    }
                }
            } else {
                None
            };

            // From here on, a failure hands the partial state to `Partial::release`
            let mut partial = Partial { instance: &instance, debug_utils: debug_utils.as_ref(), surface: None };

            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);
            let surface = match ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            ) {
                Ok(surface) => surface,
                Err(e) => {
                    engine_error!("quad::vulkan", "Failed to create surface: {:?}", e);
                    partial.release(&surface_loader);
                    return Err(Error::InitializationFailed(format!("Failed to create surface: {:?}", e)));
                }
            };
            partial.surface = Some(surface);

            let selected = match select_physical_device(&instance, &surface_loader, surface) {
                Ok(selected) => selected,
                Err(e) => {
                    partial.release(&surface_loader);
                    return Err(e);
                }
            };

            let queue_families = QueueFamilies {
                graphics: selected.graphics_family,
                present: selected.present_family,
            };

            let device = match create_logical_device(&instance, selected.physical_device, queue_families) {
                Ok(device) => device,
                Err(e) => {
                    partial.release(&surface_loader);
                    return Err(e);
                }
            };

            let graphics_queue = device.get_device_queue(queue_families.graphics, 0);
            let present_queue = device.get_device_queue(queue_families.present, 0);

            let pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(queue_families.graphics)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let command_pool = match device.create_command_pool(&pool_create_info, None) {
                Ok(pool) => pool,
                Err(e) => {
                    engine_error!("quad::vulkan", "Failed to create command pool: {:?}", e);
                    device.destroy_device(None);
                    partial.release(&surface_loader);
                    return Err(Error::InitializationFailed(format!("Failed to create command pool: {:?}", e)));
                }
            };

            let allocator = match Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device: selected.physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            }) {
                Ok(allocator) => allocator,
                Err(e) => {
                    engine_error!("quad::vulkan", "Failed to create GPU allocator: {:?}", e);
                    device.destroy_command_pool(command_pool, None);
                    device.destroy_device(None);
                    partial.release(&surface_loader);
                    return Err(Error::InitializationFailed(format!("Failed to create allocator: {:?}", e)));
                }
            };

            let swapchain_loader = ash::khr::swapchain::Device::new(&instance, &device);

            engine_info!(
                "quad::vulkan",
                "Vulkan device ready on '{}' (validation {})",
                selected.name,
                if enable_validation { "on" } else { "off" }
            );

            Ok(Self {
                _entry: entry,
                instance,
                debug_utils,
                surface_loader,
                surface,
                physical_device: selected.physical_device,
                device_name: selected.name,
                device,
                graphics_queue,
                present_queue,
                queue_families,
                swapchain_loader,
                command_pool,
                allocator: ManuallyDrop::new(allocator),
            })
        }
    }

    /// True when the debug messenger is installed
    pub fn validation_enabled(&self) -> bool {
        self.debug_utils.is_some()
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            // Free VkDeviceMemory pages BEFORE destroying the device
            ManuallyDrop::drop(&mut self.allocator);

            self.device.destroy_command_pool(self.command_pool, None);
            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);

            if let Some((loader, messenger)) = self.debug_utils.take() {
                loader.destroy_debug_utils_messenger(messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}

/// Instance-level objects created before the logical device
struct Partial<'a> {
    instance: &'a ash::Instance,
    debug_utils: Option<&'a (ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    surface: Option<vk::SurfaceKHR>,
}

impl Partial<'_> {
    unsafe fn release(self, surface_loader: &ash::khr::surface::Instance) {
        if let Some(surface) = self.surface {
            surface_loader.destroy_surface(surface, None);
        }
        if let Some((loader, messenger)) = self.debug_utils {
            loader.destroy_debug_utils_messenger(*messenger, None);
        }
        self.instance.destroy_instance(None);
    }
}

/// Validation needs both the config switch and the `vulkan-validation` feature
fn validation_requested(config: &Config) -> bool {
    if !config.enable_validation {
        return false;
    }
    if !cfg!(feature = "vulkan-validation") {
        engine_warn!("quad::vulkan", "Validation requested but the vulkan-validation feature is disabled");
        return false;
    }
    true
}

unsafe fn check_validation_layer(entry: &ash::Entry) -> Result<()> {
    let available: Vec<String> = entry
        .enumerate_instance_layer_properties()
        .map_err(|e| {
            engine_error!("quad::vulkan", "Failed to enumerate instance layers: {:?}", e);
            Error::InitializationFailed(format!("Failed to enumerate instance layers: {:?}", e))
        })?
        .iter()
        .map(|layer| CStr::from_ptr(layer.layer_name.as_ptr()).to_string_lossy().into_owned())
        .collect();

    let missing = missing_names(&[VALIDATION_LAYER_NAME], &available);
    if !missing.is_empty() {
        engine_error!("quad::vulkan", "Validation layers requested, but not available: {:?}", missing);
        return Err(Error::InitializationFailed(
            "validation layers requested, but not available".to_string(),
        ));
    }
    Ok(())
}

unsafe fn create_instance(
    entry: &ash::Entry,
    config: &Config,
    window_extensions: &[*const c_char],
    enable_validation: bool,
) -> Result<ash::Instance> {
    let app_name = CString::new(config.app_name.as_str())
        .map_err(|_| Error::InitializationFailed("application name contains a NUL byte".to_string()))?;
    let (major, minor, patch) = config.app_version;

    let app_info = vk::ApplicationInfo::default()
        .application_name(&app_name)
        .application_version(vk::make_api_version(0, major, minor, patch))
        .engine_name(c"Quad Engine")
        .engine_version(vk::make_api_version(0, 0, 1, 0))
        .api_version(vk::API_VERSION_1_0);

    let mut extension_names = window_extensions.to_vec();
    if enable_validation {
        extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
    }

    let layer_names = if enable_validation {
        vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
    } else {
        vec![]
    };

    let create_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_layer_names(&layer_names)
        .enabled_extension_names(&extension_names);

    entry.create_instance(&create_info, None).map_err(|e| {
        engine_error!("quad::vulkan", "Failed to create Vulkan instance: {:?}", e);
        Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
    })
}

/// Warn about window-system extensions the runtime does not list
unsafe fn report_missing_instance_extensions(entry: &ash::Entry, required: &[*const c_char]) {
    let available: Vec<String> = match entry.enumerate_instance_extension_properties(None) {
        Ok(properties) => properties
            .iter()
            .map(|ext| CStr::from_ptr(ext.extension_name.as_ptr()).to_string_lossy().into_owned())
            .collect(),
        Err(e) => {
            engine_warn!("quad::vulkan", "Failed to enumerate instance extensions: {:?}", e);
            return;
        }
    };

    let required: Vec<String> = required
        .iter()
        .map(|&name| CStr::from_ptr(name).to_string_lossy().into_owned())
        .collect();
    let required: Vec<&str> = required.iter().map(String::as_str).collect();

    for name in missing_names(&required, &available) {
        engine_warn!("quad::vulkan", "Required window extension '{}' was not found", name);
    }
}

#[cfg(feature = "vulkan-validation")]
unsafe fn create_debug_messenger(
    entry: &ash::Entry,
    instance: &ash::Instance,
    config: &Config,
) -> Result<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)> {
    use quad_engine::quad::config::DebugSeverity;

    let debug_utils = ash::ext::debug_utils::Instance::new(entry, instance);

    crate::debug::init_debug_config(crate::debug::Config {
        severity: config.debug_severity,
        output: config.debug_output.clone(),
        message_filter: config.debug_message_filter,
        break_on_error: config.break_on_validation_error,
        panic_on_error: config.panic_on_error,
        enable_stats: config.enable_validation_stats,
    });

    let severity_flags = match config.debug_severity {
        DebugSeverity::ErrorsOnly => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
        }
        DebugSeverity::ErrorsAndWarnings => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
        }
        DebugSeverity::All => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
        }
    };

    let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(severity_flags)
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
        )
        .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

    let messenger = debug_utils
        .create_debug_utils_messenger(&debug_info, None)
        .map_err(|e| {
            engine_error!("quad::vulkan", "Failed to create debug messenger: {:?}", e);
            Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
        })?;

    Ok((debug_utils, messenger))
}

#[cfg(not(feature = "vulkan-validation"))]
unsafe fn create_debug_messenger(
    _entry: &ash::Entry,
    _instance: &ash::Instance,
    _config: &Config,
) -> Result<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)> {
    Err(Error::InitializationFailed("vulkan-validation feature is disabled".to_string()))
}

/// One queue per distinct family, swapchain extension, default features
unsafe fn create_logical_device(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    families: QueueFamilies,
) -> Result<ash::Device> {
    let queue_priorities = [1.0];
    let unique_families = QueueFamilyIndices {
        graphics: Some(families.graphics),
        present: Some(families.present),
    }
    .unique_families();

    let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
        .iter()
        .map(|&family| {
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(family)
                .queue_priorities(&queue_priorities)
        })
        .collect();

    let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];
    let device_features = vk::PhysicalDeviceFeatures::default();

    let device_create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_create_infos)
        .enabled_extension_names(&device_extension_names)
        .enabled_features(&device_features);

    instance
        .create_device(physical_device, &device_create_info, None)
        .map_err(|e| {
            engine_error!("quad::vulkan", "Failed to create logical device: {:?}", e);
            Error::InitializationFailed(format!("Failed to create device: {:?}", e))
        })
}
