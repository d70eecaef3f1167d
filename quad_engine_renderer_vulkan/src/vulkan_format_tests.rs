//! Unit tests for Vulkan conversion functions
//!
//! Pure mappings between engine types and Vulkan types. No GPU required.

use super::*;
use ash::vk;
use quad_engine::quad::Error;
use quad_engine::quad::capabilities::DeviceType;
use quad_engine::quad::render::{
    BufferUsage, ColorSpace, Extent2D, Format, IndexType, PresentMode, SharingMode,
    SurfaceTransform,
};

// ============================================================================
// FORMATS
// ============================================================================

#[test]
fn test_named_formats_map_both_ways() {
    let pairs = [
        (Format::Undefined, vk::Format::UNDEFINED),
        (Format::B8G8R8A8_SRGB, vk::Format::B8G8R8A8_SRGB),
        (Format::B8G8R8A8_UNORM, vk::Format::B8G8R8A8_UNORM),
        (Format::R8G8B8A8_SRGB, vk::Format::R8G8B8A8_SRGB),
        (Format::R8G8B8A8_UNORM, vk::Format::R8G8B8A8_UNORM),
        (Format::R32G32_SFLOAT, vk::Format::R32G32_SFLOAT),
        (Format::R32G32B32_SFLOAT, vk::Format::R32G32B32_SFLOAT),
    ];
    for (format, vk_format) in pairs {
        assert_eq!(format_to_vk(format), vk_format);
        assert_eq!(format_from_vk(vk_format), format);
    }
}

#[test]
fn test_unnamed_format_is_carried_raw() {
    let format = format_from_vk(vk::Format::A2B10G10R10_UNORM_PACK32);
    assert_eq!(format, Format::Other(vk::Format::A2B10G10R10_UNORM_PACK32.as_raw()));
    assert_eq!(format_to_vk(format), vk::Format::A2B10G10R10_UNORM_PACK32);
}

#[test]
fn test_surface_format_conversion() {
    let surface = vk::SurfaceFormatKHR {
        format: vk::Format::B8G8R8A8_SRGB,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    };
    let converted = surface_format_from_vk(&surface);
    assert_eq!(converted.format, Format::B8G8R8A8_SRGB);
    assert_eq!(converted.color_space, ColorSpace::SrgbNonlinear);
    assert_eq!(color_space_to_vk(converted.color_space), vk::ColorSpaceKHR::SRGB_NONLINEAR);
}

#[test]
fn test_hdr_color_space_is_carried_raw() {
    let space = color_space_from_vk(vk::ColorSpaceKHR::HDR10_ST2084_EXT);
    assert!(matches!(space, ColorSpace::Other(_)));
    assert_eq!(color_space_to_vk(space), vk::ColorSpaceKHR::HDR10_ST2084_EXT);
}

// ============================================================================
// PRESENTATION
// ============================================================================

#[test]
fn test_present_modes_map_both_ways() {
    let pairs = [
        (PresentMode::Immediate, vk::PresentModeKHR::IMMEDIATE),
        (PresentMode::Mailbox, vk::PresentModeKHR::MAILBOX),
        (PresentMode::Fifo, vk::PresentModeKHR::FIFO),
        (PresentMode::FifoRelaxed, vk::PresentModeKHR::FIFO_RELAXED),
    ];
    for (mode, vk_mode) in pairs {
        assert_eq!(present_mode_to_vk(mode), vk_mode);
        assert_eq!(present_mode_from_vk(vk_mode), mode);
    }
}

#[test]
fn test_transform_is_passed_through() {
    assert_eq!(transform_to_vk(SurfaceTransform::IDENTITY), vk::SurfaceTransformFlagsKHR::IDENTITY);
    assert_eq!(
        transform_from_vk(vk::SurfaceTransformFlagsKHR::ROTATE_90),
        SurfaceTransform(vk::SurfaceTransformFlagsKHR::ROTATE_90.as_raw())
    );
}

#[test]
fn test_sharing_and_extent() {
    assert_eq!(sharing_mode_to_vk(SharingMode::Exclusive), vk::SharingMode::EXCLUSIVE);
    assert_eq!(sharing_mode_to_vk(SharingMode::Concurrent), vk::SharingMode::CONCURRENT);

    let extent = extent_to_vk(Extent2D::new(800, 600));
    assert_eq!((extent.width, extent.height), (800, 600));
    assert_eq!(extent_from_vk(extent), Extent2D::new(800, 600));
}

// ============================================================================
// BUFFERS / DEVICES
// ============================================================================

#[test]
fn test_buffer_usage_and_index_type() {
    assert_eq!(buffer_usage_to_vk(BufferUsage::Vertex), vk::BufferUsageFlags::VERTEX_BUFFER);
    assert_eq!(buffer_usage_to_vk(BufferUsage::Index), vk::BufferUsageFlags::INDEX_BUFFER);
    assert_eq!(index_type_to_vk(IndexType::U16), vk::IndexType::UINT16);
    assert_eq!(index_type_to_vk(IndexType::U32), vk::IndexType::UINT32);
}

#[test]
fn test_device_types() {
    assert_eq!(device_type_from_vk(vk::PhysicalDeviceType::DISCRETE_GPU), DeviceType::DiscreteGpu);
    assert_eq!(device_type_from_vk(vk::PhysicalDeviceType::INTEGRATED_GPU), DeviceType::IntegratedGpu);
    assert_eq!(device_type_from_vk(vk::PhysicalDeviceType::CPU), DeviceType::Cpu);
    assert_eq!(device_type_from_vk(vk::PhysicalDeviceType::OTHER), DeviceType::Other);
}

// ============================================================================
// RESULTS
// ============================================================================

#[test]
fn test_vk_error_keeps_device_lost_and_memory() {
    assert_eq!(vk_error("submit", vk::Result::ERROR_DEVICE_LOST), Error::DeviceLost);
    assert_eq!(vk_error("allocate", vk::Result::ERROR_OUT_OF_DEVICE_MEMORY), Error::OutOfMemory);
    assert_eq!(vk_error("allocate", vk::Result::ERROR_OUT_OF_HOST_MEMORY), Error::OutOfMemory);
}

#[test]
fn test_vk_error_wraps_other_failures() {
    let error = vk_error("create fence", vk::Result::ERROR_INITIALIZATION_FAILED);
    match error {
        Error::BackendError(message) => assert!(message.starts_with("Failed to create fence")),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_check_passes_values_through() {
    assert_eq!(check("noop", Ok::<u32, vk::Result>(7)), Ok(7));
    assert!(check::<()>("noop", Err(vk::Result::ERROR_UNKNOWN)).is_err());
}
