/*!
# Quad Engine - Vulkan Backend

Vulkan implementation of the `quad_engine` graphics device seam.

This crate opens a Vulkan device on a window surface using Ash for the bindings
and gpu-allocator for buffer memory, and implements `GraphicsDevice` so the
engine's swapchain manager and frame scheduler can drive it.

# Example

```no_run
use quad_engine::quad::{Config, FrameRenderer, Result};
use quad_engine::quad::render::{Geometry, ShaderSet, WindowSurface};
use quad_engine_renderer_vulkan::VulkanGraphicsDevice;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

fn open<W: HasDisplayHandle + HasWindowHandle>(window: &W, surface: &mut dyn WindowSurface) -> Result<()> {
    let config = Config::default();
    let shaders = ShaderSet::load(&config.vertex_shader_path, &config.fragment_shader_path)?;
    let device = VulkanGraphicsDevice::new(window, &config)?;
    let mut renderer = FrameRenderer::new(device, surface, &shaders, &Geometry::quad(), &config)?;
    renderer.draw_frame(surface)?;
    Ok(())
}
```
*/

// Vulkan implementation modules
mod vulkan;
mod vulkan_buffer;
mod vulkan_context;
mod vulkan_format;
mod vulkan_physical_device;
mod vulkan_pipeline;
mod vulkan_render_pass;
mod vulkan_swapchain;
mod debug;

pub use vulkan::VulkanGraphicsDevice;

// Re-export debug utilities
pub use debug::{get_validation_stats, print_validation_stats_report};
