/*!
# Quad Engine

Swapchain management and frame pacing for a single indexed quad.

This crate holds the backend-agnostic half of the renderer: the `GraphicsDevice`
trait every GPU backend implements, swapchain negotiation and rebuild, and the
frame scheduler that keeps at most two frames in flight. The Vulkan backend lives
in `quad_engine_renderer_vulkan`.

## Architecture

- **GraphicsDevice**: Seam between the frame protocol and the GPU API
- **SwapchainManager**: Swapchain, image views and framebuffers, rebuilt on resize
- **FrameScheduler**: Per-slot fences and semaphores, acquire / record / submit / present
- **StaticResources**: Pipeline, vertex and index buffers created once
- **FrameRenderer**: Owns all of the above for one device
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod capabilities;
pub mod config;
pub mod frame_scheduler;
pub mod graphics_device;
pub mod renderer;
pub mod resources;
pub mod swapchain_manager;
pub mod window;

// Main quad namespace module
pub mod quad {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine logging entry point
    pub use crate::engine::Engine;

    // Frame renderer
    pub use crate::renderer::{FrameRenderer, RendererStats};

    // Configuration
    pub use crate::config::Config;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogCrateLogger, LogEntry, LogSeverity, Logger};
    }

    // Render sub-module with all rendering types
    pub mod render {
        pub use crate::frame_scheduler::*;
        pub use crate::graphics_device::*;
        pub use crate::resources::*;
        pub use crate::swapchain_manager::*;
        pub use crate::window::*;
    }

    // Device selection helpers
    pub mod capabilities {
        pub use crate::capabilities::*;
    }

    // Configuration sub-module
    pub mod config {
        pub use crate::config::*;
    }
}

// Re-export math library at crate root
pub use glam;
