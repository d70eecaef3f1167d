//! Frame renderer
//!
//! Ties the swapchain manager, the frame scheduler and the static resources to one
//! graphics device. Construction order is render pass, static resources, swapchain
//! chain, frame slots; teardown waits for the device and runs in reverse.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::frame_scheduler::{FrameOutcome, FrameScheduler, FrameStatus, FrameTarget, RebuildReason};
use crate::graphics_device::{Extent2D, GraphicsDevice, RenderPassHandle};
use crate::resources::{Geometry, ShaderSet, StaticResources};
use crate::swapchain_manager::{choose_surface_format, RebuildStatus, SwapchainManager};
use crate::window::{ResizeSignal, WindowSurface};
use crate::{engine_debug, engine_error, engine_info};

/// Counters kept across the renderer lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererStats {
    pub frames_presented: u64,
    pub frames_skipped: u64,
    pub swapchain_rebuilds: u64,
}

/// Renders the static geometry once per `draw_frame`
pub struct FrameRenderer<D: GraphicsDevice> {
    device: D,
    render_pass: RenderPassHandle,
    resources: StaticResources,
    swapchains: SwapchainManager,
    scheduler: FrameScheduler,
    resize: ResizeSignal,
    clear_color: [f32; 4],
    stats: RendererStats,
    shut_down: bool,
}

impl<D: GraphicsDevice> FrameRenderer<D> {
    /// Create every GPU object the frame loop needs
    ///
    /// # Arguments
    ///
    /// * `device` - Opened device bound to the window surface
    /// * `window` - Window collaborator (blocks here while minimized)
    /// * `shaders` - Vertex and fragment SPIR-V
    /// * `geometry` - Indexed geometry uploaded once
    /// * `config` - Clear color
    pub fn new<W: WindowSurface + ?Sized>(
        mut device: D,
        window: &mut W,
        shaders: &ShaderSet,
        geometry: &Geometry,
        config: &Config,
    ) -> Result<Self> {
        let caps = device.surface_capabilities()?;
        let color_format = choose_surface_format(&caps.formats)?;

        let render_pass = device.create_render_pass(color_format.format).map_err(|e| {
            engine_error!("quad::FrameRenderer", "Failed to create render pass: {}", e);
            e
        })?;

        let resources = match StaticResources::create(&mut device, render_pass, shaders, geometry) {
            Ok(resources) => resources,
            Err(e) => {
                engine_error!("quad::FrameRenderer", "Failed to create static resources: {}", e);
                device.destroy_render_pass(render_pass);
                return Err(e);
            }
        };

        let mut swapchains = SwapchainManager::new(render_pass, color_format);
        if let Err(e) = swapchains.rebuild(&mut device, window) {
            resources.destroy(&mut device);
            device.destroy_render_pass(render_pass);
            return Err(e);
        }

        let scheduler = match FrameScheduler::new(&mut device) {
            Ok(scheduler) => scheduler,
            Err(e) => {
                swapchains.destroy(&mut device);
                resources.destroy(&mut device);
                device.destroy_render_pass(render_pass);
                return Err(e);
            }
        };

        engine_info!("quad::FrameRenderer", "Renderer ready ({:?})", color_format.format);

        Ok(Self {
            device,
            render_pass,
            resources,
            swapchains,
            scheduler,
            resize: ResizeSignal::new(),
            clear_color: config.clear_color,
            stats: RendererStats::default(),
            shut_down: false,
        })
    }

    /// Draw one frame, rebuilding the swapchain afterwards when required
    ///
    /// Errors are returned unchanged; the caller ends the loop on them.
    pub fn draw_frame<W: WindowSurface + ?Sized>(&mut self, window: &mut W) -> Result<FrameOutcome> {
        if self.shut_down {
            return Err(Error::InvalidResource("renderer has been shut down".to_string()));
        }

        // A failed or abandoned rebuild leaves no chain; try again before drawing
        if self.swapchains.current().is_none() {
            self.rebuild(window)?;
        }

        let Some(swapchain) = self.swapchains.current() else {
            // The window closed before a chain could be built
            self.stats.frames_skipped += 1;
            return Ok(FrameOutcome {
                status: FrameStatus::Skipped { frame_slot: self.scheduler.current_frame() },
                rebuild: Some(RebuildReason::OutOfDate),
            });
        };

        let target = FrameTarget {
            swapchain,
            render_pass: self.render_pass,
            pipeline: self.resources.pipeline,
            draw: self.resources.draw_buffers(),
            clear_color: self.clear_color,
        };

        let outcome = self.scheduler.draw_frame(&mut self.device, &target, &self.resize)?;

        if outcome.presented() {
            self.stats.frames_presented += 1;
        } else {
            self.stats.frames_skipped += 1;
        }

        if let Some(reason) = outcome.rebuild {
            engine_debug!("quad::FrameRenderer", "Rebuilding swapchain ({:?})", reason);
            self.rebuild(window)?;
        }

        Ok(outcome)
    }

    /// Rebuild the swapchain now
    pub fn rebuild<W: WindowSurface + ?Sized>(&mut self, window: &mut W) -> Result<RebuildStatus> {
        let status = self.swapchains.rebuild(&mut self.device, window)?;
        if status == RebuildStatus::Rebuilt {
            // The new chain already matches the latest framebuffer size
            self.resize.take();
            self.stats.swapchain_rebuilds += 1;
        }
        Ok(status)
    }

    /// Ask for a rebuild after the next present
    pub fn request_rebuild(&self) {
        self.resize.notify();
    }

    /// Flag shared with the window layer's resize callback
    pub fn resize_signal(&self) -> ResizeSignal {
        self.resize.clone()
    }

    /// Slot the next frame will use
    pub fn current_frame(&self) -> usize {
        self.scheduler.current_frame()
    }

    pub fn swapchain_extent(&self) -> Option<Extent2D> {
        self.swapchains.current().map(|chain| chain.extent())
    }

    pub fn image_count(&self) -> usize {
        self.swapchains.current().map_or(0, |chain| chain.image_count())
    }

    pub fn stats(&self) -> RendererStats {
        self.stats
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Wait for the GPU, then release everything in reverse creation order
    ///
    /// Called from `Drop` when not called explicitly. Objects are released even when
    /// the wait fails; the wait error is returned afterwards.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;

        let idle = self.device.wait_idle();
        if let Err(e) = &idle {
            engine_error!("quad::FrameRenderer", "wait_idle failed during shutdown: {}", e);
        }

        self.scheduler.destroy(&mut self.device);
        self.swapchains.destroy(&mut self.device);
        self.resources.destroy(&mut self.device);
        self.device.destroy_render_pass(self.render_pass);

        engine_info!("quad::FrameRenderer",
            "Renderer shut down ({} frames presented, {} skipped, {} rebuilds)",
            self.stats.frames_presented, self.stats.frames_skipped, self.stats.swapchain_rebuilds);

        idle
    }
}

impl<D: GraphicsDevice> Drop for FrameRenderer<D> {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
