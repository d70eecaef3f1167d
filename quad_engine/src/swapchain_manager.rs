//! Swapchain Manager
//!
//! Owns the chain of presentable images, one 2D color view per image and one
//! framebuffer per view. Parameters are negotiated from a fresh surface capability
//! snapshot on every build. A chain is always released as a whole:
//! framebuffers, then views, then the swapchain object.

use crate::error::{Error, Result};
use crate::graphics_device::{
    ColorSpace, Extent2D, Format, FramebufferHandle, GraphicsDevice, ImageHandle, ImageViewHandle,
    PresentMode, QueueFamilies, RenderPassHandle, SharingMode, SurfaceCapabilities, SurfaceFormat,
    SwapchainDesc, SwapchainHandle,
};
use crate::window::WindowSurface;
use crate::{engine_debug, engine_error, engine_info, engine_warn};

// ============================================================================
// Negotiation
// ============================================================================

/// Pick the surface format
///
/// Prefers 8-bit BGRA sRGB with the sRGB non-linear color space, otherwise the
/// first format offered. Fails only when the surface offers nothing.
pub fn choose_surface_format(formats: &[SurfaceFormat]) -> Result<SurfaceFormat> {
    formats
        .iter()
        .copied()
        .find(|f| f.format == Format::B8G8R8A8_SRGB && f.color_space == ColorSpace::SrgbNonlinear)
        .or_else(|| formats.first().copied())
        .ok_or_else(|| {
            engine_error!("quad::SwapchainManager", "Surface reports no formats");
            Error::SwapchainCreationFailed("surface reports no formats".to_string())
        })
}

/// Pick the present mode: MAILBOX when offered, FIFO otherwise (always supported)
pub fn choose_present_mode(modes: &[PresentMode]) -> PresentMode {
    if modes.contains(&PresentMode::Mailbox) {
        PresentMode::Mailbox
    } else {
        PresentMode::Fifo
    }
}

/// Pick the image extent
///
/// Uses the surface's current extent unless it is the undefined sentinel, in which
/// case the framebuffer size is clamped component-wise into [min, max].
pub fn choose_extent(caps: &SurfaceCapabilities, framebuffer_size: Extent2D) -> Extent2D {
    if !caps.current_extent.is_undefined() {
        return caps.current_extent;
    }
    Extent2D {
        width: framebuffer_size
            .width
            .clamp(caps.min_image_extent.width, caps.max_image_extent.width.max(caps.min_image_extent.width)),
        height: framebuffer_size
            .height
            .clamp(caps.min_image_extent.height, caps.max_image_extent.height.max(caps.min_image_extent.height)),
    }
}

/// `min_image_count + 1`, clamped to `max_image_count` when that is non-zero
pub fn choose_image_count(caps: &SurfaceCapabilities) -> u32 {
    let count = caps.min_image_count + 1;
    if caps.max_image_count > 0 {
        count.min(caps.max_image_count)
    } else {
        count
    }
}

/// Concurrent sharing across distinct graphics/present families, exclusive otherwise
pub fn choose_sharing(families: QueueFamilies) -> (SharingMode, Vec<u32>) {
    if families.graphics != families.present {
        (SharingMode::Concurrent, vec![families.graphics, families.present])
    } else {
        (SharingMode::Exclusive, Vec::new())
    }
}

/// Full swapchain description for one build
pub fn swapchain_desc(
    caps: &SurfaceCapabilities,
    framebuffer_size: Extent2D,
    families: QueueFamilies,
) -> Result<SwapchainDesc> {
    let surface_format = choose_surface_format(&caps.formats)?;
    let (sharing_mode, queue_family_indices) = choose_sharing(families);
    Ok(SwapchainDesc {
        image_count: choose_image_count(caps),
        surface_format,
        extent: choose_extent(caps, framebuffer_size),
        present_mode: choose_present_mode(&caps.present_modes),
        pre_transform: caps.current_transform,
        sharing_mode,
        queue_family_indices,
    })
}

// ============================================================================
// Swapchain
// ============================================================================

/// A live chain: `images`, `views` and `framebuffers` always have the same length
#[derive(Debug)]
pub struct Swapchain {
    handle: SwapchainHandle,
    images: Vec<ImageHandle>,
    views: Vec<ImageViewHandle>,
    framebuffers: Vec<FramebufferHandle>,
    surface_format: SurfaceFormat,
    extent: Extent2D,
    present_mode: PresentMode,
}

impl Swapchain {
    /// Build a complete chain against `render_pass`
    ///
    /// Queries the surface, negotiates parameters, creates the swapchain, its views and
    /// framebuffers. When any step fails, everything created so far is released in
    /// reverse order before the error is returned.
    ///
    /// # Arguments
    ///
    /// * `device` - Device bound to the surface
    /// * `render_pass` - Render pass the framebuffers are compatible with
    /// * `framebuffer_size` - Live window framebuffer size (used when the surface leaves the extent open)
    pub fn build<D: GraphicsDevice + ?Sized>(
        device: &mut D,
        render_pass: RenderPassHandle,
        framebuffer_size: Extent2D,
    ) -> Result<Self> {
        let caps = device.surface_capabilities()?;
        Self::build_with_capabilities(device, render_pass, &caps, framebuffer_size)
    }

    /// Build a complete chain from an already queried capability snapshot
    pub fn build_with_capabilities<D: GraphicsDevice + ?Sized>(
        device: &mut D,
        render_pass: RenderPassHandle,
        caps: &SurfaceCapabilities,
        framebuffer_size: Extent2D,
    ) -> Result<Self> {
        let desc = swapchain_desc(caps, framebuffer_size, device.queue_families())?;

        if desc.extent.has_zero_area() {
            engine_error!("quad::SwapchainManager",
                "Negotiated extent {}x{} has zero area", desc.extent.width, desc.extent.height);
            return Err(Error::SwapchainCreationFailed(format!(
                "negotiated extent {}x{} has zero area",
                desc.extent.width, desc.extent.height
            )));
        }

        let handle = device.create_swapchain(&desc).map_err(|e| match e {
            Error::DeviceLost => Error::DeviceLost,
            other => {
                engine_error!("quad::SwapchainManager", "Failed to create swapchain: {}", other);
                Error::SwapchainCreationFailed(other.to_string())
            }
        })?;

        let mut chain = Self {
            handle,
            images: Vec::new(),
            views: Vec::new(),
            framebuffers: Vec::new(),
            surface_format: desc.surface_format,
            extent: desc.extent,
            present_mode: desc.present_mode,
        };

        if let Err(e) = chain.populate(device, render_pass) {
            chain.release(device);
            return Err(e);
        }

        engine_debug!("quad::SwapchainManager",
            "Built swapchain: {} images, {}x{}, {:?}, {:?}",
            chain.images.len(), chain.extent.width, chain.extent.height,
            chain.surface_format.format, chain.present_mode);

        Ok(chain)
    }

    /// Create views then framebuffers, pushing each as soon as it exists
    fn populate<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        render_pass: RenderPassHandle,
    ) -> Result<()> {
        self.images = device.swapchain_images(self.handle)?;

        for (index, &image) in self.images.iter().enumerate() {
            let view = device
                .create_image_view(image, self.surface_format.format)
                .map_err(|e| {
                    engine_error!("quad::SwapchainManager", "Failed to create image view {}: {}", index, e);
                    Error::ImageViewCreationFailed { index, reason: e.to_string() }
                })?;
            self.views.push(view);
        }

        for (index, &view) in self.views.iter().enumerate() {
            let framebuffer = device
                .create_framebuffer(render_pass, view, self.extent)
                .map_err(|e| {
                    engine_error!("quad::SwapchainManager", "Failed to create framebuffer {}: {}", index, e);
                    Error::FramebufferCreationFailed { index, reason: e.to_string() }
                })?;
            self.framebuffers.push(framebuffer);
        }

        Ok(())
    }

    /// Release framebuffers, views, then the swapchain object
    fn release<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D) {
        for framebuffer in self.framebuffers.drain(..).rev() {
            device.destroy_framebuffer(framebuffer);
        }
        for view in self.views.drain(..).rev() {
            device.destroy_image_view(view);
        }
        self.images.clear();
        device.destroy_swapchain(self.handle);
    }

    /// Destroy the whole chain
    pub fn destroy<D: GraphicsDevice + ?Sized>(mut self, device: &mut D) {
        self.release(device);
    }

    pub fn handle(&self) -> SwapchainHandle {
        self.handle
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    pub fn surface_format(&self) -> SurfaceFormat {
        self.surface_format
    }

    pub fn present_mode(&self) -> PresentMode {
        self.present_mode
    }

    /// Framebuffer for the image at `image_index`
    pub fn framebuffer(&self, image_index: u32) -> Option<FramebufferHandle> {
        self.framebuffers.get(image_index as usize).copied()
    }

    pub fn image_views(&self) -> &[ImageViewHandle] {
        &self.views
    }

    pub fn framebuffers(&self) -> &[FramebufferHandle] {
        &self.framebuffers
    }
}

// ============================================================================
// Manager
// ============================================================================

/// How a call to `SwapchainManager::rebuild` ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildStatus {
    /// A new chain is live
    Rebuilt,
    /// The window closed before the surface became renderable; nothing was touched
    WindowClosed,
}

/// Keeps at most one live chain and runs the rebuild protocol
pub struct SwapchainManager {
    render_pass: RenderPassHandle,
    /// Format the render pass was created for
    color_format: SurfaceFormat,
    current: Option<Swapchain>,
    generation: u64,
}

impl SwapchainManager {
    /// Manager with no chain yet
    pub fn new(render_pass: RenderPassHandle, color_format: SurfaceFormat) -> Self {
        Self {
            render_pass,
            color_format,
            current: None,
            generation: 0,
        }
    }

    /// The live chain, if any
    pub fn current(&self) -> Option<&Swapchain> {
        self.current.as_ref()
    }

    /// Number of chains built so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the live chain with a freshly negotiated one
    ///
    /// Blocks on window events while the framebuffer or the negotiated surface extent
    /// has a zero dimension, drains the device, destroys the old chain, then builds the
    /// new one. Also used for the first build. Returns `WindowClosed` without touching
    /// the live chain when the window starts closing during the wait.
    pub fn rebuild<D, W>(&mut self, device: &mut D, window: &mut W) -> Result<RebuildStatus>
    where
        D: GraphicsDevice + ?Sized,
        W: WindowSurface + ?Sized,
    {
        let Some((caps, framebuffer_size)) = Self::wait_for_renderable_surface(device, window)? else {
            engine_info!("quad::SwapchainManager", "Window closing, swapchain rebuild abandoned");
            return Ok(RebuildStatus::WindowClosed);
        };

        device.wait_idle()?;

        if let Some(old) = self.current.take() {
            old.destroy(device);
        }

        let chain = Swapchain::build_with_capabilities(device, self.render_pass, &caps, framebuffer_size)?;

        if chain.surface_format() != self.color_format {
            engine_error!("quad::SwapchainManager",
                "Surface format changed from {:?} to {:?}; render pass is incompatible",
                self.color_format, chain.surface_format());
            let found = chain.surface_format();
            chain.destroy(device);
            return Err(Error::SwapchainCreationFailed(format!(
                "surface format changed from {:?} to {:?}",
                self.color_format, found
            )));
        }

        self.generation += 1;
        engine_info!("quad::SwapchainManager",
            "Swapchain generation {} ready ({}x{}, {} images)",
            self.generation, chain.extent().width, chain.extent().height, chain.image_count());
        self.current = Some(chain);
        Ok(RebuildStatus::Rebuilt)
    }

    /// Destroy the live chain, if any
    ///
    /// The caller guarantees the device is idle.
    pub fn destroy<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D) {
        if let Some(chain) = self.current.take() {
            chain.destroy(device);
        }
    }

    /// Wait until both the framebuffer and the negotiated extent are non-zero
    ///
    /// The surface can keep reporting a zero extent after the window has a size again
    /// (and for good once a minimized window is closed), so both are polled after each
    /// event. `None` when the window starts closing first.
    fn wait_for_renderable_surface<D, W>(
        device: &mut D,
        window: &mut W,
    ) -> Result<Option<(SurfaceCapabilities, Extent2D)>>
    where
        D: GraphicsDevice + ?Sized,
        W: WindowSurface + ?Sized,
    {
        let mut warned = false;
        loop {
            if window.is_closing() {
                return Ok(None);
            }

            let size = window.framebuffer_size();
            let extent = if size.has_zero_area() {
                size
            } else {
                let caps = device.surface_capabilities()?;
                let extent = choose_extent(&caps, size);
                if !extent.has_zero_area() {
                    return Ok(Some((caps, size)));
                }
                extent
            };

            if !warned {
                engine_warn!("quad::SwapchainManager",
                    "Surface is {}x{}, waiting for a renderable size", extent.width, extent.height);
                warned = true;
            }
            window.wait_events();
        }
    }
}

#[cfg(test)]
#[path = "swapchain_manager_tests.rs"]
mod tests;
